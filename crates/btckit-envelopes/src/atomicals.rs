//! Atomicals asset-balance rules.
//!
//! Atomicals color satoshis: an asset rides on the value of the outputs
//! that carry its tag. The rules here are a wire-compatibility surface
//! with deployed indexers and are enforced before any transaction bytes
//! exist: exactly one distinct asset id may flow through a request,
//! fungible and non-fungible tags never mix, a non-fungible id appears
//! at most once per input, and every output asset id must be funded by
//! an input. Value assembly then reuses the standard fee/change loop
//! with asset-aware change handling.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use btckit_script::network::DUST_LIMIT;
use btckit_script::NetworkProfile;
use btckit_transaction::{
    BuildParams, BuildResult, OutputSpec, PrevOutput, TransactionBuilder,
};

use crate::EnvelopeError;

/// Whether an asset id is fungible or a unique token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetKind {
    /// Fungible: amounts are the satoshi values carrying the tag.
    Ft,
    /// Non-fungible: the unit moves whole or not at all.
    Nft,
}

/// An asset id riding on an input or output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetTag {
    /// The atomical id.
    pub asset_id: String,
    /// Fungible or non-fungible.
    pub kind: AssetKind,
}

/// A funding or asset-carrying input.
#[derive(Clone, Debug)]
pub struct AssetPrevOutput {
    /// The underlying UTXO.
    pub output: PrevOutput,
    /// Asset tags riding on this UTXO; empty for plain funding inputs.
    pub asset_tags: Vec<AssetTag>,
}

/// A declared output with optional asset tags.
#[derive(Clone, Debug)]
pub struct AssetOutputSpec {
    /// Destination address.
    pub address: String,
    /// Output value in satoshis; for fungible assets this is the amount.
    pub value: u64,
    /// Asset tags this output carries.
    pub asset_tags: Vec<AssetTag>,
}

/// A full asset transfer request.
#[derive(Clone, Debug)]
pub struct AssetTransferRequest {
    /// Asset and funding inputs.
    pub inputs: Vec<AssetPrevOutput>,
    /// Declared outputs.
    pub outputs: Vec<AssetOutputSpec>,
    /// Address receiving satoshi change and fungible asset change.
    pub change_address: String,
    /// Fee rate in sat/vB.
    pub fee_rate: u64,
    /// Minimum change worth creating.
    pub min_change_value: Option<u64>,
    /// The network all addresses belong to.
    pub network: &'static NetworkProfile,
}

/// Validate the single-asset invariant and build the transfer.
///
/// All asset rules are checked before any transaction bytes are
/// constructed; a violating request never reaches the signer.
///
/// # Arguments
/// * `request` - The transfer request.
///
/// # Returns
/// The signed transaction result, or a structured asset error.
pub fn build_asset_transfer(
    request: &AssetTransferRequest,
) -> Result<BuildResult, EnvelopeError> {
    let asset = validate_asset_rules(request)?;

    let mut outputs: Vec<OutputSpec> = request
        .outputs
        .iter()
        .map(|spec| OutputSpec::to_address(&spec.address, spec.value))
        .collect();

    // Asset-aware change for fungible assets: the surplus rides back to
    // the change address as its own colored output, unless it falls
    // below dust, in which case it is dropped entirely (deliberately
    // burned into fees rather than creating an unspendable sliver).
    if asset.kind == AssetKind::Ft {
        let surplus = asset.input_total - asset.output_total;
        if surplus >= request.min_change_value.unwrap_or(DUST_LIMIT) {
            outputs.push(OutputSpec::to_address(&request.change_address, surplus));
        }
    }

    let builder = TransactionBuilder::new(BuildParams {
        inputs: request.inputs.iter().map(|i| i.output.clone()).collect(),
        outputs,
        change_address: request.change_address.clone(),
        fee_rate: request.fee_rate,
        min_change_value: request.min_change_value,
        network: request.network,
    });
    Ok(builder.build()?)
}

/// The single asset flowing through a validated request.
struct FlowingAsset {
    kind: AssetKind,
    input_total: u64,
    output_total: u64,
}

/// Enforce the asset rules, returning the one flowing asset.
fn validate_asset_rules(
    request: &AssetTransferRequest,
) -> Result<FlowingAsset, EnvelopeError> {
    if request.inputs.is_empty() {
        return Err(EnvelopeError::Validation(
            "transfer has no inputs".to_string(),
        ));
    }

    // Duplicate NFT ids on one input are rejected first: the rest of the
    // accounting would silently double-count them.
    for input in &request.inputs {
        let mut seen = BTreeSet::new();
        for tag in &input.asset_tags {
            if tag.kind == AssetKind::Nft && !seen.insert(&tag.asset_id) {
                return Err(EnvelopeError::DuplicateNft {
                    asset_id: tag.asset_id.clone(),
                });
            }
        }
    }

    // Exactly one distinct asset id across all inputs and outputs.
    let input_tags = request.inputs.iter().flat_map(|i| i.asset_tags.iter());
    let output_tags = request.outputs.iter().flat_map(|o| o.asset_tags.iter());
    let all_ids: BTreeSet<&str> = input_tags
        .clone()
        .chain(output_tags.clone())
        .map(|t| t.asset_id.as_str())
        .collect();
    if all_ids.is_empty() {
        return Err(EnvelopeError::Validation(
            "request carries no asset tags".to_string(),
        ));
    }
    if all_ids.len() > 1 {
        return Err(EnvelopeError::MultiAsset {
            asset_ids: all_ids.into_iter().map(String::from).collect(),
        });
    }
    let asset_id = all_ids
        .into_iter()
        .next()
        .map(String::from)
        .unwrap_or_default();

    // One kind per id.
    let kinds: BTreeSet<AssetKind> = input_tags
        .clone()
        .chain(output_tags.clone())
        .map(|t| t.kind)
        .collect();
    if kinds.len() > 1 {
        return Err(EnvelopeError::MixedAssetKinds { asset_id });
    }
    let kind = kinds.into_iter().next().unwrap_or(AssetKind::Ft);

    // Output asset ids must be funded: some input must carry the id.
    let funded = request
        .inputs
        .iter()
        .any(|i| i.asset_tags.iter().any(|t| t.asset_id == asset_id));
    if !funded {
        return Err(EnvelopeError::UnfundedAsset { asset_id });
    }

    let input_total: u64 = request
        .inputs
        .iter()
        .filter(|i| i.asset_tags.iter().any(|t| t.asset_id == asset_id))
        .map(|i| i.output.value)
        .sum();
    let output_total: u64 = request
        .outputs
        .iter()
        .filter(|o| o.asset_tags.iter().any(|t| t.asset_id == asset_id))
        .map(|o| o.value)
        .sum();

    match kind {
        AssetKind::Ft => {
            if output_total > input_total {
                return Err(EnvelopeError::Validation(format!(
                    "asset {} outputs {} exceed funded {}",
                    asset_id, output_total, input_total
                )));
            }
        }
        AssetKind::Nft => {
            // A unique token is repaid in its full unit or not at all.
            if output_total != input_total {
                return Err(EnvelopeError::Validation(format!(
                    "NFT {} must transfer its full unit of {} sat, got {}",
                    asset_id, input_total, output_total
                )));
            }
        }
    }

    Ok(FlowingAsset {
        kind,
        input_total,
        output_total,
    })
}

impl PartialOrd for AssetKind {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AssetKind {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (*self as u8).cmp(&(*other as u8))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use btckit_primitives::ec::PrivateKey;
    use btckit_script::network::MAINNET;
    use btckit_script::{Address, Script};

    fn key(fill: u8) -> PrivateKey {
        PrivateKey::from_bytes(&[fill; 32]).expect("valid scalar")
    }

    fn p2wpkh_address(fill: u8) -> String {
        Address::from_script(
            &Script::p2wpkh_lock(&key(fill).pub_key().hash160()),
            &MAINNET,
        )
        .unwrap()
        .encode()
    }

    fn ft(asset_id: &str) -> AssetTag {
        AssetTag {
            asset_id: asset_id.to_string(),
            kind: AssetKind::Ft,
        }
    }

    fn nft(asset_id: &str) -> AssetTag {
        AssetTag {
            asset_id: asset_id.to_string(),
            kind: AssetKind::Nft,
        }
    }

    fn input(fill: u8, vout: u32, value: u64, tags: Vec<AssetTag>) -> AssetPrevOutput {
        AssetPrevOutput {
            output: PrevOutput {
                txid: "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b"
                    .to_string(),
                vout,
                value,
                address: Some(p2wpkh_address(fill)),
                script_hex: None,
                private_key_wif: key(fill).to_wif(MAINNET.wif_version),
            },
            asset_tags: tags,
        }
    }

    fn ft_request() -> AssetTransferRequest {
        AssetTransferRequest {
            inputs: vec![
                input(0x31, 0, 10_000, vec![ft("atom:a")]),
                // Plain funding input.
                input(0x32, 1, 100_000, vec![]),
            ],
            outputs: vec![AssetOutputSpec {
                address: p2wpkh_address(0x33),
                value: 6_000,
                asset_tags: vec![ft("atom:a")],
            }],
            change_address: p2wpkh_address(0x34),
            fee_rate: 5,
            min_change_value: None,
            network: &MAINNET,
        }
    }

    // -----------------------------------------------------------------
    // Valid flows
    // -----------------------------------------------------------------

    #[test]
    fn test_ft_transfer_with_asset_change() {
        let result = build_asset_transfer(&ft_request()).unwrap();
        // Declared output, FT surplus (4000 >= dust), satoshi change.
        assert_eq!(result.tx.outputs.len(), 3);
        assert_eq!(result.tx.outputs[0].value, 6_000);
        assert_eq!(result.tx.outputs[1].value, 4_000);
        // Conservation.
        assert_eq!(110_000, result.tx.total_output_value() + result.fee);
    }

    /// FT surplus below dust is dropped, not emitted as an output.
    #[test]
    fn test_ft_change_below_dust_dropped() {
        let mut request = ft_request();
        request.outputs[0].value = 9_700; // surplus 300 < 546
        let result = build_asset_transfer(&request).unwrap();
        assert_eq!(result.tx.outputs[0].value, 9_700);
        // Only the declared output and satoshi change remain.
        assert_eq!(result.tx.outputs.len(), 2);
    }

    #[test]
    fn test_nft_full_unit_transfer() {
        let request = AssetTransferRequest {
            inputs: vec![
                input(0x31, 0, 546, vec![nft("atom:nft1")]),
                input(0x32, 1, 50_000, vec![]),
            ],
            outputs: vec![AssetOutputSpec {
                address: p2wpkh_address(0x33),
                value: 546,
                asset_tags: vec![nft("atom:nft1")],
            }],
            change_address: p2wpkh_address(0x34),
            fee_rate: 5,
            min_change_value: None,
            network: &MAINNET,
        };
        let result = build_asset_transfer(&request).unwrap();
        assert_eq!(result.tx.outputs[0].value, 546);
    }

    // -----------------------------------------------------------------
    // Rejections, all before any bytes are built
    // -----------------------------------------------------------------

    #[test]
    fn test_multi_asset_rejected() {
        let mut request = ft_request();
        request.inputs[1].asset_tags = vec![ft("atom:b")];
        let err = build_asset_transfer(&request).unwrap_err();
        match err {
            EnvelopeError::MultiAsset { asset_ids } => {
                assert_eq!(asset_ids, vec!["atom:a".to_string(), "atom:b".to_string()]);
            }
            other => panic!("expected MultiAsset, got {}", other),
        }
    }

    /// Mixing FT and NFT identifiers across inputs is rejected with the
    /// multi-asset family of errors before construction.
    #[test]
    fn test_mixed_kinds_rejected() {
        let mut request = ft_request();
        request.inputs[1].asset_tags = vec![nft("atom:a")];
        let err = build_asset_transfer(&request).unwrap_err();
        assert!(matches!(err, EnvelopeError::MixedAssetKinds { .. }));
    }

    #[test]
    fn test_duplicate_nft_on_one_input_rejected() {
        let mut request = ft_request();
        request.inputs[0].asset_tags = vec![nft("atom:n"), nft("atom:n")];
        let err = build_asset_transfer(&request).unwrap_err();
        assert!(matches!(err, EnvelopeError::DuplicateNft { .. }));
    }

    #[test]
    fn test_unfunded_asset_rejected() {
        let mut request = ft_request();
        request.inputs[0].asset_tags.clear();
        let err = build_asset_transfer(&request).unwrap_err();
        assert!(matches!(err, EnvelopeError::UnfundedAsset { .. }));
    }

    #[test]
    fn test_ft_overspend_rejected() {
        let mut request = ft_request();
        request.outputs[0].value = 20_000;
        assert!(matches!(
            build_asset_transfer(&request),
            Err(EnvelopeError::Validation(_))
        ));
    }

    #[test]
    fn test_nft_partial_transfer_rejected() {
        let request = AssetTransferRequest {
            inputs: vec![
                input(0x31, 0, 1_000, vec![nft("atom:nft1")]),
                input(0x32, 1, 50_000, vec![]),
            ],
            outputs: vec![AssetOutputSpec {
                address: p2wpkh_address(0x33),
                value: 500,
                asset_tags: vec![nft("atom:nft1")],
            }],
            change_address: p2wpkh_address(0x34),
            fee_rate: 5,
            min_change_value: None,
            network: &MAINNET,
        };
        assert!(matches!(
            build_asset_transfer(&request),
            Err(EnvelopeError::Validation(_))
        ));
    }
}
