//! Ordinal inscription commit/reveal construction.
//!
//! An inscription embeds content inside a tapleaf script behind
//! `OP_FALSE OP_IF ... OP_ENDIF`, spendable only by the reveal key. The
//! flow is two transactions: a commit paying exactly the fee-dependent
//! amount each reveal needs into its taproot commit output, then one
//! reveal per inscription spending that output via the script path.
//!
//! Build order matters: each reveal is constructed empty first to learn
//! its exact required prevout value, the commit is built to pay those
//! values through the fee loop, and only once the commit txid exists are
//! the reveal outpoints patched and signed.

use serde::{Deserialize, Serialize};

use btckit_primitives::ec::{schnorr, PrivateKey};
use btckit_primitives::hash::tagged_sha256;
use btckit_primitives::util::{ByteWriter, VarInt};
use btckit_script::opcodes::{OP_0, OP_CHECKSIG, OP_ENDIF, OP_FALSE, OP_IF};
use btckit_script::{Address, NetworkProfile, Script};
use btckit_transaction::sighash::{bip341_script_spend_signature_hash, SIGHASH_DEFAULT};
use btckit_transaction::{
    BuildParams, OutputSpec, PrevOutput, Transaction, TransactionBuilder, TransactionError,
    TxInput, TxOutput,
};

use crate::EnvelopeError;

/// Maximum bytes per push inside the envelope body.
const MAX_BODY_CHUNK: usize = 520;

/// The protocol marker pushed at the top of every inscription envelope.
const PROTOCOL_ID: &[u8] = b"ord";

/// Tapleaf version byte for tapscript leaves.
const TAPLEAF_VERSION: u8 = 0xc0;

/// One piece of content to inscribe.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InscriptionData {
    /// MIME type of the body, e.g. `text/plain;charset=utf-8`.
    pub content_type: String,
    /// The content bytes. Chunked into pushes of at most 520 bytes.
    pub body: Vec<u8>,
    /// The address receiving the inscribed output.
    pub reveal_address: String,
}

/// A full inscription request.
#[derive(Clone, Debug)]
pub struct InscriptionRequest {
    /// UTXOs funding the commit transaction.
    pub commit_inputs: Vec<PrevOutput>,
    /// The inscriptions to create, one reveal transaction each.
    pub inscriptions: Vec<InscriptionData>,
    /// Value carried by each inscribed output (the "postage").
    pub reveal_out_value: u64,
    /// Address receiving commit change.
    pub change_address: String,
    /// Fee rate for the commit transaction, sat/vB.
    pub commit_fee_rate: u64,
    /// Fee rate for the reveal transactions, sat/vB.
    pub reveal_fee_rate: u64,
    /// Minimum change worth creating on the commit.
    pub min_change_value: Option<u64>,
    /// The network all addresses belong to.
    pub network: &'static NetworkProfile,
}

/// The inscription response.
///
/// On insufficient balance the transaction fields are empty strings and
/// the fee fields carry the computed requirements, so the caller can act
/// without a second sizing round trip.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InscribeResult {
    /// Commit transaction hex, empty on insufficient balance.
    pub commit_tx: String,
    /// Reveal transaction hexes, empty strings on insufficient balance.
    pub reveal_txs: Vec<String>,
    /// The commit fee (the required fee, when underfunded).
    pub commit_tx_fee: u64,
    /// Per-reveal fees (required fees, when underfunded).
    pub reveal_tx_fees: Vec<u64>,
    /// The taproot commit address of each inscription.
    pub commit_addrs: Vec<String>,
}

/// Per-inscription context carried between the phases.
struct RevealContext {
    leaf_script: Script,
    leaf_hash: [u8; 32],
    control_block: Vec<u8>,
    commit_script: Script,
    commit_address: String,
    required_value: u64,
    fee: u64,
    reveal_script_pubkey: Script,
}

/// Build the commit and reveal transactions for an inscription request.
///
/// # Arguments
/// * `request` - The request.
///
/// # Returns
/// The result shape; underfunding is reported inside it rather than as
/// an error. Weight violations and malformed requests fail hard.
pub fn inscribe(request: &InscriptionRequest) -> Result<InscribeResult, EnvelopeError> {
    if request.inscriptions.is_empty() {
        return Err(EnvelopeError::Validation(
            "request has no inscriptions".to_string(),
        ));
    }
    let first_input = request.commit_inputs.first().ok_or_else(|| {
        EnvelopeError::Validation("request has no commit inputs".to_string())
    })?;
    // The reveal key: the first funding input's key, so identical
    // requests derive identical commit addresses.
    let reveal_key = first_input.private_key()?.key;

    // Phase (a): empty reveal per inscription, to learn required values.
    let mut contexts = Vec::with_capacity(request.inscriptions.len());
    for inscription in &request.inscriptions {
        contexts.push(prepare_reveal(inscription, &reveal_key, request)?);
    }

    // Phase (b): commit tx paying exactly each required value.
    let commit_outputs = contexts
        .iter()
        .map(|ctx| OutputSpec::to_address(&ctx.commit_address, ctx.required_value))
        .collect();
    let builder = TransactionBuilder::new(BuildParams {
        inputs: request.commit_inputs.clone(),
        outputs: commit_outputs,
        change_address: request.change_address.clone(),
        fee_rate: request.commit_fee_rate,
        min_change_value: request.min_change_value,
        network: request.network,
    });
    let commit = match builder.build() {
        Ok(result) => result,
        Err(TransactionError::InsufficientBalance { required_fee }) => {
            // Same shape, empty hex, fees populated.
            return Ok(InscribeResult {
                commit_tx: String::new(),
                reveal_txs: vec![String::new(); contexts.len()],
                commit_tx_fee: required_fee,
                reveal_tx_fees: contexts.iter().map(|c| c.fee).collect(),
                commit_addrs: contexts.iter().map(|c| c.commit_address.clone()).collect(),
            });
        }
        Err(err) => return Err(err.into()),
    };

    // Phase (c): patch reveal outpoints with the commit txid and sign.
    let commit_txid = *commit.tx.txid().as_bytes();
    let mut reveal_txs = Vec::with_capacity(contexts.len());
    for (index, ctx) in contexts.iter().enumerate() {
        let tx = sign_reveal(ctx, &reveal_key, commit_txid, index as u32, request)?;
        if tx.weight() > request.network.max_standard_tx_weight {
            return Err(EnvelopeError::Transaction(
                TransactionError::ProtocolLimitExceeded {
                    what: "reveal transaction weight".to_string(),
                    limit: request.network.max_standard_tx_weight,
                    actual: tx.weight(),
                },
            ));
        }
        reveal_txs.push(tx.to_hex());
    }

    Ok(InscribeResult {
        commit_tx: commit.tx.to_hex(),
        reveal_txs,
        commit_tx_fee: commit.fee,
        reveal_tx_fees: contexts.iter().map(|c| c.fee).collect(),
        commit_addrs: contexts.iter().map(|c| c.commit_address.clone()).collect(),
    })
}

/// Build the envelope leaf script for an inscription.
///
/// `push(xonly_pk) OP_CHECKSIG OP_FALSE OP_IF push("ord") push([1])
/// push(content_type) OP_0 <body chunks> OP_ENDIF`
///
/// # Arguments
/// * `xonly_pubkey` - The reveal key's x-only public key.
/// * `inscription` - The content.
///
/// # Returns
/// The leaf script.
pub fn build_envelope_script(
    xonly_pubkey: &[u8; 32],
    inscription: &InscriptionData,
) -> Result<Script, EnvelopeError> {
    let mut script = Script::new();
    script.append_push_data(xonly_pubkey)?;
    script.append_opcodes(&[OP_CHECKSIG, OP_FALSE, OP_IF])?;
    script.append_push_data(PROTOCOL_ID)?;
    // Content-type tag.
    script.append_push_data(&[0x01])?;
    script.append_push_data(inscription.content_type.as_bytes())?;
    script.append_opcodes(&[OP_0])?;
    for chunk in inscription.body.chunks(MAX_BODY_CHUNK) {
        script.append_push_data(chunk)?;
    }
    script.append_opcodes(&[OP_ENDIF])?;
    Ok(script)
}

/// Compute the tapleaf hash of a leaf script.
fn tapleaf_hash(leaf_script: &Script) -> [u8; 32] {
    let mut writer = ByteWriter::with_capacity(leaf_script.len() + 4);
    writer.write_u8(TAPLEAF_VERSION);
    writer.write_varint(VarInt::from(leaf_script.len()));
    writer.write_bytes(leaf_script.to_bytes());
    tagged_sha256("TapLeaf", writer.as_bytes())
}

/// Phase (a): derive the commit output and measure the reveal fee.
fn prepare_reveal(
    inscription: &InscriptionData,
    reveal_key: &PrivateKey,
    request: &InscriptionRequest,
) -> Result<RevealContext, EnvelopeError> {
    let internal_x = reveal_key.pub_key().x_only();
    let leaf_script = build_envelope_script(&internal_x, inscription)?;
    let leaf_hash = tapleaf_hash(&leaf_script);

    let output_key = schnorr::taproot_output_key(&internal_x, Some(&leaf_hash))?;
    let commit_script = Script::p2tr_lock(&output_key.x_only);
    let commit_address =
        Address::from_script(&commit_script, request.network)?.encode();

    let mut control_block = Vec::with_capacity(33);
    control_block.push(TAPLEAF_VERSION | u8::from(output_key.odd_parity));
    control_block.extend_from_slice(&internal_x);

    let reveal_script_pubkey =
        Address::to_script_pubkey(&inscription.reveal_address, request.network)?;

    // Empty reveal with a dummy 64-byte signature: Schnorr signatures
    // have a fixed size, so the measured weight is exact.
    let mut probe = Transaction::new();
    probe.inputs.push(TxInput::new([0u8; 32], 0));
    probe.inputs[0].witness = vec![
        vec![0u8; 64],
        leaf_script.to_bytes().to_vec(),
        control_block.clone(),
    ];
    probe
        .outputs
        .push(TxOutput::new(request.reveal_out_value, reveal_script_pubkey.clone()));

    let fee = probe.vsize() * request.reveal_fee_rate;
    Ok(RevealContext {
        leaf_script,
        leaf_hash,
        control_block,
        commit_script,
        commit_address,
        required_value: fee + request.reveal_out_value,
        fee,
        reveal_script_pubkey,
    })
}

/// Phase (c): point the reveal at its commit output and sign the script
/// path with the untweaked reveal key.
fn sign_reveal(
    ctx: &RevealContext,
    reveal_key: &PrivateKey,
    commit_txid: [u8; 32],
    commit_vout: u32,
    request: &InscriptionRequest,
) -> Result<Transaction, EnvelopeError> {
    let mut tx = Transaction::new();
    tx.inputs.push(TxInput::new(commit_txid, commit_vout));
    tx.outputs.push(TxOutput::new(
        request.reveal_out_value,
        ctx.reveal_script_pubkey.clone(),
    ));

    let prevouts = vec![(ctx.required_value, ctx.commit_script.clone())];
    let digest = bip341_script_spend_signature_hash(
        &tx,
        0,
        &prevouts,
        SIGHASH_DEFAULT,
        &ctx.leaf_hash,
    )?;
    let signature = schnorr::sign_bip340(reveal_key, &digest)?;

    tx.inputs[0].witness = vec![
        signature.to_vec(),
        ctx.leaf_script.to_bytes().to_vec(),
        ctx.control_block.clone(),
    ];
    Ok(tx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use btckit_script::network::MAINNET;
    use btckit_script::opcodes::OP_DATA_32;

    fn key(fill: u8) -> PrivateKey {
        PrivateKey::from_bytes(&[fill; 32]).expect("valid scalar")
    }

    fn p2tr_address(fill: u8) -> String {
        let output = schnorr::taproot_output_key(&key(fill).pub_key().x_only(), None).unwrap();
        Address::from_script(&Script::p2tr_lock(&output.x_only), &MAINNET)
            .unwrap()
            .encode()
    }

    fn p2wpkh_address(fill: u8) -> String {
        Address::from_script(
            &Script::p2wpkh_lock(&key(fill).pub_key().hash160()),
            &MAINNET,
        )
        .unwrap()
        .encode()
    }

    fn request(funding: u64) -> InscriptionRequest {
        InscriptionRequest {
            commit_inputs: vec![PrevOutput {
                txid: "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b"
                    .to_string(),
                vout: 0,
                value: funding,
                address: Some(p2wpkh_address(0x21)),
                script_hex: None,
                private_key_wif: key(0x21).to_wif(MAINNET.wif_version),
            }],
            inscriptions: vec![
                InscriptionData {
                    content_type: "text/plain;charset=utf-8".to_string(),
                    body: b"hello world".to_vec(),
                    reveal_address: p2tr_address(0x22),
                },
                InscriptionData {
                    content_type: "application/json".to_string(),
                    body: br#"{"p":"test","op":"mint"}"#.to_vec(),
                    reveal_address: p2tr_address(0x23),
                },
            ],
            reveal_out_value: 546,
            change_address: p2wpkh_address(0x24),
            commit_fee_rate: 10,
            reveal_fee_rate: 10,
            min_change_value: None,
            network: &MAINNET,
        }
    }

    // -----------------------------------------------------------------
    // Envelope script
    // -----------------------------------------------------------------

    #[test]
    fn test_envelope_script_shape() {
        let inscription = &request(0).inscriptions[0];
        let xonly = key(0x21).pub_key().x_only();
        let script = build_envelope_script(&xonly, inscription).unwrap();
        let bytes = script.to_bytes();

        // push(32-byte key) OP_CHECKSIG OP_FALSE OP_IF push("ord")...
        assert_eq!(bytes[0], OP_DATA_32);
        assert_eq!(bytes[33], OP_CHECKSIG);
        assert_eq!(bytes[34], OP_FALSE);
        assert_eq!(bytes[35], OP_IF);
        assert_eq!(&bytes[36..40], &[0x03, b'o', b'r', b'd']);
        // Content-type tag is a push of the single byte 0x01.
        assert_eq!(&bytes[40..42], &[0x01, 0x01]);
        assert_eq!(*bytes.last().unwrap(), OP_ENDIF);
    }

    /// Bodies larger than 520 bytes split into multiple pushes.
    #[test]
    fn test_envelope_body_chunking() {
        let inscription = InscriptionData {
            content_type: "application/octet-stream".to_string(),
            body: vec![0xaa; 1200],
            reveal_address: p2tr_address(0x22),
        };
        let xonly = key(0x21).pub_key().x_only();
        let script = build_envelope_script(&xonly, &inscription).unwrap();
        let chunks = script.chunks().unwrap();
        let body_pushes: Vec<usize> = chunks
            .iter()
            .filter_map(|c| c.data.as_ref().map(Vec::len))
            .filter(|len| *len == 520 || *len == 160)
            .collect();
        assert_eq!(body_pushes, vec![520, 520, 160]);
    }

    // -----------------------------------------------------------------
    // Full flow
    // -----------------------------------------------------------------

    #[test]
    fn test_inscribe_full_flow() {
        let result = inscribe(&request(1_000_000)).unwrap();
        assert!(!result.commit_tx.is_empty());
        assert_eq!(result.reveal_txs.len(), 2);
        assert_eq!(result.commit_addrs.len(), 2);

        let commit = Transaction::from_hex(&result.commit_tx).unwrap();
        // One commit output per inscription plus change.
        assert_eq!(commit.outputs.len(), 3);

        for (index, reveal_hex) in result.reveal_txs.iter().enumerate() {
            let reveal = Transaction::from_hex(reveal_hex).unwrap();
            // Reveal spends commit output `index`.
            assert_eq!(reveal.inputs[0].prev_txid, *commit.txid().as_bytes());
            assert_eq!(reveal.inputs[0].prev_index, index as u32);
            // Script-path witness: [sig, leaf, control].
            assert_eq!(reveal.inputs[0].witness.len(), 3);
            assert_eq!(reveal.inputs[0].witness[0].len(), 64);
            assert_eq!(reveal.inputs[0].witness[2].len(), 33);
            // Commit pays exactly postage plus the reveal fee.
            assert_eq!(
                commit.outputs[index].value,
                result.reveal_tx_fees[index] + 546
            );
            assert_eq!(reveal.outputs[0].value, 546);
        }
    }

    /// The reveal signature verifies for the committed leaf under the
    /// untweaked internal key.
    #[test]
    fn test_reveal_signature_verifies() {
        let req = request(1_000_000);
        let result = inscribe(&req).unwrap();
        let commit = Transaction::from_hex(&result.commit_tx).unwrap();
        let reveal = Transaction::from_hex(&result.reveal_txs[0]).unwrap();

        let leaf_script = Script::from_bytes(&reveal.inputs[0].witness[1]);
        let leaf = tapleaf_hash(&leaf_script);
        let prevouts = vec![(
            commit.outputs[0].value,
            commit.outputs[0].script_pubkey.clone(),
        )];
        let digest =
            bip341_script_spend_signature_hash(&reveal, 0, &prevouts, SIGHASH_DEFAULT, &leaf)
                .unwrap();

        let internal_x = key(0x21).pub_key().x_only();
        let mut sig = [0u8; 64];
        sig.copy_from_slice(&reveal.inputs[0].witness[0]);
        assert!(schnorr::verify_bip340(&internal_x, &digest, &sig));
    }

    #[test]
    fn test_inscribe_deterministic() {
        let a = inscribe(&request(1_000_000)).unwrap();
        let b = inscribe(&request(1_000_000)).unwrap();
        assert_eq!(a.commit_tx, b.commit_tx);
        assert_eq!(a.reveal_txs, b.reveal_txs);
        assert_eq!(a.commit_addrs, b.commit_addrs);
    }

    /// Underfunding reports the required fees in the result shape
    /// instead of failing.
    #[test]
    fn test_inscribe_insufficient_balance_shape() {
        let result = inscribe(&request(1_000)).unwrap();
        assert!(result.commit_tx.is_empty());
        assert_eq!(result.reveal_txs, vec![String::new(), String::new()]);
        assert!(result.commit_tx_fee > 0);
        assert_eq!(result.reveal_tx_fees.len(), 2);
        assert!(result.reveal_tx_fees.iter().all(|fee| *fee > 0));
        assert_eq!(result.commit_addrs.len(), 2);
    }

    #[test]
    fn test_inscribe_rejects_empty_request() {
        let mut req = request(1_000_000);
        req.inscriptions.clear();
        assert!(matches!(
            inscribe(&req),
            Err(EnvelopeError::Validation(_))
        ));
        let mut req = request(1_000_000);
        req.commit_inputs.clear();
        assert!(matches!(inscribe(&req), Err(EnvelopeError::Validation(_))));
    }

    /// A reveal blowing the standard weight cap fails hard.
    #[test]
    fn test_reveal_weight_cap() {
        let mut req = request(100_000_000);
        // ~450 kB of witness data -> weight past the 400k-unit cap.
        req.inscriptions = vec![InscriptionData {
            content_type: "application/octet-stream".to_string(),
            body: vec![0x55; 450_000],
            reveal_address: p2tr_address(0x22),
        }];
        let err = inscribe(&req).unwrap_err();
        assert!(matches!(
            err,
            EnvelopeError::Transaction(TransactionError::ProtocolLimitExceeded { .. })
        ));
    }

    #[test]
    fn test_commit_outputs_are_taproot() {
        let req = request(1_000_000);
        let result = inscribe(&req).unwrap();
        let commit = Transaction::from_hex(&result.commit_tx).unwrap();
        for output in &commit.outputs[..2] {
            assert!(output.script_pubkey.is_p2tr());
        }
    }
}
