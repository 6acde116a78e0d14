//! The two-party listing exchange.
//!
//! A seller lists a UTXO for a price by signing exactly one input/output
//! pair with SIGHASH_SINGLE|ANYONECANPAY: the signature commits to the
//! seller's own input and the output paying them, and to nothing else, so
//! a buyer can later surround that pair with arbitrary inputs and outputs
//! without invalidating it. The pair lives at a fixed index so both
//! parties serialize the same transaction.
//!
//! States: Unsigned -> SellerPartiallySigned -> BuyerAssembled ->
//! Finalized -> Extracted. The buyer must copy the seller's slot
//! verbatim; re-signing or editing it breaks the SIGHASH_SINGLE
//! commitment.

use btckit_primitives::ec::PrivateKey;
use btckit_script::{Address, NetworkProfile, Script, ScriptKind};
use btckit_transaction::sighash::{
    SIGHASH_ALL, SIGHASH_DEFAULT, SIGHASH_SINGLE_ANYONECANPAY,
};
use btckit_transaction::{
    OutputSpec, PrevOutput, SignatureEngine, Transaction, TxInput, TxOutput, UtxoEntry,
    UtxoSet,
};

use crate::packet::{Psbt, PsbtInput};
use crate::PsbtError;

/// The fixed index both parties place the seller's input/output pair at.
pub const SELLER_SLOT_INDEX: usize = 2;

/// Parameters for a seller creating a listing.
#[derive(Clone, Debug)]
pub struct SellerListing {
    /// The UTXO being sold.
    pub asset_utxo: PrevOutput,
    /// The price in satoshis the seller receives.
    pub price: u64,
    /// The address the price is paid to.
    pub receive_address: String,
    /// Full previous transaction hex, required when the asset UTXO is a
    /// legacy (P2PKH) output so the buyer can finalize it.
    pub prev_tx_hex: Option<String>,
    /// The network all addresses belong to.
    pub network: &'static NetworkProfile,
}

/// Parameters for a buyer completing a listing.
#[derive(Clone, Debug)]
pub struct BuyerOrder {
    /// The seller's partially signed listing.
    pub seller_psbt: Psbt,
    /// The buyer's inputs. The first `SELLER_SLOT_INDEX` fill the slots
    /// before the seller's; the rest follow it.
    pub inputs: Vec<PrevOutput>,
    /// The buyer's outputs, positioned the same way.
    pub outputs: Vec<OutputSpec>,
    /// The network all addresses belong to.
    pub network: &'static NetworkProfile,
}

/// The completed exchange: the extracted transaction and its fee.
#[derive(Clone, Debug)]
pub struct ExchangeResult {
    /// The fully signed final transaction.
    pub tx: Transaction,
    /// The fee: total inputs minus total outputs.
    pub fee: u64,
}

// -----------------------------------------------------------------------
// Seller
// -----------------------------------------------------------------------

/// Build a listing skeleton and sign only the seller's slot.
///
/// The skeleton has `SELLER_SLOT_INDEX + 1` input/output pairs; the
/// non-seller slots are zero-valued placeholders the buyer will replace.
/// The seller's input is signed SIGHASH_SINGLE|ANYONECANPAY, committing
/// to exactly the pair at the fixed index.
///
/// # Arguments
/// * `listing` - The listing parameters.
///
/// # Returns
/// The partially signed PSBT, ready to hand to a buyer.
pub fn seller_create_listing(listing: &SellerListing) -> Result<Psbt, PsbtError> {
    let outpoint = listing.asset_utxo.outpoint()?;
    let asset_script = listing.asset_utxo.script_pubkey(listing.network)?;
    let receive_script =
        Address::to_script_pubkey(&listing.receive_address, listing.network)?;

    // Skeleton: placeholder pairs below the seller slot.
    let mut tx = Transaction::new();
    for i in 0..SELLER_SLOT_INDEX {
        tx.inputs.push(TxInput::new([0u8; 32], i as u32));
        tx.outputs.push(TxOutput::new(0, Script::new()));
    }
    tx.inputs.push(TxInput::new(outpoint.txid, outpoint.vout));
    tx.outputs
        .push(TxOutput::new(listing.price, receive_script));

    let mut psbt = Psbt::from_unsigned_tx(tx.clone())?;

    // Sign the seller slot on a working copy.
    let mut utxos = UtxoSet::new();
    utxos.insert(
        outpoint,
        UtxoEntry {
            value: listing.asset_utxo.value,
            script_pubkey: asset_script.clone(),
        },
    );
    let key = listing.asset_utxo.private_key()?.key;
    SignatureEngine::new(&utxos).sign_input(
        &mut tx,
        SELLER_SLOT_INDEX,
        &key,
        SIGHASH_SINGLE_ANYONECANPAY,
    )?;

    // Record the signature as PSBT signing data at the seller slot.
    let slot = &mut psbt.inputs[SELLER_SLOT_INDEX];
    slot.witness_utxo = Some(TxOutput::new(
        listing.asset_utxo.value,
        asset_script.clone(),
    ));
    slot.sighash_type = Some(SIGHASH_SINGLE_ANYONECANPAY as u32);
    if let Some(prev_tx_hex) = &listing.prev_tx_hex {
        slot.non_witness_utxo = Some(Transaction::from_hex(prev_tx_hex)?);
    }

    let signed_input = &tx.inputs[SELLER_SLOT_INDEX];
    match asset_script.kind() {
        ScriptKind::P2tr => {
            slot.tap_key_sig = Some(signed_input.witness[0].clone());
        }
        ScriptKind::P2wpkh | ScriptKind::P2pkh => {
            let (sig, pubkey) = extract_sig_and_pubkey(signed_input, &asset_script)?;
            slot.partial_sigs.push((pubkey, sig));
        }
        ScriptKind::P2sh => {
            let (sig, pubkey) = extract_sig_and_pubkey(signed_input, &asset_script)?;
            slot.redeem_script = Some(Script::p2wpkh_lock(
                &btckit_primitives::hash::hash160(&pubkey),
            ));
            slot.partial_sigs.push((pubkey, sig));
        }
        other => {
            return Err(PsbtError::AssemblyError(format!(
                "asset utxo has unsupported script kind {:?}",
                other
            )));
        }
    }

    Ok(psbt)
}

/// Pull the (signature, pubkey) pair out of a freshly signed input.
fn extract_sig_and_pubkey(
    input: &TxInput,
    prev_script: &Script,
) -> Result<(Vec<u8>, Vec<u8>), PsbtError> {
    if prev_script.is_p2pkh() {
        let chunks = input
            .signature_script
            .chunks()
            .map_err(|e| PsbtError::AssemblyError(e.to_string()))?;
        let sig = chunks
            .first()
            .and_then(|c| c.data.clone())
            .ok_or_else(|| PsbtError::AssemblyError("missing signature push".to_string()))?;
        let pubkey = chunks
            .get(1)
            .and_then(|c| c.data.clone())
            .ok_or_else(|| PsbtError::AssemblyError("missing pubkey push".to_string()))?;
        Ok((sig, pubkey))
    } else {
        if input.witness.len() != 2 {
            return Err(PsbtError::AssemblyError(
                "expected a two-item witness".to_string(),
            ));
        }
        Ok((input.witness[0].clone(), input.witness[1].clone()))
    }
}

// -----------------------------------------------------------------------
// Buyer
// -----------------------------------------------------------------------

/// Assemble the full transaction around the seller's slot, sign the
/// buyer's inputs, finalize everything, and extract.
///
/// The seller's input/output pair is re-inserted at `SELLER_SLOT_INDEX`
/// with the outpoint copied byte-for-byte, and the seller's PSBT signing
/// data is taken verbatim; nothing in that slot is ever re-derived.
///
/// # Arguments
/// * `order` - The buyer's side of the trade.
///
/// # Returns
/// The extracted transaction and its fee, or `AssemblyError` /
/// `FinalizationError` on a mismatch.
pub fn buyer_assemble_and_sign(order: &BuyerOrder) -> Result<ExchangeResult, PsbtError> {
    let seller = &order.seller_psbt;

    if seller.unsigned_tx.inputs.len() <= SELLER_SLOT_INDEX
        || seller.unsigned_tx.outputs.len() <= SELLER_SLOT_INDEX
    {
        return Err(PsbtError::AssemblyError(format!(
            "listing has no slot {}",
            SELLER_SLOT_INDEX
        )));
    }
    let seller_slot = &seller.inputs[SELLER_SLOT_INDEX];
    if seller_slot.partial_sigs.is_empty()
        && seller_slot.tap_key_sig.is_none()
        && !seller_slot.is_finalized()
    {
        return Err(PsbtError::AssemblyError(
            "seller slot carries no signature".to_string(),
        ));
    }
    if order.inputs.len() < SELLER_SLOT_INDEX || order.outputs.len() < SELLER_SLOT_INDEX {
        return Err(PsbtError::AssemblyError(format!(
            "buyer must supply at least {} inputs and outputs",
            SELLER_SLOT_INDEX
        )));
    }

    let seller_input = seller.unsigned_tx.inputs[SELLER_SLOT_INDEX].clone();
    let seller_output = seller.unsigned_tx.outputs[SELLER_SLOT_INDEX].clone();
    let seller_value = seller_slot
        .witness_utxo
        .as_ref()
        .map(|o| o.value)
        .or_else(|| {
            seller_slot.non_witness_utxo.as_ref().and_then(|tx| {
                tx.outputs
                    .get(seller_input.prev_index as usize)
                    .map(|o| o.value)
            })
        })
        .ok_or_else(|| {
            PsbtError::AssemblyError("seller slot carries no utxo data".to_string())
        })?;

    // Assemble the intended transaction: buyer slots around the seller's.
    let mut tx = Transaction::new();
    let mut utxos = UtxoSet::new();
    let mut total_in: u64 = seller_value;
    let mut keys: Vec<Option<PrivateKey>> = Vec::new();

    let mut buyer_inputs = order.inputs.iter();
    let mut buyer_outputs = order.outputs.iter();
    let slot_count = order.inputs.len() + 1;
    for index in 0..slot_count {
        if index == SELLER_SLOT_INDEX {
            // The seller's outpoint, byte-for-byte.
            tx.inputs.push(seller_input.clone());
            tx.outputs.push(seller_output.clone());
            if let Some(utxo) = &seller_slot.witness_utxo {
                utxos.insert(
                    btckit_transaction::Outpoint::new(
                        seller_input.prev_txid,
                        seller_input.prev_index,
                    ),
                    UtxoEntry {
                        value: utxo.value,
                        script_pubkey: utxo.script_pubkey.clone(),
                    },
                );
            }
            keys.push(None);
            continue;
        }
        let prev = buyer_inputs.next().ok_or_else(|| {
            PsbtError::AssemblyError("ran out of buyer inputs".to_string())
        })?;
        let outpoint = prev.outpoint()?;
        let script_pubkey = prev.script_pubkey(order.network)?;
        utxos.insert(
            outpoint,
            UtxoEntry {
                value: prev.value,
                script_pubkey,
            },
        );
        tx.inputs.push(TxInput::new(outpoint.txid, outpoint.vout));
        total_in += prev.value;
        keys.push(Some(prev.private_key()?.key));

        if let Some(spec) = buyer_outputs.next() {
            tx.outputs
                .push(TxOutput::new(spec.value, spec.script_pubkey(order.network)?));
        }
    }
    // Any remaining buyer outputs append after the paired slots.
    for spec in buyer_outputs {
        tx.outputs
            .push(TxOutput::new(spec.value, spec.script_pubkey(order.network)?));
    }

    let mut psbt = Psbt::from_unsigned_tx(tx.clone())?;
    // The seller's signing data, verbatim. Never re-derived: re-signing
    // would break the SIGHASH_SINGLE commitment.
    psbt.inputs[SELLER_SLOT_INDEX] = seller_slot.clone();

    // Sign every non-seller input with SIGHASH_ALL.
    let engine = SignatureEngine::new(&utxos);
    let mut working = tx;
    for (index, key) in keys.iter().enumerate() {
        let Some(key) = key else { continue };
        let outpoint = btckit_transaction::Outpoint::new(
            working.inputs[index].prev_txid,
            working.inputs[index].prev_index,
        );
        let kind = utxos
            .get(&outpoint)
            .map(|e| e.script_pubkey.kind())
            .unwrap_or(ScriptKind::NonStandard);
        let flag = if kind == ScriptKind::P2tr {
            SIGHASH_DEFAULT
        } else {
            SIGHASH_ALL
        };
        engine.sign_input(&mut working, index, key, flag)?;

        // The engine's output is already final-form authorization data.
        let slot = &mut psbt.inputs[index];
        if let Some(entry) = utxos.get(&outpoint) {
            slot.witness_utxo = Some(TxOutput::new(
                entry.value,
                entry.script_pubkey.clone(),
            ));
        }
        if !working.inputs[index].witness.is_empty() {
            slot.final_script_witness = Some(working.inputs[index].witness.clone());
        }
        if !working.inputs[index].signature_script.is_empty() {
            slot.final_script_sig = Some(working.inputs[index].signature_script.clone());
        }
    }

    // Finalize the seller slot from its partial data, then extract.
    finalize_input(&mut psbt, SELLER_SLOT_INDEX)?;
    for index in 0..psbt.inputs.len() {
        if !psbt.inputs[index].is_finalized() {
            return Err(PsbtError::FinalizationError {
                input: index,
                reason: "input left unsigned by assembly".to_string(),
            });
        }
    }
    let final_tx = extract_tx(&psbt)?;

    let total_out = final_tx.total_output_value();
    let fee = total_in.checked_sub(total_out).ok_or_else(|| {
        PsbtError::AssemblyError("outputs exceed inputs".to_string())
    })?;

    Ok(ExchangeResult { tx: final_tx, fee })
}

// -----------------------------------------------------------------------
// Finalization and extraction
// -----------------------------------------------------------------------

/// Convert one input's signing data into final form.
///
/// # Arguments
/// * `psbt` - The packet being finalized.
/// * `index` - The input to finalize.
///
/// # Returns
/// `Ok(())`, or `FinalizationError` when required data is missing: a
/// legacy input without its non-witness UTXO cannot be finalized.
pub fn finalize_input(psbt: &mut Psbt, index: usize) -> Result<(), PsbtError> {
    if index >= psbt.inputs.len() {
        return Err(PsbtError::FinalizationError {
            input: index,
            reason: "input index out of range".to_string(),
        });
    }
    if psbt.inputs[index].is_finalized() {
        return Ok(());
    }

    let prev_index = psbt.unsigned_tx.inputs[index].prev_index as usize;
    let input = &mut psbt.inputs[index];

    let prev_script = if let Some(utxo) = &input.witness_utxo {
        utxo.script_pubkey.clone()
    } else if let Some(prev_tx) = &input.non_witness_utxo {
        prev_tx
            .outputs
            .get(prev_index)
            .map(|o| o.script_pubkey.clone())
            .ok_or_else(|| PsbtError::FinalizationError {
                input: index,
                reason: "non-witness utxo lacks the spent output".to_string(),
            })?
    } else {
        return Err(PsbtError::FinalizationError {
            input: index,
            reason: "missing witness and non-witness utxo data".to_string(),
        });
    };

    match prev_script.kind() {
        ScriptKind::P2tr => {
            let sig = input.tap_key_sig.take().ok_or_else(|| {
                PsbtError::FinalizationError {
                    input: index,
                    reason: "missing taproot key signature".to_string(),
                }
            })?;
            input.final_script_witness = Some(vec![sig]);
        }
        ScriptKind::P2wpkh => {
            let (pubkey, sig) = take_partial_sig(input, index)?;
            input.final_script_witness = Some(vec![sig, pubkey]);
        }
        ScriptKind::P2sh => {
            let redeem = input.redeem_script.clone().ok_or_else(|| {
                PsbtError::FinalizationError {
                    input: index,
                    reason: "missing redeem script".to_string(),
                }
            })?;
            let (pubkey, sig) = take_partial_sig(input, index)?;
            input.final_script_witness = Some(vec![sig, pubkey]);
            let mut script_sig = Script::new();
            script_sig
                .append_push_data(redeem.to_bytes())
                .map_err(|e| PsbtError::FinalizationError {
                    input: index,
                    reason: e.to_string(),
                })?;
            input.final_script_sig = Some(script_sig);
        }
        ScriptKind::P2pkh => {
            // BIP-174 requires the full previous transaction for legacy
            // inputs; a witness utxo alone is not acceptable.
            if input.non_witness_utxo.is_none() {
                return Err(PsbtError::FinalizationError {
                    input: index,
                    reason: "legacy input requires its non-witness utxo".to_string(),
                });
            }
            let (pubkey, sig) = take_partial_sig(input, index)?;
            let mut script_sig = Script::new();
            script_sig
                .append_push_data(&sig)
                .and_then(|_| script_sig.append_push_data(&pubkey))
                .map_err(|e| PsbtError::FinalizationError {
                    input: index,
                    reason: e.to_string(),
                })?;
            input.final_script_sig = Some(script_sig);
        }
        other => {
            return Err(PsbtError::FinalizationError {
                input: index,
                reason: format!("unsupported script kind {:?}", other),
            });
        }
    }

    // Signing data is spent once final forms exist.
    input.partial_sigs.clear();
    input.sighash_type = None;
    input.redeem_script = None;
    Ok(())
}

fn take_partial_sig(
    input: &mut PsbtInput,
    index: usize,
) -> Result<(Vec<u8>, Vec<u8>), PsbtError> {
    input
        .partial_sigs
        .first()
        .cloned()
        .ok_or_else(|| PsbtError::FinalizationError {
            input: index,
            reason: "missing partial signature".to_string(),
        })
}

/// Extract the final transaction from a fully finalized packet.
///
/// # Arguments
/// * `psbt` - The finalized packet.
///
/// # Returns
/// The broadcastable transaction, or `FinalizationError` naming the
/// first unfinalized input.
pub fn extract_tx(psbt: &Psbt) -> Result<Transaction, PsbtError> {
    let mut tx = psbt.unsigned_tx.clone();
    for (index, input) in psbt.inputs.iter().enumerate() {
        if !input.is_finalized() {
            return Err(PsbtError::FinalizationError {
                input: index,
                reason: "not finalized".to_string(),
            });
        }
        if let Some(script_sig) = &input.final_script_sig {
            tx.inputs[index].signature_script = script_sig.clone();
        }
        if let Some(witness) = &input.final_script_witness {
            tx.inputs[index].witness = witness.clone();
        }
    }
    Ok(tx)
}

#[cfg(test)]
mod tests {
    //! End-to-end exchange tests: listing, assembly, the verbatim-slot
    //! invariant, and the failure modes.

    use super::*;
    use btckit_primitives::ec::schnorr;
    use btckit_script::network::MAINNET;

    fn key(fill: u8) -> PrivateKey {
        PrivateKey::from_bytes(&[fill; 32]).expect("valid scalar")
    }

    fn wif(fill: u8) -> String {
        key(fill).to_wif(MAINNET.wif_version)
    }

    fn p2wpkh_address(fill: u8) -> String {
        let script = Script::p2wpkh_lock(&key(fill).pub_key().hash160());
        Address::from_script(&script, &MAINNET).unwrap().encode()
    }

    fn p2tr_address(fill: u8) -> String {
        let output = schnorr::taproot_output_key(&key(fill).pub_key().x_only(), None).unwrap();
        let script = Script::p2tr_lock(&output.x_only);
        Address::from_script(&script, &MAINNET).unwrap().encode()
    }

    fn seller_listing() -> SellerListing {
        SellerListing {
            asset_utxo: PrevOutput {
                txid: "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b"
                    .to_string(),
                vout: 0,
                value: 10_000,
                address: Some(p2tr_address(0x51)),
                script_hex: None,
                private_key_wif: wif(0x51),
            },
            price: 50_000,
            receive_address: p2wpkh_address(0x52),
            prev_tx_hex: None,
            network: &MAINNET,
        }
    }

    fn buyer_input(fill: u8, vout: u32, value: u64) -> PrevOutput {
        PrevOutput {
            txid: "6fe28c0ab6f1b372c1a6a246ae63f74f931e8365e15a089c68d6190000000000"
                .to_string(),
            vout,
            value,
            address: Some(p2wpkh_address(fill)),
            script_hex: None,
            private_key_wif: wif(fill),
        }
    }

    fn buyer_order(seller_psbt: Psbt) -> BuyerOrder {
        BuyerOrder {
            seller_psbt,
            inputs: vec![
                buyer_input(0x61, 0, 30_000),
                buyer_input(0x62, 1, 40_000),
            ],
            outputs: vec![
                // The asset goes to the buyer.
                OutputSpec::to_address(&p2tr_address(0x63), 10_000),
                // Buyer change.
                OutputSpec::to_address(&p2wpkh_address(0x64), 9_000),
            ],
            network: &MAINNET,
        }
    }

    // -----------------------------------------------------------------
    // Seller
    // -----------------------------------------------------------------

    #[test]
    fn test_listing_shape() {
        let psbt = seller_create_listing(&seller_listing()).unwrap();
        assert_eq!(psbt.unsigned_tx.inputs.len(), SELLER_SLOT_INDEX + 1);
        assert_eq!(psbt.unsigned_tx.outputs.len(), SELLER_SLOT_INDEX + 1);
        // Placeholder slots are zero-valued.
        assert_eq!(psbt.unsigned_tx.outputs[0].value, 0);
        assert_eq!(psbt.unsigned_tx.outputs[1].value, 0);
        assert_eq!(psbt.unsigned_tx.outputs[SELLER_SLOT_INDEX].value, 50_000);
        // Only the seller slot is signed.
        assert!(psbt.inputs[0].partial_sigs.is_empty());
        assert!(psbt.inputs[SELLER_SLOT_INDEX].tap_key_sig.is_some());
        assert_eq!(
            psbt.inputs[SELLER_SLOT_INDEX].sighash_type,
            Some(SIGHASH_SINGLE_ANYONECANPAY as u32)
        );
    }

    /// The listing must survive the wire: decode(encode) is identity.
    #[test]
    fn test_listing_roundtrips_as_base64() {
        let psbt = seller_create_listing(&seller_listing()).unwrap();
        let parsed = Psbt::from_base64(&psbt.to_base64()).unwrap();
        assert_eq!(parsed, psbt);
    }

    // -----------------------------------------------------------------
    // Buyer
    // -----------------------------------------------------------------

    #[test]
    fn test_full_exchange() {
        let psbt = seller_create_listing(&seller_listing()).unwrap();
        let seller_sig = psbt.inputs[SELLER_SLOT_INDEX].tap_key_sig.clone().unwrap();

        let result = buyer_assemble_and_sign(&buyer_order(psbt)).unwrap();

        // Three inputs, three outputs, all signed.
        assert_eq!(result.tx.inputs.len(), 3);
        assert_eq!(result.tx.outputs.len(), 3);
        for input in &result.tx.inputs {
            assert!(!input.is_unsigned());
        }
        // The seller's signature appears verbatim in the final witness.
        assert_eq!(result.tx.inputs[SELLER_SLOT_INDEX].witness[0], seller_sig);
        // Fee = (30k + 40k + 10k) - (10k + 9k + 50k).
        assert_eq!(result.fee, 11_000);
    }

    /// Byte-determinism across repeated assemblies.
    #[test]
    fn test_exchange_deterministic() {
        let psbt = seller_create_listing(&seller_listing()).unwrap();
        let a = buyer_assemble_and_sign(&buyer_order(psbt.clone())).unwrap();
        let b = buyer_assemble_and_sign(&buyer_order(psbt)).unwrap();
        assert_eq!(a.tx.to_hex(), b.tx.to_hex());
    }

    /// A segwit-v0 asset listing exchanges just as well.
    #[test]
    fn test_exchange_with_p2wpkh_asset() {
        let mut listing = seller_listing();
        listing.asset_utxo.address = Some(p2wpkh_address(0x51));
        let psbt = seller_create_listing(&listing).unwrap();
        assert!(!psbt.inputs[SELLER_SLOT_INDEX].partial_sigs.is_empty());

        let result = buyer_assemble_and_sign(&buyer_order(psbt)).unwrap();
        assert_eq!(result.tx.inputs[SELLER_SLOT_INDEX].witness.len(), 2);
        assert_eq!(result.fee, 11_000);
    }

    // -----------------------------------------------------------------
    // Failures
    // -----------------------------------------------------------------

    #[test]
    fn test_unsigned_listing_rejected() {
        let mut tx = Transaction::new();
        for i in 0..=SELLER_SLOT_INDEX {
            tx.inputs.push(TxInput::new([0u8; 32], i as u32));
            tx.outputs.push(TxOutput::new(0, Script::new()));
        }
        let psbt = Psbt::from_unsigned_tx(tx).unwrap();
        let err = buyer_assemble_and_sign(&buyer_order(psbt)).unwrap_err();
        assert!(matches!(err, PsbtError::AssemblyError(_)));
    }

    #[test]
    fn test_short_listing_rejected() {
        let mut tx = Transaction::new();
        tx.inputs.push(TxInput::new([0u8; 32], 0));
        tx.outputs.push(TxOutput::new(0, Script::new()));
        let psbt = Psbt::from_unsigned_tx(tx).unwrap();
        let err = buyer_assemble_and_sign(&buyer_order(psbt)).unwrap_err();
        assert!(matches!(err, PsbtError::AssemblyError(_)));
    }

    #[test]
    fn test_buyer_with_too_few_inputs_rejected() {
        let psbt = seller_create_listing(&seller_listing()).unwrap();
        let mut order = buyer_order(psbt);
        order.inputs.truncate(1);
        let err = buyer_assemble_and_sign(&order).unwrap_err();
        assert!(matches!(err, PsbtError::AssemblyError(_)));
    }

    /// A legacy asset input without its previous transaction cannot be
    /// finalized.
    #[test]
    fn test_legacy_input_without_prev_tx_fails_finalization() {
        let mut tx = Transaction::new();
        tx.inputs.push(TxInput::new([0x31; 32], 0));
        tx.outputs.push(TxOutput::new(1_000, Script::new()));
        let mut psbt = Psbt::from_unsigned_tx(tx).unwrap();
        psbt.inputs[0].witness_utxo = Some(TxOutput::new(
            2_000,
            Script::p2pkh_lock(&key(0x71).pub_key().hash160()),
        ));
        psbt.inputs[0]
            .partial_sigs
            .push((key(0x71).pub_key().to_compressed().to_vec(), vec![0x30]));

        let err = finalize_input(&mut psbt, 0).unwrap_err();
        assert!(matches!(err, PsbtError::FinalizationError { input: 0, .. }));
    }

    #[test]
    fn test_extract_requires_all_finalized() {
        let psbt = seller_create_listing(&seller_listing()).unwrap();
        assert!(matches!(
            extract_tx(&psbt),
            Err(PsbtError::FinalizationError { .. })
        ));
    }
}
