//! Per-input signing dispatched from prevout script bytes.
//!
//! The engine never trusts a caller-declared address type: the sighash
//! algorithm and the witness/signature-script shape are both derived from
//! the classification of the spent output's script. Each call mutates
//! exactly one input.

use btckit_primitives::ec::{schnorr, PrivateKey};
use btckit_script::{Script, ScriptKind};

use crate::sighash::{
    bip143_signature_hash, bip341_signature_hash, legacy_signature_hash, SIGHASH_DEFAULT,
};
use crate::transaction::Transaction;
use crate::utxo::{Outpoint, UtxoSet};
use crate::TransactionError;

/// Signs transaction inputs against an explicit UTXO set.
///
/// The set must contain an entry for every input of the transaction being
/// signed: taproot digests commit to all prevout amounts and scripts, not
/// just the one being spent.
pub struct SignatureEngine<'a> {
    utxos: &'a UtxoSet,
}

impl<'a> SignatureEngine<'a> {
    /// Create an engine over the given UTXO set.
    ///
    /// # Arguments
    /// * `utxos` - Resolved prevout data for the transaction's inputs.
    ///
    /// # Returns
    /// A new `SignatureEngine`.
    pub fn new(utxos: &'a UtxoSet) -> Self {
        SignatureEngine { utxos }
    }

    /// Sign one input, writing its witness or signature script.
    ///
    /// Dispatch derives from the prevout script:
    /// - P2TR: BIP-341 key-path digest, Schnorr signature, single witness
    ///   item; the sighash byte is appended only when the flag is not
    ///   DEFAULT.
    /// - P2PKH: legacy digest, DER signature + flag byte + pubkey in the
    ///   signature script.
    /// - P2WPKH: BIP-143 digest, two-item witness.
    /// - P2SH (treated as nested P2WPKH): the P2WPKH witness plus a
    ///   signature script pushing the redeem script.
    ///
    /// # Arguments
    /// * `tx` - The transaction; `tx.inputs[input_index]` is mutated.
    /// * `input_index` - Index of the input to sign.
    /// * `key` - The private key.
    /// * `sighash_flag` - The sighash flag to commit and append.
    ///
    /// # Returns
    /// `Ok(())` on success; `UnknownScriptType` for unsupported prevouts;
    /// `SigningFailure` if the cryptographic operation fails.
    pub fn sign_input(
        &self,
        tx: &mut Transaction,
        input_index: usize,
        key: &PrivateKey,
        sighash_flag: u8,
    ) -> Result<(), TransactionError> {
        if input_index >= tx.inputs.len() {
            return Err(TransactionError::Validation(format!(
                "input index {} out of range (tx has {} inputs)",
                input_index,
                tx.inputs.len()
            )));
        }

        let outpoint = Outpoint::new(
            tx.inputs[input_index].prev_txid,
            tx.inputs[input_index].prev_index,
        );
        let entry = self.utxos.require(&outpoint)?;
        let prev_script = entry.script_pubkey.clone();
        let prev_value = entry.value;

        match prev_script.kind() {
            ScriptKind::P2tr => self.sign_p2tr(tx, input_index, key, sighash_flag),
            ScriptKind::P2pkh => {
                sign_p2pkh(tx, input_index, &prev_script, key, sighash_flag)
            }
            ScriptKind::P2wpkh => {
                sign_p2wpkh(tx, input_index, &prev_script, prev_value, key, sighash_flag)
            }
            ScriptKind::P2sh => {
                sign_p2sh_p2wpkh(tx, input_index, prev_value, key, sighash_flag)
            }
            other => Err(TransactionError::UnknownScriptType(format!(
                "{:?}: {}",
                other,
                prev_script.to_hex()
            ))),
        }
    }

    /// Sign every input of the transaction with one key per input.
    ///
    /// # Arguments
    /// * `tx` - The transaction to sign.
    /// * `keys` - One private key per input, in input order.
    /// * `sighash_flag` - The flag applied to every input; taproot inputs
    ///   map `SIGHASH_ALL` to `SIGHASH_DEFAULT` internally via the caller
    ///   passing DEFAULT.
    ///
    /// # Returns
    /// `Ok(())`, or the first signing error.
    pub fn sign_all(
        &self,
        tx: &mut Transaction,
        keys: &[PrivateKey],
        sighash_flag: u8,
    ) -> Result<(), TransactionError> {
        if keys.len() != tx.inputs.len() {
            return Err(TransactionError::Validation(format!(
                "{} keys supplied for {} inputs",
                keys.len(),
                tx.inputs.len()
            )));
        }
        for index in 0..tx.inputs.len() {
            self.sign_input(tx, index, &keys[index], sighash_flag)?;
        }
        Ok(())
    }

    fn sign_p2tr(
        &self,
        tx: &mut Transaction,
        input_index: usize,
        key: &PrivateKey,
        sighash_flag: u8,
    ) -> Result<(), TransactionError> {
        // Taproot commits to every prevout; collect them in input order.
        // With ANYONECANPAY only the signed input's entry is read, so
        // placeholder inputs (listing skeletons) may be absent from the set.
        let anyone_can_pay = sighash_flag & crate::sighash::SIGHASH_ANYONECANPAY != 0;
        let mut prevouts = Vec::with_capacity(tx.inputs.len());
        for (i, input) in tx.inputs.iter().enumerate() {
            let outpoint = Outpoint::new(input.prev_txid, input.prev_index);
            if anyone_can_pay && i != input_index {
                let entry = self.utxos.get(&outpoint);
                prevouts.push(match entry {
                    Some(e) => (e.value, e.script_pubkey.clone()),
                    None => (0, Script::new()),
                });
            } else {
                let entry = self.utxos.require(&outpoint)?;
                prevouts.push((entry.value, entry.script_pubkey.clone()));
            }
        }

        let digest = bip341_signature_hash(tx, input_index, &prevouts, sighash_flag)?;

        // Key-path spend signs with the tweaked key (empty script tree).
        let tweaked = schnorr::tweaked_signing_key(key, None)
            .map_err(|e| TransactionError::SigningFailure(e.to_string()))?;
        let signature = schnorr::sign_bip340(&tweaked, &digest)
            .map_err(|e| TransactionError::SigningFailure(e.to_string()))?;

        let mut item = signature.to_vec();
        if sighash_flag != SIGHASH_DEFAULT {
            item.push(sighash_flag);
        }

        let input = &mut tx.inputs[input_index];
        input.witness = vec![item];
        input.signature_script = Script::new();
        Ok(())
    }
}

fn sign_p2pkh(
    tx: &mut Transaction,
    input_index: usize,
    prev_script: &Script,
    key: &PrivateKey,
    sighash_flag: u8,
) -> Result<(), TransactionError> {
    let digest = legacy_signature_hash(tx, input_index, prev_script, sighash_flag)?;
    let signature = key
        .sign(&digest)
        .map_err(|e| TransactionError::SigningFailure(e.to_string()))?;

    let mut sig_with_flag = signature.to_der();
    sig_with_flag.push(sighash_flag);

    let mut script = Script::new();
    script.append_push_data(&sig_with_flag)?;
    script.append_push_data(&key.pub_key().to_compressed())?;

    let input = &mut tx.inputs[input_index];
    input.signature_script = script;
    input.witness = Vec::new();
    Ok(())
}

fn sign_p2wpkh(
    tx: &mut Transaction,
    input_index: usize,
    prev_script: &Script,
    prev_value: u64,
    key: &PrivateKey,
    sighash_flag: u8,
) -> Result<(), TransactionError> {
    // BIP-143 script code for a keyhash program is the matching P2PKH form.
    let program = prev_script.program()?;
    let mut hash = [0u8; 20];
    hash.copy_from_slice(&program);
    let script_code = Script::p2pkh_lock(&hash);

    let digest =
        bip143_signature_hash(tx, input_index, &script_code, prev_value, sighash_flag)?;
    let signature = key
        .sign(&digest)
        .map_err(|e| TransactionError::SigningFailure(e.to_string()))?;

    let mut sig_with_flag = signature.to_der();
    sig_with_flag.push(sighash_flag);

    let input = &mut tx.inputs[input_index];
    input.witness = vec![sig_with_flag, key.pub_key().to_compressed().to_vec()];
    input.signature_script = Script::new();
    Ok(())
}

fn sign_p2sh_p2wpkh(
    tx: &mut Transaction,
    input_index: usize,
    prev_value: u64,
    key: &PrivateKey,
    sighash_flag: u8,
) -> Result<(), TransactionError> {
    // The redeem script is the P2WPKH program for this key; the witness is
    // identical to a native P2WPKH spend.
    let pubkey_hash = key.pub_key().hash160();
    let redeem = Script::p2wpkh_lock(&pubkey_hash);
    let script_code = Script::p2pkh_lock(&pubkey_hash);

    let digest =
        bip143_signature_hash(tx, input_index, &script_code, prev_value, sighash_flag)?;
    let signature = key
        .sign(&digest)
        .map_err(|e| TransactionError::SigningFailure(e.to_string()))?;

    let mut sig_with_flag = signature.to_der();
    sig_with_flag.push(sighash_flag);

    let mut signature_script = Script::new();
    signature_script.append_push_data(redeem.to_bytes())?;

    let input = &mut tx.inputs[input_index];
    input.witness = vec![sig_with_flag, key.pub_key().to_compressed().to_vec()];
    input.signature_script = signature_script;
    Ok(())
}
