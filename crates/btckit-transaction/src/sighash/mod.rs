//! Signature hash computation for the three script generations.
//!
//! Each script kind commits to a different digest:
//! - legacy (P2PKH): the blanked-script serialization, double-SHA256;
//! - segwit v0 (P2WPKH, BIP-143): the prevout/sequence/output midstate
//!   form committing to the spent value, double-SHA256;
//! - segwit v1 (P2TR, BIP-341): the tagged-hash form committing to all
//!   prevout amounts and scripts, single-SHA256 components.
//!
//! All three honor the SIGHASH flag families, including the historical
//! legacy SIGHASH_SINGLE out-of-range digest of one.

use btckit_primitives::hash::{sha256, sha256d, tagged_sha256};
use btckit_primitives::util::{ByteWriter, VarInt};
use btckit_script::Script;

use crate::transaction::Transaction;
use crate::TransactionError;

// -----------------------------------------------------------------------
// Sighash flag constants
// -----------------------------------------------------------------------

/// Taproot-only default: commits like ALL, no byte appended to signatures.
pub const SIGHASH_DEFAULT: u8 = 0x00;

/// Sign all inputs and all outputs.
pub const SIGHASH_ALL: u8 = 0x01;

/// Sign all inputs but no outputs.
pub const SIGHASH_NONE: u8 = 0x02;

/// Sign all inputs and only the output at the signed input's index.
pub const SIGHASH_SINGLE: u8 = 0x03;

/// Combined with a base flag: commit only to the signed input, allowing
/// other inputs to be added without invalidating the signature.
pub const SIGHASH_ANYONECANPAY: u8 = 0x80;

/// Mask extracting the base flag (ALL, NONE, SINGLE).
pub const SIGHASH_MASK: u8 = 0x1f;

/// The flag a listing seller signs with: commit to exactly one input and
/// one output.
pub const SIGHASH_SINGLE_ANYONECANPAY: u8 = SIGHASH_SINGLE | SIGHASH_ANYONECANPAY;

// -----------------------------------------------------------------------
// Legacy sighash
// -----------------------------------------------------------------------

/// Compute the legacy (pre-segwit) signature hash for one input.
///
/// Serializes a modified copy of the transaction: every signature script
/// blanked except the signed input, which carries the script code; then
/// applies the NONE/SINGLE/ANYONECANPAY transformations, appends the
/// 4-byte flag, and double-hashes.
///
/// # Arguments
/// * `tx` - The transaction being signed.
/// * `input_index` - Index of the input being signed.
/// * `script_code` - The locking script of the output being spent.
/// * `sighash_flag` - The combined sighash flags.
///
/// # Returns
/// A 32-byte digest, or an error for an out-of-range input index.
pub fn legacy_signature_hash(
    tx: &Transaction,
    input_index: usize,
    script_code: &Script,
    sighash_flag: u8,
) -> Result<[u8; 32], TransactionError> {
    if input_index >= tx.inputs.len() {
        return Err(TransactionError::Validation(format!(
            "input index {} out of range (tx has {} inputs)",
            input_index,
            tx.inputs.len()
        )));
    }

    let base = sighash_flag & SIGHASH_MASK;
    let anyone_can_pay = sighash_flag & SIGHASH_ANYONECANPAY != 0;

    // Historical consensus quirk: SIGHASH_SINGLE with no matching output
    // signs the digest 0x01 followed by zeros.
    if base == SIGHASH_SINGLE && input_index >= tx.outputs.len() {
        let mut one = [0u8; 32];
        one[0] = 0x01;
        return Ok(one);
    }

    let mut writer = ByteWriter::with_capacity(256);
    writer.write_u32_le(tx.version);

    // Inputs.
    if anyone_can_pay {
        writer.write_varint(VarInt(1));
        let input = &tx.inputs[input_index];
        writer.write_bytes(&input.prev_txid);
        writer.write_u32_le(input.prev_index);
        writer.write_var_bytes(script_code.to_bytes());
        writer.write_u32_le(input.sequence);
    } else {
        writer.write_varint(VarInt::from(tx.inputs.len()));
        for (i, input) in tx.inputs.iter().enumerate() {
            writer.write_bytes(&input.prev_txid);
            writer.write_u32_le(input.prev_index);
            if i == input_index {
                writer.write_var_bytes(script_code.to_bytes());
            } else {
                writer.write_varint(VarInt(0));
            }
            // Other inputs' sequences are zeroed for NONE/SINGLE so they
            // stay malleable.
            let sequence = if i != input_index && (base == SIGHASH_NONE || base == SIGHASH_SINGLE)
            {
                0
            } else {
                input.sequence
            };
            writer.write_u32_le(sequence);
        }
    }

    // Outputs.
    match base {
        SIGHASH_NONE => writer.write_varint(VarInt(0)),
        SIGHASH_SINGLE => {
            writer.write_varint(VarInt::from(input_index + 1));
            for _ in 0..input_index {
                // Blanked output: value -1, empty script.
                writer.write_u64_le(u64::MAX);
                writer.write_varint(VarInt(0));
            }
            writer.write_bytes(&tx.outputs[input_index].to_bytes());
        }
        _ => {
            writer.write_varint(VarInt::from(tx.outputs.len()));
            for output in &tx.outputs {
                writer.write_bytes(&output.to_bytes());
            }
        }
    }

    writer.write_u32_le(tx.lock_time);
    writer.write_u32_le(sighash_flag as u32);

    Ok(sha256d(writer.as_bytes()))
}

// -----------------------------------------------------------------------
// BIP-143 (segwit v0) sighash
// -----------------------------------------------------------------------

/// Compute the BIP-143 signature hash for a segwit-v0 input.
///
/// Commits to the value being spent, so an offline signer cannot be lied
/// to about the fee.
///
/// # Arguments
/// * `tx` - The transaction being signed.
/// * `input_index` - Index of the input being signed.
/// * `script_code` - For P2WPKH, the corresponding P2PKH script.
/// * `value` - The satoshi value of the output being spent.
/// * `sighash_flag` - The combined sighash flags.
///
/// # Returns
/// A 32-byte digest, or an error for an out-of-range input index.
pub fn bip143_signature_hash(
    tx: &Transaction,
    input_index: usize,
    script_code: &Script,
    value: u64,
    sighash_flag: u8,
) -> Result<[u8; 32], TransactionError> {
    if input_index >= tx.inputs.len() {
        return Err(TransactionError::Validation(format!(
            "input index {} out of range (tx has {} inputs)",
            input_index,
            tx.inputs.len()
        )));
    }

    let base = sighash_flag & SIGHASH_MASK;
    let anyone_can_pay = sighash_flag & SIGHASH_ANYONECANPAY != 0;
    let input = &tx.inputs[input_index];

    let hash_prevouts = if anyone_can_pay {
        [0u8; 32]
    } else {
        let mut w = ByteWriter::with_capacity(tx.inputs.len() * 36);
        for i in &tx.inputs {
            w.write_bytes(&i.prev_txid);
            w.write_u32_le(i.prev_index);
        }
        sha256d(w.as_bytes())
    };

    let hash_sequence =
        if anyone_can_pay || base == SIGHASH_SINGLE || base == SIGHASH_NONE {
            [0u8; 32]
        } else {
            let mut w = ByteWriter::with_capacity(tx.inputs.len() * 4);
            for i in &tx.inputs {
                w.write_u32_le(i.sequence);
            }
            sha256d(w.as_bytes())
        };

    let hash_outputs = if base != SIGHASH_SINGLE && base != SIGHASH_NONE {
        let mut w = ByteWriter::new();
        for output in &tx.outputs {
            w.write_bytes(&output.to_bytes());
        }
        sha256d(w.as_bytes())
    } else if base == SIGHASH_SINGLE && input_index < tx.outputs.len() {
        sha256d(&tx.outputs[input_index].to_bytes())
    } else {
        [0u8; 32]
    };

    let mut writer = ByteWriter::with_capacity(156 + script_code.len());
    writer.write_u32_le(tx.version);
    writer.write_bytes(&hash_prevouts);
    writer.write_bytes(&hash_sequence);
    writer.write_bytes(&input.prev_txid);
    writer.write_u32_le(input.prev_index);
    writer.write_var_bytes(script_code.to_bytes());
    writer.write_u64_le(value);
    writer.write_u32_le(input.sequence);
    writer.write_bytes(&hash_outputs);
    writer.write_u32_le(tx.lock_time);
    writer.write_u32_le(sighash_flag as u32);

    Ok(sha256d(writer.as_bytes()))
}

// -----------------------------------------------------------------------
// BIP-341 (taproot) sighash
// -----------------------------------------------------------------------

/// Compute the BIP-341 key-path signature hash for a taproot input.
///
/// Commits to every prevout's amount and script (unless ANYONECANPAY),
/// using single-SHA256 component hashes inside a "TapSighash" tagged hash.
/// `SIGHASH_DEFAULT` (0x00) commits like ALL.
///
/// # Arguments
/// * `tx` - The transaction being signed.
/// * `input_index` - Index of the input being signed.
/// * `prevouts` - Value and script of every input's prevout, in input
///   order. With ANYONECANPAY only the signed input's entry is read.
/// * `sighash_flag` - The sighash flag (DEFAULT, or a legacy combination).
///
/// # Returns
/// A 32-byte digest, or an error for out-of-range indexes or a prevout
/// list of the wrong length.
pub fn bip341_signature_hash(
    tx: &Transaction,
    input_index: usize,
    prevouts: &[(u64, Script)],
    sighash_flag: u8,
) -> Result<[u8; 32], TransactionError> {
    bip341_signature_hash_inner(tx, input_index, prevouts, sighash_flag, None)
}

/// Compute the BIP-341 script-path signature hash for a taproot input.
///
/// Identical to the key-path digest except for the spend type byte and
/// the trailing leaf commitment (tapleaf hash, key version, and
/// code-separator position).
///
/// # Arguments
/// * `tx` - The transaction being signed.
/// * `input_index` - Index of the input being signed.
/// * `prevouts` - Value and script of every input's prevout.
/// * `sighash_flag` - The sighash flag.
/// * `leaf_hash` - The tapleaf hash of the script being satisfied.
///
/// # Returns
/// A 32-byte digest, or a validation error.
pub fn bip341_script_spend_signature_hash(
    tx: &Transaction,
    input_index: usize,
    prevouts: &[(u64, Script)],
    sighash_flag: u8,
    leaf_hash: &[u8; 32],
) -> Result<[u8; 32], TransactionError> {
    bip341_signature_hash_inner(tx, input_index, prevouts, sighash_flag, Some(leaf_hash))
}

fn bip341_signature_hash_inner(
    tx: &Transaction,
    input_index: usize,
    prevouts: &[(u64, Script)],
    sighash_flag: u8,
    leaf_hash: Option<&[u8; 32]>,
) -> Result<[u8; 32], TransactionError> {
    if input_index >= tx.inputs.len() {
        return Err(TransactionError::Validation(format!(
            "input index {} out of range (tx has {} inputs)",
            input_index,
            tx.inputs.len()
        )));
    }
    if prevouts.len() != tx.inputs.len() {
        return Err(TransactionError::Validation(format!(
            "prevout count {} does not match input count {}",
            prevouts.len(),
            tx.inputs.len()
        )));
    }

    let base = if sighash_flag == SIGHASH_DEFAULT {
        SIGHASH_ALL
    } else {
        sighash_flag & SIGHASH_MASK
    };
    let anyone_can_pay = sighash_flag & SIGHASH_ANYONECANPAY != 0;

    let mut writer = ByteWriter::with_capacity(256);
    // Sighash epoch.
    writer.write_u8(0x00);
    writer.write_u8(sighash_flag);
    writer.write_u32_le(tx.version);
    writer.write_u32_le(tx.lock_time);

    if !anyone_can_pay {
        let mut prevouts_w = ByteWriter::with_capacity(tx.inputs.len() * 36);
        let mut amounts_w = ByteWriter::with_capacity(tx.inputs.len() * 8);
        let mut scripts_w = ByteWriter::new();
        let mut sequences_w = ByteWriter::with_capacity(tx.inputs.len() * 4);
        for (input, (value, script)) in tx.inputs.iter().zip(prevouts) {
            prevouts_w.write_bytes(&input.prev_txid);
            prevouts_w.write_u32_le(input.prev_index);
            amounts_w.write_u64_le(*value);
            scripts_w.write_var_bytes(script.to_bytes());
            sequences_w.write_u32_le(input.sequence);
        }
        writer.write_bytes(&sha256(prevouts_w.as_bytes()));
        writer.write_bytes(&sha256(amounts_w.as_bytes()));
        writer.write_bytes(&sha256(scripts_w.as_bytes()));
        writer.write_bytes(&sha256(sequences_w.as_bytes()));
    }

    if base != SIGHASH_NONE && base != SIGHASH_SINGLE {
        let mut outputs_w = ByteWriter::new();
        for output in &tx.outputs {
            outputs_w.write_bytes(&output.to_bytes());
        }
        writer.write_bytes(&sha256(outputs_w.as_bytes()));
    }

    // Spend type: ext_flag * 2 + annex_present. Key path 0, script path 2.
    writer.write_u8(if leaf_hash.is_some() { 0x02 } else { 0x00 });

    if anyone_can_pay {
        let input = &tx.inputs[input_index];
        let (value, script) = &prevouts[input_index];
        writer.write_bytes(&input.prev_txid);
        writer.write_u32_le(input.prev_index);
        writer.write_u64_le(*value);
        writer.write_var_bytes(script.to_bytes());
        writer.write_u32_le(input.sequence);
    } else {
        writer.write_u32_le(input_index as u32);
    }

    if base == SIGHASH_SINGLE {
        let output = tx.outputs.get(input_index).ok_or_else(|| {
            TransactionError::Validation(format!(
                "SIGHASH_SINGLE input {} has no matching output",
                input_index
            ))
        })?;
        writer.write_bytes(&sha256(&output.to_bytes()));
    }

    if let Some(leaf) = leaf_hash {
        writer.write_bytes(leaf);
        // Key version 0, no code separator executed.
        writer.write_u8(0x00);
        writer.write_u32_le(0xFFFF_FFFF);
    }

    Ok(tagged_sha256("TapSighash", writer.as_bytes()))
}
