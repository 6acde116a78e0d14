//! Runes OP_RETURN edict encoding.
//!
//! A runestone is an OP_RETURN output whose payload is a stream of
//! base-128 varints. Two incompatible byte orders are deployed in the
//! wild: the legacy scheme emits the most significant 7-bit group first,
//! the current scheme emits the least significant group first (LEB128).
//! Both are reproduced here exactly and selected per call site; they are
//! deliberately not unified behind one codec, since each must stay
//! byte-compatible with the indexers that parse it.

use btckit_script::opcodes::{OP_13, OP_RETURN};
use btckit_script::Script;
use serde::{Deserialize, Serialize};

use crate::EnvelopeError;

/// Maximum runestone payload accepted by relay policy.
pub const MAX_PAYLOAD_LEN: usize = 80;

/// The protocol tag opening the edict body.
const TAG_BODY: u128 = 0;

/// Which deployed varint byte order to emit or parse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VarintOrder {
    /// Most significant 7-bit group first. The legacy scheme.
    LegacyHighToLow,
    /// Least significant 7-bit group first (LEB128). The current scheme.
    LowToHigh,
}

/// A single transfer instruction: move `amount` of the rune identified by
/// (block, id) to the output at `output`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edict {
    /// Block height of the rune's etching.
    pub block: u64,
    /// Transaction index of the etching within its block.
    pub id: u32,
    /// Amount of the rune to move.
    pub amount: u128,
    /// Destination output index.
    pub output: u32,
}

// -----------------------------------------------------------------------
// Varints
// -----------------------------------------------------------------------

/// Append a value in the current (low-to-high, LEB128) varint form.
///
/// # Arguments
/// * `value` - The value to encode.
/// * `buf` - The buffer to append to.
pub fn encode_varint(mut value: u128, buf: &mut Vec<u8>) {
    while value >> 7 != 0 {
        buf.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
}

/// Append a value in the legacy (high-to-low) varint form.
///
/// # Arguments
/// * `value` - The value to encode.
/// * `buf` - The buffer to append to.
pub fn encode_varint_legacy(value: u128, buf: &mut Vec<u8>) {
    let mut groups = [0u8; 19];
    let mut count = 0;
    let mut v = value;
    loop {
        groups[count] = (v & 0x7f) as u8;
        count += 1;
        v >>= 7;
        if v == 0 {
            break;
        }
    }
    // Emit most significant group first, continuation bit on all but last.
    for i in (1..count).rev() {
        buf.push(groups[i] | 0x80);
    }
    buf.push(groups[0]);
}

/// Decode one varint in the current (low-to-high) form.
///
/// # Arguments
/// * `bytes` - The payload.
/// * `pos` - Cursor, advanced past the decoded value.
///
/// # Returns
/// The value, or a malformed-payload error on truncation or overflow.
pub fn decode_varint(bytes: &[u8], pos: &mut usize) -> Result<u128, EnvelopeError> {
    let mut value: u128 = 0;
    let mut shift = 0u32;
    loop {
        let byte = *bytes.get(*pos).ok_or_else(|| {
            EnvelopeError::MalformedPayload("varint runs past end of payload".to_string())
        })?;
        *pos += 1;
        if shift > 127 {
            return Err(EnvelopeError::MalformedPayload(
                "varint exceeds 128 bits".to_string(),
            ));
        }
        value |= u128::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
    }
}

/// Decode one varint in the legacy (high-to-low) form.
///
/// # Arguments
/// * `bytes` - The payload.
/// * `pos` - Cursor, advanced past the decoded value.
///
/// # Returns
/// The value, or a malformed-payload error on truncation or overflow.
pub fn decode_varint_legacy(bytes: &[u8], pos: &mut usize) -> Result<u128, EnvelopeError> {
    let mut value: u128 = 0;
    let mut consumed = 0;
    loop {
        let byte = *bytes.get(*pos).ok_or_else(|| {
            EnvelopeError::MalformedPayload("varint runs past end of payload".to_string())
        })?;
        *pos += 1;
        consumed += 1;
        if consumed > 19 {
            return Err(EnvelopeError::MalformedPayload(
                "varint exceeds 128 bits".to_string(),
            ));
        }
        value = (value << 7) | u128::from(byte & 0x7f);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
}

// -----------------------------------------------------------------------
// Edict payload
// -----------------------------------------------------------------------

/// Encode edicts into a runestone payload.
///
/// Edicts are sorted ascending by (block, id) first; delta-encoding
/// against the previous pair is a protocol invariant, so the encoder
/// never trusts caller order.
///
/// # Arguments
/// * `edicts` - The transfer instructions, in any order.
/// * `order` - Which varint byte order to emit.
///
/// # Returns
/// The payload bytes, or `ScriptTooLong` past the OP_RETURN cap.
pub fn encode_payload(
    edicts: &[Edict],
    order: VarintOrder,
) -> Result<Vec<u8>, EnvelopeError> {
    let mut sorted = edicts.to_vec();
    sorted.sort_by_key(|e| (e.block, e.id));

    let put = match order {
        VarintOrder::LowToHigh => encode_varint,
        VarintOrder::LegacyHighToLow => encode_varint_legacy,
    };

    let mut payload = Vec::new();
    put(TAG_BODY, &mut payload);
    let mut prev_block = 0u64;
    let mut prev_id = 0u32;
    for edict in &sorted {
        let delta_block = edict.block - prev_block;
        let delta_id = if delta_block == 0 {
            edict.id - prev_id
        } else {
            edict.id
        };
        put(u128::from(delta_block), &mut payload);
        put(u128::from(delta_id), &mut payload);
        put(edict.amount, &mut payload);
        put(u128::from(edict.output), &mut payload);
        prev_block = edict.block;
        prev_id = edict.id;
    }

    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(EnvelopeError::ScriptTooLong {
            len: payload.len(),
            max: MAX_PAYLOAD_LEN,
        });
    }
    Ok(payload)
}

/// Decode a runestone payload back into absolute edicts.
///
/// # Arguments
/// * `payload` - The payload bytes.
/// * `order` - The varint byte order the payload was written in.
///
/// # Returns
/// The edicts with absolute (block, id) pairs, sorted ascending.
pub fn decode_payload(
    payload: &[u8],
    order: VarintOrder,
) -> Result<Vec<Edict>, EnvelopeError> {
    let get = match order {
        VarintOrder::LowToHigh => decode_varint,
        VarintOrder::LegacyHighToLow => decode_varint_legacy,
    };

    let mut pos = 0;
    let tag = get(payload, &mut pos)?;
    if tag != TAG_BODY {
        return Err(EnvelopeError::MalformedPayload(format!(
            "expected body tag, found {}",
            tag
        )));
    }

    let mut edicts = Vec::new();
    let mut prev_block = 0u64;
    let mut prev_id = 0u32;
    while pos < payload.len() {
        let delta_block = get(payload, &mut pos)?;
        let delta_id = get(payload, &mut pos)?;
        let amount = get(payload, &mut pos)?;
        let output = get(payload, &mut pos)?;

        let block = prev_block
            .checked_add(u64::try_from(delta_block).map_err(|_| {
                EnvelopeError::MalformedPayload("block delta overflows".to_string())
            })?)
            .ok_or_else(|| {
                EnvelopeError::MalformedPayload("block height overflows".to_string())
            })?;
        let id_delta = u32::try_from(delta_id).map_err(|_| {
            EnvelopeError::MalformedPayload("id delta overflows".to_string())
        })?;
        let id = if delta_block == 0 {
            prev_id.checked_add(id_delta).ok_or_else(|| {
                EnvelopeError::MalformedPayload("id overflows".to_string())
            })?
        } else {
            id_delta
        };

        edicts.push(Edict {
            block,
            id,
            amount,
            output: u32::try_from(output).map_err(|_| {
                EnvelopeError::MalformedPayload("output index overflows".to_string())
            })?,
        });
        prev_block = block;
        prev_id = id;
    }
    Ok(edicts)
}

/// Build the runestone OP_RETURN locking script.
///
/// # Arguments
/// * `edicts` - The transfer instructions.
/// * `order` - Which varint byte order to emit.
///
/// # Returns
/// The script `OP_RETURN OP_13 push(payload)`, or `ScriptTooLong`.
pub fn build_runestone_script(
    edicts: &[Edict],
    order: VarintOrder,
) -> Result<Script, EnvelopeError> {
    let payload = encode_payload(edicts, order)?;
    let mut script = Script::new();
    script.append_opcodes(&[OP_RETURN, OP_13])?;
    script.append_push_data(&payload)?;
    Ok(script)
}

/// Parse a runestone script back into edicts.
///
/// # Arguments
/// * `script` - A script produced by `build_runestone_script`.
/// * `order` - The varint byte order it was written in.
///
/// # Returns
/// The decoded edicts, or a malformed-payload error.
pub fn parse_runestone_script(
    script: &Script,
    order: VarintOrder,
) -> Result<Vec<Edict>, EnvelopeError> {
    let bytes = script.to_bytes();
    if bytes.len() < 2 || bytes[0] != OP_RETURN || bytes[1] != OP_13 {
        return Err(EnvelopeError::MalformedPayload(
            "not a runestone script".to_string(),
        ));
    }
    let chunks = Script::from_bytes(&bytes[2..])
        .chunks()
        .map_err(|e| EnvelopeError::MalformedPayload(e.to_string()))?;
    let payload = chunks
        .first()
        .and_then(|c| c.data.clone())
        .ok_or_else(|| EnvelopeError::MalformedPayload("missing payload push".to_string()))?;
    decode_payload(&payload, order)
}

// -----------------------------------------------------------------------
// Transfer assembly
// -----------------------------------------------------------------------

/// A rune transfer request: the runestone plus the value plumbing.
#[derive(Clone, Debug)]
pub struct RuneTransferRequest {
    /// UTXOs funding the transfer (rune-carrying and plain).
    pub inputs: Vec<btckit_transaction::PrevOutput>,
    /// Value outputs the edicts point at, in output-index order starting
    /// at index 0.
    pub outputs: Vec<btckit_transaction::OutputSpec>,
    /// The transfer instructions.
    pub edicts: Vec<Edict>,
    /// Which varint byte order the target indexer parses.
    pub varint_order: VarintOrder,
    /// Address receiving satoshi change.
    pub change_address: String,
    /// Fee rate in sat/vB.
    pub fee_rate: u64,
    /// Minimum change worth creating.
    pub min_change_value: Option<u64>,
    /// The network all addresses belong to.
    pub network: &'static btckit_script::NetworkProfile,
}

/// Build a rune transfer: the declared value outputs followed by the
/// zero-value runestone OP_RETURN, assembled through the standard
/// fee/change loop.
///
/// # Arguments
/// * `request` - The transfer request.
///
/// # Returns
/// The signed transaction result, or an error (`ScriptTooLong` for an
/// oversized runestone, `InsufficientBalance` from the loop).
pub fn build_rune_transfer(
    request: &RuneTransferRequest,
) -> Result<btckit_transaction::BuildResult, EnvelopeError> {
    let runestone = build_runestone_script(&request.edicts, request.varint_order)?;
    let mut outputs = request.outputs.clone();
    outputs.push(btckit_transaction::OutputSpec::to_script(&runestone, 0));

    let builder = btckit_transaction::TransactionBuilder::new(btckit_transaction::BuildParams {
        inputs: request.inputs.clone(),
        outputs,
        change_address: request.change_address.clone(),
        fee_rate: request.fee_rate,
        min_change_value: request.min_change_value,
        network: request.network,
    });
    Ok(builder.build()?)
}
