//! Script chunk parsing and push-data encoding.
//!
//! A chunk is either a standalone opcode or a data push with its payload.
//! The decoder is strict: a truncated push fails instead of being silently
//! clipped, since the classifier and the runestone decoder both depend on
//! exact chunk boundaries.

use crate::opcodes::*;
use crate::ScriptError;

/// A single parsed element of a script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptChunk {
    /// The opcode byte. For direct pushes (1-75 bytes) this is the length.
    pub op: u8,
    /// The data payload, if this chunk is a push operation.
    pub data: Option<Vec<u8>>,
}

impl ScriptChunk {
    /// Convert this chunk to its ASM string representation.
    ///
    /// Data pushes render as hex; bare opcodes render by name.
    ///
    /// # Returns
    /// A token for space-separated ASM output.
    pub fn to_asm_string(&self) -> String {
        if let Some(ref data) = self.data {
            if !data.is_empty() {
                return hex::encode(data);
            }
        }
        opcode_to_string(self.op)
    }
}

/// Select the minimal push prefix for a payload of the given length.
///
/// Direct push for 1-75 bytes, OP_PUSHDATA1 up to 255, OP_PUSHDATA2 up to
/// 65535, OP_PUSHDATA4 beyond.
///
/// # Arguments
/// * `len` - The payload length in bytes.
///
/// # Returns
/// The prefix bytes, or an error if the payload exceeds u32.
pub fn push_data_prefix(len: usize) -> Result<Vec<u8>, ScriptError> {
    if len == 0 {
        return Ok(vec![OP_0]);
    }
    if len <= OP_DATA_75 as usize {
        return Ok(vec![len as u8]);
    }
    if len <= 0xff {
        return Ok(vec![OP_PUSHDATA1, len as u8]);
    }
    if len <= 0xffff {
        let mut prefix = vec![OP_PUSHDATA2];
        prefix.extend_from_slice(&(len as u16).to_le_bytes());
        return Ok(prefix);
    }
    if len <= 0xffff_ffff {
        let mut prefix = vec![OP_PUSHDATA4];
        prefix.extend_from_slice(&(len as u32).to_le_bytes());
        return Ok(prefix);
    }
    Err(ScriptError::PushDataTooLarge(len))
}

/// Decode raw script bytes into a vector of chunks.
///
/// # Arguments
/// * `bytes` - The raw script bytes.
///
/// # Returns
/// The parsed chunks, or an error if a push runs past the end of the data.
pub fn decode_script(bytes: &[u8]) -> Result<Vec<ScriptChunk>, ScriptError> {
    let mut chunks = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let op = bytes[pos];
        pos += 1;

        let push_len = match op {
            OP_DATA_1..=OP_DATA_75 => Some(op as usize),
            OP_PUSHDATA1 => {
                let len = *bytes.get(pos).ok_or_else(|| {
                    ScriptError::MalformedScript("truncated PUSHDATA1 length".to_string())
                })? as usize;
                pos += 1;
                Some(len)
            }
            OP_PUSHDATA2 => {
                if pos + 2 > bytes.len() {
                    return Err(ScriptError::MalformedScript(
                        "truncated PUSHDATA2 length".to_string(),
                    ));
                }
                let len = u16::from_le_bytes([bytes[pos], bytes[pos + 1]]) as usize;
                pos += 2;
                Some(len)
            }
            OP_PUSHDATA4 => {
                if pos + 4 > bytes.len() {
                    return Err(ScriptError::MalformedScript(
                        "truncated PUSHDATA4 length".to_string(),
                    ));
                }
                let len = u32::from_le_bytes([
                    bytes[pos],
                    bytes[pos + 1],
                    bytes[pos + 2],
                    bytes[pos + 3],
                ]) as usize;
                pos += 4;
                Some(len)
            }
            _ => None,
        };

        match push_len {
            Some(len) => {
                if pos + len > bytes.len() {
                    return Err(ScriptError::MalformedScript(format!(
                        "push of {} bytes runs past end of script",
                        len
                    )));
                }
                chunks.push(ScriptChunk {
                    op,
                    data: Some(bytes[pos..pos + len].to_vec()),
                });
                pos += len;
            }
            None => chunks.push(ScriptChunk { op, data: None }),
        }
    }

    Ok(chunks)
}
