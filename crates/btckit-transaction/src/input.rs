//! Transaction input referencing a previous output.
//!
//! Carries the outpoint, sequence number, and both authorization forms:
//! the legacy signature script and the segwit witness stack. Exactly one
//! of the two is populated by the signature engine, depending on the
//! script kind derived from the prevout.

use btckit_primitives::util::{ByteReader, ByteWriter};
use btckit_script::Script;

use crate::TransactionError;

/// Default sequence number indicating a finalized input.
pub const DEFAULT_SEQUENCE: u32 = 0xFFFF_FFFF;

/// A single transaction input.
///
/// # Wire format (non-witness part)
///
/// | Field            | Size          |
/// |------------------|---------------|
/// | prev_txid        | 32 bytes (LE) |
/// | prev_index       | 4 bytes (LE)  |
/// | script length    | VarInt        |
/// | signature_script | variable      |
/// | sequence         | 4 bytes (LE)  |
///
/// The witness stack, when present, is serialized separately after all
/// outputs (see `Transaction::to_bytes`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxInput {
    /// Txid of the output being spent, internal (little-endian) byte order.
    pub prev_txid: [u8; 32],

    /// Index of the output within the previous transaction.
    pub prev_index: u32,

    /// Sequence number. Defaults to `0xFFFFFFFF`.
    pub sequence: u32,

    /// The legacy unlocking script. Empty for native segwit inputs.
    pub signature_script: Script,

    /// The witness stack. Empty for pre-segwit inputs.
    pub witness: Vec<Vec<u8>>,
}

impl TxInput {
    /// Create an unsigned input spending the given outpoint.
    ///
    /// # Arguments
    /// * `prev_txid` - Previous txid in internal byte order.
    /// * `prev_index` - Previous output index.
    ///
    /// # Returns
    /// A `TxInput` with default sequence and no authorization data.
    pub fn new(prev_txid: [u8; 32], prev_index: u32) -> Self {
        TxInput {
            prev_txid,
            prev_index,
            sequence: DEFAULT_SEQUENCE,
            signature_script: Script::new(),
            witness: Vec::new(),
        }
    }

    /// Deserialize the non-witness part of an input.
    ///
    /// # Arguments
    /// * `reader` - Reader positioned at the start of an encoded input.
    ///
    /// # Returns
    /// `Ok(TxInput)` with an empty witness, or a serialization error.
    pub fn read_from(reader: &mut ByteReader) -> Result<Self, TransactionError> {
        let txid_bytes = reader.read_bytes(32).map_err(|e| {
            TransactionError::Serialization(format!("reading prev txid: {}", e))
        })?;
        let mut prev_txid = [0u8; 32];
        prev_txid.copy_from_slice(txid_bytes);

        let prev_index = reader.read_u32_le().map_err(|e| {
            TransactionError::Serialization(format!("reading prev index: {}", e))
        })?;

        let script_bytes = reader.read_var_bytes().map_err(|e| {
            TransactionError::Serialization(format!("reading signature script: {}", e))
        })?;

        let sequence = reader.read_u32_le().map_err(|e| {
            TransactionError::Serialization(format!("reading sequence: {}", e))
        })?;

        Ok(TxInput {
            prev_txid,
            prev_index,
            sequence,
            signature_script: Script::from_bytes(script_bytes),
            witness: Vec::new(),
        })
    }

    /// Serialize the non-witness part of this input.
    ///
    /// # Arguments
    /// * `writer` - The writer to append to.
    pub fn write_to(&self, writer: &mut ByteWriter) {
        writer.write_bytes(&self.prev_txid);
        writer.write_u32_le(self.prev_index);
        writer.write_var_bytes(self.signature_script.to_bytes());
        writer.write_u32_le(self.sequence);
    }

    /// Whether the input carries any authorization data yet.
    ///
    /// # Returns
    /// `true` if both the signature script and witness are empty.
    pub fn is_unsigned(&self) -> bool {
        self.signature_script.is_empty() && self.witness.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_roundtrip() {
        let mut input = TxInput::new([0xab; 32], 7);
        input.signature_script = Script::from_hex("51").unwrap();
        input.sequence = 0xFFFF_FFFD;

        let mut writer = ByteWriter::new();
        input.write_to(&mut writer);
        let bytes = writer.into_bytes();
        assert_eq!(bytes.len(), 32 + 4 + 1 + 1 + 4);

        let mut reader = ByteReader::new(&bytes);
        let parsed = TxInput::read_from(&mut reader).unwrap();
        assert_eq!(parsed, input);
    }

    #[test]
    fn test_truncated_input_fails() {
        let mut reader = ByteReader::new(&[0u8; 20]);
        assert!(TxInput::read_from(&mut reader).is_err());
    }

    #[test]
    fn test_is_unsigned() {
        let mut input = TxInput::new([0; 32], 0);
        assert!(input.is_unsigned());
        input.witness.push(vec![0x01]);
        assert!(!input.is_unsigned());
    }
}
