//! Transaction output carrying a value and a locking script.

use btckit_primitives::util::{ByteReader, ByteWriter};
use btckit_script::Script;

use crate::TransactionError;

/// A single transaction output.
///
/// # Wire format
///
/// | Field         | Size         |
/// |---------------|--------------|
/// | value         | 8 bytes (LE) |
/// | script length | VarInt       |
/// | script_pubkey | variable     |
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxOutput {
    /// Output value in satoshis.
    pub value: u64,

    /// The locking script.
    pub script_pubkey: Script,
}

impl TxOutput {
    /// Create an output paying `value` to the given locking script.
    ///
    /// # Arguments
    /// * `value` - The satoshi value.
    /// * `script_pubkey` - The locking script.
    ///
    /// # Returns
    /// A new `TxOutput`.
    pub fn new(value: u64, script_pubkey: Script) -> Self {
        TxOutput {
            value,
            script_pubkey,
        }
    }

    /// Deserialize an output.
    ///
    /// # Arguments
    /// * `reader` - Reader positioned at the start of an encoded output.
    ///
    /// # Returns
    /// `Ok(TxOutput)` or a serialization error.
    pub fn read_from(reader: &mut ByteReader) -> Result<Self, TransactionError> {
        let value = reader.read_u64_le().map_err(|e| {
            TransactionError::Serialization(format!("reading output value: {}", e))
        })?;
        let script_bytes = reader.read_var_bytes().map_err(|e| {
            TransactionError::Serialization(format!("reading script pubkey: {}", e))
        })?;
        Ok(TxOutput {
            value,
            script_pubkey: Script::from_bytes(script_bytes),
        })
    }

    /// Serialize this output.
    ///
    /// # Arguments
    /// * `writer` - The writer to append to.
    pub fn write_to(&self, writer: &mut ByteWriter) {
        writer.write_u64_le(self.value);
        writer.write_var_bytes(self.script_pubkey.to_bytes());
    }

    /// Serialize to a standalone byte vector (used by sighash hashing).
    ///
    /// # Returns
    /// The wire-format bytes of this output.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::with_capacity(9 + self.script_pubkey.len());
        self.write_to(&mut writer);
        writer.into_bytes()
    }
}
