//! Core transaction type.
//!
//! Represents a transaction with version, inputs, outputs, and locktime.
//! Supports both the legacy and the segwit (marker/flag/witness) wire
//! formats, transaction-id computation over the non-witness form, and the
//! weight and virtual-size metrics that drive fee calculation.

use btckit_primitives::chainhash::Hash;
use btckit_primitives::hash::sha256d;
use btckit_primitives::util::{ByteReader, ByteWriter, VarInt};
use btckit_script::network::WITNESS_SCALE_FACTOR;

use crate::input::TxInput;
use crate::output::TxOutput;
use crate::TransactionError;

/// Segwit serialization marker byte (a zero input count in legacy parsing).
const SEGWIT_MARKER: u8 = 0x00;
/// Segwit serialization flag byte.
const SEGWIT_FLAG: u8 = 0x01;

/// A transaction: version, inputs, outputs, lock time.
///
/// # Wire format
///
/// | Field        | Size                                |
/// |--------------|-------------------------------------|
/// | version      | 4 bytes (LE)                        |
/// | marker+flag  | 0x00 0x01, only when witness present|
/// | input count  | VarInt                              |
/// | inputs       | variable                            |
/// | output count | VarInt                              |
/// | outputs      | variable                            |
/// | witnesses    | per input, only when witness present|
/// | lock_time    | 4 bytes (LE)                        |
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    /// Transaction format version. Currently 1 or 2.
    pub version: u32,

    /// Ordered list of transaction inputs.
    pub inputs: Vec<TxInput>,

    /// Ordered list of transaction outputs.
    pub outputs: Vec<TxOutput>,

    /// Lock time: block height or Unix timestamp before which the
    /// transaction is invalid, 0 for none.
    pub lock_time: u32,
}

impl Transaction {
    /// Create a new empty transaction with version 2 and lock time 0.
    ///
    /// # Returns
    /// A `Transaction` with no inputs or outputs.
    pub fn new() -> Self {
        Transaction {
            version: 2,
            inputs: Vec::new(),
            outputs: Vec::new(),
            lock_time: 0,
        }
    }

    // -----------------------------------------------------------------
    // Deserialization
    // -----------------------------------------------------------------

    /// Parse a transaction from a hex-encoded string.
    ///
    /// # Arguments
    /// * `hex_str` - A hex string of the raw transaction bytes.
    ///
    /// # Returns
    /// `Ok(Transaction)` on success, or an error if the hex is invalid or
    /// the bytes do not form a valid transaction.
    pub fn from_hex(hex_str: &str) -> Result<Self, TransactionError> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| TransactionError::Serialization(format!("invalid hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Parse a transaction from raw bytes.
    ///
    /// Accepts both the legacy and the segwit serialization; the byte
    /// slice must contain exactly one transaction with no trailing data.
    ///
    /// # Arguments
    /// * `bytes` - The raw transaction bytes.
    ///
    /// # Returns
    /// `Ok(Transaction)` on success, or an error if the data is truncated,
    /// malformed, or has trailing bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TransactionError> {
        let mut reader = ByteReader::new(bytes);
        let tx = Self::read_from(&mut reader)?;
        if reader.remaining() != 0 {
            return Err(TransactionError::Serialization(format!(
                "trailing {} bytes after transaction",
                reader.remaining()
            )));
        }
        Ok(tx)
    }

    /// Deserialize a transaction from a `ByteReader`.
    ///
    /// # Arguments
    /// * `reader` - Reader positioned at the start of a serialized
    ///   transaction.
    ///
    /// # Returns
    /// `Ok(Transaction)` on success, or a serialization error.
    pub fn read_from(reader: &mut ByteReader) -> Result<Self, TransactionError> {
        let version = reader.read_u32_le().map_err(|e| {
            TransactionError::Serialization(format!("reading version: {}", e))
        })?;

        let mut count = reader.read_varint().map_err(|e| {
            TransactionError::Serialization(format!("reading input count: {}", e))
        })?;

        // A zero "input count" is the segwit marker; the flag byte follows.
        let has_witness = count.value() == 0;
        if has_witness {
            let flag = reader.read_u8().map_err(|e| {
                TransactionError::Serialization(format!("reading segwit flag: {}", e))
            })?;
            if flag != SEGWIT_FLAG {
                return Err(TransactionError::Serialization(format!(
                    "unknown segwit flag 0x{:02x}",
                    flag
                )));
            }
            count = reader.read_varint().map_err(|e| {
                TransactionError::Serialization(format!("reading input count: {}", e))
            })?;
        }

        let mut inputs = Vec::with_capacity(count.value() as usize);
        for _ in 0..count.value() {
            inputs.push(TxInput::read_from(reader)?);
        }

        let output_count = reader.read_varint().map_err(|e| {
            TransactionError::Serialization(format!("reading output count: {}", e))
        })?;
        let mut outputs = Vec::with_capacity(output_count.value() as usize);
        for _ in 0..output_count.value() {
            outputs.push(TxOutput::read_from(reader)?);
        }

        if has_witness {
            for input in &mut inputs {
                let item_count = reader.read_varint().map_err(|e| {
                    TransactionError::Serialization(format!("reading witness count: {}", e))
                })?;
                let mut witness = Vec::with_capacity(item_count.value() as usize);
                for _ in 0..item_count.value() {
                    let item = reader.read_var_bytes().map_err(|e| {
                        TransactionError::Serialization(format!("reading witness item: {}", e))
                    })?;
                    witness.push(item.to_vec());
                }
                input.witness = witness;
            }
        }

        let lock_time = reader.read_u32_le().map_err(|e| {
            TransactionError::Serialization(format!("reading lock time: {}", e))
        })?;

        Ok(Transaction {
            version,
            inputs,
            outputs,
            lock_time,
        })
    }

    // -----------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------

    /// Whether any input carries witness data.
    ///
    /// # Returns
    /// `true` if at least one witness stack is non-empty.
    pub fn has_witness(&self) -> bool {
        self.inputs.iter().any(|i| !i.witness.is_empty())
    }

    /// Serialize this transaction to raw bytes.
    ///
    /// Uses the segwit format (marker, flag, witness stacks) when any
    /// input has witness data, the legacy format otherwise.
    ///
    /// # Returns
    /// The standard wire-format bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.serialize(self.has_witness())
    }

    /// Serialize without witness data (the txid form).
    ///
    /// # Returns
    /// The legacy wire-format bytes regardless of witness presence.
    pub fn to_bytes_no_witness(&self) -> Vec<u8> {
        self.serialize(false)
    }

    fn serialize(&self, with_witness: bool) -> Vec<u8> {
        let mut writer = ByteWriter::with_capacity(256);
        writer.write_u32_le(self.version);

        if with_witness {
            writer.write_u8(SEGWIT_MARKER);
            writer.write_u8(SEGWIT_FLAG);
        }

        writer.write_varint(VarInt::from(self.inputs.len()));
        for input in &self.inputs {
            input.write_to(&mut writer);
        }

        writer.write_varint(VarInt::from(self.outputs.len()));
        for output in &self.outputs {
            output.write_to(&mut writer);
        }

        if with_witness {
            for input in &self.inputs {
                writer.write_varint(VarInt::from(input.witness.len()));
                for item in &input.witness {
                    writer.write_var_bytes(item);
                }
            }
        }

        writer.write_u32_le(self.lock_time);
        writer.into_bytes()
    }

    /// Serialize this transaction to a hex string.
    ///
    /// # Returns
    /// A lowercase hex-encoded string of the raw bytes.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    // -----------------------------------------------------------------
    // Transaction ID
    // -----------------------------------------------------------------

    /// Compute the transaction ID.
    ///
    /// The txid commits to the non-witness serialization, so signing a
    /// segwit input never changes it.
    ///
    /// # Returns
    /// The txid in internal byte order.
    pub fn txid(&self) -> Hash {
        Hash::new(sha256d(&self.to_bytes_no_witness()))
    }

    /// Compute the transaction ID as a display-order hex string.
    ///
    /// # Returns
    /// A 64-character hex string.
    pub fn txid_hex(&self) -> String {
        self.txid().to_hex()
    }

    /// Compute the witness transaction ID (hash of the full serialization).
    ///
    /// # Returns
    /// The wtxid in internal byte order.
    pub fn wtxid(&self) -> Hash {
        Hash::new(sha256d(&self.to_bytes()))
    }

    // -----------------------------------------------------------------
    // Size metrics
    // -----------------------------------------------------------------

    /// Size of the non-witness serialization in bytes.
    ///
    /// # Returns
    /// The base size.
    pub fn base_size(&self) -> usize {
        self.to_bytes_no_witness().len()
    }

    /// Size of the full serialization (witness included) in bytes.
    ///
    /// # Returns
    /// The total size.
    pub fn total_size(&self) -> usize {
        self.to_bytes().len()
    }

    /// Transaction weight: base size times three plus total size.
    ///
    /// # Returns
    /// The weight in weight units.
    pub fn weight(&self) -> u64 {
        (self.base_size() as u64) * 3 + self.total_size() as u64
    }

    /// Virtual size: weight divided by four, rounded up.
    ///
    /// This is the size the fee rate applies to.
    ///
    /// # Returns
    /// The virtual size in vbytes.
    pub fn vsize(&self) -> u64 {
        self.weight().div_ceil(WITNESS_SCALE_FACTOR)
    }

    // -----------------------------------------------------------------
    // Totals
    // -----------------------------------------------------------------

    /// Compute the sum of all output values.
    ///
    /// # Returns
    /// The total satoshis across all outputs.
    pub fn total_output_value(&self) -> u64 {
        self.outputs.iter().map(|o| o.value).sum()
    }

    /// Whether this is a coinbase transaction (single input spending the
    /// all-zero outpoint at index 0xFFFFFFFF).
    ///
    /// # Returns
    /// `true` for coinbase transactions.
    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1
            && self.inputs[0].prev_txid == [0u8; 32]
            && self.inputs[0].prev_index == 0xFFFF_FFFF
    }
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Transaction {
    /// Display the transaction as its hex-encoded serialization.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use btckit_script::Script;

    fn sample_tx() -> Transaction {
        let mut tx = Transaction::new();
        tx.inputs.push(TxInput::new([0x11; 32], 0));
        tx.outputs.push(TxOutput::new(
            90_000,
            Script::p2wpkh_lock(&[0x22; 20]),
        ));
        tx
    }

    // -----------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------

    #[test]
    fn test_legacy_roundtrip() {
        let tx = sample_tx();
        let parsed = Transaction::from_bytes(&tx.to_bytes()).unwrap();
        assert_eq!(parsed, tx);
    }

    #[test]
    fn test_segwit_roundtrip() {
        let mut tx = sample_tx();
        tx.inputs[0].witness = vec![vec![0xaa; 71], vec![0xbb; 33]];
        let bytes = tx.to_bytes();
        // Marker and flag directly after the version.
        assert_eq!(&bytes[4..6], &[0x00, 0x01]);
        let parsed = Transaction::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, tx);
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = sample_tx().to_bytes();
        bytes.push(0x00);
        assert!(Transaction::from_bytes(&bytes).is_err());
    }

    #[test]
    fn test_unknown_segwit_flag_rejected() {
        let mut bytes = sample_tx().to_bytes();
        // Splice marker + bad flag after the version.
        bytes.splice(4..4, [0x00u8, 0x02]);
        assert!(Transaction::from_bytes(&bytes).is_err());
    }

    // -----------------------------------------------------------------
    // Txid
    // -----------------------------------------------------------------

    /// Adding witness data must not move the txid, only the wtxid.
    #[test]
    fn test_txid_ignores_witness() {
        let mut tx = sample_tx();
        let txid_before = tx.txid();
        let wtxid_before = tx.wtxid();
        tx.inputs[0].witness = vec![vec![0xaa; 71]];
        assert_eq!(tx.txid(), txid_before);
        assert_ne!(tx.wtxid(), wtxid_before);
    }

    // -----------------------------------------------------------------
    // Size metrics
    // -----------------------------------------------------------------

    #[test]
    fn test_weight_formula() {
        let mut tx = sample_tx();
        tx.inputs[0].witness = vec![vec![0xaa; 71], vec![0xbb; 33]];
        let base = tx.base_size() as u64;
        let total = tx.total_size() as u64;
        assert!(total > base);
        assert_eq!(tx.weight(), base * 3 + total);
        assert_eq!(tx.vsize(), (tx.weight() + 3) / 4);
    }

    /// Without witness data base and total coincide and vsize equals size.
    #[test]
    fn test_legacy_sizes_coincide() {
        let tx = sample_tx();
        assert_eq!(tx.base_size(), tx.total_size());
        assert_eq!(tx.vsize(), tx.base_size() as u64);
    }

    #[test]
    fn test_is_coinbase() {
        let mut tx = Transaction::new();
        tx.inputs.push(TxInput::new([0u8; 32], 0xFFFF_FFFF));
        assert!(tx.is_coinbase());
        assert!(!sample_tx().is_coinbase());
    }
}
