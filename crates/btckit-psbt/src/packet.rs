//! The BIP-174 container and its binary codec.
//!
//! The codec is lossless: typed fields the exchange understands are
//! parsed into their own slots, everything else is preserved verbatim in
//! `unknown` lists and re-emitted on serialization, so a packet can pass
//! through this library without dropping another wallet's data.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use btckit_primitives::util::{ByteReader, ByteWriter, VarInt};
use btckit_script::Script;
use btckit_transaction::{Transaction, TxOutput};

use crate::PsbtError;

/// The five magic bytes opening every PSBT: "psbt" 0xff.
const PSBT_MAGIC: &[u8; 5] = b"psbt\xff";

// Global key types.
const GLOBAL_UNSIGNED_TX: u8 = 0x00;

// Per-input key types.
const IN_NON_WITNESS_UTXO: u8 = 0x00;
const IN_WITNESS_UTXO: u8 = 0x01;
const IN_PARTIAL_SIG: u8 = 0x02;
const IN_SIGHASH_TYPE: u8 = 0x03;
const IN_REDEEM_SCRIPT: u8 = 0x04;
const IN_FINAL_SCRIPTSIG: u8 = 0x07;
const IN_FINAL_SCRIPTWITNESS: u8 = 0x08;
const IN_TAP_KEY_SIG: u8 = 0x13;

/// A raw key-value pair preserved without interpretation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyValue {
    /// The key type byte.
    pub key_type: u8,
    /// The key data following the type byte (may be empty).
    pub key_data: Vec<u8>,
    /// The value bytes.
    pub value: Vec<u8>,
}

/// Per-input map of a PSBT.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PsbtInput {
    /// The full previous transaction, required to finalize legacy inputs.
    pub non_witness_utxo: Option<Transaction>,
    /// The spent output alone, sufficient for segwit inputs.
    pub witness_utxo: Option<TxOutput>,
    /// ECDSA partial signatures keyed by the signing public key.
    pub partial_sigs: Vec<(Vec<u8>, Vec<u8>)>,
    /// The sighash type the signer committed to.
    pub sighash_type: Option<u32>,
    /// Redeem script for P2SH-nested inputs.
    pub redeem_script: Option<Script>,
    /// The finalized signature script.
    pub final_script_sig: Option<Script>,
    /// The finalized witness stack.
    pub final_script_witness: Option<Vec<Vec<u8>>>,
    /// Taproot key-path signature (64 bytes, or 65 with a sighash byte).
    pub tap_key_sig: Option<Vec<u8>>,
    /// Unrecognized pairs, preserved for lossless round trips.
    pub unknown: Vec<KeyValue>,
}

impl PsbtInput {
    /// Whether this input carries finalized authorization data.
    ///
    /// # Returns
    /// `true` if a final script sig or witness is present.
    pub fn is_finalized(&self) -> bool {
        self.final_script_sig.is_some() || self.final_script_witness.is_some()
    }
}

/// Per-output map of a PSBT. The exchange stores nothing here, but
/// foreign pairs round-trip.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PsbtOutput {
    /// Unrecognized pairs, preserved for lossless round trips.
    pub unknown: Vec<KeyValue>,
}

/// A partially signed transaction: the unsigned skeleton plus one map of
/// signing data per input and per output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Psbt {
    /// The transaction being signed, without any signature data.
    pub unsigned_tx: Transaction,
    /// One entry per transaction input.
    pub inputs: Vec<PsbtInput>,
    /// One entry per transaction output.
    pub outputs: Vec<PsbtOutput>,
    /// Unrecognized global pairs.
    pub global_unknown: Vec<KeyValue>,
}

impl Psbt {
    /// Wrap an unsigned transaction in an empty PSBT.
    ///
    /// # Arguments
    /// * `unsigned_tx` - The skeleton; any signature data is rejected.
    ///
    /// # Returns
    /// `Ok(Psbt)` with empty maps, or `Malformed` if an input already
    /// carries authorization data.
    pub fn from_unsigned_tx(unsigned_tx: Transaction) -> Result<Self, PsbtError> {
        for (i, input) in unsigned_tx.inputs.iter().enumerate() {
            if !input.is_unsigned() {
                return Err(PsbtError::Malformed(format!(
                    "unsigned tx input {} already carries signature data",
                    i
                )));
            }
        }
        let inputs = vec![PsbtInput::default(); unsigned_tx.inputs.len()];
        let outputs = vec![PsbtOutput::default(); unsigned_tx.outputs.len()];
        Ok(Psbt {
            unsigned_tx,
            inputs,
            outputs,
            global_unknown: Vec::new(),
        })
    }

    // -----------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------

    /// Serialize to the BIP-174 binary form.
    ///
    /// # Returns
    /// The container bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::with_capacity(512);
        writer.write_bytes(PSBT_MAGIC);

        // Global map. The unsigned tx is serialized without witness data.
        write_pair(
            &mut writer,
            GLOBAL_UNSIGNED_TX,
            &[],
            &self.unsigned_tx.to_bytes_no_witness(),
        );
        for kv in &self.global_unknown {
            write_pair(&mut writer, kv.key_type, &kv.key_data, &kv.value);
        }
        writer.write_u8(0x00);

        for input in &self.inputs {
            if let Some(tx) = &input.non_witness_utxo {
                write_pair(&mut writer, IN_NON_WITNESS_UTXO, &[], &tx.to_bytes());
            }
            if let Some(output) = &input.witness_utxo {
                write_pair(&mut writer, IN_WITNESS_UTXO, &[], &output.to_bytes());
            }
            for (pubkey, sig) in &input.partial_sigs {
                write_pair(&mut writer, IN_PARTIAL_SIG, pubkey, sig);
            }
            if let Some(sighash_type) = input.sighash_type {
                write_pair(
                    &mut writer,
                    IN_SIGHASH_TYPE,
                    &[],
                    &sighash_type.to_le_bytes(),
                );
            }
            if let Some(redeem) = &input.redeem_script {
                write_pair(&mut writer, IN_REDEEM_SCRIPT, &[], redeem.to_bytes());
            }
            if let Some(script_sig) = &input.final_script_sig {
                write_pair(&mut writer, IN_FINAL_SCRIPTSIG, &[], script_sig.to_bytes());
            }
            if let Some(witness) = &input.final_script_witness {
                write_pair(
                    &mut writer,
                    IN_FINAL_SCRIPTWITNESS,
                    &[],
                    &serialize_witness(witness),
                );
            }
            if let Some(sig) = &input.tap_key_sig {
                write_pair(&mut writer, IN_TAP_KEY_SIG, &[], sig);
            }
            for kv in &input.unknown {
                write_pair(&mut writer, kv.key_type, &kv.key_data, &kv.value);
            }
            writer.write_u8(0x00);
        }

        for output in &self.outputs {
            for kv in &output.unknown {
                write_pair(&mut writer, kv.key_type, &kv.key_data, &kv.value);
            }
            writer.write_u8(0x00);
        }

        writer.into_bytes()
    }

    /// Serialize to base64, the interchange form at the boundary.
    ///
    /// # Returns
    /// The base64-encoded container.
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.to_bytes())
    }

    /// Serialize to lowercase hex.
    ///
    /// # Returns
    /// The hex-encoded container.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    // -----------------------------------------------------------------
    // Deserialization
    // -----------------------------------------------------------------

    /// Parse a PSBT from its binary form.
    ///
    /// # Arguments
    /// * `bytes` - The container bytes.
    ///
    /// # Returns
    /// `Ok(Psbt)` on success, or `Malformed` describing the defect.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PsbtError> {
        let mut reader = ByteReader::new(bytes);
        let magic = reader
            .read_bytes(5)
            .map_err(|_| PsbtError::Malformed("missing magic".to_string()))?;
        if magic != PSBT_MAGIC {
            return Err(PsbtError::Malformed("bad magic".to_string()));
        }

        // Global map.
        let mut unsigned_tx: Option<Transaction> = None;
        let mut global_unknown = Vec::new();
        while let Some(kv) = read_pair(&mut reader)? {
            match (kv.key_type, kv.key_data.is_empty()) {
                (GLOBAL_UNSIGNED_TX, true) => {
                    if unsigned_tx.is_some() {
                        return Err(PsbtError::Malformed(
                            "duplicate unsigned tx".to_string(),
                        ));
                    }
                    let tx = Transaction::from_bytes(&kv.value)
                        .map_err(|e| PsbtError::Malformed(e.to_string()))?;
                    unsigned_tx = Some(tx);
                }
                _ => global_unknown.push(kv),
            }
        }
        let unsigned_tx = unsigned_tx
            .ok_or_else(|| PsbtError::Malformed("missing unsigned tx".to_string()))?;

        // Input maps.
        let mut inputs = Vec::with_capacity(unsigned_tx.inputs.len());
        for index in 0..unsigned_tx.inputs.len() {
            let mut input = PsbtInput::default();
            while let Some(kv) = read_pair(&mut reader)? {
                let keyless = kv.key_data.is_empty();
                match kv.key_type {
                    IN_NON_WITNESS_UTXO if keyless => {
                        input.non_witness_utxo = Some(
                            Transaction::from_bytes(&kv.value)
                                .map_err(|e| PsbtError::Malformed(e.to_string()))?,
                        );
                    }
                    IN_WITNESS_UTXO if keyless => {
                        let mut value_reader = ByteReader::new(&kv.value);
                        let output = TxOutput::read_from(&mut value_reader)
                            .map_err(|e| PsbtError::Malformed(e.to_string()))?;
                        input.witness_utxo = Some(output);
                    }
                    IN_PARTIAL_SIG => {
                        input.partial_sigs.push((kv.key_data, kv.value));
                    }
                    IN_SIGHASH_TYPE if keyless => {
                        if kv.value.len() != 4 {
                            return Err(PsbtError::Malformed(format!(
                                "input {}: sighash type must be 4 bytes",
                                index
                            )));
                        }
                        input.sighash_type = Some(u32::from_le_bytes([
                            kv.value[0], kv.value[1], kv.value[2], kv.value[3],
                        ]));
                    }
                    IN_REDEEM_SCRIPT if keyless => {
                        input.redeem_script = Some(Script::from_bytes(&kv.value));
                    }
                    IN_FINAL_SCRIPTSIG if keyless => {
                        input.final_script_sig = Some(Script::from_bytes(&kv.value));
                    }
                    IN_FINAL_SCRIPTWITNESS if keyless => {
                        input.final_script_witness = Some(parse_witness(&kv.value)?);
                    }
                    IN_TAP_KEY_SIG if keyless => {
                        input.tap_key_sig = Some(kv.value);
                    }
                    _ => input.unknown.push(kv),
                }
            }
            inputs.push(input);
        }

        // Output maps.
        let mut outputs = Vec::with_capacity(unsigned_tx.outputs.len());
        for _ in 0..unsigned_tx.outputs.len() {
            let mut output = PsbtOutput::default();
            while let Some(kv) = read_pair(&mut reader)? {
                output.unknown.push(kv);
            }
            outputs.push(output);
        }

        if reader.remaining() != 0 {
            return Err(PsbtError::Malformed(format!(
                "trailing {} bytes after output maps",
                reader.remaining()
            )));
        }

        Ok(Psbt {
            unsigned_tx,
            inputs,
            outputs,
            global_unknown,
        })
    }

    /// Parse a PSBT from base64.
    ///
    /// # Arguments
    /// * `encoded` - The base64 string.
    ///
    /// # Returns
    /// `Ok(Psbt)` on success.
    pub fn from_base64(encoded: &str) -> Result<Self, PsbtError> {
        let bytes = BASE64
            .decode(encoded)
            .map_err(|e| PsbtError::Malformed(format!("invalid base64: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Parse a PSBT from hex.
    ///
    /// # Arguments
    /// * `encoded` - The hex string.
    ///
    /// # Returns
    /// `Ok(Psbt)` on success.
    pub fn from_hex(encoded: &str) -> Result<Self, PsbtError> {
        let bytes = hex::decode(encoded)
            .map_err(|e| PsbtError::Malformed(format!("invalid hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }
}

/// Serialize a witness stack: item count then var-bytes per item.
pub(crate) fn serialize_witness(witness: &[Vec<u8>]) -> Vec<u8> {
    let mut writer = ByteWriter::new();
    writer.write_varint(VarInt::from(witness.len()));
    for item in witness {
        writer.write_var_bytes(item);
    }
    writer.into_bytes()
}

fn parse_witness(bytes: &[u8]) -> Result<Vec<Vec<u8>>, PsbtError> {
    let mut reader = ByteReader::new(bytes);
    let count = reader
        .read_varint()
        .map_err(|e| PsbtError::Malformed(e.to_string()))?;
    let mut witness = Vec::with_capacity(count.value() as usize);
    for _ in 0..count.value() {
        let item = reader
            .read_var_bytes()
            .map_err(|e| PsbtError::Malformed(e.to_string()))?;
        witness.push(item.to_vec());
    }
    if reader.remaining() != 0 {
        return Err(PsbtError::Malformed(
            "trailing bytes in witness stack".to_string(),
        ));
    }
    Ok(witness)
}

fn write_pair(writer: &mut ByteWriter, key_type: u8, key_data: &[u8], value: &[u8]) {
    writer.write_varint(VarInt::from(1 + key_data.len()));
    writer.write_u8(key_type);
    writer.write_bytes(key_data);
    writer.write_var_bytes(value);
}

/// Read one key-value pair, or `None` at the 0x00 map terminator.
fn read_pair(reader: &mut ByteReader) -> Result<Option<KeyValue>, PsbtError> {
    let key_len = reader
        .read_varint()
        .map_err(|_| PsbtError::Malformed("truncated map".to_string()))?;
    if key_len.value() == 0 {
        return Ok(None);
    }
    let key = reader
        .read_bytes(key_len.value() as usize)
        .map_err(|_| PsbtError::Malformed("truncated key".to_string()))?;
    let value = reader
        .read_var_bytes()
        .map_err(|_| PsbtError::Malformed("truncated value".to_string()))?;
    Ok(Some(KeyValue {
        key_type: key[0],
        key_data: key[1..].to_vec(),
        value: value.to_vec(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use btckit_transaction::TxInput;

    fn skeleton() -> Transaction {
        let mut tx = Transaction::new();
        tx.inputs.push(TxInput::new([0x11; 32], 0));
        tx.inputs.push(TxInput::new([0x22; 32], 1));
        tx.outputs
            .push(TxOutput::new(50_000, Script::p2wpkh_lock(&[0x33; 20])));
        tx
    }

    // -----------------------------------------------------------------
    // Container round trips
    // -----------------------------------------------------------------

    #[test]
    fn test_empty_psbt_roundtrip() {
        let psbt = Psbt::from_unsigned_tx(skeleton()).unwrap();
        let parsed = Psbt::from_bytes(&psbt.to_bytes()).unwrap();
        assert_eq!(parsed, psbt);
        assert_eq!(parsed.inputs.len(), 2);
        assert_eq!(parsed.outputs.len(), 1);
    }

    #[test]
    fn test_typed_fields_roundtrip() {
        let mut psbt = Psbt::from_unsigned_tx(skeleton()).unwrap();
        psbt.inputs[0].witness_utxo =
            Some(TxOutput::new(60_000, Script::p2wpkh_lock(&[0x44; 20])));
        psbt.inputs[0]
            .partial_sigs
            .push((vec![0x02; 33], vec![0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x01, 0x01]));
        psbt.inputs[0].sighash_type = Some(0x83);
        psbt.inputs[1].final_script_witness = Some(vec![vec![0xaa; 64]]);
        psbt.inputs[1].tap_key_sig = Some(vec![0xbb; 64]);

        let parsed = Psbt::from_bytes(&psbt.to_bytes()).unwrap();
        assert_eq!(parsed, psbt);
    }

    /// Unknown key-value pairs must survive a decode/encode cycle intact.
    #[test]
    fn test_unknown_pairs_preserved() {
        let mut psbt = Psbt::from_unsigned_tx(skeleton()).unwrap();
        psbt.global_unknown.push(KeyValue {
            key_type: 0xfc,
            key_data: b"vendor".to_vec(),
            value: vec![1, 2, 3],
        });
        psbt.inputs[1].unknown.push(KeyValue {
            key_type: 0x20,
            key_data: vec![0x99],
            value: vec![4, 5],
        });
        psbt.outputs[0].unknown.push(KeyValue {
            key_type: 0x42,
            key_data: vec![],
            value: vec![6],
        });

        let bytes = psbt.to_bytes();
        let parsed = Psbt::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, psbt);
        // Byte-level stability too.
        assert_eq!(parsed.to_bytes(), bytes);
    }

    #[test]
    fn test_base64_roundtrip() {
        let psbt = Psbt::from_unsigned_tx(skeleton()).unwrap();
        let parsed = Psbt::from_base64(&psbt.to_base64()).unwrap();
        assert_eq!(parsed, psbt);
    }

    // -----------------------------------------------------------------
    // Malformed input
    // -----------------------------------------------------------------

    #[test]
    fn test_bad_magic_rejected() {
        assert!(matches!(
            Psbt::from_bytes(b"psbx\xff\x00"),
            Err(PsbtError::Malformed(_))
        ));
    }

    #[test]
    fn test_missing_unsigned_tx_rejected() {
        // Magic plus an immediately terminated global map.
        let mut bytes = PSBT_MAGIC.to_vec();
        bytes.push(0x00);
        assert!(Psbt::from_bytes(&bytes).is_err());
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = Psbt::from_unsigned_tx(skeleton()).unwrap().to_bytes();
        bytes.push(0x00);
        assert!(Psbt::from_bytes(&bytes).is_err());
    }

    #[test]
    fn test_signed_tx_rejected_as_skeleton() {
        let mut tx = skeleton();
        tx.inputs[0].witness = vec![vec![0x01]];
        assert!(Psbt::from_unsigned_tx(tx).is_err());
    }
}
