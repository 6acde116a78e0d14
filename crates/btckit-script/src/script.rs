/// Bitcoin Script type - a sequence of opcodes and data pushes.
///
/// Wraps a `Vec<u8>` and provides construction helpers for the standard
/// locking-script shapes, push-data encoding, chunk/ASM output, and the
/// pure byte-pattern classifier that all signing dispatch is derived from.

use std::fmt;

use crate::chunk::{decode_script, push_data_prefix, ScriptChunk};
use crate::opcodes::*;
use crate::ScriptError;

/// The closed set of script shapes the engine understands.
///
/// Produced only by [`Script::kind`], never from a caller-supplied label:
/// a mislabeled prevout would otherwise sign with the wrong algorithm and
/// produce an unspendable or invalid input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScriptKind {
    /// OP_DUP OP_HASH160 <20> OP_EQUALVERIFY OP_CHECKSIG
    P2pkh,
    /// OP_HASH160 <20> OP_EQUAL
    P2sh,
    /// OP_0 <20>
    P2wpkh,
    /// OP_1 <32>
    P2tr,
    /// OP_RETURN ...
    OpReturn,
    /// Anything else.
    NonStandard,
}

/// A Bitcoin script, represented as a byte vector newtype.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Script(Vec<u8>);

impl Script {
    // -----------------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------------

    /// Create a new empty script.
    ///
    /// # Returns
    /// An empty `Script` instance.
    pub fn new() -> Self {
        Script(Vec::new())
    }

    /// Create a script from a hex-encoded string.
    ///
    /// # Arguments
    /// * `hex_str` - A hex string (e.g. "76a914...88ac").
    ///
    /// # Returns
    /// A `Script` wrapping the decoded bytes, or an error if the hex is invalid.
    pub fn from_hex(hex_str: &str) -> Result<Self, ScriptError> {
        let bytes =
            hex::decode(hex_str).map_err(|e| ScriptError::InvalidHex(e.to_string()))?;
        Ok(Script(bytes))
    }

    /// Create a script from raw bytes.
    ///
    /// # Arguments
    /// * `bytes` - Raw script bytes.
    ///
    /// # Returns
    /// A `Script` wrapping a copy of the given bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Script(bytes.to_vec())
    }

    /// Build the P2PKH locking script for a 20-byte pubkey hash.
    ///
    /// # Arguments
    /// * `pubkey_hash` - hash160 of the compressed public key.
    ///
    /// # Returns
    /// The 25-byte locking script.
    pub fn p2pkh_lock(pubkey_hash: &[u8; 20]) -> Self {
        let mut bytes = Vec::with_capacity(25);
        bytes.push(OP_DUP);
        bytes.push(OP_HASH160);
        bytes.push(OP_DATA_20);
        bytes.extend_from_slice(pubkey_hash);
        bytes.push(OP_EQUALVERIFY);
        bytes.push(OP_CHECKSIG);
        Script(bytes)
    }

    /// Build the P2SH locking script for a 20-byte script hash.
    ///
    /// # Arguments
    /// * `script_hash` - hash160 of the redeem script.
    ///
    /// # Returns
    /// The 23-byte locking script.
    pub fn p2sh_lock(script_hash: &[u8; 20]) -> Self {
        let mut bytes = Vec::with_capacity(23);
        bytes.push(OP_HASH160);
        bytes.push(OP_DATA_20);
        bytes.extend_from_slice(script_hash);
        bytes.push(OP_EQUAL);
        Script(bytes)
    }

    /// Build the native segwit-v0 locking script for a 20-byte program.
    ///
    /// # Arguments
    /// * `pubkey_hash` - hash160 of the compressed public key.
    ///
    /// # Returns
    /// The 22-byte locking script OP_0 <20>.
    pub fn p2wpkh_lock(pubkey_hash: &[u8; 20]) -> Self {
        let mut bytes = Vec::with_capacity(22);
        bytes.push(OP_0);
        bytes.push(OP_DATA_20);
        bytes.extend_from_slice(pubkey_hash);
        Script(bytes)
    }

    /// Build the segwit-v1 (taproot) locking script for a 32-byte output key.
    ///
    /// # Arguments
    /// * `output_key` - The x-only taproot output key.
    ///
    /// # Returns
    /// The 34-byte locking script OP_1 <32>.
    pub fn p2tr_lock(output_key: &[u8; 32]) -> Self {
        let mut bytes = Vec::with_capacity(34);
        bytes.push(OP_1);
        bytes.push(OP_DATA_32);
        bytes.extend_from_slice(output_key);
        Script(bytes)
    }

    // -----------------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------------

    /// Encode the script as a hex string.
    ///
    /// # Returns
    /// A lowercase hex representation of the script bytes.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Return a reference to the underlying bytes.
    ///
    /// # Returns
    /// A byte slice of the script contents.
    pub fn to_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Return the length of the script in bytes.
    ///
    /// # Returns
    /// The number of bytes in the script.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the script is empty (zero bytes).
    ///
    /// # Returns
    /// `true` if the script has no bytes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Convert the script to its ASM (human-readable assembly) representation.
    ///
    /// # Returns
    /// A space-separated ASM string, or empty for empty/unparseable scripts.
    pub fn to_asm(&self) -> String {
        match self.chunks() {
            Ok(chunks) => chunks
                .iter()
                .map(ScriptChunk::to_asm_string)
                .collect::<Vec<_>>()
                .join(" "),
            Err(_) => String::new(),
        }
    }

    /// Parse the script into a vector of decoded chunks.
    ///
    /// # Returns
    /// A vector of `ScriptChunk` values, or an error if the script is malformed.
    pub fn chunks(&self) -> Result<Vec<ScriptChunk>, ScriptError> {
        decode_script(&self.0)
    }

    // -----------------------------------------------------------------------
    // Classification
    // -----------------------------------------------------------------------

    /// Classify the script by byte pattern.
    ///
    /// # Returns
    /// The matching `ScriptKind`, or `NonStandard`.
    pub fn kind(&self) -> ScriptKind {
        if self.is_p2pkh() {
            ScriptKind::P2pkh
        } else if self.is_p2sh() {
            ScriptKind::P2sh
        } else if self.is_p2wpkh() {
            ScriptKind::P2wpkh
        } else if self.is_p2tr() {
            ScriptKind::P2tr
        } else if self.is_op_return() {
            ScriptKind::OpReturn
        } else {
            ScriptKind::NonStandard
        }
    }

    /// Check for the P2PKH pattern:
    /// OP_DUP OP_HASH160 <20 bytes> OP_EQUALVERIFY OP_CHECKSIG.
    ///
    /// # Returns
    /// `true` if the script matches.
    pub fn is_p2pkh(&self) -> bool {
        let b = &self.0;
        b.len() == 25
            && b[0] == OP_DUP
            && b[1] == OP_HASH160
            && b[2] == OP_DATA_20
            && b[23] == OP_EQUALVERIFY
            && b[24] == OP_CHECKSIG
    }

    /// Check for the P2SH pattern: OP_HASH160 <20 bytes> OP_EQUAL.
    ///
    /// # Returns
    /// `true` if the script matches.
    pub fn is_p2sh(&self) -> bool {
        let b = &self.0;
        b.len() == 23 && b[0] == OP_HASH160 && b[1] == OP_DATA_20 && b[22] == OP_EQUAL
    }

    /// Check for the native segwit-v0 keyhash pattern: OP_0 <20 bytes>.
    ///
    /// # Returns
    /// `true` if the script matches.
    pub fn is_p2wpkh(&self) -> bool {
        let b = &self.0;
        b.len() == 22 && b[0] == OP_0 && b[1] == OP_DATA_20
    }

    /// Check for the taproot pattern: OP_1 <32 bytes>.
    ///
    /// # Returns
    /// `true` if the script matches.
    pub fn is_p2tr(&self) -> bool {
        let b = &self.0;
        b.len() == 34 && b[0] == OP_1 && b[1] == OP_DATA_32
    }

    /// Check for a data output beginning with OP_RETURN.
    ///
    /// # Returns
    /// `true` if the script starts with OP_RETURN.
    pub fn is_op_return(&self) -> bool {
        !self.0.is_empty() && self.0[0] == OP_RETURN
    }

    /// Extract the witness or hash program committed to by the script.
    ///
    /// For P2PKH/P2SH/P2WPKH this is the 20-byte hash; for P2TR the
    /// 32-byte output key.
    ///
    /// # Returns
    /// The program bytes, or an error for non-address scripts.
    pub fn program(&self) -> Result<Vec<u8>, ScriptError> {
        match self.kind() {
            ScriptKind::P2pkh => Ok(self.0[3..23].to_vec()),
            ScriptKind::P2sh => Ok(self.0[2..22].to_vec()),
            ScriptKind::P2wpkh => Ok(self.0[2..22].to_vec()),
            ScriptKind::P2tr => Ok(self.0[2..34].to_vec()),
            other => Err(ScriptError::NoAddressForm(format!("{:?}", other))),
        }
    }

    // -----------------------------------------------------------------------
    // Mutation / building
    // -----------------------------------------------------------------------

    /// Append data bytes to the script with the minimal push prefix.
    ///
    /// # Arguments
    /// * `data` - The data bytes to push.
    ///
    /// # Returns
    /// `Ok(())` on success, or an error if the data is too large.
    pub fn append_push_data(&mut self, data: &[u8]) -> Result<(), ScriptError> {
        let prefix = push_data_prefix(data.len())?;
        self.0.extend_from_slice(&prefix);
        self.0.extend_from_slice(data);
        Ok(())
    }

    /// Append raw opcodes to the script.
    ///
    /// Rejects push opcodes (OP_DATA_1..OP_PUSHDATA4); use
    /// `append_push_data` for those.
    ///
    /// # Arguments
    /// * `opcodes` - Slice of opcode bytes to append.
    ///
    /// # Returns
    /// `Ok(())` on success, or an error if a push opcode is encountered.
    pub fn append_opcodes(&mut self, opcodes: &[u8]) -> Result<(), ScriptError> {
        for &op in opcodes {
            if (OP_DATA_1..=OP_PUSHDATA4).contains(&op) {
                return Err(ScriptError::InvalidOpcode(crate::opcodes::opcode_to_string(
                    op,
                )));
            }
        }
        self.0.extend_from_slice(opcodes);
        Ok(())
    }
}

impl fmt::Display for Script {
    /// Display the script as a lowercase hex string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Script({})", self.to_hex())
    }
}

impl serde::Serialize for Script {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for Script {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Script::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
