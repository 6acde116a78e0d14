//! Previous-output bookkeeping.
//!
//! `PrevOutput` is the caller-supplied description of a spendable output;
//! `UtxoSet` is the resolved outpoint map that the signature engine and
//! size estimator consume. The set is an explicit value passed into every
//! signing call, never shared process-wide state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use btckit_primitives::chainhash::Hash;
use btckit_primitives::ec::{DecodedWif, PrivateKey};
use btckit_script::{Address, NetworkProfile, Script};

use crate::TransactionError;

/// A reference to a specific output of a specific transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Outpoint {
    /// Txid in internal (little-endian) byte order.
    pub txid: [u8; 32],
    /// Output index.
    pub vout: u32,
}

impl Outpoint {
    /// Create an outpoint.
    ///
    /// # Arguments
    /// * `txid` - Txid in internal byte order.
    /// * `vout` - Output index.
    ///
    /// # Returns
    /// A new `Outpoint`.
    pub fn new(txid: [u8; 32], vout: u32) -> Self {
        Outpoint { txid, vout }
    }
}

/// The value and locking script of an unspent output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UtxoEntry {
    /// Output value in satoshis.
    pub value: u64,
    /// The locking script.
    pub script_pubkey: Script,
}

/// A caller-supplied description of an output to spend.
///
/// Constructed from request input and read-only thereafter. The locking
/// script may be given either as an address or as raw script hex; the
/// address wins when both are present.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PrevOutput {
    /// Txid in display-order hex.
    pub txid: String,
    /// Output index.
    pub vout: u32,
    /// Output value in satoshis.
    pub value: u64,
    /// The address form of the locking script.
    #[serde(default)]
    pub address: Option<String>,
    /// The raw locking script as hex, for non-address scripts.
    #[serde(default)]
    pub script_hex: Option<String>,
    /// WIF-encoded private key authorized to spend this output.
    pub private_key_wif: String,
}

impl PrevOutput {
    /// Resolve the outpoint in internal byte order.
    ///
    /// # Returns
    /// The outpoint, or a validation error for malformed txid hex.
    pub fn outpoint(&self) -> Result<Outpoint, TransactionError> {
        let hash = Hash::from_hex(&self.txid)
            .map_err(|e| TransactionError::Validation(format!("bad txid: {}", e)))?;
        Ok(Outpoint::new(*hash.as_bytes(), self.vout))
    }

    /// Resolve the locking script from the address or script hex.
    ///
    /// # Arguments
    /// * `network` - The network addresses must belong to.
    ///
    /// # Returns
    /// The locking script, or a validation error.
    pub fn script_pubkey(
        &self,
        network: &'static NetworkProfile,
    ) -> Result<Script, TransactionError> {
        if let Some(addr) = &self.address {
            return Ok(Address::from_string(addr, network)?.to_script());
        }
        if let Some(script_hex) = &self.script_hex {
            return Script::from_hex(script_hex).map_err(TransactionError::from);
        }
        Err(TransactionError::Validation(
            "prev output has neither address nor script".to_string(),
        ))
    }

    /// Decode the WIF private key.
    ///
    /// # Returns
    /// The decoded key with its metadata, or `BadPrivateKey`.
    pub fn private_key(&self) -> Result<DecodedWif, TransactionError> {
        PrivateKey::decode_wif(&self.private_key_wif)
            .map_err(|e| TransactionError::BadPrivateKey(e.to_string()))
    }
}

/// A map from outpoint to the value and script being spent.
///
/// Every signer and size estimator reads prevout data from here; each
/// builder owns a private instance.
#[derive(Clone, Debug, Default)]
pub struct UtxoSet {
    entries: HashMap<Outpoint, UtxoEntry>,
}

impl UtxoSet {
    /// Create an empty set.
    ///
    /// # Returns
    /// A new `UtxoSet`.
    pub fn new() -> Self {
        UtxoSet {
            entries: HashMap::new(),
        }
    }

    /// Insert an entry.
    ///
    /// # Arguments
    /// * `outpoint` - The outpoint being described.
    /// * `entry` - Its value and locking script.
    pub fn insert(&mut self, outpoint: Outpoint, entry: UtxoEntry) {
        self.entries.insert(outpoint, entry);
    }

    /// Look up an entry.
    ///
    /// # Arguments
    /// * `outpoint` - The outpoint to resolve.
    ///
    /// # Returns
    /// The entry, or `None` if absent.
    pub fn get(&self, outpoint: &Outpoint) -> Option<&UtxoEntry> {
        self.entries.get(outpoint)
    }

    /// Look up an entry, failing with a validation error if absent.
    ///
    /// # Arguments
    /// * `outpoint` - The outpoint to resolve.
    ///
    /// # Returns
    /// The entry, or `Validation` naming the missing outpoint.
    pub fn require(&self, outpoint: &Outpoint) -> Result<&UtxoEntry, TransactionError> {
        self.get(outpoint).ok_or_else(|| {
            TransactionError::Validation(format!(
                "no utxo entry for outpoint {}:{}",
                hex::encode(outpoint.txid),
                outpoint.vout
            ))
        })
    }

    /// Number of entries in the set.
    ///
    /// # Returns
    /// The entry count.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty.
    ///
    /// # Returns
    /// `true` if no entries are present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use btckit_script::network::MAINNET;

    fn sample_prev() -> PrevOutput {
        PrevOutput {
            txid: "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b"
                .to_string(),
            vout: 1,
            value: 100_000,
            address: Some("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4".to_string()),
            script_hex: None,
            private_key_wif: "KwDiBf89QgGbjEhKnhXJuH7LrciVrZi3qYjgd9M7rFU73sVHnoWn"
                .to_string(),
        }
    }

    #[test]
    fn test_outpoint_internal_order() {
        let prev = sample_prev();
        let outpoint = prev.outpoint().unwrap();
        // Display order reversed into internal order.
        assert_eq!(outpoint.txid[0], 0x3b);
        assert_eq!(outpoint.vout, 1);
    }

    #[test]
    fn test_script_resolution_from_address() {
        let prev = sample_prev();
        let script = prev.script_pubkey(&MAINNET).unwrap();
        assert!(script.is_p2wpkh());
    }

    #[test]
    fn test_script_resolution_requires_source() {
        let mut prev = sample_prev();
        prev.address = None;
        prev.script_hex = None;
        assert!(matches!(
            prev.script_pubkey(&MAINNET),
            Err(TransactionError::Validation(_))
        ));
    }

    #[test]
    fn test_bad_wif_is_bad_private_key() {
        let mut prev = sample_prev();
        prev.private_key_wif = "garbage".to_string();
        assert!(matches!(
            prev.private_key(),
            Err(TransactionError::BadPrivateKey(_))
        ));
    }

    #[test]
    fn test_utxo_set_lookup() {
        let mut set = UtxoSet::new();
        let outpoint = Outpoint::new([0xcd; 32], 0);
        assert!(set.require(&outpoint).is_err());
        set.insert(
            outpoint,
            UtxoEntry {
                value: 5_000,
                script_pubkey: Script::p2wpkh_lock(&[0x01; 20]),
            },
        );
        assert_eq!(set.require(&outpoint).unwrap().value, 5_000);
        assert_eq!(set.len(), 1);
    }
}
