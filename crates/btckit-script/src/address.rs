/// Address parsing and script conversion.
///
/// Supports the four script kinds the engine signs: base58check P2PKH and
/// P2SH, bech32 P2WPKH (segwit v0), and bech32m P2TR (segwit v1). Parsing
/// tries the kinds in that order and fails `UnsupportedAddress` when none
/// match; `from_script` is the inverse, for display only.

use std::fmt;

use bech32::{segwit, Fe32, Hrp};

use btckit_primitives::hash::sha256d;

use crate::network::NetworkProfile;
use crate::script::{Script, ScriptKind};
use crate::ScriptError;

/// The kind of address, mirroring the script kinds with an address form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressKind {
    /// Base58check, pubkey-hash version byte.
    P2pkh,
    /// Base58check, script-hash version byte.
    P2sh,
    /// Bech32, witness version 0, 20-byte program.
    P2wpkh,
    /// Bech32m, witness version 1, 32-byte program.
    P2tr,
}

/// A parsed address: its kind, its hash/key program, and the network it
/// was encoded for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Address {
    /// The address kind.
    pub kind: AddressKind,
    /// The 20- or 32-byte program committed to by the locking script.
    pub program: Vec<u8>,
    /// The network profile the address belongs to.
    pub network: &'static NetworkProfile,
}

impl Address {
    /// Parse an address string, trying the four supported kinds in turn.
    ///
    /// # Arguments
    /// * `addr` - The address string.
    /// * `network` - The network the address must belong to.
    ///
    /// # Returns
    /// `Ok(Address)` on success; `UnsupportedAddress` if no kind matches;
    /// `WrongNetwork` if the encoding is valid for a different chain.
    pub fn from_string(
        addr: &str,
        network: &'static NetworkProfile,
    ) -> Result<Self, ScriptError> {
        // Bech32 first when the HRP separator is present: base58 decoding
        // of a bech32 string never succeeds, but the reverse error message
        // would be misleading.
        if let Ok((hrp, version, program)) = segwit::decode(addr) {
            if hrp.to_lowercase() != network.bech32_hrp {
                return Err(ScriptError::WrongNetwork {
                    address: addr.to_string(),
                    network: network.name.to_string(),
                });
            }
            return match (version.to_u8(), program.len()) {
                (0, 20) => Ok(Address {
                    kind: AddressKind::P2wpkh,
                    program,
                    network,
                }),
                (1, 32) => Ok(Address {
                    kind: AddressKind::P2tr,
                    program,
                    network,
                }),
                _ => Err(ScriptError::UnsupportedAddress(addr.to_string())),
            };
        }

        let decoded = bs58::decode(addr)
            .into_vec()
            .map_err(|_| ScriptError::UnsupportedAddress(addr.to_string()))?;
        if decoded.len() != 25 {
            return Err(ScriptError::InvalidAddressLength(addr.to_string()));
        }

        let checksum = sha256d(&decoded[..21]);
        if decoded[21..25] != checksum[..4] {
            return Err(ScriptError::ChecksumMismatch);
        }

        let kind = if decoded[0] == network.pubkey_hash_version {
            AddressKind::P2pkh
        } else if decoded[0] == network.script_hash_version {
            AddressKind::P2sh
        } else if crate::network::ALL
            .iter()
            .any(|p| decoded[0] == p.pubkey_hash_version || decoded[0] == p.script_hash_version)
        {
            return Err(ScriptError::WrongNetwork {
                address: addr.to_string(),
                network: network.name.to_string(),
            });
        } else {
            return Err(ScriptError::UnsupportedAddress(addr.to_string()));
        };

        Ok(Address {
            kind,
            program: decoded[1..21].to_vec(),
            network,
        })
    }

    /// Recover the address form of a locking script. Display only.
    ///
    /// # Arguments
    /// * `script` - The locking script.
    /// * `network` - The network to encode for.
    ///
    /// # Returns
    /// `Ok(Address)`, or `NoAddressForm` for scripts without one
    /// (OP_RETURN, non-standard).
    pub fn from_script(
        script: &Script,
        network: &'static NetworkProfile,
    ) -> Result<Self, ScriptError> {
        let kind = match script.kind() {
            ScriptKind::P2pkh => AddressKind::P2pkh,
            ScriptKind::P2sh => AddressKind::P2sh,
            ScriptKind::P2wpkh => AddressKind::P2wpkh,
            ScriptKind::P2tr => AddressKind::P2tr,
            other => return Err(ScriptError::NoAddressForm(format!("{:?}", other))),
        };
        Ok(Address {
            kind,
            program: script.program()?,
            network,
        })
    }

    /// Build the locking script this address commits to.
    ///
    /// # Returns
    /// The locking script bytes.
    pub fn to_script(&self) -> Script {
        match self.kind {
            AddressKind::P2pkh => {
                let mut hash = [0u8; 20];
                hash.copy_from_slice(&self.program);
                Script::p2pkh_lock(&hash)
            }
            AddressKind::P2sh => {
                let mut hash = [0u8; 20];
                hash.copy_from_slice(&self.program);
                Script::p2sh_lock(&hash)
            }
            AddressKind::P2wpkh => {
                let mut hash = [0u8; 20];
                hash.copy_from_slice(&self.program);
                Script::p2wpkh_lock(&hash)
            }
            AddressKind::P2tr => {
                let mut key = [0u8; 32];
                key.copy_from_slice(&self.program);
                Script::p2tr_lock(&key)
            }
        }
    }

    /// Encode the address as a string.
    ///
    /// # Returns
    /// The base58check or bech32/bech32m string form.
    pub fn encode(&self) -> String {
        match self.kind {
            AddressKind::P2pkh | AddressKind::P2sh => {
                let version = match self.kind {
                    AddressKind::P2pkh => self.network.pubkey_hash_version,
                    _ => self.network.script_hash_version,
                };
                let mut payload = Vec::with_capacity(25);
                payload.push(version);
                payload.extend_from_slice(&self.program);
                let checksum = sha256d(&payload);
                payload.extend_from_slice(&checksum[..4]);
                bs58::encode(payload).into_string()
            }
            AddressKind::P2wpkh | AddressKind::P2tr => {
                let version = match self.kind {
                    AddressKind::P2wpkh => Fe32::Q,
                    _ => Fe32::P,
                };
                let hrp = Hrp::parse_unchecked(self.network.bech32_hrp);
                segwit::encode(hrp, version, &self.program)
                    .unwrap_or_default()
            }
        }
    }

    /// Convenience: parse an address and return its locking script.
    ///
    /// # Arguments
    /// * `addr` - The address string.
    /// * `network` - The network the address must belong to.
    ///
    /// # Returns
    /// The locking script, or an error for unsupported addresses.
    pub fn to_script_pubkey(
        addr: &str,
        network: &'static NetworkProfile,
    ) -> Result<Script, ScriptError> {
        Ok(Self::from_string(addr, network)?.to_script())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

#[cfg(test)]
mod tests {
    //! Tests for address parsing, script conversion, and the roundtrip
    //! property across all four kinds.

    use super::*;
    use crate::network::{MAINNET, TESTNET};

    // Address vectors for the generator-point public key
    // (hash160 751e76e8199196d454941c45d1b3a323f1433bd6).
    const GEN_PKH_HEX: &str = "751e76e8199196d454941c45d1b3a323f1433bd6";

    // -----------------------------------------------------------------------
    // Parsing
    // -----------------------------------------------------------------------

    #[test]
    fn test_parse_p2pkh_mainnet() {
        let addr = Address::from_string("1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH", &MAINNET)
            .expect("valid p2pkh");
        assert_eq!(addr.kind, AddressKind::P2pkh);
        assert_eq!(hex::encode(&addr.program), GEN_PKH_HEX);
    }

    #[test]
    fn test_parse_p2sh_mainnet() {
        // Self-derived: encode a known script hash, then parse it back.
        let script = Script::p2sh_lock(&[0x5a; 20]);
        let encoded = Address::from_script(&script, &MAINNET).unwrap().encode();
        assert!(encoded.starts_with('3'));
        let addr = Address::from_string(&encoded, &MAINNET).expect("valid p2sh");
        assert_eq!(addr.kind, AddressKind::P2sh);
        assert_eq!(addr.program, vec![0x5a; 20]);
    }

    #[test]
    fn test_parse_p2wpkh_mainnet() {
        let addr =
            Address::from_string("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4", &MAINNET)
                .expect("valid p2wpkh");
        assert_eq!(addr.kind, AddressKind::P2wpkh);
        assert_eq!(hex::encode(&addr.program), GEN_PKH_HEX);
    }

    #[test]
    fn test_parse_p2tr_mainnet() {
        // BIP-350 test vector: v1 with a 32-byte program.
        let addr = Address::from_string(
            "bc1p0xlxvlhemja6c4dqv22uapctqupfhlxm9h8z3k2e72q4k9hcz7vqzk5jj0",
            &MAINNET,
        )
        .expect("valid p2tr");
        assert_eq!(addr.kind, AddressKind::P2tr);
        assert_eq!(addr.program.len(), 32);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            Address::from_string("not-an-address", &MAINNET),
            Err(ScriptError::UnsupportedAddress(_))
        ));
    }

    #[test]
    fn test_parse_rejects_wrong_network() {
        // A testnet bech32 address offered as mainnet.
        let err = Address::from_string(
            "tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx",
            &MAINNET,
        )
        .unwrap_err();
        assert!(matches!(err, ScriptError::WrongNetwork { .. }));

        // A mainnet base58 address offered as testnet.
        let err =
            Address::from_string("1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH", &TESTNET).unwrap_err();
        assert!(matches!(err, ScriptError::WrongNetwork { .. }));
    }

    #[test]
    fn test_parse_rejects_bad_checksum() {
        // Valid length, corrupted checksum.
        let err =
            Address::from_string("1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMG", &MAINNET).unwrap_err();
        // Depending on where the corruption lands this is a checksum or
        // decode failure; either way it must not parse.
        assert!(matches!(
            err,
            ScriptError::ChecksumMismatch | ScriptError::UnsupportedAddress(_)
        ));
    }

    // -----------------------------------------------------------------------
    // Script conversion + roundtrip
    // -----------------------------------------------------------------------

    #[test]
    fn test_address_script_roundtrip_all_kinds() {
        let mut addresses = vec![
            "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH".to_string(),
            "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4".to_string(),
            "bc1p0xlxvlhemja6c4dqv22uapctqupfhlxm9h8z3k2e72q4k9hcz7vqzk5jj0".to_string(),
        ];
        // P2SH derived from a fixed script hash.
        addresses.push(
            Address::from_script(&Script::p2sh_lock(&[0x5a; 20]), &MAINNET)
                .unwrap()
                .encode(),
        );
        for addr_str in &addresses {
            let addr = Address::from_string(addr_str, &MAINNET).expect("parse");
            let script = addr.to_script();
            let back = Address::from_script(&script, &MAINNET).expect("from_script");
            assert_eq!(&back.encode(), addr_str, "roundtrip failed for {}", addr_str);
        }
    }

    #[test]
    fn test_p2wpkh_script_shape() {
        let addr =
            Address::from_string("bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4", &MAINNET)
                .expect("parse");
        assert_eq!(
            addr.to_script().to_hex(),
            format!("0014{}", GEN_PKH_HEX)
        );
    }

    #[test]
    fn test_from_script_rejects_op_return() {
        let mut script = Script::new();
        script.append_opcodes(&[crate::opcodes::OP_RETURN]).unwrap();
        assert!(Address::from_script(&script, &MAINNET).is_err());
    }
}
