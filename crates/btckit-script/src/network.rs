//! Per-chain network constants.
//!
//! The profile table is the only global in the SDK and it is read-only:
//! every builder and signer receives an explicit `&NetworkProfile`.

/// Witness bytes are discounted 4:1 when computing virtual size.
pub const WITNESS_SCALE_FACTOR: u64 = 4;

/// Default dust / minimum change threshold in satoshis.
pub const DUST_LIMIT: u64 = 546;

/// Per-chain constants: address version bytes, bech32 prefix, and the
/// standardness weight ceiling enforced on reveal transactions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NetworkProfile {
    /// Human-readable chain name.
    pub name: &'static str,
    /// P2P message magic.
    pub magic: u32,
    /// Base58 version byte for P2PKH addresses.
    pub pubkey_hash_version: u8,
    /// Base58 version byte for P2SH addresses.
    pub script_hash_version: u8,
    /// Version byte used in WIF private key encoding.
    pub wif_version: u8,
    /// Human-readable part for bech32/bech32m addresses.
    pub bech32_hrp: &'static str,
    /// Maximum standard transaction weight accepted by relay policy.
    pub max_standard_tx_weight: u64,
}

/// Bitcoin mainnet.
pub const MAINNET: NetworkProfile = NetworkProfile {
    name: "mainnet",
    magic: 0xd9b4_bef9,
    pubkey_hash_version: 0x00,
    script_hash_version: 0x05,
    wif_version: 0x80,
    bech32_hrp: "bc",
    max_standard_tx_weight: 400_000,
};

/// Bitcoin testnet (covers testnet3 and signet addressing).
pub const TESTNET: NetworkProfile = NetworkProfile {
    name: "testnet",
    magic: 0x0709_110b,
    pubkey_hash_version: 0x6f,
    script_hash_version: 0xc4,
    wif_version: 0xef,
    bech32_hrp: "tb",
    max_standard_tx_weight: 400_000,
};

/// Litecoin mainnet, the chain variant sharing this address scheme.
pub const LITECOIN: NetworkProfile = NetworkProfile {
    name: "litecoin",
    magic: 0xdbb6_c0fb,
    pubkey_hash_version: 0x30,
    script_hash_version: 0x32,
    wif_version: 0xb0,
    bech32_hrp: "ltc",
    max_standard_tx_weight: 400_000,
};

/// The read-only profile table.
pub const ALL: &[NetworkProfile] = &[MAINNET, TESTNET, LITECOIN];

impl NetworkProfile {
    /// Look up a profile by chain name.
    ///
    /// # Arguments
    /// * `name` - The chain name ("mainnet", "testnet", "litecoin").
    ///
    /// # Returns
    /// The matching profile, or `None`.
    pub fn by_name(name: &str) -> Option<&'static NetworkProfile> {
        ALL.iter().find(|p| p.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_name() {
        assert_eq!(NetworkProfile::by_name("mainnet"), Some(&MAINNET));
        assert_eq!(NetworkProfile::by_name("testnet"), Some(&TESTNET));
        assert_eq!(NetworkProfile::by_name("regtest"), None);
    }

    #[test]
    fn test_mainnet_constants() {
        assert_eq!(MAINNET.pubkey_hash_version, 0x00);
        assert_eq!(MAINNET.script_hash_version, 0x05);
        assert_eq!(MAINNET.bech32_hrp, "bc");
        assert_eq!(MAINNET.max_standard_tx_weight, 400_000);
    }
}
