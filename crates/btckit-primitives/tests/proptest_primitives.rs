use proptest::prelude::*;

use btckit_primitives::chainhash::Hash;
use btckit_primitives::ec::private_key::PrivateKey;
use btckit_primitives::hash::sha256;
use btckit_primitives::util::{ByteReader, ByteWriter, VarInt};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn wif_roundtrip_preserves_key_and_version(
        seed in prop::array::uniform32(any::<u8>()),
        version in prop::sample::select(vec![0x80u8, 0xef]),
    ) {
        // Not all 32-byte arrays are valid scalars (nonzero, < curve order).
        if let Ok(key) = PrivateKey::from_bytes(&seed) {
            let wif = key.to_wif(version);
            let decoded = PrivateKey::decode_wif(&wif).unwrap();
            prop_assert_eq!(decoded.key.to_hex(), key.to_hex());
            prop_assert_eq!(decoded.version, version);
            prop_assert!(decoded.compressed);
        }
    }

    #[test]
    fn ecdsa_sign_verify_roundtrip(
        seed in prop::array::uniform32(any::<u8>()),
        msg in prop::collection::vec(any::<u8>(), 0..256)
    ) {
        if let Ok(key) = PrivateKey::from_bytes(&seed) {
            let hash = sha256(&msg);
            let sig = key.sign(&hash).unwrap();
            prop_assert!(key.pub_key().verify(&hash, &sig));
        }
    }

    #[test]
    fn hash_hex_roundtrip(bytes in prop::array::uniform32(any::<u8>())) {
        let hash = Hash::new(bytes);
        let hash2 = Hash::from_hex(&hash.to_hex()).unwrap();
        prop_assert_eq!(hash.as_bytes(), hash2.as_bytes());
    }

    #[test]
    fn varint_roundtrip(value in any::<u64>()) {
        let encoded = VarInt(value).to_bytes();
        let mut reader = ByteReader::new(&encoded);
        prop_assert_eq!(reader.read_varint().unwrap(), VarInt(value));
        prop_assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn var_bytes_roundtrip(payload in prop::collection::vec(any::<u8>(), 0..600)) {
        let mut writer = ByteWriter::new();
        writer.write_var_bytes(&payload);
        let data = writer.into_bytes();
        let mut reader = ByteReader::new(&data);
        prop_assert_eq!(reader.read_var_bytes().unwrap(), payload.as_slice());
    }
}
