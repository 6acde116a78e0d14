use proptest::prelude::*;

use btckit_envelopes::runes::{
    decode_payload, decode_varint, decode_varint_legacy, encode_payload, encode_varint,
    encode_varint_legacy,
};
use btckit_envelopes::{Edict, VarintOrder};

fn arb_edict() -> impl Strategy<Value = Edict> {
    (
        800_000u64..900_000,
        0u32..1000,
        1u128..1_000_000_000,
        0u32..10,
    )
        .prop_map(|(block, id, amount, output)| Edict {
            block,
            id,
            amount,
            output,
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn varint_roundtrip_low_to_high(value in any::<u128>()) {
        let mut buf = Vec::new();
        encode_varint(value, &mut buf);
        let mut pos = 0;
        prop_assert_eq!(decode_varint(&buf, &mut pos).unwrap(), value);
        prop_assert_eq!(pos, buf.len());
    }

    #[test]
    fn varint_roundtrip_legacy(value in any::<u128>()) {
        let mut buf = Vec::new();
        encode_varint_legacy(value, &mut buf);
        let mut pos = 0;
        prop_assert_eq!(decode_varint_legacy(&buf, &mut pos).unwrap(), value);
        prop_assert_eq!(pos, buf.len());
    }

    /// decode(encode(edicts)) reproduces the (block, id, amount, output)
    /// set regardless of input order, because encoding always sorts.
    #[test]
    fn edicts_roundtrip_regardless_of_order(
        mut edicts in prop::collection::vec(arb_edict(), 1..4),
        order in prop::sample::select(vec![VarintOrder::LowToHigh, VarintOrder::LegacyHighToLow]),
    ) {
        // Distinct (block, id) pairs keep the expected set well-defined.
        edicts.sort_by_key(|e| (e.block, e.id));
        edicts.dedup_by_key(|e| (e.block, e.id));
        let mut expected = edicts.clone();
        expected.sort_by_key(|e| (e.block, e.id));

        edicts.reverse();
        if let Ok(payload) = encode_payload(&edicts, order) {
            let decoded = decode_payload(&payload, order).unwrap();
            prop_assert_eq!(decoded, expected);
        }
    }
}
