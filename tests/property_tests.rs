//! Property-based тесты кодеков.
//!
//! Генерируют случайные значения всех поддерживаемых типов и проверяют,
//! что decode(encode(v)) == v для MessagePack-кодека, пула и конвертов,
//! а декодирование произвольных байтов никогда не паникует.

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use stashpack::{
    CacheEntry, CodecFactory, CodecOptions, Coder, FlatCacheEntryCoder, MessagePackCodec,
    StringBypassVersion, TypeKind, Value, Versions, ZonedTime,
};

/// Количество итераций на свойство.
const PROPTEST_CASES: u32 = 256;

fn full_codec(format_version: u8) -> MessagePackCodec {
    CodecFactory::build(
        &TypeKind::ALL
            .into_iter()
            .filter(|k| *k != TypeKind::Object)
            .collect::<Vec<_>>(),
        CodecOptions::default().format_version(format_version),
    )
    .unwrap()
}

fn instant() -> impl Strategy<Value = DateTime<Utc>> {
    // 1901..2099
    (-2_147_483_648i64..4_102_444_800i64, 0u32..1_000_000_000u32)
        .prop_map(|(secs, nanos)| Utc.timestamp_opt(secs, nanos).unwrap())
}

fn fixed_offset() -> impl Strategy<Value = FixedOffset> {
    (-12i32..=14).prop_map(|h| FixedOffset::east_opt(h * 3600).unwrap())
}

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Nil),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        any::<u64>().prop_map(Value::UInt),
        any::<i128>().prop_map(Value::integer),
        any::<f64>()
            .prop_filter("NaN is not equal to itself", |f| !f.is_nan())
            .prop_map(Value::Float),
        ".{0,40}".prop_map(Value::Str),
        "[a-z_]{1,12}".prop_map(Value::Symbol),
        prop::collection::vec(any::<u8>(), 0..64).prop_map(Value::Bin),
        (instant(), fixed_offset())
            .prop_map(|(t, o)| Value::Time(t.with_timezone(&o))),
        (instant(), fixed_offset())
            .prop_map(|(t, o)| Value::DateTime(t.with_timezone(&o))),
        (1900i32..2100, 1u32..=12, 1u32..=28)
            .prop_map(|(y, m, d)| Value::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())),
        (-1_000_000_000_000_000i64..1_000_000_000_000_000, 0u32..=8)
            .prop_map(|(m, s)| Value::Decimal(Decimal::new(m, s))),
        (instant(), "[A-Za-z]{1,8}(/[A-Za-z_]{1,12})?")
            .prop_map(|(t, zone)| Value::ZonedTime(ZonedTime::new(t, zone))),
    ]
}

fn value() -> impl Strategy<Value = Value> {
    scalar().prop_recursive(4, 64, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..8).prop_map(Value::Array),
            prop::collection::vec(inner.clone(), 0..8).prop_map(Value::Set),
            prop::collection::vec((inner.clone(), inner), 0..8).prop_map(Value::Map),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(PROPTEST_CASES))]

    #[test]
    fn roundtrip_format_v0(v in value()) {
        let codec = full_codec(0);
        let bytes = codec.encode(&v).unwrap();
        prop_assert_eq!(codec.decode(&bytes).unwrap(), v);
    }

    #[test]
    fn roundtrip_format_v1(v in value()) {
        let codec = full_codec(1);
        let bytes = codec.encode(&v).unwrap();
        prop_assert_eq!(codec.decode(&bytes).unwrap(), v);
    }

    #[test]
    fn v1_reads_v0_payloads(v in value()) {
        let bytes = full_codec(0).encode(&v).unwrap();
        prop_assert_eq!(full_codec(1).decode(&bytes).unwrap(), v);
    }

    #[test]
    fn pooled_matches_plain(v in value()) {
        let kinds = [TypeKind::Symbol, TypeKind::Set, TypeKind::BigInt];
        let plain = CodecFactory::build(&kinds, CodecOptions::default()).unwrap();
        let pooled = CodecFactory::build_pooled(&kinds, CodecOptions::default(), 2).unwrap();
        prop_assert_eq!(plain.encode(&v).ok(), pooled.encode(&v).ok());
    }

    #[test]
    fn string_bypass_roundtrip(v in value()) {
        let coder = StringBypassVersion::new(0, Versions::new().with(0, full_codec(0))).unwrap();
        let bytes = coder.encode(&v).unwrap();
        prop_assert_eq!(coder.decode(&bytes).unwrap(), v);
    }

    #[test]
    fn flat_cache_entry_roundtrip(
        v in value(),
        expires_at in prop::option::of(1.0f64..4_000_000_000.0),
        version in prop::option::of("[a-z0-9]{0,16}"),
    ) {
        let coder = FlatCacheEntryCoder::new(full_codec(0));
        let entry = CacheEntry { value: v, expires_at, version };
        let bytes = coder.encode(&entry).unwrap();
        prop_assert_eq!(coder.decode(&bytes).unwrap(), entry);
    }

    #[test]
    fn arbitrary_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = full_codec(0).decode(&bytes);
        let _ = full_codec(1).decode(&bytes);
    }
}
