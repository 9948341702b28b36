//! Стабильность байтового представления extension-типов.
//!
//! Векторы ниже зафиксированы: их меняет только новая версия формата,
//! иначе ранее записанные payload'ы перестанут читаться.

use chrono::{FixedOffset, NaiveDate, TimeZone, Timelike, Utc};
use rust_decimal::Decimal;
use stashpack::{CodecFactory, CodecOptions, Coder, MessagePackCodec, TypeKind, Value};

fn codec(kinds: &[TypeKind]) -> MessagePackCodec {
    CodecFactory::build(kinds, CodecOptions::default()).unwrap()
}

fn sym(name: &str) -> Value {
    Value::Symbol(name.to_string())
}

fn all_types_codec() -> MessagePackCodec {
    codec(&[
        TypeKind::Symbol,
        TypeKind::Time,
        TypeKind::DateTime,
        TypeKind::Date,
        TypeKind::Decimal,
    ])
}

fn utc(
    y: i32,
    m: u32,
    d: u32,
    h: u32,
    mi: u32,
    s: u32,
) -> chrono::DateTime<FixedOffset> {
    Utc.with_ymd_and_hms(y, m, d, h, mi, s)
        .unwrap()
        .fixed_offset()
}

const STABLE_DUMP: &[u8] = b"\x87\xC7\x06\x00symbol\xC7\x06\x00symbol\xC7\x06\x00string\xA6string\
\xC7\x05\x00array\x92\xD4\x00a\xA1b\
\xD6\x00time\xC7\x0C\x01\x1A\x60\x6D\x38\x00\x00\x00\x00\x01\x00\x00\x00\
\xD7\x00datetime\xC7\x14\x02\xD0\x07\x01\x01\x04\x05\x06\x00\x00\x00\x00\x00\x00\x00\x01\x00\x00\x00\x00\x01\
\xD6\x00date\xD6\x03\xD0\x07\x01\x01\
\xD6\x00hash\x81\xD4\x00a\x91\xD4\x00a";

const STABLE_LOAD: &[u8] = b"\x88\xC7\x06\x00symbol\xC7\x06\x00symbol\xC7\x06\x00string\xA6string\
\xC7\x05\x00array\x92\xD4\x00a\xA1b\
\xD6\x00time\xC7\x0C\x01\x1A\x60\x6D\x38\x00\x00\x00\x00\x01\x00\x00\x00\
\xD7\x00datetime\xC7\x14\x02\xD0\x07\x01\x01\x04\x05\x06\x00\x00\x00\x00\x00\x00\x00\x01\x00\x00\x00\x00\x01\
\xD6\x00date\xD6\x03\xD0\x07\x01\x01\
\xC7\x0A\x00bigdecimal\xC7\x0A\x0427:0.123e3\
\xD6\x00hash\x81\xD4\x00a\x91\xD4\x00a";

fn stable_entries() -> Vec<(Value, Value)> {
    vec![
        (sym("symbol"), sym("symbol")),
        (sym("string"), Value::from("string")),
        (sym("array"), Value::Array(vec![sym("a"), Value::from("b")])),
        (sym("time"), Value::Time(utc(2000, 1, 1, 2, 2, 2))),
        (sym("datetime"), Value::DateTime(utc(2000, 1, 1, 4, 5, 6))),
        (
            sym("date"),
            Value::Date(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap()),
        ),
    ]
}

fn hash_entry() -> (Value, Value) {
    (
        sym("hash"),
        Value::Map(vec![(sym("a"), Value::Array(vec![sym("a")]))]),
    )
}

#[test]
fn all_types_are_stable_together_on_dump() {
    let mut entries = stable_entries();
    entries.push(hash_entry());

    let bytes = all_types_codec().encode(&Value::Map(entries)).unwrap();
    assert_eq!(bytes, STABLE_DUMP);
}

#[test]
fn all_types_are_stable_together_on_load() {
    let mut entries = stable_entries();
    entries.push((sym("bigdecimal"), Value::Decimal(Decimal::from(123))));
    entries.push(hash_entry());

    assert_eq!(
        all_types_codec().decode(STABLE_LOAD).unwrap(),
        Value::Map(entries)
    );
}

#[test]
fn symbol_vector() {
    let codec = codec(&[TypeKind::Symbol]);
    let bytes = codec.encode(&sym("hello")).unwrap();
    assert_eq!(bytes, b"\xC7\x05\x00hello");
    assert_eq!(codec.decode(&bytes).unwrap(), sym("hello"));
}

#[test]
fn time_vector_keeps_microseconds() {
    let codec = codec(&[TypeKind::Time]);
    let time = Utc
        .timestamp_opt(1_486_570_508, 539_759_000)
        .unwrap()
        .fixed_offset();

    let bytes = codec.encode(&Value::Time(time)).unwrap();
    assert_eq!(bytes, b"\xC7\x0C\x01oW\x18+\x07H\x05\x00@B\x0F\x00");

    let Value::Time(back) = codec.decode(&bytes).unwrap() else {
        panic!("expected a time");
    };
    assert_eq!(back.nanosecond(), time.nanosecond());
    assert_eq!(back, time);
}

#[test]
fn date_time_vector_keeps_offset() {
    let codec = codec(&[TypeKind::DateTime]);
    let est = FixedOffset::west_opt(5 * 3600).unwrap();
    let value = est
        .with_ymd_and_hms(2017, 2, 8, 11, 25, 12)
        .unwrap()
        .with_nanosecond(571_685_000)
        .unwrap();

    let bytes = codec.encode(&Value::DateTime(value)).unwrap();
    assert_eq!(
        bytes,
        b"\xC7\x14\x02\xE1\x07\x02\x08\x0B\x19\xA1\x5D\x26\x00\x00\x00\x00\x00\x40\x0D\x03\x00\xFB\x18"
    );

    let Value::DateTime(back) = codec.decode(&bytes).unwrap() else {
        panic!("expected a datetime");
    };
    assert_eq!(back, value);
    assert_eq!(back.offset(), value.offset());
}

#[test]
fn date_vector() {
    let codec = codec(&[TypeKind::Date]);
    let value = Value::Date(NaiveDate::from_ymd_opt(2017, 2, 8).unwrap());

    let bytes = codec.encode(&value).unwrap();
    assert_eq!(bytes, b"\xD6\x03\xE1\x07\x02\x08");
    assert_eq!(codec.decode(&bytes).unwrap(), value);
}

#[test]
fn decimal_precision_prefix_is_ignored_on_load() {
    let codec = all_types_codec();
    let expected = Value::Decimal(Decimal::from(123));

    assert_eq!(
        codec.encode(&expected).unwrap(),
        b"\xC7\x09\x049:0.123e3"
    );
    assert_eq!(codec.decode(b"\xC7\x0A\x0427:0.123e3").unwrap(), expected);
    assert_eq!(codec.decode(b"\xC7\x09\x049:0.123e3").unwrap(), expected);
}

#[test]
fn set_vector_nests() {
    let codec = codec(&[TypeKind::Set]);
    let value = Value::Set(vec![
        Value::Int(1),
        Value::Int(2),
        Value::Array(vec![
            Value::Int(3),
            Value::Int(4),
            Value::Set(vec![Value::Int(5)]),
        ]),
    ]);

    let bytes = codec.encode(&value).unwrap();
    assert_eq!(bytes, b"\xC7\x0A\x09\x93\x01\x02\x93\x03\x04\xD5\x09\x91\x05");
    assert_eq!(codec.decode(&bytes).unwrap(), value);
}

#[test]
fn undeclared_type_is_a_pack_error() {
    let codec = codec(&[]);
    let err = codec
        .encode(&Value::Time(utc(2020, 1, 1, 0, 0, 0)))
        .unwrap_err();
    assert!(err.is_pack());
    assert_eq!(err.receiver(), Some("Time"));
}

#[test]
fn malformed_payload_is_an_unpack_error() {
    let err = all_types_codec().decode(b"\x00\x00").unwrap_err();
    assert!(err.is_unpack());
}

#[test]
fn unknown_extension_is_an_unpack_error() {
    let err = codec(&[TypeKind::Symbol])
        .decode(b"\xD4\x03\x00")
        .unwrap_err();
    assert!(err.is_unpack());
}
