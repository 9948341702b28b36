//! Структуры с дайджестом, объявленные вне крейта.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use stashpack::{
    msgpack::{ObjectRegistry, Packable}, structs::pack_digest, CodecError, CodecFactory, CodecOptions, Coder,
    Packed, StructCoder, TypeKind, Value,
};

stashpack::pack_struct! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Invoice {
        pub number: String,
        pub issued_on: NaiveDate,
        pub total: Decimal,
        pub note: Option<String>,
    }
}

stashpack::pack_struct! {
    keyword_init;
    #[derive(Debug, Clone, PartialEq)]
    pub struct Profile {
        pub name: String,
        pub age: Option<i64>,
    }
}

fn invoice() -> Invoice {
    Invoice {
        number: "INV-42".into(),
        issued_on: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        total: Decimal::new(199_99, 2),
        note: None,
    }
}

fn codec() -> stashpack::MessagePackCodec {
    CodecFactory::build(&[TypeKind::Date, TypeKind::Decimal], CodecOptions::default()).unwrap()
}

#[test]
fn struct_roundtrip_with_extension_fields() {
    let coder = Packed::new(StructCoder::<Invoice>::new(), codec());
    let bytes = coder.encode(&invoice()).unwrap();
    assert_eq!(coder.decode(&bytes).unwrap(), invoice());
}

#[test]
fn digest_leads_the_payload() {
    let bytes = Packed::new(StructCoder::<Invoice>::new(), codec())
        .encode(&invoice())
        .unwrap();
    let Value::Array(parts) = codec().decode(&bytes).unwrap() else {
        panic!("expected array");
    };
    assert_eq!(parts.len(), 5);
    assert_eq!(parts[0], Value::from(pack_digest::<Invoice>()));
}

#[test]
fn renamed_members_are_rejected() {
    stashpack::pack_struct! {
        #[derive(Debug, Clone, PartialEq)]
        pub struct RenamedInvoice {
            pub number: String,
            pub issued: NaiveDate,
            pub total: Decimal,
            pub note: Option<String>,
        }
    }

    let bytes = Packed::new(StructCoder::<Invoice>::new(), codec())
        .encode(&invoice())
        .unwrap();
    let err = Packed::new(StructCoder::<RenamedInvoice>::new(), codec())
        .decode(&bytes)
        .unwrap_err();
    assert!(matches!(err, CodecError::VersionMismatch(_)));
}

#[test]
fn keyword_init_tolerates_missing_and_extra_values() {
    let coder = StructCoder::<Profile>::new();
    let digest = Value::from(pack_digest::<Profile>());

    let short = Value::Array(vec![digest.clone(), "Ann".into()]);
    assert_eq!(
        stashpack::ValueCoder::unpack(&coder, short).unwrap(),
        Profile {
            name: "Ann".into(),
            age: None
        }
    );

    let long = Value::Array(vec![digest, "Bob".into(), 30.into(), "extra".into()]);
    assert_eq!(
        stashpack::ValueCoder::unpack(&coder, long).unwrap(),
        Profile {
            name: "Bob".into(),
            age: Some(30)
        }
    );
}

#[test]
fn field_type_mismatch_names_the_member() {
    let coder = StructCoder::<Profile>::new();
    let packed = Value::Array(vec![
        Value::from(pack_digest::<Profile>()),
        "Ann".into(),
        "old".into(),
    ]);
    let err = stashpack::ValueCoder::unpack(&coder, packed).unwrap_err();
    assert!(err.is_unpack());
    assert!(err.to_string().starts_with("age:"));
}

#[test]
fn struct_as_open_object_inside_other_values() {
    let objects = ObjectRegistry::new().with::<Invoice>().unwrap();
    let codec = CodecFactory::build(
        &[TypeKind::Date, TypeKind::Decimal],
        CodecOptions::default().open_objects(objects),
    )
    .unwrap();

    let value = Value::Array(vec![
        Value::from("batch"),
        Value::Object(std::sync::Arc::new(invoice())),
    ]);
    let back = codec.decode(&codec.encode(&value).unwrap()).unwrap();
    let Value::Object(obj) = &back.as_array().unwrap()[1] else {
        panic!("expected object, got {back:?}");
    };
    assert_eq!(obj.as_any().downcast_ref::<Invoice>(), Some(&invoice()));
}
