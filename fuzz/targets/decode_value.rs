#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use stashpack::{CodecFactory, CodecOptions, Coder, TypeKind};

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    data: Vec<u8>,
    format_version: bool,
}

fuzz_target!(|input: FuzzInput| {
    let kinds: Vec<TypeKind> = TypeKind::ALL
        .into_iter()
        .filter(|k| *k != TypeKind::Object)
        .collect();
    let options = CodecOptions::default().format_version(input.format_version as u8);
    let Ok(codec) = CodecFactory::build(&kinds, options) else {
        return;
    };

    // Декодер не должен паниковать ни на каких данных.
    let Ok(value) = codec.decode(&input.data) else {
        return;
    };

    // Повторное кодирование стабильно.
    if let Ok(bytes) = codec.encode(&value) {
        let again = codec.decode(&bytes).expect("re-encoded value must decode");
        assert_eq!(codec.encode(&again).ok(), Some(bytes));
    }
});
