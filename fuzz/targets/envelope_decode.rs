#![no_main]

use libfuzzer_sys::fuzz_target;
use stashpack::{
    CacheEntryCoder, CodecFactory, CodecOptions, Coder, CoderChain, CommentPrefixVersion,
    ConditionalCompressor, FlatCacheEntryCoder, MessagePackCodec, Packed, StringBypassVersion,
    TypeKind, Versions, Zlib,
};

fn codec() -> MessagePackCodec {
    CodecFactory::build(&[TypeKind::Symbol, TypeKind::Set], CodecOptions::default())
        .expect("static kinds")
}

fuzz_target!(|data: &[u8]| {
    let bypass = StringBypassVersion::new(0, Versions::new().with(0, codec()))
        .expect("version 0 registered")
        .with_string_coder(ConditionalCompressor::new(Zlib::default(), Some(64)));
    let _ = bypass.decode(data);

    let comment = CommentPrefixVersion::new(
        1,
        Versions::new()
            .with(0, codec())
            .with(
                1,
                CoderChain::new(codec())
                    .then(ConditionalCompressor::new(Zlib::default(), Some(64))),
            ),
    );
    if let Ok(comment) = comment {
        let _ = comment.decode(data);
    }

    let _ = FlatCacheEntryCoder::new(codec()).decode(data);
    let _ = Packed::new(CacheEntryCoder, codec()).decode(data);
});
