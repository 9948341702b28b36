use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use stashpack::{
    CacheEntry, CodecFactory, CodecOptions, Coder, ConditionalCompressor, FlatCacheEntryCoder,
    MessagePackCodec, StringBypassVersion, TypeKind, Value, Versions, Zlib,
};

fn codec() -> MessagePackCodec {
    CodecFactory::build(&[TypeKind::Symbol], CodecOptions::default()).unwrap()
}

/// Строки идут мимо MessagePack; сравниваем с обычным кодеком.
fn bench_string_bypass(c: &mut Criterion) {
    let bypass = StringBypassVersion::new(0, Versions::new().with(0, codec()))
        .unwrap()
        .with_string_coder(ConditionalCompressor::new(Zlib::default(), Some(1024)));
    let plain = codec();

    let mut group = c.benchmark_group("string_bypass");
    for size in [16usize, 1024, 64 * 1024] {
        let value = Value::from("x".repeat(size));
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("bypass", size), &value, |b, v| {
            b.iter(|| black_box(bypass.encode(black_box(v)).unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("msgpack", size), &value, |b, v| {
            b.iter(|| black_box(plain.encode(black_box(v)).unwrap()))
        });
    }
    group.finish();
}

fn bench_flat_entry_metadata(c: &mut Criterion) {
    let coder = FlatCacheEntryCoder::new(codec());
    let entry = CacheEntry::new(Value::Array(vec![Value::from("payload"); 4096]))
        .expires_at(1_800_000_000.0)
        .version("v1");
    let bytes = coder.encode(&entry).unwrap();

    let mut group = c.benchmark_group("flat_cache_entry");
    group.bench_function("metadata_only", |b| {
        b.iter(|| black_box(FlatCacheEntryCoder::<MessagePackCodec>::metadata(black_box(&bytes)).unwrap()))
    });
    group.bench_function("full_decode", |b| {
        b.iter(|| black_box(coder.decode(black_box(&bytes)).unwrap()))
    });
    group.finish();
}

criterion_group!(benches, bench_string_bypass, bench_flat_entry_metadata);
criterion_main!(benches);
