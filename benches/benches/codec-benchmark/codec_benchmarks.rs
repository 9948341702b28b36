use std::hint::black_box;

use chrono::{TimeZone, Utc};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use stashpack::{CodecFactory, CodecOptions, Coder, TypeKind, Value};

// ============================================================================
// Тестовые данные
// ============================================================================

const KINDS: &[TypeKind] = &[
    TypeKind::Symbol,
    TypeKind::Time,
    TypeKind::Date,
    TypeKind::Decimal,
];

fn create_record(rng: &mut SmallRng) -> Value {
    let time = Utc
        .timestamp_opt(rng.gen_range(0..2_000_000_000), rng.gen_range(0..1_000_000_000))
        .unwrap()
        .fixed_offset();
    Value::Map(vec![
        (Value::Symbol("id".into()), Value::Int(rng.gen())),
        (
            Value::Symbol("name".into()),
            Value::from(format!("user_{}", rng.gen::<u32>())),
        ),
        (Value::Symbol("created_at".into()), Value::Time(time)),
        (
            Value::Symbol("tags".into()),
            Value::Array(
                (0..4)
                    .map(|i| Value::Symbol(format!("tag_{i}")))
                    .collect(),
            ),
        ),
    ])
}

fn create_batch(size: usize) -> Value {
    let mut rng = SmallRng::seed_from_u64(42);
    Value::Array((0..size).map(|_| create_record(&mut rng)).collect())
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_plain_vs_pooled(c: &mut Criterion) {
    let plain = CodecFactory::build(KINDS, CodecOptions::default()).unwrap();
    let pooled = CodecFactory::build_pooled(KINDS, CodecOptions::default(), 4).unwrap();

    let mut group = c.benchmark_group("encode");
    for size in [1usize, 16, 256] {
        let value = create_batch(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("plain", size), &value, |b, v| {
            b.iter(|| black_box(plain.encode(black_box(v)).unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("pooled", size), &value, |b, v| {
            b.iter(|| black_box(pooled.encode(black_box(v)).unwrap()))
        });
    }
    group.finish();

    let mut group = c.benchmark_group("decode");
    for size in [1usize, 16, 256] {
        let bytes = plain.encode(&create_batch(size)).unwrap();
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::new("plain", size), &bytes, |b, bytes| {
            b.iter(|| black_box(plain.decode(black_box(bytes)).unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("pooled", size), &bytes, |b, bytes| {
            b.iter(|| black_box(pooled.decode(black_box(bytes)).unwrap()))
        });
    }
    group.finish();
}

fn bench_format_versions(c: &mut Criterion) {
    let value = create_batch(64);
    let mut group = c.benchmark_group("format_version");
    for version in [0u8, 1] {
        let codec =
            CodecFactory::build(KINDS, CodecOptions::default().format_version(version)).unwrap();
        group.bench_with_input(BenchmarkId::new("roundtrip", version), &value, |b, v| {
            b.iter(|| {
                let bytes = codec.encode(black_box(v)).unwrap();
                black_box(codec.decode(&bytes).unwrap())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_plain_vs_pooled, bench_format_versions);
criterion_main!(benches);
