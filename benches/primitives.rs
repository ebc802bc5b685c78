use hashround::primitives::{Algorithm, RoundHasher};
use hashround::stream::generate;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;

pub fn bench_primitives(c: &mut Criterion) {
    let input = [0x5Au8; 64];
    let mut group = c.benchmark_group("hash 64 bytes");
    group.throughput(Throughput::Bytes(input.len() as u64));

    for algorithm in Algorithm::ALL {
        for rounds in [1, algorithm.full_rounds()] {
            let hasher = RoundHasher::new(algorithm, rounds).expect("rounds within bounds");
            group.bench_with_input(
                BenchmarkId::new(algorithm.name(), rounds),
                &hasher,
                |b, hasher| b.iter(|| hasher.hash(black_box(&input))),
            );
        }
    }
    group.finish();
}

pub fn bench_stream(c: &mut Criterion) {
    let hasher = RoundHasher::full(Algorithm::Keccak);
    let hash = |x: &[u8]| hasher.hash(x);

    let mut group = c.benchmark_group("generate");
    group.sample_size(20);
    for bits in [100_000usize, 1_000_000] {
        group.throughput(Throughput::Elements(bits as u64));
        group.bench_with_input(BenchmarkId::from_parameter(bits), &bits, |b, &bits| {
            b.iter(|| generate(&hash, black_box(bits)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_primitives, bench_stream);
criterion_main!(benches);
