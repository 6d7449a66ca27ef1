use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use delta16::{EncodeOptions, decode, encode_with_options};

fn gen_data(size: usize, seed: u64) -> Vec<u8> {
    let mut s = seed;
    let mut out = Vec::with_capacity(size);
    for _ in 0..size {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        out.push((s >> 33) as u8);
    }
    out
}

/// Rotate the image by a quarter and nudge every 97th byte.
fn mutate(base: &[u8]) -> Vec<u8> {
    let pivot = base.len() / 4;
    let mut out = base[pivot..].to_vec();
    out.extend_from_slice(&base[..pivot]);
    for i in (0..out.len()).step_by(97) {
        out[i] = out[i].wrapping_add(1);
    }
    out
}

fn encode_delta(source: &[u8], target: &[u8]) -> Vec<u8> {
    encode_with_options(source, 0x8000, target, &EncodeOptions::default()).unwrap()
}

fn bench_encode(c: &mut Criterion) {
    let source = gen_data(8192, 123);
    let target = mutate(&source);

    let mut group = c.benchmark_group("encode");
    group.throughput(Throughput::Bytes(target.len() as u64));
    group.bench_function("rom_8k", |b| {
        b.iter(|| encode_delta(black_box(&source), black_box(&target)))
    });
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let source = gen_data(8192, 123);
    let target = mutate(&source);
    let delta = encode_delta(&source, &target);

    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Bytes(target.len() as u64));
    group.bench_function("rom_8k", |b| {
        b.iter(|| decode(black_box(&source), 0x8000, black_box(&delta)).unwrap())
    });
    group.finish();
}

fn bench_fletcher(c: &mut Criterion) {
    let data = gen_data(65535, 7);
    let mut group = c.benchmark_group("fletcher16");
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_function("64k", |b| {
        b.iter(|| delta16::bytes::fletcher16(black_box(&data)))
    });
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_fletcher);
criterion_main!(benches);
