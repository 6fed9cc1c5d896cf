use criterion::{black_box, criterion_group, criterion_main, Criterion};

use dartrie::Trie;

fn synthetic_keys(n: u64) -> Vec<Vec<u8>> {
    // Multiplicative hashing spreads the first bytes so that insertion
    // exercises the collision-resolution path.
    (0..n)
        .map(|i| format!("{:016x}", i.wrapping_mul(0x9e3779b97f4a7c15)).into_bytes())
        .collect()
}

fn bench_insert(c: &mut Criterion) {
    let keys = synthetic_keys(10_000);
    c.bench_function("insert_10k", |b| {
        b.iter(|| {
            let mut trie = Trie::new();
            for (i, key) in keys.iter().enumerate() {
                trie.insert(black_box(key), i as i32).unwrap();
            }
            trie
        })
    });
}

fn bench_get(c: &mut Criterion) {
    let keys = synthetic_keys(10_000);
    let mut trie = Trie::new();
    for (i, key) in keys.iter().enumerate() {
        trie.insert(key, i as i32).unwrap();
    }
    c.bench_function("get_10k", |b| {
        b.iter(|| {
            let mut sum = 0i64;
            for key in &keys {
                sum += i64::from(trie.get(black_box(key)).unwrap());
            }
            sum
        })
    });
}

fn bench_common_prefix_search(c: &mut Criterion) {
    let words: Vec<Vec<u8>> = ["a", "ab", "abc", "abcd", "abcde", "abcdef"]
        .iter()
        .map(|w| w.as_bytes().to_vec())
        .collect();
    let trie = Trie::from_keys(&words).unwrap();
    c.bench_function("common_prefix_search", |b| {
        b.iter(|| trie.common_prefix_search(black_box(b"abcdefgh")).count())
    });
}

fn bench_predictive_search(c: &mut Criterion) {
    let keys = synthetic_keys(10_000);
    let trie = Trie::from_keys(&keys).unwrap();
    c.bench_function("predictive_search", |b| {
        b.iter(|| trie.predictive_search(black_box(b"")).count())
    });
}

criterion_group!(
    benches,
    bench_insert,
    bench_get,
    bench_common_prefix_search,
    bench_predictive_search
);
criterion_main!(benches);
