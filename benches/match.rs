//! cargo bench --bench match
use std::hint::black_box;

use algex::{CompileLevel, Engine};
use criterion::{criterion_group, criterion_main, Criterion};

pub fn criterion_benchmark(c: &mut Criterion) {
    let pattern = "[a-z]+@[a-z]+\\.[a-z]{2,3}";
    let input = b"user@example.com";

    for level in [CompileLevel::O0, CompileLevel::O1, CompileLevel::O2, CompileLevel::O3] {
        let mut engine = Engine::builder(pattern).level(level).build().unwrap();
        c.bench_function(&format!("full_match_{level:?}"), |b| {
            b.iter(|| engine.full_match(black_box(input)))
        });
    }

    c.bench_function("full_match_cached_nfa_fallback", |b| {
        let mut engine = Engine::builder(pattern).state_limit(1).build().unwrap();
        b.iter(|| engine.full_match(black_box(input)))
    });

    c.bench_function("full_match_intersection", |b| {
        let mut engine = Engine::builder("[0-9]+&.*5.*").build().unwrap();
        b.iter(|| engine.full_match(black_box(b"12345")))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
