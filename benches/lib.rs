use criterion::{criterion_group, criterion_main};


criterion_group!(
    benches,
    prior::bench_prepare,
    prior::bench_prior_transform,
    compose::bench_compose_all,
);
criterion_main!(benches);
