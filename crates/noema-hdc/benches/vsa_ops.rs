use criterion::{black_box, criterion_group, criterion_main, Criterion};
use noema_core::HdcStrategy;
use noema_hdc::{Vector, VectorSpace};

fn bench_dense_ops(c: &mut Criterion) {
    let space = VectorSpace::new(HdcStrategy::DenseBinary);
    let a = space.atom("subject");
    let b = space.atom("object");
    let members: Vec<Vector> = (0..16)
        .map(|i| space.atom(&format!("atom{i}")))
        .collect();
    let refs: Vec<&Vector> = members.iter().collect();

    c.bench_function("dense_bind", |bench| {
        bench.iter(|| space.bind(black_box(&a), black_box(&b)).unwrap())
    });
    c.bench_function("dense_similarity", |bench| {
        bench.iter(|| space.similarity(black_box(&a), black_box(&b)))
    });
    c.bench_function("dense_bundle_16", |bench| {
        bench.iter(|| space.bundle(black_box(&refs)).unwrap())
    });
}

fn bench_sparse_ops(c: &mut Criterion) {
    let space = VectorSpace::new(HdcStrategy::SparsePolynomial);
    let a = space.atom("subject");
    let b = space.atom("object");

    c.bench_function("sparse_bind", |bench| {
        bench.iter(|| space.bind(black_box(&a), black_box(&b)).unwrap())
    });
    c.bench_function("sparse_similarity", |bench| {
        bench.iter(|| space.similarity(black_box(&a), black_box(&b)))
    });
}

criterion_group!(benches, bench_dense_ops, bench_sparse_ops);
criterion_main!(benches);
