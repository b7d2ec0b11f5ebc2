use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use factorad::{record, Complex64, Matrix, Scalar};

fn skew_lu<T: Scalar>(a: &Matrix<T::Field>, x: &[T], n: usize) -> T {
    let l = Matrix::new(n, n, x[..n * n].to_vec());
    let u = Matrix::new(n, n, x[n * n..].to_vec());
    Matrix::lift(a).sub(&l.matmul(&u.transpose())).squared().mean()
}

/// Recording cost vs replaying a recorded tape.
fn bench_record_vs_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("skew_lu_gradient");
    for n in [2, 4, 8] {
        let a = Matrix::from_fn(n, n, |i, j| Complex64::new(i as f64 - j as f64, 0.5));
        let x: Vec<Complex64> = (0..2 * n * n)
            .map(|k| Complex64::new(0.01 * k as f64, -0.02 * k as f64))
            .collect();

        group.bench_with_input(BenchmarkId::new("record", n), &x, |b, x| {
            b.iter(|| black_box(record(|v| skew_lu(&a, v, n), black_box(x))))
        });

        let (mut tape, _) = record(|v| skew_lu(&a, v, n), &x);
        let mut buf = Vec::new();
        group.bench_with_input(BenchmarkId::new("replay", n), &x, |b, x| {
            b.iter(|| black_box(tape.gradient_with_buf(black_box(x), &mut buf)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_record_vs_replay);
criterion_main!(benches);
