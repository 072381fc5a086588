use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use inference_engine::{ForestParams, RandomForest};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_data(rows: usize) -> (Array2<f64>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(0x1C0 + rows as u64);
    let x = Array2::from_shape_fn((rows, 14), |_| rng.gen_range(-2.0..2.0));
    let labels = x
        .outer_iter()
        .map(|row| usize::from(row[0] + 0.5 * row[10] > 0.3))
        .collect();
    (x, labels)
}

fn benchmark_forest(c: &mut Criterion) {
    let params = ForestParams {
        n_estimators: 20,
        ..Default::default()
    };

    let mut group = c.benchmark_group("random_forest");
    for rows in [500_usize, 2000] {
        let (x, labels) = random_data(rows);
        group.throughput(Throughput::Elements(rows as u64));

        group.bench_with_input(BenchmarkId::new("fit", rows), &(&x, &labels), |b, (x, y)| {
            b.iter(|| {
                let forest = RandomForest::fit(black_box(x.view()), y, params, 42).unwrap();
                black_box(forest);
            });
        });

        let forest = RandomForest::fit(x.view(), &labels, params, 42).unwrap();
        group.bench_with_input(BenchmarkId::new("predict_batch", rows), &x, |b, x| {
            b.iter(|| {
                let predictions = forest.predict_batch(black_box(x.view())).unwrap();
                black_box(predictions);
            });
        });
    }
    group.finish();
}

criterion_group!(forest, benchmark_forest);
criterion_main!(forest);
