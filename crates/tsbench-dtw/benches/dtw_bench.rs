//! Criterion benchmarks for tsbench-dtw: plain, cutoff and envelope-bounded distance.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use tsbench_dtw::{BandConstraint, Dtw, SeriesEnvelope, TimeSeries};

fn make_sine_series(n: usize, offset: f64) -> TimeSeries {
    let values: Vec<f64> = (0..n).map(|i| (i as f64 * 0.1).sin() + offset).collect();
    TimeSeries::new(values).unwrap()
}

fn bench_distance(c: &mut Criterion) {
    let mut group = c.benchmark_group("dtw_distance");
    for len in [128usize, 512, 1024] {
        let a = make_sine_series(len, 0.0);
        let b = make_sine_series(len, 0.5);
        for (label, dtw) in [
            ("unconstrained", Dtw::unconstrained()),
            ("band_r10", Dtw::with_sakoe_chiba(10)),
        ] {
            group.bench_with_input(BenchmarkId::new(format!("len{len}"), label), &dtw, |bencher, dtw| {
                bencher.iter(|| dtw.distance(a.as_view(), b.as_view()));
            });
        }
    }
    group.finish();
}

fn bench_bounded(c: &mut Criterion) {
    let constraint = BandConstraint::SakoeChibaRadius(10);
    let dtw = Dtw::from_constraint(constraint);
    let query = make_sine_series(512, 0.0);
    let candidate = make_sine_series(512, 3.0);
    let env = SeriesEnvelope::compute(candidate.as_view(), constraint);

    c.bench_function("dtw_bounded_512_r10_pruned", |b| {
        b.iter(|| dtw.distance_bounded(query.as_view(), candidate.as_view(), &env, 1.0));
    });
}

criterion_group!(benches, bench_distance, bench_bounded);
criterion_main!(benches);
