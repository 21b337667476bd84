use criterion::{criterion_group, criterion_main, Criterion};
use fehlberg::lanes::{self, F64x4};
use fehlberg::ode::{naive, vectorized, AdaptiveSettings};
use fehlberg::Sample;

// ---------------------------------------------------------------------------
// Exponential decay f(t, y) = -0.5·y over [0, 10], output at every integer time
// ---------------------------------------------------------------------------

fn settings() -> AdaptiveSettings {
    AdaptiveSettings {
        h0: 1e-5,
        h_max: 1e-2,
        epsilon: vec![1e-7],
        t_out: (1..10).map(f64::from).collect(),
        ..AdaptiveSettings::default()
    }
}

fn initial_state(n: usize) -> Vec<f64> {
    [1.0, 100.0, 51.0, 35.0].iter().copied().cycle().take(n).collect()
}

fn solve_naive(y0: &[f64], settings: &AdaptiveSettings) -> Vec<Sample> {
    naive::rk45(|_t, y: &[f64]| naive::mul(y, -0.5).collect(), y0, 0.0, 10.0, settings)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap()
}

fn solve_vectorized(y0: &[f64], settings: &AdaptiveSettings) -> Vec<Sample> {
    let half = F64x4::splat(-0.5);
    vectorized::rk45(|_t, y: &[F64x4]| lanes::mul(y, half).collect(), y0, 0.0, 10.0, settings)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap()
}

fn exponential_decay(c: &mut Criterion) {
    let settings = settings();

    for n in [4, 64] {
        let y0 = initial_state(n);
        let mut g = c.benchmark_group(format!("exponential_decay_{n}"));

        g.bench_function("naive", |b| {
            b.iter(|| solve_naive(std::hint::black_box(&y0), &settings))
        });

        g.bench_function("vectorized", |b| {
            b.iter(|| solve_vectorized(std::hint::black_box(&y0), &settings))
        });

        g.finish();
    }
}

criterion_group!(benches, exponential_decay);
criterion_main!(benches);
