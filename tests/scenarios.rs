use approx::{assert_abs_diff_eq, assert_relative_eq};
use fehlberg::lanes::{self, F64x4};
use fehlberg::ode::{naive, vectorized, AdaptiveSettings, OdeError};
use fehlberg::Sample;

const Y0: [f64; 4] = [1.0, 100.0, 51.0, 35.0];

fn decay_settings() -> AdaptiveSettings {
    AdaptiveSettings {
        h0: 1e-5,
        h_max: 1e-2,
        epsilon: vec![1e-7],
        t_out: (1..10).map(f64::from).collect(),
        ..AdaptiveSettings::default()
    }
}

fn assert_monotonic(samples: &[Sample], t0: f64, t_end: f64) {
    assert_eq!(samples.first().map(|s| s.0), Some(t0));
    assert_eq!(samples.last().map(|s| s.0), Some(t_end));
    for pair in samples.windows(2) {
        assert!(pair[1].0 > pair[0].0, "{} !< {}", pair[0].0, pair[1].0);
    }
}

// ── Exponential decay: f(t, y) = -0.5·y ─────────────────────────────

#[test]
fn exponential_decay_naive() {
    let samples: Vec<Sample> = naive::rk45(
        |_t, y: &[f64]| naive::mul(y, -0.5).collect(),
        &Y0,
        0.0,
        10.0,
        &decay_settings(),
    )
    .unwrap()
    .collect::<Result<_, _>>()
    .unwrap();

    assert_monotonic(&samples, 0.0, 10.0);
    for k in 1..10 {
        assert!(samples.iter().any(|(t, _)| *t == f64::from(k)), "no sample at t={k}");
    }

    let (_, y_end) = samples.last().unwrap();
    for (y, y0) in y_end.iter().zip(Y0) {
        assert_relative_eq!(*y, y0 * (-5.0_f64).exp(), max_relative = 1e-6);
    }
}

#[test]
fn exponential_decay_vectorized() {
    let half = F64x4::splat(-0.5);
    let samples: Vec<Sample> = vectorized::rk45(
        |_t, y: &[F64x4]| lanes::mul(y, half).collect(),
        &Y0,
        0.0,
        10.0,
        &decay_settings(),
    )
    .unwrap()
    .collect::<Result<_, _>>()
    .unwrap();

    assert_monotonic(&samples, 0.0, 10.0);
    assert_eq!(samples.len(), 11);

    for (t, y) in &samples {
        for (yi, y0) in y.iter().zip(Y0) {
            assert_relative_eq!(*yi, y0 * (-0.5 * t).exp(), max_relative = 1e-6);
        }
    }
}

// ── Coupled masses: two masses between three springs ────────────────

fn coupled(_t: f64, y: &[f64]) -> Vec<f64> {
    // y = [x1, x2, v1, v2], unit masses and springs
    vec![y[2], y[3], -2.0 * y[0] + y[1], y[0] - 2.0 * y[1]]
}

fn coupled_lanes(_t: F64x4, y: &[F64x4]) -> Vec<F64x4> {
    let [x1, x2, v1, v2] = y[0].to_array();
    vec![F64x4::from_array([v1, v2, -2.0 * x1 + x2, x1 - 2.0 * x2])]
}

#[test]
fn coupled_masses_symmetric_mode() {
    // in-phase mode oscillates at ω = 1
    let settings = AdaptiveSettings {
        h_max: 0.05,
        epsilon: vec![1e-10],
        t_out: vec![1.0, 2.0, 3.0],
        ..AdaptiveSettings::default()
    };
    let y0 = [1.0, 1.0, 0.0, 0.0];

    let scalar: Vec<Sample> = naive::rk45(coupled, &y0, 0.0, 4.0, &settings)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    let packed: Vec<Sample> = vectorized::rk45(coupled_lanes, &y0, 0.0, 4.0, &settings)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(scalar.len(), 5);
    assert_eq!(packed.len(), 5);
    for ((t, ys), (tp, yp)) in scalar.iter().zip(&packed) {
        assert_eq!(t, tp);
        assert_abs_diff_eq!(ys[0], t.cos(), epsilon = 1e-7);
        assert_abs_diff_eq!(ys[1], t.cos(), epsilon = 1e-7);
        assert_abs_diff_eq!(ys[2], -t.sin(), epsilon = 1e-7);
        for (a, b) in ys.iter().zip(yp) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-9);
        }
    }
}

#[test]
fn per_component_tolerance() {
    let settings = AdaptiveSettings {
        epsilon: vec![1e-9, 1e-6, 1e-6, 1e-6],
        ..decay_settings()
    };
    let mut stepper = naive::rk45(
        |_t, y: &[f64]| naive::mul(y, -0.5).collect(),
        &Y0,
        0.0,
        10.0,
        &settings,
    )
    .unwrap();
    let (t, y) = stepper.by_ref().last().unwrap().unwrap();
    assert_eq!(t, 10.0);
    assert_relative_eq!(y[0], (-5.0_f64).exp(), max_relative = 1e-7);
    assert_eq!(stepper.stats().evals, 6 * (stepper.stats().accepted + stepper.stats().rejected));
}

// ── Argument contract ───────────────────────────────────────────────

#[test]
fn dimension_mismatch_is_an_argument_error() {
    let settings = AdaptiveSettings {
        epsilon: vec![1e-7, 1e-7],
        ..decay_settings()
    };
    let result = vectorized::rk45(
        |_t, _y: &[F64x4]| -> Vec<F64x4> { panic!("derivative must not be evaluated") },
        &Y0,
        0.0,
        10.0,
        &settings,
    );
    let err = result.err().unwrap();
    assert_eq!(err, OdeError::ToleranceLength { expected: 4, found: 2 });
    assert!(err.is_argument_error());
    assert_eq!(err.to_string(), "tolerance must have 1 or 4 entries, found 2");
}

#[test]
fn validation_can_be_disabled() {
    let settings = AdaptiveSettings {
        strict_validation: false,
        epsilon: vec![1e-7, 1e-7],
        t_out: vec![],
        ..decay_settings()
    };
    // relaxed mode compares only the tolerances that are given
    let last = naive::rk45(
        |_t, y: &[f64]| naive::mul(y, -0.5).collect(),
        &Y0,
        0.0,
        1.0,
        &settings,
    )
    .unwrap()
    .last()
    .unwrap()
    .unwrap();
    assert_eq!(last.0, 1.0);
}

// ── Lane layer through the public API ───────────────────────────────

#[test]
fn lane_round_trip_and_reductions() {
    let x: Vec<f64> = (0..7).map(|i| f64::from(i) - 3.5).collect();
    let packed: Vec<F64x4> = lanes::load(&x, 0.0).collect();
    let flat: Vec<f64> = lanes::unpack(&packed).collect();
    assert_eq!(flat.len(), 8);
    assert_eq!(&flat[..7], &x[..]);
    assert_eq!(flat[7], 0.0);

    let mags: Vec<F64x4> = packed.iter().map(|&v| lanes::abs(v)).collect();
    assert_eq!(lanes::max(&mags), Some(3.5));
    assert_eq!(lanes::min(&packed), Some(-3.5));

    let tol = F64x4::splat(3.5);
    assert!(lanes::all(mags.iter().map(|m| m.le(tol))));
    assert!(!lanes::all(mags.iter().map(|m| m.le(F64x4::splat(3.0)))));
}
