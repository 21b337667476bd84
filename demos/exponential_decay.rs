// Exponential decay dy/dt = -0.5·y solved with either stepper.
// Prints a tab-separated table with one row per sample:
//   t   y0   y1   y2   y3
// Pass `--simd` to use the vectorized stepper. Set RUST_LOG=debug to see
// integration statistics on stderr.

use fehlberg::lanes::{self, F64x4};
use fehlberg::ode::{naive, vectorized, AdaptiveSettings};
use fehlberg::{OdeError, Sample};

fn main() -> Result<(), OdeError> {
    env_logger::init();

    let simd = std::env::args().nth(1).as_deref() == Some("--simd");
    let y0 = [1.0, 100.0, 51.0, 35.0];
    let settings = AdaptiveSettings {
        h0: 1e-5,
        h_max: 1e-2,
        epsilon: vec![1e-7],
        t_out: (1..10).map(f64::from).collect(),
        ..AdaptiveSettings::default()
    };

    let samples: Vec<Sample> = if simd {
        let half = F64x4::splat(-0.5);
        vectorized::rk45(|_t, y: &[F64x4]| lanes::mul(y, half).collect(), &y0, 0.0, 10.0, &settings)?
            .collect::<Result<_, _>>()?
    } else {
        naive::rk45(|_t, y: &[f64]| naive::mul(y, -0.5).collect(), &y0, 0.0, 10.0, &settings)?
            .collect::<Result<_, _>>()?
    };

    let header: Vec<String> = (0..y0.len()).map(|i| format!("y{i}")).collect();
    println!("t\t{}", header.join("\t"));
    for (t, y) in &samples {
        let row: Vec<String> = y.iter().map(|v| format!("{v}")).collect();
        println!("{t}\t{}", row.join("\t"));
    }
    Ok(())
}
