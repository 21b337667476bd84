//! RK45 on lane-packed state vectors.
//!
//! The state is packed into [`F64x4`] lanes once, at construction, and only
//! unpacked to emit samples. All stage arithmetic goes through
//! [`crate::lanes`], so every recurrence term is a single fused
//! multiply-add per lane. Slots of the last lane beyond the state dimension
//! are masked out of the error estimate: whatever the derivative function
//! writes there never affects step acceptance.

use alloc::vec::Vec;

use log::debug;

use super::control::{self, Attempt, Plan, Rk45Attempt, StepControl};
use super::{prepare_output_times, AdaptiveSettings, OdeError, Rk45Stats, Sample, RKF45, STAGES};
use crate::lanes::{self, F64x4};

const fn splat_row<const N: usize>(row: [f64; N]) -> [F64x4; N] {
    let mut out = [F64x4::ZERO; N];
    let mut i = 0;
    while i < N {
        out[i] = F64x4::splat(row[i]);
        i += 1;
    }
    out
}

const LANE_A: [[F64x4; STAGES - 1]; STAGES] = {
    let mut out = [[F64x4::ZERO; STAGES - 1]; STAGES];
    let mut i = 0;
    while i < STAGES {
        out[i] = splat_row(RKF45.a[i]);
        i += 1;
    }
    out
};
const LANE_B5: [F64x4; STAGES] = splat_row(RKF45.b5);
const LANE_BERR: [F64x4; STAGES] = splat_row(RKF45.berr);

/// Lazy RK45 integration over lane-packed state vectors.
///
/// Created by [`rk45`]. Samples are unpacked to the state dimension.
pub struct LaneRk45<F> {
    f: F,
    y: Vec<F64x4>,
    dim: usize,
    /// Tolerance lanes: one broadcast lane for a single tolerance, otherwise
    /// the per-component tolerances padded with `+inf`, so components without
    /// a tolerance entry are never compared.
    veps: Vec<F64x4>,
    single_tolerance: bool,
    tail: Option<F64x4>,
    control: StepControl,
}

/// Integrate `dy/dt = f(t, y)` from `t0` to `t_end` with lane-packed state.
///
/// `f` receives the time broadcast to every slot and the packed state,
/// and returns the packed derivative (same number of lanes). The padding
/// slots of the last lane start at zero.
///
/// ```
/// use fehlberg::lanes::{self, F64x4};
/// use fehlberg::ode::{vectorized, AdaptiveSettings};
///
/// let half = F64x4::splat(-0.5);
/// let settings = AdaptiveSettings::default();
/// let (t, y) = vectorized::rk45(
///     |_t, y: &[F64x4]| lanes::mul(y, half).collect(),
///     &[1.0, 100.0, 51.0, 35.0, 2.0],
///     0.0,
///     2.0,
///     &settings,
/// )
/// .unwrap()
/// .last()
/// .unwrap()
/// .unwrap();
/// assert_eq!(t, 2.0);
/// assert_eq!(y.len(), 5);
/// assert!((y[1] - 100.0 * (-1.0_f64).exp()).abs() < 1e-6);
/// ```
pub fn rk45<F>(
    f: F,
    y0: &[f64],
    t0: f64,
    t_end: f64,
    settings: &AdaptiveSettings,
) -> Result<LaneRk45<F>, OdeError>
where
    F: FnMut(F64x4, &[F64x4]) -> Vec<F64x4>,
{
    let t_out = prepare_output_times(y0.len(), t0, t_end, settings)?;

    let epsilon = &settings.epsilon;
    let eps0 = epsilon.first().copied().unwrap_or(f64::INFINITY);
    let single_tolerance = epsilon.len() <= 1;
    let veps = if single_tolerance {
        alloc::vec![F64x4::splat(eps0)]
    } else {
        lanes::load(epsilon, f64::INFINITY).collect()
    };

    let y: Vec<F64x4> = lanes::load(y0, 0.0).collect();
    debug!(
        "rk45 (vectorized): {} components in {} lanes over [{}, {}], {} output times",
        y0.len(),
        y.len(),
        t0,
        t_end,
        t_out.len()
    );

    Ok(LaneRk45 {
        f,
        y,
        dim: y0.len(),
        veps,
        single_tolerance,
        tail: lanes::tail_mask(y0.len()),
        control: StepControl::new(t0, t_end, t_out, settings),
    })
}

impl<F> LaneRk45<F>
where
    F: FnMut(F64x4, &[F64x4]) -> Vec<F64x4>,
{
    /// Current time.
    pub fn t(&self) -> f64 {
        self.control.t
    }

    /// Step size the next attempt starts from (before clamping).
    pub fn h(&self) -> f64 {
        self.control.h
    }

    /// Current packed state, including padding slots.
    pub fn lanes(&self) -> &[F64x4] {
        &self.y
    }

    pub fn stats(&self) -> Rk45Stats {
        self.control.stats
    }

    /// True once the final sample (or an error) has been yielded.
    pub fn is_finished(&self) -> bool {
        self.control.is_done()
    }
}

impl<F> Rk45Attempt for LaneRk45<F>
where
    F: FnMut(F64x4, &[F64x4]) -> Vec<F64x4>,
{
    fn control(&mut self) -> &mut StepControl {
        &mut self.control
    }

    fn attempt(&mut self, plan: &Plan) -> Result<Attempt, OdeError> {
        let Plan { t, h, .. } = *plan;
        let vh = F64x4::splat(h);

        let mut k: [Vec<F64x4>; STAGES] = Default::default();
        for s in 0..STAGES {
            let mut ys = self.y.clone();
            for (j, kj) in k.iter().enumerate().take(s) {
                if RKF45.a[s][j] != 0.0 {
                    ys = lanes::mul_add(kj, LANE_A[s][j], &ys).collect();
                }
            }
            let ts = F64x4::splat(t + RKF45.c[s] * h);
            k[s] = lanes::mul((self.f)(ts, &ys), vh).collect();
        }

        let mut te = alloc::vec![F64x4::ZERO; self.y.len()];
        for (j, kj) in k.iter().enumerate() {
            if RKF45.berr[j] != 0.0 {
                te = lanes::mul_add(kj, LANE_BERR[j], &te).collect();
            }
        }
        for v in te.iter_mut() {
            *v = lanes::abs(*v);
        }
        if let (Some(mask), Some(last)) = (self.tail, te.last_mut()) {
            *last = last.and(mask);
        }
        if !lanes::unpack(&te).all(f64::is_finite) {
            return Err(OdeError::StepNotFinite);
        }

        if self.single_tolerance {
            let worst = lanes::max(&te).unwrap_or(0.0);
            te.clear();
            te.push(F64x4::splat(worst));
        }

        let accepted = lanes::all(te.iter().zip(&self.veps).map(|(e, eps)| e.le(*eps)));
        let ratio = lanes::min(lanes::div(&self.veps, &te)).unwrap_or(f64::INFINITY);

        if accepted {
            for (j, kj) in k.iter().enumerate() {
                if RKF45.b5[j] != 0.0 {
                    self.y = lanes::mul_add(kj, LANE_B5[j], &self.y).collect();
                }
            }
        }

        Ok(Attempt { accepted, ratio })
    }

    fn snapshot(&self) -> Vec<f64> {
        lanes::unpack(&self.y).take(self.dim).collect()
    }
}

impl<F> Iterator for LaneRk45<F>
where
    F: FnMut(F64x4, &[F64x4]) -> Vec<F64x4>,
{
    type Item = Result<Sample, OdeError>;

    fn next(&mut self) -> Option<Self::Item> {
        control::next_sample(self)
    }
}

impl<F> core::iter::FusedIterator for LaneRk45<F> where F: FnMut(F64x4, &[F64x4]) -> Vec<F64x4> {}
