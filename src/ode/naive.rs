//! RK45 on plain `f64` state vectors.
//!
//! The stage recurrences are written with the lazy element-wise helpers
//! [`add`], [`mul`] and [`div`], which mirror the lane operations the
//! vectorized stepper uses.

use alloc::vec::Vec;
use core::borrow::Borrow;

use log::debug;
use num_traits::Float;

use super::control::{self, Attempt, Plan, Rk45Attempt, StepControl};
use super::{prepare_output_times, AdaptiveSettings, OdeError, Rk45Stats, Sample, RKF45, STAGES};

/// Element-wise `a[i] + b[i]`.
pub fn add<A, B>(a: A, b: B) -> impl Iterator<Item = f64>
where
    A: IntoIterator,
    A::Item: Borrow<f64>,
    B: IntoIterator,
    B::Item: Borrow<f64>,
{
    a.into_iter().zip(b).map(|(x, y)| *x.borrow() + *y.borrow())
}

/// Element-wise `a[i] * s`.
pub fn mul<A>(a: A, s: f64) -> impl Iterator<Item = f64>
where
    A: IntoIterator,
    A::Item: Borrow<f64>,
{
    a.into_iter().map(move |x| *x.borrow() * s)
}

/// Element-wise `a[i] / b[i]`.
pub fn div<A, B>(a: A, b: B) -> impl Iterator<Item = f64>
where
    A: IntoIterator,
    A::Item: Borrow<f64>,
    B: IntoIterator,
    B::Item: Borrow<f64>,
{
    a.into_iter().zip(b).map(|(x, y)| *x.borrow() / *y.borrow())
}

/// Lazy RK45 integration over scalar state vectors.
///
/// Created by [`rk45`]. Yields `Ok((t, y))` samples in strictly increasing
/// time; after an `Err` the iterator is exhausted.
pub struct NaiveRk45<F> {
    f: F,
    y: Vec<f64>,
    epsilon: Vec<f64>,
    control: StepControl,
}

/// Integrate `dy/dt = f(t, y)` from `t0` to `t_end` starting at `y0`.
///
/// Step sizes, tolerance and output times are taken from `settings`.
/// With [`AdaptiveSettings::strict_validation`] the argument contract is
/// checked here, before `f` is ever called.
///
/// ```
/// use fehlberg::ode::{naive, AdaptiveSettings};
///
/// let settings = AdaptiveSettings::default();
/// let mut samples = naive::rk45(|_t, y: &[f64]| vec![-y[0]], &[1.0], 0.0, 1.0, &settings).unwrap();
/// assert_eq!(samples.next().unwrap().unwrap(), (0.0, vec![1.0]));
/// let (t, y) = samples.last().unwrap().unwrap();
/// assert_eq!(t, 1.0);
/// assert!((y[0] - (-1.0_f64).exp()).abs() < 1e-8);
/// ```
pub fn rk45<F>(
    f: F,
    y0: &[f64],
    t0: f64,
    t_end: f64,
    settings: &AdaptiveSettings,
) -> Result<NaiveRk45<F>, OdeError>
where
    F: FnMut(f64, &[f64]) -> Vec<f64>,
{
    let t_out = prepare_output_times(y0.len(), t0, t_end, settings)?;
    debug!(
        "rk45 (naive): {} components over [{}, {}], {} output times",
        y0.len(),
        t0,
        t_end,
        t_out.len()
    );
    Ok(NaiveRk45 {
        f,
        y: y0.to_vec(),
        epsilon: settings.epsilon.clone(),
        control: StepControl::new(t0, t_end, t_out, settings),
    })
}

impl<F> NaiveRk45<F>
where
    F: FnMut(f64, &[f64]) -> Vec<f64>,
{
    /// Current time.
    pub fn t(&self) -> f64 {
        self.control.t
    }

    /// Step size the next attempt starts from (before clamping).
    pub fn h(&self) -> f64 {
        self.control.h
    }

    /// Current state.
    pub fn state(&self) -> &[f64] {
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

impl<F> Rk45Attempt for NaiveRk45<F>
where
    F: FnMut(f64, &[f64]) -> Vec<f64>,
{
    fn control(&mut self) -> &mut StepControl {
        &mut self.control
    }

    fn attempt(&mut self, plan: &Plan) -> Result<Attempt, OdeError> {
        let Plan { t, h, .. } = *plan;
        let tab = &RKF45;

        // k_i = h · f(t + c_i·h, y + Σ a_ij·k_j)
        let mut k: [Vec<f64>; STAGES] = Default::default();
        for s in 0..STAGES {
            let mut ys = self.y.clone();
            for (j, kj) in k.iter().enumerate().take(s) {
                let a_sj = tab.a[s][j];
                if a_sj != 0.0 {
                    ys = add(&ys, mul(kj, a_sj)).collect();
                }
            }
            k[s] = mul((self.f)(t + tab.c[s] * h, &ys), h).collect();
        }

        // Per-component |y5 - y4|
        let mut te = alloc::vec![0.0; self.y.len()];
        for (kj, &e) in k.iter().zip(tab.berr.iter()) {
            if e != 0.0 {
                te = add(&te, mul(kj, e)).collect();
            }
        }
        for v in te.iter_mut() {
            *v = Float::abs(*v);
        }
        if !te.iter().all(|v| v.is_finite()) {
            return Err(OdeError::StepNotFinite);
        }

        if self.epsilon.len() == 1 {
            let worst = te.iter().copied().fold(0.0, f64::max);
            te.clear();
            te.push(worst);
        }

        let accepted = te.iter().zip(&self.epsilon).all(|(err, eps)| err <= eps);
        let ratio = div(&self.epsilon, &te).fold(f64::INFINITY, f64::min);

        if accepted {
            for (kj, &b) in k.iter().zip(tab.b5.iter()) {
                if b != 0.0 {
                    self.y = add(&self.y, mul(kj, b)).collect();
                }
            }
        }

        Ok(Attempt { accepted, ratio })
    }

    fn snapshot(&self) -> Vec<f64> {
        self.y.clone()
    }
}

impl<F> Iterator for NaiveRk45<F>
where
    F: FnMut(f64, &[f64]) -> Vec<f64>,
{
    type Item = Result<Sample, OdeError>;

    fn next(&mut self) -> Option<Self::Item> {
        control::next_sample(self)
    }
}

impl<F> core::iter::FusedIterator for NaiveRk45<F> where F: FnMut(f64, &[f64]) -> Vec<f64> {}
