use alloc::vec::Vec;

use log::{debug, trace};
use num_traits::Float;

use super::{AdaptiveSettings, OdeError, Rk45Stats, Sample, STAGES};

/// Safety factor of the step-size controller.
const SAFETY: f64 = 0.9;
/// `1 / (p + 1)` for the 4th-order error estimate of the embedded pair.
const EXPONENT: f64 = 1.0 / 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Start,
    Stepping,
    Done,
}

/// A step about to be attempted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Plan {
    /// Start of the step.
    pub t: f64,
    /// Step length after clamping.
    pub h: f64,
    /// Time `t` takes if the step is accepted.
    pub target: f64,
    /// The step lands on a requested output time.
    pub output: bool,
}

/// Result of error estimation for one attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Attempt {
    pub accepted: bool,
    /// `min(ε / err)` over the compared components.
    pub ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StepOutcome {
    Accepted { output: bool },
    Rejected,
}

/// Time, step size and output bookkeeping shared by both steppers.
#[derive(Debug, Clone)]
pub(crate) struct StepControl {
    pub t: f64,
    pub h: f64,
    t_end: f64,
    h_max: f64,
    t_out: Vec<f64>,
    next_out: usize,
    dense_output: bool,
    max_factor: f64,
    max_steps: Option<usize>,
    pub stats: Rk45Stats,
    phase: Phase,
}

impl StepControl {
    pub fn new(t0: f64, t_end: f64, t_out: Vec<f64>, settings: &AdaptiveSettings) -> Self {
        Self {
            t: t0,
            h: settings.h0,
            t_end,
            h_max: settings.h_max,
            t_out,
            next_out: 0,
            dense_output: settings.dense_output,
            max_factor: settings.max_factor,
            max_steps: settings.max_steps,
            stats: Rk45Stats::default(),
            phase: Phase::Start,
        }
    }

    /// Clamp the step size for the next attempt.
    pub fn plan(&mut self) -> Result<Plan, OdeError> {
        if let Some(max) = self.max_steps {
            if self.stats.accepted + self.stats.rejected >= max {
                return Err(OdeError::MaxStepsExceeded);
            }
        }

        // Landing points decide the clamps: `t + h` can round onto (or past)
        // a boundary even when `h` is below the rounded distance to it.
        let mut h = self.h.min(self.h_max);
        let mut target = self.t + h;
        if target >= self.t_end {
            h = self.t_end - self.t;
            target = self.t_end;
        }

        let mut output = false;
        if self.dense_output {
            // Skip duplicates and times already passed
            while self.next_out < self.t_out.len() && self.t_out[self.next_out] <= self.t {
                self.next_out += 1;
            }
            if let Some(&t_next) = self.t_out.get(self.next_out) {
                if t_next < self.t_end && target >= t_next {
                    h = t_next - self.t;
                    target = t_next;
                    output = true;
                }
            }
        }

        if !(h > 0.0) || self.t + h == self.t {
            return Err(OdeError::StepSizeCollapsed);
        }

        self.h = h;
        Ok(Plan { t: self.t, h, target, output })
    }

    /// Record the outcome of an attempt and adapt the step size.
    pub fn finish(&mut self, plan: &Plan, attempt: Attempt) -> StepOutcome {
        self.stats.evals += STAGES;

        let outcome = if attempt.accepted {
            self.t = plan.target;
            self.stats.accepted += 1;
            if plan.output {
                self.next_out += 1;
            }
            StepOutcome::Accepted { output: plan.output }
        } else {
            trace!(
                "rk45: rejected step at t={} h={:e} (ratio {:e})",
                plan.t, plan.h, attempt.ratio
            );
            self.stats.rejected += 1;
            StepOutcome::Rejected
        };

        self.h = plan.h * self.growth(attempt.ratio);
        outcome
    }

    /// `0.9 · ratio^(1/5)`, capped at `max_factor`. A vanishing error
    /// estimate gives an infinite ratio and therefore the cap.
    fn growth(&self, ratio: f64) -> f64 {
        let factor = SAFETY * Float::powf(ratio, EXPONENT);
        if factor <= self.max_factor {
            factor
        } else {
            self.max_factor
        }
    }

    pub fn is_done(&self) -> bool {
        self.phase == Phase::Done
    }
}

/// One RK45 variant: derivative evaluation and state update for a single
/// attempt, on whatever storage the variant uses.
pub(crate) trait Rk45Attempt {
    fn control(&mut self) -> &mut StepControl;

    /// Evaluate the six stages for `(plan.t, plan.h)`, estimate the error and,
    /// if the step is accepted, advance the state. Time is left to the
    /// controller.
    fn attempt(&mut self, plan: &Plan) -> Result<Attempt, OdeError>;

    /// Current state with its logical dimension.
    fn snapshot(&self) -> Vec<f64>;
}

/// Plan, attempt and record a single step.
pub(crate) fn step_once<S: Rk45Attempt>(stepper: &mut S) -> Result<StepOutcome, OdeError> {
    let plan = stepper.control().plan()?;
    let attempt = stepper.attempt(&plan)?;
    Ok(stepper.control().finish(&plan, attempt))
}

/// Advance the integration until the next sample is ready.
pub(crate) fn next_sample<S: Rk45Attempt>(stepper: &mut S) -> Option<Result<Sample, OdeError>> {
    let control = stepper.control();
    match control.phase {
        Phase::Done => return None,
        Phase::Start => {
            control.phase = Phase::Stepping;
            let t = control.t;
            return Some(Ok((t, stepper.snapshot())));
        }
        Phase::Stepping => {}
    }

    loop {
        let control = stepper.control();
        if control.t >= control.t_end {
            control.phase = Phase::Done;
            debug!("rk45: reached t_end={} ({:?})", control.t_end, control.stats);
            let t = control.t_end;
            return Some(Ok((t, stepper.snapshot())));
        }

        match step_once(stepper) {
            Ok(StepOutcome::Accepted { output: true }) => {
                let t = stepper.control().t;
                return Some(Ok((t, stepper.snapshot())));
            }
            Ok(_) => {}
            Err(e) => {
                let control = stepper.control();
                control.phase = Phase::Done;
                debug!("rk45: stopped at t={}: {} ({:?})", control.t, e, control.stats);
                return Some(Err(e));
            }
        }
    }
}
