//! Adaptive Runge-Kutta-Fehlberg 4(5) integration.
//!
//! Two steppers share one step-size controller and one [`Tableau`]:
//!
//! | Stepper                    | State storage        | Derivative signature                         |
//! |----------------------------|----------------------|----------------------------------------------|
//! | [`naive::rk45`]            | `Vec<f64>`           | `FnMut(f64, &[f64]) -> Vec<f64>`             |
//! | [`vectorized::rk45`]       | `Vec<F64x4>` lanes   | `FnMut(F64x4, &[F64x4]) -> Vec<F64x4>`       |
//!
//! Both return a lazy iterator of `(t, y)` [`Sample`]s: the initial state at
//! `t0`, one sample per requested output time (when
//! [`AdaptiveSettings::dense_output`] is set), and the final state at `t_end`.
//! Nothing is computed until the iterator is pulled, and dropping it stops
//! the integration.
//!
//! # Step-size control
//!
//! Each attempt computes the absolute difference between the 5th- and
//! 4th-order solutions. With a single tolerance the largest component is
//! compared against it; with one tolerance per component every component is
//! compared against its own. The step is accepted iff every comparison holds.
//! Accepted or not, the next step size is
//!
//! ```text
//! h ← h · min(max_factor, 0.9 · (min ε / err)^(1/5))
//! ```
//!
//! then clamped to `h_max`, to the remaining span, and (with dense output) to
//! the next output time.
//!
//! # Example
//!
//! ```
//! use fehlberg::ode::{naive, AdaptiveSettings};
//!
//! // dy/dt = -0.5·y
//! let settings = AdaptiveSettings {
//!     t_out: vec![1.0, 2.0, 3.0],
//!     ..AdaptiveSettings::default()
//! };
//! let samples = naive::rk45(
//!     |_t, y: &[f64]| y.iter().map(|v| -0.5 * v).collect(),
//!     &[1.0, 100.0],
//!     0.0,
//!     4.0,
//!     &settings,
//! )
//! .unwrap()
//! .collect::<Result<Vec<_>, _>>()
//! .unwrap();
//!
//! let times: Vec<f64> = samples.iter().map(|(t, _)| *t).collect();
//! assert_eq!(times, [0.0, 1.0, 2.0, 3.0, 4.0]);
//! let (_, y_end) = samples.last().unwrap();
//! assert!((y_end[0] - (-2.0_f64).exp()).abs() < 1e-6);
//! ```

mod control;
pub mod naive;
pub mod tableau;
pub mod vectorized;


use alloc::vec::Vec;
use core::fmt;

pub use naive::NaiveRk45;
pub use tableau::{Tableau, RKF45, STAGES};
pub use vectorized::LaneRk45;

/// One point of a trajectory: `(t, y)`.
pub type Sample = (f64, Vec<f64>);

/// Errors from RK45 integration.
///
/// Argument-contract violations are returned by the stepper constructors
/// before any derivative evaluation (only with
/// [`AdaptiveSettings::strict_validation`]). The remaining variants are
/// yielded by the iterator, which then ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OdeError {
    /// The initial state has no components.
    EmptyState,
    /// `t_end` is not strictly greater than `t0`.
    InvalidTimeSpan,
    /// An output time lies outside the open interval `(t0, t_end)`.
    OutputTimeOutOfRange,
    /// The tolerance has neither one entry nor one per state component.
    ToleranceLength { expected: usize, found: usize },
    /// A tolerance entry is zero, negative or NaN.
    NonPositiveTolerance,
    /// The initial or maximum step size is zero, negative or NaN.
    InvalidStepSize,
    /// The error estimate became NaN or infinite.
    StepNotFinite,
    /// The step size is too small to advance `t`.
    StepSizeCollapsed,
    /// Exceeded [`AdaptiveSettings::max_steps`] step attempts.
    MaxStepsExceeded,
}

impl OdeError {
    /// True for argument-contract violations, false for failures that occur
    /// while integrating.
    pub fn is_argument_error(&self) -> bool {
        !matches!(
            self,
            Self::StepNotFinite | Self::StepSizeCollapsed | Self::MaxStepsExceeded
        )
    }
}

impl fmt::Display for OdeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyState => write!(f, "initial state must contain at least one component"),
            Self::InvalidTimeSpan => write!(f, "end time must be larger than start time"),
            Self::OutputTimeOutOfRange => write!(f, "output times must lie in (t0, t_end)"),
            Self::ToleranceLength { expected, found } => write!(
                f,
                "tolerance must have 1 or {expected} entries, found {found}"
            ),
            Self::NonPositiveTolerance => write!(f, "tolerance entries must be positive"),
            Self::InvalidStepSize => write!(f, "initial and maximum step size must be positive"),
            Self::StepNotFinite => write!(f, "step error is not finite"),
            Self::StepSizeCollapsed => write!(f, "step size too small to advance time"),
            Self::MaxStepsExceeded => write!(f, "maximum number of steps exceeded"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for OdeError {}

/// Counters accumulated while integrating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rk45Stats {
    /// Total derivative evaluations.
    pub evals: usize,
    /// Accepted steps.
    pub accepted: usize,
    /// Rejected steps.
    pub rejected: usize,
}

/// Settings for one RK45 integration run.
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptiveSettings {
    /// Initial step size (default: 1e-5).
    pub h0: f64,
    /// Upper bound on the step size (default: 1e-2).
    pub h_max: f64,
    /// Absolute error tolerance: one entry applied to the worst component,
    /// or one entry per component (default: `[1e-7]`).
    pub epsilon: Vec<f64>,
    /// Intermediate output times, strictly inside `(t0, t_end)`
    /// (default: none).
    pub t_out: Vec<f64>,
    /// Check the argument contract before integrating; also sorts
    /// `t_out` (default: true).
    pub strict_validation: bool,
    /// Clamp steps to land exactly on each output time and emit a sample
    /// there (default: true).
    pub dense_output: bool,
    /// Upper bound on the step-size growth factor per step, reached when the
    /// error estimate vanishes (default: 10.0).
    pub max_factor: f64,
    /// Maximum number of step attempts before yielding
    /// [`OdeError::MaxStepsExceeded`] (default: unbounded).
    pub max_steps: Option<usize>,
}

impl Default for AdaptiveSettings {
    fn default() -> Self {
        Self {
            h0: 1e-5,
            h_max: 1e-2,
            epsilon: alloc::vec![1e-7],
            t_out: Vec::new(),
            strict_validation: true,
            dense_output: true,
            max_factor: 10.0,
            max_steps: None,
        }
    }
}

/// Check the argument contract and return the output times in the order
/// they are to be visited.
fn prepare_output_times(
    n: usize,
    t0: f64,
    t_end: f64,
    settings: &AdaptiveSettings,
) -> Result<Vec<f64>, OdeError> {
    let mut t_out = settings.t_out.clone();
    if !settings.strict_validation {
        return Ok(t_out);
    }

    if n < 1 {
        return Err(OdeError::EmptyState);
    }
    if !(t_end > t0) {
        return Err(OdeError::InvalidTimeSpan);
    }

    t_out.sort_by(|a, b| a.partial_cmp(b).unwrap_or(core::cmp::Ordering::Equal));
    if t_out.iter().any(|&t| !(t > t0 && t < t_end)) {
        return Err(OdeError::OutputTimeOutOfRange);
    }

    let found = settings.epsilon.len();
    if found != 1 && found != n {
        return Err(OdeError::ToleranceLength { expected: n, found });
    }
    if settings.epsilon.iter().any(|&e| !(e > 0.0)) {
        return Err(OdeError::NonPositiveTolerance);
    }
    if !(settings.h0 > 0.0) || !(settings.h_max > 0.0) {
        return Err(OdeError::InvalidStepSize);
    }

    Ok(t_out)
}
