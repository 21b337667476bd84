//! # fehlberg
//!
//! Embedded Runge-Kutta-Fehlberg 4(5) integration with adaptive step-size
//! control, in two flavors: a scalar stepper over `Vec<f64>` state, and a
//! vectorized stepper that keeps its state packed in 4-wide `f64` lanes.
//! `no_std` compatible (requires `alloc`).
//!
//! ## Quick start
//!
//! ```
//! use fehlberg::ode::{naive, AdaptiveSettings};
//!
//! // Harmonic oscillator: y'' = -y  →  [y, y'] with dy/dt = [y', -y]
//! let tau = 2.0 * core::f64::consts::PI;
//! let settings = AdaptiveSettings {
//!     h_max: 0.05,
//!     epsilon: vec![1e-10],
//!     ..AdaptiveSettings::default()
//! };
//! let (t, y) = naive::rk45(|_t, y: &[f64]| vec![y[1], -y[0]], &[1.0, 0.0], 0.0, tau, &settings)
//!     .unwrap()
//!     .last()
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(t, tau);
//! assert!((y[0] - 1.0).abs() < 1e-6); // cos(2π) ≈ 1
//! assert!(y[1].abs() < 1e-6);         // sin(2π) ≈ 0
//! ```
//!
//! ## Modules
//!
//! - [`lanes`]: [`F64x4`](lanes::F64x4) packed lane type and lazy sequence
//!   operations over lanes: `load` / `unpack`, element-wise `add`, `mul`,
//!   `mul_add` (fused), `div`, branch-free `abs`, `all` over comparison masks,
//!   and horizontal `min` / `max`. AVX-backed on x86_64 when enabled at compile
//!   time, portable scalar loops elsewhere.
//!
//! - [`ode`]: the RKF45 [`Tableau`](ode::Tableau), the shared step-size
//!   controller, and the two steppers [`ode::naive::rk45`] and
//!   [`ode::vectorized::rk45`]. Both return lazy iterators of `(t, y)` samples
//!   including exact samples at requested output times.
//!
//! ## Cargo features
//!
//! | Feature   | Default  | Description |
//! |-----------|----------|-------------|
//! | `std`     | yes      | Hardware FPU via system libm, `std::error::Error` for [`OdeError`](ode::OdeError) |
//! | `libm`    | baseline | Pure-Rust software float fallback, always linked so `no_std` builds work |
//!
//! ## Logging
//!
//! Integration start, completion and failures are reported at `debug` level,
//! rejected steps at `trace` level, through the [`log`] facade.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod lanes;
pub mod ode;

pub use lanes::F64x4;
pub use ode::{AdaptiveSettings, OdeError, Rk45Stats, Sample};
