//! Lane arithmetic over packed `f64` values.
//!
//! A [`F64x4`] holds [`WIDTH`] doubles that are processed together. The free
//! functions in this module operate lazily on *sequences* of lanes, which is
//! how the vectorized stepper stores state vectors of arbitrary dimension:
//! a vector of length `n` packs into `ceil(n / 4)` lanes, and the unused slots
//! of the last lane hold a caller-chosen padding value.
//!
//! ```
//! use fehlberg::lanes::{self, F64x4};
//!
//! let x = [1.0, -2.0, 3.0, -4.0, 5.0];
//! let packed: Vec<F64x4> = lanes::load(&x, 0.0).collect();
//! assert_eq!(packed.len(), 2);
//!
//! let doubled: Vec<f64> = lanes::unpack(lanes::mul(&packed, F64x4::splat(2.0))).collect();
//! assert_eq!(&doubled[..5], &[2.0, -4.0, 6.0, -8.0, 10.0]);
//! assert_eq!(lanes::max(&packed), Some(5.0));
//! ```
//!
//! ## Backend dispatch
//!
//! The backend is picked at compile time. On x86_64 with `target_feature = "avx"`
//! (e.g. `-C target-cpu=native` on Haswell+) lanes map onto `__m256d` registers,
//! and `mul_add` becomes a single `vfmadd` when `fma` is enabled as well.
//! Everywhere else a portable scalar loop implements the same contract.
//!
//! | Arch      | ISA         | Backend      |
//! |-----------|-------------|--------------|
//! | `x86_64`  | AVX (+FMA)  | `avx`        |
//! | other     | none        | `scalar`     |

#[cfg_attr(all(target_arch = "x86_64", target_feature = "avx"), allow(dead_code))]
mod scalar;

#[cfg(all(target_arch = "x86_64", target_feature = "avx"))]
mod avx;

#[cfg(all(target_arch = "x86_64", target_feature = "avx"))]
use avx as backend;
#[cfg(not(all(target_arch = "x86_64", target_feature = "avx")))]
use scalar as backend;


use core::borrow::Borrow;
use core::ops::{Add, Div, Mul, Neg, Sub};

/// Number of `f64` slots per lane.
pub const WIDTH: usize = 4;

/// Four packed `f64` values, 32-byte aligned so a lane loads straight into
/// a 256-bit register.
#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(C, align(32))]
pub struct F64x4(pub [f64; WIDTH]);

impl F64x4 {
    /// All slots zero.
    pub const ZERO: Self = Self([0.0; WIDTH]);

    /// All slots have every bit set: the "true" value of a comparison mask.
    pub const TRUE: Self = Self([f64::from_bits(u64::MAX); WIDTH]);

    /// Broadcast `v` to every slot.
    #[inline(always)]
    pub const fn splat(v: f64) -> Self {
        Self([v; WIDTH])
    }

    #[inline(always)]
    pub const fn from_array(arr: [f64; WIDTH]) -> Self {
        Self(arr)
    }

    #[inline(always)]
    pub const fn to_array(self) -> [f64; WIDTH] {
        self.0
    }

    /// Fused `m * self + c` per slot (single rounding when the backend has FMA).
    #[inline(always)]
    pub fn mul_add(self, m: Self, c: Self) -> Self {
        backend::mul_add(self, m, c)
    }

    /// Absolute value by clearing every sign bit.
    #[inline(always)]
    pub fn abs(self) -> Self {
        backend::abs(self)
    }

    /// Comparison mask: a slot is all-ones where `self <= rhs`, zero otherwise
    /// (including when either side is NaN).
    #[inline(always)]
    pub fn le(self, rhs: Self) -> Self {
        backend::le(self, rhs)
    }

    /// Bitwise AND, used to apply comparison masks.
    #[inline(always)]
    pub fn and(self, rhs: Self) -> Self {
        backend::and(self, rhs)
    }

    /// Slot-wise minimum.
    #[inline(always)]
    pub fn min(self, rhs: Self) -> Self {
        backend::min(self, rhs)
    }

    /// Slot-wise maximum.
    #[inline(always)]
    pub fn max(self, rhs: Self) -> Self {
        backend::max(self, rhs)
    }

    /// Smallest slot value.
    #[inline(always)]
    pub fn reduce_min(self) -> f64 {
        backend::reduce_min(self)
    }

    /// Largest slot value.
    #[inline(always)]
    pub fn reduce_max(self) -> f64 {
        backend::reduce_max(self)
    }

    /// True iff every slot of a comparison mask is set.
    #[inline(always)]
    pub fn all_set(self) -> bool {
        backend::all_set(self)
    }
}

impl Default for F64x4 {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<[f64; WIDTH]> for F64x4 {
    fn from(arr: [f64; WIDTH]) -> Self {
        Self(arr)
    }
}

impl From<F64x4> for [f64; WIDTH] {
    fn from(v: F64x4) -> Self {
        v.0
    }
}

macro_rules! impl_lane_op {
    ($trait:ident, $method:ident, $kernel:path) => {
        impl $trait for F64x4 {
            type Output = Self;
            #[inline(always)]
            fn $method(self, rhs: Self) -> Self {
                $kernel(self, rhs)
            }
        }
    };
}

impl_lane_op!(Add, add, backend::add);
impl_lane_op!(Sub, sub, backend::sub);
impl_lane_op!(Mul, mul, backend::mul);
impl_lane_op!(Div, div, backend::div);

impl Neg for F64x4 {
    type Output = Self;
    #[inline(always)]
    fn neg(self) -> Self {
        backend::neg(self)
    }
}

// ---------------------------------------------------------------------------
// Lazy sequence operations
// ---------------------------------------------------------------------------

/// Pack a scalar slice into lanes, preserving order.
///
/// If `scalars.len()` is not a multiple of [`WIDTH`], the unused slots of the
/// last lane hold `padding`. An empty slice yields no lanes.
pub fn load(scalars: &[f64], padding: f64) -> impl Iterator<Item = F64x4> + '_ {
    scalars.chunks(WIDTH).map(move |chunk| {
        let mut lane = [padding; WIDTH];
        lane[..chunk.len()].copy_from_slice(chunk);
        F64x4(lane)
    })
}

/// Flatten lanes back into scalars, slot order preserved.
///
/// Padding written by [`load`] is included; callers that need the unpadded
/// length must `take(n)`.
pub fn unpack<I>(lanes: I) -> impl Iterator<Item = f64>
where
    I: IntoIterator,
    I::Item: Borrow<F64x4>,
{
    lanes.into_iter().flat_map(|v| v.borrow().0)
}

/// Element-wise `a[i] + b[i]`.
pub fn add<A, B>(a: A, b: B) -> impl Iterator<Item = F64x4>
where
    A: IntoIterator,
    A::Item: Borrow<F64x4>,
    B: IntoIterator,
    B::Item: Borrow<F64x4>,
{
    a.into_iter().zip(b).map(|(x, y)| *x.borrow() + *y.borrow())
}

/// Element-wise `a[i] * s` with a broadcast lane `s`.
pub fn mul<A>(a: A, s: F64x4) -> impl Iterator<Item = F64x4>
where
    A: IntoIterator,
    A::Item: Borrow<F64x4>,
{
    a.into_iter().map(move |x| *x.borrow() * s)
}

/// Fused `m * a[i] + c[i]`.
pub fn mul_add<A, C>(a: A, m: F64x4, c: C) -> impl Iterator<Item = F64x4>
where
    A: IntoIterator,
    A::Item: Borrow<F64x4>,
    C: IntoIterator,
    C::Item: Borrow<F64x4>,
{
    a.into_iter().zip(c).map(move |(x, y)| x.borrow().mul_add(m, *y.borrow()))
}

/// Element-wise `a[i] / b[i]`.
pub fn div<A, B>(a: A, b: B) -> impl Iterator<Item = F64x4>
where
    A: IntoIterator,
    A::Item: Borrow<F64x4>,
    B: IntoIterator,
    B::Item: Borrow<F64x4>,
{
    a.into_iter().zip(b).map(|(x, y)| *x.borrow() / *y.borrow())
}

/// Branch-free absolute value of a single lane.
#[inline]
pub fn abs(lane: F64x4) -> F64x4 {
    lane.abs()
}

/// True iff every lane of a sequence of comparison masks is fully set.
///
/// An empty sequence is vacuously true.
pub fn all<I>(masks: I) -> bool
where
    I: IntoIterator,
    I::Item: Borrow<F64x4>,
{
    masks.into_iter().all(|m| m.borrow().all_set())
}

/// Smallest value over all slots of all lanes; `None` for an empty sequence.
///
/// Lanes are first reduced pairwise with a slot-wise minimum, then the
/// surviving lane is reduced to one scalar.
pub fn min<I>(lanes: I) -> Option<f64>
where
    I: IntoIterator,
    I::Item: Borrow<F64x4>,
{
    lanes
        .into_iter()
        .map(|v| *v.borrow())
        .reduce(F64x4::min)
        .map(F64x4::reduce_min)
}

/// Largest value over all slots of all lanes; `None` for an empty sequence.
pub fn max<I>(lanes: I) -> Option<f64>
where
    I: IntoIterator,
    I::Item: Borrow<F64x4>,
{
    lanes
        .into_iter()
        .map(|v| *v.borrow())
        .reduce(F64x4::max)
        .map(F64x4::reduce_max)
}

/// Mask selecting the first `len % WIDTH` slots of the last lane of a packed
/// vector of length `len`, or `None` when the vector fills its lanes exactly.
pub fn tail_mask(len: usize) -> Option<F64x4> {
    let used = len % WIDTH;
    if used == 0 {
        return None;
    }
    let mut mask = F64x4::ZERO;
    mask.0[..used].copy_from_slice(&F64x4::TRUE.0[..used]);
    Some(mask)
}
