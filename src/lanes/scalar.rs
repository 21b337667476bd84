//! Portable scalar fallback for lane kernels.
//!
//! Used on architectures (or target-feature sets) without a SIMD
//! specialization. Each kernel loops over the four slots.

use num_traits::Float;

use super::{F64x4, WIDTH};

const SIGN_BIT: u64 = 1 << 63;

#[inline(always)]
fn zip_with(a: F64x4, b: F64x4, op: impl Fn(f64, f64) -> f64) -> F64x4 {
    let mut out = [0.0; WIDTH];
    for i in 0..WIDTH {
        out[i] = op(a.0[i], b.0[i]);
    }
    F64x4(out)
}

/// Element-wise addition.
#[inline]
pub fn add(a: F64x4, b: F64x4) -> F64x4 {
    zip_with(a, b, |x, y| x + y)
}

/// Element-wise subtraction.
#[inline]
pub fn sub(a: F64x4, b: F64x4) -> F64x4 {
    zip_with(a, b, |x, y| x - y)
}

/// Element-wise multiplication.
#[inline]
pub fn mul(a: F64x4, b: F64x4) -> F64x4 {
    zip_with(a, b, |x, y| x * y)
}

/// Element-wise division.
#[inline]
pub fn div(a: F64x4, b: F64x4) -> F64x4 {
    zip_with(a, b, |x, y| x / y)
}

/// Fused `m * a + c`.
#[inline]
pub fn mul_add(a: F64x4, m: F64x4, c: F64x4) -> F64x4 {
    let mut out = [0.0; WIDTH];
    for i in 0..WIDTH {
        out[i] = Float::mul_add(m.0[i], a.0[i], c.0[i]);
    }
    F64x4(out)
}

/// Clear the sign bit of every slot.
#[inline]
pub fn abs(a: F64x4) -> F64x4 {
    let mut out = a.0;
    for v in out.iter_mut() {
        *v = f64::from_bits(v.to_bits() & !SIGN_BIT);
    }
    F64x4(out)
}

/// Flip the sign bit of every slot, so `+0.0` becomes `-0.0`.
#[inline]
pub fn neg(a: F64x4) -> F64x4 {
    let mut out = a.0;
    for v in out.iter_mut() {
        *v = f64::from_bits(v.to_bits() ^ SIGN_BIT);
    }
    F64x4(out)
}

/// All-ones where `a <= b`, zero otherwise.
#[inline]
pub fn le(a: F64x4, b: F64x4) -> F64x4 {
    let set = F64x4::TRUE.0[0];
    zip_with(a, b, |x, y| if x <= y { set } else { 0.0 })
}

/// Bitwise AND.
#[inline]
pub fn and(a: F64x4, b: F64x4) -> F64x4 {
    zip_with(a, b, |x, y| f64::from_bits(x.to_bits() & y.to_bits()))
}

/// Slot-wise minimum.
#[inline]
pub fn min(a: F64x4, b: F64x4) -> F64x4 {
    zip_with(a, b, <f64 as Float>::min)
}

/// Slot-wise maximum.
#[inline]
pub fn max(a: F64x4, b: F64x4) -> F64x4 {
    zip_with(a, b, <f64 as Float>::max)
}

/// Horizontal minimum: halves first, then the final pair.
#[inline]
pub fn reduce_min(a: F64x4) -> f64 {
    let [x0, x1, x2, x3] = a.0;
    Float::min(Float::min(x0, x2), Float::min(x1, x3))
}

/// Horizontal maximum: halves first, then the final pair.
#[inline]
pub fn reduce_max(a: F64x4) -> f64 {
    let [x0, x1, x2, x3] = a.0;
    Float::max(Float::max(x0, x2), Float::max(x1, x3))
}

/// True iff every slot has every bit set.
#[inline]
pub fn all_set(a: F64x4) -> bool {
    a.0.iter().zip(F64x4::TRUE.0).all(|(v, t)| v.to_bits() == t.to_bits())
}
