//! AVX-accelerated lane kernels for x86_64.
//!
//! AVX provides 256-bit registers → 4×f64 lanes, exactly one [`F64x4`].
//! Only compiled when `target_feature = "avx"` is enabled
//! (e.g. via `-C target-cpu=native` on Haswell+). `mul_add` uses
//! `vfmadd231pd` when `fma` is enabled as well.

use core::arch::x86_64::*;

use super::F64x4;

#[inline(always)]
fn load(v: F64x4) -> __m256d {
    // F64x4 is 32-byte aligned
    unsafe { _mm256_load_pd(v.0.as_ptr()) }
}

#[inline(always)]
fn store(r: __m256d) -> F64x4 {
    let mut out = F64x4::ZERO;
    unsafe { _mm256_store_pd(out.0.as_mut_ptr(), r) };
    out
}

/// Element-wise addition.
#[inline]
pub fn add(a: F64x4, b: F64x4) -> F64x4 {
    store(unsafe { _mm256_add_pd(load(a), load(b)) })
}

/// Element-wise subtraction.
#[inline]
pub fn sub(a: F64x4, b: F64x4) -> F64x4 {
    store(unsafe { _mm256_sub_pd(load(a), load(b)) })
}

/// Element-wise multiplication.
#[inline]
pub fn mul(a: F64x4, b: F64x4) -> F64x4 {
    store(unsafe { _mm256_mul_pd(load(a), load(b)) })
}

/// Element-wise division.
#[inline]
pub fn div(a: F64x4, b: F64x4) -> F64x4 {
    store(unsafe { _mm256_div_pd(load(a), load(b)) })
}

/// Fused `m * a + c`.
#[inline]
pub fn mul_add(a: F64x4, m: F64x4, c: F64x4) -> F64x4 {
    #[cfg(target_feature = "fma")]
    let r = unsafe { _mm256_fmadd_pd(load(m), load(a), load(c)) };
    #[cfg(not(target_feature = "fma"))]
    let r = unsafe { _mm256_add_pd(_mm256_mul_pd(load(m), load(a)), load(c)) };
    store(r)
}

/// Clear the sign bit of every slot: `!(-0.0) & a`.
#[inline]
pub fn abs(a: F64x4) -> F64x4 {
    store(unsafe { _mm256_andnot_pd(_mm256_set1_pd(-0.0), load(a)) })
}

/// Flip the sign bit of every slot: `-0.0 ^ a`.
#[inline]
pub fn neg(a: F64x4) -> F64x4 {
    store(unsafe { _mm256_xor_pd(_mm256_set1_pd(-0.0), load(a)) })
}

/// All-ones where `a <= b` (ordered, non-signalling), zero otherwise.
#[inline]
pub fn le(a: F64x4, b: F64x4) -> F64x4 {
    store(unsafe { _mm256_cmp_pd(load(a), load(b), _CMP_LE_OQ) })
}

/// Bitwise AND.
#[inline]
pub fn and(a: F64x4, b: F64x4) -> F64x4 {
    store(unsafe { _mm256_and_pd(load(a), load(b)) })
}

/// Slot-wise minimum.
#[inline]
pub fn min(a: F64x4, b: F64x4) -> F64x4 {
    store(unsafe { _mm256_min_pd(load(a), load(b)) })
}

/// Slot-wise maximum.
#[inline]
pub fn max(a: F64x4, b: F64x4) -> F64x4 {
    store(unsafe { _mm256_max_pd(load(a), load(b)) })
}

/// Horizontal minimum: [a, b, c, d] → min(min(a, c), min(b, d)).
#[inline]
pub fn reduce_min(a: F64x4) -> f64 {
    unsafe {
        let v = load(a);
        let hi128 = _mm256_extractf128_pd(v, 1); // [c, d]
        let lo128 = _mm256_castpd256_pd128(v); // [a, b]
        let m = _mm_min_pd(lo128, hi128);
        let hi64 = _mm_unpackhi_pd(m, m);
        _mm_cvtsd_f64(m).min(_mm_cvtsd_f64(hi64))
    }
}

/// Horizontal maximum: [a, b, c, d] → max(max(a, c), max(b, d)).
#[inline]
pub fn reduce_max(a: F64x4) -> f64 {
    unsafe {
        let v = load(a);
        let hi128 = _mm256_extractf128_pd(v, 1);
        let lo128 = _mm256_castpd256_pd128(v);
        let m = _mm_max_pd(lo128, hi128);
        let hi64 = _mm_unpackhi_pd(m, m);
        _mm_cvtsd_f64(m).max(_mm_cvtsd_f64(hi64))
    }
}

/// True iff the sign bit of every slot is set, which for comparison masks
/// means every slot compared true.
#[inline]
pub fn all_set(a: F64x4) -> bool {
    unsafe { _mm256_movemask_pd(load(a)) == 0b1111 }
}
