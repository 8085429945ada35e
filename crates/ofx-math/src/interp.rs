//! Interpolation and clamping helpers.
//!
//! ```rust
//! use ofx_math::{lerp, smoothstep, wrap01};
//!
//! assert_eq!(lerp(0.0, 10.0, 0.25), 2.5);
//! assert_eq!(smoothstep(0.0, 1.0, 0.5), 0.5);
//! assert!((wrap01(1.25) - 0.25).abs() < 1e-6);
//! ```

/// Linear interpolation: `a` at `t = 0`, `b` at `t = 1`, extrapolates
/// outside.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Position of `value` between `a` and `b`; 0 when the range is degenerate.
#[inline]
pub fn inverse_lerp(a: f32, b: f32, value: f32) -> f32 {
    if (b - a).abs() < 1e-10 {
        0.0
    } else {
        (value - a) / (b - a)
    }
}

/// Clamps to `[0, 1]`.
#[inline]
pub fn clamp01(v: f32) -> f32 {
    v.clamp(0.0, 1.0)
}

/// Hermite smoothstep: 0 below `edge0`, 1 above `edge1`, cubic between.
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = clamp01(inverse_lerp(edge0, edge1, x));
    t * t * (3.0 - 2.0 * t)
}

/// Wraps into `[0, 1)`.
#[inline]
pub fn wrap01(x: f32) -> f32 {
    let f = x - x.floor();
    // -tiny rounds up to exactly 1.0
    if f >= 1.0 { 0.0 } else { f }
}
