//! Sample types stored in host image buffers.
//!
//! The [`Sample`] trait abstracts over the three OFX bit depths. Values are
//! exchanged with the pipeline as `f32` in **host range**: `[0, 255]` for
//! `u8`, `[0, 65535]` for `u16`, unbounded for `f32`. Normalisation to
//! kernel space `[0, 1]` goes through [`Sample::to_unit`] and
//! [`Sample::from_unit`].
//!
//! # Example
//!
//! ```rust
//! use ofx_core::Sample;
//!
//! assert_eq!(u8::from_f32(300.0), 255);
//! assert_eq!(u8::from_f32(-10.0), 0);
//! assert_eq!(f32::from_f32(300.0), 300.0);
//! assert_eq!(200u8.to_unit(), 200.0 / 255.0);
//! ```

use crate::format::BitDepth;

/// Numeric type of one channel of a host image.
///
/// # Implementations
///
/// | Type  | `MAX_VALUE` | Out-of-range writes  |
/// |-------|-------------|----------------------|
/// | `u8`  | 255         | clamp + round        |
/// | `u16` | 65535       | clamp + round        |
/// | `f32` | 1.0         | passed through       |
pub trait Sample: Copy + Default + Send + Sync + PartialOrd + std::fmt::Debug + 'static {
    /// Runtime depth tag.
    const DEPTH: BitDepth;

    /// Value that represents full intensity.
    const MAX_VALUE: f32;

    /// Raw value as `f32`, in host range.
    fn to_f32(self) -> f32;

    /// Converts a host-range `f32` back.
    ///
    /// Integer types clamp to `[0, MAX_VALUE]` and round to nearest; floats
    /// never clamp.
    fn from_f32(v: f32) -> Self;

    /// Value normalised to kernel space.
    #[inline]
    fn to_unit(self) -> f32 {
        self.to_f32() / Self::MAX_VALUE
    }

    /// Converts a kernel-space value back to host range.
    #[inline]
    fn from_unit(v: f32) -> Self {
        Self::from_f32(v * Self::MAX_VALUE)
    }

    /// Zero sample.
    #[inline]
    fn zero() -> Self {
        Self::default()
    }
}

impl Sample for u8 {
    const DEPTH: BitDepth = BitDepth::U8;
    const MAX_VALUE: f32 = 255.0;

    #[inline]
    fn to_f32(self) -> f32 {
        self as f32
    }

    #[inline]
    fn from_f32(v: f32) -> Self {
        // NaN saturates to 0 through the `as` cast.
        (v.clamp(0.0, 255.0) + 0.5) as u8
    }
}

impl Sample for u16 {
    const DEPTH: BitDepth = BitDepth::U16;
    const MAX_VALUE: f32 = 65535.0;

    #[inline]
    fn to_f32(self) -> f32 {
        self as f32
    }

    #[inline]
    fn from_f32(v: f32) -> Self {
        (v.clamp(0.0, 65535.0) + 0.5) as u16
    }
}

impl Sample for f32 {
    const DEPTH: BitDepth = BitDepth::F32;
    const MAX_VALUE: f32 = 1.0;

    #[inline]
    fn to_f32(self) -> f32 {
        self
    }

    #[inline]
    fn from_f32(v: f32) -> Self {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_u8_clamps_and_rounds() {
        assert_eq!(u8::from_f32(300.0), 255);
        assert_eq!(u8::from_f32(-10.0), 0);
        assert_eq!(u8::from_f32(127.6), 128);
        assert_eq!(u8::from_f32(f32::NAN), 0);
    }

    #[test]
    fn test_u16_unit_round_trip() {
        let v = u16::from_unit(0.5);
        assert_eq!(v, 32768);
        assert_abs_diff_eq!(v.to_unit(), 0.5, epsilon = 1e-4);
    }

    #[test]
    fn test_float_passthrough() {
        assert_eq!(f32::from_f32(-2.5), -2.5);
        assert_eq!(f32::from_unit(3.0), 3.0);
        assert_eq!(<f32 as Sample>::DEPTH, BitDepth::F32);
    }
}
