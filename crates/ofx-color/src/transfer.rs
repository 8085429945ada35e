//! sRGB transfer function.
//!
//! Both directions are odd-symmetric around 0 so negative values from
//! out-of-gamut pixels round-trip instead of producing NaN.
//!
//! # Reference
//!
//! IEC 61966-2-1:1999

/// Decodes an sRGB-encoded value to linear light.
///
/// ```rust
/// use ofx_color::transfer::srgb_decode;
///
/// assert!((srgb_decode(0.5) - 0.214).abs() < 0.01);
/// ```
#[inline]
pub fn srgb_decode(v: f32) -> f32 {
    let a = v.abs();
    let lin = if a <= 0.04045 {
        a / 12.92
    } else {
        ((a + 0.055) / 1.055).powf(2.4)
    };
    lin.copysign(v)
}

/// Encodes linear light to sRGB.
#[inline]
pub fn srgb_encode(l: f32) -> f32 {
    let a = l.abs();
    let enc = if a <= 0.0031308 {
        a * 12.92
    } else {
        1.055 * a.powf(1.0 / 2.4) - 0.055
    };
    enc.copysign(l)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        for v in [-0.5f32, 0.0, 0.002, 0.04, 0.3, 0.8, 1.0, 2.5] {
            assert!((srgb_decode(srgb_encode(v)) - v).abs() < 1e-5, "{v}");
        }
    }

    #[test]
    fn test_endpoints() {
        assert_eq!(srgb_encode(0.0), 0.0);
        assert!((srgb_encode(1.0) - 1.0).abs() < 1e-6);
        assert!(srgb_decode(-0.5) < 0.0);
    }
}
