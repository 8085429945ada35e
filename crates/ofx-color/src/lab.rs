//! CIE L\*a\*b\*, D65 reference white.
//!
//! L\* is in `[0, 100]` for in-gamut colours.

use crate::xyz::{rgb709_to_xyz, xyz_to_rgb709};

/// D65 reference white in XYZ.
pub const D65_WHITE: [f32; 3] = [0.95047, 1.0, 1.08883];

const EPSILON: f32 = 216.0 / 24389.0;
const KAPPA: f32 = 24389.0 / 27.0;

#[inline]
fn f(t: f32) -> f32 {
    if t > EPSILON {
        t.cbrt()
    } else {
        (KAPPA * t + 16.0) / 116.0
    }
}

#[inline]
fn f_inv(t: f32) -> f32 {
    let t3 = t * t * t;
    if t3 > EPSILON {
        t3
    } else {
        (116.0 * t - 16.0) / KAPPA
    }
}

/// XYZ to `[L, a, b]`.
pub fn xyz_to_lab(xyz: [f32; 3]) -> [f32; 3] {
    let fx = f(xyz[0] / D65_WHITE[0]);
    let fy = f(xyz[1] / D65_WHITE[1]);
    let fz = f(xyz[2] / D65_WHITE[2]);
    [116.0 * fy - 16.0, 500.0 * (fx - fy), 200.0 * (fy - fz)]
}

/// `[L, a, b]` to XYZ.
pub fn lab_to_xyz(lab: [f32; 3]) -> [f32; 3] {
    let fy = (lab[0] + 16.0) / 116.0;
    let fx = fy + lab[1] / 500.0;
    let fz = fy - lab[2] / 200.0;
    [
        f_inv(fx) * D65_WHITE[0],
        f_inv(fy) * D65_WHITE[1],
        f_inv(fz) * D65_WHITE[2],
    ]
}

/// Linear Rec.709 RGB to Lab.
///
/// ```rust
/// use ofx_color::lab::rgb709_to_lab;
///
/// let lab = rgb709_to_lab([1.0, 1.0, 1.0]);
/// assert!((lab[0] - 100.0).abs() < 0.1);
/// assert!(lab[1].abs() < 0.1 && lab[2].abs() < 0.1);
/// ```
#[inline]
pub fn rgb709_to_lab(rgb: [f32; 3]) -> [f32; 3] {
    xyz_to_lab(rgb709_to_xyz(rgb))
}

/// Lab to linear Rec.709 RGB.
#[inline]
pub fn lab_to_rgb709(lab: [f32; 3]) -> [f32; 3] {
    xyz_to_rgb709(lab_to_xyz(lab))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_round_trip() {
        for rgb in [[0.18, 0.18, 0.18], [0.8, 0.2, 0.1], [0.001, 0.002, 0.0005]] {
            let back = lab_to_rgb709(rgb709_to_lab(rgb));
            for c in 0..3 {
                assert_abs_diff_eq!(back[c], rgb[c], epsilon = 1e-4);
            }
        }
    }

    #[test]
    fn test_black() {
        let lab = rgb709_to_lab([0.0, 0.0, 0.0]);
        assert_abs_diff_eq!(lab[0], 0.0, epsilon = 1e-4);
    }
}
