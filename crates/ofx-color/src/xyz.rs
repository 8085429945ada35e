//! Rec.709 linear RGB ⇄ CIE XYZ ⇄ xyY, D65 white.
//!
//! ```rust
//! use ofx_color::xyz::{rgb709_to_xyz, xyz_to_xyy, D65_XY};
//!
//! let xyy = xyz_to_xyy(rgb709_to_xyz([1.0, 1.0, 1.0]));
//! assert!((xyy[0] - D65_XY[0]).abs() < 1e-3);
//! assert!((xyy[2] - 1.0).abs() < 1e-4);
//! ```

use ofx_math::{Mat3, Vec3};

/// Chromaticity of the D65 white point.
pub const D65_XY: [f32; 2] = [0.3127, 0.3290];

/// Rec.709 / sRGB primaries to XYZ, D65.
pub const RGB709_TO_XYZ: Mat3 = Mat3::from_rows([
    [0.4123908, 0.3575843, 0.1804808],
    [0.2126390, 0.7151687, 0.0721923],
    [0.0193308, 0.1191948, 0.9505322],
]);

/// XYZ to Rec.709 / sRGB primaries, D65.
pub const XYZ_TO_RGB709: Mat3 = Mat3::from_rows([
    [3.2409699, -1.5373832, -0.4986108],
    [-0.9692436, 1.8759675, 0.0415551],
    [0.0556301, -0.2039770, 1.0569715],
]);

/// Linear Rec.709 RGB to XYZ.
#[inline]
pub fn rgb709_to_xyz(rgb: [f32; 3]) -> [f32; 3] {
    (RGB709_TO_XYZ * Vec3::from(rgb)).to_array()
}

/// XYZ to linear Rec.709 RGB.
#[inline]
pub fn xyz_to_rgb709(xyz: [f32; 3]) -> [f32; 3] {
    (XYZ_TO_RGB709 * Vec3::from(xyz)).to_array()
}

/// XYZ to `[x, y, Y]`.
///
/// Black keeps the white-point chromaticity so hue-preserving edits on
/// black stay neutral.
#[inline]
pub fn xyz_to_xyy(xyz: [f32; 3]) -> [f32; 3] {
    let [x, y, z] = xyz;
    let sum = x + y + z;
    if sum == 0.0 {
        return [D65_XY[0], D65_XY[1], y];
    }
    [x / sum, y / sum, y]
}

/// `[x, y, Y]` to XYZ. A zero `y` chromaticity gives black.
#[inline]
pub fn xyy_to_xyz(xyy: [f32; 3]) -> [f32; 3] {
    let [x, y, big_y] = xyy;
    if y == 0.0 {
        return [0.0, 0.0, 0.0];
    }
    [x * big_y / y, big_y, (1.0 - x - y) * big_y / y]
}
