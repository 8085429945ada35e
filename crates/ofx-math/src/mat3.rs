//! Row-major 3x3 matrix applied to column triplets.

use crate::Vec3;
use std::ops::Mul;

/// Linear colour transform.
///
/// Rows are written the way colour-science tables print them, so
/// `m[1]` yields the second output component:
///
/// ```rust
/// use ofx_math::{Mat3, Vec3};
///
/// let swap = Mat3::from_rows([[0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]]);
/// assert_eq!(swap * Vec3::new(1.0, 2.0, 3.0), Vec3::new(2.0, 1.0, 3.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat3 {
    /// Rows, top to bottom.
    pub m: [[f32; 3]; 3],
}

impl Mat3 {
    /// Leaves colours unchanged.
    pub const IDENTITY: Self = Self::diagonal(1.0, 1.0, 1.0);

    /// From rows, top to bottom.
    #[inline]
    pub const fn from_rows(m: [[f32; 3]; 3]) -> Self {
        Self { m }
    }

    /// Per-channel gain.
    #[inline]
    pub const fn diagonal(r: f32, g: f32, b: f32) -> Self {
        Self { m: [[r, 0.0, 0.0], [0.0, g, 0.0], [0.0, 0.0, b]] }
    }

    /// Inverse transform, `None` when the matrix collapses a dimension.
    pub fn inverse(&self) -> Option<Self> {
        let g = self.glam();
        (g.determinant().abs() >= 1e-12).then(|| Self::from(g.inverse()))
    }

    // glam stores columns; our rows are its columns transposed.
    #[inline]
    fn glam(&self) -> glam::Mat3 {
        glam::Mat3::from_cols_array_2d(&self.m).transpose()
    }
}

impl From<glam::Mat3> for Mat3 {
    #[inline]
    fn from(g: glam::Mat3) -> Self {
        Self::from_rows(g.transpose().to_cols_array_2d())
    }
}

impl Default for Mat3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul<Vec3> for Mat3 {
    type Output = Vec3;

    #[inline]
    fn mul(self, v: Vec3) -> Vec3 {
        Vec3::from(self.glam() * v.glam())
    }
}

impl Mul for Mat3 {
    type Output = Self;

    /// Applies `rhs` first, then `self`.
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self::from(self.glam() * rhs.glam())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_rows_produce_components() {
        let m = Mat3::from_rows([[1.0, 2.0, 3.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
        assert_eq!(m * Vec3::splat(1.0), Vec3::new(6.0, 1.0, 1.0));
    }

    #[test]
    fn test_inverse_of_rgb_to_xyz() {
        let m = Mat3::from_rows([
            [0.4124, 0.3576, 0.1805],
            [0.2126, 0.7152, 0.0722],
            [0.0193, 0.1192, 0.9505],
        ]);
        let id = m * m.inverse().unwrap();
        for (i, row) in id.m.iter().enumerate() {
            for (j, v) in row.iter().enumerate() {
                assert_abs_diff_eq!(*v, if i == j { 1.0 } else { 0.0 }, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn test_collapsed_has_no_inverse() {
        let m = Mat3::from_rows([[1.0, 2.0, 3.0], [2.0, 4.0, 6.0], [0.0, 0.0, 1.0]]);
        assert!(m.inverse().is_none());
        assert_eq!(Mat3::default(), Mat3::IDENTITY);
    }
}
