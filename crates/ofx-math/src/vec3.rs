//! Colour triplet.

use std::ops::{Add, Mul, Sub};

/// RGB or XYZ triplet, in that component order.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[repr(C)]
pub struct Vec3 {
    /// R or X.
    pub x: f32,
    /// G or Y.
    pub y: f32,
    /// B or Z.
    pub z: f32,
}

impl Vec3 {
    /// Black.
    pub const ZERO: Self = Self::splat(0.0);

    /// Creates a triplet.
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Grey of value `v`.
    #[inline]
    pub const fn splat(v: f32) -> Self {
        Self { x: v, y: v, z: v }
    }

    /// As `[x, y, z]`.
    #[inline]
    pub const fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    /// Weighted sum, e.g. luminance against a weight triplet.
    #[inline]
    pub fn dot(self, w: Self) -> f32 {
        self.x.mul_add(w.x, self.y.mul_add(w.y, self.z * w.z))
    }

    /// Plain sum of the three.
    #[inline]
    pub fn sum(self) -> f32 {
        self.x + self.y + self.z
    }

    /// Largest of the three.
    #[inline]
    pub fn max_element(self) -> f32 {
        self.x.max(self.y).max(self.z)
    }

    /// Moves `t` of the way toward `to`.
    #[inline]
    pub fn lerp(self, to: Self, t: f32) -> Self {
        self + (to - self) * t
    }

    #[inline]
    pub(crate) fn glam(self) -> glam::Vec3 {
        glam::Vec3::from_array(self.to_array())
    }
}

impl From<[f32; 3]> for Vec3 {
    #[inline]
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self { x, y, z }
    }
}

impl From<glam::Vec3> for Vec3 {
    #[inline]
    fn from(v: glam::Vec3) -> Self {
        Self::from(v.to_array())
    }
}

impl From<Vec3> for [f32; 3] {
    #[inline]
    fn from(v: Vec3) -> Self {
        v.to_array()
    }
}

impl Add for Vec3 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::from(self.glam() + rhs.glam())
    }
}

impl Sub for Vec3 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::from(self.glam() - rhs.glam())
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;

    #[inline]
    fn mul(self, k: f32) -> Self {
        Self::from(self.glam() * k)
    }
}
