//! # ofx-math
//!
//! Math utilities for per-pixel kernels.
//!
//! - [`Vec3`] - Colour triplets (RGB, XYZ, Y'CbCr)
//! - [`Mat3`] - 3x3 matrices for linear colour transforms
//! - Interpolation helpers: [`lerp`], [`smoothstep`], [`clamp01`], [`wrap01`]
//!
//! # Design
//!
//! Matrices are stored **row-major** and multiply **column vectors**. The
//! heavy lifting (inversion, products) is delegated to [`glam`].
//!
//! ```rust
//! use ofx_math::{Mat3, Vec3};
//!
//! let m = Mat3::diagonal(2.0, 3.0, 4.0);
//! let v = m * Vec3::new(1.0, 1.0, 1.0);
//! assert_eq!(v, Vec3::new(2.0, 3.0, 4.0));
//!
//! let back = m.inverse().unwrap() * v;
//! assert!((back.y - 1.0).abs() < 1e-6);
//! ```
//!
//! # Dependencies
//!
//! - [`glam`] - SIMD-accelerated matrix math
//!
//! # Used By
//!
//! - `ofx-color` - Colour model conversions
//! - `ofx-ops` - Kernels

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod interp;
mod mat3;
mod vec3;

pub use interp::*;
pub use mat3::*;
pub use vec3::*;
