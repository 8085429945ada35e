//! # ofx-color
//!
//! Colour models used by the per-pixel kernels.
//!
//! - [`luminance`] - Luminance formulas ([`LuminanceMath`])
//! - [`hsv`] - RGB ⇄ HSV
//! - [`transfer`] - sRGB encode / decode
//! - [`xyz`] - Rec.709 ⇄ CIE XYZ ⇄ xyY
//! - [`lab`] - CIE L\*a\*b\* (D65)
//! - [`ycbcr`] - Rec.709 Y'CbCr
//!
//! All functions work on unbounded `f32` and never clamp; out-of-gamut
//! values survive a round trip.
//!
//! # Architecture
//!
//! ```text
//!   ofx-color
//!       |
//!   ofx-math
//! ```
//!
//! # Feature Flags
//!
//! - `serde` - Serialize [`LuminanceMath`] in kernel presets

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod hsv;
pub mod lab;
pub mod luminance;
pub mod transfer;
pub mod xyz;
pub mod ycbcr;

pub use hsv::{hsv_to_rgb, rgb_to_hsv};
pub use luminance::LuminanceMath;

/// Common imports.
pub mod prelude {
    pub use crate::hsv::{hsv_to_rgb, rgb_to_hsv};
    pub use crate::lab::{lab_to_rgb709, rgb709_to_lab};
    pub use crate::luminance::LuminanceMath;
    pub use crate::transfer::{srgb_decode, srgb_encode};
    pub use crate::xyz::{rgb709_to_xyz, xyz_to_rgb709, xyz_to_xyy, xyy_to_xyz};
    pub use crate::ycbcr::{rgb709_to_ycbcr709, ycbcr709_to_rgb709};
}
