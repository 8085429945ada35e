//! Rec.709 Y'CbCr.
//!
//! Chroma is offset by 0.5 so neutral greys sit at `Cb = Cr = 0.5`.
//!
//! ```rust
//! use ofx_color::ycbcr::rgb709_to_ycbcr709;
//!
//! let [y, cb, cr] = rgb709_to_ycbcr709([0.5, 0.5, 0.5]);
//! assert!((y - 0.5).abs() < 1e-6);
//! assert!((cb - 0.5).abs() < 1e-6 && (cr - 0.5).abs() < 1e-6);
//! ```

use crate::luminance::REC709;
use ofx_math::Vec3;

const CB_SCALE: f32 = 2.0 * (1.0 - 0.0722);
const CR_SCALE: f32 = 2.0 * (1.0 - 0.2126);

/// R'G'B' to `[Y', Cb, Cr]`.
#[inline]
pub fn rgb709_to_ycbcr709(rgb: [f32; 3]) -> [f32; 3] {
    let y = Vec3::from(rgb).dot(REC709);
    [y, (rgb[2] - y) / CB_SCALE + 0.5, (rgb[0] - y) / CR_SCALE + 0.5]
}

/// `[Y', Cb, Cr]` to R'G'B'.
#[inline]
pub fn ycbcr709_to_rgb709(ycc: [f32; 3]) -> [f32; 3] {
    let [y, cb, cr] = ycc;
    let r = y + (cr - 0.5) * CR_SCALE;
    let b = y + (cb - 0.5) * CB_SCALE;
    let g = (y - REC709.x * r - REC709.z * b) / REC709.y;
    [r, g, b]
}
