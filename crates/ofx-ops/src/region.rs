//! Region of interest computation.
//!
//! A kernel with spatial support needs source pixels around the render
//! window. The region pipeline grows the window by the kernel's support
//! (expressed at the current render scale) and clips the result to the
//! destination region of definition before anything is fetched.
//!
//! ```rust
//! use ofx_core::{Rect, RenderScale};
//! use ofx_ops::region::{bilateral_support, fetch_region, region_of_interest};
//!
//! let window = Rect::new(0, 0, 100, 100);
//! let support = bilateral_support(2.0, 1, RenderScale::FULL);
//! assert_eq!(support, 8);
//!
//! let roi = region_of_interest(window, support);
//! let rod = Rect::new(0, 0, 200, 200);
//! assert_eq!(fetch_region(roi, rod), Rect::new(0, 0, 108, 108));
//! ```

use ofx_core::{Rect, RenderScale};
use tracing::debug;

/// Number of wavelet levels at full resolution.
pub const WAVELET_LEVEL_MAX: u32 = 4;

/// Spatial extent of the bilateral window, in sigmas.
pub const BILATERAL_WINDOW_SIGMAS: f64 = 3.6;

/// Window grown by `support` pixels on every side.
#[inline]
pub fn region_of_interest(window: Rect, support: i32) -> Rect {
    window.dilate(support.max(0))
}

/// What is actually fetched: the region of interest clipped to the
/// destination region of definition.
#[inline]
pub fn fetch_region(roi: Rect, dst_rod: Rect) -> Rect {
    let r = roi.intersect(&dst_rod);
    debug!(%roi, %dst_rod, fetched = %r, "fetch region");
    r
}

/// Bilateral support: `ceil(sigma_s * 3.6 * scale.x * iterations)`.
///
/// Zero for degenerate parameters.
pub fn bilateral_support(sigma_s: f64, iterations: i32, scale: RenderScale) -> i32 {
    if sigma_s <= 0.0 || iterations <= 0 {
        return 0;
    }
    (sigma_s * BILATERAL_WINDOW_SIGMAS * scale.x * iterations as f64).ceil() as i32
}

/// First wavelet level actually computed at this render scale.
///
/// `-floor(log2(min(scale.x, scale.y)))`, never negative: a half-scale
/// render skips the finest level.
pub fn start_level_from_render_scale(scale: RenderScale) -> u32 {
    let s = scale.x.min(scale.y);
    if s.is_nan() || s <= 0.0 {
        return 0;
    }
    let level = -(s.log2().floor());
    if level <= 0.0 { 0 } else { level as u32 }
}

/// Number of wavelet levels computed at this render scale.
///
/// `WAVELET_LEVEL_MAX - start_level`, or 0 once the start level reaches
/// the maximum.
pub fn wavelet_max_level(scale: RenderScale) -> u32 {
    WAVELET_LEVEL_MAX.saturating_sub(start_level_from_render_scale(scale))
}

/// Wavelet support: `2^(max_level + 1) - 1`.
pub fn wavelet_support(scale: RenderScale) -> i32 {
    let max_level = wavelet_max_level(scale);
    if max_level == 0 {
        return 0;
    }
    (1i32 << (max_level + 1)) - 1
}
