//! Premultiplied ⇄ unpremultiplied conversion.
//!
//! Kernels see unpremultiplied values in `[0, 1]` kernel space. The
//! adapter divides colour by the premultiplication channel on the way in
//! and multiplies back on the way out, converting integer samples between
//! host range and kernel space.
//!
//! The way back stops at host range: the compositor blends
//! `max`-scaled values, not normalised ones.
//!
//! ```rust
//! use ofx_ops::premult::PremultAdapter;
//!
//! let adapter = PremultAdapter::new(true, 3);
//! let unp = adapter.unpremultiply(Some(&[0.25f32, 0.5, 0.0, 0.5][..]), 4);
//! assert_eq!(unp, [0.5, 1.0, 0.0, 0.5]);
//! assert_eq!(adapter.premultiply(&unp, 4, 1.0), [0.25, 0.5, 0.0, 0.5]);
//! ```

use ofx_core::Sample;

/// Conversion settings for one render call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PremultAdapter {
    premultiplied: bool,
    channel: usize,
}

impl PremultAdapter {
    /// Adapter dividing by `channel` when `premultiplied`.
    pub const fn new(premultiplied: bool, channel: usize) -> Self {
        Self {
            premultiplied,
            channel,
        }
    }

    /// Adapter that only normalises.
    pub const fn passthrough() -> Self {
        Self::new(false, 3)
    }

    /// Whether division applies to a pixel of `n` components.
    #[inline]
    fn active(&self, n: usize) -> bool {
        self.premultiplied && n == 4 && self.channel < 4
    }

    /// Unpremultiplied, normalised copy of a host pixel.
    ///
    /// The first `n` entries of the result are meaningful. A missing pixel
    /// (outside the image, disconnected input) gives zeros. Alpha at or
    /// below `f32::EPSILON` leaves colour undivided.
    #[inline]
    pub fn unpremultiply<T: Sample>(&self, px: Option<&[T]>, n: usize) -> [f32; 4] {
        let mut out = [0.0f32; 4];
        let Some(px) = px else {
            return out;
        };
        for c in 0..n {
            out[c] = px[c].to_unit();
        }
        if self.active(n) {
            let alpha = out[self.channel];
            if alpha > f32::EPSILON {
                for v in &mut out[..3] {
                    *v /= alpha;
                }
            }
        }
        out
    }

    /// Premultiplies a kernel-space pixel and scales it to host range.
    #[inline]
    pub fn premultiply(&self, unp: &[f32], n: usize, max_value: f32) -> [f32; 4] {
        let mut out = [0.0f32; 4];
        out[..n].copy_from_slice(&unp[..n]);
        if self.active(n) {
            let alpha = unp[self.channel];
            for v in &mut out[..3] {
                *v *= alpha;
            }
        }
        for v in &mut out[..n] {
            *v *= max_value;
        }
        out
    }
}
