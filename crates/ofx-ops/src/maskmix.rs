//! Mask / mix compositing.
//!
//! Blends a computed pixel into the background (the unprocessed source)
//! under a scalar mix and an optional mask:
//!
//! ```text
//! alpha  = do_mask ? (invert ? 1 - m : m) * mix : mix
//! out[c] = bg ? tmp[c] * alpha + bg[c] * (1 - alpha) : tmp[c] * alpha
//! ```
//!
//! `tmp` and `bg` are in host range (`[0, 255]` for bytes). Integer outputs
//! clamp to `[0, max]`, float outputs pass through. The compositor never
//! allocates and cannot fail.
//!
//! # Example
//!
//! ```rust
//! use ofx_ops::maskmix::{MaskMixCompositor, MaskMixParams};
//!
//! let comp = MaskMixCompositor::<u8>::new(MaskMixParams::default(), None);
//! let mut dst = [0u8; 3];
//! comp.composite(&[300.0, -10.0, 128.0], None, 0, 0, &mut dst);
//! assert_eq!(dst, [255, 0, 128]);
//! ```

use ofx_core::{PixelBuffer, Rect, Sample};

/// Per-render mask and mix settings.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MaskMixParams {
    /// Amount of the effect, `0` keeps the source.
    pub mix: f32,
    /// Use `1 - m` instead of `m`.
    pub mask_invert: bool,
    /// Apply the mask clip.
    pub do_mask: bool,
}

impl Default for MaskMixParams {
    fn default() -> Self {
        Self {
            mix: 1.0,
            mask_invert: false,
            do_mask: false,
        }
    }
}

impl MaskMixParams {
    /// Whether these settings leave the source untouched inside `window`,
    /// given the mask's region of definition.
    pub fn is_identity(&self, window: Rect, mask_rod: Option<Rect>) -> bool {
        if self.mix == 0.0 {
            return true;
        }
        match mask_rod {
            Some(rod) if self.do_mask && !self.mask_invert => !rod.intersects(&window),
            _ => false,
        }
    }
}

/// Mask/mix compositor bound to one render call.
#[derive(Debug, Clone, Copy)]
pub struct MaskMixCompositor<'a, T: Sample> {
    params: MaskMixParams,
    mask: Option<&'a PixelBuffer<T>>,
}

impl<'a, T: Sample> MaskMixCompositor<'a, T> {
    /// Creates a compositor. `mask` is ignored unless `params.do_mask`.
    pub fn new(params: MaskMixParams, mask: Option<&'a PixelBuffer<T>>) -> Self {
        let mask = if params.do_mask { mask } else { None };
        Self { params, mask }
    }

    /// Returns `true` when no blending happens: full mix, no mask.
    #[inline]
    pub fn is_passthrough(&self) -> bool {
        self.mask.is_none() && self.params.mix == 1.0
    }

    /// Blend factor at `(x, y)`.
    ///
    /// The mask value is the last component of the mask pixel, normalised;
    /// outside the mask bounds it is 0.
    #[inline]
    pub fn alpha_at(&self, x: i32, y: i32) -> f32 {
        let Some(mask) = self.mask else {
            return self.params.mix;
        };
        let m = mask
            .pixel(x, y)
            .and_then(|px| px.last())
            .map_or(0.0, |v| v.to_unit());
        let m = if self.params.mask_invert { 1.0 - m } else { m };
        m * self.params.mix
    }

    /// Composites one pixel of `dst.len()` components.
    #[inline]
    pub fn composite(&self, tmp: &[f32], bg: Option<&[T]>, x: i32, y: i32, dst: &mut [T]) {
        mask_mix(tmp, bg, self.alpha_at(x, y), dst);
    }
}

/// Blends `tmp` over `bg` with a precomputed `alpha`.
#[inline]
pub fn mask_mix<T: Sample>(tmp: &[f32], bg: Option<&[T]>, alpha: f32, dst: &mut [T]) {
    match bg {
        Some(bg) => {
            for (c, d) in dst.iter_mut().enumerate() {
                *d = T::from_f32(tmp[c] * alpha + bg[c].to_f32() * (1.0 - alpha));
            }
        }
        None => {
            for (c, d) in dst.iter_mut().enumerate() {
                *d = T::from_f32(tmp[c] * alpha);
            }
        }
    }
}
