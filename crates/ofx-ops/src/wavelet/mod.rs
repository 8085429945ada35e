//! À-trous wavelet denoiser with adaptive thresholding.
//!
//! Each channel is decomposed into detail levels by repeated hat
//! smoothing with a doubling stride. Every level's detail is soft
//! thresholded against an estimate of the noise at that level, optionally
//! sharpened, and summed back with the final low-pass.
//!
//! # Noise estimate
//!
//! - **Adaptive**: the low-pass intensity is split into five buckets and
//!   the deviation of small details is measured per bucket, so shadows and
//!   highlights get their own threshold.
//! - **Fixed**: the deviation of unit white noise at that level.
//!
//! # Render scale
//!
//! A proxy render skips the finest levels: at scale 1/2 the first
//! computed level is full-resolution level 1. Once every level is
//! skipped the kernel is an identity.
//!
//! # Example
//!
//! ```rust
//! use ofx_core::RenderScale;
//! use ofx_ops::processor::{IdentityResult, PixelKernel};
//! use ofx_ops::wavelet::{WaveletKernel, WaveletParams};
//!
//! let k = WaveletKernel::new(WaveletParams::uniform(1.5, 0.1));
//! assert_eq!(k.support(RenderScale::FULL), 31);
//! assert_eq!(k.is_identity(RenderScale::new(1.0 / 16.0, 1.0 / 16.0)), IdentityResult::IdentityA);
//! ```

mod apply;
mod types;

pub use apply::{adaptive_limit, bucket, bucket_sigmas, from_model, hat_row, sharpen_gain, soft_threshold, to_model};
pub use types::{ADAPTIVE_BUCKETS, ChannelSettings, ColorModel, LevelRange, NOISE_LEVELS, WaveletParams};

use crate::boundary::TileBoundaryPolicy;
use crate::planar::PlanarImage;
use crate::processor::{IdentityResult, KernelContext, PixelKernel};
use crate::region::{start_level_from_render_scale, wavelet_max_level, wavelet_support};
use crate::OpsResult;
use ofx_core::{ChannelLayout, RenderScale};
use rayon::prelude::*;
#[allow(unused_imports)]
use tracing::{debug, trace};

/// Wavelet denoise kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveletKernel {
    params: WaveletParams,
}

impl WaveletKernel {
    /// Creates the kernel.
    pub fn new(params: WaveletParams) -> Self {
        Self { params }
    }

    /// Parameters.
    pub fn params(&self) -> &WaveletParams {
        &self.params
    }

    /// Levels computed at `scale`.
    pub fn levels(scale: RenderScale) -> LevelRange {
        LevelRange {
            start: start_level_from_render_scale(scale),
            count: wavelet_max_level(scale),
        }
    }

    /// Index into the parameter arrays for plane `c` of `layout`.
    fn param_index(layout: ChannelLayout, c: usize) -> usize {
        match layout {
            ChannelLayout::Alpha => 3,
            _ => c,
        }
    }

    fn convert(&self, a: &mut PlanarImage, forward: bool) {
        let model = self.params.color_model;
        if model == ColorModel::LinearRgb {
            return;
        }
        if let [r, g, b, ..] = a.planes_mut() {
            r.par_iter_mut()
                .zip(g.par_iter_mut())
                .zip(b.par_iter_mut())
                .for_each(|((r, g), b)| {
                    let v = [*r, *g, *b];
                    [*r, *g, *b] = if forward { to_model(model, v) } else { from_model(model, v) };
                });
        }
    }
}

impl PixelKernel for WaveletKernel {
    fn name(&self) -> &'static str {
        "wavelet-denoise"
    }

    fn boundary(&self) -> TileBoundaryPolicy {
        TileBoundaryPolicy::Mirror
    }

    fn support(&self, scale: RenderScale) -> i32 {
        wavelet_support(scale)
    }

    fn is_identity(&self, scale: RenderScale) -> IdentityResult {
        if wavelet_max_level(scale) == 0 || self.params.is_noop() {
            IdentityResult::IdentityA
        } else {
            IdentityResult::NotIdentity
        }
    }

    fn process(&self, ctx: &KernelContext<'_>, a: &mut PlanarImage, _b: Option<&PlanarImage>) -> OpsResult<()> {
        let levels = Self::levels(ctx.scale);
        if levels.count == 0 || self.params.is_noop() {
            return Ok(());
        }
        let (w, h) = (a.width(), a.height());
        let color = ctx.layout.has_color();
        trace!(w, h, ?levels, model = ?self.params.color_model, "wavelet denoise");

        if color {
            self.convert(a, true);
        }
        let radius = self.params.radius as f32;
        for c in 0..a.components() {
            let settings = self.params.channel(Self::param_index(ctx.layout, c));
            let selected = if color && c < 3 { ctx.channels.any(3) } else { ctx.channels.contains(c) };
            if settings.is_noop() || !selected {
                continue;
            }
            apply::denoise_plane(ctx, a.plane_mut(c), w, h, settings, levels, self.params.adaptive, radius)?;
            if ctx.cancel.is_cancelled() {
                debug!(channel = c, "wavelet cancelled");
                return Ok(());
            }
        }
        if color {
            self.convert(a, false);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ofx_core::{CancellationToken, ChannelMask, ImageMemory};

    fn run(params: WaveletParams, layout: ChannelLayout, src: &[f32], w: usize, h: usize) -> PlanarImage {
        let (cancel, memory) = (CancellationToken::new(), ImageMemory::unbounded());
        let ctx = KernelContext {
            scale: RenderScale::FULL,
            time: 0.0,
            layout,
            channels: ChannelMask::ALL.for_layout(layout),
            cancel: &cancel,
            memory: &memory,
        };
        let mut img = PlanarImage::from_interleaved(src, w, h, layout.components()).unwrap();
        WaveletKernel::new(params).process(&ctx, &mut img, None).unwrap();
        img
    }

    fn checker(w: usize, h: usize, base: f32, amp: f32) -> Vec<f32> {
        (0..w * h)
            .map(|i| if (i % w + i / w) % 2 == 0 { base + amp } else { base - amp })
            .collect()
    }

    #[test]
    fn test_identity_rules() {
        let k = WaveletKernel::new(WaveletParams::default());
        assert_eq!(k.is_identity(RenderScale::FULL), IdentityResult::IdentityA);
        let k = WaveletKernel::new(WaveletParams::uniform(1.0, 0.0));
        assert_eq!(k.is_identity(RenderScale::FULL), IdentityResult::NotIdentity);
        assert_eq!(k.is_identity(RenderScale::new(0.5, 0.5)), IdentityResult::NotIdentity);
        assert_eq!(k.is_identity(RenderScale::new(1.0 / 16.0, 1.0)), IdentityResult::IdentityA);
    }

    #[test]
    fn test_levels_follow_scale() {
        assert_eq!(WaveletKernel::levels(RenderScale::FULL), LevelRange { start: 0, count: 4 });
        assert_eq!(WaveletKernel::levels(RenderScale::new(0.25, 0.5)), LevelRange { start: 2, count: 2 });
    }

    #[test]
    fn test_adaptive_removes_fine_noise() {
        let src = checker(16, 16, 0.5, 0.02);
        let params = WaveletParams {
            color_model: ColorModel::LinearRgb,
            ..WaveletParams::uniform(3.0, 0.0)
        };
        let img = run(params, ChannelLayout::Alpha, &src, 16, 16);
        assert!(img.plane(0).iter().all(|v| (v - 0.5).abs() < 1e-4));
    }

    #[test]
    fn test_fixed_table_threshold() {
        let src = checker(16, 16, 0.5, 0.02);
        let params = WaveletParams {
            adaptive: false,
            ..WaveletParams::uniform(0.1, 0.0)
        };
        // 0.1 * 0.8002 is well above the 0.02 checker amplitude.
        let img = run(params, ChannelLayout::Alpha, &src, 16, 16);
        assert!(img.plane(0).iter().all(|v| (v - 0.5).abs() < 1e-4));
    }

    #[test]
    fn test_softness_keeps_fraction() {
        let src = checker(16, 16, 0.5, 0.02);
        let params = WaveletParams {
            adaptive: false,
            ..WaveletParams::uniform(0.1, 0.5)
        };
        let img = run(params, ChannelLayout::Alpha, &src, 16, 16);
        assert!((img.sample(0, 0, 0) - 0.51).abs() < 1e-4);
        assert!((img.sample(0, 1, 0) - 0.49).abs() < 1e-4);
    }

    #[test]
    fn test_sharpen_amplifies_detail() {
        let src = checker(16, 16, 0.5, 0.02);
        let params = WaveletParams {
            amount: [1.0; 4],
            radius: 0.0,
            ..Default::default()
        };
        let img = run(params, ChannelLayout::Alpha, &src, 16, 16);
        // Level 0 holds all of the checker and gets a gain of 2.
        assert!((img.sample(0, 0, 0) - 0.54).abs() < 1e-4);
    }

    #[test]
    fn test_colour_models_reconstruct_with_zero_threshold() {
        let src: Vec<f32> = (0..8 * 8 * 3).map(|i| ((i * 13) % 17) as f32 / 16.0).collect();
        for model in [ColorModel::YCbCr, ColorModel::Lab, ColorModel::Rgb] {
            // Only the absent alpha channel is thresholded.
            let params = WaveletParams {
                color_model: model,
                threshold: [0.0, 0.0, 0.0, 1.0],
                ..Default::default()
            };
            let img = run(params, ChannelLayout::Rgb, &src, 8, 8);
            let mut out = vec![0.0; src.len()];
            img.to_interleaved(&mut out).unwrap();
            for (o, s) in out.iter().zip(&src) {
                assert!((o - s).abs() < 1e-3, "{model:?}");
            }
        }
    }

    #[test]
    fn test_alpha_only_uses_alpha_settings() {
        let src = checker(8, 8, 0.5, 0.02);
        let params = WaveletParams {
            adaptive: false,
            threshold: [0.0, 0.0, 0.0, 1.0],
            ..Default::default()
        };
        let img = run(params, ChannelLayout::Alpha, &src, 8, 8);
        assert!(img.plane(0).iter().all(|v| (v - 0.5).abs() < 1e-4));
    }
}
