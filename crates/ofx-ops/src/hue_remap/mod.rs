//! Hue-dependent colour remap.
//!
//! Every pixel is placed on the hue circle and nine curves of hue drive
//! the correction:
//!
//! 1. channel suppression (`r_sup`, `g_sup`, `b_sup`) pulls a dominant
//!    channel down towards the smaller of the other two
//! 2. per-channel and luminance gains (`red`, `green`, `blue`, `lum`)
//! 3. saturation (`sat`) as a lerp towards luminance
//!
//! Gains and saturation fade in with the pixel's saturation up to the
//! `sat_thrsh` curve, so near-grey pixels are protected. A luminance mix
//! finally restores part of the source luminance.
//!
//! Curves come from any [`ParametricCurve`] and are sampled into LUTs once
//! per render.
//!
//! # Example
//!
//! ```rust
//! use ofx_ops::hue_remap::{CurveLuts, HueCurves, HueRemapParams, RemapCurve, remap_pixel};
//!
//! let curves = HueCurves::new().with_constant(RemapCurve::Sat, 0.0);
//! let luts = CurveLuts::sample(&curves, 0.0);
//! let grey = remap_pixel(&luts, &HueRemapParams::default(), [0.8, 0.2, 0.2]);
//! assert!((grey[0] - grey[2]).abs() < 1e-5);
//! ```

mod apply;
mod types;

pub use apply::{CurveLuts, LUT_SIZE, hue_coordinate, remap_pixel};
pub use types::{CurvePoint, HUE_MAX, HUE_MIN, HueCurves, HueRemapParams, ParametricCurve, RemapCurve};

use crate::planar::PlanarImage;
use crate::processor::{KernelContext, PixelKernel};
use crate::OpsResult;
use ofx_core::ChannelLayout;
use rayon::prelude::*;
#[allow(unused_imports)]
use tracing::{debug, trace};

/// Hue remap kernel over a set of curves.
#[derive(Debug, Clone)]
pub struct HueRemapKernel<C = HueCurves> {
    curves: C,
    params: HueRemapParams,
}

impl<C: ParametricCurve> HueRemapKernel<C> {
    /// Creates the kernel.
    pub fn new(curves: C, params: HueRemapParams) -> Self {
        Self { curves, params }
    }

    /// Curves.
    pub fn curves(&self) -> &C {
        &self.curves
    }

    /// Parameters.
    pub fn params(&self) -> &HueRemapParams {
        &self.params
    }
}

impl<C: ParametricCurve> PixelKernel for HueRemapKernel<C> {
    fn name(&self) -> &'static str {
        "hue-remap"
    }

    fn supports_layout(&self, layout: ChannelLayout) -> bool {
        layout.has_color()
    }

    fn process(&self, ctx: &KernelContext<'_>, a: &mut PlanarImage, _b: Option<&PlanarImage>) -> OpsResult<()> {
        let w = a.width();
        if w == 0 {
            return Ok(());
        }
        let luts = CurveLuts::sample(&self.curves, ctx.time);
        trace!(w, h = a.height(), time = ctx.time, "hue remap");

        let params = &self.params;
        let cancel = ctx.cancel;
        if let [r, g, b, ..] = a.planes_mut() {
            r.par_chunks_mut(w)
                .zip(g.par_chunks_mut(w))
                .zip(b.par_chunks_mut(w))
                .for_each(|((r, g), b)| {
                    if cancel.is_cancelled() {
                        return;
                    }
                    for i in 0..r.len() {
                        [r[i], g[i], b[i]] = remap_pixel(&luts, params, [r[i], g[i], b[i]]);
                    }
                });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::{IdentityResult, RenderArgs, RenderClips, RenderPipeline};
    use ofx_core::{CancellationToken, PixelBuffer, Rect, RenderScale};

    /// Curves that vary over time.
    struct Animated;

    impl ParametricCurve for Animated {
        fn value(&self, curve: RemapCurve, time: f64, _x: f64) -> f64 {
            match curve {
                RemapCurve::Lum => 1.0 + time,
                _ => curve.default_value(),
            }
        }
    }

    #[test]
    fn test_never_identity_from_parameters() {
        let k = HueRemapKernel::new(HueCurves::new(), HueRemapParams::default());
        assert_eq!(k.is_identity(RenderScale::FULL), IdentityResult::NotIdentity);
    }

    #[test]
    fn test_rejects_alpha_layout() {
        let bounds = Rect::new(0, 0, 2, 2);
        let src: PixelBuffer<f32> = PixelBuffer::new(bounds, ChannelLayout::Alpha);
        let mut dst: PixelBuffer<f32> = PixelBuffer::new(bounds, ChannelLayout::Alpha);
        let err = RenderPipeline::new(HueRemapKernel::new(HueCurves::new(), HueRemapParams::default()))
            .render(&RenderArgs::new(bounds), &RenderClips::new(bounds, Some(&src)), &mut dst, &CancellationToken::new())
            .unwrap_err();
        assert_eq!(err.status(), ofx_core::StatusCode::ErrImageFormat);
    }

    #[test]
    fn test_curves_sampled_at_render_time() {
        let bounds = Rect::new(0, 0, 3, 2);
        let src = PixelBuffer::filled(bounds, ChannelLayout::Rgba, &[0.2f32, 0.1, 0.1, 1.0]);
        let mut dst = PixelBuffer::new(bounds, ChannelLayout::Rgba);
        let args = RenderArgs::new(bounds).with_time(1.0);
        RenderPipeline::new(HueRemapKernel::new(Animated, HueRemapParams::default()))
            .render(&args, &RenderClips::new(bounds, Some(&src)), &mut dst, &CancellationToken::new())
            .unwrap();
        let px = dst.pixel(2, 1).unwrap();
        assert!((px[0] - 0.4).abs() < 1e-5);
        assert!((px[3] - 1.0).abs() < 1e-6);
    }
}
