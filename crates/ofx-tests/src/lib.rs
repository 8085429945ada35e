//! End-to-end tests for the OFX compositing crates.
//!
//! These drive the kernels the way a host does: identity check first,
//! then a render of the window, across depths and crates.

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ofx_color::LuminanceMath;
    use ofx_core::{
        AnyImage, BitDepth, CancellationToken, ChannelLayout, PixelBuffer, Rect, RenderScale, Sample,
    };
    use ofx_ops::bilateral::{BilateralKernel, BilateralParams};
    use ofx_ops::hue_remap::{CurvePoint, HueCurves, HueRemapKernel, HueRemapParams, RemapCurve};
    use ofx_ops::maskmix::mask_mix;
    use ofx_ops::pik::{OutputMode, PikClips, PikKeyer, PikParams, ReplaceMode};
    use ofx_ops::wavelet::{WaveletKernel, WaveletParams};
    use ofx_ops::{IdentityResult, PixelKernel, RenderArgs, RenderClips, RenderPipeline};

    /// What a host does with one render request: copy the passed-through
    /// input when the effect is an identity, render otherwise.
    fn host_render<K: PixelKernel, T: Sample>(
        pipeline: &RenderPipeline<K>,
        args: &RenderArgs,
        clips: &RenderClips<'_, T>,
        dst: &mut PixelBuffer<T>,
    ) -> IdentityResult {
        let mask_rod = clips.mask.fetch().map(|m| m.bounds());
        let identity = pipeline.is_identity(args.window, args.scale, mask_rod);
        let source = match identity {
            IdentityResult::NotIdentity => {
                pipeline.render(args, clips, dst, &CancellationToken::new()).unwrap();
                return identity;
            }
            IdentityResult::IdentityA => clips.a.fetch(),
            IdentityResult::IdentityB => clips.b.fetch(),
        };
        let src = source.unwrap();
        for y in args.window.rows() {
            for x in args.window.x1..args.window.x2 {
                dst.set_pixel(x, y, src.pixel(x, y).unwrap());
            }
        }
        identity
    }

    fn green_screen(bounds: Rect) -> (PixelBuffer<f32>, PixelBuffer<f32>) {
        (
            PixelBuffer::filled(bounds, ChannelLayout::Rgba, &[0.2, 0.8, 0.2, 1.0]),
            PixelBuffer::filled(bounds, ChannelLayout::Rgba, &[0.05, 0.9, 0.05, 1.0]),
        )
    }

    /// 4x4 green screen against its clean plate keys to 1 - 0.6 / 0.85.
    #[test]
    fn test_scenario_green_screen_key() {
        let bounds = Rect::new(0, 0, 4, 4);
        let (fg, c) = green_screen(bounds);
        let mut dst = PixelBuffer::new(bounds, ChannelLayout::Rgba);
        let params = PikParams {
            red_weight: 0.5,
            blue_green_weight: 0.5,
            ..Default::default()
        };
        PikKeyer::new(params)
            .render(
                &RenderArgs::new(bounds),
                &PikClips::new(bounds, Some(&fg)).with_clean_plate(&c),
                &mut dst,
                &CancellationToken::new(),
            )
            .unwrap();
        let expected = 1.0 - 0.6 / 0.85;
        for px in dst.data().chunks_exact(4) {
            assert_abs_diff_eq!(px[3], expected, epsilon = 1e-4);
        }
    }

    /// Zero spatial sigma is an identity: the host copies A bit for bit.
    #[test]
    fn test_scenario_bilateral_zero_sigma() {
        let bounds = Rect::new(0, 0, 5, 3);
        let mut src = PixelBuffer::new(bounds, ChannelLayout::Rgba);
        for y in bounds.rows() {
            for x in 0..5 {
                let v = (x * 3 + y) as f32 * 0.037;
                src.set_pixel(x, y, &[v, 1.0 - v, v * 0.5, 0.75]);
            }
        }
        let pipeline = RenderPipeline::new(BilateralKernel::new(BilateralParams {
            sigma_s: 0.0,
            sigma_r: 0.3,
            iterations: 1,
        }));
        let mut dst = PixelBuffer::new(bounds, ChannelLayout::Rgba);
        let identity = host_render(&pipeline, &RenderArgs::new(bounds), &RenderClips::new(bounds, Some(&src)), &mut dst);
        assert_eq!(identity, IdentityResult::IdentityA);
        assert_eq!(dst.data(), src.data());
    }

    /// Zero threshold and amount leave the image unchanged.
    #[test]
    fn test_scenario_wavelet_noop() {
        let bounds = Rect::new(0, 0, 16, 16);
        let mut src = PixelBuffer::new(bounds, ChannelLayout::Rgb);
        for y in bounds.rows() {
            for x in 0..16 {
                let v = ((x * 7 + y * 13) % 17) as f32 / 17.0;
                src.set_pixel(x, y, &[v, 0.5, 1.0 - v]);
            }
        }
        let params = WaveletParams {
            threshold: [0.0; 4],
            amount: [0.0; 4],
            ..Default::default()
        };
        let pipeline = RenderPipeline::new(WaveletKernel::new(params));
        let mut dst = PixelBuffer::new(bounds, ChannelLayout::Rgb);
        let identity = host_render(&pipeline, &RenderArgs::new(bounds), &RenderClips::new(bounds, Some(&src)), &mut dst);
        assert_eq!(identity, IdentityResult::IdentityA);
        assert_eq!(dst.data(), src.data());

        // Rendering anyway reconstructs the input.
        let mut rendered = PixelBuffer::new(bounds, ChannelLayout::Rgb);
        pipeline
            .render(&RenderArgs::new(bounds), &RenderClips::new(bounds, Some(&src)), &mut rendered, &CancellationToken::new())
            .unwrap();
        for (r, s) in rendered.data().iter().zip(src.data()) {
            assert_abs_diff_eq!(*r, *s, epsilon = 1e-4);
        }
    }

    /// 8-bit targets clamp and round the composited value.
    #[test]
    fn test_scenario_mask_mix_u8_clamps() {
        let mut dst = [0u8; 3];
        mask_mix(&[300.0, -10.0, 128.0], None::<&[u8]>, 1.0, &mut dst);
        assert_eq!(dst, [255, 0, 128]);

        let bg = [10u8, 20, 30];
        mask_mix(&[300.0, -10.0, 128.0], Some(&bg[..]), 1.0, &mut dst);
        assert_eq!(dst, [255, 0, 128]);
    }

    #[test]
    fn test_key_same_at_every_depth() {
        let bounds = Rect::new(0, 0, 3, 2);
        let (fg, c) = green_screen(bounds);
        let keyer = PikKeyer::new(PikParams {
            output_mode: OutputMode::CombinedMatte,
            ..Default::default()
        });

        fn key<T: Sample>(keyer: &PikKeyer, bounds: Rect, fg: &PixelBuffer<f32>, c: &PixelBuffer<f32>) -> f32 {
            let q = |img: &PixelBuffer<f32>| {
                let data = img.data().iter().map(|&v| T::from_unit(v)).collect();
                PixelBuffer::<T>::from_vec(bounds, img.layout(), data).unwrap()
            };
            let (fg, c) = (q(fg), q(c));
            let mut dst = PixelBuffer::<T>::new(bounds, ChannelLayout::Rgba);
            keyer
                .render(
                    &RenderArgs::new(bounds),
                    &PikClips::new(bounds, Some(&fg)).with_clean_plate(&c),
                    &mut dst,
                    &CancellationToken::new(),
                )
                .unwrap();
            dst.pixel(2, 1).unwrap()[3].to_unit()
        }

        let f = key::<f32>(&keyer, bounds, &fg, &c);
        assert_abs_diff_eq!(key::<u16>(&keyer, bounds, &fg, &c), f, epsilon = 1e-3);
        assert_abs_diff_eq!(key::<u8>(&keyer, bounds, &fg, &c), f, epsilon = 1e-2);
    }

    #[test]
    fn test_key_composite_over_background() {
        let bounds = Rect::new(0, 0, 2, 2);
        let (fg, c) = green_screen(bounds);
        let bg = PixelBuffer::filled(bounds, ChannelLayout::Rgba, &[0.0f32, 0.0, 1.0, 1.0]);
        let keyer = PikKeyer::new(PikParams {
            output_mode: OutputMode::Composite,
            screen_replace: ReplaceMode::None,
            ..Default::default()
        });
        let mut dst = PixelBuffer::new(bounds, ChannelLayout::Rgba);
        keyer
            .render(
                &RenderArgs::new(bounds),
                &PikClips::new(bounds, Some(&fg)).with_clean_plate(&c).with_bg(&bg),
                &mut dst,
                &CancellationToken::new(),
            )
            .unwrap();
        let px = dst.pixel(1, 1).unwrap();
        let alpha = 1.0 - 0.6 / 0.85;
        // Despilled blue plus the background through the transparent part.
        assert_abs_diff_eq!(px[2], 0.2 - 0.05 * (1.0 - alpha) + (1.0 - alpha), epsilon = 1e-4);
        assert_abs_diff_eq!(px[3], 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_key_preset_from_json() {
        let params: PikParams = serde_json::from_str(
            r#"{ "screen_type": "pick", "pick_color": [0.05, 0.9, 0.05], "output_mode": "screen_matte" }"#,
        )
        .unwrap();
        assert!(!params.needs_clean_plate());
        let bounds = Rect::new(0, 0, 2, 2);
        let (fg, _) = green_screen(bounds);
        let mut dst = PixelBuffer::new(bounds, ChannelLayout::Rgba);
        PikKeyer::new(params)
            .render(&RenderArgs::new(bounds), &PikClips::new(bounds, Some(&fg)), &mut dst, &CancellationToken::new())
            .unwrap();
        assert_abs_diff_eq!(dst.pixel(0, 0).unwrap()[0], 1.0 - 0.6 / 0.85, epsilon = 1e-4);
    }

    #[test]
    fn test_hue_remap_any_depth() {
        let bounds = Rect::new(0, 0, 4, 4);
        let curves = HueCurves::new().with(
            RemapCurve::Lum,
            vec![CurvePoint::new(1.0, 0.5), CurvePoint::new(2.0, 1.0), CurvePoint::new(6.0, 1.0)],
        );
        let params = HueRemapParams {
            luminance_math: LuminanceMath::Rec709,
            luminance_mix: 0.0,
        };
        let pipeline = RenderPipeline::new(HueRemapKernel::new(curves, params));
        let src = AnyImage::U8(PixelBuffer::filled(bounds, ChannelLayout::Rgba, &[200u8, 0, 0, 255]));
        let mut dst = AnyImage::new(BitDepth::U8, bounds, ChannelLayout::Rgba);
        pipeline
            .render_any(&RenderArgs::new(bounds), bounds, &mut dst, Some(&src), None, None, &CancellationToken::new())
            .unwrap();
        let out = dst.downcast_ref::<u8>().unwrap();
        assert_eq!(out.pixel(3, 3).unwrap(), &[100, 0, 0, 255]);
    }

    #[test]
    fn test_proxy_render_of_wavelet_skips_fine_level() {
        let bounds = Rect::new(0, 0, 16, 16);
        let half = RenderScale::new(0.5, 0.5);
        let kernel = WaveletKernel::new(WaveletParams::uniform(0.1, 0.0));
        assert!(kernel.support(half) < kernel.support(RenderScale::FULL));
        let src = PixelBuffer::filled(bounds, ChannelLayout::Rgba, &[0.3f32, 0.3, 0.3, 1.0]).with_render_scale(half);
        let mut dst = PixelBuffer::new(bounds, ChannelLayout::Rgba).with_render_scale(half);
        let args = RenderArgs::new(bounds).with_scale(half);
        let identity = host_render(&RenderPipeline::new(kernel), &args, &RenderClips::new(bounds, Some(&src)), &mut dst);
        assert_eq!(identity, IdentityResult::NotIdentity);
        for px in dst.data().chunks_exact(4) {
            assert_abs_diff_eq!(px[0], 0.3, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_guided_bilateral_needs_no_b() {
        let bounds = Rect::new(0, 0, 6, 6);
        let src = PixelBuffer::filled(bounds, ChannelLayout::Rgb, &[0.4f32, 0.4, 0.4]);
        let pipeline = RenderPipeline::new(BilateralKernel::guided(BilateralParams {
            sigma_s: 1.0,
            sigma_r: 0.1,
            iterations: 1,
        }));
        let mut dst = PixelBuffer::new(bounds, ChannelLayout::Rgb);
        host_render(&pipeline, &RenderArgs::new(bounds), &RenderClips::new(bounds, Some(&src)), &mut dst);
        // An absent guide is all zeros: weights are uniform, the flat input stays flat.
        for v in dst.data() {
            assert_abs_diff_eq!(*v, 0.4, epsilon = 1e-5);
        }
    }
}
