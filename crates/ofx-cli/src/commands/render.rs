//! Render command
//!
//! Loads the raw inputs, quantizes them to the requested depth and runs
//! one effect over the render window, the way a host render call would.

use super::{Effect, load_raw, normalize, parse_rect, pipeline, quantize, save_raw};
use crate::{EffectArgs, RenderArgs};
use anyhow::Result;
use ofx_core::{
    BitDepth, CancellationToken, ChannelLayout, PixelBuffer, PremultState, Rect, RenderScale, Sample,
};
use ofx_ops::RenderArgs as Request;
use ofx_ops::RenderClips;
use ofx_ops::pik::{PikClips, PikKeyer};
use std::path::{Path, PathBuf};
#[allow(unused_imports)]
use tracing::{debug, info, trace, warn};

/// Every image of one render, normalised f32.
struct Inputs {
    bounds: Rect,
    layout: ChannelLayout,
    a: PixelBuffer<f32>,
    b: Option<PixelBuffer<f32>>,
    mask: Option<PixelBuffer<f32>>,
    pfg: Option<PixelBuffer<f32>>,
    clean_plate: Option<PixelBuffer<f32>>,
    bg: Option<PixelBuffer<f32>>,
    inside_mask: Option<PixelBuffer<f32>>,
    outside_mask: Option<PixelBuffer<f32>>,
}

impl Inputs {
    fn load(args: &RenderArgs, bounds: Rect, scale: RenderScale) -> Result<Self> {
        let layout = ChannelLayout::from(args.layout);
        let mask_layout = ChannelLayout::from(args.mask_layout);
        let load = |path: &Path, layout: ChannelLayout| -> Result<PixelBuffer<f32>> {
            let img = load_raw(path, bounds, layout)?.with_render_scale(scale);
            Ok(if args.straight && layout.has_alpha() {
                img.with_premult(PremultState::UnPremultiplied)
            } else {
                img
            })
        };
        let opt = |path: &Option<PathBuf>, layout: ChannelLayout| {
            path.as_deref().map(|p| load(p, layout)).transpose()
        };
        Ok(Self {
            bounds,
            layout,
            a: load(&args.input, layout)?,
            b: opt(&args.b, layout)?,
            mask: opt(&args.mask, mask_layout)?,
            pfg: opt(&args.pfg, layout)?,
            clean_plate: opt(&args.clean_plate, layout)?,
            bg: opt(&args.bg, layout)?,
            inside_mask: opt(&args.inside_mask, mask_layout)?,
            outside_mask: opt(&args.outside_mask, mask_layout)?,
        })
    }

    fn has_keyer_inputs(&self) -> bool {
        self.pfg.is_some()
            || self.clean_plate.is_some()
            || self.bg.is_some()
            || self.inside_mask.is_some()
            || self.outside_mask.is_some()
    }
}

pub fn run(args: RenderArgs, verbose: u8) -> Result<()> {
    trace!(input = %args.input.display(), effect = ?args.effect.effect, "render::run");

    let effect = Effect::load(&args.effect)?;
    let bounds = Rect::from_size(args.width, args.height);
    let scale = RenderScale::new(args.effect.scale, args.effect.scale);
    let window = match &args.window {
        Some(w) => parse_rect(w)?,
        None => bounds,
    };
    let request = Request::new(window).with_scale(scale).with_time(args.time);
    let inputs = Inputs::load(&args, bounds, scale)?;

    let is_pik = matches!(effect, Effect::Pik(_));
    if !is_pik && inputs.has_keyer_inputs() {
        warn!("keyer inputs are ignored by {:?}", args.effect.effect);
    }
    if is_pik && (inputs.b.is_some() || inputs.mask.is_some()) {
        warn!("--b and --mask are ignored by the keyer");
    }

    let depth = BitDepth::from(args.depth);
    info!(effect = ?args.effect.effect, %window, %scale, ?depth, "Rendering");
    if verbose > 0 {
        println!(
            "Rendering {:?} over {} at scale {} ({:?}) from {}",
            args.effect.effect,
            window,
            scale,
            depth,
            args.input.display()
        );
    }

    let out = match depth {
        BitDepth::U8 => render_at::<u8>(&effect, &args.effect, &request, &inputs)?,
        BitDepth::U16 => render_at::<u16>(&effect, &args.effect, &request, &inputs)?,
        BitDepth::F32 => render_at::<f32>(&effect, &args.effect, &request, &inputs)?,
    };
    save_raw(&args.output, &out)?;

    if verbose > 0 {
        println!("Done.");
    }
    Ok(())
}

fn quantize_opt<T: Sample>(img: &Option<PixelBuffer<f32>>) -> Result<Option<PixelBuffer<T>>> {
    img.as_ref().map(quantize::<T>).transpose()
}

/// One render at depth `T`, returned normalised.
fn render_at<T: Sample>(
    effect: &Effect,
    fx: &EffectArgs,
    request: &Request,
    inputs: &Inputs,
) -> Result<PixelBuffer<f32>> {
    let a = quantize::<T>(&inputs.a)?;
    let mut dst = PixelBuffer::<T>::new(inputs.bounds, inputs.layout).with_render_scale(request.scale);
    let cancel = CancellationToken::new();

    let b = quantize_opt::<T>(&inputs.b)?;
    let mask = quantize_opt::<T>(&inputs.mask)?;
    let mut clips = RenderClips::new(inputs.bounds, Some(&a));
    if let Some(b) = &b {
        clips = clips.with_b(b);
    }
    if let Some(m) = &mask {
        clips = clips.with_mask(m);
    }
    let masked = mask.is_some();

    match effect {
        Effect::Bilateral(k) => pipeline(*k, fx, masked)?.render(request, &clips, &mut dst, &cancel)?,
        Effect::Wavelet(k) => pipeline(*k, fx, masked)?.render(request, &clips, &mut dst, &cancel)?,
        Effect::HueRemap(k) => pipeline(k.clone(), fx, masked)?.render(request, &clips, &mut dst, &cancel)?,
        Effect::Pik(keyer) => key(keyer, request, inputs, &a, &mut dst, &cancel)?,
    }
    normalize(&dst)
}

fn key<T: Sample>(
    keyer: &PikKeyer,
    request: &Request,
    inputs: &Inputs,
    fg: &PixelBuffer<T>,
    dst: &mut PixelBuffer<T>,
    cancel: &CancellationToken,
) -> Result<()> {
    let pfg = quantize_opt::<T>(&inputs.pfg)?;
    let c = quantize_opt::<T>(&inputs.clean_plate)?;
    let bg = quantize_opt::<T>(&inputs.bg)?;
    let inside = quantize_opt::<T>(&inputs.inside_mask)?;
    let outside = quantize_opt::<T>(&inputs.outside_mask)?;

    let mut clips = PikClips::new(inputs.bounds, Some(fg));
    if let Some(img) = &pfg {
        clips = clips.with_pfg(img);
    }
    if let Some(img) = &c {
        clips = clips.with_clean_plate(img);
    }
    if let Some(img) = &bg {
        clips = clips.with_bg(img);
    }
    if let Some(img) = &inside {
        clips = clips.with_inside_mask(img);
    }
    if let Some(img) = &outside {
        clips = clips.with_outside_mask(img);
    }
    keyer.render(request, &clips, dst, cancel)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DepthArg, EffectKind, LayoutArg};

    fn effect_args(effect: EffectKind, params: Option<PathBuf>) -> EffectArgs {
        EffectArgs {
            effect,
            params,
            guided: false,
            scale: 1.0,
            mix: 1.0,
            mask_invert: false,
            channels: "rgba".into(),
        }
    }

    fn render_args(effect: EffectArgs, input: PathBuf, output: PathBuf, w: usize, h: usize) -> RenderArgs {
        RenderArgs {
            effect,
            input,
            output,
            width: w,
            height: h,
            layout: LayoutArg::Rgba,
            mask_layout: LayoutArg::Alpha,
            depth: DepthArg::F32,
            window: None,
            time: 0.0,
            straight: false,
            b: None,
            mask: None,
            pfg: None,
            clean_plate: None,
            bg: None,
            inside_mask: None,
            outside_mask: None,
        }
    }

    #[test]
    fn test_render_bilateral_constant() {
        let dir = tempfile::tempdir().unwrap();
        let bounds = Rect::new(0, 0, 8, 6);
        let input = dir.path().join("in.raw");
        let output = dir.path().join("out.raw");
        save_raw(&input, &PixelBuffer::filled(bounds, ChannelLayout::Rgba, &[0.25f32, 0.5, 0.75, 1.0])).unwrap();

        let args = render_args(effect_args(EffectKind::Bilateral, None), input, output.clone(), 8, 6);
        run(args, 0).unwrap();

        let out = load_raw(&output, bounds, ChannelLayout::Rgba).unwrap();
        for (v, e) in out.pixel(4, 3).unwrap().iter().zip([0.25, 0.5, 0.75, 1.0]) {
            assert!((v - e).abs() < 1e-5);
        }
    }

    #[test]
    fn test_render_pik_u16_with_window() {
        let dir = tempfile::tempdir().unwrap();
        let bounds = Rect::new(0, 0, 4, 4);
        let fg = dir.path().join("fg.raw");
        let c = dir.path().join("c.raw");
        let output = dir.path().join("key.raw");
        save_raw(&fg, &PixelBuffer::filled(bounds, ChannelLayout::Rgba, &[0.2f32, 0.8, 0.2, 1.0])).unwrap();
        save_raw(&c, &PixelBuffer::filled(bounds, ChannelLayout::Rgba, &[0.05f32, 0.9, 0.05, 1.0])).unwrap();

        let mut args = render_args(effect_args(EffectKind::Pik, None), fg, output.clone(), 4, 4);
        args.clean_plate = Some(c);
        args.depth = DepthArg::U16;
        args.window = Some("1,1,3,3".into());
        run(args, 0).unwrap();

        let out = load_raw(&output, bounds, ChannelLayout::Rgba).unwrap();
        assert!((out.pixel(2, 2).unwrap()[3] - 0.294).abs() < 1e-3);
        assert_eq!(out.pixel(0, 0).unwrap()[3], 0.0);
    }

    #[test]
    fn test_render_pik_without_clean_plate_fails() {
        let dir = tempfile::tempdir().unwrap();
        let fg = dir.path().join("fg.raw");
        save_raw(&fg, &PixelBuffer::filled(Rect::new(0, 0, 2, 2), ChannelLayout::Rgba, &[0.2f32, 0.8, 0.2, 1.0]))
            .unwrap();
        let args = render_args(effect_args(EffectKind::Pik, None), fg, dir.path().join("o.raw"), 2, 2);
        let err = run(args, 0).unwrap_err();
        assert!(format!("{err:#}").contains("C"));
    }

    #[test]
    fn test_render_hue_remap_with_mask() {
        let dir = tempfile::tempdir().unwrap();
        let bounds = Rect::new(0, 0, 2, 1);
        let input = dir.path().join("in.raw");
        let mask = dir.path().join("m.raw");
        let preset = dir.path().join("grey.json");
        let output = dir.path().join("out.raw");
        save_raw(&input, &PixelBuffer::filled(bounds, ChannelLayout::Rgba, &[0.8f32, 0.2, 0.2, 1.0])).unwrap();
        let mut m = PixelBuffer::new(bounds, ChannelLayout::Alpha);
        m.set_pixel(1, 0, &[1.0f32]);
        save_raw(&mask, &m).unwrap();
        std::fs::write(&preset, r#"{ "curves": { "curves": [[{"x": 1.0, "y": 0.0}], [], [], [], [], [], [], [], []] } }"#)
            .unwrap();

        let mut args = render_args(effect_args(EffectKind::HueRemap, Some(preset)), input, output.clone(), 2, 1);
        args.mask = Some(mask);
        run(args, 0).unwrap();

        let out = load_raw(&output, bounds, ChannelLayout::Rgba).unwrap();
        let kept = out.pixel(0, 0).unwrap();
        assert!((kept[0] - 0.8).abs() < 1e-5);
        let grey = out.pixel(1, 0).unwrap();
        assert!((grey[0] - grey[1]).abs() < 1e-5);
    }
}
