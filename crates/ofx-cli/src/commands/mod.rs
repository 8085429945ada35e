//! CLI command implementations

pub mod identity;
pub mod render;
pub mod roi;

use crate::{EffectArgs, EffectKind};
use anyhow::{Context, Result, bail};
use ofx_core::{ChannelLayout, ChannelMask, PixelBuffer, Rect, Sample};
use ofx_ops::bilateral::{BilateralKernel, BilateralParams};
use ofx_ops::hue_remap::{HueCurves, HueRemapKernel, HueRemapParams, RemapCurve};
use ofx_ops::pik::{PikKeyer, PikParams};
use ofx_ops::wavelet::{WaveletKernel, WaveletParams};
use ofx_ops::{MaskMixParams, PixelKernel, RenderPipeline};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::Path;
#[allow(unused_imports)]
use tracing::{debug, info, trace};

/// An effect with its parameters loaded.
#[derive(Debug, Clone)]
pub enum Effect {
    Bilateral(BilateralKernel),
    Wavelet(WaveletKernel),
    HueRemap(HueRemapKernel),
    Pik(PikKeyer),
}

/// Hue remap preset: the curves plus the remaining parameters.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HueRemapPreset {
    curves: HueCurves,
    #[serde(flatten)]
    params: HueRemapParams,
}

impl Effect {
    /// Builds the effect named in `args` from its preset.
    pub fn load(args: &EffectArgs) -> Result<Self> {
        let path = args.params.as_deref();
        let effect = match args.effect {
            EffectKind::Bilateral => {
                let params: BilateralParams = load_params(path)?;
                if args.guided {
                    Self::Bilateral(BilateralKernel::guided(params))
                } else {
                    Self::Bilateral(BilateralKernel::new(params))
                }
            }
            EffectKind::Wavelet => Self::Wavelet(WaveletKernel::new(load_params::<WaveletParams>(path)?)),
            EffectKind::HueRemap => {
                let preset: HueRemapPreset = load_params(path)?;
                let mut curves = preset.curves;
                // Presets may list points in any order.
                for curve in RemapCurve::ALL {
                    let points = curves.points(curve).to_vec();
                    curves.set(curve, points);
                }
                Self::HueRemap(HueRemapKernel::new(curves, preset.params))
            }
            EffectKind::Pik => Self::Pik(PikKeyer::new(load_params::<PikParams>(path)?)),
        };
        debug!(?effect, "effect loaded");
        Ok(effect)
    }
}

/// Reads a JSON preset, or the defaults when no path is given.
pub fn load_params<P: DeserializeOwned + Default>(path: Option<&Path>) -> Result<P> {
    let Some(path) = path else {
        return Ok(P::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read preset: {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid preset: {}", path.display()))
}

/// Wraps a kernel in a pipeline with the shared render settings.
pub fn pipeline<K: PixelKernel>(kernel: K, args: &EffectArgs, masked: bool) -> Result<RenderPipeline<K>> {
    Ok(RenderPipeline::new(kernel)
        .with_channels(parse_channels(&args.channels)?)
        .with_mask_mix(MaskMixParams {
            mix: args.mix,
            mask_invert: args.mask_invert,
            do_mask: masked,
        }))
}

/// Parses `x1,y1,x2,y2`.
pub fn parse_rect(s: &str) -> Result<Rect> {
    let v: Vec<i32> = s
        .split(',')
        .map(|p| p.trim().parse::<i32>())
        .collect::<std::result::Result<_, _>>()
        .with_context(|| format!("Invalid rectangle: {s}"))?;
    match v[..] {
        [x1, y1, x2, y2] => Ok(Rect::new(x1, y1, x2, y2)),
        _ => bail!("Rectangle needs four values x1,y1,x2,y2: {s}"),
    }
}

/// Parses a channel selection such as `rgb` or `a`.
pub fn parse_channels(s: &str) -> Result<ChannelMask> {
    let s = s.to_lowercase();
    if let Some(bad) = s.chars().find(|c| !"rgba".contains(*c)) {
        bail!("Unknown channel '{bad}' in \"{s}\"");
    }
    Ok(ChannelMask::new(
        s.contains('r'),
        s.contains('g'),
        s.contains('b'),
        s.contains('a'),
    ))
}

/// Loads a raw little-endian f32 image covering `bounds`.
pub fn load_raw(path: &Path, bounds: Rect, layout: ChannelLayout) -> Result<PixelBuffer<f32>> {
    trace!(path = %path.display(), %bounds, ?layout, "load_raw");
    let bytes = std::fs::read(path).with_context(|| format!("Failed to load: {}", path.display()))?;
    let expected = bounds.area() * layout.components() * 4;
    if bytes.len() != expected {
        bail!(
            "{}: expected {} bytes for {}x{} {:?}, found {}",
            path.display(),
            expected,
            bounds.width(),
            bounds.height(),
            layout,
            bytes.len()
        );
    }
    let data = bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    PixelBuffer::from_vec(bounds, layout, data).with_context(|| format!("Failed to load: {}", path.display()))
}

/// Saves an image as raw little-endian f32.
pub fn save_raw(path: &Path, img: &PixelBuffer<f32>) -> Result<()> {
    let n = img.components();
    let mut bytes = Vec::with_capacity(img.bounds().area() * n * 4);
    for y in img.bounds().rows() {
        let Some(row) = img.row(y) else { continue };
        for v in row {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
    }
    std::fs::write(path, bytes).with_context(|| format!("Failed to save: {}", path.display()))
}

/// Converts a normalised float image to depth `T`, keeping its properties.
pub fn quantize<T: Sample>(img: &PixelBuffer<f32>) -> Result<PixelBuffer<T>> {
    let mut data = Vec::with_capacity(img.bounds().area() * img.components());
    for y in img.bounds().rows() {
        if let Some(row) = img.row(y) {
            data.extend(row.iter().map(|&v| T::from_unit(v)));
        }
    }
    Ok(PixelBuffer::from_vec(img.bounds(), img.layout(), data)?
        .with_render_scale(img.render_scale())
        .with_field(img.field())
        .with_premult(img.premult()))
}

/// Normalised float copy of an image of any depth.
pub fn normalize<T: Sample>(img: &PixelBuffer<T>) -> Result<PixelBuffer<f32>> {
    let mut data = Vec::with_capacity(img.bounds().area() * img.components());
    for y in img.bounds().rows() {
        if let Some(row) = img.row(y) {
            data.extend(row.iter().map(|v| v.to_unit()));
        }
    }
    Ok(PixelBuffer::from_vec(img.bounds(), img.layout(), data)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("img.raw");
        let bounds = Rect::new(0, 0, 3, 2);
        let mut img = PixelBuffer::new(bounds, ChannelLayout::Rgb);
        img.set_pixel(2, 1, &[0.25f32, -1.0, 8.5]);
        save_raw(&path, &img).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 3 * 2 * 3 * 4);
        let back = load_raw(&path, bounds, ChannelLayout::Rgb).unwrap();
        assert_eq!(back.pixel(2, 1).unwrap(), &[0.25, -1.0, 8.5]);
    }

    #[test]
    fn test_raw_size_checked() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.raw");
        std::fs::write(&path, [0u8; 12]).unwrap();
        let err = load_raw(&path, Rect::new(0, 0, 2, 2), ChannelLayout::Rgba).unwrap_err();
        assert!(err.to_string().contains("expected 64 bytes"));
    }

    #[test]
    fn test_parse_rect() {
        assert_eq!(parse_rect("0, 1,20,30").unwrap(), Rect::new(0, 1, 20, 30));
        assert!(parse_rect("1,2,3").is_err());
        assert!(parse_rect("a,b,c,d").is_err());
    }

    #[test]
    fn test_parse_channels() {
        assert_eq!(parse_channels("RGB").unwrap(), ChannelMask::RGB);
        assert_eq!(parse_channels("rgba").unwrap(), ChannelMask::ALL);
        assert!(parse_channels("rgz").is_err());
    }

    #[test]
    fn test_quantize_u8() {
        let img = PixelBuffer::filled(Rect::new(0, 0, 1, 1), ChannelLayout::Rgba, &[0.5f32, 1.2, -0.1, 1.0]);
        let q: PixelBuffer<u8> = quantize(&img).unwrap();
        assert_eq!(q.pixel(0, 0).unwrap(), &[128, 255, 0, 255]);
        let back = normalize(&q).unwrap();
        assert!((back.pixel(0, 0).unwrap()[0] - 128.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_load_preset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bilateral.json");
        std::fs::write(&path, r#"{ "sigma_s": 3.0 }"#).unwrap();
        let p: BilateralParams = load_params(Some(&path)).unwrap();
        assert_eq!(p.sigma_s, 3.0);
        assert_eq!(p.iterations, BilateralParams::default().iterations);
        let d: PikParams = load_params(None).unwrap();
        assert_eq!(d, PikParams::default());
    }

    #[test]
    fn test_hue_preset_sorts_points() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hue.json");
        std::fs::write(
            &path,
            r#"{ "curves": { "curves": [[], [], [], [], [], [], [], [{"x": 5.0, "y": 2.0}, {"x": 2.0, "y": 1.0}], []] },
                 "luminance_mix": 0.5 }"#,
        )
        .unwrap();
        let args = EffectArgs {
            effect: EffectKind::HueRemap,
            params: Some(path),
            guided: false,
            scale: 1.0,
            mix: 1.0,
            mask_invert: false,
            channels: "rgba".into(),
        };
        let Effect::HueRemap(k) = Effect::load(&args).unwrap() else {
            panic!("wrong effect");
        };
        let pts = k.curves().points(RemapCurve::BSup);
        assert_eq!(pts[0].x, 2.0);
        assert_eq!(k.params().luminance_mix, 0.5);
    }
}
