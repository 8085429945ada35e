//! PIK colour-difference keyer.
//!
//! Pulls a matte from the difference between the key channel (green or
//! blue) and the other two, relative to the same difference on a clean
//! plate of the screen:
//!
//! ```text
//! alpha = 1 - (Pg - Pr*rw - Pb*bgw) / (Cg - Cr*rw - Cb*bgw)
//! ```
//!
//! then despills, clips the screen matte, applies the inside and outside
//! masks and optionally pulls edge colour towards the background.
//!
//! # Inputs
//!
//! | Clip   | Role                                            |
//! |--------|-------------------------------------------------|
//! | `Fg`   | foreground                                      |
//! | `PFg`  | pre-processed foreground for the key, else `Fg` |
//! | `C`    | clean plate, required unless the screen is picked |
//! | `Bg`   | background for the composite                    |
//! | `InM`  | inside mask, forces alpha up                    |
//! | `OutM` | outside mask, forces alpha down                 |
//!
//! The keyer is point-wise: regions of interest equal the render window.
//! Unlike the planar kernels it reads six clips, so it drives its own
//! render loop around [`key_pixel`].
//!
//! # Example
//!
//! ```rust
//! use ofx_ops::pik::{PikParams, PikSample, key_pixel};
//!
//! let s = PikSample::new([0.2, 0.8, 0.2, 1.0], [0.05, 0.9, 0.05]);
//! let px = key_pixel(&PikParams::default(), &s);
//! assert!((px.rgba[3] - 0.294).abs() < 1e-3);
//! ```

mod apply;
mod types;

pub use apply::{despill, key_pixel, key_terms, replace_color, screen_alpha, screen_clip};
pub use types::{
    KeyStage, OutputMode, PikParams, PikPixel, PikSample, ReplaceMode, ScreenType, SourceAlphaHandling,
};

use crate::premult::PremultAdapter;
use crate::processor::{IdentityResult, RegionsOfInterest, RenderArgs, check_scale_and_field};
use crate::OpsResult;
use ofx_core::{
    CancellationToken, Clip, Error, HostCapabilities, PixelBuffer, PremultState, Rect, Sample,
};
use rayon::prelude::*;
#[allow(unused_imports)]
use tracing::{debug, trace};

/// Input clips of a keyer render.
#[derive(Debug, Clone, Copy)]
pub struct PikClips<'a, T: Sample> {
    /// Region of definition of the output.
    pub dst_rod: Rect,
    /// Foreground.
    pub fg: Clip<'a, T>,
    /// Pre-processed foreground.
    pub pfg: Clip<'a, T>,
    /// Clean plate.
    pub c: Clip<'a, T>,
    /// Background.
    pub bg: Clip<'a, T>,
    /// Inside mask.
    pub inside_mask: Clip<'a, T>,
    /// Outside mask.
    pub outside_mask: Clip<'a, T>,
}

impl<'a, T: Sample> PikClips<'a, T> {
    /// Clips with only the foreground (possibly absent) connected.
    pub fn new(dst_rod: Rect, fg: Option<&'a PixelBuffer<T>>) -> Self {
        Self {
            dst_rod,
            fg: Clip::from_option("Fg", fg),
            pfg: Clip::disconnected("PFg"),
            c: Clip::disconnected("C"),
            bg: Clip::disconnected("Bg"),
            inside_mask: Clip::disconnected("InM"),
            outside_mask: Clip::disconnected("OutM"),
        }
    }

    /// Connects the pre-processed foreground.
    pub fn with_pfg(mut self, img: &'a PixelBuffer<T>) -> Self {
        self.pfg = Clip::connected("PFg", img);
        self
    }

    /// Connects the clean plate.
    pub fn with_clean_plate(mut self, img: &'a PixelBuffer<T>) -> Self {
        self.c = Clip::connected("C", img);
        self
    }

    /// Connects the background.
    pub fn with_bg(mut self, img: &'a PixelBuffer<T>) -> Self {
        self.bg = Clip::connected("Bg", img);
        self
    }

    /// Connects the inside mask.
    pub fn with_inside_mask(mut self, img: &'a PixelBuffer<T>) -> Self {
        self.inside_mask = Clip::connected("InM", img);
        self
    }

    /// Connects the outside mask.
    pub fn with_outside_mask(mut self, img: &'a PixelBuffer<T>) -> Self {
        self.outside_mask = Clip::connected("OutM", img);
        self
    }
}

/// One colour input bound to a render: image plus its adapter.
#[derive(Clone, Copy)]
struct ColorInput<'a, T: Sample> {
    img: Option<&'a PixelBuffer<T>>,
    adapter: PremultAdapter,
}

impl<'a, T: Sample> ColorInput<'a, T> {
    fn new(img: Option<&'a PixelBuffer<T>>) -> Self {
        let adapter = match img {
            Some(img) => PremultAdapter::new(
                img.premult() == PremultState::Premultiplied && img.layout().has_alpha(),
                3,
            ),
            None => PremultAdapter::passthrough(),
        };
        Self { img, adapter }
    }

    /// Unpremultiplied RGBA at `(x, y)`; layouts without alpha are opaque,
    /// missing pixels transparent black.
    #[inline]
    fn rgba(&self, x: i32, y: i32) -> [f32; 4] {
        let Some(img) = self.img else {
            return [0.0; 4];
        };
        let px = img.pixel(x, y);
        let mut v = self.adapter.unpremultiply(px, img.components());
        if px.is_some() && !img.layout().has_alpha() {
            v[3] = 1.0;
        }
        v
    }
}

#[inline]
fn mask_value<T: Sample>(img: Option<&PixelBuffer<T>>, x: i32, y: i32) -> f32 {
    img.and_then(|m| m.pixel(x, y))
        .and_then(|px| px.last())
        .map_or(0.0, |v| v.to_unit())
}

/// PIK keyer bound to its parameters and host.
#[derive(Debug, Clone)]
pub struct PikKeyer {
    params: PikParams,
    caps: HostCapabilities,
}

impl PikKeyer {
    /// Keyer for a fully capable host.
    pub fn new(params: PikParams) -> Self {
        Self {
            params,
            caps: HostCapabilities::full(),
        }
    }

    /// Sets the host capabilities.
    pub fn with_caps(mut self, caps: HostCapabilities) -> Self {
        self.caps = caps;
        self
    }

    /// Parameters.
    pub fn params(&self) -> &PikParams {
        &self.params
    }

    /// Every input is read at the output position only.
    pub fn regions_of_interest(&self, output: Rect) -> RegionsOfInterest {
        RegionsOfInterest {
            source_a: output,
            source_b: output,
        }
    }

    /// The `Source` output is the foreground itself.
    pub fn is_identity(&self) -> IdentityResult {
        if self.params.output_mode == OutputMode::Source {
            IdentityResult::IdentityA
        } else {
            IdentityResult::NotIdentity
        }
    }

    fn check_input<'a, T: Sample>(
        &self,
        clip: &Clip<'a, T>,
        img: Option<&'a PixelBuffer<T>>,
        args: &RenderArgs,
        color: bool,
    ) -> OpsResult<Option<&'a PixelBuffer<T>>> {
        let Some(img) = img else {
            return Ok(None);
        };
        if color && !img.layout().has_color() {
            return Err(Error::component_mismatch(4, img.components()).into());
        }
        check_scale_and_field(img, args)?;
        self.caps
            .check_fetched(clip.name(), img.bounds(), clip.region_of_definition(), args.scale)?;
        Ok(Some(img))
    }

    /// Keys `args.window` of `dst`.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingInput`] for `C` when the screen is not picked,
    ///   before any pixel is written
    /// - format, scale, field and host-contract errors as for
    ///   [`RenderPipeline::render`](crate::processor::RenderPipeline::render)
    pub fn render<T: Sample>(
        &self,
        args: &RenderArgs,
        clips: &PikClips<'_, T>,
        dst: &mut PixelBuffer<T>,
        cancel: &CancellationToken,
    ) -> OpsResult<()> {
        let window = args.window;
        trace!(%window, mode = ?self.params.output_mode, depth = ?T::DEPTH, "pik render");
        if window.is_empty() {
            debug!("empty render window");
            return Ok(());
        }

        let layout = dst.layout();
        self.caps.check_depth(T::DEPTH)?;
        if !layout.has_color() {
            return Err(Error::UnsupportedLayout(layout).into());
        }
        check_scale_and_field(dst, args)?;
        self.caps.check_window(window, clips.dst_rod)?;
        if !dst.bounds().contains_rect(&window) {
            return Err(Error::InvalidRegion {
                region: window,
                bounds: dst.bounds(),
            }
            .into());
        }

        let c = if self.params.needs_clean_plate() {
            Some(clips.c.fetch_required()?)
        } else {
            None
        };
        let c = self.check_input(&clips.c, c, args, true)?;
        let fg = self.check_input(&clips.fg, clips.fg.fetch(), args, true)?;
        let pfg = self.check_input(&clips.pfg, clips.pfg.fetch(), args, true)?;
        let bg = self.check_input(&clips.bg, clips.bg.fetch(), args, true)?;
        let inside = self.check_input(&clips.inside_mask, clips.inside_mask.fetch(), args, false)?;
        let outside = self.check_input(&clips.outside_mask, clips.outside_mask.fetch(), args, false)?;

        let fg = ColorInput::new(fg);
        let pfg = match pfg {
            Some(_) => ColorInput::new(pfg),
            None => fg,
        };
        let c = ColorInput::new(c);
        let bg = ColorInput::new(bg);
        let pick = self.params.pick_color.map(|v| v as f32);
        let params = &self.params;

        let n = layout.components();
        let dst_x1 = dst.bounds().x1;
        dst.par_rows_mut().for_each(|(y, row)| {
            if y < window.y1 || y >= window.y2 || cancel.is_cancelled() {
                return;
            }
            for x in window.x1..window.x2 {
                let p = pfg.rgba(x, y);
                let screen = match c.img {
                    Some(_) => {
                        let v = c.rgba(x, y);
                        [v[0], v[1], v[2]]
                    }
                    None => pick,
                };
                let sample = PikSample {
                    fg: fg.rgba(x, y),
                    pfg: [p[0], p[1], p[2]],
                    c: screen,
                    bg: bg.rgba(x, y),
                    inside: mask_value(inside, x, y),
                    outside: mask_value(outside, x, y),
                };
                let out = key_pixel(params, &sample);
                let o = (x - dst_x1) as usize * n;
                for (d, v) in row[o..o + n].iter_mut().zip(out.rgba) {
                    *d = T::from_f32(v * T::MAX_VALUE);
                }
            }
        });
        if cancel.is_cancelled() {
            debug!("pik render cancelled");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ofx_core::{ChannelLayout, StatusCode};

    fn plate(bounds: Rect, px: [f32; 4]) -> PixelBuffer<f32> {
        PixelBuffer::filled(bounds, ChannelLayout::Rgba, &px)
    }

    #[test]
    fn test_green_screen_render() {
        let bounds = Rect::new(0, 0, 4, 4);
        let fg = plate(bounds, [0.2, 0.8, 0.2, 1.0]);
        let c = plate(bounds, [0.05, 0.9, 0.05, 1.0]);
        let mut dst = PixelBuffer::new(bounds, ChannelLayout::Rgba);
        PikKeyer::new(PikParams::default())
            .render(
                &RenderArgs::new(bounds),
                &PikClips::new(bounds, Some(&fg)).with_clean_plate(&c),
                &mut dst,
                &CancellationToken::new(),
            )
            .unwrap();
        for y in 0..4 {
            for x in 0..4 {
                assert!((dst.pixel(x, y).unwrap()[3] - 0.294).abs() < 1e-3);
            }
        }
    }

    #[test]
    fn test_missing_clean_plate_writes_nothing() {
        let bounds = Rect::new(0, 0, 2, 2);
        let fg = plate(bounds, [0.2, 0.8, 0.2, 1.0]);
        let mut dst = plate(bounds, [7.0; 4]);
        let err = PikKeyer::new(PikParams::default())
            .render(&RenderArgs::new(bounds), &PikClips::new(bounds, Some(&fg)), &mut dst, &CancellationToken::new())
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::Failed);
        assert!(err.persistent_message().unwrap().contains('C'));
        assert!(dst.data().iter().all(|&v| v == 7.0));
    }

    #[test]
    fn test_picked_screen_needs_no_plate() {
        let bounds = Rect::new(0, 0, 2, 1);
        let fg = plate(bounds, [0.2, 0.8, 0.2, 1.0]);
        let mut dst = PixelBuffer::new(bounds, ChannelLayout::Rgba);
        let params = PikParams {
            screen_type: ScreenType::Pick,
            pick_color: [0.05, 0.9, 0.05],
            ..Default::default()
        };
        PikKeyer::new(params)
            .render(&RenderArgs::new(bounds), &PikClips::new(bounds, Some(&fg)), &mut dst, &CancellationToken::new())
            .unwrap();
        assert!((dst.pixel(1, 0).unwrap()[3] - 0.294).abs() < 1e-3);
    }

    #[test]
    fn test_masks_and_u8_output() {
        let bounds = Rect::new(0, 0, 2, 1);
        let fg = PixelBuffer::filled(bounds, ChannelLayout::Rgba, &[51u8, 204, 51, 255]);
        let c = PixelBuffer::filled(bounds, ChannelLayout::Rgb, &[13u8, 230, 13]);
        let mut inside: PixelBuffer<u8> = PixelBuffer::new(bounds, ChannelLayout::Alpha);
        inside.set_pixel(0, 0, &[255]);
        let mut dst = PixelBuffer::new(bounds, ChannelLayout::Rgba);
        let params = PikParams {
            output_mode: OutputMode::CombinedMatte,
            ..Default::default()
        };
        PikKeyer::new(params)
            .render(
                &RenderArgs::new(bounds),
                &PikClips::new(bounds, Some(&fg)).with_clean_plate(&c).with_inside_mask(&inside),
                &mut dst,
                &CancellationToken::new(),
            )
            .unwrap();
        assert_eq!(dst.pixel(0, 0).unwrap(), &[255, 255, 255, 255]);
        let keyed = dst.pixel(1, 0).unwrap()[3];
        assert!((70..=80).contains(&keyed), "{keyed}");
    }

    #[test]
    fn test_rgb_output_drops_alpha() {
        let bounds = Rect::new(0, 0, 1, 1);
        let fg = PixelBuffer::filled(bounds, ChannelLayout::Rgb, &[0.2f32, 0.8, 0.2]);
        let c = plate(bounds, [0.05, 0.9, 0.05, 1.0]);
        let mut dst = PixelBuffer::new(bounds, ChannelLayout::Rgb);
        let params = PikParams {
            output_mode: OutputMode::ScreenMatte,
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
        assert!((dst.pixel(0, 0).unwrap()[1] - 0.294).abs() < 1e-3);
    }

    #[test]
    fn test_rejects_alpha_only_foreground() {
        let bounds = Rect::new(0, 0, 1, 1);
        let fg: PixelBuffer<f32> = PixelBuffer::new(bounds, ChannelLayout::Alpha);
        let c = plate(bounds, [0.05, 0.9, 0.05, 1.0]);
        let mut dst = PixelBuffer::new(bounds, ChannelLayout::Rgba);
        let err = PikKeyer::new(PikParams::default())
            .render(
                &RenderArgs::new(bounds),
                &PikClips::new(bounds, Some(&fg)).with_clean_plate(&c),
                &mut dst,
                &CancellationToken::new(),
            )
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::ErrImageFormat);
    }

    #[test]
    fn test_identity_and_roi() {
        let k = PikKeyer::new(PikParams {
            output_mode: OutputMode::Source,
            ..Default::default()
        });
        assert_eq!(k.is_identity(), IdentityResult::IdentityA);
        let w = Rect::new(3, 4, 10, 12);
        assert_eq!(k.regions_of_interest(w).source_a, w);
        assert_eq!(PikKeyer::new(PikParams::default()).is_identity(), IdentityResult::NotIdentity);
    }
}
