//! Regions-of-interest command
//!
//! Prints the source rectangles a render of the given window reads.

use super::{Effect, parse_rect};
use crate::RoiArgs;
use anyhow::Result;
use ofx_core::{Rect, RenderScale};
use ofx_ops::processor::RegionsOfInterest;
use ofx_ops::{PixelKernel, RenderPipeline};
#[allow(unused_imports)]
use tracing::{debug, trace};

/// Regions of interest of `effect` for `window`.
pub fn regions(effect: &Effect, window: Rect, scale: RenderScale) -> RegionsOfInterest {
    match effect {
        Effect::Bilateral(k) => pipeline_roi(*k, window, scale),
        Effect::Wavelet(k) => pipeline_roi(*k, window, scale),
        Effect::HueRemap(k) => pipeline_roi(k.clone(), window, scale),
        Effect::Pik(keyer) => keyer.regions_of_interest(window),
    }
}

fn pipeline_roi<K: PixelKernel>(kernel: K, window: Rect, scale: RenderScale) -> RegionsOfInterest {
    RenderPipeline::new(kernel).regions_of_interest(window, scale)
}

pub fn run(args: RoiArgs) -> Result<()> {
    trace!(effect = ?args.effect.effect, window = %args.window, "roi::run");
    let effect = Effect::load(&args.effect)?;
    let window = parse_rect(&args.window)?;
    let scale = RenderScale::new(args.effect.scale, args.effect.scale);
    let roi = regions(&effect, window, scale);
    debug!(source_a = %roi.source_a, source_b = %roi.source_b, "regions of interest");

    if args.json {
        let rect = |r: Rect| [r.x1, r.y1, r.x2, r.y2];
        let value = serde_json::json!({
            "window": rect(window),
            "source_a": rect(roi.source_a),
            "source_b": rect(roi.source_b),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("window:   {window}");
        println!("source A: {}", roi.source_a);
        println!("source B: {}", roi.source_b);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ofx_ops::bilateral::{BilateralKernel, BilateralParams};
    use ofx_ops::pik::{PikKeyer, PikParams};
    use ofx_ops::wavelet::{WaveletKernel, WaveletParams};

    #[test]
    fn test_bilateral_roi_grows_with_sigma() {
        let w = Rect::new(0, 0, 100, 100);
        let k = |s| Effect::Bilateral(BilateralKernel::new(BilateralParams { sigma_s: s, ..Default::default() }));
        let small = regions(&k(1.0), w, RenderScale::FULL).source_a;
        let large = regions(&k(5.0), w, RenderScale::FULL).source_a;
        assert!(small.contains_rect(&w));
        assert!(large.contains_rect(&small));
        assert!(large.width() > small.width());
    }

    #[test]
    fn test_wavelet_roi_shrinks_at_proxy_scale() {
        let w = Rect::new(0, 0, 64, 64);
        let e = Effect::Wavelet(WaveletKernel::new(WaveletParams::default()));
        let full = regions(&e, w, RenderScale::FULL).source_a;
        let proxy = regions(&e, w, RenderScale::new(0.25, 0.25)).source_a;
        assert!(full.contains_rect(&proxy));
        assert!(proxy.contains_rect(&w));
    }

    #[test]
    fn test_keyer_roi_is_window() {
        let w = Rect::new(5, 6, 7, 8);
        let e = Effect::Pik(PikKeyer::new(PikParams::default()));
        assert_eq!(regions(&e, w, RenderScale::FULL).source_a, w);
    }
}
