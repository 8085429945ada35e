//! Per-pixel keying.
//!
//! [`key_pixel`] walks the stages of one pixel in order and returns as
//! soon as the selected output mode has what it needs. Colour is carried
//! premultiplied between stages: the despilled foreground is already
//! `F * alpha`, so a stage that changes alpha either adds replacement
//! colour (alpha up) or scales the colour down (alpha down).

use super::types::{KeyStage, OutputMode, PikParams, PikPixel, PikSample, ReplaceMode, SourceAlphaHandling};
use ofx_color::LuminanceMath;
use ofx_color::xyz::{rgb709_to_xyz, xyy_to_xyz, xyz_to_rgb709, xyz_to_xyy};
use ofx_math::{clamp01, lerp};

/// Multiplier a bias colour applies to its channel; 0.5 is neutral.
#[inline]
fn bias_gain(bias: f64) -> f32 {
    if bias > 0.0 { (0.5 / bias) as f32 } else { 1.0 }
}

#[inline]
fn rgb(v: [f32; 4]) -> [f32; 3] {
    [v[0], v[1], v[2]]
}

/// Colour-difference key terms `(pfg_key, c_key)` after the alpha bias.
pub fn key_terms(params: &PikParams, pfg: [f32; 3], c: [f32; 3]) -> (f32, f32) {
    let gain = params.alpha_bias.map(bias_gain);
    let rw = params.red_weight as f32;
    let bgw = params.blue_green_weight as f32;
    let green = params.keys_green();
    let key = |v: [f32; 3]| {
        let v = [v[0] * gain[0], v[1] * gain[1], v[2] * gain[2]];
        if green {
            v[1] - v[0] * rw - v[2] * bgw
        } else {
            v[2] - v[0] * rw - v[1] * bgw
        }
    };
    (key(pfg), key(c))
}

/// Raw screen matte: `1 - pfg_key / c_key`, solid when either term is not
/// positive.
pub fn screen_alpha(params: &PikParams, pfg: [f32; 3], c: [f32; 3]) -> f32 {
    let (pfg_key, c_key) = key_terms(params, pfg, c);
    if pfg_key <= 0.0 || c_key <= 0.0 {
        return 1.0;
    }
    let alpha = 1.0 - pfg_key / c_key;
    if params.clamp_alpha { clamp01(alpha) } else { alpha }
}

/// Premultiplied foreground after screen subtraction.
pub fn despill(params: &PikParams, fg: [f32; 3], c: [f32; 3], alpha: f32) -> [f32; 3] {
    if !params.screen_subtraction {
        return fg.map(|v| v * alpha);
    }
    if alpha >= 1.0 {
        return fg;
    }
    let bias = if params.despill_bias_is_alpha_bias {
        params.alpha_bias
    } else {
        params.despill_bias
    };
    let mut out = fg;
    for ch in 0..3 {
        out[ch] = (fg[ch] + c[ch] * bias_gain(bias[ch]) * (alpha - 1.0)).max(0.0);
    }
    out
}

/// Colour a replace policy adds per unit of alpha gained.
pub fn replace_color(mode: ReplaceMode, color: [f64; 3], fg: [f32; 3]) -> [f32; 3] {
    let color = color.map(|v| v as f32);
    match mode {
        ReplaceMode::None => [0.0; 3],
        ReplaceMode::Source => fg,
        ReplaceMode::HardColor => color,
        ReplaceMode::SoftColor => {
            let luma = LuminanceMath::Rec709;
            let lc = luma.luminance(color);
            if lc.abs() <= f32::EPSILON {
                return color;
            }
            let k = luma.luminance(fg) / lc;
            color.map(|v| v * k)
        }
    }
}

/// Screen clip: `(a - min) / (max - min)`, clamped. Identity for the
/// default `[0, 1]` range.
pub fn screen_clip(alpha: f32, min: f64, max: f64) -> f32 {
    if min == 0.0 && max == 1.0 {
        return alpha;
    }
    let (min, max) = (min as f32, max as f32);
    if max > min {
        clamp01((alpha - min) / (max - min))
    } else if alpha >= max {
        1.0
    } else {
        0.0
    }
}

/// Premultiplied colour and alpha as they move through the stages.
#[derive(Debug, Clone, Copy)]
struct Keyed {
    rgb: [f32; 3],
    alpha: f32,
    stage: KeyStage,
}

impl Keyed {
    /// Moves alpha to `alpha`, adding `color` where it rises and scaling
    /// colour where it falls.
    fn set_alpha(&mut self, alpha: f32, color: [f32; 3], stage: KeyStage) {
        if alpha > self.alpha {
            let gained = alpha - self.alpha;
            for ch in 0..3 {
                self.rgb[ch] += gained * color[ch];
            }
        } else if alpha < self.alpha {
            let k = if self.alpha > f32::EPSILON { alpha / self.alpha } else { 0.0 };
            self.rgb = self.rgb.map(|v| v * k);
        }
        self.alpha = alpha;
        debug_assert!(stage >= self.stage);
        self.stage = stage;
    }

    fn out(&self, rgba: [f32; 4]) -> PikPixel {
        PikPixel {
            rgba,
            stage: self.stage,
        }
    }

    fn matte(&self, v: f32) -> PikPixel {
        self.out([v; 4])
    }
}

/// Moves edge colour towards the background in CIE xyY.
///
/// `ubl` drives luminance and `ubc` chromaticity; both are weighted by
/// transparency, so solid pixels keep their colour.
fn bias_to_background(params: &PikParams, k: &mut Keyed, bg: [f32; 3]) {
    let (ubl, ubc) = (params.ubl as f32, params.ubc as f32);
    if (ubl <= 0.0 && ubc <= 0.0) || k.alpha <= f32::EPSILON || k.alpha >= 1.0 {
        return;
    }
    let w = 1.0 - k.alpha;
    let f = k.rgb.map(|v| v / k.alpha);
    let fy = xyz_to_xyy(rgb709_to_xyz(f));
    let by = xyz_to_xyy(rgb709_to_xyz(bg));
    let xyy = [
        lerp(fy[0], by[0], ubc * w),
        lerp(fy[1], by[1], ubc * w),
        lerp(fy[2], by[2], ubl * w),
    ];
    k.rgb = xyz_to_rgb709(xyy_to_xyz(xyy)).map(|v| v * k.alpha);
}

/// Keys one pixel.
pub fn key_pixel(params: &PikParams, s: &PikSample) -> PikPixel {
    let fg = rgb(s.fg);
    let fg_alpha = s.fg[3];
    let inside = match params.source_alpha {
        SourceAlphaHandling::Ignore => s.inside,
        SourceAlphaHandling::AddToInsideMask => s.inside.max(fg_alpha),
    };
    let mut k = Keyed {
        rgb: fg,
        alpha: fg_alpha,
        stage: KeyStage::NotComposited,
    };

    match params.output_mode {
        OutputMode::Source => return k.out([fg[0] * fg_alpha, fg[1] * fg_alpha, fg[2] * fg_alpha, fg_alpha]),
        OutputMode::SourceAlpha => return k.matte(fg_alpha),
        OutputMode::CleanPlate => return k.out([s.c[0], s.c[1], s.c[2], 1.0]),
        OutputMode::InsideMask => return k.matte(inside),
        OutputMode::OutsideMask => return k.matte(s.outside),
        _ => {}
    }

    let raw = screen_alpha(params, s.pfg, s.c);
    k.rgb = despill(params, fg, s.c, raw);
    k.alpha = raw;
    k.stage = KeyStage::ScreenMatte;
    if params.output_mode == OutputMode::Intermediate {
        return k.out([k.rgb[0], k.rgb[1], k.rgb[2], raw]);
    }

    let clipped = screen_clip(raw, params.screen_clip_min, params.screen_clip_max);
    let color = replace_color(params.screen_replace, params.screen_replace_color, fg);
    k.set_alpha(clipped, color, KeyStage::ClipAdjusted);
    if params.output_mode == OutputMode::ScreenMatte {
        return k.matte(k.alpha);
    }

    let color = replace_color(params.inside_replace, params.inside_replace_color, fg);
    k.set_alpha(k.alpha.max(inside), color, KeyStage::InsideMaskApplied);
    k.set_alpha(k.alpha.min(1.0 - s.outside), [0.0; 3], KeyStage::OutsideMaskApplied);

    let a = k.alpha;
    match params.output_mode {
        OutputMode::CombinedMatte => return k.matte(a),
        OutputMode::Status => {
            let v = if a <= 0.0 {
                0.0
            } else if a >= 1.0 {
                1.0
            } else {
                0.5
            };
            return k.out([v, v, v, 1.0]);
        }
        _ => {}
    }

    bias_to_background(params, &mut k, rgb(s.bg));
    let [r, g, b] = k.rgb;
    match params.output_mode {
        OutputMode::Unpremultiplied => {
            let d = if a > f32::EPSILON { a } else { 1.0 };
            k.out([r / d, g / d, b / d, a])
        }
        OutputMode::Composite => {
            let bg_a = s.bg[3];
            let keep = 1.0 - a;
            k.stage = KeyStage::FinalComposite;
            k.out([
                r + s.bg[0] * bg_a * keep,
                g + s.bg[1] * bg_a * keep,
                b + s.bg[2] * bg_a * keep,
                a + bg_a * keep,
            ])
        }
        _ => k.out([r, g, b, a]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pik::types::ScreenType;

    const FG: [f32; 4] = [0.2, 0.8, 0.2, 1.0];
    const C: [f32; 3] = [0.05, 0.9, 0.05];
    const RAW: f32 = 1.0 - 0.6 / 0.85;

    fn key(params: PikParams, s: PikSample) -> PikPixel {
        key_pixel(&params, &s)
    }

    fn mode(m: OutputMode) -> PikParams {
        PikParams {
            output_mode: m,
            ..Default::default()
        }
    }

    fn sample() -> PikSample {
        PikSample::new(FG, C)
    }

    #[test]
    fn test_green_screen_alpha() {
        let (pk, ck) = key_terms(&PikParams::default(), rgb(FG), C);
        assert!((pk - 0.6).abs() < 1e-6);
        assert!((ck - 0.85).abs() < 1e-6);
        let px = key(PikParams::default(), sample());
        assert!((px.rgba[3] - 0.294).abs() < 1e-3);
        assert_eq!(px.stage, KeyStage::OutsideMaskApplied);
    }

    #[test]
    fn test_non_positive_terms_are_solid() {
        let p = PikParams::default();
        assert_eq!(screen_alpha(&p, rgb(FG), [0.5, 0.3, 0.5]), 1.0);
        assert_eq!(screen_alpha(&p, [0.9, 0.1, 0.1], C), 1.0);
    }

    #[test]
    fn test_blue_screen_symmetric() {
        let p = PikParams {
            screen_type: ScreenType::Blue,
            ..Default::default()
        };
        let a = screen_alpha(&p, [0.2, 0.2, 0.8], [0.05, 0.05, 0.9]);
        assert!((a - RAW).abs() < 1e-6);
    }

    #[test]
    fn test_alpha_bias_scales_key() {
        let p = PikParams {
            alpha_bias: [0.5, 1.0, 0.5],
            ..Default::default()
        };
        // pfg 0.4 - 0.1 - 0.1, c 0.45 - 0.025 - 0.025
        assert!((screen_alpha(&p, rgb(FG), C) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_despill_removes_screen() {
        let px = key(PikParams::default(), sample());
        let expected = 0.2 - 0.05 * (1.0 - RAW);
        assert!((px.rgba[0] - expected).abs() < 1e-6);
        assert!((px.rgba[1] - (0.8 - 0.9 * (1.0 - RAW))).abs() < 1e-6);
        // A pure screen pixel subtracts to black.
        let screen = key(PikParams::default(), PikSample::new([0.05, 0.9, 0.05, 1.0], C));
        assert_eq!(screen.rgba, [0.0; 4]);
    }

    #[test]
    fn test_without_subtraction_premultiplies() {
        let p = PikParams {
            screen_subtraction: false,
            ..Default::default()
        };
        let px = key(p, sample());
        assert!((px.rgba[1] - 0.8 * RAW).abs() < 1e-6);
    }

    #[test]
    fn test_screen_clip_scales_down() {
        let p = PikParams {
            screen_clip_min: 0.2,
            screen_clip_max: 0.8,
            ..Default::default()
        };
        let clipped = (RAW - 0.2) / 0.6;
        let px = key(p, sample());
        assert!((px.rgba[3] - clipped).abs() < 1e-6);
        let despilled = 0.2 - 0.05 * (1.0 - RAW);
        assert!((px.rgba[0] - despilled * clipped / RAW).abs() < 1e-6);
    }

    #[test]
    fn test_screen_clip_replace_policies() {
        let base = PikParams {
            screen_clip_max: 0.25,
            ..Default::default()
        };
        let despilled = 0.2 - 0.05 * (1.0 - RAW);
        let gained = 1.0 - RAW;

        let hard = PikParams {
            screen_replace: ReplaceMode::HardColor,
            screen_replace_color: [1.0, 0.0, 0.0],
            ..base
        };
        let px = key(hard, sample());
        assert_eq!(px.rgba[3], 1.0);
        assert!((px.rgba[0] - (despilled + gained)).abs() < 1e-5);
        assert!((px.rgba[2] - despilled).abs() < 1e-5);

        let none = PikParams {
            screen_replace: ReplaceMode::None,
            ..base
        };
        let px = key(none, sample());
        assert!((px.rgba[0] - despilled).abs() < 1e-6);

        let soft = key(base, sample());
        let fg_luma = LuminanceMath::Rec709.luminance(rgb(FG));
        assert!((soft.rgba[2] - (despilled + gained * fg_luma)).abs() < 1e-5);
    }

    #[test]
    fn test_inside_mask_floor() {
        let p = PikParams {
            inside_replace: ReplaceMode::Source,
            ..Default::default()
        };
        let s = PikSample { inside: 1.0, ..sample() };
        let px = key(p, s);
        assert_eq!(px.rgba[3], 1.0);
        let despilled = 0.8 - 0.9 * (1.0 - RAW);
        assert!((px.rgba[1] - (despilled + (1.0 - RAW) * 0.8)).abs() < 1e-5);
    }

    #[test]
    fn test_source_alpha_feeds_inside_mask() {
        let p = PikParams {
            source_alpha: SourceAlphaHandling::AddToInsideMask,
            output_mode: OutputMode::CombinedMatte,
            ..Default::default()
        };
        assert_eq!(key(p, sample()).rgba, [1.0; 4]);
        let ignored = PikParams {
            source_alpha: SourceAlphaHandling::Ignore,
            ..p
        };
        assert!((key(ignored, sample()).rgba[0] - RAW).abs() < 1e-6);
    }

    #[test]
    fn test_outside_mask_ceiling() {
        let s = PikSample {
            outside: 1.0,
            inside: 1.0,
            ..sample()
        };
        let px = key(PikParams::default(), s);
        assert_eq!(px.rgba, [0.0; 4]);
        assert_eq!(px.stage, KeyStage::OutsideMaskApplied);
    }

    #[test]
    fn test_pass_through_modes() {
        let s = PikSample {
            inside: 0.25,
            outside: 0.75,
            ..sample()
        };
        let px = key(mode(OutputMode::CleanPlate), s);
        assert_eq!(px.rgba, [0.05, 0.9, 0.05, 1.0]);
        assert_eq!(px.stage, KeyStage::NotComposited);
        assert_eq!(key(mode(OutputMode::Source), s).rgba, FG);
        assert_eq!(key(mode(OutputMode::SourceAlpha), s).rgba, [1.0; 4]);
        assert_eq!(key(mode(OutputMode::InsideMask), s).rgba, [0.25; 4]);
        assert_eq!(key(mode(OutputMode::OutsideMask), s).rgba, [0.75; 4]);
    }

    #[test]
    fn test_stages_by_mode() {
        let s = sample();
        assert_eq!(key(mode(OutputMode::Intermediate), s).stage, KeyStage::ScreenMatte);
        assert_eq!(key(mode(OutputMode::ScreenMatte), s).stage, KeyStage::ClipAdjusted);
        assert_eq!(key(mode(OutputMode::CombinedMatte), s).stage, KeyStage::OutsideMaskApplied);
        assert_eq!(key(mode(OutputMode::Composite), s).stage, KeyStage::FinalComposite);
    }

    #[test]
    fn test_status() {
        assert_eq!(key(mode(OutputMode::Status), sample()).rgba, [0.5, 0.5, 0.5, 1.0]);
        let solid = PikSample::new([0.9, 0.1, 0.1, 1.0], C);
        assert_eq!(key(mode(OutputMode::Status), solid).rgba, [1.0; 4]);
    }

    #[test]
    fn test_unpremultiplied_and_composite() {
        let despilled = 0.2 - 0.05 * (1.0 - RAW);
        let px = key(mode(OutputMode::Unpremultiplied), sample());
        assert!((px.rgba[0] - despilled / RAW).abs() < 1e-5);

        let s = PikSample {
            bg: [0.0, 0.0, 1.0, 1.0],
            ..sample()
        };
        let px = key(mode(OutputMode::Composite), s);
        assert!((px.rgba[2] - (despilled + 1.0 - RAW)).abs() < 1e-5);
        assert!((px.rgba[3] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_background_luminance_bias() {
        let s = PikSample {
            bg: [1.0, 1.0, 1.0, 1.0],
            ..sample()
        };
        let luma = LuminanceMath::Rec709;
        let plain = key(mode(OutputMode::Unpremultiplied), s);
        let biased = key(
            PikParams {
                ubl: 1.0,
                ..mode(OutputMode::Unpremultiplied)
            },
            s,
        );
        let before = luma.luminance(rgb(plain.rgba));
        let after = luma.luminance(rgb(biased.rgba));
        assert!(after > before);
        let expected = lerp(before, 1.0, 1.0 - RAW);
        assert!((after - expected).abs() < 1e-3);
    }
}
