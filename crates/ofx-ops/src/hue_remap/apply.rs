//! Per-pixel hue remap.

use super::types::{HUE_MAX, HUE_MIN, HueRemapParams, ParametricCurve, RemapCurve};
use ofx_color::rgb_to_hsv;
use ofx_math::{lerp, smoothstep};

/// Samples per curve LUT, covering `[1, 7]` inclusive.
pub const LUT_SIZE: usize = 1025;

/// The nine curves sampled once for one render.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveLuts {
    tables: Vec<[f32; LUT_SIZE]>,
}

impl CurveLuts {
    /// Samples every curve of `curves` at `time`.
    pub fn sample<C: ParametricCurve + ?Sized>(curves: &C, time: f64) -> Self {
        let step = (HUE_MAX - HUE_MIN) / (LUT_SIZE - 1) as f64;
        let tables = RemapCurve::ALL
            .iter()
            .map(|&curve| {
                let mut t = [0.0f32; LUT_SIZE];
                for (i, v) in t.iter_mut().enumerate() {
                    *v = curves.value(curve, time, HUE_MIN + i as f64 * step) as f32;
                }
                t
            })
            .collect();
        Self { tables }
    }

    /// Linearly interpolated value of `curve` at hue coordinate `x`.
    #[inline]
    pub fn lookup(&self, curve: RemapCurve, x: f32) -> f32 {
        let t = &self.tables[curve.index()];
        let pos = ((x - HUE_MIN as f32) / (HUE_MAX - HUE_MIN) as f32 * (LUT_SIZE - 1) as f32)
            .clamp(0.0, (LUT_SIZE - 1) as f32);
        let i = (pos as usize).min(LUT_SIZE - 2);
        lerp(t[i], t[i + 1], pos - i as f32)
    }
}

/// Hue coordinate of an RGB colour, red at 1.
#[inline]
pub fn hue_coordinate(rgb: [f32; 3]) -> (f32, f32) {
    let [h, s, _] = rgb_to_hsv(rgb);
    (HUE_MIN as f32 + h * 6.0, s)
}

/// Pulls `v` down towards the smaller of the other two channels; `keep = 1`
/// leaves it untouched.
#[inline]
fn suppress(v: f32, o1: f32, o2: f32, keep: f32) -> f32 {
    let limit = o1.min(o2);
    if v <= limit {
        return v;
    }
    limit + keep * (v - limit)
}

/// Remaps one unpremultiplied RGB colour.
pub fn remap_pixel(luts: &CurveLuts, params: &HueRemapParams, rgb: [f32; 3]) -> [f32; 3] {
    let (x, s) = hue_coordinate(rgb);
    let [r, g, b] = rgb;

    let r_sup = luts.lookup(RemapCurve::RSup, x);
    let g_sup = luts.lookup(RemapCurve::GSup, x);
    let b_sup = luts.lookup(RemapCurve::BSup, x);
    // Applied in turn: g sees the suppressed r, b sees both.
    let r = suppress(r, g, b, r_sup);
    let g = suppress(g, r, b, g_sup);
    let b = suppress(b, r, g, b_sup);
    let mut out = [r, g, b];

    let thrsh = luts.lookup(RemapCurve::SatThrsh, x);
    let gate = if thrsh <= 0.0 { 1.0 } else { smoothstep(0.0, thrsh, s) };
    let gain = |curve| lerp(1.0, luts.lookup(curve, x), gate);

    let lum_gain = gain(RemapCurve::Lum);
    out[0] *= gain(RemapCurve::Red) * lum_gain;
    out[1] *= gain(RemapCurve::Green) * lum_gain;
    out[2] *= gain(RemapCurve::Blue) * lum_gain;

    let math = params.luminance_math;
    let luma = math.luminance(out);
    let sat = gain(RemapCurve::Sat);
    out = out.map(|v| lerp(luma, v, sat));

    let mix = params.luminance_mix as f32;
    if mix > 0.0 {
        let delta = (math.luminance(rgb) - math.luminance(out)) * mix;
        out = out.map(|v| v + delta);
    }
    out
}
