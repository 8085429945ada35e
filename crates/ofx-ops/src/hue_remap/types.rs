//! Curves and parameters of the hue remap.
//!
//! Curves are functions of the hue coordinate `x = 1 + 6 h` where `h` is
//! the HSV hue in turns, so red sits at 1 (and 7), yellow at 2, green at 3,
//! cyan at 4, blue at 5 and magenta at 6.

use ofx_color::LuminanceMath;

/// Lower end of the hue coordinate.
pub const HUE_MIN: f64 = 1.0;
/// Upper end of the hue coordinate, same hue as [`HUE_MIN`].
pub const HUE_MAX: f64 = 7.0;

/// The nine curves of the remap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RemapCurve {
    /// Saturation gain.
    Sat,
    /// Luminance gain.
    Lum,
    /// Red gain.
    Red,
    /// Green gain.
    Green,
    /// Blue gain.
    Blue,
    /// Red suppression, 1 keeps red.
    RSup,
    /// Green suppression, 1 keeps green.
    GSup,
    /// Blue suppression, 1 keeps blue.
    BSup,
    /// Saturation below which the effect fades out.
    SatThrsh,
}

impl RemapCurve {
    /// All curves, in LUT order.
    pub const ALL: [Self; 9] = [
        Self::Sat,
        Self::Lum,
        Self::Red,
        Self::Green,
        Self::Blue,
        Self::RSup,
        Self::GSup,
        Self::BSup,
        Self::SatThrsh,
    ];

    /// Position in [`ALL`](Self::ALL).
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Curve name as shown by hosts.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sat => "sat",
            Self::Lum => "lum",
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::RSup => "r_sup",
            Self::GSup => "g_sup",
            Self::BSup => "b_sup",
            Self::SatThrsh => "sat_thrsh",
        }
    }

    /// Value of the curve when it has no control points.
    pub const fn default_value(self) -> f64 {
        match self {
            Self::SatThrsh => 0.0,
            _ => 1.0,
        }
    }
}

/// Host parametric parameter: several curves over one parametric range.
pub trait ParametricCurve: Send + Sync {
    /// Value of `curve` at parametric position `x` and frame `time`.
    fn value(&self, curve: RemapCurve, time: f64, x: f64) -> f64;
}

/// Control point of a [`HueCurves`] curve.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CurvePoint {
    /// Hue coordinate in `[1, 7]`.
    pub x: f64,
    /// Curve value.
    pub y: f64,
}

impl CurvePoint {
    /// Creates a control point.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Periodic piecewise-linear curves, constant over time.
///
/// An empty curve evaluates to its [`RemapCurve::default_value`]; the
/// segment from the last point wraps to the first one.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HueCurves {
    curves: [Vec<CurvePoint>; 9],
}

impl HueCurves {
    /// Flat default curves.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the control points of `curve`.
    pub fn with(mut self, curve: RemapCurve, points: impl Into<Vec<CurvePoint>>) -> Self {
        self.set(curve, points);
        self
    }

    /// Replaces the control points of `curve`, sorting them by position.
    pub fn set(&mut self, curve: RemapCurve, points: impl Into<Vec<CurvePoint>>) {
        let mut points = points.into();
        points.sort_by(|a, b| a.x.total_cmp(&b.x));
        self.curves[curve.index()] = points;
    }

    /// Constant curve.
    pub fn with_constant(self, curve: RemapCurve, y: f64) -> Self {
        self.with(curve, vec![CurvePoint::new(HUE_MIN, y)])
    }

    /// Control points of `curve`.
    pub fn points(&self, curve: RemapCurve) -> &[CurvePoint] {
        &self.curves[curve.index()]
    }

    /// Evaluates `curve` at hue coordinate `x`.
    pub fn evaluate(&self, curve: RemapCurve, x: f64) -> f64 {
        let points = self.points(curve);
        match points {
            [] => return curve.default_value(),
            [p] => return p.y,
            _ => {}
        }
        let period = HUE_MAX - HUE_MIN;
        let x = HUE_MIN + (x - HUE_MIN).rem_euclid(period);

        // Last point at or before x, wrapping to the last point overall.
        let i1 = points.iter().rposition(|p| p.x <= x).unwrap_or(points.len() - 1);
        let i2 = (i1 + 1) % points.len();
        let (p1, p2) = (points[i1], points[i2]);

        let mut x2 = p2.x;
        let mut t = x;
        if i2 <= i1 {
            x2 += period;
        }
        if t < p1.x {
            t += period;
        }
        let span = x2 - p1.x;
        if span.abs() < 1e-9 {
            return p1.y;
        }
        p1.y + (t - p1.x) / span * (p2.y - p1.y)
    }
}

impl ParametricCurve for HueCurves {
    fn value(&self, curve: RemapCurve, _time: f64, x: f64) -> f64 {
        self.evaluate(curve, x)
    }
}

/// Hue remap parameters besides the curves.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HueRemapParams {
    /// Luminance formula for the saturation lerp and the luminance mix.
    pub luminance_math: LuminanceMath,
    /// How much of the source luminance is restored, in `[0, 1]`.
    pub luminance_mix: f64,
}

impl Default for HueRemapParams {
    fn default() -> Self {
        Self {
            luminance_math: LuminanceMath::Rec709,
            luminance_mix: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = HueCurves::new();
        assert_eq!(c.evaluate(RemapCurve::Sat, 3.3), 1.0);
        assert_eq!(c.evaluate(RemapCurve::SatThrsh, 3.3), 0.0);
    }

    #[test]
    fn test_linear_between_points() {
        let c = HueCurves::new().with(
            RemapCurve::Red,
            vec![CurvePoint::new(3.0, 0.0), CurvePoint::new(1.0, 2.0)],
        );
        assert_eq!(c.points(RemapCurve::Red)[0].x, 1.0);
        assert!((c.evaluate(RemapCurve::Red, 2.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_wraps_across_red() {
        let c = HueCurves::new().with(
            RemapCurve::Lum,
            vec![CurvePoint::new(2.0, 1.0), CurvePoint::new(6.0, 0.0)],
        );
        // 6 -> 8 (= 2) spans the red seam.
        assert!((c.evaluate(RemapCurve::Lum, 7.0) - 0.5).abs() < 1e-12);
        assert!((c.evaluate(RemapCurve::Lum, 1.0) - 0.5).abs() < 1e-12);
        assert!((c.evaluate(RemapCurve::Lum, 1.5) - 0.75).abs() < 1e-12);
        assert!((c.evaluate(RemapCurve::Lum, 6.5) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_curve_names() {
        assert_eq!(RemapCurve::ALL.map(RemapCurve::name)[8], "sat_thrsh");
        assert_eq!(RemapCurve::BSup.index(), 7);
    }
}
