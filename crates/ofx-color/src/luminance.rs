//! Luminance formulas.
//!
//! ```rust
//! use ofx_color::LuminanceMath;
//!
//! let grey = [0.5, 0.5, 0.5];
//! assert!((LuminanceMath::Rec709.luminance(grey) - 0.5).abs() < 1e-6);
//! assert_eq!(LuminanceMath::Maximum.luminance([0.1, 0.9, 0.3]), 0.9);
//! ```

use ofx_math::Vec3;

/// Rec.709 luma weights.
pub const REC709: Vec3 = Vec3::new(0.2126, 0.7152, 0.0722);
/// Rec.2020 luma weights.
pub const REC2020: Vec3 = Vec3::new(0.2627, 0.6780, 0.0593);
/// ACES AP0 luminance row of the AP0 to XYZ matrix.
pub const ACES_AP0: Vec3 = Vec3::new(0.3439664498, 0.7281660966, -0.0721325464);
/// ACES AP1 luminance row of the AP1 to XYZ matrix.
pub const ACES_AP1: Vec3 = Vec3::new(0.2722287168, 0.6740817658, 0.0536895174);
/// CCIR 601 luma weights.
pub const CCIR601: Vec3 = Vec3::new(0.299, 0.587, 0.114);

/// How a scalar luminance is derived from RGB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LuminanceMath {
    /// Rec.709 weights.
    #[default]
    Rec709,
    /// Rec.2020 weights.
    Rec2020,
    /// ACES AP0 weights.
    AcesAp0,
    /// ACES AP1 weights.
    AcesAp1,
    /// CCIR 601 weights.
    Ccir601,
    /// Mean of the three channels.
    Average,
    /// Largest channel.
    Maximum,
}

impl LuminanceMath {
    /// Luminance of an RGB triplet.
    #[inline]
    pub fn luminance(self, rgb: impl Into<Vec3>) -> f32 {
        let rgb = rgb.into();
        match self {
            Self::Rec709 => rgb.dot(REC709),
            Self::Rec2020 => rgb.dot(REC2020),
            Self::AcesAp0 => rgb.dot(ACES_AP0),
            Self::AcesAp1 => rgb.dot(ACES_AP1),
            Self::Ccir601 => rgb.dot(CCIR601),
            Self::Average => rgb.sum() / 3.0,
            Self::Maximum => rgb.max_element(),
        }
    }
}
