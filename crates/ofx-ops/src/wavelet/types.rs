//! Parameter types for the wavelet denoiser.

/// Noise standard deviation of unit white noise at each wavelet level.
pub const NOISE_LEVELS: [f32; 8] = [0.8002, 0.2735, 0.1202, 0.0585, 0.0291, 0.0152, 0.0080, 0.0044];

/// Number of low-pass intensity buckets used by the adaptive estimate.
pub const ADAPTIVE_BUCKETS: usize = 5;

/// Colour space the three colour channels are denoised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ColorModel {
    /// Rec.709 Y'CbCr of sRGB-encoded values.
    #[default]
    YCbCr,
    /// CIE L\*a\*b\*, divided by 100.
    Lab,
    /// sRGB-encoded R'G'B'.
    Rgb,
    /// Linear RGB, untouched.
    LinearRgb,
}

impl ColorModel {
    /// Channel names, colour channels first.
    pub const fn channel_names(self) -> [&'static str; 4] {
        match self {
            Self::YCbCr => ["Y", "Cb", "Cr", "Alpha"],
            Self::Lab => ["L", "A", "B", "Alpha"],
            Self::Rgb | Self::LinearRgb => ["R", "G", "B", "Alpha"],
        }
    }
}

/// Wavelet denoiser parameters.
///
/// The four-element arrays are indexed by model channel: the three colour
/// channels of [`ColorModel`] then alpha. A single-channel image uses the
/// alpha entry.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WaveletParams {
    /// Threshold in units of the estimated noise deviation.
    pub threshold: [f64; 4],
    /// Fraction of sub-threshold detail kept, in `[0, 1]`.
    pub softness: [f64; 4],
    /// Colour space of the colour channels.
    pub color_model: ColorModel,
    /// Estimate noise from the image instead of the white-noise table.
    pub adaptive: bool,
    /// Sharpening amount per channel.
    pub amount: [f64; 4],
    /// Wavelet level (full resolution) where sharpening peaks.
    pub radius: f64,
}

impl Default for WaveletParams {
    fn default() -> Self {
        Self {
            threshold: [0.0; 4],
            softness: [0.0; 4],
            color_model: ColorModel::YCbCr,
            adaptive: true,
            amount: [0.0; 4],
            radius: 0.5,
        }
    }
}

impl WaveletParams {
    /// Same threshold and softness on every channel.
    pub fn uniform(threshold: f64, softness: f64) -> Self {
        Self {
            threshold: [threshold; 4],
            softness: [softness; 4],
            ..Default::default()
        }
    }

    /// Settings of model channel `i`.
    pub fn channel(&self, i: usize) -> ChannelSettings {
        ChannelSettings {
            threshold: self.threshold[i] as f32,
            softness: self.softness[i].clamp(0.0, 1.0) as f32,
            amount: self.amount[i] as f32,
        }
    }

    /// True when no channel is thresholded or sharpened.
    pub fn is_noop(&self) -> bool {
        (0..4).all(|i| self.channel(i).is_noop())
    }
}

/// Per-channel settings, resolved for one render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelSettings {
    /// Threshold multiplier.
    pub threshold: f32,
    /// Softness, clamped to `[0, 1]`.
    pub softness: f32,
    /// Sharpening amount.
    pub amount: f32,
}

impl ChannelSettings {
    /// Leaves the channel unchanged.
    #[inline]
    pub fn is_noop(&self) -> bool {
        self.threshold <= 0.0 && self.amount == 0.0
    }
}

/// Levels computed for one render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelRange {
    /// First full-resolution level, from the render scale.
    pub start: u32,
    /// Number of levels computed.
    pub count: u32,
}
