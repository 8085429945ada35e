//! Parameter and result types of the PIK keyer.

/// Which screen colour the key is pulled against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ScreenType {
    /// Green screen, clean plate from input C.
    #[default]
    Green,
    /// Blue screen, clean plate from input C.
    Blue,
    /// Constant picked colour, C unused.
    Pick,
}

/// What the keyer writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum OutputMode {
    /// Foreground as received.
    Source,
    /// Foreground alpha, in every channel.
    SourceAlpha,
    /// Screen colour.
    CleanPlate,
    /// Screen matte after the clip, in every channel.
    ScreenMatte,
    /// Inside mask, in every channel.
    InsideMask,
    /// Outside mask, in every channel.
    OutsideMask,
    /// Final matte, in every channel.
    CombinedMatte,
    /// Grey classification: black transparent, white solid, grey in between.
    Status,
    /// Despilled colour with the raw screen matte.
    Intermediate,
    /// Keyed foreground, premultiplied.
    #[default]
    Premultiplied,
    /// Keyed foreground, unpremultiplied.
    Unpremultiplied,
    /// Keyed foreground over the background.
    Composite,
}

impl OutputMode {
    /// Every mode, in menu order.
    pub const ALL: [Self; 12] = [
        Self::Source,
        Self::SourceAlpha,
        Self::CleanPlate,
        Self::ScreenMatte,
        Self::InsideMask,
        Self::OutsideMask,
        Self::CombinedMatte,
        Self::Status,
        Self::Intermediate,
        Self::Premultiplied,
        Self::Unpremultiplied,
        Self::Composite,
    ];
}

/// Colour added where a later stage raises alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ReplaceMode {
    /// Nothing added; the raised alpha shows the despilled colour.
    None,
    /// The original foreground colour.
    Source,
    /// The replace colour.
    HardColor,
    /// The replace colour, matched to the foreground luminance.
    #[default]
    SoftColor,
}

/// What the foreground alpha contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SourceAlphaHandling {
    /// Foreground alpha is ignored.
    #[default]
    Ignore,
    /// Foreground alpha is merged into the inside mask.
    AddToInsideMask,
}

/// How far the keying of one pixel went.
///
/// Stages only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum KeyStage {
    /// Nothing keyed yet; pass-through modes stop here.
    #[default]
    NotComposited,
    /// Raw screen matte and despill computed.
    ScreenMatte,
    /// Screen clip applied.
    ClipAdjusted,
    /// Inside mask applied.
    InsideMaskApplied,
    /// Outside mask applied.
    OutsideMaskApplied,
    /// Composited over the background.
    FinalComposite,
}

/// PIK parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PikParams {
    /// Screen colour source.
    pub screen_type: ScreenType,
    /// Screen colour for [`ScreenType::Pick`], linear RGB.
    pub pick_color: [f64; 3],
    /// Weight of red in the key.
    pub red_weight: f64,
    /// Weight of the other of blue / green in the key.
    pub blue_green_weight: f64,
    /// Per-channel key bias, 0.5 neutral.
    pub alpha_bias: [f64; 3],
    /// Per-channel despill bias, 0.5 neutral.
    pub despill_bias: [f64; 3],
    /// Use `alpha_bias` for the despill too.
    pub despill_bias_is_alpha_bias: bool,
    /// Subtract the screen colour from the foreground.
    pub screen_subtraction: bool,
    /// Clamp the raw matte to `[0, 1]`.
    pub clamp_alpha: bool,
    /// Screen matte black point.
    pub screen_clip_min: f64,
    /// Screen matte white point.
    pub screen_clip_max: f64,
    /// Colour added where the screen clip raises alpha.
    pub screen_replace: ReplaceMode,
    /// Replace colour for the screen clip.
    pub screen_replace_color: [f64; 3],
    /// Foreground alpha handling.
    pub source_alpha: SourceAlphaHandling,
    /// Colour added where the inside mask raises alpha.
    pub inside_replace: ReplaceMode,
    /// Replace colour for the inside mask.
    pub inside_replace_color: [f64; 3],
    /// Amount of background luminance taken by edges, `[0, 1]`.
    pub ubl: f64,
    /// Amount of background chroma taken by edges, `[0, 1]`.
    pub ubc: f64,
    /// What is written.
    pub output_mode: OutputMode,
}

impl Default for PikParams {
    fn default() -> Self {
        Self {
            screen_type: ScreenType::Green,
            pick_color: [0.0, 1.0, 0.0],
            red_weight: 0.5,
            blue_green_weight: 0.5,
            alpha_bias: [0.5; 3],
            despill_bias: [0.5; 3],
            despill_bias_is_alpha_bias: true,
            screen_subtraction: true,
            clamp_alpha: true,
            screen_clip_min: 0.0,
            screen_clip_max: 1.0,
            screen_replace: ReplaceMode::SoftColor,
            screen_replace_color: [0.5; 3],
            source_alpha: SourceAlphaHandling::Ignore,
            inside_replace: ReplaceMode::SoftColor,
            inside_replace_color: [0.5; 3],
            ubl: 0.0,
            ubc: 0.0,
            output_mode: OutputMode::Premultiplied,
        }
    }
}

impl PikParams {
    /// Whether input C must be connected.
    #[inline]
    pub fn needs_clean_plate(&self) -> bool {
        self.screen_type != ScreenType::Pick
    }

    /// Key channel is green, as opposed to blue.
    ///
    /// A picked screen keys on whichever of green or blue dominates it.
    #[inline]
    pub fn keys_green(&self) -> bool {
        match self.screen_type {
            ScreenType::Green => true,
            ScreenType::Blue => false,
            ScreenType::Pick => self.pick_color[1] >= self.pick_color[2],
        }
    }
}

/// Normalised, unpremultiplied inputs of one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PikSample {
    /// Foreground, RGBA.
    pub fg: [f32; 4],
    /// Pre-processed foreground the key is pulled from, RGB.
    pub pfg: [f32; 3],
    /// Screen colour, RGB.
    pub c: [f32; 3],
    /// Background, RGBA.
    pub bg: [f32; 4],
    /// Inside mask value.
    pub inside: f32,
    /// Outside mask value.
    pub outside: f32,
}

impl PikSample {
    /// Sample with `pfg` taken from `fg` and no masks or background.
    pub fn new(fg: [f32; 4], c: [f32; 3]) -> Self {
        Self {
            fg,
            pfg: [fg[0], fg[1], fg[2]],
            c,
            ..Default::default()
        }
    }
}

/// Keyer result for one pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PikPixel {
    /// Output RGBA, normalised.
    pub rgba: [f32; 4],
    /// Last stage reached.
    pub stage: KeyStage,
}
