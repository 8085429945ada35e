//! Pixel format descriptors.
//!
//! This module provides the runtime descriptors that travel with every
//! image handed over by the host.
//!
//! # Types
//!
//! - [`BitDepth`] - Sample type (8-bit, 16-bit, 32-bit float)
//! - [`ChannelLayout`] - Interleaved components per pixel
//! - [`ChannelMask`] - Bitset of channels a kernel actually processes
//! - [`PremultState`] - Premultiplication state of the color channels
//! - [`FieldOrder`] - Interlaced field carried by an image
//!
//! # Usage
//!
//! ```rust
//! use ofx_core::format::{BitDepth, ChannelLayout};
//!
//! let layout = ChannelLayout::Rgba;
//! assert_eq!(layout.components(), 4);
//! assert_eq!(BitDepth::U8.max_value(), 255.0);
//! ```

/// Bit depth of the samples in an image.
///
/// OFX image effects exchange bytes, shorts and floats; other depths are
/// never handed to a render call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BitDepth {
    /// 8-bit unsigned integer.
    U8,
    /// 16-bit unsigned integer.
    U16,
    /// 32-bit single-precision float.
    #[default]
    F32,
}

impl BitDepth {
    /// Number of bits per channel.
    #[inline]
    pub const fn bits(&self) -> u32 {
        match self {
            Self::U8 => 8,
            Self::U16 => 16,
            Self::F32 => 32,
        }
    }

    /// Bytes per channel.
    #[inline]
    pub const fn bytes(&self) -> usize {
        (self.bits() / 8) as usize
    }

    /// Whether this is a floating-point format.
    #[inline]
    pub const fn is_float(&self) -> bool {
        matches!(self, Self::F32)
    }

    /// Value that represents full intensity.
    ///
    /// 1.0 for floats; the integer maximum otherwise.
    #[inline]
    pub const fn max_value(&self) -> f32 {
        match self {
            Self::U8 => 255.0,
            Self::U16 => 65535.0,
            Self::F32 => 1.0,
        }
    }
}

/// Interleaved component layout of a pixel buffer.
///
/// The component count is resolved once per render call; per-pixel loops
/// take it as a plain runtime value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChannelLayout {
    /// Single alpha channel.
    Alpha,
    /// Two-channel vector (motion vectors, distortion maps).
    Xy,
    /// Red, green, blue.
    Rgb,
    /// Red, green, blue, alpha.
    #[default]
    Rgba,
}

impl ChannelLayout {
    /// Number of interleaved components.
    #[inline]
    pub const fn components(&self) -> usize {
        match self {
            Self::Alpha => 1,
            Self::Xy => 2,
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }

    /// Layout for a component count, if one exists.
    pub const fn from_components(n: usize) -> Option<Self> {
        match n {
            1 => Some(Self::Alpha),
            2 => Some(Self::Xy),
            3 => Some(Self::Rgb),
            4 => Some(Self::Rgba),
            _ => None,
        }
    }

    /// Whether the layout carries an alpha channel that can hold a
    /// premultiplication factor.
    #[inline]
    pub const fn has_alpha(&self) -> bool {
        matches!(self, Self::Rgba)
    }

    /// Whether the first three components are color.
    #[inline]
    pub const fn has_color(&self) -> bool {
        matches!(self, Self::Rgb | Self::Rgba)
    }

    /// Index of the alpha component, if any.
    #[inline]
    pub const fn alpha_index(&self) -> Option<usize> {
        match self {
            Self::Alpha => Some(0),
            Self::Rgba => Some(3),
            Self::Xy | Self::Rgb => None,
        }
    }
}

/// Bitset of channels (R, G, B, A) a kernel processes.
///
/// Channels outside the mask are copied from the source unchanged. Bits are
/// indexed by component position inside the buffer layout, so for
/// [`ChannelLayout::Alpha`] bit 0 is the alpha channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelMask(u8);

impl ChannelMask {
    /// Every channel.
    pub const ALL: Self = Self(0b1111);
    /// Only the three color channels.
    pub const RGB: Self = Self(0b0111);
    /// No channel.
    pub const NONE: Self = Self(0);

    /// Builds a mask from per-channel flags.
    #[inline]
    pub const fn new(r: bool, g: bool, b: bool, a: bool) -> Self {
        Self((r as u8) | ((g as u8) << 1) | ((b as u8) << 2) | ((a as u8) << 3))
    }

    /// Whether component `c` is processed.
    #[inline]
    pub const fn contains(&self, c: usize) -> bool {
        c < 4 && self.0 & (1 << c) != 0
    }

    /// Whether any of the first `n` components is processed.
    #[inline]
    pub const fn any(&self, n: usize) -> bool {
        let bits = if n >= 4 { 0b1111 } else { (1u8 << n) - 1 };
        self.0 & bits != 0
    }

    /// Restricts the mask to a layout.
    ///
    /// For a single-channel layout, the alpha flag drives component 0.
    pub const fn for_layout(&self, layout: ChannelLayout) -> Self {
        match layout {
            ChannelLayout::Alpha => Self((self.0 >> 3) & 1),
            ChannelLayout::Xy => Self(self.0 & 0b0011),
            ChannelLayout::Rgb => Self(self.0 & 0b0111),
            ChannelLayout::Rgba => Self(self.0 & 0b1111),
        }
    }
}

impl Default for ChannelMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// Premultiplication state of an image's color channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PremultState {
    /// No alpha, or alpha is 1 everywhere.
    Opaque,
    /// Color channels are multiplied by alpha.
    #[default]
    Premultiplied,
    /// Color channels are independent from alpha.
    UnPremultiplied,
}

/// Interlaced field carried by an image or requested by a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldOrder {
    /// Progressive frame.
    #[default]
    None,
    /// Both fields interleaved.
    Both,
    /// Lower field only.
    Lower,
    /// Upper field only.
    Upper,
}
