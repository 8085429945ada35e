//! What the pipeline consumes from the host.
//!
//! - [`HostCapabilities`] - Immutable capability flags, checked against every fetch
//! - [`Clip`] - A named input: fetched image, region of definition, pixel aspect
//! - [`CancellationToken`] - The host's abort signal
//!
//! # Tiling contract
//!
//! A host that does not support tiles must hand over images covering the
//! whole region of definition; a host without multi-resolution support must
//! render at scale 1. A violation is a host bug: it is reported as a fatal
//! [`Error::HostContract`] and never patched over.
//!
//! ```rust
//! use ofx_core::{HostCapabilities, Rect, RenderScale};
//!
//! let caps = HostCapabilities::untiled();
//! let rod = Rect::new(0, 0, 100, 100);
//! assert!(caps.check_fetched("Source", rod, rod, RenderScale::FULL).is_ok());
//! assert!(caps.check_fetched("Source", Rect::new(0, 0, 50, 100), rod, RenderScale::FULL).is_err());
//! ```

use crate::error::{Error, Result};
use crate::format::BitDepth;
use crate::image::PixelBuffer;
use crate::pixel::Sample;
use crate::rect::{Rect, RenderScale};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

/// Set of bit depths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthSet(u8);

impl DepthSet {
    /// Every depth.
    pub const ALL: Self = Self(0b111);
    /// Float only.
    pub const FLOAT: Self = Self(0b100);

    const fn bit(depth: BitDepth) -> u8 {
        match depth {
            BitDepth::U8 => 0b001,
            BitDepth::U16 => 0b010,
            BitDepth::F32 => 0b100,
        }
    }

    /// Returns `true` if `depth` is in the set.
    #[inline]
    pub const fn contains(&self, depth: BitDepth) -> bool {
        self.0 & Self::bit(depth) != 0
    }

    /// Set with `depth` added.
    #[inline]
    pub const fn with(self, depth: BitDepth) -> Self {
        Self(self.0 | Self::bit(depth))
    }
}

/// Host capability flags, fixed for the lifetime of a plugin instance.
///
/// Built once at describe time and passed by reference into every render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostCapabilities {
    /// Host may request partial render windows and hand over partial images.
    pub supports_tiles: bool,
    /// Host may render at a proxy scale.
    pub supports_multi_resolution: bool,
    /// Depths the host will use.
    pub supported_depths: DepthSet,
}

impl HostCapabilities {
    /// A host that tiles, renders proxies and handles every depth.
    pub const fn full() -> Self {
        Self {
            supports_tiles: true,
            supports_multi_resolution: true,
            supported_depths: DepthSet::ALL,
        }
    }

    /// A host without tiling or multi-resolution support.
    pub const fn untiled() -> Self {
        Self {
            supports_tiles: false,
            supports_multi_resolution: false,
            supported_depths: DepthSet::ALL,
        }
    }

    /// Rejects depths the host did not declare.
    pub fn check_depth(&self, depth: BitDepth) -> Result<()> {
        if self.supported_depths.contains(depth) {
            Ok(())
        } else {
            Err(Error::UnsupportedDepth(depth))
        }
    }

    /// Validates a fetched image against the tiling and multi-resolution
    /// contract.
    ///
    /// # Errors
    ///
    /// [`Error::HostContract`] when an untiled host hands over bounds other
    /// than the region of definition, or a single-resolution host renders at
    /// a scale other than 1.
    pub fn check_fetched(&self, clip: &str, bounds: Rect, rod: Rect, scale: RenderScale) -> Result<()> {
        if !self.supports_multi_resolution && !scale.is_full() {
            warn!(clip, %scale, "render scale on a single-resolution host");
            return Err(Error::host_contract(format!(
                "{clip}: render scale {scale} but multi-resolution is not supported"
            )));
        }
        if !self.supports_tiles && bounds != rod {
            warn!(clip, %bounds, %rod, "partial image on an untiled host");
            return Err(Error::host_contract(format!(
                "{clip}: image bounds {bounds} differ from region of definition {rod} but tiles are not supported"
            )));
        }
        Ok(())
    }

    /// Validates a render window: untiled hosts always render the whole
    /// output region of definition.
    pub fn check_window(&self, window: Rect, rod: Rect) -> Result<()> {
        if !self.supports_tiles && window != rod {
            warn!(%window, %rod, "partial render window on an untiled host");
            return Err(Error::host_contract(format!(
                "render window {window} differs from region of definition {rod} but tiles are not supported"
            )));
        }
        Ok(())
    }
}

impl Default for HostCapabilities {
    fn default() -> Self {
        Self::full()
    }
}

/// One input clip of an effect, as seen during a render call.
///
/// Models the host's `fetchImage`, `getRegionOfDefinition` and
/// `getPixelAspectRatio` for that clip.
#[derive(Debug, Clone, Copy)]
pub struct Clip<'a, T: Sample> {
    name: &'a str,
    image: Option<&'a PixelBuffer<T>>,
    rod: Rect,
    pixel_aspect: f64,
}

impl<'a, T: Sample> Clip<'a, T> {
    /// Connected clip whose region of definition equals the image bounds.
    pub fn connected(name: &'a str, image: &'a PixelBuffer<T>) -> Self {
        Self {
            name,
            image: Some(image),
            rod: image.bounds(),
            pixel_aspect: 1.0,
        }
    }

    /// Clip with nothing plugged in.
    pub fn disconnected(name: &'a str) -> Self {
        Self {
            name,
            image: None,
            rod: Rect::EMPTY,
            pixel_aspect: 1.0,
        }
    }

    /// Clip from an optional image.
    pub fn from_option(name: &'a str, image: Option<&'a PixelBuffer<T>>) -> Self {
        match image {
            Some(img) => Self::connected(name, img),
            None => Self::disconnected(name),
        }
    }

    /// Overrides the region of definition (the image may be a tile of it).
    pub fn with_rod(mut self, rod: Rect) -> Self {
        self.rod = rod;
        self
    }

    /// Overrides the pixel aspect ratio.
    pub fn with_pixel_aspect(mut self, par: f64) -> Self {
        self.pixel_aspect = par;
        self
    }

    /// Clip name, used in error messages.
    #[inline]
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// Returns `true` if an image is plugged in.
    #[inline]
    pub fn is_connected(&self) -> bool {
        self.image.is_some()
    }

    /// The fetched image, if connected.
    #[inline]
    pub fn fetch(&self) -> Option<&'a PixelBuffer<T>> {
        self.image
    }

    /// Fetches a required image.
    ///
    /// # Errors
    ///
    /// [`Error::MissingInput`] naming the clip.
    pub fn fetch_required(&self) -> Result<&'a PixelBuffer<T>> {
        self.image.ok_or_else(|| Error::missing_input(self.name))
    }

    /// Region of definition of the clip.
    #[inline]
    pub fn region_of_definition(&self) -> Rect {
        self.rod
    }

    /// Pixel aspect ratio of the clip.
    #[inline]
    pub fn pixel_aspect_ratio(&self) -> f64 {
        self.pixel_aspect
    }
}

/// Cooperative cancellation signal.
///
/// Cloned into worker closures; the host side calls
/// [`cancel`](Self::cancel), render loops poll
/// [`is_cancelled`](Self::is_cancelled) once per row or iteration.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// The host's `abort()`.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::ChannelLayout;

    #[test]
    fn test_multires_contract() {
        let caps = HostCapabilities::untiled();
        let rod = Rect::new(0, 0, 8, 8);
        let err = caps
            .check_fetched("Source", rod, rod, RenderScale::new(0.5, 0.5))
            .unwrap_err();
        assert!(matches!(err, Error::HostContract(_)));
        assert!(HostCapabilities::full()
            .check_fetched("Source", Rect::new(0, 0, 4, 4), rod, RenderScale::new(0.5, 0.5))
            .is_ok());
    }

    #[test]
    fn test_window_contract() {
        let caps = HostCapabilities::untiled();
        let rod = Rect::new(0, 0, 8, 8);
        assert!(caps.check_window(rod, rod).is_ok());
        assert!(caps.check_window(Rect::new(0, 0, 8, 4), rod).is_err());
    }

    #[test]
    fn test_depth_set() {
        let caps = HostCapabilities {
            supported_depths: DepthSet::FLOAT.with(BitDepth::U16),
            ..HostCapabilities::full()
        };
        assert!(caps.check_depth(BitDepth::F32).is_ok());
        assert!(caps.check_depth(BitDepth::U16).is_ok());
        assert!(matches!(caps.check_depth(BitDepth::U8), Err(Error::UnsupportedDepth(BitDepth::U8))));
    }

    #[test]
    fn test_clip_fetch() {
        let img: PixelBuffer<f32> = PixelBuffer::new(Rect::new(0, 0, 2, 2), ChannelLayout::Rgba);
        let clip = Clip::connected("Source", &img).with_rod(Rect::new(0, 0, 4, 4));
        assert!(clip.is_connected());
        assert_eq!(clip.region_of_definition(), Rect::new(0, 0, 4, 4));

        let missing: Clip<'_, f32> = Clip::disconnected("C");
        let err = missing.fetch_required().unwrap_err();
        assert!(err.persistent_message().unwrap().contains("C input"));
    }

    #[test]
    fn test_cancellation_shared() {
        let token = CancellationToken::new();
        let worker = token.clone();
        assert!(!worker.is_cancelled());
        token.cancel();
        assert!(worker.is_cancelled());
    }
}
