//! # ofx-core
//!
//! Core types for OFX per-pixel image effects.
//!
//! This crate provides the host-facing vocabulary used throughout the
//! workspace:
//!
//! - [`Rect`], [`RenderScale`] - Render windows, regions of definition and interest
//! - [`BitDepth`], [`ChannelLayout`], [`ChannelMask`], [`PremultState`], [`FieldOrder`] - Format descriptors
//! - [`Sample`] - Trait over the `u8` / `u16` / `f32` sample types
//! - [`PixelBuffer`], [`AnyImage`] - Host image buffers
//! - [`ImageMemory`], [`ScopedBuffer`] - Fallible scoped temporaries
//! - [`HostCapabilities`], [`Clip`], [`CancellationToken`] - What the host provides
//! - [`Error`], [`StatusCode`] - Errors and their OFX status codes
//!
//! ## Crate Structure
//!
//! ```text
//! ofx-core (this crate)
//!    ^
//!    |
//!    +-- ofx-math (matrices, interpolation)
//!    +-- ofx-color (colour models)
//!    +-- ofx-ops (compositing pipeline and kernels)
//!    +-- ofx-cli (host simulator)
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` - Enable serialization for format and geometry types

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod format;
pub mod host;
pub mod image;
pub mod memory;
pub mod pixel;
pub mod rect;

// Re-exports for convenience
pub use error::*;
pub use format::*;
pub use host::*;
pub use image::*;
pub use memory::*;
pub use pixel::Sample;
pub use rect::*;

/// Prelude module for convenient imports.
///
/// ```rust
/// use ofx_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{Error, Result, StatusCode};
    pub use crate::format::{BitDepth, ChannelLayout, ChannelMask, FieldOrder, PremultState};
    pub use crate::host::{CancellationToken, Clip, HostCapabilities};
    pub use crate::image::{AnyImage, PixelBuffer};
    pub use crate::memory::{ImageMemory, ScopedBuffer};
    pub use crate::pixel::Sample;
    pub use crate::rect::{Rect, RenderScale};
}
