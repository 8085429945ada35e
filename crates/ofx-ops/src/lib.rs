//! # ofx-ops
//!
//! Per-pixel compositing pipeline for OFX image effects, plus the kernels
//! that run inside it.
//!
//! # Modules
//!
//! - [`maskmix`] - Mask / mix blending into the background
//! - [`premult`] - Premultiplied ⇄ unpremultiplied conversion
//! - [`boundary`] - Out-of-bounds neighbourhood reads
//! - [`region`] - Regions of interest and render-scale helpers
//! - [`planar`] - Interleaved ⇄ planar float images
//! - [`parallel`] - Row-parallel helpers
//! - [`processor`] - The dual-input [`RenderPipeline`](processor::RenderPipeline)
//! - [`bilateral`] - Iterated bilateral filter, optionally guided by B
//! - [`wavelet`] - À-trous wavelet denoiser
//! - [`hue_remap`] - Hue-dependent colour remap
//! - [`pik`] - PIK colour-difference keyer
//!
//! # Example
//!
//! ```rust
//! use ofx_core::{CancellationToken, ChannelLayout, PixelBuffer, Rect};
//! use ofx_ops::bilateral::{BilateralKernel, BilateralParams};
//! use ofx_ops::processor::{RenderArgs, RenderClips, RenderPipeline};
//!
//! let bounds = Rect::new(0, 0, 16, 16);
//! let src = PixelBuffer::filled(bounds, ChannelLayout::Rgb, &[0.5f32, 0.5, 0.5]);
//! let mut dst = PixelBuffer::new(bounds, ChannelLayout::Rgb);
//!
//! let pipeline = RenderPipeline::new(BilateralKernel::new(BilateralParams {
//!     sigma_s: 2.0,
//!     ..Default::default()
//! }));
//! pipeline
//!     .render(&RenderArgs::new(bounds), &RenderClips::new(bounds, Some(&src)), &mut dst, &CancellationToken::new())
//!     .unwrap();
//! assert!((dst.pixel(8, 8).unwrap()[1] - 0.5).abs() < 1e-5);
//! ```
//!
//! # Feature Flags
//!
//! - `serde` - Serialize kernel parameters (JSON presets)

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod bilateral;
pub mod boundary;
pub mod hue_remap;
pub mod maskmix;
pub mod parallel;
pub mod pik;
pub mod planar;
pub mod premult;
pub mod processor;
pub mod region;
pub mod wavelet;

pub use error::{OpsError, OpsResult};
pub use boundary::TileBoundaryPolicy;
pub use maskmix::{MaskMixCompositor, MaskMixParams};
pub use processor::{IdentityResult, PixelKernel, RenderArgs, RenderClips, RenderPipeline};
