//! Error types for ofx-core operations.
//!
//! This module provides the error taxonomy shared by every render path in
//! the workspace.
//!
//! # Overview
//!
//! The [`Error`] enum covers every fatal condition a render call can report
//! back to the host:
//! - Format errors (bit depth / component count mismatch)
//! - Missing required inputs
//! - Render scale or field mismatch on host-supplied images
//! - Host contract violations (tiling / multi-resolution invariants)
//! - Allocation failures of temporary buffers
//!
//! Cancellation is never an error: a render aborted by the host returns
//! `Ok(())` with whatever rows were already written.
//!
//! # Status codes
//!
//! Every error maps to an OFX status code through [`Error::status`], so a
//! host adapter can hand the result straight back to the host.
//!
//! # Usage
//!
//! ```rust
//! use ofx_core::{Error, Result, StatusCode};
//!
//! fn check_clean_plate(present: bool) -> Result<()> {
//!     if !present {
//!         return Err(Error::missing_input("C"));
//!     }
//!     Ok(())
//! }
//!
//! let err = check_clean_plate(false).unwrap_err();
//! assert_eq!(err.status(), StatusCode::Failed);
//! assert!(err.persistent_message().unwrap().contains("C"));
//! ```
//!
//! # Dependencies
//!
//! - [`thiserror`] - For derive macro error implementation

use crate::format::{BitDepth, ChannelLayout, FieldOrder};
use crate::rect::{Rect, RenderScale};
use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// OFX status codes returned to the host.
///
/// Values match the `kOfxStat*` constants of the OpenFX C API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum StatusCode {
    /// `kOfxStatOK`
    Ok = 0,
    /// `kOfxStatFailed`
    Failed = 1,
    /// `kOfxStatErrFatal`
    ErrFatal = 2,
    /// `kOfxStatErrMemory`
    ErrMemory = 8,
    /// `kOfxStatErrValue`
    ErrValue = 11,
    /// `kOfxStatErrImageFormat`
    ErrImageFormat = 1000,
}

impl StatusCode {
    /// Raw integer value as seen by the host.
    #[inline]
    pub const fn code(self) -> i32 {
        self as i32
    }
}

/// Errors that can occur while rendering.
///
/// # Categories
///
/// - **Format errors**: [`ComponentMismatch`](Error::ComponentMismatch),
///   [`DepthMismatch`](Error::DepthMismatch), [`UnsupportedDepth`](Error::UnsupportedDepth),
///   [`UnsupportedLayout`](Error::UnsupportedLayout)
/// - **Input errors**: [`MissingInput`](Error::MissingInput)
/// - **Host image errors**: [`ScaleMismatch`](Error::ScaleMismatch), [`FieldMismatch`](Error::FieldMismatch)
/// - **Host contract**: [`HostContract`](Error::HostContract)
/// - **Allocation errors**: [`AllocationFailed`](Error::AllocationFailed)
/// - **Geometry errors**: [`InvalidRegion`](Error::InvalidRegion), [`InvalidDimensions`](Error::InvalidDimensions)
#[derive(Debug, Error)]
pub enum Error {
    /// Component count differs between two images that must agree.
    ///
    /// Raised between source and destination, or between the two sources
    /// of a dual-input kernel.
    #[error("component mismatch: expected {expected} components, got {got}")]
    ComponentMismatch {
        /// Expected component count
        expected: usize,
        /// Actual component count
        got: usize,
    },

    /// Bit depth differs between two images that must agree.
    #[error("bit depth mismatch: expected {expected:?}, got {got:?}")]
    DepthMismatch {
        /// Expected depth
        expected: BitDepth,
        /// Actual depth
        got: BitDepth,
    },

    /// The host asked for a depth this plugin did not declare.
    #[error("unsupported bit depth: {0:?}")]
    UnsupportedDepth(BitDepth),

    /// The effect cannot process this channel layout.
    #[error("unsupported channel layout: {0:?}")]
    UnsupportedLayout(ChannelLayout),

    /// A required input clip is not connected.
    #[error("required input '{clip}' is not connected")]
    MissingInput {
        /// Clip name
        clip: String,
    },

    /// Host-supplied image has a different render scale than requested.
    #[error("image render scale {got} does not match requested {expected}")]
    ScaleMismatch {
        /// Requested scale
        expected: RenderScale,
        /// Scale carried by the image
        got: RenderScale,
    },

    /// Host-supplied image has a different field than requested.
    #[error("image field {got:?} does not match requested {expected:?}")]
    FieldMismatch {
        /// Requested field
        expected: FieldOrder,
        /// Field carried by the image
        got: FieldOrder,
    },

    /// The host violated a declared capability (tiling, multi-resolution).
    #[error("host contract violated: {0}")]
    HostContract(String),

    /// Temporary buffer allocation failed.
    #[error("failed to allocate {requested} bytes: {reason}")]
    AllocationFailed {
        /// Bytes requested
        requested: usize,
        /// Failure reason
        reason: String,
    },

    /// A region lies outside the buffer it addresses.
    #[error("region {region} is outside buffer bounds {bounds}")]
    InvalidRegion {
        /// Offending region
        region: Rect,
        /// Buffer bounds
        bounds: Rect,
    },

    /// Buffer dimensions are inconsistent with its data.
    #[error("invalid dimensions: {width}x{height} ({reason})")]
    InvalidDimensions {
        /// Width in pixels
        width: usize,
        /// Height in pixels
        height: usize,
        /// Why they are invalid
        reason: String,
    },

    /// Generic error with custom message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Creates an [`Error::ComponentMismatch`] error.
    #[inline]
    pub fn component_mismatch(expected: usize, got: usize) -> Self {
        Self::ComponentMismatch { expected, got }
    }

    /// Creates an [`Error::DepthMismatch`] error.
    #[inline]
    pub fn depth_mismatch(expected: BitDepth, got: BitDepth) -> Self {
        Self::DepthMismatch { expected, got }
    }

    /// Creates an [`Error::MissingInput`] error.
    #[inline]
    pub fn missing_input(clip: impl Into<String>) -> Self {
        Self::MissingInput { clip: clip.into() }
    }

    /// Creates an [`Error::HostContract`] error.
    #[inline]
    pub fn host_contract(msg: impl Into<String>) -> Self {
        Self::HostContract(msg.into())
    }

    /// Creates an [`Error::AllocationFailed`] error.
    #[inline]
    pub fn allocation_failed(requested: usize, reason: impl Into<String>) -> Self {
        Self::AllocationFailed {
            requested,
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::InvalidDimensions`] error.
    #[inline]
    pub fn invalid_dimensions(width: usize, height: usize, reason: impl Into<String>) -> Self {
        Self::InvalidDimensions {
            width,
            height,
            reason: reason.into(),
        }
    }

    /// Creates an [`Error::Other`] error.
    #[inline]
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// OFX status code for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::ComponentMismatch { .. }
            | Self::DepthMismatch { .. }
            | Self::UnsupportedDepth(_)
            | Self::UnsupportedLayout(_) => StatusCode::ErrImageFormat,
            Self::MissingInput { .. } | Self::ScaleMismatch { .. } | Self::FieldMismatch { .. } => {
                StatusCode::Failed
            }
            Self::HostContract(_) => StatusCode::ErrFatal,
            Self::AllocationFailed { .. } => StatusCode::ErrMemory,
            Self::InvalidRegion { .. } | Self::InvalidDimensions { .. } => StatusCode::ErrValue,
            Self::Other(_) => StatusCode::Failed,
        }
    }

    /// Message the host should keep on screen until the next successful render.
    ///
    /// Only errors the user can act on carry one.
    pub fn persistent_message(&self) -> Option<String> {
        match self {
            Self::MissingInput { clip } => Some(format!(
                "The {clip} input is required but not connected"
            )),
            Self::ScaleMismatch { .. } | Self::FieldMismatch { .. } => Some(
                "OFX Host gave image with wrong scale or field properties".to_string(),
            ),
            _ => None,
        }
    }

    /// Returns `true` for bit depth / component format errors.
    #[inline]
    pub fn is_format_error(&self) -> bool {
        self.status() == StatusCode::ErrImageFormat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_mismatch() {
        let err = Error::component_mismatch(4, 3);
        assert!(err.to_string().contains('4'));
        assert!(err.is_format_error());
        assert_eq!(err.status().code(), 1000);
        assert!(err.persistent_message().is_none());
    }

    #[test]
    fn test_missing_input_message() {
        let err = Error::missing_input("C");
        assert_eq!(err.status(), StatusCode::Failed);
        let msg = err.persistent_message().unwrap();
        assert!(msg.contains("C input"));
    }

    #[test]
    fn test_scale_mismatch_is_persistent() {
        let err = Error::ScaleMismatch {
            expected: RenderScale::FULL,
            got: RenderScale::new(0.5, 0.5),
        };
        assert!(err.persistent_message().is_some());
        assert!(!err.is_format_error());
    }

    #[test]
    fn test_allocation_status() {
        let err = Error::allocation_failed(1 << 40, "out of memory");
        assert_eq!(err.status(), StatusCode::ErrMemory);
        assert!(err.to_string().contains("out of memory"));
    }
}
