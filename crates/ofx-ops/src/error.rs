//! Error types for pipeline operations.

use ofx_core::StatusCode;
use thiserror::Error;

/// Error type for pipeline operations.
#[derive(Error, Debug)]
pub enum OpsError {
    /// Host-facing error (format, missing input, host contract, allocation).
    #[error(transparent)]
    Core(#[from] ofx_core::Error),

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Buffers have incompatible sizes.
    #[error("size mismatch: {0}")]
    SizeMismatch(String),

    /// A kernel broke its contract with the processor.
    #[error("kernel contract violated: {0}")]
    KernelContract(String),
}

impl OpsError {
    /// OFX status code for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Core(e) => e.status(),
            Self::InvalidParameter(_) | Self::SizeMismatch(_) => StatusCode::ErrValue,
            Self::KernelContract(_) => StatusCode::ErrFatal,
        }
    }

    /// Message the host should keep displayed, if any.
    pub fn persistent_message(&self) -> Option<String> {
        match self {
            Self::Core(e) => e.persistent_message(),
            _ => None,
        }
    }
}

/// Result type for pipeline operations.
pub type OpsResult<T> = Result<T, OpsError>;
