//! Error types for hostsim-core.

use crate::SessionId;
use thiserror::Error;

/// Result type alias for hostsim-core operations.
pub type Result<T> = std::result::Result<T, EmulatorError>;

/// Errors raised by the emulated platform API.
#[derive(Debug, Error)]
pub enum EmulatorError {
    /// Missing or wrong-typed argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Payload field exceeds the platform size cap
    #[error("{field} exceeds maximum size: {len} > {max} UTF-16 code units")]
    SizeExceeded {
        /// Name of the offending field
        field: &'static str,
        /// Measured length in UTF-16 code units
        len: usize,
        /// Maximum allowed length
        max: usize,
    },

    /// Target buffer cannot hold the encoded value
    #[error("buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall {
        /// Bytes required from the start of the buffer
        needed: usize,
        /// Actual buffer length
        available: usize,
    },

    /// A driver session reported more than once
    #[error("session {0} already reported a result")]
    AlreadyReported(SessionId),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EmulatorError {
    /// Shorthand for [`EmulatorError::InvalidArgument`].
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}
