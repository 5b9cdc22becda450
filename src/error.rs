//! Error types for neardup.

use thiserror::Error;

/// Errors that can occur during distance computation or index operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NeardupError {
    /// Byte-length mismatch between two signatures that must be comparable.
    #[error("signature length mismatch: expected {expected} bytes, got {got}")]
    LengthMismatch { expected: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Handle does not name a live LSH index.
    #[error("invalid index handle: {0}")]
    InvalidHandle(u32),
}

/// Result type alias for neardup operations.
pub type Result<T> = std::result::Result<T, NeardupError>;
