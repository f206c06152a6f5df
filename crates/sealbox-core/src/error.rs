//! Error types for core primitives.

use thiserror::Error;

/// Errors from core primitives.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Payload was not valid base64.
    #[error("invalid payload encoding: {0}")]
    Encoding(#[from] base64::DecodeError),

    /// Payload too short to contain an IV.
    #[error("payload truncated: {0} bytes, need at least 16")]
    Truncated(usize),

    /// Decryption failed (wrong password or corrupted payload).
    #[error("decryption failed")]
    DecryptFailed,

    /// Identifier was not valid hex of the expected length.
    #[error("invalid file id: {0}")]
    InvalidFileId(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
