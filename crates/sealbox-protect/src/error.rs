//! Error types for the protection layer.

use thiserror::Error;

/// Errors from protection operations.
#[derive(Debug, Error)]
pub enum ProtectError {
    /// Disk I/O failure reading the source or writing the artifact.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The PDF object model rejected the source document.
    #[error("pdf error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// Source document already carries its own encryption.
    #[error("document is already encrypted")]
    AlreadyEncrypted,

    /// Sealing primitive failure on the generic path.
    #[error("seal error: {0}")]
    Seal(#[from] sealbox_core::CoreError),
}

/// Result type for protection operations.
pub type Result<T> = std::result::Result<T, ProtectError>;
