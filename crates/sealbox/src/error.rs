//! Error types for the Vault.

use sealbox_protect::ProtectError;
use sealbox_store::StoreError;
use thiserror::Error;

/// Errors that can occur during Vault operations.
///
/// The 404-vs-401 distinction is deliberate: a missing artifact is
/// [`VaultError::NotFound`], a wrong password on an existing artifact is
/// [`VaultError::Unauthorized`]. A record whose bytes are gone from disk
/// also surfaces as `NotFound`, after the integrity anomaly has been
/// logged.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Role/permission denial, or wrong file password. Carries no detail
    /// beyond the rejection.
    #[error("unauthorized")]
    Unauthorized,

    /// No artifact for the id, or the artifact bytes are missing.
    #[error("not found")]
    NotFound,

    /// Storage fault.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Protection failure on the generic path. Specialized-protector
    /// failures never reach here; the dispatcher recovers them as a
    /// degraded artifact.
    #[error("protection error: {0}")]
    Protection(#[from] ProtectError),

    /// Disk I/O fault outside the protection step.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal fault (blocking task cancelled or panicked).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for Vault operations.
pub type Result<T> = std::result::Result<T, VaultError>;
