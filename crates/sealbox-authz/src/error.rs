//! Error types for the authorization model.

use thiserror::Error;

/// Errors from authorization operations.
///
/// Lookup faults are surfaced so callers can fail closed with a
/// server-fault status instead of silently allowing.
#[derive(Debug, Error)]
pub enum AuthzError {
    /// Role id did not resolve.
    #[error("role not found: {0}")]
    RoleNotFound(String),

    /// A system role cannot be deactivated or deleted.
    #[error("role {0} is a system role")]
    SystemRole(String),

    /// Capability payload failed to decode from storage.
    #[error("invalid capability encoding: {0}")]
    InvalidCapability(#[from] serde_json::Error),
}

/// Result type for authorization operations.
pub type Result<T> = std::result::Result<T, AuthzError>;
