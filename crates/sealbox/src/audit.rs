//! Audit sink: fire-and-forget records of security-relevant operations.
//!
//! The vault emits an event after every upload, download, protection
//! fallback, and delete. Sinks must not fail the operation that produced
//! the event; `record` returns nothing and the vault never depends on
//! its success.

use sealbox_core::{FileId, ProtectorKind};

/// A security-relevant event.
#[derive(Debug, Clone)]
pub enum AuditEvent {
    /// An artifact was uploaded and protected.
    Uploaded {
        id: FileId,
        owner: String,
        protector: ProtectorKind,
        degraded: bool,
    },
    /// A specialized protector failed and the original was stored
    /// unprotected.
    ProtectionFellBack { id: FileId, protector: ProtectorKind },
    /// An artifact's bytes were released to a requester.
    Downloaded {
        id: FileId,
        requester: Option<String>,
    },
    /// An artifact was deleted (disk bytes and record).
    Deleted { id: FileId, by: String },
}

/// Receives audit events. Implementations must be cheap and infallible.
pub trait AuditSink: Send + Sync {
    /// Record one event.
    fn record(&self, event: &AuditEvent);
}

/// Default sink: structured `tracing` events at info level.
#[derive(Debug, Default)]
pub struct TracingSink;

impl AuditSink for TracingSink {
    fn record(&self, event: &AuditEvent) {
        match event {
            AuditEvent::Uploaded {
                id,
                owner,
                protector,
                degraded,
            } => {
                tracing::info!(%id, owner, ?protector, degraded, "audit: uploaded");
            }
            AuditEvent::ProtectionFellBack { id, protector } => {
                tracing::info!(%id, ?protector, "audit: protection fell back");
            }
            AuditEvent::Downloaded { id, requester } => {
                tracing::info!(%id, requester = requester.as_deref(), "audit: downloaded");
            }
            AuditEvent::Deleted { id, by } => {
                tracing::info!(%id, by, "audit: deleted");
            }
        }
    }
}

/// Sink that drops every event. For tests.
#[derive(Debug, Default)]
pub struct NullSink;

impl AuditSink for NullSink {
    fn record(&self, _event: &AuditEvent) {}
}
