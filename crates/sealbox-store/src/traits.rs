//! Store trait: the abstract interface for Sealbox persistence.
//!
//! This trait keeps the vault storage-agnostic. Implementations include
//! SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;
use sealbox_authz::{Module, Role, RoleId};
use sealbox_core::{ArtifactStatus, DownloadRecord, FileArtifact, FileId};

use crate::error::Result;

/// The Store trait: async interface for artifact and role persistence.
///
/// # Design Notes
///
/// - **Write-once credential**: the credential column is set at insert
///   and never updated; no method exists to change it.
/// - **Atomic download-log append**: [`Store::append_download`] is an
///   atomic append (an INSERT / in-memory push), never read-modify-write,
///   so concurrent downloads of one artifact need no external locking.
/// - **Read-only authorization tables**: roles and modules are small
///   reference tables loaded per authorization check; upserts exist for
///   seeding and administration, not for the hot path.
#[async_trait]
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Artifact Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert a new artifact record.
    ///
    /// Called only after protection has succeeded and the protected bytes
    /// are durably on disk, so no half-protected artifact is ever visible
    /// to the download path.
    async fn insert_artifact(&self, artifact: &FileArtifact) -> Result<()>;

    /// Get an artifact by id.
    async fn get_artifact(&self, id: &FileId) -> Result<Option<FileArtifact>>;

    /// List artifacts, optionally filtered by owner.
    async fn list_artifacts(&self, owner: Option<&str>) -> Result<Vec<FileArtifact>>;

    /// Update an artifact's lifecycle status.
    ///
    /// Returns false when the artifact does not exist.
    async fn set_status(&self, id: &FileId, status: ArtifactStatus) -> Result<bool>;

    /// Reassign an artifact to a new owner.
    ///
    /// Returns false when the artifact does not exist.
    async fn set_owner(&self, id: &FileId, owner: &str) -> Result<bool>;

    /// Delete an artifact record.
    ///
    /// Returns false when the artifact does not exist. Download records
    /// for the artifact are removed with it; the caller is responsible
    /// for removing the disk bytes first.
    async fn delete_artifact(&self, id: &FileId) -> Result<bool>;

    // ─────────────────────────────────────────────────────────────────────────
    // Download Log Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Append one download record. Atomic per artifact.
    async fn append_download(&self, id: &FileId, record: &DownloadRecord) -> Result<()>;

    /// Get the download log for an artifact, in append order.
    async fn get_downloads(&self, id: &FileId) -> Result<Vec<DownloadRecord>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Authorization Tables
    // ─────────────────────────────────────────────────────────────────────────

    /// Get a role by id.
    async fn get_role(&self, id: &RoleId) -> Result<Option<Role>>;

    /// Insert or replace a role.
    async fn upsert_role(&self, role: &Role) -> Result<()>;

    /// List all roles.
    async fn list_roles(&self) -> Result<Vec<Role>>;

    /// Get a module by name.
    async fn get_module(&self, name: &str) -> Result<Option<Module>>;

    /// Insert or replace a module.
    async fn upsert_module(&self, module: &Module) -> Result<()>;
}
