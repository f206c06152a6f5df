//! The Vault: unified API for the Sealbox system.
//!
//! The Vault brings together authorization, protection, and storage into
//! a cohesive interface for building file-distribution applications.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use sealbox_authz::{Action, Role, RoleId, FILE_MANAGEMENT};
use sealbox_core::{
    resolve_content_type, ArtifactStatus, Credential, DownloadRecord, FileArtifact, FileId,
    ProtectorKind,
};
use sealbox_protect::Dispatcher;
use sealbox_store::Store;

use crate::audit::{AuditEvent, AuditSink, TracingSink};
use crate::error::{Result, VaultError};

/// Configuration for the Vault.
#[derive(Debug, Clone)]
pub struct VaultConfig {
    /// Directory receiving protected artifacts.
    pub storage_root: PathBuf,
}

impl VaultConfig {
    /// Configuration with the given storage root.
    pub fn new(storage_root: impl Into<PathBuf>) -> Self {
        Self {
            storage_root: storage_root.into(),
        }
    }
}

/// An authenticated caller: identity plus the role it acts under.
///
/// Download is the one operation that does not require a caller; it is
/// gated by the per-file credential instead.
#[derive(Debug, Clone)]
pub struct Caller {
    /// Caller identity; recorded as owner on upload and attributed in
    /// audit events.
    pub user: String,
    /// Role the caller acts under, resolved through the store per check.
    pub role: RoleId,
}

impl Caller {
    /// Create a caller.
    pub fn new(user: impl Into<String>, role: RoleId) -> Self {
        Self {
            user: user.into(),
            role,
        }
    }
}

/// Receipt returned to the uploader.
///
/// The generated password appears here and nowhere else in the API; the
/// uploader is responsible for sharing it with recipients out of band.
#[derive(Debug, Clone)]
pub struct UploadReceipt {
    /// Identifier of the new artifact.
    pub id: FileId,
    /// Filename of the protected artifact on disk.
    pub filename: String,
    /// The generated per-file password, surfaced exactly once.
    pub password: String,
    /// Creation time (Unix ms).
    pub uploaded_at: i64,
    /// True when the specialized protector failed and the stored artifact
    /// is the unprotected original.
    pub degraded: bool,
}

/// Everything a caller needs to stream an artifact with an attachment
/// disposition.
#[derive(Debug, Clone)]
pub struct DownloadReply {
    /// Resolved on-disk path of the bytes to stream.
    pub path: PathBuf,
    /// Filename to present to the recipient.
    pub filename: String,
    /// Content type to serve.
    pub content_type: String,
    /// Byte size of the artifact.
    pub size: u64,
}

/// The main Vault struct.
///
/// Provides a unified API for:
/// - Uploading files (protect, then persist)
/// - Releasing files against the per-file password
/// - Listing, accepting, reassigning, and deleting artifacts
pub struct Vault<S: Store> {
    /// The storage backend.
    store: Arc<S>,
    /// The protection dispatcher.
    dispatcher: Dispatcher,
    /// Configuration.
    config: VaultConfig,
    /// Audit sink.
    audit: Arc<dyn AuditSink>,
}

impl<S: Store + 'static> Vault<S> {
    /// Create a new vault instance with the default tracing audit sink.
    pub fn new(store: S, config: VaultConfig) -> Self {
        Self::with_audit(store, config, Arc::new(TracingSink))
    }

    /// Create a new vault instance with a custom audit sink.
    pub fn with_audit(store: S, config: VaultConfig, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            store: Arc::new(store),
            dispatcher: Dispatcher::new(config.storage_root.clone()),
            config,
            audit,
        }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Upload
    // ─────────────────────────────────────────────────────────────────────────

    /// Upload a file: authorize, mint a credential, protect, persist.
    ///
    /// The artifact record is written only after protection has succeeded
    /// and the protected bytes are on disk, so no half-protected artifact
    /// is ever visible to the download path. On success the unprotected
    /// source no longer exists.
    pub async fn upload(
        &self,
        caller: &Caller,
        source: &Path,
        original_filename: &str,
        declared_content_type: Option<&str>,
    ) -> Result<UploadReceipt> {
        self.authorize(caller, Action::Create).await?;

        let credential = Credential::generate();
        let password = credential.expose().to_string();

        // Protection is CPU- and disk-bound; keep it off the runtime.
        let protected = {
            let dispatcher = self.dispatcher.clone();
            let source = source.to_path_buf();
            let password = password.clone();
            let filename = original_filename.to_string();
            let declared = declared_content_type.map(String::from);
            tokio::task::spawn_blocking(move || {
                dispatcher.protect(&source, &password, &filename, declared.as_deref())
            })
            .await
            .map_err(|e| VaultError::Internal(e.to_string()))??
        };

        let now = now_millis();
        let artifact = FileArtifact {
            id: FileId::generate(),
            stored_filename: protected.filename.clone(),
            original_filename: original_filename.to_string(),
            path: protected.path.to_string_lossy().into_owned(),
            size: protected.size,
            content_type: protected.content_type,
            credential,
            owner: caller.user.clone(),
            created_at: now,
            status: ArtifactStatus::Pending,
            protector: protected.kind,
            degraded: protected.degraded,
        };
        self.store.insert_artifact(&artifact).await?;

        if artifact.degraded {
            self.audit.record(&AuditEvent::ProtectionFellBack {
                id: artifact.id,
                protector: artifact.protector,
            });
        }
        self.audit.record(&AuditEvent::Uploaded {
            id: artifact.id,
            owner: artifact.owner.clone(),
            protector: artifact.protector,
            degraded: artifact.degraded,
        });

        Ok(UploadReceipt {
            id: artifact.id,
            filename: protected.filename,
            password,
            uploaded_at: now,
            degraded: artifact.degraded,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Download
    // ─────────────────────────────────────────────────────────────────────────

    /// Release an artifact against its per-file password.
    ///
    /// Publicly reachable: no role is required, only the credential.
    /// A missing artifact is `NotFound`; a wrong password on an existing
    /// artifact is `Unauthorized`. The download record is appended before
    /// the caller gets the path, so a mid-stream disconnect still counts.
    pub async fn download(
        &self,
        id: &FileId,
        supplied_password: &str,
        requester: Option<&str>,
        location: Option<&str>,
    ) -> Result<DownloadReply> {
        let artifact = self
            .store
            .get_artifact(id)
            .await?
            .ok_or(VaultError::NotFound)?;

        if !artifact.credential_matches(supplied_password) {
            return Err(VaultError::Unauthorized);
        }

        let record = DownloadRecord::new(
            requester.map(String::from),
            now_millis(),
            location.map(String::from),
        );
        self.store.append_download(id, &record).await?;

        let path = self.resolve_artifact_path(&artifact).ok_or_else(|| {
            // Record-without-bytes: an integrity anomaly, not a routine 404.
            tracing::error!(
                id = %artifact.id,
                declared_path = %artifact.path,
                "artifact record exists but bytes are missing from disk"
            );
            VaultError::NotFound
        })?;

        self.audit.record(&AuditEvent::Downloaded {
            id: artifact.id,
            requester: requester.map(String::from),
        });

        // Container artifacts stream the persisted HTML document; native
        // and degraded artifacts stream under the original filename.
        let (filename, content_type) = match artifact.protector {
            ProtectorKind::Container => {
                (format!("{}.html", artifact.original_filename), "text/html".to_string())
            }
            _ => (
                artifact.original_filename.clone(),
                resolve_content_type(Some(&artifact.content_type), &artifact.original_filename),
            ),
        };

        Ok(DownloadReply {
            path,
            filename,
            content_type,
            size: artifact.size,
        })
    }

    /// Resolve the artifact's on-disk path.
    ///
    /// Candidates in order: the declared path, the declared path relative
    /// to the storage root, the stored filename in the storage root.
    fn resolve_artifact_path(&self, artifact: &FileArtifact) -> Option<PathBuf> {
        let declared = PathBuf::from(&artifact.path);
        if declared.is_file() {
            return Some(declared);
        }

        let relative = self.config.storage_root.join(&artifact.path);
        if relative.is_file() {
            return Some(relative);
        }

        let named = self.config.storage_root.join(&artifact.stored_filename);
        if named.is_file() {
            return Some(named);
        }

        None
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Query Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// List the caller's own artifacts.
    pub async fn list(&self, caller: &Caller) -> Result<Vec<FileArtifact>> {
        self.authorize(caller, Action::Read).await?;
        Ok(self.store.list_artifacts(Some(&caller.user)).await?)
    }

    /// List every artifact in the system.
    pub async fn list_all(&self, caller: &Caller) -> Result<Vec<FileArtifact>> {
        self.authorize(caller, Action::Read).await?;
        Ok(self.store.list_artifacts(None).await?)
    }

    /// Get one artifact by id.
    pub async fn get(&self, caller: &Caller, id: &FileId) -> Result<FileArtifact> {
        self.authorize(caller, Action::Read).await?;
        self.store
            .get_artifact(id)
            .await?
            .ok_or(VaultError::NotFound)
    }

    /// Get an artifact's download log, in append order.
    pub async fn downloads(&self, caller: &Caller, id: &FileId) -> Result<Vec<DownloadRecord>> {
        self.authorize(caller, Action::Read).await?;
        if self.store.get_artifact(id).await?.is_none() {
            return Err(VaultError::NotFound);
        }
        Ok(self.store.get_downloads(id).await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Mark an artifact as accepted.
    pub async fn accept(&self, caller: &Caller, id: &FileId) -> Result<()> {
        self.authorize(caller, Action::Update).await?;
        if !self.store.set_status(id, ArtifactStatus::Accepted).await? {
            return Err(VaultError::NotFound);
        }
        Ok(())
    }

    /// Reassign an artifact to a new owner.
    pub async fn assign(&self, caller: &Caller, id: &FileId, new_owner: &str) -> Result<()> {
        self.authorize(caller, Action::Update).await?;
        if !self.store.set_owner(id, new_owner).await? {
            return Err(VaultError::NotFound);
        }
        Ok(())
    }

    /// Delete an artifact: disk bytes first, then the record.
    ///
    /// Allowed for the artifact's owner, or for a role holding `delete`
    /// on `file_management`. No dangling record survives a successful
    /// delete; a record whose bytes were already gone is still removed.
    pub async fn delete(&self, caller: &Caller, id: &FileId) -> Result<()> {
        let artifact = self
            .store
            .get_artifact(id)
            .await?
            .ok_or(VaultError::NotFound)?;

        if artifact.owner != caller.user {
            self.authorize(caller, Action::Delete).await?;
        }

        if let Some(path) = self.resolve_artifact_path(&artifact) {
            tokio::fs::remove_file(&path).await?;
        }
        self.store.delete_artifact(id).await?;

        self.audit.record(&AuditEvent::Deleted {
            id: artifact.id,
            by: caller.user.clone(),
        });
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Authorization
    // ─────────────────────────────────────────────────────────────────────────

    /// Gate an operation on the `file_management` module.
    ///
    /// The role is resolved through the store per check. A missing role
    /// denies; a store fault surfaces as a fault, never a silent allow.
    async fn authorize(&self, caller: &Caller, action: Action) -> Result<()> {
        let role = self
            .store
            .get_role(&caller.role)
            .await?
            .ok_or(VaultError::Unauthorized)?;

        if role.allows(FILE_MANAGEMENT, action) {
            Ok(())
        } else {
            Err(VaultError::Unauthorized)
        }
    }

    /// Seed or replace a role. Administration helper, not a gated
    /// operation; callers are expected to wire their own gate around it.
    pub async fn seed_role(&self, role: &Role) -> Result<()> {
        Ok(self.store.upsert_role(role).await?)
    }
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}
