//! Strong type definitions for Sealbox.
//!
//! All identifiers are newtypes to prevent misuse at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::content_type::ProtectorKind;
use crate::credential::Credential;
use crate::error::CoreError;

/// A 16-byte file artifact identifier, generated randomly at upload time.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileId(pub [u8; 16]);

impl FileId {
    /// Create a new FileId from raw bytes.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Generate a random FileId.
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut bytes = [0u8; 16];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let bytes = hex::decode(s).map_err(|_| CoreError::InvalidFileId(s.to_string()))?;
        if bytes.len() != 16 {
            return Err(CoreError::InvalidFileId(s.to_string()));
        }
        let mut arr = [0u8; 16];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileId({})", self.to_hex())
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Lifecycle status of a protected artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactStatus {
    /// Uploaded and protected, awaiting acceptance.
    Pending,
    /// Explicitly accepted by the recipient side.
    Accepted,
}

impl ArtifactStatus {
    /// Encode as a stable integer for storage.
    pub const fn as_u8(self) -> u8 {
        match self {
            ArtifactStatus::Pending => 0,
            ArtifactStatus::Accepted => 1,
        }
    }

    /// Decode from the stored integer.
    pub const fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(ArtifactStatus::Pending),
            1 => Some(ArtifactStatus::Accepted),
            _ => None,
        }
    }
}

/// One entry in an artifact's append-only download log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRecord {
    /// Requester identity, or None for anonymous downloads.
    pub requester: Option<String>,
    /// When the download was requested (Unix ms). Recorded before the
    /// bytes are streamed, so mid-stream disconnects still count.
    pub at: i64,
    /// Caller-supplied location metadata, if any.
    pub location: Option<String>,
}

impl DownloadRecord {
    /// Create a record for the given requester at the given time.
    pub fn new(requester: Option<String>, at: i64, location: Option<String>) -> Self {
        Self {
            requester,
            at,
            location,
        }
    }
}

/// One uploaded item after protection.
///
/// # Invariant
///
/// `path` and `size` always describe the *protected* artifact on disk.
/// The unprotected original never persists once protection has succeeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileArtifact {
    /// Artifact identifier.
    pub id: FileId,
    /// Filename of the protected artifact on disk.
    pub stored_filename: String,
    /// Filename as uploaded by the owner.
    pub original_filename: String,
    /// On-disk path of the protected artifact.
    pub path: String,
    /// Byte size of the protected artifact.
    pub size: u64,
    /// Declared (or inferred) content type of the original upload.
    pub content_type: String,
    /// The per-file password. Cleartext by design: this is the
    /// access-control token for the file, not a login secret.
    pub credential: Credential,
    /// Owner identity.
    pub owner: String,
    /// Creation time (Unix ms).
    pub created_at: i64,
    /// Lifecycle status.
    pub status: ArtifactStatus,
    /// Which protection strategy produced the artifact.
    pub protector: ProtectorKind,
    /// True when a specialized protector failed and the artifact is the
    /// original unprotected file (availability-over-confidentiality
    /// fallback, surfaced so auditors can see it).
    pub degraded: bool,
}

impl FileArtifact {
    /// Check a supplied password against the stored credential.
    pub fn credential_matches(&self, supplied: &str) -> bool {
        self.credential.matches(supplied)
    }
}
