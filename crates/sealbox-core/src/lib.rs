//! # Sealbox Core
//!
//! Core primitives for the Sealbox file protection system:
//!
//! - **Identifiers and records**: [`FileId`], [`FileArtifact`], and the
//!   append-only [`DownloadRecord`] log entries.
//! - **Credentials**: [`Credential`] generation and verification. The
//!   credential is the per-file access token, stored cleartext by design.
//! - **Content types**: extension-based inference and the closed
//!   [`ProtectorKind`] dispatch enum.
//! - **Sealing**: password-derived AES-256-CBC encryption with IV-prefixed,
//!   base64-framed payloads ([`crypto::seal`], [`crypto::open`]).

pub mod content_type;
pub mod credential;
pub mod crypto;
pub mod error;
pub mod types;

pub use content_type::{infer_from_name, resolve_content_type, ProtectorKind, GENERIC_TYPE};
pub use credential::Credential;
pub use crypto::{AesKey, Iv};
pub use error::CoreError;
pub use types::{ArtifactStatus, DownloadRecord, FileArtifact, FileId};
