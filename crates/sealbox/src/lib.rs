//! # Sealbox
//!
//! The unified API for the Sealbox system: per-file-password protection
//! and distribution of uploaded files.
//!
//! ## Overview
//!
//! Sealbox protects every uploaded file with a freshly generated password
//! before it is stored, and releases it only against that password:
//!
//! - **Credentials**: a 10-character generated password per file, the
//!   file's access token, surfaced to the uploader exactly once
//! - **Protection**: format-aware. PDFs get the standard security
//!   handler, spreadsheets get an encrypted workbook container, and
//!   everything else gets a self-decrypting HTML container
//! - **Authorization**: role/permission gating on all file management
//!   operations; download alone is gated by the file credential
//! - **Audit**: a fire-and-forget sink fed after every upload, download,
//!   protection fallback, and delete
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sealbox::{Caller, Vault, VaultConfig};
//! use sealbox::authz::RoleId;
//! use sealbox::store::SqliteStore;
//!
//! async fn example() {
//!     let store = SqliteStore::open("sealbox.db").unwrap();
//!     let vault = Vault::new(store, VaultConfig::new("/var/lib/sealbox"));
//!
//!     let caller = Caller::new("alice", RoleId::new("r-uploader"));
//!     let receipt = vault
//!         .upload(&caller, "report.pdf".as_ref(), "report.pdf", None)
//!         .await
//!         .unwrap();
//!
//!     // The password appears here and nowhere else.
//!     println!("share this: {}", receipt.password);
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `sealbox::core` - Core primitives (FileId, Credential, sealing)
//! - `sealbox::authz` - Roles, permissions, and the decision function
//! - `sealbox::store` - Storage abstraction, SQLite and memory backends
//! - `sealbox::protect` - The protection dispatcher and strategies

pub mod audit;
pub mod error;
pub mod vault;

// Re-export component crates
pub use sealbox_authz as authz;
pub use sealbox_core as core;
pub use sealbox_protect as protect;
pub use sealbox_store as store;

// Re-export main types for convenience
pub use audit::{AuditEvent, AuditSink, NullSink, TracingSink};
pub use error::{Result, VaultError};
pub use vault::{Caller, DownloadReply, UploadReceipt, Vault, VaultConfig};

// Re-export commonly used core types
pub use sealbox_core::{
    ArtifactStatus, Credential, DownloadRecord, FileArtifact, FileId, ProtectorKind,
};
