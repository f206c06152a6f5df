//! # Sealbox Protect
//!
//! Format-aware protection of uploaded artifacts.
//!
//! The [`Dispatcher`] selects a strategy by resolved content type:
//!
//! - **PDF** - rewrites the document with the standard security handler
//!   (password on open, restricted permissions).
//! - **Spreadsheet** - wraps the workbook in an encrypted OLE2 container
//!   that spreadsheet applications require the password to open.
//! - **Everything else** - a self-decrypting HTML container built on the
//!   core sealing primitives.
//!
//! A failure in a specialized protector is recovered by falling back to
//! the original unprotected file, flagged `degraded`: availability over
//! confidentiality, surfaced rather than swallowed. The generic path has
//! no safe fallback and fails the upload instead.

pub mod container;
pub mod dispatcher;
pub mod error;
pub mod pdf;
pub mod spreadsheet;

pub use dispatcher::{Dispatcher, ProtectedArtifact};
pub use error::ProtectError;
