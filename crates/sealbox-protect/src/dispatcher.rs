//! The protection dispatcher.
//!
//! Given an uploaded file and its per-file password, selects a protector
//! by resolved content type, runs it, and normalizes the result: the
//! protected path, filename, size, the strategy that produced it, and
//! whether the artifact is degraded (original served unprotected after a
//! specialized-protector failure).

use std::fs;
use std::path::{Path, PathBuf};

use sealbox_core::content_type::{resolve_content_type, ProtectorKind};

use crate::container;
use crate::error::Result;
use crate::pdf;
use crate::spreadsheet;

/// Normalized result of protecting one upload.
#[derive(Debug, Clone)]
pub struct ProtectedArtifact {
    /// Path of the protected artifact (or the original, when degraded).
    pub path: PathBuf,
    /// Filename of the protected artifact on disk.
    pub filename: String,
    /// Byte size of the protected artifact.
    pub size: u64,
    /// Resolved content type of the original upload.
    pub content_type: String,
    /// Strategy that handled the file.
    pub kind: ProtectorKind,
    /// True when the specialized protector failed and the artifact is the
    /// unprotected original.
    pub degraded: bool,
}

/// Selects and runs a protection strategy for uploaded files.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    /// Directory that receives protected artifacts.
    storage_root: PathBuf,
}

impl Dispatcher {
    /// Create a dispatcher writing into the given storage root.
    pub fn new(storage_root: impl Into<PathBuf>) -> Self {
        Self {
            storage_root: storage_root.into(),
        }
    }

    /// The storage root protected artifacts are written to.
    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    /// Protect one uploaded file.
    ///
    /// On success the unprotected source is deleted: plaintext and
    /// protected bytes never coexist beyond this call. PDF/spreadsheet
    /// protector failures fall back to the original file with
    /// `degraded: true`; generic-path failures propagate and fail the
    /// upload, since serving those unprotected was never the contract.
    pub fn protect(
        &self,
        source: &Path,
        password: &str,
        original_filename: &str,
        declared_content_type: Option<&str>,
    ) -> Result<ProtectedArtifact> {
        fs::create_dir_all(&self.storage_root)?;

        let content_type = resolve_content_type(declared_content_type, original_filename);
        let kind = ProtectorKind::for_content_type(&content_type);
        let stem = random_stem();

        match kind {
            ProtectorKind::Pdf => {
                let filename = format!("{stem}.pdf");
                let dest = self.storage_root.join(&filename);
                match pdf::protect(source, &dest, password) {
                    Ok(()) => self.finish_native(source, dest, filename, content_type, kind),
                    Err(err) => self.fall_back(source, original_filename, content_type, kind, err),
                }
            }
            ProtectorKind::Spreadsheet => {
                let filename = format!("{stem}.{}", extension_of(original_filename, "xlsx"));
                let dest = self.storage_root.join(&filename);
                match spreadsheet::protect(source, &dest, password) {
                    Ok(()) => self.finish_native(source, dest, filename, content_type, kind),
                    Err(err) => self.fall_back(source, original_filename, content_type, kind, err),
                }
            }
            ProtectorKind::Container => {
                let bytes = fs::read(source)?;
                let html = container::wrap(&bytes, password, original_filename, &content_type)?;

                let filename = format!("{stem}.html");
                let dest = self.storage_root.join(&filename);
                fs::write(&dest, html.as_bytes())?;
                fs::remove_file(source)?;

                Ok(ProtectedArtifact {
                    size: fs::metadata(&dest)?.len(),
                    path: dest,
                    filename,
                    content_type,
                    kind,
                    degraded: false,
                })
            }
        }
    }

    /// Complete a native-protector branch: confirm the protected bytes,
    /// then delete the plaintext source.
    fn finish_native(
        &self,
        source: &Path,
        dest: PathBuf,
        filename: String,
        content_type: String,
        kind: ProtectorKind,
    ) -> Result<ProtectedArtifact> {
        let size = fs::metadata(&dest)?.len();
        fs::remove_file(source)?;

        Ok(ProtectedArtifact {
            path: dest,
            filename,
            size,
            content_type,
            kind,
            degraded: false,
        })
    }

    /// Specialized-protector failure: keep the upload alive by moving the
    /// original into storage unprotected, flagged degraded.
    fn fall_back(
        &self,
        source: &Path,
        original_filename: &str,
        content_type: String,
        kind: ProtectorKind,
        err: crate::error::ProtectError,
    ) -> Result<ProtectedArtifact> {
        tracing::warn!(
            error = %err,
            file = original_filename,
            ?kind,
            "specialized protector failed; serving original unprotected"
        );

        let filename = format!(
            "{}.{}",
            random_stem(),
            extension_of(original_filename, "bin")
        );
        let dest = self.storage_root.join(&filename);

        // Rename when possible; fall back to copy for cross-device moves.
        if fs::rename(source, &dest).is_err() {
            fs::copy(source, &dest)?;
            fs::remove_file(source)?;
        }

        Ok(ProtectedArtifact {
            size: fs::metadata(&dest)?.len(),
            path: dest,
            filename,
            content_type,
            kind,
            degraded: true,
        })
    }
}

/// Random hex stem for stored filenames.
fn random_stem() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Lower-cased extension of a filename, or a default.
fn extension_of(filename: &str, default: &str) -> String {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatcher(dir: &tempfile::TempDir) -> Dispatcher {
        Dispatcher::new(dir.path().join("storage"))
    }

    fn write_source(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_generic_branch_produces_container_and_removes_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(&dir, "notes.txt", b"hello");

        let artifact = dispatcher(&dir)
            .protect(&source, "pw!123Abc$", "notes.txt", Some("text/plain"))
            .unwrap();

        assert_eq!(artifact.kind, ProtectorKind::Container);
        assert!(!artifact.degraded);
        assert!(artifact.filename.ends_with(".html"));
        assert!(artifact.path.exists());
        assert_eq!(artifact.size, fs::metadata(&artifact.path).unwrap().len());
        assert!(!source.exists(), "plaintext source must be deleted");
    }

    #[test]
    fn test_pdf_branch_encrypts_and_removes_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("report.pdf");
        crate::pdf::minimal_pdf(&source);

        let artifact = dispatcher(&dir)
            .protect(&source, "pw!123Abc$", "report.pdf", Some("application/pdf"))
            .unwrap();

        assert_eq!(artifact.kind, ProtectorKind::Pdf);
        assert!(!artifact.degraded);
        assert!(!source.exists());

        let doc = lopdf::Document::load(&artifact.path).unwrap();
        assert!(doc.trailer.get(b"Encrypt").is_ok());
    }

    #[test]
    fn test_spreadsheet_branch_by_extension_inference() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(&dir, "book.xlsx", b"PK\x03\x04fake");

        // Declared type is the generic placeholder; extension decides.
        let artifact = dispatcher(&dir)
            .protect(
                &source,
                "pw!123Abc$",
                "book.xlsx",
                Some("application/octet-stream"),
            )
            .unwrap();

        assert_eq!(artifact.kind, ProtectorKind::Spreadsheet);
        assert!(artifact.filename.ends_with(".xlsx"));
        assert!(!source.exists());
    }

    #[test]
    fn test_pdf_failure_falls_back_degraded() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(&dir, "broken.pdf", b"this is not a pdf");

        let artifact = dispatcher(&dir)
            .protect(&source, "pw!123Abc$", "broken.pdf", Some("application/pdf"))
            .unwrap();

        assert_eq!(artifact.kind, ProtectorKind::Pdf);
        assert!(artifact.degraded, "fallback must be flagged");
        assert_eq!(fs::read(&artifact.path).unwrap(), b"this is not a pdf");
        assert!(!source.exists());
    }

    #[test]
    fn test_unknown_extension_falls_through_to_container() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(&dir, "blob.qqq", b"\x00\x01\x02");

        let artifact = dispatcher(&dir)
            .protect(&source, "pw!123Abc$", "blob.qqq", None)
            .unwrap();

        assert_eq!(artifact.kind, ProtectorKind::Container);
        assert_eq!(artifact.content_type, "application/octet-stream");
    }
}
