//! Content-type resolution and protector dispatch.
//!
//! Uploads arrive with a declared content type that is often absent or the
//! generic `application/octet-stream` placeholder. Before dispatching to a
//! protector, the type is re-derived from the filename extension using a
//! fixed table; unrecognized extensions fall through to the generic branch.

use serde::{Deserialize, Serialize};

/// The generic placeholder content type browsers send when they don't know.
pub const GENERIC_TYPE: &str = "application/octet-stream";

/// PDF content type.
pub const PDF_TYPE: &str = "application/pdf";

/// Spreadsheet content types with a native password-on-open feature.
pub const SPREADSHEET_TYPES: &[&str] = &[
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
];

/// Fixed extension -> content type table for inference.
const EXTENSION_TABLE: &[(&str, &str)] = &[
    ("pdf", PDF_TYPE),
    ("xls", "application/vnd.ms-excel"),
    (
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    ("txt", "text/plain"),
    ("csv", "text/csv"),
    ("html", "text/html"),
    ("json", "application/json"),
    ("xml", "application/xml"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("svg", "image/svg+xml"),
    ("webp", "image/webp"),
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
    ("zip", "application/zip"),
    ("gz", "application/gzip"),
    ("tar", "application/x-tar"),
    ("7z", "application/x-7z-compressed"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("ppt", "application/vnd.ms-powerpoint"),
    (
        "pptx",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    ),
];

/// Infer a content type from a filename's extension.
///
/// Returns `None` for unknown or missing extensions.
pub fn infer_from_name(filename: &str) -> Option<&'static str> {
    let ext = filename.rsplit_once('.').map(|(_, e)| e)?;
    let ext = ext.to_ascii_lowercase();
    EXTENSION_TABLE
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, ct)| *ct)
}

/// Resolve the effective content type for dispatch.
///
/// A missing or placeholder declared type is re-derived from the filename;
/// if that also fails, the placeholder is returned and the generic branch
/// handles the file.
pub fn resolve_content_type(declared: Option<&str>, filename: &str) -> String {
    match declared {
        Some(ct) if !ct.is_empty() && ct != GENERIC_TYPE => ct.to_string(),
        _ => infer_from_name(filename)
            .unwrap_or(GENERIC_TYPE)
            .to_string(),
    }
}

/// The closed set of protection strategies.
///
/// Dispatch is keyed on the resolved content type. Adding a format means
/// adding a variant and a table entry, not another string comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProtectorKind {
    /// Native PDF password-on-open protection.
    Pdf,
    /// Native workbook password-on-open protection.
    Spreadsheet,
    /// Self-decrypting container for everything else.
    Container,
}

impl ProtectorKind {
    /// Select the protector for a resolved content type.
    pub fn for_content_type(content_type: &str) -> Self {
        if content_type == PDF_TYPE {
            ProtectorKind::Pdf
        } else if SPREADSHEET_TYPES.contains(&content_type) {
            ProtectorKind::Spreadsheet
        } else {
            ProtectorKind::Container
        }
    }

    /// True when the artifact enforces its own password on open, so the
    /// download path streams it as-is.
    pub const fn is_native(self) -> bool {
        matches!(self, ProtectorKind::Pdf | ProtectorKind::Spreadsheet)
    }

    /// Encode as a stable integer for storage.
    pub const fn as_u8(self) -> u8 {
        match self {
            ProtectorKind::Pdf => 0,
            ProtectorKind::Spreadsheet => 1,
            ProtectorKind::Container => 2,
        }
    }

    /// Decode from the stored integer.
    pub const fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(ProtectorKind::Pdf),
            1 => Some(ProtectorKind::Spreadsheet),
            2 => Some(ProtectorKind::Container),
            _ => None,
        }
    }
}
