//! Proptest generators for property-based testing.

use proptest::prelude::*;

use sealbox_core::{ArtifactStatus, Credential, FileArtifact, FileId, ProtectorKind};

/// Generate a random FileId.
pub fn file_id() -> impl Strategy<Value = FileId> {
    any::<[u8; 16]>().prop_map(FileId::from_bytes)
}

/// Generate a password over the credential alphabet, 1-24 characters.
pub fn password() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9!@#$%^&*()=_+-]{1,24}"
}

/// Generate a filename with an extension from each dispatch branch.
pub fn filename() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,12}\\.(txt|csv|pdf|xls|xlsx|docx|png|zip|qqq)"
}

/// Generate payload bytes of specified max length.
pub fn payload(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate a protector kind.
pub fn protector_kind() -> impl Strategy<Value = ProtectorKind> {
    prop_oneof![
        Just(ProtectorKind::Pdf),
        Just(ProtectorKind::Spreadsheet),
        Just(ProtectorKind::Container),
    ]
}

/// Generate an artifact status.
pub fn status() -> impl Strategy<Value = ArtifactStatus> {
    prop_oneof![Just(ArtifactStatus::Pending), Just(ArtifactStatus::Accepted)]
}

/// Generate a complete artifact record.
pub fn artifact() -> impl Strategy<Value = FileArtifact> {
    (
        file_id(),
        filename(),
        password(),
        "[a-z]{1,10}",
        0i64..=1_900_000_000_000i64,
        status(),
        protector_kind(),
        any::<bool>(),
        0u64..=10_000_000u64,
    )
        .prop_map(
            |(id, original, pw, owner, created_at, status, protector, degraded, size)| {
                FileArtifact {
                    id,
                    stored_filename: format!("{}.bin", id.to_hex()),
                    original_filename: original,
                    path: format!("storage/{}.bin", id.to_hex()),
                    size,
                    content_type: "application/octet-stream".into(),
                    credential: Credential::from_string(pw),
                    owner,
                    created_at,
                    status,
                    protector,
                    degraded,
                }
            },
        )
}
