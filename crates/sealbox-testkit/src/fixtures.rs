//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: a temp storage root, an
//! in-memory store seeded with the standard roles, and source-file
//! builders for each protector branch.

use std::fs;
use std::path::{Path, PathBuf};

use sealbox_authz::{Action, Permission, Role, RoleId, FILE_MANAGEMENT};
use sealbox_store::{MemoryStore, Store};

/// The seeded administrator role id (`Capability::All`).
pub fn admin_role_id() -> RoleId {
    RoleId::new("r-admin")
}

/// The seeded uploader role id (create + read).
pub fn uploader_role_id() -> RoleId {
    RoleId::new("r-uploader")
}

/// The seeded read-only role id.
pub fn reader_role_id() -> RoleId {
    RoleId::new("r-reader")
}

/// The standard seeded roles: admin, uploader, reader.
pub fn standard_roles() -> Vec<Role> {
    vec![
        Role::system_admin(admin_role_id()),
        Role::new(
            uploader_role_id(),
            "uploader",
            "Uploader",
            vec![
                Permission::new(FILE_MANAGEMENT, Action::Create),
                Permission::new(FILE_MANAGEMENT, Action::Read),
            ],
        ),
        Role::new(
            reader_role_id(),
            "reader",
            "Reader",
            vec![Permission::new(FILE_MANAGEMENT, Action::Read)],
        ),
    ]
}

/// A test fixture with a temp directory and a seeded memory store.
///
/// The temp directory holds both the upload staging area and the storage
/// root; everything is removed when the fixture drops.
pub struct TestFixture {
    pub dir: tempfile::TempDir,
    pub store: MemoryStore,
}

impl TestFixture {
    /// Create a fixture with the standard roles seeded.
    pub async fn new() -> Self {
        let store = MemoryStore::new();
        for role in standard_roles() {
            store.upsert_role(&role).await.expect("seeding roles");
        }
        Self {
            dir: tempfile::tempdir().expect("temp dir"),
            store,
        }
    }

    /// The storage root protected artifacts should be written to.
    pub fn storage_root(&self) -> PathBuf {
        self.dir.path().join("storage")
    }

    /// Write a staged upload source with the given bytes.
    pub fn write_source(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, bytes).expect("writing source file");
        path
    }

    /// Write a staged minimal PDF upload source.
    pub fn write_pdf_source(&self, name: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        write_minimal_pdf(&path);
        path
    }
}

/// Build a minimal single-page PDF at the given path.
pub fn write_minimal_pdf(path: &Path) {
    use lopdf::content::{Content, Operation};
    use lopdf::{Dictionary, Document, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tj", vec![Object::string_literal("sealbox fixture")]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(
        Dictionary::new(),
        content.encode().expect("encoding content"),
    ));

    let mut page = Dictionary::new();
    page.set("Type", Object::Name(b"Page".to_vec()));
    page.set("Parent", Object::Reference(pages_id));
    page.set("Contents", Object::Reference(content_id));
    let page_id = doc.add_object(Object::Dictionary(page));

    let mut pages = Dictionary::new();
    pages.set("Type", Object::Name(b"Pages".to_vec()));
    pages.set("Kids", Object::Array(vec![Object::Reference(page_id)]));
    pages.set("Count", Object::Integer(1));
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    let catalog_id = doc.add_object(Object::Dictionary(catalog));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    doc.save(path).expect("saving fixture pdf");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixture_seeds_standard_roles() {
        let fixture = TestFixture::new().await;

        let admin = fixture.store.get_role(&admin_role_id()).await.unwrap();
        assert!(admin.unwrap().allows(FILE_MANAGEMENT, Action::Delete));

        let reader = fixture
            .store
            .get_role(&reader_role_id())
            .await
            .unwrap()
            .unwrap();
        assert!(reader.allows(FILE_MANAGEMENT, Action::Read));
        assert!(!reader.allows(FILE_MANAGEMENT, Action::Create));
    }

    #[tokio::test]
    async fn test_pdf_source_is_loadable() {
        let fixture = TestFixture::new().await;
        let path = fixture.write_pdf_source("sample.pdf");
        assert!(lopdf::Document::load(&path).is_ok());
    }
}
