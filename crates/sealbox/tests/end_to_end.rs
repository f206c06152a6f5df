//! End-to-end scenarios: upload through protection to download, against
//! the seeded roles and the in-memory store.

use std::sync::Arc;

use sealbox::core::crypto;
use sealbox::protect::container;
use sealbox::{Caller, NullSink, ProtectorKind, Vault, VaultConfig, VaultError};
use sealbox_testkit::fixtures::{
    admin_role_id, reader_role_id, uploader_role_id, TestFixture,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn vault_from(fixture: &TestFixture) -> Vault<sealbox::store::MemoryStore> {
    // Clones of the memory store share state with the fixture's handle.
    Vault::with_audit(
        fixture.store.clone(),
        VaultConfig::new(fixture.storage_root()),
        Arc::new(NullSink),
    )
}

#[tokio::test]
async fn test_text_upload_roundtrips_through_container() -> anyhow::Result<()> {
    init_tracing();
    let fixture = TestFixture::new().await;
    let vault = vault_from(&fixture);
    let uploader = Caller::new("alice", uploader_role_id());

    let source = fixture.write_source("notes.txt", b"line one\nline two\n");
    let receipt = vault
        .upload(&uploader, &source, "notes.txt", Some("text/plain"))
        .await?;

    assert!(!receipt.degraded);
    assert!(!source.exists(), "plaintext source must be gone");

    let reply = vault
        .download(&receipt.id, &receipt.password, Some("bob"), None)
        .await?;
    assert_eq!(reply.filename, "notes.txt.html");
    assert_eq!(reply.content_type, "text/html");

    // The persisted container decrypts back to the original bytes.
    let html = std::fs::read_to_string(&reply.path)?;
    let payload = container::embedded_payload(&html).expect("payload embedded");
    let recovered = crypto::open(&payload, &receipt.password)?;
    assert_eq!(recovered, b"line one\nline two\n");

    // The container is persisted, not deleted on send.
    vault
        .download(&receipt.id, &receipt.password, Some("bob"), None)
        .await?;
    assert!(reply.path.exists());

    Ok(())
}

#[tokio::test]
async fn test_pdf_upload_produces_encrypted_pdf() -> anyhow::Result<()> {
    init_tracing();
    let fixture = TestFixture::new().await;
    let vault = vault_from(&fixture);
    let uploader = Caller::new("alice", uploader_role_id());

    let source = fixture.write_pdf_source("report.pdf");
    let receipt = vault
        .upload(&uploader, &source, "report.pdf", Some("application/pdf"))
        .await?;

    assert!(!receipt.degraded);
    assert!(!source.exists());

    let reply = vault
        .download(&receipt.id, &receipt.password, None, None)
        .await?;
    assert_eq!(reply.filename, "report.pdf");
    assert_eq!(reply.content_type, "application/pdf");

    let doc = lopdf::Document::load(&reply.path)?;
    assert!(doc.trailer.get(b"Encrypt").is_ok(), "pdf must be encrypted");

    Ok(())
}

#[tokio::test]
async fn test_read_only_role_is_rejected_before_protection() -> anyhow::Result<()> {
    init_tracing();
    let fixture = TestFixture::new().await;
    let vault = vault_from(&fixture);
    let reader = Caller::new("carol", reader_role_id());

    let source = fixture.write_source("notes.txt", b"hello");
    let err = vault
        .upload(&reader, &source, "notes.txt", None)
        .await
        .unwrap_err();

    assert!(matches!(err, VaultError::Unauthorized));
    // Rejected before any protection work: the source is untouched and
    // nothing landed in storage.
    assert!(source.exists());
    assert!(!fixture.storage_root().exists());

    Ok(())
}

#[tokio::test]
async fn test_missing_file_vs_wrong_password() -> anyhow::Result<()> {
    init_tracing();
    let fixture = TestFixture::new().await;
    let vault = vault_from(&fixture);
    let uploader = Caller::new("alice", uploader_role_id());

    let source = fixture.write_source("notes.txt", b"hello");
    let receipt = vault.upload(&uploader, &source, "notes.txt", None).await?;

    // Unknown id: 404, even with a well-formed password.
    let unknown = sealbox::FileId::generate();
    assert!(matches!(
        vault.download(&unknown, &receipt.password, None, None).await,
        Err(VaultError::NotFound)
    ));

    // Existing id, one-character-off password: 401.
    let mut off = receipt.password.clone().into_bytes();
    off[0] = if off[0] == b'a' { b'b' } else { b'a' };
    let off = String::from_utf8(off).unwrap();
    assert!(matches!(
        vault.download(&receipt.id, &off, None, None).await,
        Err(VaultError::Unauthorized)
    ));

    // A rejected attempt leaves no download record.
    let admin = Caller::new("root", admin_role_id());
    assert!(vault.downloads(&admin, &receipt.id).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_unparseable_pdf_degrades_to_original_bytes() -> anyhow::Result<()> {
    init_tracing();
    let fixture = TestFixture::new().await;
    let vault = vault_from(&fixture);
    let uploader = Caller::new("alice", uploader_role_id());

    let source = fixture.write_source("broken.pdf", b"this is not a pdf");
    let receipt = vault
        .upload(&uploader, &source, "broken.pdf", Some("application/pdf"))
        .await?;

    assert!(receipt.degraded, "fallback must be surfaced");

    let admin = Caller::new("root", admin_role_id());
    let artifact = vault.get(&admin, &receipt.id).await?;
    assert_eq!(artifact.protector, ProtectorKind::Pdf);
    assert!(artifact.degraded);

    let reply = vault
        .download(&receipt.id, &receipt.password, None, None)
        .await?;
    assert_eq!(std::fs::read(&reply.path)?, b"this is not a pdf");

    Ok(())
}

#[tokio::test]
async fn test_download_log_attributes_requesters_in_order() -> anyhow::Result<()> {
    init_tracing();
    let fixture = TestFixture::new().await;
    let vault = vault_from(&fixture);
    let uploader = Caller::new("alice", uploader_role_id());

    let source = fixture.write_source("notes.txt", b"hello");
    let receipt = vault.upload(&uploader, &source, "notes.txt", None).await?;

    vault
        .download(&receipt.id, &receipt.password, Some("bob"), Some("office"))
        .await?;
    vault
        .download(&receipt.id, &receipt.password, None, None)
        .await?;

    let log = vault.downloads(&uploader, &receipt.id).await?;
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].requester.as_deref(), Some("bob"));
    assert_eq!(log[0].location.as_deref(), Some("office"));
    assert_eq!(log[1].requester, None);
    assert!(log[0].at <= log[1].at);

    Ok(())
}

#[tokio::test]
async fn test_lifecycle_accept_assign_delete() -> anyhow::Result<()> {
    init_tracing();
    let fixture = TestFixture::new().await;
    let vault = vault_from(&fixture);
    let uploader = Caller::new("alice", uploader_role_id());
    let admin = Caller::new("root", admin_role_id());

    let source = fixture.write_source("notes.txt", b"hello");
    let receipt = vault.upload(&uploader, &source, "notes.txt", None).await?;

    // Uploader holds create+read only; accept needs update.
    assert!(matches!(
        vault.accept(&uploader, &receipt.id).await,
        Err(VaultError::Unauthorized)
    ));
    vault.accept(&admin, &receipt.id).await?;
    let artifact = vault.get(&admin, &receipt.id).await?;
    assert_eq!(artifact.status, sealbox::ArtifactStatus::Accepted);

    vault.assign(&admin, &receipt.id, "dave").await?;
    let artifact = vault.get(&admin, &receipt.id).await?;
    assert_eq!(artifact.owner, "dave");

    // Alice no longer owns it and holds no delete grant.
    assert!(matches!(
        vault.delete(&uploader, &receipt.id).await,
        Err(VaultError::Unauthorized)
    ));

    // The new owner may delete without any role grant beyond ownership.
    let dave = Caller::new("dave", reader_role_id());
    let path = std::path::PathBuf::from(&artifact.path);
    vault.delete(&dave, &receipt.id).await?;
    assert!(!path.exists(), "disk bytes must be removed");
    assert!(matches!(
        vault.get(&admin, &receipt.id).await,
        Err(VaultError::NotFound)
    ));

    Ok(())
}

#[tokio::test]
async fn test_list_shows_own_artifacts_only() -> anyhow::Result<()> {
    init_tracing();
    let fixture = TestFixture::new().await;
    let vault = vault_from(&fixture);
    let alice = Caller::new("alice", uploader_role_id());
    let bob = Caller::new("bob", uploader_role_id());

    let a = fixture.write_source("a.txt", b"a");
    let b = fixture.write_source("b.txt", b"b");
    vault.upload(&alice, &a, "a.txt", None).await?;
    vault.upload(&bob, &b, "b.txt", None).await?;

    let mine = vault.list(&alice).await?;
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].owner, "alice");

    let admin = Caller::new("root", admin_role_id());
    assert_eq!(vault.list_all(&admin).await?.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_spreadsheet_upload_is_wrapped_in_ole_container() -> anyhow::Result<()> {
    init_tracing();
    let fixture = TestFixture::new().await;
    let vault = vault_from(&fixture);
    let uploader = Caller::new("alice", uploader_role_id());

    let source = fixture.write_source("book.xlsx", b"PK\x03\x04fake workbook");
    let receipt = vault
        .upload(&uploader, &source, "book.xlsx", None)
        .await?;

    assert!(!receipt.degraded);
    let admin = Caller::new("root", admin_role_id());
    let artifact = vault.get(&admin, &receipt.id).await?;
    assert_eq!(artifact.protector, ProtectorKind::Spreadsheet);

    // OLE2 magic, not the zip magic of the plaintext package.
    let reply = vault
        .download(&receipt.id, &receipt.password, None, None)
        .await?;
    let bytes = std::fs::read(&reply.path)?;
    assert_eq!(&bytes[..8], &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1]);

    Ok(())
}
