//! SQLite implementation of the Store trait.
//!
//! This is the primary storage backend for Sealbox. It uses rusqlite with
//! bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use sealbox_authz::{Capability, Module, Role, RoleId};
use sealbox_core::{ArtifactStatus, Credential, DownloadRecord, FileArtifact, FileId, ProtectorKind};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::Store;

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations run under
/// spawn_blocking so disk I/O never stalls the async runtime.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a blocking operation against the connection on the blocking
    /// thread pool.
    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|e| {
                StoreError::Database(rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
                    Some(format!("mutex poisoned: {}", e)),
                ))
            })?;
            f(&conn)
        })
        .await
        .map_err(|e| {
            StoreError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
                Some(format!("spawn_blocking failed: {}", e)),
            ))
        })?
    }
}

// Helper to convert a row to FileArtifact
fn row_to_artifact(row: &rusqlite::Row<'_>) -> rusqlite::Result<FileArtifact> {
    let id_bytes: Vec<u8> = row.get("id")?;
    let id_arr: [u8; 16] = id_bytes.try_into().map_err(|_| {
        rusqlite::Error::InvalidColumnType(0, "id".into(), rusqlite::types::Type::Blob)
    })?;

    let status_raw: u8 = row.get("status")?;
    let protector_raw: u8 = row.get("protector")?;
    let credential: String = row.get("credential")?;

    Ok(FileArtifact {
        id: FileId::from_bytes(id_arr),
        stored_filename: row.get("stored_filename")?,
        original_filename: row.get("original_filename")?,
        path: row.get("path")?,
        size: row.get::<_, i64>("size")? as u64,
        content_type: row.get("content_type")?,
        credential: Credential::from_string(credential),
        owner: row.get("owner")?,
        created_at: row.get("created_at")?,
        status: ArtifactStatus::from_u8(status_raw).ok_or_else(|| {
            rusqlite::Error::InvalidColumnType(9, "status".into(), rusqlite::types::Type::Integer)
        })?,
        protector: ProtectorKind::from_u8(protector_raw).ok_or_else(|| {
            rusqlite::Error::InvalidColumnType(
                10,
                "protector".into(),
                rusqlite::types::Type::Integer,
            )
        })?,
        degraded: row.get::<_, i64>("degraded")? != 0,
    })
}

// Helper to convert a row to Role
fn row_to_role(row: &rusqlite::Row<'_>) -> Result<Role> {
    let capability_json: String = row.get("capability").map_err(StoreError::Database)?;
    let capability: Capability = serde_json::from_str(&capability_json)?;

    Ok(Role {
        id: RoleId::new(row.get::<_, String>("id").map_err(StoreError::Database)?),
        name: row.get("name").map_err(StoreError::Database)?,
        display_name: row.get("display_name").map_err(StoreError::Database)?,
        active: row.get::<_, i64>("active").map_err(StoreError::Database)? != 0,
        is_system: row.get::<_, i64>("is_system").map_err(StoreError::Database)? != 0,
        capability,
    })
}

#[async_trait]
impl Store for SqliteStore {
    async fn insert_artifact(&self, artifact: &FileArtifact) -> Result<()> {
        let artifact = artifact.clone();

        self.with_conn(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO artifacts
                 (id, stored_filename, original_filename, path, size, content_type,
                  credential, owner, created_at, status, protector, degraded)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    artifact.id.as_bytes().as_slice(),
                    artifact.stored_filename,
                    artifact.original_filename,
                    artifact.path,
                    artifact.size as i64,
                    artifact.content_type,
                    artifact.credential.expose(),
                    artifact.owner,
                    artifact.created_at,
                    artifact.status.as_u8(),
                    artifact.protector.as_u8(),
                    artifact.degraded as i64,
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn get_artifact(&self, id: &FileId) -> Result<Option<FileArtifact>> {
        let id = *id;

        self.with_conn(move |conn| {
            let artifact = conn
                .query_row(
                    "SELECT * FROM artifacts WHERE id = ?1",
                    params![id.as_bytes().as_slice()],
                    row_to_artifact,
                )
                .optional()?;
            Ok(artifact)
        })
        .await
    }

    async fn list_artifacts(&self, owner: Option<&str>) -> Result<Vec<FileArtifact>> {
        let owner = owner.map(String::from);

        self.with_conn(move |conn| {
            let mut artifacts = Vec::new();

            match owner {
                Some(owner) => {
                    let mut stmt = conn.prepare(
                        "SELECT * FROM artifacts WHERE owner = ?1 ORDER BY created_at",
                    )?;
                    let rows = stmt.query_map(params![owner], row_to_artifact)?;
                    for row in rows {
                        artifacts.push(row?);
                    }
                }
                None => {
                    let mut stmt =
                        conn.prepare("SELECT * FROM artifacts ORDER BY created_at")?;
                    let rows = stmt.query_map([], row_to_artifact)?;
                    for row in rows {
                        artifacts.push(row?);
                    }
                }
            }

            Ok(artifacts)
        })
        .await
    }

    async fn set_status(&self, id: &FileId, status: ArtifactStatus) -> Result<bool> {
        let id = *id;

        self.with_conn(move |conn| {
            let changed = conn.execute(
                "UPDATE artifacts SET status = ?1 WHERE id = ?2",
                params![status.as_u8(), id.as_bytes().as_slice()],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    async fn set_owner(&self, id: &FileId, owner: &str) -> Result<bool> {
        let id = *id;
        let owner = owner.to_string();

        self.with_conn(move |conn| {
            let changed = conn.execute(
                "UPDATE artifacts SET owner = ?1 WHERE id = ?2",
                params![owner, id.as_bytes().as_slice()],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    async fn delete_artifact(&self, id: &FileId) -> Result<bool> {
        let id = *id;

        self.with_conn(move |conn| {
            conn.execute(
                "DELETE FROM downloads WHERE artifact_id = ?1",
                params![id.as_bytes().as_slice()],
            )?;
            let changed = conn.execute(
                "DELETE FROM artifacts WHERE id = ?1",
                params![id.as_bytes().as_slice()],
            )?;
            Ok(changed > 0)
        })
        .await
    }

    async fn append_download(&self, id: &FileId, record: &DownloadRecord) -> Result<()> {
        let id = *id;
        let record = record.clone();

        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO downloads (artifact_id, requester, at, location)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    id.as_bytes().as_slice(),
                    record.requester,
                    record.at,
                    record.location,
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn get_downloads(&self, id: &FileId) -> Result<Vec<DownloadRecord>> {
        let id = *id;

        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT requester, at, location FROM downloads
                 WHERE artifact_id = ?1 ORDER BY rowid",
            )?;
            let rows = stmt.query_map(params![id.as_bytes().as_slice()], |row| {
                Ok(DownloadRecord {
                    requester: row.get(0)?,
                    at: row.get(1)?,
                    location: row.get(2)?,
                })
            })?;

            let mut records = Vec::new();
            for row in rows {
                records.push(row?);
            }
            Ok(records)
        })
        .await
    }

    async fn get_role(&self, id: &RoleId) -> Result<Option<Role>> {
        let id = id.clone();

        self.with_conn(move |conn| {
            let mut stmt = conn.prepare("SELECT * FROM roles WHERE id = ?1")?;
            let mut rows = stmt.query(params![id.as_str()])?;

            match rows.next()? {
                Some(row) => Ok(Some(row_to_role(row)?)),
                None => Ok(None),
            }
        })
        .await
    }

    async fn upsert_role(&self, role: &Role) -> Result<()> {
        let capability_json = serde_json::to_string(&role.capability)?;
        let role = role.clone();

        self.with_conn(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO roles
                 (id, name, display_name, active, is_system, capability)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    role.id.as_str(),
                    role.name,
                    role.display_name,
                    role.active as i64,
                    role.is_system as i64,
                    capability_json,
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn list_roles(&self) -> Result<Vec<Role>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM roles ORDER BY name")?;
            let mut rows = stmt.query([])?;

            let mut roles = Vec::new();
            while let Some(row) = rows.next()? {
                roles.push(row_to_role(row)?);
            }
            Ok(roles)
        })
        .await
    }

    async fn get_module(&self, name: &str) -> Result<Option<Module>> {
        let name = name.to_string();

        self.with_conn(move |conn| {
            let module = conn
                .query_row(
                    "SELECT name, display_name, active FROM modules WHERE name = ?1",
                    params![name],
                    |row| {
                        Ok(Module {
                            name: row.get(0)?,
                            display_name: row.get(1)?,
                            active: row.get::<_, i64>(2)? != 0,
                        })
                    },
                )
                .optional()?;
            Ok(module)
        })
        .await
    }

    async fn upsert_module(&self, module: &Module) -> Result<()> {
        let module = module.clone();

        self.with_conn(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO modules (name, display_name, active)
                 VALUES (?1, ?2, ?3)",
                params![module.name, module.display_name, module.active as i64],
            )?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sealbox_authz::{Action, Permission, FILE_MANAGEMENT};

    fn make_artifact() -> FileArtifact {
        FileArtifact {
            id: FileId::generate(),
            stored_filename: "abc.pdf".into(),
            original_filename: "report.pdf".into(),
            path: "/storage/abc.pdf".into(),
            size: 2048,
            content_type: "application/pdf".into(),
            credential: Credential::generate(),
            owner: "alice".into(),
            created_at: 1234567890000,
            status: ArtifactStatus::Pending,
            protector: ProtectorKind::Pdf,
            degraded: false,
        }
    }

    #[tokio::test]
    async fn test_artifact_roundtrip() {
        let store = SqliteStore::open_memory().unwrap();
        let artifact = make_artifact();

        store.insert_artifact(&artifact).await.unwrap();
        let loaded = store.get_artifact(&artifact.id).await.unwrap().unwrap();
        assert_eq!(loaded, artifact);
    }

    #[tokio::test]
    async fn test_missing_artifact_is_none() {
        let store = SqliteStore::open_memory().unwrap();
        assert!(store
            .get_artifact(&FileId::generate())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_status_and_owner_updates() {
        let store = SqliteStore::open_memory().unwrap();
        let artifact = make_artifact();
        store.insert_artifact(&artifact).await.unwrap();

        assert!(store
            .set_status(&artifact.id, ArtifactStatus::Accepted)
            .await
            .unwrap());
        assert!(store.set_owner(&artifact.id, "bob").await.unwrap());

        let loaded = store.get_artifact(&artifact.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, ArtifactStatus::Accepted);
        assert_eq!(loaded.owner, "bob");

        // Updates on a missing artifact report false.
        assert!(!store
            .set_status(&FileId::generate(), ArtifactStatus::Accepted)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_download_log_order_and_delete() {
        let store = SqliteStore::open_memory().unwrap();
        let artifact = make_artifact();
        store.insert_artifact(&artifact).await.unwrap();

        for i in 0..3 {
            store
                .append_download(
                    &artifact.id,
                    &DownloadRecord::new(Some(format!("user{i}")), i, None),
                )
                .await
                .unwrap();
        }

        let log = store.get_downloads(&artifact.id).await.unwrap();
        assert_eq!(log.len(), 3);
        assert_eq!(log[0].requester.as_deref(), Some("user0"));
        assert_eq!(log[2].requester.as_deref(), Some("user2"));

        assert!(store.delete_artifact(&artifact.id).await.unwrap());
        assert!(store.get_downloads(&artifact.id).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_operations_from_many_tasks() {
        // Every method runs on the blocking pool, so store handles must
        // be usable from any runtime thread concurrently.
        let store = Arc::new(SqliteStore::open_memory().unwrap());
        let artifact = make_artifact();
        store.insert_artifact(&artifact).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = Arc::clone(&store);
            let id = artifact.id;
            handles.push(tokio::spawn(async move {
                store
                    .append_download(&id, &DownloadRecord::new(Some(format!("user{i}")), i, None))
                    .await
                    .unwrap();
                store.get_artifact(&id).await.unwrap().unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let log = store.get_downloads(&artifact.id).await.unwrap();
        assert_eq!(log.len(), 16);
    }

    #[tokio::test]
    async fn test_role_capability_roundtrip() {
        let store = SqliteStore::open_memory().unwrap();

        let admin = Role::system_admin(RoleId::new("r-admin"));
        let uploader = Role::new(
            RoleId::new("r-up"),
            "uploader",
            "Uploader",
            vec![
                Permission::new(FILE_MANAGEMENT, Action::Create),
                Permission::new(FILE_MANAGEMENT, Action::Read),
            ],
        );

        store.upsert_role(&admin).await.unwrap();
        store.upsert_role(&uploader).await.unwrap();

        let loaded = store.get_role(&admin.id).await.unwrap().unwrap();
        assert_eq!(loaded.capability, Capability::All);

        let loaded = store.get_role(&uploader.id).await.unwrap().unwrap();
        assert_eq!(loaded, uploader);

        assert_eq!(store.list_roles().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_persistence_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sealbox.db");

        let artifact = make_artifact();
        {
            let store = SqliteStore::open(&path).unwrap();
            store.insert_artifact(&artifact).await.unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let loaded = store.get_artifact(&artifact.id).await.unwrap().unwrap();
        assert_eq!(loaded, artifact);
    }

    #[tokio::test]
    async fn test_module_roundtrip() {
        let store = SqliteStore::open_memory().unwrap();
        let module = Module::new(FILE_MANAGEMENT, "File Management");

        store.upsert_module(&module).await.unwrap();
        let loaded = store.get_module(FILE_MANAGEMENT).await.unwrap().unwrap();
        assert_eq!(loaded, module);
        assert!(store.get_module("nope").await.unwrap().is_none());
    }
}
