//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use sealbox_authz::{Module, Role, RoleId};
use sealbox_core::{ArtifactStatus, DownloadRecord, FileArtifact, FileId};

use crate::error::Result;
use crate::traits::Store;

/// In-memory store implementation.
///
/// All data is lost when the last handle is dropped. Clones share the
/// same state, like the SQLite backend's shared connection.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryStoreInner>>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Artifacts indexed by id.
    artifacts: HashMap<FileId, FileArtifact>,

    /// Download logs, append order preserved.
    downloads: HashMap<FileId, Vec<DownloadRecord>>,

    /// Role reference table.
    roles: HashMap<RoleId, Role>,

    /// Module reference table.
    modules: HashMap<String, Module>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MemoryStoreInner::default())),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_artifact(&self, artifact: &FileArtifact) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.artifacts.insert(artifact.id, artifact.clone());
        Ok(())
    }

    async fn get_artifact(&self, id: &FileId) -> Result<Option<FileArtifact>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.artifacts.get(id).cloned())
    }

    async fn list_artifacts(&self, owner: Option<&str>) -> Result<Vec<FileArtifact>> {
        let inner = self.inner.read().unwrap();

        let mut artifacts: Vec<FileArtifact> = if let Some(owner) = owner {
            inner
                .artifacts
                .values()
                .filter(|a| a.owner == owner)
                .cloned()
                .collect()
        } else {
            inner.artifacts.values().cloned().collect()
        };

        artifacts.sort_by_key(|a| a.created_at);
        Ok(artifacts)
    }

    async fn set_status(&self, id: &FileId, status: ArtifactStatus) -> Result<bool> {
        let mut inner = self.inner.write().unwrap();
        match inner.artifacts.get_mut(id) {
            Some(artifact) => {
                artifact.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_owner(&self, id: &FileId, owner: &str) -> Result<bool> {
        let mut inner = self.inner.write().unwrap();
        match inner.artifacts.get_mut(id) {
            Some(artifact) => {
                artifact.owner = owner.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_artifact(&self, id: &FileId) -> Result<bool> {
        let mut inner = self.inner.write().unwrap();
        inner.downloads.remove(id);
        Ok(inner.artifacts.remove(id).is_some())
    }

    async fn append_download(&self, id: &FileId, record: &DownloadRecord) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.downloads.entry(*id).or_default().push(record.clone());
        Ok(())
    }

    async fn get_downloads(&self, id: &FileId) -> Result<Vec<DownloadRecord>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.downloads.get(id).cloned().unwrap_or_default())
    }

    async fn get_role(&self, id: &RoleId) -> Result<Option<Role>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.roles.get(id).cloned())
    }

    async fn upsert_role(&self, role: &Role) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.roles.insert(role.id.clone(), role.clone());
        Ok(())
    }

    async fn list_roles(&self) -> Result<Vec<Role>> {
        let inner = self.inner.read().unwrap();
        let mut roles: Vec<Role> = inner.roles.values().cloned().collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    async fn get_module(&self, name: &str) -> Result<Option<Module>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.modules.get(name).cloned())
    }

    async fn upsert_module(&self, module: &Module) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.modules.insert(module.name.clone(), module.clone());
        Ok(())
    }
}
