//! JSON file repository.
//!
//! Keeps connections and cached resources in `<data_dir>/inventory.json`.
//! Writers in this process are serialized by a mutex; every write replaces
//! the file atomically (temp file in the same directory, then rename).

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Repository;
use crate::core::constants;
use crate::core::domain::{CachedResource, ConnectionId, CredentialConnection};
use crate::error::{Result, StoreError};

/// Serialized repository contents.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub(crate) struct Snapshot {
    #[serde(default)]
    pub connections: Vec<CredentialConnection>,
    #[serde(default)]
    pub resources: Vec<CachedResource>,
}

impl Snapshot {
    pub fn connection(&self, id: ConnectionId) -> Option<&CredentialConnection> {
        self.connections.iter().find(|c| c.id == id)
    }

    pub fn update_connection(&mut self, connection: &CredentialConnection) -> Result<()> {
        let slot = self
            .connections
            .iter_mut()
            .find(|c| c.id == connection.id)
            .ok_or_else(|| StoreError::ConnectionNotFound(connection.id.to_string()))?;
        *slot = connection.clone();
        Ok(())
    }

    pub fn clear_resources(&mut self, connection: ConnectionId) -> usize {
        let before = self.resources.len();
        self.resources.retain(|r| r.connection_id != connection);
        before - self.resources.len()
    }
}

/// Repository backed by a JSON file.
#[derive(Debug)]
pub struct JsonFile {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFile {
    /// Open (or lazily create) the repository in `data_dir`.
    pub fn open(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir).map_err(|source| StoreError::WriteFailed {
            path: data_dir.display().to_string(),
            source,
        })?;
        Ok(Self {
            path: data_dir.join(constants::REPOSITORY_FILE),
            lock: Mutex::new(()),
        })
    }

    /// Path to the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Snapshot> {
        if !self.path.exists() {
            return Ok(Snapshot::default());
        }
        let contents = std::fs::read(&self.path).map_err(|source| StoreError::ReadFailed {
            path: self.path.display().to_string(),
            source,
        })?;
        let snapshot: Snapshot =
            serde_json::from_slice(&contents).map_err(|e| StoreError::InvalidFormat {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })?;
        debug!(
            connections = snapshot.connections.len(),
            resources = snapshot.resources.len(),
            "repository loaded"
        );
        Ok(snapshot)
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let write_failed = |source| StoreError::WriteFailed {
            path: self.path.display().to_string(),
            source,
        };
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let contents = serde_json::to_vec_pretty(snapshot).map_err(|e| {
            write_failed(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_failed)?;
        tmp.write_all(&contents).map_err(write_failed)?;
        tmp.as_file().sync_all().map_err(write_failed)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(tmp.path(), std::fs::Permissions::from_mode(0o600))
                .map_err(write_failed)?;
        }

        tmp.persist(&self.path).map_err(|e| write_failed(e.error))?;
        Ok(())
    }

    fn modify<T>(&self, f: impl FnOnce(&mut Snapshot) -> Result<T>) -> Result<T> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut snapshot = self.load()?;
        let out = f(&mut snapshot)?;
        self.save(&snapshot)?;
        Ok(out)
    }
}

impl Repository for JsonFile {
    fn connections(&self) -> Result<Vec<CredentialConnection>> {
        Ok(self.load()?.connections)
    }

    fn connection(&self, id: ConnectionId) -> Result<Option<CredentialConnection>> {
        Ok(self.load()?.connection(id).cloned())
    }

    fn insert_connection(&self, connection: CredentialConnection) -> Result<()> {
        self.modify(|s| {
            s.connections.push(connection);
            Ok(())
        })
    }

    fn update_connection(&self, connection: &CredentialConnection) -> Result<()> {
        self.modify(|s| s.update_connection(connection))
    }

    fn clear_resources(&self, connection: ConnectionId) -> Result<usize> {
        self.modify(|s| Ok(s.clear_resources(connection)))
    }

    fn insert_resources(&self, resources: Vec<CachedResource>) -> Result<()> {
        self.modify(|s| {
            s.resources.extend(resources);
            Ok(())
        })
    }

    fn resources(&self) -> Result<Vec<CachedResource>> {
        Ok(self.load()?.resources)
    }
}
