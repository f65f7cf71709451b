//! In-memory repository.

use std::sync::RwLock;

use super::fs::Snapshot;
use super::Repository;
use crate::core::domain::{CachedResource, ConnectionId, CredentialConnection};
use crate::error::{Result, StoreError};

/// Repository held in process memory.
#[derive(Debug, Default)]
pub struct Memory {
    state: RwLock<Snapshot>,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, f: impl FnOnce(&Snapshot) -> T) -> Result<T> {
        let state = self.state.read().map_err(|_| StoreError::Poisoned)?;
        Ok(f(&state))
    }

    fn write<T>(&self, f: impl FnOnce(&mut Snapshot) -> Result<T>) -> Result<T> {
        let mut state = self.state.write().map_err(|_| StoreError::Poisoned)?;
        f(&mut state)
    }
}

impl Repository for Memory {
    fn connections(&self) -> Result<Vec<CredentialConnection>> {
        self.read(|s| s.connections.clone())
    }

    fn connection(&self, id: ConnectionId) -> Result<Option<CredentialConnection>> {
        self.read(|s| s.connection(id).cloned())
    }

    fn insert_connection(&self, connection: CredentialConnection) -> Result<()> {
        self.write(|s| {
            s.connections.push(connection);
            Ok(())
        })
    }

    fn update_connection(&self, connection: &CredentialConnection) -> Result<()> {
        self.write(|s| s.update_connection(connection))
    }

    fn clear_resources(&self, connection: ConnectionId) -> Result<usize> {
        self.write(|s| Ok(s.clear_resources(connection)))
    }

    fn insert_resources(&self, resources: Vec<CachedResource>) -> Result<()> {
        self.write(|s| {
            s.resources.extend(resources);
            Ok(())
        })
    }

    fn resources(&self) -> Result<Vec<CachedResource>> {
        self.read(|s| s.resources.clone())
    }
}
