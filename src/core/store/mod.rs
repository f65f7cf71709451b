//! Persistence for connections and cached resources.
//!
//! ## Adding a New Backend
//!
//! 1. Implement the `Repository` trait
//! 2. Add the implementation in a new file (e.g., `sqlite.rs`)
//! 3. Re-export from this module
//!
//! Every method re-reads persisted state; implementations keep no cache
//! beyond what is stored.

use uuid::Uuid;

use crate::core::domain::{CachedResource, ConnectionId, CredentialConnection};
use crate::error::Result;

mod fs;
mod memory;

pub use fs::JsonFile;
pub use memory::Memory;

/// Connection and resource storage.
pub trait Repository: Send + Sync {
    /// All stored connections, active or not, in creation order.
    fn connections(&self) -> Result<Vec<CredentialConnection>>;

    /// Look up one connection by id.
    fn connection(&self, id: ConnectionId) -> Result<Option<CredentialConnection>>;

    /// Insert a new connection.
    fn insert_connection(&self, connection: CredentialConnection) -> Result<()>;

    /// Replace a stored connection with the same id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ConnectionNotFound` if no connection has that id.
    fn update_connection(&self, connection: &CredentialConnection) -> Result<()>;

    /// Delete every cached resource of a connection. Returns how many went.
    fn clear_resources(&self, connection: ConnectionId) -> Result<usize>;

    /// Append a batch of resources in one write.
    fn insert_resources(&self, resources: Vec<CachedResource>) -> Result<()>;

    /// All cached resources.
    fn resources(&self) -> Result<Vec<CachedResource>>;

    /// Look up one cached resource by record id.
    fn resource(&self, id: Uuid) -> Result<Option<CachedResource>> {
        Ok(self.resources()?.into_iter().find(|r| r.id == id))
    }

    /// Cached resources of one connection.
    fn resources_for(&self, connection: ConnectionId) -> Result<Vec<CachedResource>> {
        Ok(self
            .resources()?
            .into_iter()
            .filter(|r| r.connection_id == connection)
            .collect())
    }
}
