//! Connection lifecycle.
//!
//! Create, edit, soft-delete and test-stamp connections. Every write runs
//! under the store's write lock and re-checks the invariants against the
//! persisted set.

use chrono::Utc;
use tracing::debug;

use super::{check_invariants, CredentialStore};
use crate::core::domain::{
    ConnectionId, ConnectionUpdate, CredentialConnection, Credentials, NewConnection, User,
};
use crate::error::{Error, Result, StoreError, ValidationError};

impl CredentialStore {
    /// Create a connection owned by `actor`, or a server-wide default.
    ///
    /// # Errors
    ///
    /// Returns `Error::AccessDenied` if a non-administrator asks for a
    /// server-wide default.
    /// Returns `StoreError::DuplicateDefault` or `StoreError::DuplicateName`
    /// if the new connection would break an invariant.
    pub fn create(
        &self,
        actor: &User,
        draft: NewConnection,
        credentials: &Credentials,
    ) -> Result<CredentialConnection> {
        let name = normalize_name(&draft.name)?;
        if draft.server_default && !actor.is_admin() {
            return Err(Error::AccessDenied);
        }

        let _guard = self.lock()?;
        let now = Utc::now();
        let connection = CredentialConnection {
            id: ConnectionId::new(),
            owner: (!draft.server_default).then(|| actor.id.clone()),
            name,
            provider: draft.provider,
            is_default: draft.server_default,
            secret: self.seal(credentials)?,
            region: normalize_region(draft.region),
            is_active: true,
            last_tested: None,
            created_at: now,
            updated_at: now,
        };

        check_invariants(&self.repo.connections()?, &connection)?;
        self.repo.insert_connection(connection.clone())?;
        debug!(
            connection = %connection.id,
            provider = %connection.provider,
            scope = connection.scope(),
            "connection created"
        );
        Ok(connection)
    }

    /// Apply metadata edits and, optionally, new credentials.
    ///
    /// Promotion to a server-wide default drops the owner; demotion hands
    /// the connection to `actor`.
    ///
    /// # Errors
    ///
    /// Returns `Error::AccessDenied` if a non-administrator changes the
    /// default flag. Returns `StoreError::ConnectionNotFound` for unknown or
    /// inactive ids.
    pub fn update(
        &self,
        actor: &User,
        id: ConnectionId,
        changes: ConnectionUpdate,
        credentials: Option<&Credentials>,
    ) -> Result<CredentialConnection> {
        let _guard = self.lock()?;
        let mut connection = self.active(id)?;

        if let Some(name) = changes.name {
            connection.name = normalize_name(&name)?;
        }
        if let Some(region) = changes.region {
            connection.region = normalize_region(region);
        }
        if let Some(server_default) = changes.server_default {
            if server_default != connection.is_server_default() {
                if !actor.is_admin() {
                    return Err(Error::AccessDenied);
                }
                connection.is_default = server_default;
                connection.owner = (!server_default).then(|| actor.id.clone());
            }
        }
        if let Some(credentials) = credentials {
            connection.secret = self.seal(credentials)?;
        }
        connection.updated_at = Utc::now();

        check_invariants(&self.repo.connections()?, &connection)?;
        self.repo.update_connection(&connection)?;
        debug!(connection = %connection.id, "connection updated");
        Ok(connection)
    }

    /// Soft delete. Cached resources stay but are no longer visible.
    pub fn deactivate(&self, id: ConnectionId) -> Result<CredentialConnection> {
        let _guard = self.lock()?;
        let mut connection = self.active(id)?;
        connection.is_active = false;
        connection.updated_at = Utc::now();
        self.repo.update_connection(&connection)?;
        debug!(connection = %connection.id, "connection deactivated");
        Ok(connection)
    }

    /// Record a successful connection test.
    pub fn mark_tested(&self, id: ConnectionId) -> Result<CredentialConnection> {
        let _guard = self.lock()?;
        let mut connection = self.active(id)?;
        connection.last_tested = Some(Utc::now());
        self.repo.update_connection(&connection)?;
        Ok(connection)
    }

    fn active(&self, id: ConnectionId) -> Result<CredentialConnection> {
        self.repo
            .connection(id)?
            .filter(|c| c.is_active)
            .ok_or_else(|| StoreError::ConnectionNotFound(id.to_string()).into())
    }
}

fn normalize_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::Empty("connection name").into());
    }
    Ok(name.to_string())
}

fn normalize_region(region: Option<String>) -> Option<String> {
    region
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
}
