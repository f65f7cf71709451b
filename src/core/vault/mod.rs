//! The credential store.
//!
//! `CredentialStore` is the only component that holds the process key. It
//! seals credential maps into [`SecretBlob`]s, opens them again for
//! discovery, and enforces the connection invariants on every write:
//!
//! - at most one active server-wide default per provider
//! - connection names unique within one owner scope
//! - only administrators create or change server-wide defaults

mod lifecycle;

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use tracing::{debug, trace};
use zeroize::Zeroizing;

use crate::core::cipher::SecretCipher;
use crate::core::domain::{
    ConnectionId, CredentialConnection, Credentials, Provider, SecretBlob, UserId,
};
use crate::core::store::Repository;
use crate::error::{CipherError, Result, StoreError};

/// Encrypted credential storage over a [`Repository`].
pub struct CredentialStore {
    cipher: SecretCipher,
    repo: Arc<dyn Repository>,
    writes: Mutex<()>,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("cipher", &self.cipher)
            .finish_non_exhaustive()
    }
}

impl CredentialStore {
    pub fn new(cipher: SecretCipher, repo: Arc<dyn Repository>) -> Self {
        Self {
            cipher,
            repo,
            writes: Mutex::new(()),
        }
    }

    pub fn repository(&self) -> &Arc<dyn Repository> {
        &self.repo
    }

    /// Fingerprint of the loaded key.
    pub fn fingerprint(&self) -> String {
        self.cipher.fingerprint()
    }

    /// Serialize and encrypt a credential map.
    pub fn seal(&self, credentials: &Credentials) -> Result<SecretBlob> {
        let payload = serde_json::to_vec(credentials)
            .map(Zeroizing::new)
            .map_err(|e| CipherError::EncryptionFailed(e.to_string()))?;
        self.cipher.encrypt(&payload)
    }

    /// Replace a connection's credentials and persist it.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ConnectionNotFound` if the connection was never
    /// stored.
    pub fn save(
        &self,
        connection: &mut CredentialConnection,
        credentials: &Credentials,
    ) -> Result<()> {
        let _guard = self.lock()?;
        connection.secret = self.seal(credentials)?;
        connection.updated_at = Utc::now();
        self.repo.update_connection(connection)?;
        debug!(connection = %connection.id, "credentials saved");
        Ok(())
    }

    /// Decrypt a connection's credentials.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::CorruptCredentials` if the token does not
    /// authenticate under the process key or the payload is not a string map.
    pub fn load(&self, connection: &CredentialConnection) -> Result<Credentials> {
        let corrupt = || StoreError::CorruptCredentials {
            connection: connection.name.clone(),
        };
        let payload = self.cipher.decrypt(&connection.secret).map_err(|e| {
            trace!(connection = %connection.id, error = %e, "decrypt failed");
            corrupt()
        })?;
        let credentials: Credentials = serde_json::from_slice(&payload).map_err(|_| corrupt())?;
        trace!(connection = %connection.id, fields = credentials.len(), "credentials loaded");
        Ok(credentials)
    }

    /// The connection that applies to `user` for `provider`.
    ///
    /// The user's own active connection wins over the active server-wide
    /// default.
    pub fn resolve_effective(
        &self,
        user: &UserId,
        provider: Provider,
    ) -> Result<Option<CredentialConnection>> {
        let connections = self.repo.connections()?;
        let active = connections
            .iter()
            .filter(|c| c.is_active && c.provider == provider);
        let effective = active
            .clone()
            .find(|c| c.is_owned_by(user))
            .or_else(|| active.clone().find(|c| c.is_server_default()))
            .cloned();
        debug!(
            user = %user,
            provider = %provider,
            resolved = ?effective.as_ref().map(|c| c.id),
            "effective connection"
        );
        Ok(effective)
    }

    pub fn connection(&self, id: ConnectionId) -> Result<Option<CredentialConnection>> {
        self.repo.connection(id)
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.writes.lock().map_err(|_| StoreError::Poisoned.into())
    }
}

/// Check `candidate` against every other stored connection.
fn check_invariants(
    existing: &[CredentialConnection],
    candidate: &CredentialConnection,
) -> Result<()> {
    if !candidate.is_active {
        return Ok(());
    }
    for other in existing
        .iter()
        .filter(|c| c.id != candidate.id && c.is_active)
    {
        if candidate.is_server_default()
            && other.is_server_default()
            && other.provider == candidate.provider
        {
            return Err(StoreError::DuplicateDefault {
                provider: candidate.provider,
                existing: other.name.clone(),
            }
            .into());
        }
        if other.owner == candidate.owner && other.name == candidate.name {
            return Err(StoreError::DuplicateName(candidate.name.clone()).into());
        }
    }
    Ok(())
}
