//! Who may see what.
//!
//! A user sees their own active connections plus every active server-wide
//! default, and the cached resources of exactly those connections.
//! Administrators may open any active connection or resource directly, but
//! listings stay scoped the same way for everyone.
//!
//! Every denial is the same generic `AccessDenied`, whether the target is
//! foreign, inactive, or missing.

use std::collections::HashSet;

use tracing::debug;

use crate::core::domain::{CachedResource, ConnectionId, CredentialConnection, User};
use crate::error::{Error, Result};

/// Whether `connection` is in the visible set of `user`.
pub fn can_see(user: &User, connection: &CredentialConnection) -> bool {
    connection.is_active && (connection.is_owned_by(&user.id) || connection.is_server_default())
}

/// A user's view over the stored connections.
#[derive(Debug)]
pub struct Visibility<'u> {
    user: &'u User,
    connections: Vec<CredentialConnection>,
    visible: HashSet<ConnectionId>,
}

impl<'u> Visibility<'u> {
    /// Build the view from every stored connection.
    pub fn new(user: &'u User, connections: Vec<CredentialConnection>) -> Self {
        let visible = connections
            .iter()
            .filter(|c| can_see(user, c))
            .map(|c| c.id)
            .collect();
        Self {
            user,
            connections,
            visible,
        }
    }

    pub fn user(&self) -> &User {
        self.user
    }

    /// Own active connections, then active server-wide defaults.
    pub fn visible_connections(&self) -> Vec<&CredentialConnection> {
        let (own, defaults): (Vec<_>, Vec<_>) = self
            .connections
            .iter()
            .filter(|c| self.visible.contains(&c.id))
            .partition(|c| c.is_owned_by(&self.user.id));
        own.into_iter().chain(defaults).collect()
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.visible.contains(&id)
    }

    /// Predicate restricting resources to the visible set.
    pub fn sees(&self, resource: &CachedResource) -> bool {
        self.contains(resource.connection_id)
    }

    /// Keep only the resources this user may list.
    pub fn visible_resources(&self, resources: Vec<CachedResource>) -> Vec<CachedResource> {
        resources.into_iter().filter(|r| self.sees(r)).collect()
    }

    /// Any stored connection, active or not.
    pub fn lookup(&self, id: ConnectionId) -> Option<&CredentialConnection> {
        self.connections.iter().find(|c| c.id == id)
    }

    /// Gate direct access to one connection.
    ///
    /// # Errors
    ///
    /// Returns `Error::AccessDenied` if the connection is missing, inactive,
    /// or outside the visible set of a non-administrator.
    pub fn authorize_connection(&self, id: ConnectionId) -> Result<&CredentialConnection> {
        match self.lookup(id) {
            Some(c) if c.is_active && (self.user.is_admin() || self.contains(id)) => Ok(c),
            _ => self.deny("connection", &id.to_string()),
        }
    }

    /// Gate changes to one connection: its owner, or an administrator.
    /// Server-wide defaults are administrator-only.
    pub fn authorize_manage(&self, id: ConnectionId) -> Result<&CredentialConnection> {
        let connection = self.authorize_connection(id)?;
        if self.user.is_admin() || connection.is_owned_by(&self.user.id) {
            Ok(connection)
        } else {
            self.deny("connection", &id.to_string())
        }
    }

    /// Gate direct access to one cached resource.
    pub fn authorize_resource(&self, resource: Option<CachedResource>) -> Result<CachedResource> {
        match resource {
            Some(r) if self.authorize_connection(r.connection_id).is_ok() => Ok(r),
            Some(r) => self.deny("resource", &r.id.to_string()),
            None => self.deny("resource", "missing"),
        }
    }

    fn deny<T>(&self, kind: &'static str, subject: &str) -> Result<T> {
        debug!(user = %self.user.id, kind, subject, "access denied");
        Err(Error::AccessDenied)
    }
}
