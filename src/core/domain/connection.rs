//! Credential connection records.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Provider, UserId};
use crate::error::ValidationError;

/// Opaque connection identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ConnectionId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| ValidationError::InvalidId(s.to_string()))
    }
}

/// Encrypted credential token.
///
/// Only the credential store can open it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretBlob(String);

impl SecretBlob {
    pub(crate) fn new(token: String) -> Self {
        Self(token)
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretBlob({} bytes)", self.0.len())
    }
}

/// A named, provider-scoped set of credentials.
///
/// `owner == None` marks a server-wide default; such a connection always has
/// `is_default == true`, and a personal connection never does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialConnection {
    pub id: ConnectionId,
    pub owner: Option<UserId>,
    pub name: String,
    pub provider: Provider,
    pub is_default: bool,
    pub secret: SecretBlob,
    #[serde(default)]
    pub region: Option<String>,
    pub is_active: bool,
    #[serde(default)]
    pub last_tested: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CredentialConnection {
    /// Whether this is an active server-wide default.
    pub fn is_server_default(&self) -> bool {
        self.owner.is_none() && self.is_default
    }

    /// Whether `user` owns this connection.
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        self.owner.as_ref() == Some(user)
    }

    /// Scope label for display.
    pub fn scope(&self) -> &'static str {
        if self.is_server_default() {
            "default"
        } else {
            "personal"
        }
    }
}

/// Input for creating a connection.
#[derive(Debug, Clone)]
pub struct NewConnection {
    pub name: String,
    pub provider: Provider,
    pub region: Option<String>,
    /// Request a server-wide default (administrators only).
    pub server_default: bool,
}

/// Metadata edits for an existing connection. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct ConnectionUpdate {
    pub name: Option<String>,
    pub region: Option<Option<String>>,
    /// Promote to (`true`) or demote from (`false`) server-wide default.
    pub server_default: Option<bool>,
}
