//! Discovered and cached resources.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::ConnectionId;

/// A resource as a probe reports it, before it is cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredResource {
    pub resource_type: String,
    pub resource_id: String,
    pub resource_name: Option<String>,
    pub region: Option<String>,
    /// Untouched provider payload.
    pub raw_data: Value,
}

/// A resource in the cache, owned by one connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedResource {
    pub id: Uuid,
    pub connection_id: ConnectionId,
    pub resource_type: String,
    pub resource_id: String,
    pub resource_name: Option<String>,
    pub region: Option<String>,
    pub raw_data: Value,
    pub discovered_at: DateTime<Utc>,
}

impl CachedResource {
    /// Stamp a discovered resource for `connection_id`.
    pub fn from_discovered(
        connection_id: ConnectionId,
        found: DiscoveredResource,
        discovered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            connection_id,
            resource_type: found.resource_type,
            resource_id: found.resource_id,
            resource_name: found.resource_name,
            region: found.region,
            raw_data: found.raw_data,
            discovered_at,
        }
    }

    /// Name for display; falls back to the native id.
    pub fn display_name(&self) -> &str {
        match self.resource_name.as_deref() {
            Some(n) if !n.is_empty() => n,
            _ => &self.resource_id,
        }
    }
}
