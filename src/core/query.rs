//! Resource listing filters.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::core::domain::{CachedResource, ConnectionId, Provider};

/// Optional filters over the visible resources. Empty means everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceQuery {
    pub connection: Option<ConnectionId>,
    pub resource_type: Option<String>,
    pub provider: Option<Provider>,
}

impl ResourceQuery {
    pub fn connection(mut self, id: ConnectionId) -> Self {
        self.connection = Some(id);
        self
    }

    pub fn resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self
    }

    pub fn provider(mut self, provider: Provider) -> Self {
        self.provider = Some(provider);
        self
    }

    /// `provider` is the provider of the resource's connection.
    pub fn matches(&self, resource: &CachedResource, provider: Provider) -> bool {
        self.connection.map_or(true, |id| resource.connection_id == id)
            && self
                .resource_type
                .as_deref()
                .map_or(true, |t| resource.resource_type == t)
            && self.provider.map_or(true, |p| p == provider)
    }
}

/// Listing order: resource type, then name, then native id.
pub fn listing_order(a: &CachedResource, b: &CachedResource) -> Ordering {
    a.resource_type
        .cmp(&b.resource_type)
        .then_with(|| a.display_name().cmp(b.display_name()))
        .then_with(|| a.resource_id.cmp(&b.resource_id))
}

/// Resource count per type.
pub fn type_counts<'a>(resources: impl IntoIterator<Item = &'a CachedResource>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for resource in resources {
        *counts.entry(resource.resource_type.clone()).or_insert(0) += 1;
    }
    counts
}
