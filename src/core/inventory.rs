//! Application operations.
//!
//! `Inventory` is the surface a front end drives: connection management,
//! discovery, browsing and export. Each operation resolves the caller's
//! visibility first and records an audit event for anything that changes
//! state or exports data.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use crate::core::audit::{AuditSink, AuditTarget};
use crate::core::constants;
use crate::core::discovery::{DiscoveryOutcome, Orchestrator};
use crate::core::domain::{
    CachedResource, ConnectionId, ConnectionUpdate, CredentialConnection, Credentials,
    NewConnection, Provider, User,
};
use crate::core::exec::truncate_chars;
use crate::core::export::{self, ExportRow};
use crate::core::provider::{ProbeContext, Providers};
use crate::core::query::{listing_order, type_counts, ResourceQuery};
use crate::core::vault::CredentialStore;
use crate::core::visibility::Visibility;
use crate::error::{Error, Result};

/// Outcome of a connection test.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionTest {
    pub ok: bool,
    pub message: String,
    /// Identity payload returned by the provider on success.
    pub details: Value,
}

/// Response of the discovery trigger, with its HTTP-style status code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveryResponse {
    #[serde(skip)]
    pub code: u16,
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl DiscoveryResponse {
    fn ok(count: usize) -> Self {
        Self {
            code: 200,
            status: "ok",
            message: format!("Discovered {} resources", count),
            count: Some(count),
        }
    }

    fn error(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            status: "error",
            message: message.into(),
            count: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == 200
    }
}

/// A filtered resource listing.
#[derive(Debug, Clone)]
pub struct ResourceListing {
    pub resources: Vec<CachedResource>,
    /// Per-type counts over everything visible, before filtering.
    pub type_counts: BTreeMap<String, usize>,
    pub connections: Vec<CredentialConnection>,
}

/// The credential vault and discovery engine behind one front end.
pub struct Inventory {
    store: Arc<CredentialStore>,
    discovery: Orchestrator,
    audit: Arc<dyn AuditSink>,
}

impl Inventory {
    pub fn new(
        store: Arc<CredentialStore>,
        providers: Arc<dyn Providers>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            discovery: Orchestrator::new(Arc::clone(&store), providers),
            store,
            audit,
        }
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    fn view<'u>(&self, user: &'u User) -> Result<Visibility<'u>> {
        Ok(Visibility::new(user, self.store.repository().connections()?))
    }

    fn record(&self, actor: &User, action: &str, target: AuditTarget, details: Value) {
        self.audit.record_event(&actor.id, action, &target, details);
    }

    // Connections

    /// Own active connections, then the active server-wide defaults.
    pub fn connections(&self, actor: &User) -> Result<Vec<CredentialConnection>> {
        let view = self.view(actor)?;
        Ok(view.visible_connections().into_iter().cloned().collect())
    }

    /// The connection discovery would use for `actor` and `provider`.
    pub fn effective_connection(
        &self,
        actor: &User,
        provider: Provider,
    ) -> Result<Option<CredentialConnection>> {
        self.store.resolve_effective(&actor.id, provider)
    }

    pub fn create_connection(
        &self,
        actor: &User,
        draft: NewConnection,
        credentials: &Credentials,
    ) -> Result<CredentialConnection> {
        let connection = self.store.create(actor, draft, credentials)?;
        self.record(
            actor,
            "create_connection",
            AuditTarget::connection(connection.id),
            json!({ "provider": connection.provider, "scope": connection.scope() }),
        );
        Ok(connection)
    }

    /// Edit a connection the caller manages.
    ///
    /// # Errors
    ///
    /// Returns `Error::AccessDenied` unless the caller owns the connection
    /// or is an administrator.
    pub fn edit_connection(
        &self,
        actor: &User,
        id: ConnectionId,
        changes: ConnectionUpdate,
        credentials: Option<&Credentials>,
    ) -> Result<CredentialConnection> {
        self.view(actor)?.authorize_manage(id)?;
        let rotated = credentials.is_some();
        let connection = self.store.update(actor, id, changes, credentials)?;
        self.record(
            actor,
            "edit_connection",
            AuditTarget::connection(id),
            json!({ "rotated": rotated }),
        );
        Ok(connection)
    }

    /// Soft delete a connection the caller manages.
    pub fn delete_connection(&self, actor: &User, id: ConnectionId) -> Result<CredentialConnection> {
        self.view(actor)?.authorize_manage(id)?;
        let connection = self.store.deactivate(id)?;
        self.record(actor, "delete_connection", AuditTarget::connection(id), json!({}));
        Ok(connection)
    }

    /// Make one cheap authenticated call with the stored credentials.
    ///
    /// Provider failures are reported in the result, not as an error.
    ///
    /// # Errors
    ///
    /// Returns `Error::AccessDenied` for connections outside the caller's
    /// reach and `StoreError::CorruptCredentials` for unreadable secrets.
    pub fn test_connection(&self, actor: &User, id: ConnectionId) -> Result<ConnectionTest> {
        let connection = self.view(actor)?.authorize_connection(id)?.clone();
        let credentials = self.store.load(&connection)?;

        let ctx = ProbeContext {
            credentials: &credentials,
            region: connection.region.as_deref(),
        };
        match self.discovery.providers().check(connection.provider, &ctx) {
            Ok(details) => {
                self.store.mark_tested(id)?;
                self.record(
                    actor,
                    "test_connection_success",
                    AuditTarget::connection(id),
                    json!({}),
                );
                Ok(ConnectionTest {
                    ok: true,
                    message: "Connection successful".to_string(),
                    details,
                })
            }
            Err(error) => {
                let message = truncate_chars(&error.to_string(), constants::DIAGNOSTIC_CHARS);
                self.record(
                    actor,
                    "test_connection_failed",
                    AuditTarget::connection(id),
                    json!({ "error": truncate_chars(&message, constants::STDERR_EXCERPT_CHARS) }),
                );
                Ok(ConnectionTest {
                    ok: false,
                    message,
                    details: Value::Null,
                })
            }
        }
    }

    // Discovery

    /// Run discovery for a connection the caller can see.
    pub fn discover(&self, actor: &User, id: ConnectionId) -> Result<DiscoveryOutcome> {
        let connection = self.view(actor)?.authorize_connection(id)?.clone();
        match self.discovery.run(&connection) {
            Ok(outcome) => {
                let failed: Vec<_> = outcome.failures.iter().map(|f| f.probe.as_str()).collect();
                self.record(
                    actor,
                    "discover_resources",
                    AuditTarget::connection(id),
                    json!({ "resources_found": outcome.total, "failed_probes": failed }),
                );
                Ok(outcome)
            }
            Err(error) => {
                self.record(
                    actor,
                    "discover_resources_failed",
                    AuditTarget::connection(id),
                    json!({
                        "error": truncate_chars(&error.to_string(), constants::STDERR_EXCERPT_CHARS)
                    }),
                );
                Err(error)
            }
        }
    }

    /// Discovery trigger taking an unparsed connection id.
    ///
    /// - 200: discovery committed
    /// - 400: id missing or malformed
    /// - 403: connection not accessible (including unknown ids)
    /// - 500: anything else, message capped
    pub fn trigger_discovery(&self, actor: &User, connection_id: Option<&str>) -> DiscoveryResponse {
        let raw = match connection_id.map(str::trim) {
            Some(raw) if !raw.is_empty() => raw,
            _ => return DiscoveryResponse::error(400, "No connection specified"),
        };
        let id: ConnectionId = match raw.parse() {
            Ok(id) => id,
            Err(e) => return DiscoveryResponse::error(400, Error::from(e).to_string()),
        };

        let response = match self.discover(actor, id) {
            Ok(outcome) => DiscoveryResponse::ok(outcome.total),
            Err(Error::AccessDenied) => DiscoveryResponse::error(403, Error::AccessDenied.to_string()),
            Err(error) => DiscoveryResponse::error(
                500,
                truncate_chars(&error.to_string(), constants::DIAGNOSTIC_CHARS),
            ),
        };
        debug!(connection = %id, code = response.code, "discovery trigger");
        response
    }

    // Resources

    /// Visible resources matching `query`, in listing order.
    pub fn resources(&self, actor: &User, query: &ResourceQuery) -> Result<ResourceListing> {
        let view = self.view(actor)?;
        let visible = view.visible_resources(self.store.repository().resources()?);
        let counts = type_counts(&visible);

        let mut resources: Vec<_> = visible
            .into_iter()
            .filter(|r| {
                view.lookup(r.connection_id)
                    .is_some_and(|c| query.matches(r, c.provider))
            })
            .collect();
        resources.sort_by(listing_order);

        Ok(ResourceListing {
            resources,
            type_counts: counts,
            connections: view.visible_connections().into_iter().cloned().collect(),
        })
    }

    /// One cached resource, if the caller may open it.
    pub fn resource_detail(&self, actor: &User, id: Uuid) -> Result<CachedResource> {
        let view = self.view(actor)?;
        view.authorize_resource(self.store.repository().resource(id)?)
    }

    // Export

    pub fn export_csv(&self, actor: &User, query: &ResourceQuery) -> Result<String> {
        let (listing, view) = self.export_set(actor, query)?;
        let rows = export_rows(&listing, &view);
        let out = export::to_csv(&rows);
        self.record(actor, "export_csv", AuditTarget::none(), json!({ "count": rows.len() }));
        Ok(out)
    }

    pub fn export_json(&self, actor: &User, query: &ResourceQuery) -> Result<String> {
        let (listing, view) = self.export_set(actor, query)?;
        let rows = export_rows(&listing, &view);
        let out = export::to_json(&rows)?;
        self.record(actor, "export_json", AuditTarget::none(), json!({ "count": rows.len() }));
        Ok(out)
    }

    pub fn export_resource_json(&self, actor: &User, id: Uuid) -> Result<String> {
        let resource = self.resource_detail(actor, id)?;
        let out = export::resource_json(&resource)?;
        self.record(
            actor,
            "export_json",
            AuditTarget::resource(id),
            json!({ "resource_id": id.to_string() }),
        );
        Ok(out)
    }

    fn export_set<'u>(
        &self,
        actor: &'u User,
        query: &ResourceQuery,
    ) -> Result<(Vec<CachedResource>, Visibility<'u>)> {
        let listing = self.resources(actor, query)?;
        Ok((listing.resources, self.view(actor)?))
    }
}

fn export_rows<'a>(resources: &'a [CachedResource], view: &'a Visibility<'_>) -> Vec<ExportRow<'a>> {
    resources
        .iter()
        .filter_map(|resource| {
            view.lookup(resource.connection_id)
                .map(|connection| ExportRow { resource, connection })
        })
        .collect()
}
