//! Test fixtures: credentials, scriptable providers, an in-memory inventory.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};

use native_form::core::audit::{AuditSink, RecordingAudit};
use native_form::core::cipher::SecretCipher;
use native_form::core::domain::{
    CredentialConnection, Credentials, DiscoveredResource, NewConnection, Provider, User,
};
use native_form::core::inventory::Inventory;
use native_form::core::provider::{Probe, ProbeContext, Providers};
use native_form::core::store::Memory;
use native_form::core::vault::CredentialStore;
use native_form::error::ExecError;

/// AWS credential fields as piped into `connection add`, in prompt order.
pub const AWS_STDIN: &str = "AKIAEXAMPLE\nwJalrXUtnFEMI/K7MDENG\neu-west-1\n";

pub fn aws_credentials() -> Credentials {
    Credentials::new()
        .with("aws_access_key_id", "AKIAEXAMPLE")
        .with("aws_secret_access_key", "wJalrXUtnFEMI/K7MDENG")
        .with("aws_default_region", "eu-west-1")
}

pub fn azure_credentials() -> Credentials {
    Credentials::new()
        .with("tenant_id", "tenant-1")
        .with("client_id", "app-1")
        .with("client_secret", "s3cret")
        .with("subscription_id", "sub-1")
}

/// A discovered record with a minimal payload.
pub fn found(resource_type: &str, id: &str) -> DiscoveredResource {
    DiscoveredResource {
        resource_type: resource_type.to_string(),
        resource_id: id.to_string(),
        resource_name: Some(id.to_string()),
        region: Some("eu-west-1".to_string()),
        raw_data: json!({ "id": id }),
    }
}

/// Failure a probe tolerates.
pub fn soft_failure(reason: &str) -> ExecError {
    ExecError::CommandFailed {
        command: "aws".to_string(),
        code: 255,
        stderr: reason.to_string(),
    }
}

/// Providers whose probes return canned outcomes.
pub struct FakeProviders {
    probes: Vec<(&'static str, Result<Vec<DiscoveredResource>, ExecError>)>,
    preflight: Option<ExecError>,
    check: Result<Value, ExecError>,
    /// Number of probe calls made.
    pub calls: AtomicUsize,
}

impl FakeProviders {
    pub fn new() -> Self {
        Self {
            probes: Vec::new(),
            preflight: None,
            check: Ok(json!({ "Account": "123456789012" })),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn probe(
        mut self,
        name: &'static str,
        outcome: Result<Vec<DiscoveredResource>, ExecError>,
    ) -> Self {
        self.probes.push((name, outcome));
        self
    }

    pub fn missing_cli(mut self) -> Self {
        self.preflight = Some(ExecError::CommandNotFound("/usr/local/bin/aws".to_string()));
        self
    }

    pub fn failing_check(mut self, error: ExecError) -> Self {
        self.check = Err(error);
        self
    }
}

struct FakeProbe<'a> {
    name: &'static str,
    outcome: &'a Result<Vec<DiscoveredResource>, ExecError>,
    calls: &'a AtomicUsize,
}

impl Probe for FakeProbe<'_> {
    fn name(&self) -> &str {
        self.name
    }

    fn discover(&self, _ctx: &ProbeContext<'_>) -> Result<Vec<DiscoveredResource>, ExecError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}

impl Providers for FakeProviders {
    fn preflight(&self, _provider: Provider) -> Result<(), ExecError> {
        match &self.preflight {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    fn probes(&self, _provider: Provider) -> Vec<Box<dyn Probe + '_>> {
        self.probes
            .iter()
            .map(|(name, outcome)| {
                Box::new(FakeProbe {
                    name: *name,
                    outcome,
                    calls: &self.calls,
                }) as Box<dyn Probe + '_>
            })
            .collect()
    }

    fn check(&self, _provider: Provider, _ctx: &ProbeContext<'_>) -> Result<Value, ExecError> {
        self.check.clone()
    }
}

/// An inventory over an in-memory repository.
pub struct Harness {
    pub inventory: Inventory,
    pub store: Arc<CredentialStore>,
    pub audit: Arc<RecordingAudit>,
    pub providers: Arc<FakeProviders>,
}

impl Harness {
    pub fn new(providers: FakeProviders) -> Self {
        let key = SecretCipher::generate_key();
        let cipher = SecretCipher::from_key(&key).expect("generated key must parse");
        let store = Arc::new(CredentialStore::new(cipher, Arc::new(Memory::new())));
        let providers = Arc::new(providers);
        let audit = Arc::new(RecordingAudit::new());
        let inventory = Inventory::new(
            Arc::clone(&store),
            Arc::clone(&providers) as Arc<dyn Providers>,
            Arc::clone(&audit) as Arc<dyn AuditSink>,
        );
        Self {
            inventory,
            store,
            audit,
            providers,
        }
    }

    /// Create a personal AWS connection owned by `user`.
    pub fn personal(&self, user: &User, name: &str) -> CredentialConnection {
        self.inventory
            .create_connection(user, draft(name, false), &aws_credentials())
            .expect("failed to create personal connection")
    }

    /// Create a server-wide default AWS connection as an administrator.
    pub fn server_default(&self, name: &str) -> CredentialConnection {
        self.inventory
            .create_connection(&User::admin("root"), draft(name, true), &aws_credentials())
            .expect("failed to create default connection")
    }
}

pub fn draft(name: &str, server_default: bool) -> NewConnection {
    NewConnection {
        name: name.to_string(),
        provider: Provider::Aws,
        region: Some("eu-west-1".to_string()),
        server_default,
    }
}
