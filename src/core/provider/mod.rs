//! Provider adapters.
//!
//! Each provider is a fixed, ordered table of probes. A probe runs one CLI
//! command and maps the payload into [`DiscoveredResource`] records:
//!
//! - id: first present field from the probe's id list
//! - name: the `Name` tag, else the first present name field, else the id
//! - region: the item's own location field, the connection's region, or
//!   `global` for account-wide resources
//!
//! Missing optional fields never fail a probe; items with no id at all are
//! skipped. Only executor errors propagate.
//!
//! ## Adding a New Provider
//!
//! 1. Add a variant to `Provider`
//! 2. Write its `ProviderCli` (auth wiring) and probe table in a new file
//! 3. Dispatch to it from `CliProviders`

use std::path::PathBuf;
use std::time::Duration;

use serde_json::Value;
use tracing::trace;

use crate::core::constants;
use crate::core::domain::{Credentials, DiscoveredResource, Provider};
use crate::core::exec::CliExecutor;
use crate::error::ExecError;

pub mod aws;
pub mod azure;

pub use aws::AwsCli;
pub use azure::AzureCli;

/// What a probe knows about the connection it runs for.
#[derive(Debug, Clone, Copy)]
pub struct ProbeContext<'a> {
    pub credentials: &'a Credentials,
    /// The connection's configured region, if any.
    pub region: Option<&'a str>,
}

impl<'a> ProbeContext<'a> {
    /// The connection's region, ignoring blanks.
    pub fn connection_region(&self) -> Option<&'a str> {
        self.region.filter(|r| !r.trim().is_empty())
    }
}

/// One discovery function targeting one resource type.
pub trait Probe {
    fn name(&self) -> &str;

    fn discover(&self, ctx: &ProbeContext<'_>) -> Result<Vec<DiscoveredResource>, ExecError>;
}

/// The provider adapters available to discovery.
pub trait Providers: Send + Sync {
    /// Check the provider CLI is usable before touching the cache.
    fn preflight(&self, provider: Provider) -> Result<(), ExecError>;

    /// Ordered probe list for `provider`.
    fn probes(&self, provider: Provider) -> Vec<Box<dyn Probe + '_>>;

    /// Cheap authenticated call proving the credentials work.
    fn check(&self, provider: Provider, ctx: &ProbeContext<'_>) -> Result<Value, ExecError>;
}

/// Auth wiring for one provider CLI.
pub trait ProviderCli {
    /// Region the call runs in and records default to. Empty when the
    /// provider has no notion of a connection region.
    fn region<'a>(&self, ctx: &ProbeContext<'a>) -> &'a str;

    /// Run `args` with the discovery timeout.
    fn run(&self, args: &[&str], ctx: &ProbeContext<'_>) -> Result<Value, ExecError>;
}

/// Where a probe finds an item's region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionSource {
    /// A field on the item, falling back to the connection.
    Field(&'static str),
    /// The connection's region.
    Connection,
    /// Account-wide resource.
    Global,
}

/// Declarative probe definition.
#[derive(Debug)]
pub struct ProbeSpec {
    pub name: &'static str,
    pub resource_type: &'static str,
    pub args: &'static [&'static str],
    /// Array fields to descend through; empty means the payload is the array.
    pub items: &'static [&'static str],
    pub id: &'static [&'static str],
    pub name_fields: &'static [&'static str],
    pub region: RegionSource,
}

impl ProbeSpec {
    /// Map a CLI payload to records. `fallback` is the region used when the
    /// item carries none.
    pub fn map(&self, data: &Value, fallback: &str) -> Vec<DiscoveredResource> {
        let mut records = Vec::new();
        for item in items(data, self.items) {
            let Some(id) = first_str(item, self.id) else {
                trace!(probe = self.name, "skipping item without id");
                continue;
            };
            let name = name_tag(item)
                .or_else(|| first_str(item, self.name_fields))
                .unwrap_or(id);
            let region = match self.region {
                RegionSource::Field(field) => str_field(item, field).unwrap_or(fallback),
                RegionSource::Connection => fallback,
                RegionSource::Global => constants::GLOBAL_REGION,
            };
            records.push(DiscoveredResource {
                resource_type: self.resource_type.to_string(),
                resource_id: id.to_string(),
                resource_name: Some(name.to_string()),
                region: (!region.is_empty()).then(|| region.to_string()),
                raw_data: item.clone(),
            });
        }
        records
    }
}

/// A probe backed by a `ProbeSpec` and a provider CLI.
pub struct TableProbe<'a, C> {
    cli: &'a C,
    spec: &'static ProbeSpec,
}

impl<'a, C: ProviderCli> TableProbe<'a, C> {
    pub fn new(cli: &'a C, spec: &'static ProbeSpec) -> Self {
        Self { cli, spec }
    }
}

impl<C: ProviderCli> Probe for TableProbe<'_, C> {
    fn name(&self) -> &str {
        self.spec.name
    }

    fn discover(&self, ctx: &ProbeContext<'_>) -> Result<Vec<DiscoveredResource>, ExecError> {
        let data = self.cli.run(self.spec.args, ctx)?;
        Ok(self.spec.map(&data, self.cli.region(ctx)))
    }
}

/// Adapters that shell out to the real provider CLIs.
#[derive(Debug, Clone)]
pub struct CliProviders {
    aws: AwsCli,
    azure: AzureCli,
}

impl CliProviders {
    pub fn new(executor: CliExecutor, aws_cli: PathBuf, az_cli: PathBuf, timeout: Duration) -> Self {
        Self {
            aws: AwsCli::new(executor.clone(), aws_cli, timeout),
            azure: AzureCli::new(executor, az_cli, timeout),
        }
    }
}

impl Providers for CliProviders {
    fn preflight(&self, provider: Provider) -> Result<(), ExecError> {
        match provider {
            Provider::Aws => self.aws.resolve().map(|_| ()),
            Provider::Azure => self.azure.resolve().map(|_| ()),
        }
    }

    fn probes(&self, provider: Provider) -> Vec<Box<dyn Probe + '_>> {
        match provider {
            Provider::Aws => aws::PROBES
                .iter()
                .map(|spec| Box::new(TableProbe::new(&self.aws, spec)) as Box<dyn Probe + '_>)
                .collect(),
            Provider::Azure => azure::PROBES
                .iter()
                .map(|spec| Box::new(TableProbe::new(&self.azure, spec)) as Box<dyn Probe + '_>)
                .collect(),
        }
    }

    fn check(&self, provider: Provider, ctx: &ProbeContext<'_>) -> Result<Value, ExecError> {
        match provider {
            Provider::Aws => self.aws.check(ctx),
            Provider::Azure => self.azure.check(ctx.credentials),
        }
    }
}

/// Non-empty string field.
pub fn str_field<'v>(item: &'v Value, field: &str) -> Option<&'v str> {
    item.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn first_str<'v>(item: &'v Value, fields: &[&str]) -> Option<&'v str> {
    fields.iter().find_map(|f| str_field(item, f))
}

/// Value of the first tag named `Name`.
///
/// Accepts both the AWS list form (`[{"Key": .., "Value": ..}]`) and the
/// Azure map form (`{"Name": ..}`).
pub fn name_tag(item: &Value) -> Option<&str> {
    match item.get("Tags").or_else(|| item.get("tags"))? {
        Value::Array(tags) => tags
            .iter()
            .find(|t| t.get("Key").and_then(Value::as_str) == Some("Name"))
            .and_then(|t| t.get("Value").and_then(Value::as_str)),
        Value::Object(tags) => tags.get("Name").and_then(Value::as_str),
        _ => None,
    }
    .filter(|s| !s.is_empty())
}

fn items<'v>(data: &'v Value, path: &[&str]) -> Vec<&'v Value> {
    let Some((first, rest)) = path.split_first() else {
        return data
            .as_array()
            .map(|a| a.iter().collect())
            .unwrap_or_default();
    };
    let mut current: Vec<&Value> = data
        .get(*first)
        .and_then(Value::as_array)
        .map(|a| a.iter().collect())
        .unwrap_or_default();
    for key in rest {
        current = current
            .into_iter()
            .filter_map(|v| v.get(*key).and_then(Value::as_array))
            .flatten()
            .collect();
    }
    current
}
