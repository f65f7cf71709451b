//! Azure adapter.
//!
//! `az` keeps its login state on disk, so every call logs in with the
//! service principal inside a throwaway `AZURE_CONFIG_DIR` and then runs the
//! real command against the same directory.

use std::path::PathBuf;
use std::time::Duration;

use serde_json::Value;

use super::{ProbeContext, ProbeSpec, ProviderCli, RegionSource};
use crate::core::constants;
use crate::core::domain::Credentials;
use crate::core::exec::{CliExecutor, EnvMap, Invocation};
use crate::error::ExecError;

/// Variable `az` reads its profile directory from.
pub const CONFIG_DIR_ENV: &str = "AZURE_CONFIG_DIR";

const fn located(name: &'static str, resource_type: &'static str, args: &'static [&'static str]) -> ProbeSpec {
    ProbeSpec {
        name,
        resource_type,
        args,
        items: &[],
        id: &["id", "name"],
        name_fields: &["name"],
        region: RegionSource::Field("location"),
    }
}

/// Discovery probes, in run order.
pub static PROBES: [ProbeSpec; 6] = [
    located("virtual_machines", "azure_vm", &["vm", "list"]),
    located("storage_accounts", "azure_storage_account", &["storage", "account", "list"]),
    located("sql_servers", "azure_sql_server", &["sql", "server", "list"]),
    located("function_apps", "azure_function_app", &["functionapp", "list"]),
    located("virtual_networks", "azure_vnet", &["network", "vnet", "list"]),
    located("resource_groups", "azure_resource_group", &["group", "list"]),
];

/// The `az` command line.
#[derive(Debug, Clone)]
pub struct AzureCli {
    executor: CliExecutor,
    program: PathBuf,
    timeout: Duration,
}

impl AzureCli {
    pub fn new(executor: CliExecutor, program: PathBuf, timeout: Duration) -> Self {
        Self {
            executor,
            program,
            timeout,
        }
    }

    pub fn resolve(&self) -> Result<PathBuf, ExecError> {
        self.executor.resolve(&self.program)
    }

    /// Service principal login. Marked sensitive: it carries the secret.
    pub fn login(&self, credentials: &Credentials) -> Invocation {
        Invocation::new(self.program.clone())
            .args(["login", "--service-principal", "--username"])
            .arg(credentials.get_or("client_id", ""))
            .arg("--password")
            .arg(credentials.get_or("client_secret", ""))
            .arg("--tenant")
            .arg(credentials.get_or("tenant_id", ""))
            .args(["--output", "none"])
            .sensitive()
    }

    /// `args` scoped to the connection's subscription.
    pub fn command(&self, args: &[&str], credentials: &Credentials) -> Invocation {
        Invocation::new(self.program.clone())
            .args(args.iter().copied())
            .arg("--subscription")
            .arg(credentials.get_or("subscription_id", ""))
            .args(["--output", "json"])
    }

    fn call(
        &self,
        args: &[&str],
        credentials: &Credentials,
        timeout: Duration,
    ) -> Result<Value, ExecError> {
        self.executor.execute_with_session(
            CONFIG_DIR_ENV,
            &self.login(credentials),
            &self.command(args, credentials),
            &EnvMap::new(),
            Duration::from_secs(constants::LOGIN_TIMEOUT_SECS),
            timeout,
        )
    }

    /// `account show`.
    pub fn check(&self, credentials: &Credentials) -> Result<Value, ExecError> {
        self.call(
            &["account", "show"],
            credentials,
            Duration::from_secs(constants::AZURE_TEST_TIMEOUT_SECS),
        )
    }
}

impl ProviderCli for AzureCli {
    fn region<'a>(&self, ctx: &ProbeContext<'a>) -> &'a str {
        ctx.connection_region().unwrap_or("")
    }

    fn run(&self, args: &[&str], ctx: &ProbeContext<'_>) -> Result<Value, ExecError> {
        self.call(args, ctx.credentials, self.timeout)
    }
}
