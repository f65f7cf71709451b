//! Connection commands.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::cli::context::connection_id;
use crate::cli::{output, prompt, Context};
use crate::core::domain::{ConnectionUpdate, CredentialConnection, NewConnection, Provider};
use crate::error::{Error, Result};

/// What `list --json` prints. Never includes the secret.
#[derive(Serialize)]
struct Summary<'a> {
    id: String,
    name: &'a str,
    provider: Provider,
    scope: &'static str,
    owner: Option<&'a str>,
    region: Option<&'a str>,
    last_tested: Option<DateTime<Utc>>,
}

impl<'a> From<&'a CredentialConnection> for Summary<'a> {
    fn from(c: &'a CredentialConnection) -> Self {
        Self {
            id: c.id.to_string(),
            name: &c.name,
            provider: c.provider,
            scope: c.scope(),
            owner: c.owner.as_ref().map(|o| o.as_str()),
            region: c.region.as_deref(),
            last_tested: c.last_tested,
        }
    }
}

/// Add a connection.
pub fn add(
    ctx: &Context,
    provider: Provider,
    name: String,
    region: Option<String>,
    server_default: bool,
) -> Result<()> {
    info!("Adding {} connection: {}", provider, name);
    let credentials = prompt::credentials(provider)?;

    let region = region.or_else(|| match provider {
        Provider::Aws => credentials.get("aws_default_region").map(str::to_string),
        Provider::Azure => None,
    });
    let draft = NewConnection {
        name,
        provider,
        region,
        server_default,
    };

    let connection = ctx
        .inventory
        .create_connection(&ctx.user, draft, &credentials)?;
    output::success(&format!(
        "created {} connection {} ({})",
        connection.provider,
        output::id(connection.id),
        connection.scope()
    ));
    Ok(())
}

/// List visible connections.
pub fn list(ctx: &Context, json: bool) -> Result<()> {
    let connections = ctx.inventory.connections(&ctx.user)?;

    if json {
        let summaries: Vec<Summary<'_>> = connections.iter().map(Summary::from).collect();
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    if connections.is_empty() {
        output::dimmed("no connections");
        return Ok(());
    }

    output::section("Connections");
    for c in &connections {
        let tested = c
            .last_tested
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "never".to_string());
        println!(
            "  {}  {:<6} {:<9} {}  (region {}, tested {})",
            output::id(c.id),
            c.provider,
            c.scope(),
            c.name,
            c.region.as_deref().unwrap_or("-"),
            tested
        );
    }
    Ok(())
}

/// Edit a connection.
pub fn edit(
    ctx: &Context,
    id: &str,
    name: Option<String>,
    region: Option<Option<String>>,
    server_default: Option<bool>,
    rotate: bool,
) -> Result<()> {
    let id = connection_id(id)?;
    let changes = ConnectionUpdate {
        name,
        region,
        server_default,
    };

    let credentials = if rotate {
        let current = ctx
            .inventory
            .connections(&ctx.user)?
            .into_iter()
            .find(|c| c.id == id)
            .ok_or(Error::AccessDenied)?;
        Some(prompt::credentials(current.provider)?)
    } else {
        None
    };

    let connection =
        ctx.inventory
            .edit_connection(&ctx.user, id, changes, credentials.as_ref())?;
    output::success(&format!("updated {}", output::id(connection.id)));
    Ok(())
}

/// Remove (deactivate) a connection.
pub fn rm(ctx: &Context, id: &str) -> Result<()> {
    let id = connection_id(id)?;
    let connection = ctx.inventory.delete_connection(&ctx.user, id)?;
    output::success(&format!("removed {}", connection.name));
    Ok(())
}

/// Test a connection's credentials.
pub fn test(ctx: &Context, id: &str, json: bool) -> Result<()> {
    let id = connection_id(id)?;
    let result = ctx.inventory.test_connection(&ctx.user, id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if result.ok {
        output::success(&result.message);
    } else {
        output::error(&result.message);
    }

    if result.ok {
        Ok(())
    } else {
        Err(Error::Other("connection test failed".to_string()))
    }
}
