//! Discover command.

use crate::cli::{output, Context};
use crate::core::domain::Provider;
use crate::error::{Error, Result};

/// Trigger discovery for an id, or for the effective connection of a provider.
pub fn execute(ctx: &Context, id: Option<&str>, provider: Option<Provider>, json: bool) -> Result<()> {
    let resolved;
    let id = match (id, provider) {
        (Some(id), _) => Some(id),
        (None, Some(provider)) => {
            resolved = ctx
                .inventory
                .effective_connection(&ctx.user, provider)?
                .map(|c| c.id.to_string());
            resolved.as_deref()
        }
        (None, None) => None,
    };

    let response = ctx.inventory.trigger_discovery(&ctx.user, id);
    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else if response.is_ok() {
        output::success(&response.message);
    }

    if response.is_ok() {
        Ok(())
    } else {
        Err(Error::Other(response.message))
    }
}
