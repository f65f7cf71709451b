//! Quick status overview command.

use crate::cli::{output, Context};
use crate::core::domain::Provider;
use crate::core::exec::CliExecutor;
use crate::core::query::ResourceQuery;
use crate::error::Result;

/// Show configuration and inventory overview.
pub fn execute(ctx: &Context) -> Result<()> {
    let settings = &ctx.settings;

    output::section("native-form status");
    output::kv("user", format!("{} ({})", ctx.user.id, role(ctx)));
    output::kv("data dir", settings.data_dir.display());
    output::kv("repository", ctx.repository_path().display());
    output::kv("key", ctx.inventory.store().fingerprint());
    output::kv(
        "timeout",
        format!("{}s", settings.discovery_timeout.as_secs()),
    );

    let executor = CliExecutor::new();
    for (label, path) in [("aws cli", &settings.aws_cli), ("az cli", &settings.az_cli)] {
        let state = match executor.resolve(path) {
            Ok(resolved) => format!("{} {}", output::verdict(true), resolved.display()),
            Err(_) => format!("{} {} not found", output::verdict(false), path.display()),
        };
        output::kv(label, state);
    }

    let connections = ctx.inventory.connections(&ctx.user)?;
    let listing = ctx.inventory.resources(&ctx.user, &ResourceQuery::default())?;
    output::section("Inventory");
    output::kv("connections", connections.len());
    output::kv("resources", listing.resources.len());
    for provider in Provider::ALL {
        let effective = ctx.inventory.effective_connection(&ctx.user, provider)?;
        let label = format!("{} uses", provider);
        match effective {
            Some(c) => output::kv(&label, format!("{} ({})", c.name, c.scope())),
            None => output::kv(&label, "-"),
        }
    }

    println!();
    if connections.is_empty() {
        output::dimmed(&format!(
            "Add a connection with {}",
            output::cmd("native-form connection add aws <name>")
        ));
    } else if listing.resources.is_empty() {
        output::dimmed(&format!(
            "Run discovery with {}",
            output::cmd("native-form discover <id>")
        ));
    }
    Ok(())
}

fn role(ctx: &Context) -> &'static str {
    if ctx.user.is_admin() {
        "admin"
    } else {
        "viewer"
    }
}
