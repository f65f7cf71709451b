//! Resource listing and detail commands.

use uuid::Uuid;

use crate::cli::context::connection_id;
use crate::cli::{output, Context, Filter};
use crate::core::query::ResourceQuery;
use crate::error::Result;

impl Filter {
    /// Turn command-line filters into a query.
    pub fn to_query(&self) -> Result<ResourceQuery> {
        let connection = self.connection.as_deref().map(connection_id).transpose()?;
        Ok(ResourceQuery {
            connection,
            resource_type: self.resource_type.clone(),
            provider: self.provider,
        })
    }
}

/// List cached resources.
pub fn list(ctx: &Context, filter: &Filter, json: bool) -> Result<()> {
    let listing = ctx.inventory.resources(&ctx.user, &filter.to_query()?)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&listing.resources)?);
        return Ok(());
    }

    if listing.resources.is_empty() {
        output::dimmed("no resources");
        return Ok(());
    }

    output::section("Resources");
    for r in &listing.resources {
        println!(
            "  {:<22} {:<28} {:<14} {}",
            r.resource_type,
            r.display_name(),
            r.region.as_deref().unwrap_or("-"),
            output::id(r.id)
        );
    }

    output::section("Types");
    for (kind, count) in &listing.type_counts {
        output::kv(kind, count);
    }
    Ok(())
}

/// Show one resource.
pub fn show(ctx: &Context, id: Uuid) -> Result<()> {
    let resource = ctx.inventory.resource_detail(&ctx.user, id)?;

    output::section(resource.display_name());
    output::kv("type", &resource.resource_type);
    output::kv("id", &resource.resource_id);
    output::kv("region", resource.region.as_deref().unwrap_or("-"));
    output::kv("connection", resource.connection_id);
    output::kv("discovered", resource.discovered_at.to_rfc3339());
    println!();
    println!("{}", serde_json::to_string_pretty(&resource.raw_data)?);
    Ok(())
}
