//! Export commands.

use std::path::Path;

use uuid::Uuid;

use crate::cli::{output, Context, Filter};
use crate::error::Result;

/// Export visible resources as CSV.
pub fn csv(ctx: &Context, filter: &Filter, target: Option<&Path>) -> Result<()> {
    let out = ctx.inventory.export_csv(&ctx.user, &filter.to_query()?)?;
    emit(&out, target)
}

/// Export visible resources, or a single resource, as JSON.
pub fn json(
    ctx: &Context,
    filter: &Filter,
    resource: Option<Uuid>,
    target: Option<&Path>,
) -> Result<()> {
    let out = match resource {
        Some(id) => ctx.inventory.export_resource_json(&ctx.user, id)?,
        None => ctx.inventory.export_json(&ctx.user, &filter.to_query()?)?,
    };
    emit(&out, target)
}

fn emit(contents: &str, target: Option<&Path>) -> Result<()> {
    match target {
        Some(path) => {
            std::fs::write(path, contents)?;
            output::success(&format!("wrote {}", path.display()));
        }
        None => {
            print!("{}", contents);
            if !contents.ends_with('\n') {
                println!();
            }
        }
    }
    Ok(())
}
