//! Command-line interface.

pub mod completions;
pub mod connection;
pub mod context;
pub mod discover;
pub mod export;
pub mod keygen;
pub mod output;
pub mod prompt;
pub mod resources;
pub mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use uuid::Uuid;

use crate::core::domain::Provider;
use crate::error::Result;

pub use context::Context;

/// native-form - cloud inventory with an encrypted credential vault.
#[derive(Parser)]
#[command(
    name = "native-form",
    about = "Cloud inventory with an encrypted credential vault",
    version
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,

    /// Config file (defaults to native-form.toml in the data directory)
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Acting user (defaults to the OS user name)
    #[arg(long, env = "NATIVE_FORM_USER", global = true)]
    pub user: Option<String>,

    /// Act as an administrator
    #[arg(
        long,
        env = "NATIVE_FORM_ADMIN",
        global = true,
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub admin: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Generate a new encryption key
    Keygen,

    /// Show configuration and inventory overview
    Status,

    /// Manage credential connections
    Connection {
        #[command(subcommand)]
        action: ConnectionAction,
    },

    /// Discover resources for a connection
    Discover {
        /// Connection id
        id: Option<String>,
        /// Use your effective connection for this provider instead of an id
        #[arg(long, conflicts_with = "id")]
        provider: Option<Provider>,
        /// Print the response as JSON
        #[arg(long)]
        json: bool,
    },

    /// List cached resources
    Resources {
        #[command(flatten)]
        filter: Filter,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one cached resource with its raw payload
    Show {
        /// Resource record id
        id: Uuid,
    },

    /// Export cached resources
    Export {
        #[command(subcommand)]
        format: ExportFormat,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Connection subcommands.
#[derive(Subcommand)]
pub enum ConnectionAction {
    /// Add a connection; credentials are prompted for or read from stdin
    Add {
        /// Provider (aws or azure)
        provider: Provider,
        /// Connection name
        name: String,
        /// Region (AWS defaults to the credential region)
        #[arg(long)]
        region: Option<String>,
        /// Create a server-wide default (administrators only)
        #[arg(long)]
        default: bool,
    },

    /// List visible connections
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Edit a connection
    Edit {
        /// Connection id
        id: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New region
        #[arg(long, conflicts_with = "clear_region")]
        region: Option<String>,
        /// Remove the region
        #[arg(long)]
        clear_region: bool,
        /// Promote to server-wide default (administrators only)
        #[arg(long, conflicts_with = "personal")]
        default: bool,
        /// Demote to a personal connection (administrators only)
        #[arg(long)]
        personal: bool,
        /// Enter new credentials
        #[arg(long)]
        rotate: bool,
    },

    /// Remove a connection
    Rm {
        /// Connection id
        id: String,
    },

    /// Check the stored credentials against the provider
    Test {
        /// Connection id
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Export formats.
#[derive(Subcommand)]
pub enum ExportFormat {
    /// Export as CSV
    Csv {
        #[command(flatten)]
        filter: Filter,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export as JSON
    Json {
        #[command(flatten)]
        filter: Filter,
        /// Export a single resource by record id
        #[arg(long, conflicts_with_all = ["connection", "resource_type", "provider"])]
        resource: Option<Uuid>,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Resource filters.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct Filter {
    /// Only this connection id
    #[arg(long)]
    pub connection: Option<String>,
    /// Only this resource type (e.g. ec2_instance)
    #[arg(long = "type", id = "resource_type")]
    pub resource_type: Option<String>,
    /// Only this provider
    #[arg(long)]
    pub provider: Option<Provider>,
}

/// Supported shells for completions.
#[derive(ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

/// Execute a command.
pub fn execute(cli: Cli) -> Result<()> {
    use Command::*;

    let Cli {
        user,
        admin,
        config,
        command,
        ..
    } = cli;
    let open = || Context::open(config.as_deref(), user.clone(), admin);

    match command {
        Keygen => keygen::execute(),
        Completions { shell } => completions::execute(shell),
        Status => status::execute(&open()?),
        Connection { action } => {
            let ctx = open()?;
            match action {
                ConnectionAction::Add {
                    provider,
                    name,
                    region,
                    default,
                } => connection::add(&ctx, provider, name, region, default),
                ConnectionAction::List { json } => connection::list(&ctx, json),
                ConnectionAction::Edit {
                    id,
                    name,
                    region,
                    clear_region,
                    default,
                    personal,
                    rotate,
                } => {
                    let region = match (region, clear_region) {
                        (Some(r), _) => Some(Some(r)),
                        (None, true) => Some(None),
                        (None, false) => None,
                    };
                    let server_default = match (default, personal) {
                        (true, _) => Some(true),
                        (_, true) => Some(false),
                        _ => None,
                    };
                    connection::edit(&ctx, &id, name, region, server_default, rotate)
                }
                ConnectionAction::Rm { id } => connection::rm(&ctx, &id),
                ConnectionAction::Test { id, json } => connection::test(&ctx, &id, json),
            }
        }
        Discover { id, provider, json } => {
            discover::execute(&open()?, id.as_deref(), provider, json)
        }
        Resources { filter, json } => resources::list(&open()?, &filter, json),
        Show { id } => resources::show(&open()?, id),
        Export { format } => {
            let ctx = open()?;
            match format {
                ExportFormat::Csv { filter, output } => {
                    export::csv(&ctx, &filter, output.as_deref())
                }
                ExportFormat::Json {
                    filter,
                    resource,
                    output,
                } => export::json(&ctx, &filter, resource, output.as_deref()),
            }
        }
    }
}
