//! Wiring for commands that touch the inventory.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::core::audit::TracingAudit;
use crate::core::config::Settings;
use crate::core::domain::{ConnectionId, User};
use crate::core::exec::CliExecutor;
use crate::core::inventory::Inventory;
use crate::core::provider::CliProviders;
use crate::core::store::JsonFile;
use crate::core::vault::CredentialStore;
use crate::error::Result;

/// Settings, the acting user, and the inventory built from them.
pub struct Context {
    pub settings: Settings,
    pub user: User,
    pub inventory: Inventory,
    repository: std::path::PathBuf,
}

impl Context {
    /// Load settings and open the repository in the data directory.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingKey` if no key is configured, and
    /// `CipherError::InvalidKey` if it does not parse.
    pub fn open(config: Option<&Path>, user: Option<String>, admin: bool) -> Result<Self> {
        let settings = Settings::from_env(config)?;
        let cipher = settings.cipher()?;
        let repo = JsonFile::open(&settings.data_dir)?;
        let repository = repo.path().to_path_buf();

        let store = Arc::new(CredentialStore::new(cipher, Arc::new(repo)));
        let providers = Arc::new(CliProviders::new(
            CliExecutor::new(),
            settings.aws_cli.clone(),
            settings.az_cli.clone(),
            settings.discovery_timeout,
        ));
        let inventory = Inventory::new(store, providers, Arc::new(TracingAudit));

        let name = user
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(whoami::username);
        let user = if admin {
            User::admin(name)
        } else {
            User::viewer(name)
        };
        debug!(user = %user.id, admin, "acting user");

        Ok(Self {
            settings,
            user,
            inventory,
            repository,
        })
    }

    pub fn repository_path(&self) -> &Path {
        &self.repository
    }
}

/// Parse a connection id given on the command line.
pub fn connection_id(raw: &str) -> Result<ConnectionId> {
    Ok(raw.parse()?)
}
