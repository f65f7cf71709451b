//! Runtime settings.
//!
//! Settings come from an optional `native-form.toml` overlaid by environment
//! variables. The encryption key is environment-only; the file format
//! rejects unknown fields, so a key cannot be parked there by accident.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;
use zeroize::Zeroizing;

use crate::core::cipher::SecretCipher;
use crate::core::constants;
use crate::error::{ConfigError, Result};

/// Non-secret settings accepted from the config file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    data_dir: Option<PathBuf>,
    discovery_timeout_seconds: Option<u64>,
    aws_cli_path: Option<PathBuf>,
    az_cli_path: Option<PathBuf>,
}

/// Resolved runtime settings.
pub struct Settings {
    key: Zeroizing<String>,
    pub data_dir: PathBuf,
    pub discovery_timeout: Duration,
    pub aws_cli: PathBuf,
    pub az_cli: PathBuf,
}

impl Settings {
    /// Load settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingKey` if `NATIVE_FORM_KEY` is unset, or a
    /// parse error for malformed values.
    pub fn from_env(config_file: Option<&Path>) -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok(), config_file)
    }

    /// Load settings using `lookup` in place of the process environment.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        config_file: Option<&Path>,
    ) -> Result<Self> {
        let env_data_dir = lookup(constants::DATA_DIR_ENV).map(PathBuf::from);
        let default_dir = match &env_data_dir {
            Some(dir) => dir.clone(),
            None => default_data_dir()?,
        };

        let file = match config_file {
            Some(path) => read_file(path)?,
            None => {
                let path = default_dir.join(constants::CONFIG_FILE);
                if path.exists() {
                    read_file(&path)?
                } else {
                    FileSettings::default()
                }
            }
        };

        let key = lookup(constants::KEY_ENV)
            .filter(|k| !k.trim().is_empty())
            .map(Zeroizing::new)
            .ok_or(ConfigError::MissingKey(constants::KEY_ENV))?;

        let timeout_secs = match lookup(constants::TIMEOUT_ENV) {
            Some(raw) => parse_timeout(&raw)?,
            None => file
                .discovery_timeout_seconds
                .unwrap_or(constants::DEFAULT_TIMEOUT_SECS),
        };
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: constants::TIMEOUT_ENV,
                reason: "must be at least 1 second".to_string(),
            }
            .into());
        }

        let data_dir = env_data_dir.or(file.data_dir).unwrap_or(default_dir);
        let aws_cli = lookup(constants::AWS_CLI_ENV)
            .map(PathBuf::from)
            .or(file.aws_cli_path)
            .unwrap_or_else(|| PathBuf::from(constants::DEFAULT_AWS_CLI));
        let az_cli = lookup(constants::AZ_CLI_ENV)
            .map(PathBuf::from)
            .or(file.az_cli_path)
            .unwrap_or_else(|| PathBuf::from(constants::DEFAULT_AZ_CLI));

        debug!(
            data_dir = %data_dir.display(),
            timeout_secs,
            aws_cli = %aws_cli.display(),
            az_cli = %az_cli.display(),
            "settings loaded"
        );

        Ok(Self {
            key,
            data_dir,
            discovery_timeout: Duration::from_secs(timeout_secs),
            aws_cli,
            az_cli,
        })
    }

    /// Build the secret cipher from the configured key.
    ///
    /// # Errors
    ///
    /// Returns `CipherError::InvalidKey` if the key is not a valid age identity.
    pub fn cipher(&self) -> Result<SecretCipher> {
        SecretCipher::from_key(&self.key)
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("key", &"<redacted>")
            .field("data_dir", &self.data_dir)
            .field("discovery_timeout", &self.discovery_timeout)
            .field("aws_cli", &self.aws_cli)
            .field("az_cli", &self.az_cli)
            .finish()
    }
}

/// Platform data directory for native-form.
pub fn default_data_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".local").join("share")))
        .map(|d| d.join(constants::APP_DIR))
        .ok_or_else(|| ConfigError::NoDataDir.into())
}

fn read_file(path: &Path) -> Result<FileSettings> {
    debug!(path = %path.display(), "reading config file");
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.display().to_string(),
        source,
    })?;
    let file: FileSettings = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    Ok(file)
}

fn parse_timeout(raw: &str) -> Result<u64> {
    raw.trim().parse::<u64>().map_err(|e| {
        ConfigError::InvalidValue {
            field: constants::TIMEOUT_ENV,
            reason: e.to_string(),
        }
        .into()
    })
}
