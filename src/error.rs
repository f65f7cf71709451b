//! Error types.
//!
//! One enum per concern, wrapped by the top-level [`Error`].

use thiserror::Error;

use crate::core::domain::Provider;

/// Top-level error.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Cipher(#[from] CipherError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Generic authorization failure. Never says whether the target exists.
    #[error("access denied")]
    AccessDenied,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("{0}")]
    Other(String),
}

/// Secret cipher failures.
#[derive(Error, Debug)]
pub enum CipherError {
    #[error("invalid encryption key: {0}")]
    InvalidKey(String),

    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    /// Token is malformed, tampered, or sealed under another key.
    #[error("invalid token")]
    InvalidToken,
}

/// Credential store and repository failures.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("stored credentials for '{connection}' are corrupt or sealed under another key")]
    CorruptCredentials { connection: String },

    #[error("an active default {provider} connection already exists: {existing}")]
    DuplicateDefault { provider: Provider, existing: String },

    #[error("a connection named '{0}' already exists")]
    DuplicateName(String),

    #[error("connection not found: {0}")]
    ConnectionNotFound(String),

    #[error("failed to read repository {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write repository {path}: {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("repository {path} is not valid: {reason}")]
    InvalidFormat { path: String, reason: String },

    #[error("repository lock poisoned")]
    Poisoned,
}

/// CLI executor failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecError {
    #[error("CLI executable not found: {0}")]
    CommandNotFound(String),

    #[error("{command} timed out after {seconds} seconds")]
    CommandTimeout { command: String, seconds: u64 },

    #[error("{command} failed (rc={code}): {stderr}")]
    CommandFailed {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("{command} produced malformed output: {reason}")]
    MalformedOutput { command: String, reason: String },

    #[error("invalid argument for {command}: {reason}")]
    InvalidArgument { command: String, reason: String },

    #[error("failed to run {command}: {reason}")]
    SpawnFailed { command: String, reason: String },
}

impl ExecError {
    /// Failures a discovery run tolerates per probe.
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            Self::CommandTimeout { .. } | Self::CommandFailed { .. } | Self::MalformedOutput { .. }
        )
    }
}

/// A single probe failure recorded during discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeFailure {
    pub probe: String,
    pub error: ExecError,
}

impl std::fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.probe, self.error)
    }
}

/// Discovery orchestration failures.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("all discoveries failed. Errors: {}", join_failures(.0))]
    Failed(Vec<ProbeFailure>),

    #[error("connection '{0}' is inactive")]
    Inactive(String),
}

fn join_failures(failures: &[ProbeFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Configuration failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} is not set")]
    MissingKey(&'static str),

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unable to determine data directory")]
    NoDataDir,
}

/// Caller input failures.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("invalid id: {0}")]
    InvalidId(String),

    #[error("missing credential field '{field}' for {provider}")]
    MissingField {
        provider: Provider,
        field: &'static str,
    },

    #[error("unexpected credential field '{field}' for {provider}")]
    UnexpectedField { provider: Provider, field: String },

    #[error("{0} cannot be empty")]
    Empty(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
