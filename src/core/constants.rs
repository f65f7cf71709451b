//! Constants used throughout native-form.
//!
//! Centralizes environment variable names, defaults, and limits.

/// Environment variable holding the process encryption key.
pub const KEY_ENV: &str = "NATIVE_FORM_KEY";

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "NATIVE_FORM_DATA_DIR";

/// Environment variable for the discovery timeout.
pub const TIMEOUT_ENV: &str = "DISCOVERY_TIMEOUT_SECONDS";

/// Environment variable for the AWS CLI path.
pub const AWS_CLI_ENV: &str = "AWS_CLI_PATH";

/// Environment variable for the Azure CLI path.
pub const AZ_CLI_ENV: &str = "AZ_CLI_PATH";

/// Environment variable for the log filter.
pub const LOG_ENV: &str = "NATIVE_FORM_LOG";

/// Optional config file name inside the data directory.
pub const CONFIG_FILE: &str = "native-form.toml";

/// Repository file name inside the data directory.
pub const REPOSITORY_FILE: &str = "inventory.json";

/// Default data directory name under the platform data dir.
pub const APP_DIR: &str = "native-form";

pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_AWS_CLI: &str = "/usr/local/bin/aws";
pub const DEFAULT_AZ_CLI: &str = "/usr/bin/az";

/// Region assumed for AWS calls when none is configured.
pub const DEFAULT_AWS_REGION: &str = "us-east-1";

/// Region label for account-wide resources.
pub const GLOBAL_REGION: &str = "global";

/// Timeout for session login calls.
pub const LOGIN_TIMEOUT_SECS: u64 = 30;

/// Timeout for `connection test` against AWS.
pub const AWS_TEST_TIMEOUT_SECS: u64 = 30;

/// Timeout for `connection test` against Azure.
pub const AZURE_TEST_TIMEOUT_SECS: u64 = 60;

/// Characters of child stderr kept in errors.
pub const STDERR_EXCERPT_CHARS: usize = 500;

/// Characters of diagnostic text returned to callers and audit details.
pub const DIAGNOSTIC_CHARS: usize = 1000;

/// Prefix for per-call Azure session directories.
pub const AZURE_SESSION_PREFIX: &str = "nf-az-";

/// Variables passed through from the parent environment to provider CLIs.
pub const PASSTHROUGH_ENV: &[&str] = &[
    "PATH",
    "HOME",
    "USER",
    "LOGNAME",
    "LANG",
    "LANGUAGE",
    "TZ",
    "TMPDIR",
    "TEMP",
    "TMP",
    "SYSTEMROOT",
    "SSL_CERT_FILE",
    "SSL_CERT_DIR",
    "REQUESTS_CA_BUNDLE",
    "CURL_CA_BUNDLE",
    "HTTP_PROXY",
    "HTTPS_PROXY",
    "NO_PROXY",
    "http_proxy",
    "https_proxy",
    "no_proxy",
];

/// Prefixes of variables passed through (locale categories).
pub const PASSTHROUGH_ENV_PREFIXES: &[&str] = &["LC_"];

/// Variables that never reach a child process, whatever their source.
pub const FORBIDDEN_ENV: &[&str] = &[
    KEY_ENV,
    "SECRET_KEY",
    "FERNET_KEY",
    "DATABASE_URL",
    "LDAP_BIND_USER_PASSWORD",
];

/// Ambient provider credentials that must not leak from the parent.
///
/// Adapters may still set these explicitly for their own call.
pub const AMBIENT_CREDENTIAL_ENV: &[&str] = &[
    "AWS_ACCESS_KEY_ID",
    "AWS_SECRET_ACCESS_KEY",
    "AWS_SESSION_TOKEN",
    "AZURE_CLIENT_ID",
    "AZURE_CLIENT_SECRET",
    "AZURE_TENANT_ID",
];
