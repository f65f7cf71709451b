//! Cloud provider tag.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Supported cloud providers.
///
/// A closed set: anything else is rejected where it enters the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Aws,
    Azure,
}

impl Provider {
    /// All providers, in display order.
    pub const ALL: [Provider; 2] = [Provider::Aws, Provider::Azure];

    /// Provider tag as stored.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aws => "aws",
            Self::Azure => "azure",
        }
    }

    /// Credential fields every connection of this provider must carry.
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            Self::Aws => &[
                "aws_access_key_id",
                "aws_secret_access_key",
                "aws_default_region",
            ],
            Self::Azure => &["tenant_id", "client_id", "client_secret", "subscription_id"],
        }
    }

    /// Fields that hold secret material (prompted with hidden input).
    pub fn is_secret_field(&self, field: &str) -> bool {
        matches!(field, "aws_secret_access_key" | "client_secret")
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aws" => Ok(Self::Aws),
            "azure" => Ok(Self::Azure),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }
}
