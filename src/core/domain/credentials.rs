//! Decrypted credential map.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use super::Provider;
use crate::error::{Result, ValidationError};

/// Provider credentials, decrypted.
///
/// Values are wiped from memory when dropped and never shown by `Debug`.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credentials {
    fields: BTreeMap<String, String>,
}

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        if let Some(mut old) = self.fields.insert(field.into(), value.into()) {
            old.zeroize();
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Field value, or `default` when absent or blank.
    pub fn get_or<'a>(&'a self, field: &str, default: &'a str) -> &'a str {
        match self.get(field) {
            Some(v) if !v.trim().is_empty() => v,
            _ => default,
        }
    }

    /// Field names, sorted.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Check that exactly the provider's required fields are present and non-empty.
    pub fn validate_for(&self, provider: Provider) -> Result<()> {
        let required = provider.required_fields();
        for field in required {
            match self.get(field) {
                Some(v) if !v.trim().is_empty() => {}
                _ => return Err(ValidationError::MissingField { provider, field }.into()),
            }
        }
        if let Some(extra) = self.fields().find(|f| !required.contains(f)) {
            return Err(ValidationError::UnexpectedField {
                provider,
                field: extra.to_string(),
            }
            .into());
        }
        Ok(())
    }
}

impl Drop for Credentials {
    fn drop(&mut self) {
        for value in self.fields.values_mut() {
            value.zeroize();
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .finish()
    }
}
