//! Child process environment.
//!
//! A provider CLI starts from an empty environment. Only allow-listed
//! variables come through from the parent, and application secrets are
//! dropped from every source.

use std::collections::BTreeMap;

use tracing::warn;
use zeroize::Zeroize;

use crate::core::constants;

/// Environment variables for one call. Values are wiped on drop.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct EnvMap {
    vars: BTreeMap<String, String>,
}

impl EnvMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        if let Some(mut old) = self.vars.insert(name.into(), value.into()) {
            old.zeroize();
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl Drop for EnvMap {
    fn drop(&mut self) {
        for value in self.vars.values_mut() {
            value.zeroize();
        }
    }
}

impl std::fmt::Debug for EnvMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.vars.keys()).finish()
    }
}

/// Whether a parent variable may pass through to a child.
pub fn is_passthrough(name: &str) -> bool {
    if is_forbidden(name) || constants::AMBIENT_CREDENTIAL_ENV.contains(&name) {
        return false;
    }
    constants::PASSTHROUGH_ENV.contains(&name)
        || constants::PASSTHROUGH_ENV_PREFIXES
            .iter()
            .any(|p| name.starts_with(p))
}

/// Whether a variable is an application secret.
pub fn is_forbidden(name: &str) -> bool {
    constants::FORBIDDEN_ENV
        .iter()
        .any(|f| f.eq_ignore_ascii_case(name))
}

/// Build the complete environment for a child.
pub fn sanitize<'a>(
    parent: impl IntoIterator<Item = (&'a str, &'a str)>,
    overrides: &EnvMap,
) -> EnvMap {
    let mut env = EnvMap::new();
    for (name, value) in parent {
        if is_passthrough(name) {
            env.set(name, value);
        }
    }
    for (name, value) in overrides.iter() {
        if is_forbidden(name) {
            warn!(var = name, "dropping forbidden variable from child environment");
            continue;
        }
        env.set(name, value);
    }
    env
}
