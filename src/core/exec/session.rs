//! Scratch configuration directories for session-based CLIs.

use std::path::Path;

use tempfile::TempDir;
use tracing::trace;

use super::EnvMap;
use crate::error::ExecError;

/// A private config directory for one login-then-call sequence.
///
/// The directory is removed when the session is dropped, so every exit path
/// (success, error, timeout, unwinding) cleans it up.
pub struct Session {
    dir: TempDir,
    var: &'static str,
}

impl Session {
    /// Create a fresh directory and remember which variable points at it.
    pub fn open(var: &'static str, prefix: &str) -> Result<Self, ExecError> {
        let dir = tempfile::Builder::new()
            .prefix(prefix)
            .tempdir()
            .map_err(|e| ExecError::SpawnFailed {
                command: var.to_string(),
                reason: format!("failed to create session directory: {}", e),
            })?;
        trace!(path = %dir.path().display(), "session opened");
        Ok(Self { dir, var })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Point the session variable at this directory.
    pub fn apply(&self, env: &mut EnvMap) {
        env.set(self.var, self.dir.path().display().to_string());
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        trace!(path = %self.dir.path().display(), "session closed");
    }
}
