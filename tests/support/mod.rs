//! Test support utilities for native-form integration tests.
//!
//! Provides isolated data directories, fake provider CLIs, and an
//! in-memory inventory wired to scriptable providers.

#![allow(dead_code)]

pub mod assertions;
pub mod commands;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;

use std::path::{Path, PathBuf};
use std::time::Duration;

use native_form::core::cipher::SecretCipher;
use tempfile::TempDir;

/// errno for "text file busy".
const ETXTBSY: i32 = 26;

/// Test environment with an isolated data directory and a fresh key.
///
/// Nothing process-global is mutated; child processes get their settings
/// through `.env()` so tests can safely run in parallel.
pub struct Test {
    /// Data directory holding the repository
    pub dir: TempDir,
    /// Scratch directory for fake CLIs and their capture files
    pub bin: TempDir,
    /// Process key for this environment
    pub key: String,
}

impl Test {
    /// Create a new empty test environment.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let bin = TempDir::new().expect("failed to create temp bin dir");
        let key = SecretCipher::generate_key().as_str().to_string();
        Self { dir, bin, key }
    }

    /// Path for a capture file inside the scratch directory.
    pub fn capture(&self, name: &str) -> PathBuf {
        self.bin.path().join(name)
    }

    /// Write an executable `/bin/sh` script and wait until it can be run.
    pub fn script(&self, name: &str, body: &str) -> PathBuf {
        write_script(self.bin.path(), name, body)
    }
}

/// Write an executable shell script into `dir`.
///
/// The script exits immediately when `FAKE_READY` is set; that probe is
/// retried until the kernel stops reporting the file as busy.
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    let contents = format!("#!/bin/sh\n[ -n \"$FAKE_READY\" ] && exit 0\n{}\n", body);
    std::fs::write(&path, contents).expect("failed to write script");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("failed to chmod script");

    for _ in 0..50 {
        match std::process::Command::new(&path).env("FAKE_READY", "1").status() {
            Err(e) if e.raw_os_error() == Some(ETXTBSY) => {
                std::thread::sleep(Duration::from_millis(20))
            }
            _ => break,
        }
    }
    path
}
