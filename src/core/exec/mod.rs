//! Provider CLI execution.
//!
//! Runs one external command with a sanitized environment and a hard
//! wall-clock timeout, and parses its standard output as JSON.
//!
//! - Nonzero exit → `ExecError::CommandFailed` with a stderr excerpt
//! - Timeout → the child (and its process group on Unix) is killed and reaped
//! - Empty output → an empty JSON object
//! - Anything else that is not JSON → `ExecError::MalformedOutput`

mod env;
mod session;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::core::constants;
use crate::error::ExecError;

pub use env::{is_forbidden, is_passthrough, sanitize, EnvMap};
pub use session::Session;

/// How often a running child is polled for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// One command line: a program and its string arguments.
#[derive(Clone, PartialEq, Eq)]
pub struct Invocation {
    program: PathBuf,
    args: Vec<String>,
    sensitive: bool,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            sensitive: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Mark the arguments as secret; they are never logged.
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// Program basename, used in diagnostics.
    pub fn name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.display().to_string())
    }

    fn validate(&self) -> Result<(), ExecError> {
        let has_nul = self.program.to_string_lossy().contains('\0')
            || self.args.iter().any(|a| a.contains('\0'));
        if has_nul {
            return Err(ExecError::InvalidArgument {
                command: self.name(),
                reason: "arguments must not contain NUL bytes".to_string(),
            });
        }
        if self.program.as_os_str().is_empty() {
            return Err(ExecError::InvalidArgument {
                command: self.name(),
                reason: "program path is empty".to_string(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("Invocation");
        s.field("program", &self.program);
        if self.sensitive {
            s.field("args", &"<redacted>");
        } else {
            s.field("args", &self.args);
        }
        s.finish()
    }
}

/// Runs provider CLIs.
#[derive(Debug, Clone)]
pub struct CliExecutor {
    parent_env: Vec<(String, String)>,
}

impl Default for CliExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl CliExecutor {
    /// Executor that filters the current process environment.
    pub fn new() -> Self {
        let parent_env = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        Self { parent_env }
    }

    /// Executor that treats `vars` as the parent environment.
    pub fn with_parent_env<K, V>(vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            parent_env: vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// The exact environment a child would receive.
    pub fn child_env(&self, overrides: &EnvMap) -> EnvMap {
        sanitize(
            self.parent_env.iter().map(|(k, v)| (k.as_str(), v.as_str())),
            overrides,
        )
    }

    /// Resolve the program against the child's `PATH`.
    ///
    /// # Errors
    ///
    /// Returns `ExecError::CommandNotFound` if nothing executable is found.
    pub fn resolve(&self, program: &Path) -> Result<PathBuf, ExecError> {
        let env = self.child_env(&EnvMap::new());
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
        which::which_in(program, env.get("PATH"), cwd)
            .map_err(|_| ExecError::CommandNotFound(program.display().to_string()))
    }

    /// Run `command` and parse its output.
    pub fn execute(
        &self,
        command: &Invocation,
        overrides: &EnvMap,
        timeout: Duration,
    ) -> Result<Value, ExecError> {
        command.validate()?;
        let name = command.name();
        let program = self.resolve(command.program())?;
        let env = self.child_env(overrides);

        if command.sensitive {
            debug!(command = %name, timeout_secs = timeout.as_secs(), "running");
        } else {
            debug!(
                command = %name,
                args = ?command.args,
                timeout_secs = timeout.as_secs(),
                "running"
            );
        }
        trace!(vars = ?env, "child environment");

        let mut cmd = Command::new(&program);
        cmd.args(&command.args)
            .env_clear()
            .envs(env.iter())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let mut child = cmd.spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ExecError::CommandNotFound(program.display().to_string()),
            _ => ExecError::SpawnFailed {
                command: name.clone(),
                reason: e.to_string(),
            },
        })?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());
        let started = Instant::now();

        let status = match wait_with_deadline(&mut child, started + timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                terminate(&mut child);
                let _ = join(stdout);
                let _ = join(stderr);
                warn!(command = %name, elapsed_ms = started.elapsed().as_millis() as u64, "timed out");
                return Err(ExecError::CommandTimeout {
                    command: name,
                    seconds: timeout.as_secs(),
                });
            }
            Err(e) => {
                terminate(&mut child);
                return Err(ExecError::SpawnFailed {
                    command: name,
                    reason: e.to_string(),
                });
            }
        };

        let stdout = join(stdout);
        let stderr = join(stderr);
        debug!(
            command = %name,
            status = ?status.code(),
            stdout_len = stdout.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "finished"
        );

        if !status.success() {
            return Err(ExecError::CommandFailed {
                command: name,
                code: status.code().unwrap_or(-1),
                stderr: excerpt(&String::from_utf8_lossy(&stderr)),
            });
        }

        parse_output(&name, &stdout)
    }

    /// Log in with `login`, then run `command`, inside a private session
    /// directory exported through `session_var`.
    ///
    /// A failed login stops before `command` runs. The session directory is
    /// removed on every path.
    pub fn execute_with_session(
        &self,
        session_var: &'static str,
        login: &Invocation,
        command: &Invocation,
        overrides: &EnvMap,
        login_timeout: Duration,
        timeout: Duration,
    ) -> Result<Value, ExecError> {
        let session = Session::open(session_var, constants::AZURE_SESSION_PREFIX)?;
        let mut env = overrides.clone();
        session.apply(&mut env);

        self.execute(login, &env, login_timeout)?;
        self.execute(command, &env, timeout)
    }
}

/// Keep the first few hundred characters of stderr.
pub fn excerpt(text: &str) -> String {
    truncate_chars(text.trim(), constants::STDERR_EXCERPT_CHARS)
}

/// Truncate to at most `max` characters.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

fn parse_output(name: &str, stdout: &[u8]) -> Result<Value, ExecError> {
    let text = String::from_utf8_lossy(stdout);
    if text.trim().is_empty() {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    serde_json::from_str(&text).map_err(|e| ExecError::MalformedOutput {
        command: name.to_string(),
        reason: e.to_string(),
    })
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    })
}

fn join(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

fn wait_with_deadline(child: &mut Child, deadline: Instant) -> std::io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}

fn terminate(child: &mut Child) {
    #[cfg(unix)]
    {
        // The child leads its own process group; take the whole group down.
        if let Ok(pid) = i32::try_from(child.id()) {
            // SAFETY: kill(2) takes plain integers and touches no memory. The
            // child is not reaped yet, so its pgid still names our group.
            unsafe {
                libc::kill(-pid, libc::SIGKILL);
            }
        }
    }
    let _ = child.kill();
    let _ = child.wait();
}
