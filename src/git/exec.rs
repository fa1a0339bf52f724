//! git::exec
//!
//! Bounded, non-interactive subprocess execution for git.
//!
//! # Architecture
//!
//! Every git invocation in syncdoctor goes through [`Executor::execute`]:
//!
//! - A per-directory async mutex serializes calls against one working copy.
//!   The lock registry belongs to the `Executor` value and is shared by its
//!   clones, so two independent executors never contend.
//! - Credential prompting is disabled. A command that would ask for a
//!   password fails instead, and its stderr is classified upstream as an
//!   authentication failure. For ssh this goes through `SSH_ASKPASS_REQUIRE`
//!   rather than `GIT_SSH_COMMAND`, so an inherited `GIT_SSH_COMMAND` or a
//!   configured `core.sshCommand` (identity files, jump hosts) still applies.
//! - Locale and pager are pinned so output parsing is stable.
//! - A deadline bounds each call. On expiry the child is killed and
//!   [`ExecError::Timeout`] is returned.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::time::Duration;
//! use syncdoctor::git::exec::{Executor, ExecutorConfig};
//!
//! # async fn demo() -> Result<(), syncdoctor::git::exec::ExecError> {
//! let exec = Executor::new(ExecutorConfig::default());
//! let out = exec
//!     .execute(Path::new("."), &["rev-parse", "HEAD"], Duration::from_secs(5))
//!     .await?;
//! println!("HEAD = {}", out.stdout.trim());
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Environment applied to every invocation.
const NON_INTERACTIVE_ENV: &[(&str, &str)] = &[
    ("GIT_TERMINAL_PROMPT", "0"),
    ("GCM_INTERACTIVE", "never"),
    ("GIT_ASKPASS", ""),
    // ssh asks this program for passphrases and host-key confirmation
    // even with a terminal attached; `false` answers no.
    ("SSH_ASKPASS", "false"),
    ("SSH_ASKPASS_REQUIRE", "force"),
    ("LC_ALL", "C"),
    ("LANG", "C"),
    ("GIT_PAGER", "cat"),
    ("GIT_OPTIONAL_LOCKS", "0"),
];

/// Errors from running a subprocess.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The deadline elapsed; the child was killed.
    #[error("`git {command}` timed out after {}s", .deadline.as_secs_f32())]
    Timeout { command: String, deadline: Duration },

    /// The program could not be started.
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    /// I/O failure while talking to a running child.
    #[error("i/o error running `git {command}`: {source}")]
    Io {
        command: String,
        source: std::io::Error,
    },
}

/// Executor settings, passed explicitly at construction.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Program to run (default: `git` from `PATH`).
    pub git_binary: PathBuf,
    /// Extra environment, applied after the non-interactive defaults.
    pub extra_env: Vec<(String, String)>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            git_binary: PathBuf::from("git"),
            extra_env: Vec::new(),
        }
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// Process exit code; `-1` when terminated by a signal.
    pub exit_code: i32,
}

impl CommandOutput {
    /// Whether the command exited with status 0.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

type LockRegistry = HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>;

/// Runs git subprocesses with a deadline and per-directory serialization.
#[derive(Debug, Clone)]
pub struct Executor {
    config: Arc<ExecutorConfig>,
    locks: Arc<Mutex<LockRegistry>>,
}

impl Executor {
    /// Create an executor with its own lock registry.
    pub fn new(config: ExecutorConfig) -> Self {
        Self {
            config: Arc::new(config),
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn dir_lock(&self, dir: &Path) -> Arc<tokio::sync::Mutex<()>> {
        let key = std::fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
        // A poisoned registry still holds valid entries.
        let mut locks = match self.locks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        locks.entry(key).or_default().clone()
    }

    /// Run `git <args>` in `dir`.
    pub async fn execute(
        &self,
        dir: &Path,
        args: &[&str],
        deadline: Duration,
    ) -> Result<CommandOutput, ExecError> {
        self.execute_with_stdin(dir, args, None, deadline).await
    }

    /// Run `git <args>` in `dir`, feeding `stdin` to the child.
    ///
    /// With `stdin = None` the child's stdin is closed.
    pub async fn execute_with_stdin(
        &self,
        dir: &Path,
        args: &[&str],
        stdin: Option<Vec<u8>>,
        deadline: Duration,
    ) -> Result<CommandOutput, ExecError> {
        let command_line = args.join(" ");
        let lock = self.dir_lock(dir);
        let _guard = lock.lock().await;

        let started = Instant::now();
        let mut cmd = Command::new(&self.config.git_binary);
        cmd.args(args)
            .current_dir(dir)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for (key, value) in NON_INTERACTIVE_ENV {
            cmd.env(key, value);
        }
        for (key, value) in &self.config.extra_env {
            cmd.env(key, value);
        }

        let mut child = cmd.spawn().map_err(|source| ExecError::Spawn {
            program: self.config.git_binary.display().to_string(),
            source,
        })?;

        // Write stdin on its own task so a child that fills its stdout pipe
        // before draining stdin cannot deadlock us.
        let writer = match (stdin, child.stdin.take()) {
            (Some(bytes), Some(mut pipe)) => Some(tokio::spawn(async move {
                let res = pipe.write_all(&bytes).await;
                drop(pipe);
                res
            })),
            _ => None,
        };

        let output = match tokio::time::timeout(deadline, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                return Err(ExecError::Io {
                    command: command_line,
                    source,
                })
            }
            Err(_) => {
                tracing::debug!(command = %command_line, ?deadline, "git command timed out");
                return Err(ExecError::Timeout {
                    command: command_line,
                    deadline,
                });
            }
        };

        if let Some(writer) = writer {
            match writer.await {
                Ok(Err(source)) if source.kind() != std::io::ErrorKind::BrokenPipe => {
                    return Err(ExecError::Io {
                        command: command_line,
                        source,
                    })
                }
                _ => {}
            }
        }

        let result = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
        };

        tracing::debug!(
            command = %command_line,
            dir = %dir.display(),
            exit_code = result.exit_code,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "git command finished"
        );

        Ok(result)
    }
}
