//! Invocation of the node binary.
//!
//! [`NodeProcess`] is the seam between the launcher's orchestration and the
//! external process: the launcher only ever asks for whole subcommands, a
//! capability probe, a stop of running instances and the final long-running
//! start. [`NodeBinary`] implements it with `tokio::process`.

use crate::plan::LaunchPlan;
use async_trait::async_trait;
use nodeboot_config::{Backend, BackendSupport};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use thiserror::Error;
use tokio::process::Command;
use tokio::signal;
use tracing::{debug, error, info, warn};

/// Errors raised while running the node binary.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Binary not found at {path}")]
    BinaryNotFound { path: PathBuf },

    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command `{command}` failed with {status}")]
    Failed { command: String, status: ExitStatus },
}

pub type ProcessResult<T> = std::result::Result<T, ProcessError>;

/// How a launched node finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// The node exited on its own with status zero.
    Exited,
    /// The operator pressed Ctrl+C.
    Interrupted,
}

/// The operations the launcher needs from the node binary.
#[async_trait]
pub trait NodeProcess: Send + Sync {
    /// Runs a subcommand to completion. A non-zero exit is an error.
    async fn run(&self, args: &[String]) -> ProcessResult<()>;

    /// Probes `start --help` for `backend`. Never fails; problems yield `Unknown`.
    async fn backend_support(&self, backend: Backend) -> BackendSupport;

    /// Stops running instances of the binary. Finding none is not an error.
    async fn stop_running(&self) -> ProcessResult<()>;

    /// Starts the node and waits for it to exit or for Ctrl+C.
    async fn launch(&self, plan: &LaunchPlan) -> ProcessResult<LaunchOutcome>;
}

/// The real node binary on disk.
#[derive(Debug, Clone)]
pub struct NodeBinary {
    path: PathBuf,
}

impl NodeBinary {
    /// Fails when `path` is not an existing file. The path is made absolute
    /// so every spawned process carries the same `argv[0]`.
    pub fn new(path: impl Into<PathBuf>) -> ProcessResult<Self> {
        let path = path.into();
        if !path.is_file() {
            return Err(ProcessError::BinaryNotFound { path });
        }
        let path = std::fs::canonicalize(&path)
            .map_err(|_| ProcessError::BinaryNotFound { path })?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `pkill -f` pattern matching command lines that start with this binary.
    ///
    /// The kernel process name is cut to 15 bytes, so matching on it misses
    /// long file names; the full command line does not have that limit.
    fn process_pattern(&self) -> String {
        format!("^{}( |$)", escape_regex(&self.program()))
    }

    fn program(&self) -> String {
        self.path.display().to_string()
    }

    fn describe(&self, args: &[String]) -> String {
        let mut command = self.program();
        for arg in args {
            command.push(' ');
            command.push_str(arg);
        }
        command
    }

    fn spawn_error(&self, source: std::io::Error) -> ProcessError {
        ProcessError::Spawn {
            program: self.program(),
            source,
        }
    }
}

#[async_trait]
impl NodeProcess for NodeBinary {
    async fn run(&self, args: &[String]) -> ProcessResult<()> {
        let command = self.describe(args);
        info!(target: "nodeboot", command = %command, "running");

        let status = Command::new(&self.path)
            .args(args)
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|err| self.spawn_error(err))?;

        if !status.success() {
            return Err(ProcessError::Failed { command, status });
        }
        Ok(())
    }

    async fn backend_support(&self, backend: Backend) -> BackendSupport {
        let output = match Command::new(&self.path)
            .args(["start", "--help"])
            .stdin(Stdio::null())
            .output()
            .await
        {
            Ok(output) => output,
            Err(err) => {
                warn!(target: "nodeboot", error = %err, "failed to run start --help");
                return BackendSupport::Unknown;
            }
        };

        // cobra prints help to stdout, but some builds route it to stderr
        let mut help = String::from_utf8_lossy(&output.stdout).into_owned();
        help.push('\n');
        help.push_str(&String::from_utf8_lossy(&output.stderr));

        BackendSupport::from_help_text(&help, backend)
    }

    async fn stop_running(&self) -> ProcessResult<()> {
        let pattern = self.process_pattern();
        info!(target: "nodeboot", pattern = %pattern, "stopping running node processes");

        let status = Command::new("pkill")
            .arg("-f")
            .arg(&pattern)
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|source| ProcessError::Spawn {
                program: "pkill".to_string(),
                source,
            })?;

        // pkill exits 1 when nothing matched
        match status.code() {
            Some(0) => info!(target: "nodeboot", pattern = %pattern, "stopped running node processes"),
            Some(1) => debug!(target: "nodeboot", pattern = %pattern, "no running node processes"),
            _ => {
                return Err(ProcessError::Failed {
                    command: format!("pkill -f {pattern}"),
                    status,
                })
            }
        }
        Ok(())
    }

    async fn launch(&self, plan: &LaunchPlan) -> ProcessResult<LaunchOutcome> {
        let command = self.describe(plan.args());
        info!(target: "nodeboot", command = %command, "starting node");

        let mut child = Command::new(&self.path)
            .args(plan.args())
            .spawn()
            .map_err(|err| self.spawn_error(err))?;

        let status = tokio::select! {
            status = child.wait() => status.map_err(|err| self.spawn_error(err))?,
            result = signal::ctrl_c() => {
                match result {
                    Ok(()) => {
                        info!(target: "nodeboot", "shutdown signal received (Ctrl+C)");
                        // the child shares our process group and got the same signal
                        if let Err(err) = child.wait().await {
                            warn!(target: "nodeboot", error = %err, "failed to reap node process");
                        }
                        info!(target: "nodeboot", "node stopped");
                        return Ok(LaunchOutcome::Interrupted);
                    }
                    Err(err) => {
                        error!(target: "nodeboot", error = %err, "failed to wait for shutdown signal");
                        child.wait().await.map_err(|err| self.spawn_error(err))?
                    }
                }
            }
        };

        if !status.success() {
            return Err(ProcessError::Failed { command, status });
        }
        info!(target: "nodeboot", "node exited");
        Ok(LaunchOutcome::Exited)
    }
}

/// Escapes POSIX extended regex metacharacters.
fn escape_regex(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(
            c,
            '.' | '[' | ']' | '(' | ')' | '{' | '}' | '*' | '+' | '?' | '|' | '^' | '$' | '\\'
        ) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
