//! External process execution
//!
//! Every collaborator (git, the container build tool, the container runtime)
//! is reached through a [`CommandRunner`]. The production implementation
//! spawns real subprocesses with tokio; tests substitute runners that record
//! invocations and return scripted output.
//!
//! A non-zero exit is not an error at this layer. Callers decide what a
//! failing exit means via [`ProcessOutput::into_result`].

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

/// Errors raised while invoking a collaborator tool
#[derive(Debug, Error)]
pub enum ToolError {
    /// The program could not be started (usually: not installed)
    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    /// The program did not finish in time and was killed
    #[error("`{command}` timed out after {}s", .timeout.as_secs())]
    TimedOut { command: String, timeout: Duration },

    /// The program ran and reported failure
    #[error("`{command}` failed with {status}: {diagnostic}")]
    Failed {
        command: String,
        status: String,
        diagnostic: String,
    },

    /// Local filesystem work around an invocation failed
    #[error("{context}: {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },
}

impl ToolError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ToolError::TimedOut { .. })
    }

    /// The tool's own diagnostic output, when it produced any
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            ToolError::Failed { diagnostic, .. } => Some(diagnostic),
            _ => None,
        }
    }
}

/// A single command to execute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,

    /// Capture stdout instead of inheriting the server's stdout.
    /// Stderr is always captured since it carries the diagnostic.
    pub capture_stdout: bool,

    /// Kill the process once this much time has passed
    pub timeout: Option<Duration>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            capture_stdout: false,
            timeout: None,
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

    pub fn capture_stdout(mut self) -> Self {
        self.capture_stdout = true;
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Human-readable command line, used in logs and error messages
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// What a finished process reported
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` when the process was terminated by a signal
    pub code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    /// Output of a process that exited with status 0
    pub fn succeeded(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Output of a process that exited with the given non-zero status
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Converts a failing exit into [`ToolError::Failed`]
    ///
    /// The diagnostic is the tool's stderr, or its stdout when stderr is empty.
    pub fn into_result(self, invocation: &Invocation) -> Result<ProcessOutput, ToolError> {
        if self.success {
            return Ok(self);
        }

        let diagnostic = if self.stderr.trim().is_empty() {
            self.stdout.trim().to_string()
        } else {
            self.stderr.trim().to_string()
        };

        let status = match self.code {
            Some(code) => format!("exit code {}", code),
            None => "termination by signal".to_string(),
        };

        Err(ToolError::Failed {
            command: invocation.command_line(),
            status,
            diagnostic,
        })
    }
}

/// Port through which all external commands are executed
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs the invocation to completion
    ///
    /// # Returns
    /// The process output whether or not it exited successfully. Errors are
    /// reserved for spawn failures and timeouts.
    async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput, ToolError>;
}

/// Runs commands as real subprocesses on the tokio runtime
///
/// Children are spawned with `kill_on_drop`, so a timeout or a dropped
/// request future terminates the underlying process.
#[derive(Debug, Clone, Default)]
pub struct TokioCommandRunner;

impl TokioCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput, ToolError> {
        let command_line = invocation.command_line();
        debug!("Executing: {}", command_line);

        let stdout = if invocation.capture_stdout {
            Stdio::piped()
        } else {
            Stdio::inherit()
        };

        let child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ToolError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;

        let waited = match invocation.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(waited) => waited,
                Err(_) => {
                    // Dropping the wait future drops the child, which kills it
                    warn!("`{}` timed out after {:?}, killed", command_line, limit);
                    return Err(ToolError::TimedOut {
                        command: command_line,
                        timeout: limit,
                    });
                }
            },
            None => child.wait_with_output().await,
        };

        let output = waited.map_err(|source| ToolError::Io {
            context: format!("failed to wait for `{}`", command_line),
            source,
        })?;

        let result = ProcessOutput {
            code: output.status.code(),
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };

        if !result.stderr.trim().is_empty() {
            debug!("{} stderr: {}", invocation.program, result.stderr.trim());
        }

        if result.success {
            debug!(
                "`{}` completed: stdout_len={}, stderr_len={}",
                command_line,
                result.stdout.len(),
                result.stderr.len()
            );
        } else {
            warn!(
                "`{}` failed: exit_code={:?}, stderr='{}'",
                command_line,
                result.code,
                result.stderr.trim()
            );
        }

        Ok(result)
    }
}
