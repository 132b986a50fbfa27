//! Subprocess execution with merged output capture

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// One way of launching an implementation's instrumented test entry point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    /// Label used in logs and reports; falls back to the command line
    #[serde(default)]
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default = "default_working_dir")]
    pub working_dir: PathBuf,
}

fn default_working_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Invocation {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            command: command.into(),
            args: Vec::new(),
            working_dir: default_working_dir(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    /// Name if set, otherwise the full command line
    pub fn label(&self) -> String {
        if !self.name.is_empty() {
            return self.name.clone();
        }
        self.command_line()
    }

    pub fn command_line(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Program path to execute
    ///
    /// A relative command with more than one path component is taken
    /// relative to the working directory and made absolute, so it does not
    /// depend on how the platform combines a relative program with
    /// `current_dir`. A bare name is looked up on PATH.
    pub fn program(&self) -> std::io::Result<PathBuf> {
        let command = Path::new(&self.command);
        if command.is_absolute() || command.components().count() <= 1 {
            return Ok(command.to_path_buf());
        }
        let dir = if self.working_dir.is_absolute() {
            self.working_dir.clone()
        } else {
            std::env::current_dir()?.join(&self.working_dir)
        };
        Ok(dir.join(command))
    }
}

/// Why a run did not complete cleanly
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// Binary not found, permission denied, or any other spawn failure
    #[error("failed to launch '{command}': {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Process ran but did not exit with status zero
    #[error("'{command}' {}", describe_exit(.code))]
    ExitStatus { command: String, code: Option<i32> },

    /// Process was killed after exceeding the configured timeout
    #[error("'{command}' timed out after {after:?}")]
    TimedOut { command: String, after: Duration },

    /// Waiting on the process failed
    #[error("failed waiting for '{command}': {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with status {}", code),
        None => "was terminated by a signal".to_string(),
    }
}

/// Everything captured from one run
///
/// `combined_output` holds whatever was captured even when `error` is set.
#[derive(Debug, Default)]
pub struct ExecutionResult {
    pub combined_output: String,
    pub error: Option<ExecutionError>,
}

impl ExecutionResult {
    pub fn success(combined_output: impl Into<String>) -> Self {
        Self {
            combined_output: combined_output.into(),
            error: None,
        }
    }

    pub fn failure(combined_output: impl Into<String>, error: ExecutionError) -> Self {
        Self {
            combined_output: combined_output.into(),
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Executes invocations and captures their output
///
/// Implementations must return captured output even on failure and must not
/// leave the child running once the returned future is dropped.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation) -> ExecutionResult;
}

/// Runs invocations as real child processes
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill runs that take longer than `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, invocation: &Invocation) -> ExecutionResult {
        let command = invocation.command_line();
        info!("Running '{}' in {:?}", command, invocation.working_dir);

        let program = match invocation.program() {
            Ok(program) => program,
            Err(source) => {
                warn!("Cannot resolve program for '{}': {}", command, source);
                return ExecutionResult::failure(
                    String::new(),
                    ExecutionError::Launch { command, source },
                );
            }
        };

        let mut child = match Command::new(&program)
            .args(&invocation.args)
            .current_dir(&invocation.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(source) => {
                warn!("Failed to launch {:?}: {}", program, source);
                return ExecutionResult::failure(
                    String::new(),
                    ExecutionError::Launch { command, source },
                );
            }
        };

        let (tx, mut rx) = mpsc::unbounded_channel();
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_lines(stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_lines(stderr, tx.clone()));
        }
        drop(tx);

        let deadline = self.timeout.map(|t| Instant::now() + t);
        let mut captured: Vec<u8> = Vec::new();

        // Drain both pipes until they close, then reap the child.
        let waited = loop {
            tokio::select! {
                line = rx.recv() => match line {
                    Some(line) => captured.extend_from_slice(&line),
                    None => break wait_until(&mut child, deadline).await,
                },
                _ = sleep_until(deadline) => break None,
            }
        };

        if waited.is_none() {
            if let Err(e) = child.kill().await {
                debug!("Failed to kill timed out child: {}", e);
            }
            // Keep lines that arrived before the deadline but were not read yet
            while let Ok(line) = rx.try_recv() {
                captured.extend_from_slice(&line);
            }
        }

        let output = String::from_utf8_lossy(&captured).into_owned();
        debug!("'{}' produced {} bytes of output", command, output.len());

        match waited {
            None => {
                let after = self.timeout.unwrap_or_default();
                warn!("'{}' timed out after {:?}", command, after);
                ExecutionResult::failure(output, ExecutionError::TimedOut { command, after })
            }
            Some(Err(source)) => {
                ExecutionResult::failure(output, ExecutionError::Io { command, source })
            }
            Some(Ok(status)) if status.success() => {
                debug!("'{}' exited successfully", command);
                ExecutionResult::success(output)
            }
            Some(Ok(status)) => {
                info!("'{}' exited with {}", command, status);
                ExecutionResult::failure(
                    output,
                    ExecutionError::ExitStatus {
                        command,
                        code: status.code(),
                    },
                )
            }
        }
    }
}

/// Wait for exit; `None` when the deadline passes first
async fn wait_until(
    child: &mut tokio::process::Child,
    deadline: Option<Instant>,
) -> Option<std::io::Result<std::process::ExitStatus>> {
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, child.wait()).await.ok(),
        None => Some(child.wait().await),
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Forward complete lines from one pipe; every forwarded line ends in `\n`
async fn forward_lines<R>(reader: R, tx: mpsc::UnboundedSender<Vec<u8>>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    loop {
        let mut line = Vec::new();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => break,
            Ok(_) => {
                if line.last() != Some(&b'\n') {
                    line.push(b'\n');
                }
                if tx.send(line).is_err() {
                    break;
                }
            }
            Err(e) => {
                debug!("Stopped reading child output: {}", e);
                break;
            }
        }
    }
}
