//! Error types for the parity harness

use crate::report::SequenceMismatch;
use crate::runner::ExecutionError;
use parity_trace::TraceError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for harness operations
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Errors that can occur while loading harness configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file
    #[error("failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse YAML
    #[error("failed to parse YAML in {path}: {source}")]
    ParseYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Invalid configuration value
    #[error("invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    /// The process working directory could not be determined
    #[error("cannot determine current directory: {source}")]
    CurrentDir {
        #[source]
        source: std::io::Error,
    },
}

/// A candidate invocation that discovery tried and rejected
#[derive(Debug)]
pub struct RejectedCandidate {
    pub label: String,
    pub reason: String,
}

impl fmt::Display for RejectedCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label, self.reason)
    }
}

/// Errors that end a parity run
///
/// `ExecutionFailure`, `DiscoveryExhausted` and `Trace` are fatal: no
/// comparison took place. `Mismatch` is the assertion failure produced from a
/// completed comparison.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The reference run could not produce a trace
    #[error("reference run '{label}' failed: {source}")]
    ExecutionFailure {
        label: String,
        /// Output captured before the failure
        output: String,
        #[source]
        source: ExecutionError,
    },

    /// No candidate invocation produced recognizable frame output
    #[error("no candidate invocation produced frame output ({} tried){}", .attempts.len(), list_attempts(.attempts))]
    DiscoveryExhausted { attempts: Vec<RejectedCandidate> },

    /// Captured output could not be turned into frames
    #[error("{side} trace is malformed: {source}")]
    Trace {
        side: &'static str,
        #[source]
        source: TraceError,
    },

    /// One or both directions differ between reference and candidate
    #[error("frame sequences differ: {}", list_mismatches(.mismatches))]
    Mismatch { mismatches: Vec<SequenceMismatch> },
}

impl HarnessError {
    /// Fatal errors abort before any comparison is made
    pub fn is_fatal(&self) -> bool {
        !matches!(self, HarnessError::Mismatch { .. })
    }
}

fn list_attempts(attempts: &[RejectedCandidate]) -> String {
    attempts
        .iter()
        .map(|a| format!("\n  - {}", a))
        .collect()
}

fn list_mismatches(mismatches: &[SequenceMismatch]) -> String {
    mismatches
        .iter()
        .map(|m| m.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
