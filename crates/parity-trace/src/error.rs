//! Error types for trace parsing

use thiserror::Error;

/// Result type for trace operations
pub type TraceResult<T> = Result<T, TraceError>;

/// Errors raised while turning captured text into frames
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TraceError {
    /// Payload is empty or contains non-hex characters
    #[error("invalid hex payload '{payload}'")]
    InvalidHex { payload: String },

    /// Direction is neither SENT nor RECV
    #[error("invalid frame direction '{value}'")]
    InvalidDirection { value: String },

    /// A structured record line could not be decoded
    #[error("malformed frame record on line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    /// A structured record declares a version we do not understand
    #[error("unsupported frame record version {version} on line {line}")]
    UnsupportedVersion { line: usize, version: u32 },

    /// Record sequence numbers are not contiguous from zero
    #[error("frame record sequence gap on line {line}: expected seq {expected}, found {found}")]
    SequenceGap {
        line: usize,
        expected: u64,
        found: u64,
    },
}
