//! Error types for the partitioned similarity engine
//!
//! This module provides structured error types using thiserror for better
//! error handling and actionable error messages.

use crate::embedding::WorkerId;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for coordinator and worker operations
#[derive(Error, Debug)]
pub enum ShardError {
    /// Planning-time errors: bad worker count, table too small
    #[error("Invalid configuration: {reason}")]
    Configuration { reason: String },

    /// File system errors while reading the embedding table
    #[error("Failed to read embedding file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A row failed to parse into (word, D floats)
    #[error("Malformed embedding row at line {line}: {reason}")]
    MalformedRow { line: usize, reason: String },

    /// A vector did not match the configured dimension
    #[error(
        "Vector dimension mismatch: expected {expected}, got {actual}\nSuggestion: Ensure the --dimension flag matches the embedding file"
    )]
    DimensionMismatch { expected: usize, actual: usize },

    /// The same word exists in more than one partition
    #[error(
        "Word '{word}' is owned by worker {kept} and worker {ignored}; keeping worker {kept}\nSuggestion: Deduplicate the source table, results may be ambiguous"
    )]
    DuplicateOwnership {
        word: String,
        kept: WorkerId,
        ignored: WorkerId,
    },

    /// A worker missed the bounded reply deadline
    #[error("Worker {worker} did not reply within {waited_ms}ms and was excluded from the session")]
    Unreachable { worker: WorkerId, waited_ms: u64 },

    /// A frame arrived in a state that does not accept it, or could not be decoded
    #[error("Protocol violation: {reason}")]
    Protocol { reason: String },

    /// The underlying channel to a worker was closed
    #[error("Transport to worker {worker} disconnected")]
    Disconnected { worker: WorkerId },
}

impl ShardError {
    /// Get a stable status code for this error type.
    ///
    /// Returns a string identifier that can be used in structured output
    /// for programmatic error handling.
    pub fn status_code(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "CONFIG_ERROR",
            Self::FileRead { .. } => "FILE_READ_ERROR",
            Self::MalformedRow { .. } => "MALFORMED_ROW",
            Self::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
            Self::DuplicateOwnership { .. } => "DUPLICATE_OWNERSHIP",
            Self::Unreachable { .. } => "WORKER_UNREACHABLE",
            Self::Protocol { .. } => "PROTOCOL_VIOLATION",
            Self::Disconnected { .. } => "TRANSPORT_DISCONNECTED",
        }
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::Configuration { .. } => vec![
                "Check that --workers is at least 1 and no larger than the row count",
            ],
            Self::MalformedRow { .. } => vec![
                "Verify the file is tab-separated: word, then one float per dimension",
                "Set load.on_malformed = \"skip\" to drop bad rows instead of aborting",
            ],
            Self::Unreachable { .. } => vec![
                "The session continues with the remaining workers; results are partial",
                "Increase reply_timeout_ms if workers are merely slow",
            ],
            Self::Protocol { .. } => {
                vec!["This indicates a coordinator/worker version or framing mismatch"]
            }
            _ => vec![],
        }
    }
}

/// Result type alias for shard operations
pub type ShardResult<T> = Result<T, ShardError>;
