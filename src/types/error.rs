//! Error types for the EFT engine
//!
//! This module defines all error types that can occur while loading accounts,
//! dispatching transfers and running workers. Errors are designed to be
//! descriptive and user-friendly for CLI output.
//!
//! # Error Categories
//!
//! - **File I/O Errors**: File not found, permission denied, etc.
//! - **Parse Errors**: Malformed input lines (recoverable, the line is skipped)
//! - **Configuration Errors**: Invalid worker count or account capacity
//! - **Initialisation Errors**: Worker contexts or runtimes that could not start
//! - **Protocol Violations**: A transfer naming an account that was never added

use crate::types::transfer::{AccountId, WorkerId};
use thiserror::Error;

/// Main error type for the EFT engine
///
/// Each variant includes relevant context to help diagnose the issue.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EftError {
    /// File not found at the specified path
    ///
    /// This is a fatal error that prevents processing from starting.
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found
        path: String,
    },

    /// I/O error occurred while reading input or writing the report
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O error
        message: String,
    },

    /// Input line could not be parsed
    ///
    /// This is a recoverable error - the line is skipped and reading continues.
    #[error("Parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },

    /// Invalid configuration, reported before any worker is spawned
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the invalid setting
        message: String,
    },

    /// A worker context or shared resource could not be created
    ///
    /// This is fatal: no transfers have started, nothing to roll back.
    #[error("Failed to initialise {resource}: {message}")]
    FatalInit {
        /// The resource that failed (thread, runtime, ...)
        resource: String,
        /// Description of the failure
        message: String,
    },

    /// Account store used before `init`
    #[error("Account store is not initialised")]
    StoreNotInitialized,

    /// `init` called on an account store that is already initialised
    #[error("Account store is already initialised")]
    StoreAlreadyInitialized,

    /// Account store capacity below one
    #[error("Invalid account capacity {capacity}: must be at least 1")]
    InvalidCapacity {
        /// The rejected capacity
        capacity: i64,
    },

    /// All pre-allocated account slots are in use
    #[error("Account store is full (capacity {capacity})")]
    StoreFull {
        /// The declared capacity
        capacity: usize,
    },

    /// A transfer references an account that was never added
    ///
    /// Never expected with correct dispatch; treated as a programming error.
    #[error("Protocol violation: account {account} does not exist")]
    ProtocolViolation {
        /// The unknown account id
        account: AccountId,
    },

    /// A worker context terminated abnormally
    #[error("Worker {worker} terminated abnormally")]
    WorkerPanicked {
        /// The worker that failed to join
        worker: WorkerId,
    },
}

impl From<std::io::Error> for EftError {
    fn from(error: std::io::Error) -> Self {
        EftError::IoError {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for EftError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|p| p.line());
        EftError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors
impl EftError {
    /// Create a FileNotFound error
    pub fn file_not_found(path: &str) -> Self {
        EftError::FileNotFound {
            path: path.to_string(),
        }
    }

    /// Create a ParseError for a specific line
    pub fn parse_error(line: u64, message: &str) -> Self {
        EftError::ParseError {
            line: Some(line),
            message: message.to_string(),
        }
    }

    /// Create a ConfigError
    pub fn config_error(message: &str) -> Self {
        EftError::ConfigError {
            message: message.to_string(),
        }
    }

    /// Create a FatalInit error
    pub fn fatal_init(resource: &str, message: &str) -> Self {
        EftError::FatalInit {
            resource: resource.to_string(),
            message: message.to_string(),
        }
    }

    /// Create a ProtocolViolation error
    pub fn protocol_violation(account: AccountId) -> Self {
        EftError::ProtocolViolation { account }
    }

    /// Create a WorkerPanicked error
    pub fn worker_panicked(worker: WorkerId) -> Self {
        EftError::WorkerPanicked { worker }
    }
}
