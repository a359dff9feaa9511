// Central Error Type for the Harness

use thiserror::Error;

/// Harness-level error type
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Execution error: {0}")]
    Execution(#[from] crate::port::ExecutionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Node already registered: {0}")]
    DuplicateNode(String),

    #[error("Node error on {node}: {message}")]
    Node { node: String, message: String },

    /// Polling budget exhausted without a match
    #[error("Timed out waiting for result {matcher} after {attempts} attempts")]
    Timeout {
        attempts: u32,
        matcher: String,
        last_output: Option<String>,
    },
}

/// Result type alias using HarnessError
pub type Result<T> = std::result::Result<T, HarnessError>;
