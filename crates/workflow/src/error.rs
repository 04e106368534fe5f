//! Session-boundary errors.
//!
//! External-call failures never reach this level; the pipeline stages absorb
//! them. What remains are caller-protocol mistakes and startup problems.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Session {0} is already processing a turn")]
    SessionBusy(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, WorkflowError>;
