//! Unified error handling for golemd.
//!
//! Errors raised inside the dispatcher: command handler failures and the
//! failures of work delegated off the dispatcher. Layer-specific errors
//! live next to their layer (`ConfigError`, `DbError`, `CredentialError`).

use thiserror::Error;

use crate::db::DbError;
use crate::security::CredentialError;

// ============================================================================
// Handler Errors (command processing)
// ============================================================================

/// Errors that can occur while interpreting a command.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// A required argument was missing; the message is shown to the player.
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),

    /// The acting connection has no session in the world.
    #[error("no session bound to connection")]
    NoSession,

    #[error("internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingArgument(_) => "missing_argument",
            Self::NoSession => "no_session",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Text for the player, if the error warrants one.
    pub fn to_reply(&self) -> Option<String> {
        match self {
            Self::MissingArgument(message) => Some(format!("{message}\r\n")),
            Self::NoSession | Self::Internal(_) => None,
        }
    }
}

/// Result type for command handlers.
pub type HandlerResult = Result<(), HandlerError>;

// ============================================================================
// Delegated Work Errors
// ============================================================================

/// Failure of work run off the dispatcher.
#[derive(Debug, Error)]
pub enum WorkError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
