//! Error types for the cache server
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::gateway::BatchResult;

// == Cache Error Enum ==
/// Unified error type for the cache server.
///
/// The `Display` output of each variant is the message reported to clients
/// in the `errors` list of the response envelope.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A numeric argument or stored value could not be used
    #[error("{0}")]
    Validation(String),

    /// The command has been administratively disabled
    #[error("Command {0} is not enabled.")]
    DisabledCommand(String),

    /// No command or extension is served under this name
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// Backup directory or file could not be read or written
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Backup content is not a valid serialized content map
    #[error("{context}: {source}")]
    Parse {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// Wraps an I/O error with a description of the failed operation.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        CacheError::Io {
            context: context.into(),
            source,
        }
    }

    /// Wraps a serialization error with a description of the failed operation.
    pub fn parse(context: impl Into<String>, source: serde_json::Error) -> Self {
        CacheError::Parse {
            context: context.into(),
            source,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            CacheError::Validation(_) => StatusCode::BAD_REQUEST,
            CacheError::DisabledCommand(_) => StatusCode::FORBIDDEN,
            CacheError::UnknownCommand(_) => StatusCode::NOT_FOUND,
            CacheError::Io { .. } | CacheError::Parse { .. } | CacheError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

// == IntoResponse Implementation ==
/// Request-level failures (before any command runs) still answer with the
/// standard envelope, carrying the single error at index 0.
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(BatchResult::failed(&self));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache server.
pub type Result<T> = std::result::Result<T, CacheError>;
