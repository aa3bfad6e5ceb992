//! Error types for dictionary operations and the HTTP server lifecycle.

use std::path::PathBuf;
use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Failures produced by [`crate::dictionary::Dictionary`] operations.
///
/// Each variant maps onto one HTTP status so handlers can return the error
/// as-is.
#[derive(Debug, Error)]
pub enum DictionaryError {
    /// Malformed request body or an empty required field.
    #[error("{0}")]
    InvalidInput(String),

    /// A required query parameter was absent or empty.
    #[error("missing query parameter '{0}'")]
    MissingParameter(&'static str),

    /// The word is not in the dictionary.
    #[error("word '{0}' not found")]
    NotFound(String),

    /// A search matched nothing.
    #[error("no word matches '{0}'")]
    NoMatches(String),

    #[error("cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed dictionary file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode dictionary: {0}")]
    Encode(#[source] serde_json::Error),
}

impl DictionaryError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) | Self::MissingParameter(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) | Self::NoMatches(_) => StatusCode::NOT_FOUND,
            Self::Io { .. } | Self::Parse { .. } | Self::Encode(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// JSON body sent with every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for DictionaryError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Failures of the listener lifecycle.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP server error: {0}")]
    Serve(#[from] std::io::Error),

    /// In-flight requests were still running when the drain window closed.
    #[error("graceful shutdown did not complete within {0:?}")]
    ShutdownTimeout(Duration),
}
