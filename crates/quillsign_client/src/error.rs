//! Client error type.

use quillsign_instrument::InstrumentError;

use crate::config::ConfigError;

/// Errors returned by client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request could not be sent or its body could not be read.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("api error {status} ({name}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Machine-readable error name, e.g. `not_found`.
        name: String,
        /// Human-readable message.
        message: String,
    },

    /// A success response did not have the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The request was rejected locally before being sent.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A request payload could not be encoded as JSON.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The client configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The instrumentation layer failed.
    #[error(transparent)]
    Instrument(#[from] InstrumentError),
}

impl ClientError {
    /// Returns the HTTP status for API errors.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` if the API reported the resource as missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
