//! Error types for the Gogs API client.
//!
//! # Design
//! `Failure` is the service saying no: it carries the status code and the
//! service's message and is always surfaced to the caller. `Decode` means a
//! success body broke the schema contract and is kept apart from `Failure`
//! so callers never mistake it for a rejected call. `Transport` covers
//! round trips that never produced a response.

use serde::Deserialize;

/// A rejected HTTP call: the status code and the message the service gave.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("HTTP {status_code}: {message}")]
pub struct ApiFailure {
    pub status_code: u16,
    pub message: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl ApiFailure {
    /// Build a failure from a status and raw response body. A JSON body with
    /// a `message` field contributes that field; otherwise the trimmed body
    /// is used, falling back to the status line when the body is empty.
    pub fn from_response(status_code: u16, body: &str) -> Self {
        let message = match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => parsed.message,
            Err(_) if body.trim().is_empty() => format!("HTTP {status_code}"),
            Err(_) => body.trim().to_string(),
        };
        Self {
            status_code,
            message,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code == 404
    }
}

/// The injected transport failed to complete a round trip.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("transport failed: {0}")]
pub struct TransportError(pub String);

/// Errors returned by `GogsClient` parse methods and `GogsApi` operations.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The service rejected the call.
    #[error(transparent)]
    Failure(#[from] ApiFailure),

    /// A success response body did not match the expected schema.
    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// No response was received.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ApiError {
    /// Status code of a rejected call; `None` for decode and transport errors.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Failure(failure) => Some(failure.status_code),
            _ => None,
        }
    }
}
