//! Error types for request building and dispatch.
//!
//! # Design
//! Every variant maps onto a status code through [`DispatchError::status_code`]
//! so the dispatcher can fold any failure into a `ResponseEnvelope`. Variants
//! raised before the network is touched (`MissingCredential`,
//! `InvalidRequest`, `Serialization`) are kept apart from transport outcomes
//! so callers of `build_request` can tell them apart.

use std::error::Error as StdError;
use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DispatchError>;

/// Status code reported when the deadline expires.
pub const REQUEST_TIMEOUT: u16 = 408;

/// Status code reported for transport and internal failures.
pub const SERVER_ERROR: u16 = 500;

/// Status code reported when a required credential is absent.
pub const UNAUTHORIZED: u16 = 401;

#[derive(Debug, Error)]
pub enum DispatchError {
    /// The endpoint requires auth and neither an override token nor a stored
    /// access token is available.
    #[error("authorization token is missing")]
    MissingCredential,

    /// The endpoint description cannot produce a request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The structured request body could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The deadline expired before the response body was read.
    #[error("the request timed out")]
    Timeout(Duration),

    /// Connection or protocol level failure.
    #[error("{0}")]
    Transport(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// A 2xx body could not be decoded into the requested type.
    #[error("deserialization failed: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("{0}")]
    Unexpected(String),
}

impl DispatchError {
    /// Status code recorded in the envelope for this failure.
    pub fn status_code(&self) -> u16 {
        match self {
            DispatchError::MissingCredential => UNAUTHORIZED,
            DispatchError::Timeout(_) => REQUEST_TIMEOUT,
            DispatchError::Status { status, .. } => *status,
            DispatchError::InvalidRequest(_)
            | DispatchError::Serialization(_)
            | DispatchError::Transport(_)
            | DispatchError::Decode(_)
            | DispatchError::Unexpected(_) => SERVER_ERROR,
        }
    }

    /// Message recorded in the envelope for this failure.
    ///
    /// Non-2xx responses surface the raw body rather than the formatted
    /// `Display` output.
    pub fn envelope_message(&self) -> String {
        match self {
            DispatchError::Status { body, .. } => body.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, DispatchError::Timeout(_))
    }

    /// Classify a `reqwest` failure, walking its source chain so the message
    /// carries the underlying cause (DNS, refused connection, TLS).
    pub(crate) fn from_transport(err: reqwest::Error, deadline: Duration) -> Self {
        if err.is_timeout() {
            return DispatchError::Timeout(deadline);
        }
        let mut message = err.to_string();
        let mut source = StdError::source(&err);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = StdError::source(cause);
        }
        DispatchError::Transport(message)
    }
}
