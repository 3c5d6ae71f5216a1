//! Uniform result type returned by every dispatch.

use serde::Serialize;

use crate::error::DispatchError;

/// Outcome of one dispatch.
///
/// Only constructible through [`ResponseEnvelope::success`],
/// [`ResponseEnvelope::failure`] and [`ResponseEnvelope::from_error`], so a
/// successful envelope never carries an error message and a failed one never
/// carries data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope<T> {
    is_successful: bool,
    status_code: u16,
    error_message: Option<String>,
    data: Option<T>,
}

/// Borrowed, payload-free view of an envelope handed to the ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopeStatus<'a> {
    pub is_successful: bool,
    pub status_code: u16,
    pub error_message: Option<&'a str>,
}

impl<T> ResponseEnvelope<T> {
    pub fn success(status_code: u16, data: Option<T>) -> Self {
        Self {
            is_successful: true,
            status_code,
            error_message: None,
            data,
        }
    }

    pub fn failure(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            is_successful: false,
            status_code,
            error_message: Some(message.into()),
            data: None,
        }
    }

    pub fn from_error(err: &DispatchError) -> Self {
        Self::failure(err.status_code(), err.envelope_message())
    }

    pub fn is_successful(&self) -> bool {
        self.is_successful
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }

    pub fn status(&self) -> EnvelopeStatus<'_> {
        EnvelopeStatus {
            is_successful: self.is_successful,
            status_code: self.status_code,
            error_message: self.error_message.as_deref(),
        }
    }

    /// Convert into a `Result` for callers that prefer `?`.
    ///
    /// Failures come back as [`DispatchError::Status`] carrying the recorded
    /// status and message.
    pub fn into_result(self) -> Result<Option<T>, DispatchError> {
        if self.is_successful {
            Ok(self.data)
        } else {
            Err(DispatchError::Status {
                status: self.status_code,
                body: self.error_message.unwrap_or_default(),
            })
        }
    }
}
