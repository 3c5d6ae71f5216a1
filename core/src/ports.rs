//! Collaborator interfaces invoked by the dispatcher.
//!
//! # Design
//! Presentation (loading indicators, result messages) and request logging
//! live outside the core. The dispatcher only sees these two narrow traits;
//! `SilentFeedback` and `TracingLogger` are the defaults for headless use.

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::envelope::EnvelopeStatus;

/// Loading-state and message presentation.
///
/// Calls are synchronous and made from the dispatching task, so
/// implementations must return promptly.
pub trait FeedbackPort: Send + Sync {
    fn show_loading(&self) {}

    fn hide_loading(&self) {}

    fn show_message(&self, _status: EnvelopeStatus<'_>) {}
}

/// Request/response logging sink.
pub trait LoggingPort: Send + Sync {
    fn log_request(&self, url: &str);

    fn log_response(&self, status: EnvelopeStatus<'_>, url: &str);
}

/// [`FeedbackPort`] that presents nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentFeedback;

impl FeedbackPort for SilentFeedback {}

/// [`LoggingPort`] that emits `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl LoggingPort for TracingLogger {
    fn log_request(&self, url: &str) {
        tracing::debug!(%url, "sending request");
    }

    fn log_response(&self, status: EnvelopeStatus<'_>, url: &str) {
        if status.is_successful {
            tracing::debug!(%url, status = status.status_code, "request succeeded");
        } else {
            tracing::warn!(
                %url,
                status = status.status_code,
                error = status.error_message.unwrap_or_default(),
                "request failed"
            );
        }
    }
}

/// Run a single port call. A panic inside the port is logged and dropped
/// so it never reaches the caller of `send`.
pub(crate) fn call_port(hook: &'static str, call: impl FnOnce()) {
    if catch_unwind(AssertUnwindSafe(call)).is_err() {
        tracing::warn!(hook, "port panicked");
    }
}

/// Calls `hide_loading` when dropped.
///
/// Created right before the send so that every exit path, including the
/// caller dropping the dispatch future, pairs `show_loading` with exactly
/// one `hide_loading`. The pairing holds even when `show_loading` panics.
pub(crate) struct LoadingGuard<'a> {
    port: &'a dyn FeedbackPort,
}

impl<'a> LoadingGuard<'a> {
    pub(crate) fn show(port: &'a dyn FeedbackPort) -> Self {
        call_port("show_loading", || port.show_loading());
        Self { port }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        call_port("hide_loading", || self.port.hide_loading());
    }
}
