//! Sends one request per call under a deadline and folds the outcome into a
//! [`ResponseEnvelope`].
//!
//! # Design
//! `Dispatcher` owns a single `reqwest::Client` (connection reuse is the
//! client's business) plus the credential holder and the two ports. `send`
//! never returns an error: build failures, deadline expiry and transport
//! faults all become failed envelopes. The deadline wraps both the send and
//! the body read with `tokio::time::timeout`; when it fires the `reqwest`
//! future is dropped, which aborts the in-flight request.
//!
//! There is exactly one network attempt per call. Token refresh is a
//! separate operation ([`Dispatcher::refresh_tokens`]) and is never
//! triggered by `send`.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::Instrument;
use uuid::Uuid;

use crate::builder::{build_request, resolve_url};
use crate::config::{EndpointConfig, FeedbackConfig, SendOverride};
use crate::credentials::{Credentials, TokenPair};
use crate::envelope::ResponseEnvelope;
use crate::error::{DispatchError, Result};
use crate::http::ResolvedRequest;
use crate::ports::{
    call_port, FeedbackPort, LoadingGuard, LoggingPort, SilentFeedback, TracingLogger,
};

/// Status and body of a completed exchange.
struct RawResponse {
    status: u16,
    body: String,
}

#[derive(Clone)]
pub struct Dispatcher {
    client: reqwest::Client,
    credentials: Arc<Credentials>,
    feedback: Arc<dyn FeedbackPort>,
    logger: Arc<dyn LoggingPort>,
}

impl Dispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    pub fn credentials(&self) -> &Arc<Credentials> {
        &self.credentials
    }

    /// Send a request and decode a 2xx JSON body into `T`.
    pub async fn send<T: DeserializeOwned>(
        &self,
        config: &EndpointConfig,
        feedback: FeedbackConfig,
        overrides: &SendOverride,
    ) -> ResponseEnvelope<T> {
        self.dispatch(config, feedback, overrides, decode_json::<T>)
            .await
    }

    /// Send a request without decoding the response body.
    pub async fn send_untyped(
        &self,
        config: &EndpointConfig,
        feedback: FeedbackConfig,
        overrides: &SendOverride,
    ) -> ResponseEnvelope<()> {
        self.dispatch(config, feedback, overrides, |_| Ok(None)).await
    }

    async fn dispatch<T, D>(
        &self,
        config: &EndpointConfig,
        feedback: FeedbackConfig,
        overrides: &SendOverride,
        decode: D,
    ) -> ResponseEnvelope<T>
    where
        D: FnOnce(&str) -> Result<Option<T>>,
    {
        let request_id = Uuid::new_v4();
        let span = tracing::debug_span!(
            "dispatch",
            %request_id,
            method = %config.method(),
            path = config.path(),
        );

        async {
            let request = match build_request(config, overrides, &self.credentials) {
                Ok(request) => request,
                Err(err) => {
                    tracing::debug!(error = %err, "request not sent");
                    let envelope = ResponseEnvelope::from_error(&err);
                    self.notify(&resolve_url(config, overrides), &envelope);
                    return envelope;
                }
            };

            call_port("log_request", || self.logger.log_request(&request.url));
            let outcome = {
                let _loading = feedback
                    .show_loading
                    .then(|| LoadingGuard::show(self.feedback.as_ref()));
                self.execute(&request, config.timeout()).await
            };

            let envelope = match outcome {
                Ok(raw) => classify(raw, decode),
                Err(err) => ResponseEnvelope::from_error(&err),
            };
            self.notify(&request.url, &envelope);
            envelope
        }
        .instrument(span)
        .await
    }

    /// Exchange the stored refresh token for a new token pair and store it.
    ///
    /// `config` describes the refresh endpoint; its default headers, path
    /// and timeout apply, auth settings are ignored. The refresh token is
    /// sent in the `X-Refresh-Token` header.
    pub async fn refresh_tokens(&self, config: &EndpointConfig) -> Result<TokenPair> {
        let (key, value) = self
            .credentials
            .refresh_header()
            .ok_or(DispatchError::MissingCredential)?;
        let overrides = SendOverride::new().header(key, value);
        let request = build_request(&without_auth(config), &overrides, &Credentials::new())?;

        let raw = self.execute(&request, config.timeout()).await?;
        if !(200..300).contains(&raw.status) {
            tracing::warn!(status = raw.status, "token refresh rejected");
            return Err(DispatchError::Status {
                status: raw.status,
                body: raw.body,
            });
        }
        let pair: TokenPair = serde_json::from_str(&raw.body).map_err(DispatchError::Decode)?;
        self.credentials.set_tokens(&pair);
        tracing::debug!("tokens refreshed");
        Ok(pair)
    }

    async fn execute(&self, request: &ResolvedRequest, deadline: Duration) -> Result<RawResponse> {
        let mut builder = self
            .client
            .request(request.method.into(), request.url.as_str());
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let exchange = async {
            let response = builder.send().await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>(RawResponse { status, body })
        };

        match tokio::time::timeout(deadline, exchange).await {
            Ok(Ok(raw)) => Ok(raw),
            Ok(Err(err)) => Err(DispatchError::from_transport(err, deadline)),
            Err(_) => {
                tracing::debug!(?deadline, "deadline expired");
                Err(DispatchError::Timeout(deadline))
            }
        }
    }

    /// Report the final envelope to both ports. A panicking port is logged
    /// and otherwise ignored.
    fn notify<T>(&self, url: &str, envelope: &ResponseEnvelope<T>) {
        let status = envelope.status();
        call_port("log_response", || self.logger.log_response(status, url));
        call_port("show_message", || self.feedback.show_message(status));
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

fn classify<T, D>(raw: RawResponse, decode: D) -> ResponseEnvelope<T>
where
    D: FnOnce(&str) -> Result<Option<T>>,
{
    if !(200..300).contains(&raw.status) {
        return ResponseEnvelope::failure(raw.status, raw.body);
    }
    match decode(&raw.body) {
        Ok(data) => ResponseEnvelope::success(raw.status, data),
        Err(err) => ResponseEnvelope::from_error(&err),
    }
}

fn decode_json<T: DeserializeOwned>(body: &str) -> Result<Option<T>> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(body)
        .map(Some)
        .map_err(DispatchError::Decode)
}

fn without_auth(config: &EndpointConfig) -> EndpointConfig {
    let mut builder = EndpointConfig::builder(config.method(), config.path())
        .headers(config.default_headers().clone())
        .timeout(config.timeout());
    if let Some(base) = config.base_url() {
        builder = builder.base_url(base);
    }
    builder.build()
}

/// Builder for [`Dispatcher`].
#[derive(Default)]
pub struct DispatcherBuilder {
    client: Option<reqwest::Client>,
    credentials: Option<Arc<Credentials>>,
    feedback: Option<Arc<dyn FeedbackPort>>,
    logger: Option<Arc<dyn LoggingPort>>,
}

impl DispatcherBuilder {
    /// Use an existing client instead of building a default one.
    pub fn client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn credentials(mut self, credentials: Arc<Credentials>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn feedback(mut self, feedback: Arc<dyn FeedbackPort>) -> Self {
        self.feedback = Some(feedback);
        self
    }

    pub fn logger(mut self, logger: Arc<dyn LoggingPort>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn build(self) -> Result<Dispatcher> {
        let client = match self.client {
            Some(client) => client,
            None => reqwest::Client::builder()
                .build()
                .map_err(|e| {
                    DispatchError::Unexpected(format!("failed to build HTTP client: {e}"))
                })?,
        };
        Ok(Dispatcher {
            client,
            credentials: self.credentials.unwrap_or_default(),
            feedback: self.feedback.unwrap_or_else(|| Arc::new(SilentFeedback)),
            logger: self.logger.unwrap_or_else(|| Arc::new(TracingLogger)),
        })
    }
}
