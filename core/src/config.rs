//! Endpoint descriptions and per-call overrides.
//!
//! # Design
//! `EndpointConfig` is reusable and immutable: fields are private and the
//! value is assembled once through [`EndpointConfigBuilder`]. `SendOverride`
//! is the ephemeral per-call counterpart and is built with chained setters.
//! Both are consumed by reference so one endpoint can serve many calls.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::http::{HttpMethod, CONTENT_TYPE_HEADER};

/// Timeout applied when an endpoint does not specify one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Ordered header list, unique by case-insensitive key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<HeaderParam>", into = "Vec<HeaderParam>")]
pub struct HeaderSet {
    entries: Vec<(String, String)>,
}

/// Serialized form of one header entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderParam {
    pub key: String,
    pub value: String,
}

impl HeaderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Content-Type: application/json` and `Accept: application/json`.
    pub fn with_json_defaults() -> Self {
        let mut set = Self::new();
        set.add(CONTENT_TYPE_HEADER, "application/json");
        set.add("Accept", "application/json");
        set
    }

    /// Add an entry unless the key is already present. Returns whether the
    /// entry was added.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        if self.position(&key).is_some() {
            return false;
        }
        self.entries.push((key, value.into()));
        true
    }

    /// Add an entry, replacing the value of an existing key in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.position(&key) {
            Some(idx) => self.entries[idx].1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.position(key).map(|idx| self.entries[idx].1.as_str())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.position(key).map(|idx| self.entries.remove(idx).1)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Whether any entry has an empty key or value.
    pub fn has_empty_params(&self) -> bool {
        self.entries
            .iter()
            .any(|(k, v)| k.trim().is_empty() || v.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(key))
    }
}

impl From<Vec<HeaderParam>> for HeaderSet {
    fn from(params: Vec<HeaderParam>) -> Self {
        let mut set = HeaderSet::new();
        for param in params {
            set.add(param.key, param.value);
        }
        set
    }
}

impl From<HeaderSet> for Vec<HeaderParam> {
    fn from(set: HeaderSet) -> Self {
        set.entries
            .into_iter()
            .map(|(key, value)| HeaderParam { key, value })
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HeaderSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = HeaderSet::new();
        for (k, v) in iter {
            set.add(k, v);
        }
        set
    }
}

/// Reusable, immutable description of one endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    base_url: Option<String>,
    path: String,
    method: HttpMethod,
    default_headers: HeaderSet,
    requires_auth: bool,
    timeout: Duration,
    use_bearer_prefix: bool,
}

impl EndpointConfig {
    pub fn builder(method: HttpMethod, path: impl Into<String>) -> EndpointConfigBuilder {
        EndpointConfigBuilder {
            config: EndpointConfig {
                base_url: None,
                path: path.into(),
                method,
                default_headers: HeaderSet::new(),
                requires_auth: false,
                timeout: DEFAULT_TIMEOUT,
                use_bearer_prefix: true,
            },
        }
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn default_headers(&self) -> &HeaderSet {
        &self.default_headers
    }

    pub fn requires_auth(&self) -> bool {
        self.requires_auth
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn use_bearer_prefix(&self) -> bool {
        self.use_bearer_prefix
    }
}

/// Builder for [`EndpointConfig`].
#[derive(Debug, Clone)]
pub struct EndpointConfigBuilder {
    config: EndpointConfig,
}

impl EndpointConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    /// Add a default header. The first value for a key wins.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.add(key, value);
        self
    }

    pub fn headers(mut self, headers: HeaderSet) -> Self {
        self.config.default_headers = headers;
        self
    }

    pub fn requires_auth(mut self, requires_auth: bool) -> Self {
        self.config.requires_auth = requires_auth;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn timeout_ms(self, millis: u64) -> Self {
        self.timeout(Duration::from_millis(millis))
    }

    pub fn use_bearer_prefix(mut self, use_prefix: bool) -> Self {
        self.config.use_bearer_prefix = use_prefix;
        self
    }

    pub fn build(self) -> EndpointConfig {
        self.config
    }
}

/// Per-call adjustments layered over an [`EndpointConfig`].
#[derive(Debug, Clone, Default)]
pub struct SendOverride {
    pub path_suffix: Option<String>,
    pub extra_headers: HeaderSet,
    pub raw_body: Option<String>,
    pub json_body: Option<serde_json::Value>,
    pub bearer_token: Option<String>,
}

impl SendOverride {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.path_suffix = Some(suffix.into());
        self
    }

    /// Add or replace a header for this call only.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(key, value);
        self
    }

    /// Already-serialized body, sent verbatim.
    pub fn raw_body(mut self, body: impl Into<String>) -> Self {
        self.raw_body = Some(body.into());
        self
    }

    /// Structured body, serialized to JSON when the request is built.
    pub fn json_body(mut self, body: serde_json::Value) -> Self {
        self.json_body = Some(body);
        self
    }

    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn has_body(&self) -> bool {
        self.raw_body.as_deref().is_some_and(|b| !b.is_empty()) || self.json_body.is_some()
    }
}

/// Per-call presentation options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedbackConfig {
    pub show_loading: bool,
}

impl FeedbackConfig {
    pub fn silent() -> Self {
        Self {
            show_loading: false,
        }
    }

    pub fn loading() -> Self {
        Self { show_loading: true }
    }
}
