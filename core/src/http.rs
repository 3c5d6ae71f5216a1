//! HTTP transport types shared by the request builder and the dispatcher.
//!
//! # Design
//! A `ResolvedRequest` describes an outgoing request as plain data: the
//! builder produces it without touching the network and the dispatcher
//! converts it into a `reqwest::Request` at send time. Keeping the
//! intermediate form as owned `String`/`Vec` values makes the builder
//! deterministic and lets tests assert on the exact header list.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Header key used for the access token.
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Header key used when exchanging a refresh token.
pub const REFRESH_TOKEN_HEADER: &str = "X-Refresh-Token";

pub const CONTENT_TYPE_HEADER: &str = "Content-Type";

/// HTTP method for an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
        }
    }

    /// Whether a request body is attached for this method.
    pub fn allows_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Head => reqwest::Method::HEAD,
        }
    }
}

/// A fully-formed request described as plain data.
///
/// Built by [`crate::build_request`]. `headers` already contains the
/// authorization header and, when `body` is set, at most one
/// `Content-Type` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl ResolvedRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

/// Join two URL fragments with exactly one `/` between them.
///
/// Empty fragments are passed through untouched so that a missing base URL
/// or an empty suffix never introduces a stray slash. A fragment starting
/// with `?` or `#` is a query or fragment and is appended as is.
pub fn join_url(base: &str, path: &str) -> String {
    if base.is_empty() {
        return path.to_string();
    }
    if path.is_empty() {
        return base.to_string();
    }
    if path.starts_with(['?', '#']) {
        return format!("{base}{path}");
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
