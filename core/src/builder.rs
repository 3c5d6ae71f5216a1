//! Turns an endpoint description plus a per-call override into a
//! [`ResolvedRequest`].
//!
//! # Design
//! The builder is pure: it reads the credentials but performs no I/O, so
//! every merge rule can be asserted on plain data. The rules, in order:
//!
//! - URL: base URL and path joined with one slash, then the path suffix
//!   joined the same way.
//! - Headers: defaults, with override headers layered on top. `Content-Type`
//!   is held back from both and only emitted alongside a body.
//! - Auth: override token, else stored access token, else
//!   `MissingCredential`.
//! - Body: only for POST/PUT/PATCH; a raw body wins over a JSON body.

use crate::config::{EndpointConfig, HeaderSet, SendOverride};
use crate::credentials::{authorization_value, Credentials};
use crate::error::{DispatchError, Result};
use crate::http::{join_url, ResolvedRequest, AUTHORIZATION_HEADER, CONTENT_TYPE_HEADER};

pub fn build_request(
    config: &EndpointConfig,
    overrides: &SendOverride,
    credentials: &Credentials,
) -> Result<ResolvedRequest> {
    let url = resolve_url(config, overrides);
    if url.trim().is_empty() {
        return Err(DispatchError::InvalidRequest(
            "endpoint has neither a base URL nor a path".to_string(),
        ));
    }
    if config.timeout().is_zero() {
        return Err(DispatchError::InvalidRequest(
            "endpoint timeout must be positive".to_string(),
        ));
    }

    let mut headers = merge_headers(config.default_headers(), &overrides.extra_headers);

    if config.requires_auth() {
        let token = resolve_token(overrides, credentials)?;
        headers.insert(
            AUTHORIZATION_HEADER,
            authorization_value(&token, config.use_bearer_prefix()),
        );
    }

    let body = if config.method().allows_body() {
        request_body(overrides)?
    } else {
        None
    };

    if body.is_some() {
        let content_type = overrides
            .extra_headers
            .get(CONTENT_TYPE_HEADER)
            .or_else(|| config.default_headers().get(CONTENT_TYPE_HEADER));
        if let Some(content_type) = content_type {
            headers.insert(CONTENT_TYPE_HEADER, content_type);
        }
    }

    Ok(ResolvedRequest {
        method: config.method(),
        url,
        headers: headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        body,
    })
}

/// Full URL for `config` with the override's path suffix applied.
pub fn resolve_url(config: &EndpointConfig, overrides: &SendOverride) -> String {
    let url = match config.base_url() {
        Some(base) => join_url(base, config.path()),
        None => config.path().to_string(),
    };
    match overrides.path_suffix.as_deref() {
        Some(suffix) => join_url(&url, suffix),
        None => url,
    }
}

fn merge_headers(defaults: &HeaderSet, extra: &HeaderSet) -> HeaderSet {
    let mut merged = HeaderSet::new();
    for (key, value) in defaults.iter() {
        if !key.eq_ignore_ascii_case(CONTENT_TYPE_HEADER) {
            merged.add(key, value);
        }
    }
    for (key, value) in extra.iter() {
        if !key.eq_ignore_ascii_case(CONTENT_TYPE_HEADER) {
            merged.insert(key, value);
        }
    }
    merged
}

fn resolve_token(overrides: &SendOverride, credentials: &Credentials) -> Result<String> {
    if let Some(token) = overrides.bearer_token.as_deref().filter(|t| !t.is_empty()) {
        return Ok(token.to_string());
    }
    credentials
        .access_token()
        .filter(|t| !t.is_empty())
        .ok_or(DispatchError::MissingCredential)
}

fn request_body(overrides: &SendOverride) -> Result<Option<String>> {
    if let Some(raw) = overrides.raw_body.as_deref().filter(|b| !b.is_empty()) {
        return Ok(Some(raw.to_string()));
    }
    overrides
        .json_body
        .as_ref()
        .map(|value| serde_json::to_string(value).map_err(DispatchError::Serialization))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;
    use serde_json::json;

    fn endpoint(method: HttpMethod) -> crate::config::EndpointConfigBuilder {
        EndpointConfig::builder(method, "/items").base_url("https://api.example.com/")
    }

    fn count(req: &ResolvedRequest, key: &str) -> usize {
        req.headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(key))
            .count()
    }

    #[test]
    fn joins_base_url_and_path() {
        let req = build_request(
            &endpoint(HttpMethod::Get).build(),
            &SendOverride::new(),
            &Credentials::new(),
        )
        .unwrap();
        assert_eq!(req.url, "https://api.example.com/items");
        assert_eq!(req.method, HttpMethod::Get);
        assert!(req.body.is_none());
    }

    #[test]
    fn path_without_base_url_is_used_verbatim() {
        let config = EndpointConfig::builder(HttpMethod::Get, "https://a.com/p").build();
        let req = build_request(&config, &SendOverride::new(), &Credentials::new()).unwrap();
        assert_eq!(req.url, "https://a.com/p");
    }

    #[test]
    fn path_suffix_joined_with_single_slash() {
        let config = endpoint(HttpMethod::Get).build();
        for suffix in ["42", "/42", "42/", "/42/"] {
            let req = build_request(
                &config,
                &SendOverride::new().path_suffix(suffix),
                &Credentials::new(),
            )
            .unwrap();
            assert!(req.url.starts_with("https://api.example.com/items/42"), "{suffix}");
            assert!(!req.url["https://".len()..].contains("//"), "{suffix}");
        }
    }

    #[test]
    fn query_suffix_is_appended_verbatim() {
        let req = build_request(
            &endpoint(HttpMethod::Get).build(),
            &SendOverride::new().path_suffix("?page=2&size=10"),
            &Credentials::new(),
        )
        .unwrap();
        assert_eq!(req.url, "https://api.example.com/items?page=2&size=10");
    }

    #[test]
    fn empty_url_is_rejected() {
        let config = EndpointConfig::builder(HttpMethod::Get, "").build();
        let err = build_request(&config, &SendOverride::new(), &Credentials::new()).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidRequest(_)));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = endpoint(HttpMethod::Get).timeout_ms(0).build();
        let err = build_request(&config, &SendOverride::new(), &Credentials::new()).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidRequest(_)));
    }

    #[test]
    fn override_header_wins_on_collision() {
        let config = endpoint(HttpMethod::Get)
            .header("Accept", "text/plain")
            .header("X-Client", "core")
            .build();
        let req = build_request(
            &config,
            &SendOverride::new().header("accept", "application/json"),
            &Credentials::new(),
        )
        .unwrap();
        assert_eq!(count(&req, "accept"), 1);
        assert_eq!(req.header("Accept"), Some("application/json"));
        assert_eq!(req.header("X-Client"), Some("core"));
    }

    #[test]
    fn content_type_dropped_without_body() {
        let config = endpoint(HttpMethod::Get)
            .headers(crate::config::HeaderSet::with_json_defaults())
            .build();
        let req = build_request(&config, &SendOverride::new(), &Credentials::new()).unwrap();
        assert_eq!(count(&req, "content-type"), 0);
        assert_eq!(req.header("accept"), Some("application/json"));
    }

    #[test]
    fn json_body_serialized_with_single_content_type() {
        let config = endpoint(HttpMethod::Post)
            .header("Content-Type", "application/json")
            .build();
        let req = build_request(
            &config,
            &SendOverride::new().json_body(json!({"key": "value"})),
            &Credentials::new(),
        )
        .unwrap();
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"key": "value"}));
        assert_eq!(count(&req, "content-type"), 1);
        assert_eq!(req.header("content-type"), Some("application/json"));
    }

    #[test]
    fn raw_body_takes_precedence() {
        let config = endpoint(HttpMethod::Put).build();
        let req = build_request(
            &config,
            &SendOverride::new()
                .raw_body("a=1&b=2")
                .json_body(json!({"ignored": true})),
            &Credentials::new(),
        )
        .unwrap();
        assert_eq!(req.body.as_deref(), Some("a=1&b=2"));
        assert_eq!(count(&req, "content-type"), 0);
    }

    #[test]
    fn override_content_type_used_for_body() {
        let config = endpoint(HttpMethod::Patch)
            .header("Content-Type", "application/json")
            .build();
        let req = build_request(
            &config,
            &SendOverride::new()
                .header("content-type", "text/plain")
                .raw_body("hi"),
            &Credentials::new(),
        )
        .unwrap();
        assert_eq!(count(&req, "content-type"), 1);
        assert_eq!(req.header("Content-Type"), Some("text/plain"));
    }

    #[test]
    fn body_ignored_for_get_and_delete() {
        for method in [HttpMethod::Get, HttpMethod::Delete, HttpMethod::Head] {
            let config = endpoint(method).header("Content-Type", "application/json").build();
            let req = build_request(
                &config,
                &SendOverride::new().json_body(json!({"key": "value"})),
                &Credentials::new(),
            )
            .unwrap();
            assert!(req.body.is_none(), "{method}");
            assert_eq!(count(&req, "content-type"), 0, "{method}");
        }
    }

    #[test]
    fn auth_uses_stored_token_with_prefix() {
        let creds = Credentials::new();
        creds.set_access_token("stored");
        let config = endpoint(HttpMethod::Get).requires_auth(true).build();
        let req = build_request(&config, &SendOverride::new(), &creds).unwrap();
        assert_eq!(req.header("Authorization"), Some("Bearer stored"));
    }

    #[test]
    fn auth_override_token_wins() {
        let creds = Credentials::new();
        creds.set_access_token("stored");
        let config = endpoint(HttpMethod::Get)
            .requires_auth(true)
            .use_bearer_prefix(false)
            .build();
        let req = build_request(&config, &SendOverride::new().bearer_token("override"), &creds)
            .unwrap();
        assert_eq!(req.header("Authorization"), Some("override"));
        assert_eq!(count(&req, "authorization"), 1);
    }

    #[test]
    fn empty_override_token_falls_back_to_stored() {
        let creds = Credentials::new();
        creds.set_access_token("stored");
        let config = endpoint(HttpMethod::Get).requires_auth(true).build();
        let req = build_request(&config, &SendOverride::new().bearer_token(""), &creds).unwrap();
        assert_eq!(req.header("Authorization"), Some("Bearer stored"));
    }

    #[test]
    fn missing_token_fails() {
        let config = endpoint(HttpMethod::Get).requires_auth(true).build();
        let err = build_request(&config, &SendOverride::new(), &Credentials::new()).unwrap_err();
        assert!(matches!(err, DispatchError::MissingCredential));
    }

    #[test]
    fn no_auth_header_when_not_required() {
        let creds = Credentials::new();
        creds.set_access_token("stored");
        let config = endpoint(HttpMethod::Get).build();
        let req = build_request(&config, &SendOverride::new(), &creds).unwrap();
        assert!(req.header("Authorization").is_none());
    }
}
