//! JSON endpoint catalog.
//!
//! # Design
//! A catalog document holds three tables: named base URLs, named header
//! sets and named endpoints that reference both. Keeping base URLs separate
//! lets one switch (staging vs production) retarget every endpoint through
//! [`Catalog::set_base_url`]. References are checked when the document is
//! loaded so a bad catalog fails at startup rather than on first send.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{EndpointConfig, HeaderSet, DEFAULT_TIMEOUT};
use crate::http::HttpMethod;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unknown endpoint '{0}'")]
    UnknownEndpoint(String),

    #[error("unknown base URL '{0}'")]
    UnknownBaseUrl(String),

    #[error("endpoint '{endpoint}' references unknown {kind} '{name}'")]
    DanglingReference {
        endpoint: String,
        kind: &'static str,
        name: String,
    },

    #[error("header set '{0}' contains an empty key or value")]
    EmptyHeaderParam(String),

    #[error("endpoint '{0}' has a zero timeout")]
    ZeroTimeout(String),
}

/// One endpoint entry as written in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointEntry {
    #[serde(default)]
    pub base_url: Option<String>,
    pub path: String,
    pub method: HttpMethod,
    #[serde(default)]
    pub headers: Option<String>,
    #[serde(default)]
    pub requires_auth: bool,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_true")]
    pub use_bearer_prefix: bool,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT.as_millis() as u64
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    base_urls: BTreeMap<String, String>,
    #[serde(default)]
    header_sets: BTreeMap<String, HeaderSet>,
    #[serde(default)]
    endpoints: BTreeMap<String, EndpointEntry>,
}

impl Catalog {
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&json)?;
        tracing::debug!(
            path = %path.display(),
            endpoints = catalog.endpoints.len(),
            "loaded endpoint catalog"
        );
        Ok(catalog)
    }

    /// Point a named base URL somewhere else. Every endpoint referencing it
    /// picks up the new value on its next [`Catalog::endpoint`] call.
    pub fn set_base_url(&mut self, name: &str, url: impl Into<String>) -> Result<(), CatalogError> {
        let slot = self
            .base_urls
            .get_mut(name)
            .ok_or_else(|| CatalogError::UnknownBaseUrl(name.to_string()))?;
        *slot = url.into();
        Ok(())
    }

    pub fn base_url(&self, name: &str) -> Option<&str> {
        self.base_urls.get(name).map(String::as_str)
    }

    pub fn endpoint_names(&self) -> impl Iterator<Item = &str> {
        self.endpoints.keys().map(String::as_str)
    }

    /// Resolve a named endpoint into an [`EndpointConfig`].
    pub fn endpoint(&self, name: &str) -> Result<EndpointConfig, CatalogError> {
        let entry = self
            .endpoints
            .get(name)
            .ok_or_else(|| CatalogError::UnknownEndpoint(name.to_string()))?;

        let mut builder = EndpointConfig::builder(entry.method, entry.path.clone())
            .requires_auth(entry.requires_auth)
            .timeout_ms(entry.timeout_ms)
            .use_bearer_prefix(entry.use_bearer_prefix);

        if let Some(base) = &entry.base_url {
            let url = self.base_urls.get(base).ok_or_else(|| dangling(name, "base URL", base))?;
            builder = builder.base_url(url.clone());
        }
        if let Some(set) = &entry.headers {
            let headers = self
                .header_sets
                .get(set)
                .ok_or_else(|| dangling(name, "header set", set))?;
            builder = builder.headers(headers.clone());
        }
        Ok(builder.build())
    }

    fn validate(&self) -> Result<(), CatalogError> {
        for (name, set) in &self.header_sets {
            if set.has_empty_params() {
                return Err(CatalogError::EmptyHeaderParam(name.clone()));
            }
        }
        for (name, entry) in &self.endpoints {
            if entry.timeout_ms == 0 {
                return Err(CatalogError::ZeroTimeout(name.clone()));
            }
            if let Some(base) = &entry.base_url {
                if !self.base_urls.contains_key(base) {
                    return Err(dangling(name, "base URL", base));
                }
            }
            if let Some(set) = &entry.headers {
                if !self.header_sets.contains_key(set) {
                    return Err(dangling(name, "header set", set));
                }
            }
        }
        Ok(())
    }
}

fn dangling(endpoint: &str, kind: &'static str, name: &str) -> CatalogError {
    CatalogError::DanglingReference {
        endpoint: endpoint.to_string(),
        kind,
        name: name.to_string(),
    }
}
