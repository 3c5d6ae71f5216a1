//! Keyed collection of dispatchers.
//!
//! Each dispatcher carries its own feedback port, so an application that
//! presents requests differently (a blocking overlay vs a toast) registers
//! one dispatcher per presentation and picks by key.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::{EndpointConfig, FeedbackConfig, SendOverride};
use crate::dispatcher::Dispatcher;
use crate::envelope::ResponseEnvelope;
use crate::error::SERVER_ERROR;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("a dispatcher is already registered under '{0}'")]
    Duplicate(String),
}

#[derive(Debug, Default)]
pub struct Registry {
    dispatchers: RwLock<HashMap<String, Arc<Dispatcher>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &self,
        key: impl Into<String>,
        dispatcher: Dispatcher,
    ) -> Result<Arc<Dispatcher>, RegistryError> {
        let key = key.into();
        let mut dispatchers = self.dispatchers.write();
        if dispatchers.contains_key(&key) {
            tracing::warn!(%key, "dispatcher already registered");
            return Err(RegistryError::Duplicate(key));
        }
        let dispatcher = Arc::new(dispatcher);
        dispatchers.insert(key, dispatcher.clone());
        Ok(dispatcher)
    }

    pub fn get(&self, key: &str) -> Option<Arc<Dispatcher>> {
        self.dispatchers.read().get(key).cloned()
    }

    /// Return the dispatcher under `key`, registering `create()` first if
    /// there is none.
    pub fn get_or_register<E>(
        &self,
        key: &str,
        create: impl FnOnce() -> Result<Dispatcher, E>,
    ) -> Result<Arc<Dispatcher>, E> {
        if let Some(existing) = self.get(key) {
            return Ok(existing);
        }
        let mut dispatchers = self.dispatchers.write();
        if let Some(existing) = dispatchers.get(key) {
            return Ok(existing.clone());
        }
        let dispatcher = Arc::new(create()?);
        dispatchers.insert(key.to_string(), dispatcher.clone());
        Ok(dispatcher)
    }

    pub fn remove(&self, key: &str) -> Option<Arc<Dispatcher>> {
        self.dispatchers.write().remove(key)
    }

    pub fn len(&self) -> usize {
        self.dispatchers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.dispatchers.read().is_empty()
    }

    /// Typed send through the dispatcher registered under `key`. An unknown
    /// key yields a 500 envelope.
    pub async fn send<T: DeserializeOwned>(
        &self,
        key: &str,
        config: &EndpointConfig,
        feedback: FeedbackConfig,
        overrides: &SendOverride,
    ) -> ResponseEnvelope<T> {
        match self.get(key) {
            Some(dispatcher) => dispatcher.send(config, feedback, overrides).await,
            None => unknown_key(key),
        }
    }

    pub async fn send_untyped(
        &self,
        key: &str,
        config: &EndpointConfig,
        feedback: FeedbackConfig,
        overrides: &SendOverride,
    ) -> ResponseEnvelope<()> {
        match self.get(key) {
            Some(dispatcher) => dispatcher.send_untyped(config, feedback, overrides).await,
            None => unknown_key(key),
        }
    }
}

fn unknown_key<T>(key: &str) -> ResponseEnvelope<T> {
    tracing::warn!(%key, "no dispatcher registered");
    ResponseEnvelope::failure(SERVER_ERROR, format!("no dispatcher registered under '{key}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DispatchError;

    fn dispatcher() -> Dispatcher {
        Dispatcher::builder().build().unwrap()
    }

    #[test]
    fn register_rejects_duplicates() {
        let registry = Registry::new();
        registry.register("main", dispatcher()).unwrap();
        assert_eq!(
            registry.register("main", dispatcher()).unwrap_err(),
            RegistryError::Duplicate("main".to_string())
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn get_or_register_creates_once() {
        let registry = Registry::new();
        let first = registry
            .get_or_register("ui", || Ok::<_, DispatchError>(dispatcher()))
            .unwrap();
        let second = registry
            .get_or_register("ui", || -> Result<Dispatcher, DispatchError> {
                panic!("factory must not run for an existing key")
            })
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn remove_returns_dispatcher() {
        let registry = Registry::new();
        registry.register("a", dispatcher()).unwrap();
        assert!(registry.remove("a").is_some());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn unknown_key_yields_error_envelope() {
        let registry = Registry::new();
        let config = EndpointConfig::builder(crate::HttpMethod::Get, "http://127.0.0.1:9/").build();
        let env = registry
            .send_untyped("missing", &config, FeedbackConfig::silent(), &SendOverride::new())
            .await;
        assert!(!env.is_successful());
        assert_eq!(env.status_code(), 500);
        assert!(env.error_message().unwrap().contains("missing"));
    }
}
