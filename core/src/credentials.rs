//! Access/refresh token holder.
//!
//! # Design
//! `Credentials` is an explicitly-owned value shared through `Arc` rather than
//! process-wide state. Tokens live behind a `parking_lot::RwLock` because
//! every authenticated dispatch reads them while writes only happen on
//! login, refresh and logout. An optional [`CredentialStore`] mirrors every
//! write so tokens survive restarts; how it persists is up to the
//! implementation.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::http::{AUTHORIZATION_HEADER, REFRESH_TOKEN_HEADER};

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Key/value persistence for tokens.
pub trait CredentialStore: Send + Sync {
    fn load(&self, key: &str) -> Option<String>;
    fn save(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-process [`CredentialStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryStore {
    fn load(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    fn save(&self, key: &str, value: &str) {
        self.values.lock().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.values.lock().remove(key);
    }
}

/// Access/refresh token pair returned by a refresh endpoint.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    #[serde(alias = "AccessToken", alias = "access_token")]
    pub access_token: String,
    #[serde(alias = "RefreshToken", alias = "refresh_token")]
    pub refresh_token: String,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair").finish_non_exhaustive()
    }
}

#[derive(Default)]
struct Tokens {
    access: Option<String>,
    refresh: Option<String>,
}

pub struct Credentials {
    tokens: RwLock<Tokens>,
    store: Option<Arc<dyn CredentialStore>>,
}

impl Credentials {
    /// Empty credentials with no persistence.
    pub fn new() -> Self {
        Self {
            tokens: RwLock::new(Tokens::default()),
            store: None,
        }
    }

    /// Credentials backed by `store`, seeded from whatever it holds.
    pub fn with_store(store: Arc<dyn CredentialStore>) -> Self {
        let tokens = Tokens {
            access: store.load(ACCESS_TOKEN_KEY).filter(|t| !t.is_empty()),
            refresh: store.load(REFRESH_TOKEN_KEY).filter(|t| !t.is_empty()),
        };
        Self {
            tokens: RwLock::new(tokens),
            store: Some(store),
        }
    }

    pub fn access_token(&self) -> Option<String> {
        self.tokens.read().access.clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.tokens.read().refresh.clone()
    }

    // Writers persist while holding the write lock so the store and memory
    // always agree on the last value.

    pub fn set_access_token(&self, token: impl Into<String>) {
        let token = token.into();
        let mut tokens = self.tokens.write();
        self.persist(ACCESS_TOKEN_KEY, &token);
        tokens.access = Some(token).filter(|t| !t.is_empty());
    }

    pub fn set_refresh_token(&self, token: impl Into<String>) {
        let token = token.into();
        let mut tokens = self.tokens.write();
        self.persist(REFRESH_TOKEN_KEY, &token);
        tokens.refresh = Some(token).filter(|t| !t.is_empty());
    }

    /// Replace both tokens in one step; readers never see a mixed pair.
    pub fn set_tokens(&self, pair: &TokenPair) {
        let mut tokens = self.tokens.write();
        self.persist(ACCESS_TOKEN_KEY, &pair.access_token);
        self.persist(REFRESH_TOKEN_KEY, &pair.refresh_token);
        tokens.access = Some(pair.access_token.clone()).filter(|t| !t.is_empty());
        tokens.refresh = Some(pair.refresh_token.clone()).filter(|t| !t.is_empty());
    }

    pub fn clear_access_token(&self) {
        let mut tokens = self.tokens.write();
        self.forget(ACCESS_TOKEN_KEY);
        tokens.access = None;
    }

    /// Drop both tokens (logout).
    pub fn clear(&self) {
        let mut tokens = self.tokens.write();
        self.forget(ACCESS_TOKEN_KEY);
        self.forget(REFRESH_TOKEN_KEY);
        *tokens = Tokens::default();
    }

    /// `Authorization` header for the stored access token, if any.
    pub fn authorization_header(&self, use_bearer_prefix: bool) -> Option<(&'static str, String)> {
        self.access_token()
            .map(|token| (AUTHORIZATION_HEADER, authorization_value(&token, use_bearer_prefix)))
    }

    /// Header carrying the stored refresh token, if any.
    pub fn refresh_header(&self) -> Option<(&'static str, String)> {
        self.refresh_token().map(|token| (REFRESH_TOKEN_HEADER, token))
    }

    fn persist(&self, key: &str, value: &str) {
        if let Some(store) = &self.store {
            store.save(key, value);
        }
    }

    fn forget(&self, key: &str) {
        if let Some(store) = &self.store {
            store.remove(key);
        }
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tokens = self.tokens.read();
        f.debug_struct("Credentials")
            .field("has_access_token", &tokens.access.is_some())
            .field("has_refresh_token", &tokens.refresh.is_some())
            .field("persistent", &self.store.is_some())
            .finish()
    }
}

/// Value of the `Authorization` header for `token`.
pub fn authorization_value(token: &str, use_bearer_prefix: bool) -> String {
    if use_bearer_prefix {
        format!("Bearer {token}")
    } else {
        token.to_string()
    }
}
