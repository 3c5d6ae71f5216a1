//! Declarative HTTP request dispatcher.
//!
//! # Overview
//! An [`EndpointConfig`] describes a reusable endpoint (URL, method, default
//! headers, auth policy, timeout). Each call layers a [`SendOverride`] on
//! top, the builder turns both into a [`ResolvedRequest`], and the
//! [`Dispatcher`] sends it under the endpoint's deadline and hands back a
//! [`ResponseEnvelope`].
//!
//! # Design
//! - Dispatch never returns `Err`: every failure is folded into the
//!   envelope, and callers branch on `is_successful`.
//! - Request building is pure and separately callable, so merge rules are
//!   testable without a network.
//! - Credentials, feedback and logging are injected at construction; there
//!   is no global state.
//! - One network attempt per call. Token refresh is an explicit operation.

pub mod builder;
pub mod catalog;
pub mod config;
pub mod credentials;
pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod http;
pub mod ports;
pub mod registry;

pub use builder::{build_request, resolve_url};
pub use catalog::{Catalog, CatalogError};
pub use config::{EndpointConfig, EndpointConfigBuilder, FeedbackConfig, HeaderSet, SendOverride};
pub use credentials::{CredentialStore, Credentials, MemoryStore, TokenPair};
pub use dispatcher::{Dispatcher, DispatcherBuilder};
pub use envelope::{EnvelopeStatus, ResponseEnvelope};
pub use error::DispatchError;
pub use http::{join_url, HttpMethod, ResolvedRequest};
pub use ports::{FeedbackPort, LoggingPort, SilentFeedback, TracingLogger};
pub use registry::{Registry, RegistryError};
