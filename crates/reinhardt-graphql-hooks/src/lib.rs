//! # Reinhardt GraphQL Hooks
//!
//! Query, lazy query and mutation hooks over a context-provided GraphQL
//! client.
//!
//! ## Module Organization
//!
//! - [`client`]: client collaborator traits and request types
//! - [`config`]: client configuration (TOML and environment)
//! - [`registry`]: memoized client construction per configuration
//! - [`context`]: context scopes and the client context
//! - [`provider`]: construct-or-reuse client provider
//! - [`resolution`]: client generators and the resolution strategy
//! - [`resource`]: reactive result slot
//! - [`hooks`]: `use_query`, `use_lazy_query` and `use_mutation`
//! - `testing` (feature `testing`): scripted in-memory client
//!
//! ## Example
//!
//! ```
//! use async_trait::async_trait;
//! use reinhardt_graphql_core::FetchResult;
//! use reinhardt_graphql_hooks::{
//!     ClientError, ClientGenerator, GraphQLClientProvider, OperationRequest, QueryOptions,
//!     RequestClient, RequestClientAdapter, Scope, use_query,
//! };
//! use serde_json::{json, Value};
//!
//! struct PingServer;
//!
//! #[async_trait]
//! impl RequestClient for PingServer {
//!     async fn request(&self, _request: OperationRequest) -> Result<FetchResult<Value>, ClientError> {
//!         Ok(FetchResult::ok(json!({ "ping": "pong" })))
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let provider = GraphQLClientProvider::new(ClientGenerator::new(|| async {
//!     Ok(RequestClientAdapter::new(PingServer).into_shared())
//! }));
//! let app = provider.provide(&Scope::root());
//! provider.init().await.unwrap();
//!
//! let handle = use_query::<Value, _>(&app, "query Ping { ping }", &(), QueryOptions::new());
//! assert_eq!(handle.resource().settled().await, Some(Ok(json!({ "ping": "pong" }))));
//! # }
//! ```

pub mod client;
pub mod config;
pub mod context;
pub mod hooks;
pub mod provider;
pub mod registry;
pub mod resolution;
pub mod resource;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use client::{
	GraphQLClient, MutationRequest, OperationRequest, QueryRequest, RequestClient,
	RequestClientAdapter, SharedClient,
};
pub use config::{ClientConfig, ConfigError, ConfigKey};
pub use context::{ClientContext, Scope};
pub use hooks::{
	LazyQueryHandle, MutationHandle, MutationOptions, OptimisticResponse, QueryHandle,
	QueryOptions, use_lazy_query, use_mutation, use_query,
};
pub use provider::GraphQLClientProvider;
pub use registry::ClientRegistry;
pub use resolution::{ClientGenerator, ClientResolution};
pub use resource::{Resource, ResourceState};

pub use reinhardt_graphql_core::ClientError;
