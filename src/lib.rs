//! # Reinhardt GraphQL Client
//!
//! Hooks that turn a GraphQL client's observable results into settled,
//! reactive outcomes.
//!
//! A query observable may emit many times. Callers of a hook only care about
//! the first meaningful result: the first emission carrying data, or the
//! first error the active [`ErrorPolicy`] does not ignore. The adapter in
//! [`core`] settles exactly once on that emission and runs the
//! `on_completed` / `on_error` callbacks; the [`hooks`] layer wires it to a
//! client provided through a context scope.
//!
//! ## Feature Flags
//!
//! - `hooks` (default) - `use_query`, `use_lazy_query`, `use_mutation` and
//!   the client provider
//! - `testing` - scripted in-memory client at `hooks::testing`
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use reinhardt_graphql_client::prelude::*;
//! use serde_json::Value;
//!
//! let provider = GraphQLClientProvider::new(ClientGenerator::new(|| async {
//!     Ok(RequestClientAdapter::new(MyTransport::default()).into_shared())
//! }));
//! let app = provider.provide(&Scope::root());
//! provider.init().await?;
//!
//! let countries = use_query::<Value, _>(&app, "query { countries { code } }", &(), QueryOptions::new());
//! match countries.resource().settled().await {
//!     Some(Ok(data)) => println!("{data}"),
//!     Some(Err(error)) => eprintln!("{error}"),
//!     None => {}
//! }
//! ```

/// Observable adapter, settlement and core types
pub use reinhardt_graphql_core as core;

#[cfg(feature = "hooks")]
pub use reinhardt_graphql_hooks as hooks;

pub use reinhardt_graphql_core::{
	AsyncCallback, CallbackError, ClientError, ClientResult, Emission, ErrorPolicy, FetchPolicy, FetchResult,
	GraphQLErrorItem, Observable, QueryDescriptor, SettleOptions, Settlement, Subscription,
	Variables, settle_first,
};

#[cfg(feature = "hooks")]
pub use reinhardt_graphql_hooks::{
	ClientConfig, ClientContext, ClientGenerator, ClientRegistry, ClientResolution,
	GraphQLClient, GraphQLClientProvider, LazyQueryHandle, MutationHandle, MutationOptions,
	OptimisticResponse, QueryHandle, QueryOptions, RequestClient, RequestClientAdapter, Resource,
	ResourceState, Scope, SharedClient, use_lazy_query, use_mutation, use_query,
};

/// Common imports for hook users
pub mod prelude {
	pub use reinhardt_graphql_core::{
		AsyncCallback, ClientError, Emission, ErrorPolicy, FetchPolicy, FetchResult,
	};

	#[cfg(feature = "hooks")]
	pub use reinhardt_graphql_hooks::{
		ClientContext, ClientGenerator, GraphQLClient, GraphQLClientProvider, MutationOptions,
		QueryOptions, RequestClient, RequestClientAdapter, Resource, ResourceState, Scope,
		use_lazy_query, use_mutation, use_query,
	};
}
