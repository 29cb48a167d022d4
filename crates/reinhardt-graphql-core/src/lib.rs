//! # Reinhardt GraphQL Core
//!
//! Client-side building blocks shared by the Reinhardt GraphQL hooks.
//!
//! A caching GraphQL client reports results as a stream: loading
//! notifications, cached data, refreshed data and errors may all arrive for a
//! single query. UI code usually wants one answer. This crate provides the
//! types describing that stream and the adapter that turns it into a single
//! settlement.
//!
//! ## Module Organization
//!
//! - [`document`]: parsed GraphQL documents and operation variables
//! - [`emission`]: stream emissions and single-shot responses
//! - [`policy`]: error and fetch policies
//! - [`error`]: the client error taxonomy
//! - [`callback`]: awaitable side-effect callbacks
//! - [`observable`]: subscribable result streams and subscriptions
//! - [`broadcast`]: push-driven emission source
//! - [`adapter`]: stream-to-settlement adapter
//! - [`mutation`]: settlement of single-shot responses
//!
//! ## Example
//!
//! ```
//! use futures_util::stream;
//! use reinhardt_graphql_core::{
//!     AsyncCallback, ClientError, Emission, ErrorPolicy, GraphQLErrorItem, Observable,
//!     SettleOptions, settle_first,
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let observable = Observable::from_stream_fn(|| {
//!     stream::iter(vec![Ok(Emission::partial(
//!         "Canberra".to_string(),
//!         ClientError::graphql(vec![GraphQLErrorItem::new("population unavailable")]),
//!     ))])
//! });
//!
//! let options = SettleOptions::new()
//!     .with_error_policy(ErrorPolicy::Ignore)
//!     .on_completed(AsyncCallback::from_fn(|capital: String| {
//!         println!("capital: {capital}");
//!     }));
//!
//! let execution = settle_first(&observable, options);
//! assert_eq!(execution.settlement.await.unwrap(), "Canberra");
//! # }
//! ```

pub mod adapter;
pub mod broadcast;
pub mod callback;
pub mod document;
pub mod emission;
pub mod error;
pub mod mutation;
pub mod observable;
pub mod policy;

pub use adapter::{Execution, SettleOptions, Settlement, settle_first};
pub use broadcast::{DEFAULT_BROADCAST_CAPACITY, EmissionBroadcaster};
pub use callback::{AsyncCallback, CallbackError};
pub use document::{OperationKind, QueryDescriptor, Variables};
pub use emission::{Emission, FetchResult, decode_value};
pub use error::{ClientError, ClientResult, ErrorLocation, GraphQLErrorItem, GraphQLErrors};
pub use mutation::settle_fetch_result;
pub use observable::{Observable, Observer, Subscribable, Subscription, SubscriptionToken};
pub use policy::{ErrorPolicy, FetchPolicy};
