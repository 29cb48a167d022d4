//! Query hook: use_query

use reinhardt_graphql_core::Variables;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;

use super::{QueryOptions, QueryRunner};
use crate::context::Scope;
use crate::resource::Resource;

/// Handle returned by [`use_query`]
///
/// Clones share one execution. Dropping the last clone tears it down.
pub struct QueryHandle<T, V: ?Sized> {
	runner: Arc<QueryRunner<T>>,
	_variables: PhantomData<fn(&V)>,
}

impl<T, V> QueryHandle<T, V>
where
	T: DeserializeOwned + Clone + Send + Sync + 'static,
	V: Serialize + ?Sized,
{
	pub fn resource(&self) -> Resource<T> {
		self.runner.resource()
	}

	/// Tear down the current execution and execute again with new variables
	pub fn refetch(&self, variables: &V) {
		self.runner.execute(Variables::from_serialize(variables));
	}

	/// Stop the current execution; the last state is kept
	pub fn dispose(&self) {
		self.runner.teardown();
	}
}

impl<T, V: ?Sized> Clone for QueryHandle<T, V> {
	fn clone(&self) -> Self {
		Self {
			runner: Arc::clone(&self.runner),
			_variables: PhantomData,
		}
	}
}

impl<T, V: ?Sized> std::fmt::Debug for QueryHandle<T, V> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("QueryHandle").finish_non_exhaustive()
	}
}

/// Watch a query and expose its first settled result
///
/// Executes immediately. A document that is not a single query operation,
/// variables that do not serialize to an object and a missing client all
/// surface as [`ResourceState::Rejected`](crate::ResourceState::Rejected).
///
/// # Examples
///
/// ```
/// use reinhardt_graphql_hooks::{ClientContext, QueryOptions, Scope, use_query};
/// use serde::Deserialize;
/// use serde_json::json;
/// # use async_trait::async_trait;
/// # use reinhardt_graphql_core::FetchResult;
/// # use reinhardt_graphql_hooks::{ClientError, OperationRequest, RequestClient, RequestClientAdapter};
/// # struct Server(serde_json::Value);
/// # #[async_trait]
/// # impl RequestClient for Server {
/// #     async fn request(&self, _: OperationRequest) -> Result<FetchResult<serde_json::Value>, ClientError> {
/// #         Ok(FetchResult::ok(self.0.clone()))
/// #     }
/// # }
///
/// #[derive(Debug, Clone, PartialEq, Deserialize)]
/// struct Capital {
///     country: Country,
/// }
///
/// #[derive(Debug, Clone, PartialEq, Deserialize)]
/// struct Country {
///     capital: String,
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let client = RequestClientAdapter::new(Server(json!({ "country": { "capital": "Canberra" } })));
/// let scope = Scope::root();
/// scope.provide(ClientContext::with_client(client.into_shared()));
///
/// let handle = use_query::<Capital, _>(
///     &scope,
///     "query GetCapital($code: ID!) { country(code: $code) { capital } }",
///     &json!({ "code": "AU" }),
///     QueryOptions::new(),
/// );
///
/// let capital = handle.resource().settled().await.unwrap().unwrap();
/// assert_eq!(capital.country.capital, "Canberra");
/// # }
/// ```
pub fn use_query<T, V>(
	scope: &Scope,
	document: &str,
	variables: &V,
	options: QueryOptions<T>,
) -> QueryHandle<T, V>
where
	T: DeserializeOwned + Clone + Send + Sync + 'static,
	V: Serialize + ?Sized,
{
	let runner = Arc::new(QueryRunner::new(scope, document, options));
	runner.execute(Variables::from_serialize(variables));
	QueryHandle {
		runner,
		_variables: PhantomData,
	}
}
