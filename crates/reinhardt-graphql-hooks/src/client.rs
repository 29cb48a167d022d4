//! GraphQL client collaborators
//!
//! Two client roles are supported. A [`GraphQLClient`] is a caching client
//! whose watched queries may emit many times. A [`RequestClient`] performs one
//! request per operation; [`RequestClientAdapter`] lifts it into the caching
//! role so both can be provided to the hooks.
//!
//! Transport, caching and normalization live behind these traits.

use async_trait::async_trait;
use reinhardt_graphql_core::{
	ClientError, Emission, ErrorPolicy, FetchPolicy, FetchResult, Observable, QueryDescriptor,
	Variables,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// A client shared between contexts, providers and hooks
pub type SharedClient = Arc<dyn GraphQLClient>;

/// A watched query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
	pub query: QueryDescriptor,
	pub variables: Variables,
	pub error_policy: ErrorPolicy,
	pub fetch_policy: Option<FetchPolicy>,
	pub next_fetch_policy: Option<FetchPolicy>,
}

impl QueryRequest {
	pub fn new(query: QueryDescriptor, variables: Variables) -> Self {
		Self {
			query,
			variables,
			error_policy: ErrorPolicy::default(),
			fetch_policy: None,
			next_fetch_policy: None,
		}
	}

	pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
		self.error_policy = policy;
		self
	}

	pub fn with_fetch_policy(mut self, policy: Option<FetchPolicy>) -> Self {
		self.fetch_policy = policy;
		self
	}

	pub fn with_next_fetch_policy(mut self, policy: Option<FetchPolicy>) -> Self {
		self.next_fetch_policy = policy;
		self
	}
}

/// A mutation to perform once
#[derive(Debug, Clone, PartialEq)]
pub struct MutationRequest {
	pub mutation: QueryDescriptor,
	pub variables: Variables,
	pub error_policy: ErrorPolicy,
	/// Result to show before the server answers
	pub optimistic_response: Option<Value>,
	/// Names of watched queries to refresh afterwards
	pub refetch_queries: Vec<String>,
}

impl MutationRequest {
	pub fn new(mutation: QueryDescriptor, variables: Variables) -> Self {
		Self {
			mutation,
			variables,
			error_policy: ErrorPolicy::default(),
			optimistic_response: None,
			refetch_queries: Vec::new(),
		}
	}
}

/// The wire-level body of a single GraphQL operation
///
/// # Examples
///
/// ```
/// use reinhardt_graphql_core::{QueryDescriptor, Variables};
/// use reinhardt_graphql_hooks::OperationRequest;
/// use serde_json::json;
///
/// let query = QueryDescriptor::parse("query Ping { ping }").unwrap();
/// let request = OperationRequest::new(query.clone(), Variables::new());
///
/// assert_eq!(
///     serde_json::to_value(&request).unwrap(),
///     json!({ "query": query.text(), "variables": {}, "operationName": "Ping" })
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationRequest {
	#[serde(rename = "query", serialize_with = "serialize_document")]
	pub document: QueryDescriptor,
	pub variables: Variables,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub operation_name: Option<String>,
}

fn serialize_document<S: serde::Serializer>(
	document: &QueryDescriptor,
	serializer: S,
) -> Result<S::Ok, S::Error> {
	serializer.serialize_str(document.text())
}

impl OperationRequest {
	pub fn new(document: QueryDescriptor, variables: Variables) -> Self {
		let operation_name = document.operation_name().map(str::to_string);
		Self {
			document,
			variables,
			operation_name,
		}
	}
}

impl From<&QueryRequest> for OperationRequest {
	fn from(request: &QueryRequest) -> Self {
		Self::new(request.query.clone(), request.variables.clone())
	}
}

impl From<&MutationRequest> for OperationRequest {
	fn from(request: &MutationRequest) -> Self {
		Self::new(request.mutation.clone(), request.variables.clone())
	}
}

/// A caching GraphQL client
#[async_trait]
pub trait GraphQLClient: Send + Sync + 'static {
	/// Watch a query; the observable may emit any number of times
	fn watch_query(&self, request: QueryRequest) -> Observable<Value>;

	/// Perform a mutation and return its single response
	async fn mutate(&self, request: MutationRequest) -> Result<FetchResult<Value>, ClientError>;
}

/// A client that performs exactly one request per operation
#[async_trait]
pub trait RequestClient: Send + Sync + 'static {
	async fn request(&self, request: OperationRequest) -> Result<FetchResult<Value>, ClientError>;
}

/// Presents a [`RequestClient`] as a [`GraphQLClient`]
///
/// Every watched query becomes a single-emission observable that issues one
/// request per subscription.
pub struct RequestClientAdapter<C> {
	inner: Arc<C>,
}

impl<C: RequestClient> RequestClientAdapter<C> {
	pub fn new(client: C) -> Self {
		Self {
			inner: Arc::new(client),
		}
	}

	pub fn into_shared(self) -> SharedClient {
		Arc::new(self)
	}
}

#[async_trait]
impl<C: RequestClient> GraphQLClient for RequestClientAdapter<C> {
	fn watch_query(&self, request: QueryRequest) -> Observable<Value> {
		let inner = Arc::clone(&self.inner);
		let operation = OperationRequest::from(&request);
		Observable::once(move || {
			let inner = Arc::clone(&inner);
			let operation = operation.clone();
			async move { inner.request(operation).await.map(Emission::from) }
		})
	}

	async fn mutate(&self, request: MutationRequest) -> Result<FetchResult<Value>, ClientError> {
		if !request.refetch_queries.is_empty() {
			tracing::debug!(
				queries = ?request.refetch_queries,
				"request client has no watched queries to refetch"
			);
		}
		self.inner.request(OperationRequest::from(&request)).await
	}
}
