//! Hook options

use reinhardt_graphql_core::{
	AsyncCallback, ClientError, ErrorPolicy, FetchPolicy, SettleOptions,
};
use serde_json::Value;
use std::sync::Arc;

use crate::resolution::ClientResolution;

/// Options for [`use_query`](crate::use_query) and [`use_lazy_query`](crate::use_lazy_query)
pub struct QueryOptions<T> {
	pub error_policy: ErrorPolicy,
	pub fetch_policy: Option<FetchPolicy>,
	pub next_fetch_policy: Option<FetchPolicy>,
	pub on_completed: Option<AsyncCallback<T>>,
	pub on_error: Option<AsyncCallback<ClientError>>,
	/// Overrides the client found in the scope
	pub client: Option<ClientResolution>,
}

impl<T> QueryOptions<T> {
	pub fn new() -> Self {
		Self {
			error_policy: ErrorPolicy::default(),
			fetch_policy: None,
			next_fetch_policy: None,
			on_completed: None,
			on_error: None,
			client: None,
		}
	}

	pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
		self.error_policy = policy;
		self
	}

	pub fn with_fetch_policy(mut self, policy: FetchPolicy) -> Self {
		self.fetch_policy = Some(policy);
		self
	}

	pub fn with_next_fetch_policy(mut self, policy: FetchPolicy) -> Self {
		self.next_fetch_policy = Some(policy);
		self
	}

	pub fn on_completed(mut self, callback: AsyncCallback<T>) -> Self {
		self.on_completed = Some(callback);
		self
	}

	pub fn on_error(mut self, callback: AsyncCallback<ClientError>) -> Self {
		self.on_error = Some(callback);
		self
	}

	pub fn with_client(mut self, resolution: ClientResolution) -> Self {
		self.client = Some(resolution);
		self
	}

	pub(crate) fn settle_options(&self) -> SettleOptions<T> {
		SettleOptions {
			error_policy: self.error_policy,
			on_completed: self.on_completed.clone(),
			on_error: self.on_error.clone(),
		}
	}
}

impl<T> Default for QueryOptions<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T> Clone for QueryOptions<T> {
	fn clone(&self) -> Self {
		Self {
			error_policy: self.error_policy,
			fetch_policy: self.fetch_policy,
			next_fetch_policy: self.next_fetch_policy,
			on_completed: self.on_completed.clone(),
			on_error: self.on_error.clone(),
			client: self.client.clone(),
		}
	}
}

impl<T> std::fmt::Debug for QueryOptions<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("QueryOptions")
			.field("error_policy", &self.error_policy)
			.field("fetch_policy", &self.fetch_policy)
			.field("next_fetch_policy", &self.next_fetch_policy)
			.field("client", &self.client)
			.finish_non_exhaustive()
	}
}

type ComputeFn<V> = dyn Fn(&V) -> Result<Value, ClientError> + Send + Sync;

/// Result shown before the server answers a mutation
pub enum OptimisticResponse<V: ?Sized> {
	Value(Value),
	/// Computed from the mutation's variables
	Compute(Arc<ComputeFn<V>>),
}

impl<V: ?Sized> OptimisticResponse<V> {
	pub fn compute<F>(f: F) -> Self
	where
		F: Fn(&V) -> Result<Value, ClientError> + Send + Sync + 'static,
	{
		Self::Compute(Arc::new(f))
	}

	pub fn resolve(&self, variables: &V) -> Result<Value, ClientError> {
		match self {
			Self::Value(value) => Ok(value.clone()),
			Self::Compute(f) => f(variables),
		}
	}
}

impl<V: ?Sized> Clone for OptimisticResponse<V> {
	fn clone(&self) -> Self {
		match self {
			Self::Value(value) => Self::Value(value.clone()),
			Self::Compute(f) => Self::Compute(Arc::clone(f)),
		}
	}
}

impl<V: ?Sized> std::fmt::Debug for OptimisticResponse<V> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
			Self::Compute(_) => f.debug_tuple("Compute").field(&"<function>").finish(),
		}
	}
}

/// Options for [`use_mutation`](crate::use_mutation)
pub struct MutationOptions<T, V: ?Sized> {
	pub error_policy: ErrorPolicy,
	pub on_completed: Option<AsyncCallback<T>>,
	pub on_error: Option<AsyncCallback<ClientError>>,
	pub optimistic_response: Option<OptimisticResponse<V>>,
	pub refetch_queries: Vec<String>,
	/// Overrides the client found in the scope
	pub client: Option<ClientResolution>,
}

impl<T, V: ?Sized> MutationOptions<T, V> {
	pub fn new() -> Self {
		Self {
			error_policy: ErrorPolicy::default(),
			on_completed: None,
			on_error: None,
			optimistic_response: None,
			refetch_queries: Vec::new(),
			client: None,
		}
	}

	pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
		self.error_policy = policy;
		self
	}

	pub fn on_completed(mut self, callback: AsyncCallback<T>) -> Self {
		self.on_completed = Some(callback);
		self
	}

	pub fn on_error(mut self, callback: AsyncCallback<ClientError>) -> Self {
		self.on_error = Some(callback);
		self
	}

	pub fn with_optimistic_response(mut self, response: OptimisticResponse<V>) -> Self {
		self.optimistic_response = Some(response);
		self
	}

	pub fn with_refetch_query(mut self, operation_name: impl Into<String>) -> Self {
		self.refetch_queries.push(operation_name.into());
		self
	}

	pub fn with_client(mut self, resolution: ClientResolution) -> Self {
		self.client = Some(resolution);
		self
	}

	pub(crate) fn settle_options(&self) -> SettleOptions<T> {
		SettleOptions {
			error_policy: self.error_policy,
			on_completed: self.on_completed.clone(),
			on_error: self.on_error.clone(),
		}
	}
}

impl<T, V: ?Sized> Default for MutationOptions<T, V> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T, V: ?Sized> std::fmt::Debug for MutationOptions<T, V> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MutationOptions")
			.field("error_policy", &self.error_policy)
			.field("optimistic_response", &self.optimistic_response)
			.field("refetch_queries", &self.refetch_queries)
			.field("client", &self.client)
			.finish_non_exhaustive()
	}
}
