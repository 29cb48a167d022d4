//! Execution hooks
//!
//! - [`use_query`]: executes immediately and on every refetch
//! - [`use_lazy_query`]: executes on demand
//! - [`use_mutation`]: performs a mutation on demand
//!
//! Each hook reads its client resolution once, at creation: the options'
//! [`ClientResolution`] when given, otherwise the [`ClientContext`](crate::ClientContext)
//! provided to the scope. The client itself is looked up on every execution.
//!
//! Hooks spawn Tokio tasks and must be used within a runtime.

mod options;
mod use_lazy_query;
mod use_mutation;
mod use_query;

pub use options::{MutationOptions, OptimisticResponse, QueryOptions};
pub use use_lazy_query::{LazyQueryHandle, use_lazy_query};
pub use use_mutation::{MutationHandle, use_mutation};
pub use use_query::{QueryHandle, use_query};

use parking_lot::Mutex;
use reinhardt_graphql_core::{
	ClientError, OperationKind, QueryDescriptor, SettleOptions, Subscription, Variables,
	decode_value, settle_first,
};
use serde::de::DeserializeOwned;
use tokio::task::AbortHandle;

use crate::client::{QueryRequest, SharedClient};
use crate::context::Scope;
use crate::resolution::{ClientResolution, resolve_client};
use crate::resource::{Resource, ResourceSlot, ResourceState};

/// The client strategy a hook created under `scope` uses
fn hook_resolution(scope: &Scope, explicit: Option<ClientResolution>) -> Option<ClientResolution> {
	explicit.or_else(|| ClientResolution::from_scope(scope))
}

/// One live execution
struct Running {
	subscription: Subscription,
	resolver: Option<AbortHandle>,
}

impl Running {
	fn teardown(self) {
		self.subscription.unsubscribe();
		if let Some(resolver) = self.resolver {
			resolver.abort();
		}
	}
}

/// State shared by the query hooks
pub(crate) struct QueryRunner<T> {
	query: Result<QueryDescriptor, ClientError>,
	resolution: Option<ClientResolution>,
	options: QueryOptions<T>,
	slot: ResourceSlot<T>,
	running: Mutex<Option<Running>>,
}

impl<T> QueryRunner<T>
where
	T: DeserializeOwned + Clone + Send + Sync + 'static,
{
	fn new(scope: &Scope, document: &str, mut options: QueryOptions<T>) -> Self {
		let resolution = hook_resolution(scope, options.client.take());
		Self {
			query: QueryDescriptor::parse_expecting(document, OperationKind::Query),
			resolution,
			options,
			slot: ResourceSlot::new(),
			running: Mutex::new(None),
		}
	}

	fn resource(&self) -> Resource<T> {
		self.slot.resource()
	}

	fn request(&self, variables: Variables) -> Result<QueryRequest, ClientError> {
		let query = self.query.clone()?;
		Ok(QueryRequest::new(query, variables)
			.with_error_policy(self.options.error_policy)
			.with_fetch_policy(self.options.fetch_policy)
			.with_next_fetch_policy(self.options.next_fetch_policy))
	}

	fn operation_name(&self) -> Option<&str> {
		self.query.as_ref().ok().and_then(|query| query.operation_name())
	}

	/// Replace the live execution with one that resolves its client first
	fn execute(&self, variables: Result<Variables, ClientError>) {
		// Held across teardown and install so concurrent callers cannot orphan an execution
		let mut running = self.running.lock();
		if let Some(previous) = running.take() {
			previous.teardown();
		}

		let request = match variables.and_then(|variables| self.request(variables)) {
			Ok(request) => request,
			Err(error) => {
				tracing::debug!(%error, "query not executed");
				self.slot.set(ResourceState::Rejected(error));
				return;
			}
		};
		tracing::debug!(operation = ?self.operation_name(), "executing query");
		self.slot.set(ResourceState::Pending);

		let subscription = Subscription::new();
		let guard = subscription.clone();
		let resolution = self.resolution.clone();
		let settle = self.options.settle_options();
		let slot = self.slot.clone();
		let resolver = tokio::spawn(async move {
			match resolve_client(resolution.as_ref()).await {
				Ok(client) => launch(&client, request, settle, slot, &guard),
				Err(error) => {
					tracing::debug!(%error, "client resolution failed");
					if !guard.is_closed() {
						slot.set(ResourceState::Rejected(error));
					}
				}
			}
		});

		*running = Some(Running {
			subscription,
			resolver: Some(resolver.abort_handle()),
		});
	}

	/// Replace the live execution with one on an already-resolved client
	fn execute_with(&self, client: &SharedClient, request: QueryRequest) {
		let mut running = self.running.lock();
		if let Some(previous) = running.take() {
			previous.teardown();
		}
		tracing::debug!(operation = ?self.operation_name(), "executing query");
		self.slot.set(ResourceState::Pending);

		let subscription = Subscription::new();
		launch(client, request, self.options.settle_options(), self.slot.clone(), &subscription);
		*running = Some(Running {
			subscription,
			resolver: None,
		});
	}

	fn teardown(&self) {
		let running = self.running.lock().take();
		if let Some(running) = running {
			running.teardown();
		}
	}
}

impl<T> Drop for QueryRunner<T> {
	fn drop(&mut self) {
		if let Some(running) = self.running.get_mut().take() {
			running.teardown();
		}
	}
}

/// Subscribe through `client` and land the settled outcome in `slot`
///
/// Everything started here is torn down with `guard`.
fn launch<T>(
	client: &SharedClient,
	request: QueryRequest,
	settle: SettleOptions<T>,
	slot: ResourceSlot<T>,
	guard: &Subscription,
) where
	T: DeserializeOwned + Clone + Send + Sync + 'static,
{
	let observable = client.watch_query(request).map_data(decode_value::<T>);
	let (settlement, subscription) = settle_first(&observable, settle).into_parts();

	let token = guard.token();
	let writer = tokio::spawn(async move {
		let outcome = settlement.await;
		if !token.is_closed() {
			slot.set(outcome.into());
		}
	});
	guard.add_teardown(move || {
		subscription.unsubscribe();
		writer.abort();
	});
}
