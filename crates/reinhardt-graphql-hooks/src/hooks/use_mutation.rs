//! Mutation hook: use_mutation

use reinhardt_graphql_core::{
	ClientError, OperationKind, QueryDescriptor, Variables, settle_fetch_result,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{MutationOptions, hook_resolution};
use crate::client::MutationRequest;
use crate::context::Scope;
use crate::resolution::{ClientResolution, resolve_client};
use crate::resource::{Resource, ResourceSlot, ResourceState};

struct MutationRunner<T, V: ?Sized> {
	mutation: Result<QueryDescriptor, ClientError>,
	resolution: Option<ClientResolution>,
	options: MutationOptions<T, V>,
	slot: ResourceSlot<T>,
	generation: AtomicU64,
}

/// Handle returned by [`use_mutation`]
pub struct MutationHandle<T, V: ?Sized> {
	runner: Arc<MutationRunner<T, V>>,
}

impl<T, V> MutationHandle<T, V>
where
	T: DeserializeOwned + Clone + Send + Sync + 'static,
	V: Serialize + ?Sized,
{
	/// Latest outcome; concurrent executions report only the newest
	pub fn resource(&self) -> Resource<T> {
		self.runner.slot.resource()
	}

	/// Perform the mutation and wait for its settled outcome
	///
	/// Fails with [`ClientError::NoClient`] before anything is sent when no
	/// client resolves.
	pub async fn execute(&self, variables: &V) -> Result<T, ClientError> {
		let runner = &self.runner;
		let mutation = runner.mutation.clone()?;
		let bindings = Variables::from_serialize(variables)?;
		let client = resolve_client(runner.resolution.as_ref()).await?;
		let optimistic_response = runner
			.options
			.optimistic_response
			.as_ref()
			.map(|response| response.resolve(variables))
			.transpose()?;

		let generation = runner.generation.fetch_add(1, Ordering::AcqRel) + 1;
		tracing::debug!(operation = ?mutation.operation_name(), generation, "executing mutation");
		runner.slot.set(ResourceState::Pending);

		let request = MutationRequest {
			mutation,
			variables: bindings,
			error_policy: runner.options.error_policy,
			optimistic_response,
			refetch_queries: runner.options.refetch_queries.clone(),
		};
		let response = client
			.mutate(request)
			.await
			.and_then(|response| response.decode::<T>());
		let outcome = settle_fetch_result(response, &runner.options.settle_options()).await;

		if runner.generation.load(Ordering::Acquire) == generation {
			runner.slot.set(outcome.clone().into());
		}
		outcome
	}
}

impl<T, V: ?Sized> Clone for MutationHandle<T, V> {
	fn clone(&self) -> Self {
		Self {
			runner: Arc::clone(&self.runner),
		}
	}
}

impl<T, V: ?Sized> std::fmt::Debug for MutationHandle<T, V> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MutationHandle")
			.field("options", &self.runner.options)
			.finish_non_exhaustive()
	}
}

/// Prepare a mutation that runs on every [`execute`](MutationHandle::execute)
///
/// # Examples
///
/// ```
/// use reinhardt_graphql_hooks::{ClientContext, MutationOptions, Scope, use_mutation};
/// use serde_json::{json, Value};
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
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let client = RequestClientAdapter::new(Server(json!({ "addCountry": { "code": "NZ" } })));
/// let scope = Scope::root();
/// scope.provide(ClientContext::with_client(client.into_shared()));
///
/// let add = use_mutation::<Value, Value>(
///     &scope,
///     "mutation AddCountry($code: ID!) { addCountry(code: $code) { code } }",
///     MutationOptions::new(),
/// );
///
/// let created = add.execute(&json!({ "code": "NZ" })).await.unwrap();
/// assert_eq!(created["addCountry"]["code"], "NZ");
/// # }
/// ```
pub fn use_mutation<T, V>(
	scope: &Scope,
	document: &str,
	mut options: MutationOptions<T, V>,
) -> MutationHandle<T, V>
where
	T: DeserializeOwned + Clone + Send + Sync + 'static,
	V: Serialize + ?Sized,
{
	let resolution = hook_resolution(scope, options.client.take());
	MutationHandle {
		runner: Arc::new(MutationRunner {
			mutation: QueryDescriptor::parse_expecting(document, OperationKind::Mutation),
			resolution,
			options,
			slot: ResourceSlot::new(),
			generation: AtomicU64::new(0),
		}),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::context::ClientContext;
	use crate::hooks::OptimisticResponse;
	use crate::testing::MockClient;
	use parking_lot::Mutex;
	use reinhardt_graphql_core::{AsyncCallback, ErrorPolicy, FetchResult, GraphQLErrorItem};
	use rstest::*;
	use serde_json::{Value, json};

	const ADD_COUNTRY: &str = "mutation AddCountry($code: ID!) { addCountry(code: $code) { code } }";

	#[derive(Debug, Clone, Serialize)]
	struct AddCountryVars {
		code: String,
	}

	fn vars(code: &str) -> AddCountryVars {
		AddCountryVars {
			code: code.to_string(),
		}
	}

	#[fixture]
	fn mock() -> MockClient {
		MockClient::new()
	}

	fn scope_with(mock: &MockClient) -> Scope {
		let scope = Scope::root();
		scope.provide(ClientContext::with_client(mock.shared()));
		scope
	}

	fn created(code: &str) -> Value {
		json!({"addCountry": {"code": code}})
	}

	#[rstest]
	#[tokio::test]
	async fn test_older_execution_settling_last_keeps_newer_outcome(mock: MockClient) {
		let release_first = mock.hold_mutation(Ok(FetchResult::ok(created("AU"))));
		mock.respond_mutation(Ok(FetchResult::ok(created("NZ"))));
		let scope = scope_with(&mock);
		let add = use_mutation::<Value, AddCountryVars>(&scope, ADD_COUNTRY, MutationOptions::new());

		let (au, nz) = (vars("AU"), vars("NZ"));

		let (older, newer) = tokio::join!(add.execute(&au), async {
			while mock.mutations().is_empty() {
				tokio::task::yield_now().await;
			}
			let newer = add.execute(&nz).await;
			assert_eq!(add.resource().get(), ResourceState::Resolved(created("NZ")));
			release_first.send(()).unwrap();
			newer
		});

		assert_eq!(older.unwrap(), created("AU"));
		assert_eq!(newer.unwrap(), created("NZ"));
		assert_eq!(add.resource().get(), ResourceState::Resolved(created("NZ")));
	}

	#[rstest]
	#[tokio::test]
	async fn test_execute_resolves_and_updates_resource(mock: MockClient) {
		mock.respond_mutation(Ok(FetchResult::ok(created("NZ"))));
		let scope = scope_with(&mock);
		let completed = Arc::new(Mutex::new(Vec::new()));
		let seen = Arc::clone(&completed);
		let options = MutationOptions::new()
			.on_completed(AsyncCallback::from_fn(move |data: Value| seen.lock().push(data)));
		let handle = use_mutation::<Value, AddCountryVars>(&scope, ADD_COUNTRY, options);

		let outcome = handle.execute(&vars("NZ")).await;

		assert_eq!(outcome, Ok(created("NZ")));
		assert_eq!(handle.resource().get(), ResourceState::Resolved(created("NZ")));
		assert_eq!(*completed.lock(), vec![created("NZ")]);
	}

	#[rstest]
	#[tokio::test]
	async fn test_execute_without_client_fails() {
		let handle = use_mutation::<Value, AddCountryVars>(&Scope::root(), ADD_COUNTRY, MutationOptions::new());

		assert_eq!(handle.execute(&vars("NZ")).await, Err(ClientError::NoClient));
		assert_eq!(handle.resource().get(), ResourceState::Idle);
	}

	#[rstest]
	#[tokio::test]
	async fn test_optimistic_response_from_variables(mock: MockClient) {
		mock.respond_mutation(Ok(FetchResult::ok(created("NZ"))));
		let scope = scope_with(&mock);
		let options = MutationOptions::new()
			.with_optimistic_response(OptimisticResponse::compute(|vars: &AddCountryVars| {
				Ok(json!({"addCountry": {"code": vars.code}}))
			}))
			.with_refetch_query("ListCountries");
		let handle = use_mutation::<Value, AddCountryVars>(&scope, ADD_COUNTRY, options);

		handle.execute(&vars("NZ")).await.unwrap();

		let request = &mock.mutations()[0];
		assert_eq!(request.optimistic_response, Some(created("NZ")));
		assert_eq!(request.refetch_queries, vec!["ListCountries".to_string()]);
		assert_eq!(request.variables.get("code"), Some(&json!("NZ")));
	}

	#[rstest]
	#[case(ErrorPolicy::Ignore, Ok(created("NZ")))]
	#[case(ErrorPolicy::None, Err(ClientError::graphql(vec![GraphQLErrorItem::new("flag missing")])))]
	#[tokio::test]
	async fn test_partial_response_follows_policy(
		mock: MockClient,
		#[case] policy: ErrorPolicy,
		#[case] expected: Result<Value, ClientError>,
	) {
		mock.respond_mutation(Ok(FetchResult::with_errors(
			Some(created("NZ")),
			vec![GraphQLErrorItem::new("flag missing")],
		)));
		let scope = scope_with(&mock);
		let handle = use_mutation::<Value, AddCountryVars>(
			&scope,
			ADD_COUNTRY,
			MutationOptions::new().with_error_policy(policy),
		);

		assert_eq!(handle.execute(&vars("NZ")).await, expected);
		assert_eq!(mock.mutations()[0].error_policy, policy);
	}

	#[rstest]
	#[tokio::test]
	async fn test_empty_response_rejects(mock: MockClient) {
		let scope = scope_with(&mock);
		let handle = use_mutation::<Value, AddCountryVars>(&scope, ADD_COUNTRY, MutationOptions::new());

		assert_eq!(handle.execute(&vars("NZ")).await, Err(ClientError::EmptyResponse));
		assert_eq!(
			handle.resource().get(),
			ResourceState::Rejected(ClientError::EmptyResponse)
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_query_document_is_invalid(mock: MockClient) {
		let scope = scope_with(&mock);
		let handle = use_mutation::<Value, ()>(&scope, "query { ping }", MutationOptions::new());

		assert!(matches!(handle.execute(&()).await, Err(ClientError::InvalidQuery(_))));
		assert!(mock.mutations().is_empty());
	}
}
