//! Scripted in-memory client for tests
//!
//! [`MockClient`] records every request it receives. Watched queries either
//! replay a queued script or, when no script is queued, attach to a live
//! broadcaster the test pushes emissions into.

use async_trait::async_trait;
use parking_lot::Mutex;
use reinhardt_graphql_core::{
	ClientError, Emission, EmissionBroadcaster, FetchResult, Observable,
};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

use crate::client::{GraphQLClient, MutationRequest, QueryRequest, SharedClient};

type Script = Vec<Result<Emission<Value>, ClientError>>;

struct MutationReply {
	response: Result<FetchResult<Value>, ClientError>,
	release: Option<oneshot::Receiver<()>>,
}

#[derive(Default)]
struct MockState {
	query_scripts: VecDeque<Script>,
	mutation_responses: VecDeque<MutationReply>,
	queries: Vec<QueryRequest>,
	mutations: Vec<MutationRequest>,
}

/// In-memory [`GraphQLClient`]
///
/// # Examples
///
/// ```
/// use reinhardt_graphql_hooks::testing::MockClient;
/// use reinhardt_graphql_core::Emission;
/// use serde_json::json;
///
/// let mock = MockClient::new();
/// mock.script_query(vec![Ok(Emission::data(json!({ "ping": "pong" })))]);
/// assert!(mock.queries().is_empty());
/// ```
#[derive(Clone, Default)]
pub struct MockClient {
	state: Arc<Mutex<MockState>>,
	live: EmissionBroadcaster<Value>,
}

impl MockClient {
	pub fn new() -> Self {
		Self::default()
	}

	/// This client as a [`SharedClient`]; clones share recorded state
	pub fn shared(&self) -> SharedClient {
		Arc::new(self.clone())
	}

	/// Queue the emissions replayed by the next `watch_query`
	pub fn script_query(&self, script: Script) {
		self.state.lock().query_scripts.push_back(script);
	}

	/// Queue the response to the next `mutate`
	pub fn respond_mutation(&self, response: Result<FetchResult<Value>, ClientError>) {
		self.state.lock().mutation_responses.push_back(MutationReply {
			response,
			release: None,
		});
	}

	/// Queue a response to the next `mutate` that is withheld until released
	///
	/// The call answers once the returned sender fires or is dropped.
	pub fn hold_mutation(
		&self,
		response: Result<FetchResult<Value>, ClientError>,
	) -> oneshot::Sender<()> {
		let (release, held) = oneshot::channel();
		self.state.lock().mutation_responses.push_back(MutationReply {
			response,
			release: Some(held),
		});
		release
	}

	/// Push an emission to every unscripted watcher
	pub fn emit(&self, emission: Emission<Value>) -> usize {
		self.live.emit(emission)
	}

	/// Push a stream-level error to every unscripted watcher
	pub fn fail(&self, error: ClientError) -> usize {
		self.live.fail(error)
	}

	pub fn watcher_count(&self) -> usize {
		self.live.receiver_count()
	}

	/// Wait until at least `count` unscripted watchers are attached
	pub async fn wait_for_watchers(&self, count: usize) {
		while self.watcher_count() < count {
			tokio::time::sleep(Duration::from_millis(1)).await;
		}
	}

	pub fn queries(&self) -> Vec<QueryRequest> {
		self.state.lock().queries.clone()
	}

	pub fn mutations(&self) -> Vec<MutationRequest> {
		self.state.lock().mutations.clone()
	}
}

#[async_trait]
impl GraphQLClient for MockClient {
	fn watch_query(&self, request: QueryRequest) -> Observable<Value> {
		let mut state = self.state.lock();
		state.queries.push(request);
		match state.query_scripts.pop_front() {
			Some(script) => {
				Observable::from_stream_fn(move || futures_util::stream::iter(script.clone()))
			}
			None => self.live.observable(),
		}
	}

	async fn mutate(&self, request: MutationRequest) -> Result<FetchResult<Value>, ClientError> {
		let reply = {
			let mut state = self.state.lock();
			state.mutations.push(request);
			state.mutation_responses.pop_front()
		};
		let Some(reply) = reply else {
			return Err(ClientError::EmptyResponse);
		};
		if let Some(held) = reply.release {
			// A dropped sender releases too
			let _ = held.await;
		}
		reply.response
	}
}

impl std::fmt::Debug for MockClient {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let state = self.state.lock();
		f.debug_struct("MockClient")
			.field("queries", &state.queries.len())
			.field("mutations", &state.mutations.len())
			.field("watchers", &self.live.receiver_count())
			.finish()
	}
}
