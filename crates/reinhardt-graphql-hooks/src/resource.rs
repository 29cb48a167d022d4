//! Reactive result slot
//!
//! Every hook exposes its outcome through a [`Resource`]: a cloneable read
//! handle over the latest [`ResourceState`]. The hook owns the writing side.

use reinhardt_graphql_core::ClientError;
use std::sync::Arc;
use tokio::sync::watch;

/// Lifecycle of one hook's result
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceState<T> {
	/// Nothing has been executed yet
	Idle,
	/// An execution is in flight
	Pending,
	Resolved(T),
	Rejected(ClientError),
}

impl<T> ResourceState<T> {
	pub fn is_pending(&self) -> bool {
		matches!(self, Self::Pending)
	}

	/// Whether the state holds an outcome
	pub fn is_settled(&self) -> bool {
		matches!(self, Self::Resolved(_) | Self::Rejected(_))
	}

	pub fn data(&self) -> Option<&T> {
		match self {
			Self::Resolved(data) => Some(data),
			_ => None,
		}
	}

	pub fn error(&self) -> Option<&ClientError> {
		match self {
			Self::Rejected(error) => Some(error),
			_ => None,
		}
	}
}

impl<T> From<Result<T, ClientError>> for ResourceState<T> {
	fn from(outcome: Result<T, ClientError>) -> Self {
		match outcome {
			Ok(data) => Self::Resolved(data),
			Err(error) => Self::Rejected(error),
		}
	}
}

/// Read handle over a hook's result
///
/// # Examples
///
/// ```
/// use reinhardt_graphql_hooks::{ClientContext, QueryOptions, ResourceState, Scope, use_query};
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
/// let client = RequestClientAdapter::new(Server(json!({ "ping": "pong" }))).into_shared();
/// let scope = Scope::root();
/// scope.provide(ClientContext::with_client(client));
///
/// let handle = use_query::<Value, _>(&scope, "query { ping }", &(), QueryOptions::new());
/// let outcome = handle.resource().settled().await;
///
/// assert_eq!(outcome, Some(Ok(json!({ "ping": "pong" }))));
/// assert!(matches!(handle.resource().get(), ResourceState::Resolved(_)));
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Resource<T> {
	rx: watch::Receiver<ResourceState<T>>,
}

impl<T: Clone> Resource<T> {
	/// Snapshot of the current state
	pub fn get(&self) -> ResourceState<T> {
		self.rx.borrow().clone()
	}

	/// Wait for the next state change
	///
	/// Returns `false` once the owning hook is gone.
	pub async fn changed(&mut self) -> bool {
		self.rx.changed().await.is_ok()
	}

	/// Wait until the state holds an outcome
	///
	/// Returns `None` if the owning hook is dropped first.
	pub async fn settled(&self) -> Option<Result<T, ClientError>> {
		let mut rx = self.rx.clone();
		let state = rx.wait_for(ResourceState::is_settled).await.ok()?;
		match &*state {
			ResourceState::Resolved(data) => Some(Ok(data.clone())),
			ResourceState::Rejected(error) => Some(Err(error.clone())),
			ResourceState::Idle | ResourceState::Pending => None,
		}
	}
}

/// Writing side of a [`Resource`]
#[derive(Debug)]
pub(crate) struct ResourceSlot<T> {
	tx: Arc<watch::Sender<ResourceState<T>>>,
}

impl<T> Clone for ResourceSlot<T> {
	fn clone(&self) -> Self {
		Self {
			tx: Arc::clone(&self.tx),
		}
	}
}

impl<T> ResourceSlot<T> {
	pub(crate) fn new() -> Self {
		let (tx, _) = watch::channel(ResourceState::Idle);
		Self { tx: Arc::new(tx) }
	}

	pub(crate) fn resource(&self) -> Resource<T> {
		Resource {
			rx: self.tx.subscribe(),
		}
	}

	pub(crate) fn set(&self, state: ResourceState<T>) {
		self.tx.send_replace(state);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_initial_state_is_idle() {
		let slot: ResourceSlot<u32> = ResourceSlot::new();
		assert_eq!(slot.resource().get(), ResourceState::Idle);
	}

	#[rstest]
	#[tokio::test]
	async fn test_settled_waits_past_pending() {
		let slot: ResourceSlot<u32> = ResourceSlot::new();
		let resource = slot.resource();
		slot.set(ResourceState::Pending);

		let writer = slot.clone();
		tokio::spawn(async move {
			tokio::task::yield_now().await;
			writer.set(ResourceState::Resolved(7));
		});

		assert_eq!(resource.settled().await, Some(Ok(7)));
	}

	#[rstest]
	#[tokio::test]
	async fn test_settled_after_slot_dropped_is_none() {
		let slot: ResourceSlot<u32> = ResourceSlot::new();
		let resource = slot.resource();
		drop(slot);

		assert_eq!(resource.settled().await, None);
	}

	#[rstest]
	#[tokio::test]
	async fn test_changed_reports_transitions() {
		let slot: ResourceSlot<u32> = ResourceSlot::new();
		let mut resource = slot.resource();

		slot.set(ResourceState::Rejected(ClientError::NoClient));

		assert!(resource.changed().await);
		assert_eq!(resource.get().error(), Some(&ClientError::NoClient));
	}

	#[rstest]
	fn test_state_from_outcome() {
		let resolved: ResourceState<u32> = Ok(1).into();
		let rejected: ResourceState<u32> = Err(ClientError::EmptyResponse).into();
		assert_eq!(resolved.data(), Some(&1));
		assert!(rejected.is_settled());
		assert!(!ResourceState::<u32>::Pending.is_settled());
	}
}
