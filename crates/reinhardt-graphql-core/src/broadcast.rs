//! Push-driven emission source
//!
//! [`EmissionBroadcaster`] lets a caller (a client implementation, a cache
//! watcher or a test) push emissions to every current subscriber. It backs
//! the `watch_query` observables of in-memory clients.

use tokio::sync::broadcast;

use crate::emission::Emission;
use crate::error::ClientError;
use crate::observable::{Observable, Observer, Subscribable, Subscription, spawn_delivery};

/// Default number of buffered emissions per subscriber
pub const DEFAULT_BROADCAST_CAPACITY: usize = 100;

type Item<T> = Result<Emission<T>, ClientError>;

/// Emission broadcaster
///
/// Emissions sent while nobody is subscribed are dropped. Dropping every
/// clone of the broadcaster ends delivery for all subscribers.
#[derive(Clone)]
pub struct EmissionBroadcaster<T> {
	tx: broadcast::Sender<Item<T>>,
}

impl<T: Clone + Send + Sync + 'static> EmissionBroadcaster<T> {
	/// Create a new broadcaster
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_graphql_core::EmissionBroadcaster;
	///
	/// let broadcaster: EmissionBroadcaster<String> = EmissionBroadcaster::new();
	/// assert_eq!(broadcaster.receiver_count(), 0);
	/// ```
	pub fn new() -> Self {
		Self::with_capacity(DEFAULT_BROADCAST_CAPACITY)
	}

	pub fn with_capacity(capacity: usize) -> Self {
		let (tx, _) = broadcast::channel(capacity);
		Self { tx }
	}

	/// Push an emission; returns how many subscribers received it
	pub fn emit(&self, emission: Emission<T>) -> usize {
		self.tx.send(Ok(emission)).unwrap_or(0)
	}

	pub fn emit_data(&self, data: T) -> usize {
		self.emit(Emission::data(data))
	}

	/// Push a stream-level error
	pub fn fail(&self, error: ClientError) -> usize {
		self.tx.send(Err(error)).unwrap_or(0)
	}

	pub fn receiver_count(&self) -> usize {
		self.tx.receiver_count()
	}

	pub fn observable(&self) -> Observable<T> {
		Observable::new(self.clone())
	}
}

impl<T: Clone + Send + Sync + 'static> Default for EmissionBroadcaster<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T: Clone + Send + Sync + 'static> Subscribable<T> for EmissionBroadcaster<T> {
	fn subscribe(&self, observer: Observer<T>) -> Subscription {
		let mut rx = self.tx.subscribe();

		let stream = async_stream::stream! {
			loop {
				match rx.recv().await {
					Ok(item) => yield item,
					Err(broadcast::error::RecvError::Lagged(skipped)) => {
						tracing::warn!(skipped, "subscriber lagged behind broadcaster");
					}
					Err(broadcast::error::RecvError::Closed) => break,
				}
			}
		};

		spawn_delivery(stream, observer)
	}
}
