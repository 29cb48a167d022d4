//! Subscribable result streams
//!
//! A client hands back an [`Observable`] for every query it watches. Each
//! call to [`Observable::subscribe`] starts an independent delivery to one
//! [`Observer`] and returns a [`Subscription`] that stops it.
//!
//! Delivery runs on a spawned Tokio task, so subscribing requires a running
//! runtime. Emissions reach the observer strictly in stream order; an `Err`
//! item is a stream-level error and ends delivery.

use futures_util::{Stream, StreamExt};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

use crate::emission::Emission;
use crate::error::ClientError;

/// Anything that can push emissions to an observer
pub trait Subscribable<T>: Send + Sync + 'static {
	/// Start delivering emissions to `observer`
	fn subscribe(&self, observer: Observer<T>) -> Subscription;
}

type NextFn<T> = Box<dyn FnMut(Emission<T>) + Send>;
type ErrorFn = Box<dyn FnMut(ClientError) + Send>;

/// Receiving end of a subscription
pub struct Observer<T> {
	next: NextFn<T>,
	error: ErrorFn,
}

impl<T> Observer<T> {
	pub fn new<N, E>(next: N, error: E) -> Self
	where
		N: FnMut(Emission<T>) + Send + 'static,
		E: FnMut(ClientError) + Send + 'static,
	{
		Self {
			next: Box::new(next),
			error: Box::new(error),
		}
	}

	pub fn next(&mut self, emission: Emission<T>) {
		(self.next)(emission)
	}

	pub fn error(&mut self, error: ClientError) {
		(self.error)(error)
	}
}

impl<T> std::fmt::Debug for Observer<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Observer").finish_non_exhaustive()
	}
}

type Teardown = Box<dyn FnOnce() + Send>;

struct SubscriptionInner {
	id: Uuid,
	closed: Arc<AtomicBool>,
	teardown: Mutex<Option<Teardown>>,
}

/// Handle for cancelling a delivery
///
/// Clones share state: unsubscribing through any clone closes all of them.
/// Dropping every handle does not unsubscribe.
///
/// # Examples
///
/// ```
/// use reinhardt_graphql_core::Subscription;
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// let torn_down = Arc::new(AtomicUsize::new(0));
/// let subscription = Subscription::new();
/// let counter = Arc::clone(&torn_down);
/// subscription.add_teardown(move || {
///     counter.fetch_add(1, Ordering::SeqCst);
/// });
///
/// subscription.unsubscribe();
/// subscription.unsubscribe();
///
/// assert!(subscription.is_closed());
/// assert_eq!(torn_down.load(Ordering::SeqCst), 1);
/// ```
#[derive(Clone)]
pub struct Subscription {
	inner: Arc<SubscriptionInner>,
}

impl Subscription {
	pub fn new() -> Self {
		Self {
			inner: Arc::new(SubscriptionInner {
				id: Uuid::new_v4(),
				closed: Arc::new(AtomicBool::new(false)),
				teardown: Mutex::new(None),
			}),
		}
	}

	/// A subscription that is already closed
	pub fn closed() -> Self {
		let subscription = Self::new();
		subscription.inner.closed.store(true, Ordering::Release);
		subscription
	}

	pub fn id(&self) -> Uuid {
		self.inner.id
	}

	pub fn is_closed(&self) -> bool {
		self.inner.closed.load(Ordering::Acquire)
	}

	/// Closed-flag check that does not keep the teardown alive
	pub fn token(&self) -> SubscriptionToken {
		SubscriptionToken(Arc::clone(&self.inner.closed))
	}

	/// Register the producer's cleanup
	///
	/// Runs immediately when the subscription is already closed. A second
	/// registration replaces the first.
	pub fn add_teardown<F>(&self, teardown: F)
	where
		F: FnOnce() + Send + 'static,
	{
		let mut slot = self.inner.teardown.lock();
		if self.is_closed() {
			drop(slot);
			teardown();
			return;
		}
		*slot = Some(Box::new(teardown));
	}

	/// Stop delivery; idempotent
	pub fn unsubscribe(&self) {
		if self.inner.closed.swap(true, Ordering::AcqRel) {
			return;
		}
		tracing::debug!(subscription = %self.inner.id, "unsubscribed");
		let teardown = self.inner.teardown.lock().take();
		if let Some(teardown) = teardown {
			teardown();
		}
	}
}

impl Default for Subscription {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Debug for Subscription {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Subscription")
			.field("id", &self.inner.id)
			.field("closed", &self.is_closed())
			.finish()
	}
}

/// Read-only view of a subscription's closed flag
#[derive(Debug, Clone)]
pub struct SubscriptionToken(Arc<AtomicBool>);

impl SubscriptionToken {
	pub fn is_closed(&self) -> bool {
		self.0.load(Ordering::Acquire)
	}
}

/// Pump `stream` into `observer` on a spawned task
pub(crate) fn spawn_delivery<T, S>(stream: S, mut observer: Observer<T>) -> Subscription
where
	T: Send + 'static,
	S: Stream<Item = Result<Emission<T>, ClientError>> + Send + 'static,
{
	let subscription = Subscription::new();
	let token = subscription.token();
	let id = subscription.id();

	let handle = tokio::spawn(async move {
		let mut stream = Box::pin(stream);
		while let Some(item) = stream.next().await {
			if token.is_closed() {
				break;
			}
			match item {
				Ok(emission) => observer.next(emission),
				Err(error) => {
					tracing::debug!(subscription = %id, %error, "stream-level error ends delivery");
					observer.error(error);
					break;
				}
			}
		}
	});
	subscription.add_teardown(move || handle.abort());
	tracing::debug!(subscription = %id, "subscribed");
	subscription
}

struct StreamSource<F> {
	factory: F,
}

impl<T, F, S> Subscribable<T> for StreamSource<F>
where
	T: Send + 'static,
	F: Fn() -> S + Send + Sync + 'static,
	S: Stream<Item = Result<Emission<T>, ClientError>> + Send + 'static,
{
	fn subscribe(&self, observer: Observer<T>) -> Subscription {
		spawn_delivery((self.factory)(), observer)
	}
}

type MapFn<T, U> = dyn Fn(T) -> Result<U, ClientError> + Send + Sync;

struct MapSource<T, U> {
	inner: Observable<T>,
	f: Arc<MapFn<T, U>>,
}

struct MapState<U> {
	observer: Observer<U>,
	failed: bool,
}

impl<T, U> Subscribable<U> for MapSource<T, U>
where
	T: Send + 'static,
	U: Send + 'static,
{
	fn subscribe(&self, observer: Observer<U>) -> Subscription {
		let f = Arc::clone(&self.f);
		let state = Arc::new(Mutex::new(MapState {
			observer,
			failed: false,
		}));
		let error_state = Arc::clone(&state);

		self.inner.subscribe(Observer::new(
			move |emission: Emission<T>| {
				let mut state = state.lock();
				if state.failed {
					return;
				}
				match emission.map(&*f) {
					Ok(mapped) => state.observer.next(mapped),
					Err(error) => {
						state.failed = true;
						state.observer.error(error);
					}
				}
			},
			move |error| {
				let mut state = error_state.lock();
				if !state.failed {
					state.failed = true;
					state.observer.error(error);
				}
			},
		))
	}
}

/// Shared handle over a [`Subscribable`] source
pub struct Observable<T> {
	source: Arc<dyn Subscribable<T>>,
}

impl<T: Send + 'static> Observable<T> {
	pub fn new<S: Subscribable<T>>(source: S) -> Self {
		Self {
			source: Arc::new(source),
		}
	}

	/// Build an observable that creates a fresh stream for every subscriber
	///
	/// # Examples
	///
	/// ```
	/// use futures_util::stream;
	/// use reinhardt_graphql_core::{Emission, Observable};
	///
	/// let observable = Observable::from_stream_fn(|| {
	///     stream::iter(vec![Ok(Emission::data("Canberra".to_string()))])
	/// });
	/// # let _ = observable;
	/// ```
	pub fn from_stream_fn<F, S>(factory: F) -> Self
	where
		F: Fn() -> S + Send + Sync + 'static,
		S: Stream<Item = Result<Emission<T>, ClientError>> + Send + 'static,
	{
		Self::new(StreamSource { factory })
	}

	/// A single-emission observable driven by a future per subscriber
	pub fn once<F, Fut>(factory: F) -> Self
	where
		F: Fn() -> Fut + Send + Sync + 'static,
		Fut: Future<Output = Result<Emission<T>, ClientError>> + Send + 'static,
	{
		Self::from_stream_fn(move || futures_util::stream::once(factory()))
	}

	pub fn subscribe(&self, observer: Observer<T>) -> Subscription {
		self.source.subscribe(observer)
	}

	/// Transform every payload; a failed transformation ends delivery with that error
	pub fn map_data<U, F>(self, f: F) -> Observable<U>
	where
		U: Send + 'static,
		F: Fn(T) -> Result<U, ClientError> + Send + Sync + 'static,
	{
		Observable::new(MapSource {
			inner: self,
			f: Arc::new(f),
		})
	}
}

impl<T> Clone for Observable<T> {
	fn clone(&self) -> Self {
		Self {
			source: Arc::clone(&self.source),
		}
	}
}

impl<T> std::fmt::Debug for Observable<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Observable").finish_non_exhaustive()
	}
}
