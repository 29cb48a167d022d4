//! Observable result adapter
//!
//! Bridges a multi-emission result stream to a single settlement. The first
//! terminal emission decides the outcome:
//!
//! | Emission                         | Policy          | Outcome                              |
//! |----------------------------------|-----------------|--------------------------------------|
//! | stream-level error               | any             | `on_error`, reject                   |
//! | data, no error                   | any             | `on_completed`, resolve              |
//! | data + error                     | `Ignore`        | `on_completed`, resolve              |
//! | data + error                     | `None` / `All`  | `on_error`, reject                   |
//! | error, no data                   | any             | `on_error`, reject                   |
//! | neither (loading)                | any             | skipped                              |
//!
//! Callbacks are awaited before settling. A failing `on_completed` turns the
//! resolution into a rejection with [`ClientError::Callback`]; a failing
//! `on_error` is logged and the original error still rejects.
//!
//! After settlement, error-carrying emissions still reach `on_error` and
//! nothing re-settles. After [`Subscription::unsubscribe`], nothing reaches any
//! callback and an unsettled [`Settlement`] stays pending forever.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::{mpsc, oneshot};

use crate::callback::AsyncCallback;
use crate::emission::Emission;
use crate::error::ClientError;
use crate::observable::{Observable, Observer, Subscription, SubscriptionToken};
use crate::policy::ErrorPolicy;

/// Side effects and policy for one execution
pub struct SettleOptions<T> {
	pub error_policy: ErrorPolicy,
	pub on_completed: Option<AsyncCallback<T>>,
	pub on_error: Option<AsyncCallback<ClientError>>,
}

impl<T> SettleOptions<T> {
	pub fn new() -> Self {
		Self {
			error_policy: ErrorPolicy::default(),
			on_completed: None,
			on_error: None,
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
}

impl<T> Default for SettleOptions<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T> Clone for SettleOptions<T> {
	fn clone(&self) -> Self {
		Self {
			error_policy: self.error_policy,
			on_completed: self.on_completed.clone(),
			on_error: self.on_error.clone(),
		}
	}
}

impl<T> std::fmt::Debug for SettleOptions<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SettleOptions")
			.field("error_policy", &self.error_policy)
			.field("on_completed", &self.on_completed.is_some())
			.field("on_error", &self.on_error.is_some())
			.finish()
	}
}

/// The single asynchronous outcome of an execution
///
/// Resolves or rejects at most once. If the execution is torn down before a
/// terminal emission, the future never completes. Once the outcome has been
/// taken, further polls stay pending.
#[derive(Debug)]
pub struct Settlement<T> {
	receiver: oneshot::Receiver<Result<T, ClientError>>,
	state: SettlementState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SettlementState {
	Waiting,
	Taken,
	Abandoned,
}

impl<T> Settlement<T> {
	pub(crate) fn new(receiver: oneshot::Receiver<Result<T, ClientError>>) -> Self {
		Self {
			receiver,
			state: SettlementState::Waiting,
		}
	}

	/// Take the outcome if it is already available
	pub fn try_outcome(&mut self) -> Option<Result<T, ClientError>> {
		if self.state != SettlementState::Waiting {
			return None;
		}
		match self.receiver.try_recv() {
			Ok(outcome) => {
				self.state = SettlementState::Taken;
				Some(outcome)
			}
			Err(oneshot::error::TryRecvError::Empty) => None,
			Err(oneshot::error::TryRecvError::Closed) => {
				self.state = SettlementState::Abandoned;
				None
			}
		}
	}

	/// Whether the execution ended without ever settling
	pub fn is_abandoned(&self) -> bool {
		self.state == SettlementState::Abandoned
	}
}

impl<T> Future for Settlement<T> {
	type Output = Result<T, ClientError>;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		if self.state != SettlementState::Waiting {
			return Poll::Pending;
		}
		match Pin::new(&mut self.receiver).poll(cx) {
			Poll::Ready(Ok(outcome)) => {
				self.state = SettlementState::Taken;
				Poll::Ready(outcome)
			}
			// Sender dropped without settling: torn down, stay pending
			Poll::Ready(Err(_)) => {
				self.state = SettlementState::Abandoned;
				Poll::Pending
			}
			Poll::Pending => Poll::Pending,
		}
	}
}

/// A running execution: its settlement plus the handle that tears it down
#[derive(Debug)]
pub struct Execution<T> {
	pub settlement: Settlement<T>,
	pub subscription: Subscription,
}

impl<T> Execution<T> {
	pub fn into_parts(self) -> (Settlement<T>, Subscription) {
		(self.settlement, self.subscription)
	}
}

enum Event<T> {
	Next(Emission<T>),
	Error(ClientError),
}

/// Subscribe to `observable` and settle on its first terminal emission
///
/// Must be called within a Tokio runtime.
///
/// Under [`ErrorPolicy::Ignore`] an emission carrying both data and an error
/// settles as a success: only `on_completed` runs and `on_error` is not
/// called for the ignored error.
///
/// # Examples
///
/// ```
/// use futures_util::stream;
/// use reinhardt_graphql_core::{Emission, Observable, SettleOptions, settle_first};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let observable = Observable::from_stream_fn(|| {
///     stream::iter(vec![
///         Ok(Emission::loading()),
///         Ok(Emission::data("Canberra".to_string())),
///     ])
/// });
///
/// let execution = settle_first(&observable, SettleOptions::new());
/// assert_eq!(execution.settlement.await.unwrap(), "Canberra");
/// # }
/// ```
pub fn settle_first<T>(observable: &Observable<T>, options: SettleOptions<T>) -> Execution<T>
where
	T: Clone + Send + 'static,
{
	let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event<T>>();
	let error_tx = event_tx.clone();
	let observer = Observer::new(
		move |emission| {
			let _ = event_tx.send(Event::Next(emission));
		},
		move |error| {
			let _ = error_tx.send(Event::Error(error));
		},
	);

	let subscription = observable.subscribe(observer);
	let token = subscription.token();
	let id = subscription.id();
	let (settle_tx, settle_rx) = oneshot::channel();

	tokio::spawn(async move {
		let mut settler = Settler::new(settle_tx, options, token);
		while let Some(event) = event_rx.recv().await {
			if settler.token.is_closed() {
				break;
			}
			settler.handle(event).await;
		}
		tracing::trace!(subscription = %id, settled = settler.is_settled(), "adapter finished");
	});

	Execution {
		settlement: Settlement::new(settle_rx),
		subscription,
	}
}

struct Settler<T> {
	resolver: Option<oneshot::Sender<Result<T, ClientError>>>,
	options: SettleOptions<T>,
	token: SubscriptionToken,
}

impl<T: Clone + Send + 'static> Settler<T> {
	fn new(
		resolver: oneshot::Sender<Result<T, ClientError>>,
		options: SettleOptions<T>,
		token: SubscriptionToken,
	) -> Self {
		Self {
			resolver: Some(resolver),
			options,
			token,
		}
	}

	fn is_settled(&self) -> bool {
		self.resolver.is_none()
	}

	async fn handle(&mut self, event: Event<T>) {
		match event {
			Event::Error(error) => {
				tracing::trace!(%error, "stream-level error received");
				self.fail(error).await;
			}
			Event::Next(emission) => {
				tracing::trace!(
					has_data = emission.data.is_some(),
					has_error = emission.error.is_some(),
					"emission received"
				);
				self.next(emission).await;
			}
		}
	}

	async fn next(&mut self, emission: Emission<T>) {
		match emission {
			Emission {
				data: Some(data),
				error: Some(_),
			} if self.options.error_policy.ignores_errors() => self.complete(data).await,
			Emission {
				error: Some(error), ..
			} => self.fail(error).await,
			Emission {
				data: Some(data),
				error: None,
			} => self.complete(data).await,
			Emission {
				data: None,
				error: None,
			} => tracing::trace!("loading emission skipped"),
		}
	}

	async fn complete(&mut self, data: T) {
		if self.is_settled() {
			tracing::trace!("emission after settlement ignored");
			return;
		}
		let outcome = run_completed(&self.options, data).await;
		if self.token.is_closed() {
			return;
		}
		self.settle(outcome);
	}

	async fn fail(&mut self, error: ClientError) {
		run_error(&self.options, &error).await;
		if self.is_settled() {
			tracing::trace!(%error, "error after settlement observed");
			return;
		}
		if self.token.is_closed() {
			return;
		}
		self.settle(Err(error));
	}

	fn settle(&mut self, outcome: Result<T, ClientError>) {
		if let Some(resolver) = self.resolver.take() {
			tracing::debug!(resolved = outcome.is_ok(), "execution settled");
			// Receiver may already be gone; the outcome is simply unobserved
			let _ = resolver.send(outcome);
		}
	}
}

/// Await `on_completed`; its failure replaces the success
pub(crate) async fn run_completed<T: Clone + Send + 'static>(
	options: &SettleOptions<T>,
	data: T,
) -> Result<T, ClientError> {
	match &options.on_completed {
		Some(callback) => match callback.call(data.clone()).await {
			Ok(()) => Ok(data),
			Err(error) => Err(ClientError::Callback(error)),
		},
		None => Ok(data),
	}
}

/// Await `on_error`; its failure is only logged
pub(crate) async fn run_error<T: Send + 'static>(
	options: &SettleOptions<T>,
	error: &ClientError,
) {
	if let Some(callback) = &options.on_error
		&& let Err(callback_error) = callback.call(error.clone()).await
	{
		tracing::warn!(%callback_error, %error, "on_error callback failed");
	}
}
