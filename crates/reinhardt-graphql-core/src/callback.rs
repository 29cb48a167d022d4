//! Asynchronous side-effect callbacks
//!
//! `on_completed` and `on_error` handlers are awaited before the result they
//! accompany settles, so a handler may perform its own async work (update a
//! store, navigate, log remotely) and report failure through
//! [`CallbackError`].
//!
//! ## Example
//!
//! ```
//! use reinhardt_graphql_core::AsyncCallback;
//!
//! let on_completed = AsyncCallback::from_fn(|capital: String| {
//!     println!("capital is {capital}");
//! });
//!
//! let on_error = AsyncCallback::new(|message: String| async move {
//!     if message.is_empty() {
//!         return Err("empty error message".into());
//!     }
//!     Ok(())
//! });
//! # let _ = (on_completed, on_error);
//! ```

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;

/// Failure reported by a user callback
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Callback error: {0}")]
pub struct CallbackError(pub String);

impl From<String> for CallbackError {
	fn from(message: String) -> Self {
		Self(message)
	}
}

impl From<&str> for CallbackError {
	fn from(message: &str) -> Self {
		Self(message.to_string())
	}
}

type CallbackFn<Args> =
	dyn Fn(Args) -> BoxFuture<'static, Result<(), CallbackError>> + Send + Sync + 'static;

/// A cloneable, awaitable callback
///
/// The wrapped function lives behind an `Arc`, so cloning is cheap and every
/// clone invokes the same function.
pub struct AsyncCallback<Args> {
	inner: Arc<CallbackFn<Args>>,
}

impl<Args: Send + 'static> AsyncCallback<Args> {
	/// Wrap an async function or closure
	pub fn new<F, Fut>(f: F) -> Self
	where
		F: Fn(Args) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = Result<(), CallbackError>> + Send + 'static,
	{
		Self {
			inner: Arc::new(move |args| f(args).boxed()),
		}
	}

	/// Wrap a synchronous, infallible function
	pub fn from_fn<F>(f: F) -> Self
	where
		F: Fn(Args) + Send + Sync + 'static,
	{
		Self {
			inner: Arc::new(move |args| {
				f(args);
				futures_util::future::ready(Ok(())).boxed()
			}),
		}
	}

	/// Invoke the callback and wait for it to finish
	pub async fn call(&self, args: Args) -> Result<(), CallbackError> {
		(self.inner)(args).await
	}
}

impl<Args> Clone for AsyncCallback<Args> {
	fn clone(&self) -> Self {
		Self {
			inner: Arc::clone(&self.inner),
		}
	}
}

impl<Args> std::fmt::Debug for AsyncCallback<Args> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AsyncCallback")
			.field("inner", &"<function>")
			.finish()
	}
}
