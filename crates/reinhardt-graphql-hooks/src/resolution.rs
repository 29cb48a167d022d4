//! Client generators and the client resolution strategy

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use reinhardt_graphql_core::ClientError;
use std::future::Future;
use std::sync::Arc;

use crate::client::SharedClient;
use crate::config::ClientConfig;
use crate::context::{ClientContext, Scope};
use crate::registry::ClientRegistry;

type GenerateFn = dyn Fn() -> BoxFuture<'static, Result<SharedClient, ClientError>> + Send + Sync;

/// Asynchronous client factory
///
/// # Examples
///
/// ```
/// use reinhardt_graphql_hooks::ClientGenerator;
/// use reinhardt_graphql_hooks::ClientError;
///
/// let generator = ClientGenerator::new(|| async {
///     Err(ClientError::Construction("no endpoint configured".to_string()))
/// });
/// # let _ = generator;
/// ```
#[derive(Clone)]
pub struct ClientGenerator {
	inner: Arc<GenerateFn>,
}

impl ClientGenerator {
	pub fn new<F, Fut>(f: F) -> Self
	where
		F: Fn() -> Fut + Send + Sync + 'static,
		Fut: Future<Output = Result<SharedClient, ClientError>> + Send + 'static,
	{
		Self {
			inner: Arc::new(move || f().boxed()),
		}
	}

	/// A generator that always hands out the same client
	pub fn from_client(client: SharedClient) -> Self {
		Self::new(move || {
			let client = Arc::clone(&client);
			async move { Ok(client) }
		})
	}

	/// A generator backed by a memoizing registry
	pub fn from_registry(registry: ClientRegistry, config: ClientConfig) -> Self {
		let config = Arc::new(config);
		Self::new(move || {
			let registry = registry.clone();
			let config = Arc::clone(&config);
			async move { registry.get_or_build(&config).await }
		})
	}

	pub async fn generate(&self) -> Result<SharedClient, ClientError> {
		(self.inner)().await
	}
}

impl std::fmt::Debug for ClientGenerator {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ClientGenerator")
			.field("inner", &"<function>")
			.finish()
	}
}

/// Where an execution gets its client from
#[derive(Debug, Clone)]
pub enum ClientResolution {
	/// Read whatever client the context slot holds at execution time
	Context(ClientContext),
	/// Build (or fetch) a client through a factory
	Factory(ClientGenerator),
}

impl ClientResolution {
	/// The default strategy for hooks created under `scope`
	///
	/// `None` when no [`ClientContext`] has been provided.
	pub fn from_scope(scope: &Scope) -> Option<Self> {
		scope.use_context::<ClientContext>().map(Self::Context)
	}

	/// Produce the client, or [`ClientError::NoClient`] when the context is empty
	pub async fn resolve(&self) -> Result<SharedClient, ClientError> {
		match self {
			Self::Context(context) => context.client().ok_or(ClientError::NoClient),
			Self::Factory(generator) => generator.generate().await,
		}
	}
}

/// Resolve with an optional strategy, treating absence as a missing client
pub(crate) async fn resolve_client(
	resolution: Option<&ClientResolution>,
) -> Result<SharedClient, ClientError> {
	match resolution {
		Some(resolution) => resolution.resolve().await,
		None => Err(ClientError::NoClient),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::MockClient;
	use rstest::rstest;

	#[rstest]
	#[tokio::test]
	async fn test_empty_context_is_no_client() {
		let resolution = ClientResolution::Context(ClientContext::new());
		assert_eq!(resolution.resolve().await.err(), Some(ClientError::NoClient));
	}

	#[rstest]
	#[tokio::test]
	async fn test_context_is_read_at_resolution_time() {
		let context = ClientContext::new();
		let resolution = ClientResolution::Context(context.clone());

		context.set_client(MockClient::new().shared());

		assert!(resolution.resolve().await.is_ok());
	}

	#[rstest]
	#[tokio::test]
	async fn test_factory_errors_propagate() {
		let resolution = ClientResolution::Factory(ClientGenerator::new(|| async {
			Err(ClientError::Construction("offline".to_string()))
		}));
		assert_eq!(
			resolution.resolve().await.err(),
			Some(ClientError::Construction("offline".to_string()))
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_missing_strategy_is_no_client() {
		assert_eq!(resolve_client(None).await.err(), Some(ClientError::NoClient));
	}

	#[rstest]
	fn test_from_scope_finds_nearest_context() {
		let root = Scope::root();
		assert!(ClientResolution::from_scope(&root).is_none());

		root.provide(ClientContext::new());
		assert!(matches!(
			ClientResolution::from_scope(&root.child()),
			Some(ClientResolution::Context(_))
		));
	}
}
