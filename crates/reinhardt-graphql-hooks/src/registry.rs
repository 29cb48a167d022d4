//! Memoized client construction
//!
//! A [`ClientRegistry`] builds at most one client per configuration. Callers
//! racing on the same [`ConfigKey`] wait for a single build; a failed build
//! leaves the entry empty so the next caller tries again.

use dashmap::DashMap;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use reinhardt_graphql_core::ClientError;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::client::SharedClient;
use crate::config::{ClientConfig, ConfigKey};

type BuildFn =
	dyn Fn(ClientConfig) -> BoxFuture<'static, Result<SharedClient, ClientError>> + Send + Sync;

/// Registry of constructed clients keyed by configuration
///
/// Cloning is cheap; clones share the same entries.
#[derive(Clone)]
pub struct ClientRegistry {
	clients: Arc<DashMap<ConfigKey, Arc<OnceCell<SharedClient>>>>,
	build: Arc<BuildFn>,
}

impl ClientRegistry {
	/// Create a registry that builds clients with `build`
	pub fn new<F, Fut>(build: F) -> Self
	where
		F: Fn(ClientConfig) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = Result<SharedClient, ClientError>> + Send + 'static,
	{
		Self {
			clients: Arc::new(DashMap::new()),
			build: Arc::new(move |config| build(config).boxed()),
		}
	}

	/// Return the client for `config`, building it on first use
	///
	/// An invalid configuration fails with [`ClientError::Construction`]
	/// without reaching the builder.
	pub async fn get_or_build(&self, config: &ClientConfig) -> Result<SharedClient, ClientError> {
		config
			.validate()
			.map_err(|e| ClientError::Construction(e.to_string()))?;

		let key = config.identity();
		let cell = Arc::clone(self.clients.entry(key.clone()).or_default().value());

		let mut built = false;
		let client = cell
			.get_or_try_init(|| {
				built = true;
				tracing::debug!(endpoint = %config.endpoint, "building client");
				(self.build)(config.clone())
			})
			.await
			.inspect_err(|error| tracing::debug!(%error, endpoint = %config.endpoint, "client build failed"))?;

		if !built {
			tracing::debug!(endpoint = %config.endpoint, "reusing client");
		}
		Ok(Arc::clone(client))
	}

	/// The client already built for `key`, if any
	pub fn get(&self, key: &ConfigKey) -> Option<SharedClient> {
		self.clients
			.get(key)
			.and_then(|cell| cell.get().map(Arc::clone))
	}

	/// Forget the client built for `key`
	pub fn remove(&self, key: &ConfigKey) -> Option<SharedClient> {
		self.clients
			.remove(key)
			.and_then(|(_, cell)| cell.get().map(Arc::clone))
	}

	/// Number of clients currently built
	pub fn len(&self) -> usize {
		self.clients
			.iter()
			.filter(|entry| entry.value().initialized())
			.count()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn clear(&self) {
		self.clients.clear();
	}
}

impl std::fmt::Debug for ClientRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ClientRegistry")
			.field("clients", &self.len())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::MockClient;
	use rstest::*;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::time::Duration;

	#[fixture]
	fn builds() -> Arc<AtomicUsize> {
		Arc::new(AtomicUsize::new(0))
	}

	fn counting_registry(builds: &Arc<AtomicUsize>) -> ClientRegistry {
		let builds = Arc::clone(builds);
		ClientRegistry::new(move |_config| {
			let builds = Arc::clone(&builds);
			async move {
				builds.fetch_add(1, Ordering::SeqCst);
				tokio::time::sleep(Duration::from_millis(10)).await;
				Ok(MockClient::new().shared())
			}
		})
	}

	#[rstest]
	#[tokio::test]
	async fn test_same_config_builds_once(builds: Arc<AtomicUsize>) {
		let registry = counting_registry(&builds);
		let config = ClientConfig::new("http://localhost:4000/graphql");

		let first = registry.get_or_build(&config).await.unwrap();
		let second = registry.get_or_build(&config.clone()).await.unwrap();

		assert!(Arc::ptr_eq(&first, &second));
		assert_eq!(builds.load(Ordering::SeqCst), 1);
		assert_eq!(registry.len(), 1);
	}

	#[rstest]
	#[tokio::test]
	async fn test_concurrent_callers_share_one_build(builds: Arc<AtomicUsize>) {
		let registry = counting_registry(&builds);
		let config = ClientConfig::new("http://localhost:4000/graphql");

		let (a, b, c) = tokio::join!(
			registry.get_or_build(&config),
			registry.get_or_build(&config),
			registry.get_or_build(&config),
		);

		assert!(a.is_ok() && b.is_ok() && c.is_ok());
		assert_eq!(builds.load(Ordering::SeqCst), 1);
	}

	#[rstest]
	#[tokio::test]
	async fn test_distinct_configs_build_separately(builds: Arc<AtomicUsize>) {
		let registry = counting_registry(&builds);

		registry
			.get_or_build(&ClientConfig::new("http://a.example/graphql"))
			.await
			.unwrap();
		registry
			.get_or_build(&ClientConfig::new("http://b.example/graphql"))
			.await
			.unwrap();

		assert_eq!(builds.load(Ordering::SeqCst), 2);
	}

	#[rstest]
	#[tokio::test]
	async fn test_failed_build_is_retried(builds: Arc<AtomicUsize>) {
		let attempts = Arc::clone(&builds);
		let registry = ClientRegistry::new(move |_config| {
			let attempt = attempts.fetch_add(1, Ordering::SeqCst);
			async move {
				if attempt == 0 {
					Err(ClientError::Construction("endpoint unreachable".to_string()))
				} else {
					Ok(MockClient::new().shared())
				}
			}
		});
		let config = ClientConfig::new("http://localhost:4000/graphql");

		assert!(registry.get_or_build(&config).await.is_err());
		assert!(registry.is_empty());
		assert!(registry.get_or_build(&config).await.is_ok());
		assert_eq!(builds.load(Ordering::SeqCst), 2);
	}

	#[rstest]
	#[tokio::test]
	async fn test_invalid_config_never_reaches_builder(builds: Arc<AtomicUsize>) {
		let registry = counting_registry(&builds);

		let result = registry.get_or_build(&ClientConfig::new("  ")).await;

		assert!(matches!(result, Err(ClientError::Construction(_))));
		assert_eq!(builds.load(Ordering::SeqCst), 0);
	}

	#[rstest]
	#[tokio::test]
	async fn test_remove_forces_rebuild(builds: Arc<AtomicUsize>) {
		let registry = counting_registry(&builds);
		let config = ClientConfig::new("http://localhost:4000/graphql");

		registry.get_or_build(&config).await.unwrap();
		assert!(registry.get(&config.identity()).is_some());
		assert!(registry.remove(&config.identity()).is_some());
		registry.get_or_build(&config).await.unwrap();

		assert_eq!(builds.load(Ordering::SeqCst), 2);
	}
}
