//! Lazy query hook: use_lazy_query

use reinhardt_graphql_core::{ClientError, Variables};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;

use super::{QueryOptions, QueryRunner};
use crate::context::Scope;
use crate::resolution::resolve_client;
use crate::resource::Resource;

/// Handle returned by [`use_lazy_query`]
pub struct LazyQueryHandle<T, V: ?Sized> {
	runner: Arc<QueryRunner<T>>,
	_variables: PhantomData<fn(&V)>,
}

impl<T, V> LazyQueryHandle<T, V>
where
	T: DeserializeOwned + Clone + Send + Sync + 'static,
	V: Serialize + ?Sized,
{
	pub fn resource(&self) -> Resource<T> {
		self.runner.resource()
	}

	/// Start an execution, replacing any previous one
	///
	/// Returns once the query is subscribed; the outcome arrives through
	/// [`resource`](Self::resource). Fails without subscribing when the
	/// document or variables are invalid or no client resolves.
	pub async fn execute(&self, variables: &V) -> Result<(), ClientError> {
		let request = self.runner.request(Variables::from_serialize(variables)?)?;
		let client = resolve_client(self.runner.resolution.as_ref()).await?;
		self.runner.execute_with(&client, request);
		Ok(())
	}

	pub fn dispose(&self) {
		self.runner.teardown();
	}
}

impl<T, V: ?Sized> Clone for LazyQueryHandle<T, V> {
	fn clone(&self) -> Self {
		Self {
			runner: Arc::clone(&self.runner),
			_variables: PhantomData,
		}
	}
}

impl<T, V: ?Sized> std::fmt::Debug for LazyQueryHandle<T, V> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("LazyQueryHandle").finish_non_exhaustive()
	}
}

/// Prepare a query that runs only when asked
///
/// The resource stays [`ResourceState::Idle`](crate::ResourceState::Idle)
/// until the first [`execute`](LazyQueryHandle::execute).
pub fn use_lazy_query<T, V>(
	scope: &Scope,
	document: &str,
	options: QueryOptions<T>,
) -> LazyQueryHandle<T, V>
where
	T: DeserializeOwned + Clone + Send + Sync + 'static,
	V: Serialize + ?Sized,
{
	LazyQueryHandle {
		runner: Arc::new(QueryRunner::new(scope, document, options)),
		_variables: PhantomData,
	}
}
