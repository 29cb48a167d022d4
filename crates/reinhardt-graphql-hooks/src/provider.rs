//! Client provider
//!
//! A [`GraphQLClientProvider`] owns the [`ClientContext`] of a subtree and
//! the generator that fills it. Construction happens at most once per
//! lifetime of the live client, whichever phase asks first:
//!
//! - [`init`](GraphQLClientProvider::init) during server-side rendering
//! - [`hydrate`](GraphQLClientProvider::hydrate) when the page becomes
//!   interactive
//!
//! A live client is never serialized. [`dehydrate`](GraphQLClientProvider::dehydrate)
//! drops it at the serialization boundary so the interactive side rebuilds it.

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::client::SharedClient;
use crate::context::{ClientContext, Scope};
use crate::resolution::ClientGenerator;
use reinhardt_graphql_core::ClientError;

/// Provides a lazily-constructed client to a subtree of scopes
///
/// # Examples
///
/// ```
/// use reinhardt_graphql_hooks::{ClientContext, ClientGenerator, GraphQLClientProvider, Scope};
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
/// let provider = GraphQLClientProvider::new(ClientGenerator::new(|| async {
///     Ok(RequestClientAdapter::new(Server(serde_json::json!({}))).into_shared())
/// }));
///
/// let app = provider.provide(&Scope::root());
/// provider.init().await.unwrap();
///
/// let context = app.use_context::<ClientContext>().unwrap();
/// assert!(context.client().is_some());
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct GraphQLClientProvider {
	context: ClientContext,
	generator: ClientGenerator,
	construct: Arc<Mutex<()>>,
}

impl GraphQLClientProvider {
	pub fn new(generator: ClientGenerator) -> Self {
		Self::with_context(ClientContext::new(), generator)
	}

	/// Use an existing context, for example one already holding a client
	pub fn with_context(context: ClientContext, generator: ClientGenerator) -> Self {
		Self {
			context,
			generator,
			construct: Arc::new(Mutex::new(())),
		}
	}

	pub fn context(&self) -> &ClientContext {
		&self.context
	}

	/// Create a child of `parent` that carries this provider's context
	pub fn provide(&self, parent: &Scope) -> Scope {
		let scope = parent.child();
		scope.provide(self.context.clone());
		scope
	}

	/// Server-side construction
	pub async fn init(&self) -> Result<SharedClient, ClientError> {
		self.ensure_client("init").await
	}

	/// Interactive-side construction; reuses a client that survived
	pub async fn hydrate(&self) -> Result<SharedClient, ClientError> {
		self.ensure_client("hydrate").await
	}

	/// Drop the live client before the state crosses a serialization boundary
	pub fn dehydrate(&self) -> Option<SharedClient> {
		let dropped = self.context.clear();
		if dropped.is_some() {
			tracing::debug!("client dropped for serialization");
		}
		dropped
	}

	async fn ensure_client(&self, phase: &'static str) -> Result<SharedClient, ClientError> {
		if let Some(client) = self.context.client() {
			tracing::debug!(phase, "reusing client");
			return Ok(client);
		}

		let _guard = self.construct.lock().await;
		// Another caller may have finished while we waited
		if let Some(client) = self.context.client() {
			tracing::debug!(phase, "reusing client");
			return Ok(client);
		}

		tracing::debug!(phase, "constructing client");
		let client = self.generator.generate().await?;
		self.context.set_client(Arc::clone(&client));
		Ok(client)
	}
}
