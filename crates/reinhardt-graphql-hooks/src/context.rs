//! Context scopes and the client context
//!
//! A [`Scope`] is one node of an explicit context tree. Values provided on a
//! scope are visible to the scope itself and every descendant; a descendant
//! may shadow a value by providing its own. There is no global context.

use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use crate::client::SharedClient;

type Values = HashMap<TypeId, Box<dyn Any + Send + Sync>>;

struct ScopeInner {
	values: RwLock<Values>,
	parent: Option<Scope>,
}

/// A node in the context tree
///
/// # Examples
///
/// ```
/// use reinhardt_graphql_hooks::Scope;
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Theme(&'static str);
///
/// let root = Scope::root();
/// root.provide(Theme("light"));
///
/// let page = root.child();
/// assert_eq!(page.use_context::<Theme>(), Some(Theme("light")));
///
/// let dialog = page.child();
/// dialog.provide(Theme("dark"));
/// assert_eq!(dialog.use_context::<Theme>(), Some(Theme("dark")));
/// assert_eq!(page.use_context::<Theme>(), Some(Theme("light")));
/// ```
#[derive(Clone)]
pub struct Scope {
	inner: Arc<ScopeInner>,
}

impl Scope {
	/// Create a scope with no parent
	pub fn root() -> Self {
		Self {
			inner: Arc::new(ScopeInner {
				values: RwLock::new(HashMap::new()),
				parent: None,
			}),
		}
	}

	/// Create a scope nested under this one
	pub fn child(&self) -> Self {
		Self {
			inner: Arc::new(ScopeInner {
				values: RwLock::new(HashMap::new()),
				parent: Some(self.clone()),
			}),
		}
	}

	/// Provide a value to this scope and its descendants
	///
	/// Providing a second value of the same type on the same scope replaces
	/// the first.
	pub fn provide<T: Clone + Send + Sync + 'static>(&self, value: T) {
		self.inner
			.values
			.write()
			.insert(TypeId::of::<T>(), Box::new(value));
	}

	/// Read the value provided by the nearest scope, starting with this one
	pub fn use_context<T: Clone + Send + Sync + 'static>(&self) -> Option<T> {
		let mut scope = Some(self);
		while let Some(current) = scope {
			let found = current
				.inner
				.values
				.read()
				.get(&TypeId::of::<T>())
				.and_then(|value| value.downcast_ref::<T>().cloned());
			if found.is_some() {
				return found;
			}
			scope = current.inner.parent.as_ref();
		}
		None
	}
}

impl Default for Scope {
	fn default() -> Self {
		Self::root()
	}
}

impl std::fmt::Debug for Scope {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Scope")
			.field("values", &self.inner.values.read().len())
			.field("has_parent", &self.inner.parent.is_some())
			.finish()
	}
}

/// Shared slot holding the client for a subtree
///
/// Clones observe the same slot, so a client installed after a hook was
/// created is seen by that hook's next execution.
#[derive(Clone, Default)]
pub struct ClientContext {
	slot: Arc<RwLock<Option<SharedClient>>>,
}

impl ClientContext {
	/// An empty context
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_client(client: SharedClient) -> Self {
		Self {
			slot: Arc::new(RwLock::new(Some(client))),
		}
	}

	pub fn client(&self) -> Option<SharedClient> {
		self.slot.read().clone()
	}

	pub fn set_client(&self, client: SharedClient) {
		*self.slot.write() = Some(client);
	}

	/// Remove the client, returning it
	pub fn clear(&self) -> Option<SharedClient> {
		self.slot.write().take()
	}

	pub fn is_empty(&self) -> bool {
		self.slot.read().is_none()
	}

	/// Whether both handles point at the same slot
	pub fn same_slot(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.slot, &other.slot)
	}
}

impl std::fmt::Debug for ClientContext {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ClientContext")
			.field("has_client", &!self.is_empty())
			.finish()
	}
}
