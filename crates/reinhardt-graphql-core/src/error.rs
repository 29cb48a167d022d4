//! Error taxonomy shared by every execution path
//!
//! Stream-level failures, data-level GraphQL errors and the missing-client
//! condition all surface as [`ClientError`]. The type is `Clone` because a
//! single outcome is handed to callbacks, resource slots and broadcast
//! subscribers alike.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::callback::CallbackError;

/// Source position of a GraphQL error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLocation {
	pub line: usize,
	pub column: usize,
}

/// A single error entry from a GraphQL response `errors` array
///
/// # Examples
///
/// ```
/// use reinhardt_graphql_core::GraphQLErrorItem;
///
/// let error = GraphQLErrorItem::new("Country not found");
/// assert_eq!(error.message, "Country not found");
/// assert!(error.locations.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQLErrorItem {
	pub message: String,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub locations: Vec<ErrorLocation>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub path: Vec<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub extensions: Option<Map<String, Value>>,
}

impl GraphQLErrorItem {
	/// Create an error entry carrying only a message
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
			locations: Vec::new(),
			path: Vec::new(),
			extensions: None,
		}
	}

	/// Attach a response path (field names and list indices)
	pub fn with_path(mut self, path: Vec<Value>) -> Self {
		self.path = path;
		self
	}
}

/// Non-empty list of GraphQL errors accompanying a response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GraphQLErrors(Vec<GraphQLErrorItem>);

impl GraphQLErrors {
	pub fn new(errors: Vec<GraphQLErrorItem>) -> Self {
		Self(errors)
	}

	pub fn single(message: impl Into<String>) -> Self {
		Self(vec![GraphQLErrorItem::new(message)])
	}

	pub fn items(&self) -> &[GraphQLErrorItem] {
		&self.0
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn into_inner(self) -> Vec<GraphQLErrorItem> {
		self.0
	}
}

impl fmt::Display for GraphQLErrors {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let messages: Vec<&str> = self.0.iter().map(|e| e.message.as_str()).collect();
		write!(f, "{}", messages.join("; "))
	}
}

/// Errors produced while executing a query or mutation
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClientError {
	/// Neither a context client nor a client factory could supply a client
	#[error("No client")]
	NoClient,
	#[error("Network error: {0}")]
	Network(String),
	#[error("GraphQL error: {0}")]
	GraphQL(GraphQLErrors),
	#[error(transparent)]
	Callback(#[from] CallbackError),
	#[error("Invalid query: {0}")]
	InvalidQuery(String),
	#[error("Decode error: {0}")]
	Decode(String),
	#[error("Encode error: {0}")]
	Encode(String),
	#[error("Empty response: neither data nor errors were returned")]
	EmptyResponse,
	#[error("Client construction failed: {0}")]
	Construction(String),
}

impl ClientError {
	/// Build a data-level error from a list of response errors
	pub fn graphql(errors: Vec<GraphQLErrorItem>) -> Self {
		Self::GraphQL(GraphQLErrors::new(errors))
	}

	/// Whether this error was carried by the response payload rather than the transport
	pub fn is_data_level(&self) -> bool {
		matches!(self, Self::GraphQL(_))
	}
}

pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_no_client_message() {
		assert_eq!(ClientError::NoClient.to_string(), "No client");
	}

	#[rstest]
	fn test_graphql_errors_display_joins_messages() {
		let error = ClientError::graphql(vec![
			GraphQLErrorItem::new("first"),
			GraphQLErrorItem::new("second"),
		]);
		assert_eq!(error.to_string(), "GraphQL error: first; second");
		assert!(error.is_data_level());
	}

	#[rstest]
	fn test_error_item_deserializes_from_response_shape() {
		let raw = serde_json::json!({
			"message": "Cannot query field",
			"locations": [{"line": 2, "column": 3}],
			"path": ["country", 0],
		});
		let item: GraphQLErrorItem = serde_json::from_value(raw).unwrap();

		assert_eq!(item.message, "Cannot query field");
		assert_eq!(item.locations, vec![ErrorLocation { line: 2, column: 3 }]);
		assert_eq!(item.path.len(), 2);
		assert!(item.extensions.is_none());
	}
}
