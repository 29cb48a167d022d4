//! Query descriptors and variable bindings
//!
//! A [`QueryDescriptor`] is parsed once, when a hook is created, and shared
//! immutably by every execution it triggers. The text sent to the client is
//! printed from the parsed document, so two spellings of the same document
//! produce the same request.

use async_graphql::parser::parse_query;
use async_graphql::parser::types::OperationType;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

use crate::error::ClientError;

/// Kind of the operation a document declares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
	Query,
	Mutation,
	Subscription,
}

impl From<OperationType> for OperationKind {
	fn from(ty: OperationType) -> Self {
		match ty {
			OperationType::Query => Self::Query,
			OperationType::Mutation => Self::Mutation,
			OperationType::Subscription => Self::Subscription,
		}
	}
}

impl fmt::Display for OperationKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Self::Query => "query",
			Self::Mutation => "mutation",
			Self::Subscription => "subscription",
		};
		f.write_str(name)
	}
}

/// A parsed GraphQL document with exactly one operation
///
/// # Examples
///
/// ```
/// use reinhardt_graphql_core::{OperationKind, QueryDescriptor};
///
/// let descriptor = QueryDescriptor::parse(
///     "query GetCapital($code: ID!) { country(code: $code) { capital } }",
/// )
/// .unwrap();
/// let compact =
///     QueryDescriptor::parse("query GetCapital($code:ID!){country(code:$code){capital}}").unwrap();
///
/// assert_eq!(descriptor.kind(), OperationKind::Query);
/// assert_eq!(descriptor.operation_name(), Some("GetCapital"));
/// assert_eq!(descriptor.text(), compact.text());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDescriptor {
	inner: Arc<DescriptorInner>,
}

#[derive(Debug, PartialEq, Eq)]
struct DescriptorInner {
	text: String,
	kind: OperationKind,
	operation_name: Option<String>,
}

impl QueryDescriptor {
	/// Parse a document and print its canonical text
	///
	/// Fails with [`ClientError::InvalidQuery`] when the source does not parse
	/// or does not contain exactly one operation.
	pub fn parse(source: &str) -> Result<Self, ClientError> {
		let document = parse_query(source).map_err(|e| ClientError::InvalidQuery(e.to_string()))?;

		let mut operations = document.operations.iter();
		let (name, operation) = operations
			.next()
			.ok_or_else(|| ClientError::InvalidQuery("document contains no operation".to_string()))?;
		if operations.next().is_some() {
			return Err(ClientError::InvalidQuery(
				"documents with more than one operation are not supported".to_string(),
			));
		}

		Ok(Self {
			inner: Arc::new(DescriptorInner {
				text: print_canonical(source)?,
				kind: operation.node.ty.into(),
				operation_name: name.map(|n| n.to_string()),
			}),
		})
	}

	/// Parse a document and require a specific operation kind
	pub fn parse_expecting(source: &str, expected: OperationKind) -> Result<Self, ClientError> {
		let descriptor = Self::parse(source)?;
		if descriptor.kind() != expected {
			return Err(ClientError::InvalidQuery(format!(
				"expected a {} operation, found a {}",
				expected,
				descriptor.kind()
			)));
		}
		Ok(descriptor)
	}

	pub fn text(&self) -> &str {
		&self.inner.text
	}

	pub fn kind(&self) -> OperationKind {
		self.inner.kind
	}

	pub fn operation_name(&self) -> Option<&str> {
		self.inner.operation_name.as_deref()
	}
}

impl fmt::Display for QueryDescriptor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.text())
	}
}

/// Print the document back from its syntax tree
///
/// Comments, commas and layout do not survive the round trip, so every
/// spelling of a document prints the same way.
fn print_canonical(source: &str) -> Result<String, ClientError> {
	let document = graphql_parser::parse_query::<&str>(source)
		.map_err(|e| ClientError::InvalidQuery(e.to_string()))?;
	Ok(document.to_string().trim_end().to_string())
}

/// Variable bindings for one execution, as an ordered JSON object
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Variables(Map<String, Value>);

impl Variables {
	pub fn new() -> Self {
		Self(Map::new())
	}

	/// Serialize any value into variable bindings
	///
	/// `null` (for example `()`) produces empty bindings; anything that is not
	/// a JSON object is rejected.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_graphql_core::Variables;
	/// use serde_json::json;
	///
	/// let vars = Variables::from_serialize(&json!({ "code": "AU" })).unwrap();
	/// assert_eq!(vars.get("code"), Some(&json!("AU")));
	///
	/// assert!(Variables::from_serialize(&()).unwrap().is_empty());
	/// assert!(Variables::from_serialize(&42).is_err());
	/// ```
	pub fn from_serialize<V: Serialize + ?Sized>(value: &V) -> Result<Self, ClientError> {
		match serde_json::to_value(value).map_err(|e| ClientError::Encode(e.to_string()))? {
			Value::Object(map) => Ok(Self(map)),
			Value::Null => Ok(Self::new()),
			other => Err(ClientError::Encode(format!(
				"variables must serialize to an object, got {}",
				json_kind(&other)
			))),
		}
	}

	pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
		self.0.insert(name.into(), value)
	}

	pub fn get(&self, name: &str) -> Option<&Value> {
		self.0.get(name)
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn as_map(&self) -> &Map<String, Value> {
		&self.0
	}
}

fn json_kind(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "a boolean",
		Value::Number(_) => "a number",
		Value::String(_) => "a string",
		Value::Array(_) => "an array",
		Value::Object(_) => "an object",
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	fn test_parse_named_query() {
		let descriptor = QueryDescriptor::parse("query Countries { countries { code } }").unwrap();
		assert_eq!(descriptor.kind(), OperationKind::Query);
		assert_eq!(descriptor.operation_name(), Some("Countries"));
	}

	#[rstest]
	fn test_parse_anonymous_query() {
		let descriptor = QueryDescriptor::parse("{ countries { code } }").unwrap();
		assert_eq!(descriptor.kind(), OperationKind::Query);
		assert_eq!(descriptor.operation_name(), None);
	}

	#[rstest]
	fn test_parse_mutation_kind() {
		let descriptor =
			QueryDescriptor::parse("mutation AddTodo($text: String!) { addTodo(text: $text) { id } }")
				.unwrap();
		assert_eq!(descriptor.kind(), OperationKind::Mutation);
	}

	#[rstest]
	fn test_parse_rejects_syntax_error() {
		let result = QueryDescriptor::parse("query { countries { code }");
		assert!(matches!(result, Err(ClientError::InvalidQuery(_))));
	}

	#[rstest]
	fn test_parse_rejects_multiple_operations() {
		let result = QueryDescriptor::parse("query A { a } query B { b }");
		assert!(matches!(result, Err(ClientError::InvalidQuery(_))));
	}

	#[rstest]
	fn test_parse_expecting_mismatch() {
		let result =
			QueryDescriptor::parse_expecting("mutation M { reset }", OperationKind::Query);
		match result {
			Err(ClientError::InvalidQuery(message)) => {
				assert_eq!(message, "expected a query operation, found a mutation");
			}
			other => panic!("expected InvalidQuery, got {other:?}"),
		}
	}

	#[rstest]
	#[case("query { country(code: \"AU\") { capital } }", "query{country(code:\"AU\"){capital}}")]
	#[case("query Q { a }", "query Q {\n\ta\n}\n")]
	#[case("{ a # trailing comment\n b }", "{ a, b }")]
	#[case("query Q( $id : ID! ) { node(id: $id) { id } }", "query Q($id:ID!){node(id:$id){id}}")]
	#[case("{ user @include(if: $show) { id } }", "{user@include(if:$show){id}}")]
	fn test_equivalent_spellings_share_text(#[case] spaced: &str, #[case] other: &str) {
		let a = QueryDescriptor::parse(spaced).unwrap();
		let b = QueryDescriptor::parse(other).unwrap();
		assert_eq!(a.text(), b.text());
		assert_eq!(a, b);
	}

	#[rstest]
	fn test_text_drops_comments_and_keeps_literals() {
		let descriptor =
			QueryDescriptor::parse("# list\n{ search(text: \"two  spaces # kept\") { id } }").unwrap();
		assert!(!descriptor.text().contains("# list"));
		assert!(descriptor.text().contains("two  spaces # kept"));
		assert!(QueryDescriptor::parse(descriptor.text()).is_ok());
	}

	#[rstest]
	fn test_variables_from_struct() {
		#[derive(Serialize)]
		struct Vars {
			code: &'static str,
			limit: u32,
		}

		let vars = Variables::from_serialize(&Vars {
			code: "AU",
			limit: 3,
		})
		.unwrap();
		assert_eq!(vars.get("code"), Some(&json!("AU")));
		assert_eq!(vars.get("limit"), Some(&json!(3)));
	}

	#[rstest]
	fn test_variables_reject_array() {
		let result = Variables::from_serialize(&vec![1, 2]);
		match result {
			Err(ClientError::Encode(message)) => assert!(message.contains("an array")),
			other => panic!("expected Encode error, got {other:?}"),
		}
	}
}
