//! Result emissions and single-shot responses

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ClientError, GraphQLErrorItem};

/// One message delivered by a query result stream
///
/// Both fields may be present at once: partial data accompanied by the
/// errors that prevented the rest of it from resolving.
#[derive(Debug, Clone, PartialEq)]
pub struct Emission<T> {
	pub data: Option<T>,
	pub error: Option<ClientError>,
}

impl<T> Emission<T> {
	/// An emission carrying data and no error
	pub fn data(data: T) -> Self {
		Self {
			data: Some(data),
			error: None,
		}
	}

	/// An emission carrying only an error
	pub fn error(error: ClientError) -> Self {
		Self {
			data: None,
			error: Some(error),
		}
	}

	/// Partial data accompanied by an error
	pub fn partial(data: T, error: ClientError) -> Self {
		Self {
			data: Some(data),
			error: Some(error),
		}
	}

	/// An emission with neither data nor error (a loading notification)
	pub fn loading() -> Self {
		Self {
			data: None,
			error: None,
		}
	}

	pub fn is_loading(&self) -> bool {
		self.data.is_none() && self.error.is_none()
	}

	/// Transform the payload, keeping the error untouched
	pub fn map<U, F>(self, f: F) -> Result<Emission<U>, ClientError>
	where
		F: FnOnce(T) -> Result<U, ClientError>,
	{
		let data = self.data.map(f).transpose()?;
		Ok(Emission {
			data,
			error: self.error,
		})
	}
}

impl<T> From<FetchResult<T>> for Emission<T> {
	fn from(result: FetchResult<T>) -> Self {
		let error = if result.errors.is_empty() {
			None
		} else {
			Some(ClientError::graphql(result.errors))
		};
		Self {
			data: result.data,
			error,
		}
	}
}

/// A single GraphQL response
///
/// # Examples
///
/// ```
/// use reinhardt_graphql_core::FetchResult;
/// use serde_json::json;
///
/// let result: FetchResult<serde_json::Value> = serde_json::from_value(json!({
///     "data": { "country": { "capital": "Canberra" } }
/// }))
/// .unwrap();
///
/// assert!(result.errors.is_empty());
/// assert_eq!(result.data.unwrap()["country"]["capital"], "Canberra");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchResult<T> {
	#[serde(default = "Option::default")]
	pub data: Option<T>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub errors: Vec<GraphQLErrorItem>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub extensions: Option<Map<String, Value>>,
}

impl<T> FetchResult<T> {
	pub fn ok(data: T) -> Self {
		Self {
			data: Some(data),
			errors: Vec::new(),
			extensions: None,
		}
	}

	pub fn with_errors(data: Option<T>, errors: Vec<GraphQLErrorItem>) -> Self {
		Self {
			data,
			errors,
			extensions: None,
		}
	}
}

impl FetchResult<Value> {
	/// Decode the raw payload into a typed result
	pub fn decode<T: DeserializeOwned>(self) -> Result<FetchResult<T>, ClientError> {
		let data = self.data.map(decode_value).transpose()?;
		Ok(FetchResult {
			data,
			errors: self.errors,
			extensions: self.extensions,
		})
	}
}

/// Decode a JSON payload into `T`
pub fn decode_value<T: DeserializeOwned>(value: Value) -> Result<T, ClientError> {
	serde_json::from_value(value).map_err(|e| ClientError::Decode(e.to_string()))
}
