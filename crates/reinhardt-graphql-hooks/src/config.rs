//! Client configuration
//!
//! A [`ClientConfig`] describes the client a generator should build. It can be
//! written by hand, read from TOML or collected from prefixed environment
//! variables:
//!
//! | Variable                   | Field                   |
//! |----------------------------|-------------------------|
//! | `<PREFIX>ENDPOINT`         | `endpoint` (required)   |
//! | `<PREFIX>NAME`             | `name`                  |
//! | `<PREFIX>VERSION`          | `version`               |
//! | `<PREFIX>FETCH_POLICY`     | `default_fetch_policy`  |
//! | `<PREFIX>ERROR_POLICY`     | `default_error_policy`  |
//! | `<PREFIX>HEADER_<NAME>`    | `headers[<name>]`       |
//!
//! Header names taken from the environment are lowercased and `_` becomes `-`.

use indexmap::IndexMap;
use reinhardt_graphql_core::{ErrorPolicy, FetchPolicy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Error type for client configuration
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("TOML error: {0}")]
	Toml(#[from] toml::de::Error),

	#[error("Missing environment variable: {0}")]
	MissingVariable(String),

	#[error("Invalid value for '{key}': {reason}")]
	InvalidValue { key: String, reason: String },
}

/// Settings for one GraphQL client
///
/// # Examples
///
/// ```
/// use reinhardt_graphql_hooks::ClientConfig;
///
/// let config = ClientConfig::from_toml_str(
///     r#"
/// endpoint = "https://countries.example.com/graphql"
/// name = "web"
///
/// [headers]
/// x-api-key = "local"
/// "#,
/// )
/// .unwrap();
///
/// assert_eq!(config.name.as_deref(), Some("web"));
/// assert_eq!(config.headers["x-api-key"], "local");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
	pub endpoint: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub version: Option<String>,
	#[serde(default, skip_serializing_if = "IndexMap::is_empty")]
	pub headers: IndexMap<String, String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub default_fetch_policy: Option<FetchPolicy>,
	#[serde(default)]
	pub default_error_policy: ErrorPolicy,
}

impl ClientConfig {
	pub fn new(endpoint: impl Into<String>) -> Self {
		Self {
			endpoint: endpoint.into(),
			name: None,
			version: None,
			headers: IndexMap::new(),
			default_fetch_policy: None,
			default_error_policy: ErrorPolicy::default(),
		}
	}

	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	pub fn with_version(mut self, version: impl Into<String>) -> Self {
		self.version = Some(version.into());
		self
	}

	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.insert(name.into(), value.into());
		self
	}

	pub fn with_fetch_policy(mut self, policy: FetchPolicy) -> Self {
		self.default_fetch_policy = Some(policy);
		self
	}

	pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
		self.default_error_policy = policy;
		self
	}

	/// Parse and validate a TOML document
	pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(source)?;
		config.validate()?;
		Ok(config)
	}

	pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let source = std::fs::read_to_string(path)?;
		Self::from_toml_str(&source)
	}

	/// Collect the configuration from the process environment
	pub fn from_env(prefix: &str) -> Result<Self, ConfigError> {
		Self::from_vars(prefix, std::env::vars())
	}

	/// Collect the configuration from arbitrary key/value pairs
	pub fn from_vars<I, K, V>(prefix: &str, vars: I) -> Result<Self, ConfigError>
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: Into<String>,
	{
		let mut endpoint = None;
		let mut config = Self::new(String::new());
		let header_prefix = format!("{prefix}HEADER_");

		let mut vars: Vec<(String, String)> = vars
			.into_iter()
			.filter(|(key, _)| key.as_ref().starts_with(prefix))
			.map(|(key, value)| (key.as_ref().to_string(), value.into()))
			.collect();
		vars.sort();

		for (key, value) in vars {
			if let Some(header) = key.strip_prefix(&header_prefix) {
				config
					.headers
					.insert(header.to_ascii_lowercase().replace('_', "-"), value);
				continue;
			}
			match &key[prefix.len()..] {
				"ENDPOINT" => endpoint = Some(value),
				"NAME" => config.name = Some(value),
				"VERSION" => config.version = Some(value),
				"FETCH_POLICY" => config.default_fetch_policy = Some(parse_policy(&key, &value)?),
				"ERROR_POLICY" => config.default_error_policy = parse_policy(&key, &value)?,
				_ => tracing::trace!(%key, "ignoring unrecognised client variable"),
			}
		}

		config.endpoint = endpoint.ok_or_else(|| ConfigError::MissingVariable(format!("{prefix}ENDPOINT")))?;
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.endpoint.trim().is_empty() {
			return Err(ConfigError::InvalidValue {
				key: "endpoint".to_string(),
				reason: "must not be empty".to_string(),
			});
		}
		if let Some(name) = self.headers.keys().find(|name| name.trim().is_empty()) {
			return Err(ConfigError::InvalidValue {
				key: format!("headers.{name:?}"),
				reason: "header name must not be empty".to_string(),
			});
		}
		Ok(())
	}

	/// A stable key identifying this configuration
	///
	/// Configurations with equal fields produce equal keys regardless of the
	/// order in which headers were inserted.
	pub fn identity(&self) -> ConfigKey {
		let headers: BTreeMap<&str, &str> = self
			.headers
			.iter()
			.map(|(name, value)| (name.as_str(), value.as_str()))
			.collect();
		let canonical = serde_json::json!({
			"endpoint": self.endpoint,
			"name": self.name,
			"version": self.version,
			"headers": headers,
			"default_fetch_policy": self.default_fetch_policy,
			"default_error_policy": self.default_error_policy,
		});
		ConfigKey(canonical.to_string())
	}
}

fn parse_policy<P: serde::de::DeserializeOwned>(key: &str, value: &str) -> Result<P, ConfigError> {
	serde_json::from_value(serde_json::Value::String(value.to_ascii_lowercase())).map_err(|e| {
		ConfigError::InvalidValue {
			key: key.to_string(),
			reason: e.to_string(),
		}
	})
}

/// Memoization key derived from a [`ClientConfig`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConfigKey(String);

impl ConfigKey {
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for ConfigKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}
