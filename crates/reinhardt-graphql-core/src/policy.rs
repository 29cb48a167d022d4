//! Per-execution policies

use serde::{Deserialize, Serialize};

/// How data-level errors affect the settled result
///
/// Only [`ErrorPolicy::Ignore`] changes the outcome: an emission that carries
/// errors still resolves with its (possibly partial) data. `None` and `All`
/// both reject.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
	#[default]
	None,
	Ignore,
	All,
}

impl ErrorPolicy {
	pub fn ignores_errors(self) -> bool {
		matches!(self, Self::Ignore)
	}
}

/// Cache interaction requested from the client
///
/// The adapter never interprets this value; it is forwarded to the client
/// collaborator as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchPolicy {
	CacheFirst,
	CacheOnly,
	NetworkOnly,
	NoCache,
	Standby,
	CacheAndNetwork,
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(ErrorPolicy::None, false)]
	#[case(ErrorPolicy::Ignore, true)]
	#[case(ErrorPolicy::All, false)]
	fn test_ignores_errors(#[case] policy: ErrorPolicy, #[case] expected: bool) {
		assert_eq!(policy.ignores_errors(), expected);
	}

	#[rstest]
	fn test_error_policy_default_is_none() {
		assert_eq!(ErrorPolicy::default(), ErrorPolicy::None);
	}

	#[rstest]
	#[case("\"cache-first\"", FetchPolicy::CacheFirst)]
	#[case("\"cache-and-network\"", FetchPolicy::CacheAndNetwork)]
	#[case("\"no-cache\"", FetchPolicy::NoCache)]
	fn test_fetch_policy_wire_names(#[case] raw: &str, #[case] expected: FetchPolicy) {
		let parsed: FetchPolicy = serde_json::from_str(raw).unwrap();
		assert_eq!(parsed, expected);
	}
}
