//! Settlement of single-shot responses
//!
//! Mutations produce exactly one response, so there is no stream to adapt:
//! the response is classified once and the same callback rules as
//! [`settle_first`](crate::settle_first) apply.

use crate::adapter::{SettleOptions, run_completed, run_error};
use crate::emission::FetchResult;
use crate::error::ClientError;

/// Settle a single-shot response
///
/// | Response                  | Policy          | Outcome                                  |
/// |---------------------------|-----------------|------------------------------------------|
/// | transport error           | any             | `on_error`, reject                       |
/// | data + errors             | `Ignore`        | `on_completed`, resolve                  |
/// | data + errors             | `None` / `All`  | `on_error`, reject with `GraphQL`        |
/// | data                      | any             | `on_completed`, resolve                  |
/// | errors                    | any             | `on_error`, reject with `GraphQL`        |
/// | neither                   | any             | `on_error`, reject with `EmptyResponse`  |
///
/// # Examples
///
/// ```
/// use reinhardt_graphql_core::{FetchResult, SettleOptions, settle_fetch_result};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let response = Ok(FetchResult::ok("created".to_string()));
/// let outcome = settle_fetch_result(response, &SettleOptions::new()).await;
/// assert_eq!(outcome.unwrap(), "created");
/// # }
/// ```
pub async fn settle_fetch_result<T: Clone + Send + 'static>(
	response: Result<FetchResult<T>, ClientError>,
	options: &SettleOptions<T>,
) -> Result<T, ClientError> {
	let result = match response {
		Ok(result) => result,
		Err(error) => return reject(options, error).await,
	};

	let FetchResult { data, errors, .. } = result;
	let outcome = match (data, errors.is_empty()) {
		(Some(data), true) => run_completed(options, data).await,
		(Some(data), false) if options.error_policy.ignores_errors() => {
			tracing::debug!(errors = errors.len(), "response errors ignored by policy");
			run_completed(options, data).await
		}
		(_, false) => return reject(options, ClientError::graphql(errors)).await,
		(None, true) => return reject(options, ClientError::EmptyResponse).await,
	};
	tracing::debug!(resolved = outcome.is_ok(), "response settled");
	outcome
}

async fn reject<T: Send + 'static, U>(
	options: &SettleOptions<T>,
	error: ClientError,
) -> Result<U, ClientError> {
	run_error(options, &error).await;
	tracing::debug!(%error, "response rejected");
	Err(error)
}
