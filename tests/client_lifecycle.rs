//! Client construction, reuse and reconstruction across render phases

use async_trait::async_trait;
use reinhardt_graphql_client::hooks::{MutationRequest, OperationRequest};
use reinhardt_graphql_client::prelude::*;
use reinhardt_graphql_client::{ClientConfig, ClientRegistry, QueryDescriptor, SharedClient, Variables};
use rstest::*;
use serde_json::{Value, json};
use serial_test::serial;
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Request client that answers every operation with its own endpoint
struct EchoServer {
	endpoint: String,
}

#[async_trait]
impl RequestClient for EchoServer {
	async fn request(&self, request: OperationRequest) -> Result<FetchResult<Value>, ClientError> {
		Ok(FetchResult::ok(json!({
			"endpoint": self.endpoint,
			"operation": request.operation_name,
			"variables": request.variables,
		})))
	}
}

#[fixture]
fn builds() -> Arc<AtomicUsize> {
	Arc::new(AtomicUsize::new(0))
}

fn echo_registry(builds: &Arc<AtomicUsize>) -> ClientRegistry {
	let builds = Arc::clone(builds);
	ClientRegistry::new(move |config: ClientConfig| {
		builds.fetch_add(1, Ordering::SeqCst);
		async move {
			let client: SharedClient = RequestClientAdapter::new(EchoServer {
				endpoint: config.endpoint,
			})
			.into_shared();
			Ok(client)
		}
	})
}

#[rstest]
#[tokio::test]
async fn test_server_client_reused_on_hydrate(builds: Arc<AtomicUsize>) {
	let registry = echo_registry(&builds);
	let config = ClientConfig::new("https://countries.example/graphql");
	let provider = GraphQLClientProvider::new(ClientGenerator::from_registry(registry, config));
	let app = provider.provide(&Scope::root());

	let server = provider.init().await.unwrap();
	let interactive = provider.hydrate().await.unwrap();

	assert!(Arc::ptr_eq(&server, &interactive));
	assert_eq!(builds.load(Ordering::SeqCst), 1);

	let ping = use_query::<Value, _>(&app, "query Ping { ping }", &(), QueryOptions::new());
	let data = ping.resource().settled().await.unwrap().unwrap();
	assert_eq!(data["endpoint"], "https://countries.example/graphql");
	assert_eq!(data["operation"], "Ping");
}

#[rstest]
#[tokio::test]
async fn test_dehydrated_provider_reuses_memoized_client(builds: Arc<AtomicUsize>) {
	let registry = echo_registry(&builds);
	let config = ClientConfig::new("https://countries.example/graphql").with_header("x-locale", "en");
	let provider = GraphQLClientProvider::new(ClientGenerator::from_registry(registry.clone(), config.clone()));

	let server = provider.init().await.unwrap();
	assert!(provider.dehydrate().is_some());
	let interactive = provider.hydrate().await.unwrap();

	assert!(Arc::ptr_eq(&server, &interactive));
	assert_eq!(builds.load(Ordering::SeqCst), 1);
	assert!(registry.get(&config.identity()).is_some());
}

#[rstest]
#[tokio::test]
async fn test_distinct_configs_build_distinct_clients(builds: Arc<AtomicUsize>) {
	let registry = echo_registry(&builds);
	let a = ClientConfig::new("https://a.example/graphql");
	let b = ClientConfig::new("https://b.example/graphql");

	let (first, second, again) = tokio::join!(
		registry.get_or_build(&a),
		registry.get_or_build(&b),
		registry.get_or_build(&a),
	);

	assert!(!Arc::ptr_eq(&first.unwrap(), &second.unwrap()));
	assert!(again.is_ok());
	assert_eq!(registry.len(), 2);
	assert_eq!(builds.load(Ordering::SeqCst), 2);
}

#[rstest]
#[tokio::test]
async fn test_provider_from_config_file(builds: Arc<AtomicUsize>) {
	let mut file = tempfile::NamedTempFile::new().unwrap();
	writeln!(
		file,
		r#"
endpoint = "https://file.example/graphql"
name = "storefront"
default_error_policy = "ignore"

[headers]
authorization = "Bearer token"
"#
	)
	.unwrap();
	let config = ClientConfig::from_file(file.path()).unwrap();
	assert_eq!(config.default_error_policy, ErrorPolicy::Ignore);

	let provider = GraphQLClientProvider::new(ClientGenerator::from_registry(echo_registry(&builds), config));
	let app = provider.provide(&Scope::root());
	provider.hydrate().await.unwrap();

	let ping = use_query::<Value, _>(&app, "{ ping }", &(), QueryOptions::new());
	let data = ping.resource().settled().await.unwrap().unwrap();
	assert_eq!(data["endpoint"], "https://file.example/graphql");
}

#[rstest]
#[serial(client_env)]
#[tokio::test]
async fn test_provider_from_environment(builds: Arc<AtomicUsize>) {
	// SAFETY: environment access is serialized by the `client_env` group
	unsafe {
		std::env::set_var("LIFECYCLE_GRAPHQL_ENDPOINT", "https://env.example/graphql");
		std::env::set_var("LIFECYCLE_GRAPHQL_HEADER_X_TENANT", "acme");
	}
	let config = ClientConfig::from_env("LIFECYCLE_GRAPHQL_");
	// SAFETY: environment access is serialized by the `client_env` group
	unsafe {
		std::env::remove_var("LIFECYCLE_GRAPHQL_ENDPOINT");
		std::env::remove_var("LIFECYCLE_GRAPHQL_HEADER_X_TENANT");
	}
	let config = config.unwrap();
	assert_eq!(config.headers.get("x-tenant").map(String::as_str), Some("acme"));

	let provider = GraphQLClientProvider::new(ClientGenerator::from_registry(echo_registry(&builds), config));
	let client = provider.init().await.unwrap();
	let response = client
		.mutate(MutationRequest::new(
			QueryDescriptor::parse("mutation Touch { touch }").unwrap(),
			Variables::new(),
		))
		.await
		.unwrap();
	assert_eq!(response.data.unwrap()["endpoint"], "https://env.example/graphql");
}

#[rstest]
#[tokio::test]
async fn test_invalid_config_never_reaches_builder(builds: Arc<AtomicUsize>) {
	let provider = GraphQLClientProvider::new(ClientGenerator::from_registry(
		echo_registry(&builds),
		ClientConfig::new("  "),
	));

	let Err(error) = provider.init().await else {
		panic!("blank endpoint built a client");
	};

	assert!(matches!(error, ClientError::Construction(_)));
	assert!(provider.context().is_empty());
	assert_eq!(builds.load(Ordering::SeqCst), 0);
}
