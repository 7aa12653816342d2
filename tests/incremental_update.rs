//! Seed scenario 4 (spec.md §8): an upstream's tool description changes
//! between two refreshes; the incremental refresh reports exactly one
//! `updated` entry and the stored version changes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use toolgate::config::GatewayConfig;
use toolgate::index::{refresh, DocumentStore};
use toolgate::Gateway;

#[tokio::test]
async fn description_change_yields_single_update() {
	let server = MockServer::start().await;
	let call_count = Arc::new(AtomicUsize::new(0));
	let counter = call_count.clone();

	Mock::given(method("GET")).and(path("/health")).respond_with(ResponseTemplate::new(200)).mount(&server).await;

	Mock::given(method("POST"))
		.and(path("/"))
		.respond_with(move |req: &wiremock::Request| {
			let body: serde_json::Value = req.body_json().unwrap();
			match body["method"].as_str().unwrap() {
				"initialize" => ResponseTemplate::new(200).set_body_json(json!({
					"jsonrpc": "2.0", "id": body["id"],
					"result": {"protocolVersion": "2024-11-05", "capabilities": {}, "serverInfo": {"name": "A", "version": "1.0"}}
				})),
				"tools/list" => {
					let n = counter.fetch_add(1, Ordering::SeqCst);
					// Bootstrap makes three tools/list calls against this
					// server (two metadata-inference passes plus the initial
					// full build); only the explicit incremental_refresh
					// call below should observe the changed description.
					let description = if n < 3 { "reads a file" } else { "reads a file, now faster" };
					ResponseTemplate::new(200).set_body_json(json!({
						"jsonrpc": "2.0", "id": body["id"],
						"result": {"tools": [{"name": "read_file", "description": description, "parameters": {"type": "object", "properties": {}, "required": []}}]}
					}))
				},
				_ => ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": body["id"], "result": null})),
			}
		})
		.mount(&server)
		.await;

	let config_doc = json!({"mcpServers": {"A": {"url": server.uri(), "type": "plain"}}});
	let config = GatewayConfig::from_str(&config_doc.to_string()).unwrap();
	let gateway = Gateway::bootstrap(&config).await.unwrap();

	let before = gateway.store.get("A:read_file").await.unwrap().tool_version;

	let change = refresh::incremental_refresh(&gateway.catalogue, &gateway.registry, gateway.store.as_ref()).await.unwrap();
	assert_eq!(change.counts(), (0, 1, 0, 0));

	let after = gateway.store.get("A:read_file").await.unwrap().tool_version;
	assert_ne!(before, after);
}
