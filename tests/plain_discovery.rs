//! Seed scenario 1 (spec.md §8): plain discovery against a single-tool
//! upstream.

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use toolgate::config::GatewayConfig;
use toolgate::index::DocumentStore;
use toolgate::Gateway;

#[tokio::test]
async fn store_contains_one_document_after_startup() {
	let server = MockServer::start().await;

	Mock::given(method("GET")).and(path("/health")).respond_with(ResponseTemplate::new(200)).mount(&server).await;

	Mock::given(method("POST"))
		.and(path("/"))
		.respond_with(|req: &wiremock::Request| {
			let body: serde_json::Value = req.body_json().unwrap();
			match body["method"].as_str().unwrap() {
				"initialize" => ResponseTemplate::new(200).set_body_json(json!({
					"jsonrpc": "2.0", "id": body["id"],
					"result": {"protocolVersion": "2024-11-05", "capabilities": {}, "serverInfo": {"name": "A", "version": "1.0"}}
				})),
				"tools/list" => ResponseTemplate::new(200).set_body_json(json!({
					"jsonrpc": "2.0", "id": body["id"],
					"result": {"tools": [{"name": "read_file", "description": "reads a file", "parameters": {"type": "object", "properties": {"path": {"type": "string"}}, "required": ["path"]}}]}
				})),
				_ => ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": body["id"], "result": null})),
			}
		})
		.mount(&server)
		.await;

	let config_doc = json!({
		"mcpServers": {
			"A": {"url": server.uri(), "type": "plain"},
		}
	});
	let config = GatewayConfig::from_str(&config_doc.to_string()).unwrap();
	let gateway = Gateway::bootstrap(&config).await.unwrap();

	let documents = gateway.store.all().await;
	assert_eq!(documents.len(), 1);
	assert_eq!(documents[0].tool_id, "A:read_file");
	assert!(documents[0].search_text.contains("tool name: read_file"));
}
