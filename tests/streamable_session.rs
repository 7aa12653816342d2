//! Seed scenario 2 (spec.md §8): a streamable upstream hands back a session
//! id in a response header; later calls echo it back.

use serde_json::json;
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use toolgate::config::GatewayConfig;
use toolgate::Gateway;

#[tokio::test]
async fn session_header_round_trips_into_calls() {
	let server = MockServer::start().await;

	Mock::given(method("POST"))
		.and(path("/"))
		.and(|req: &wiremock::Request| {
			let body: serde_json::Value = req.body_json().unwrap();
			body["method"] == "initialize"
		})
		.respond_with(|req: &wiremock::Request| {
			let body: serde_json::Value = req.body_json().unwrap();
			ResponseTemplate::new(200)
				.insert_header("mcp-session-id", "xyz")
				.set_body_json(json!({
					"jsonrpc": "2.0", "id": body["id"],
					"result": {"protocolVersion": "2024-11-05", "capabilities": {}, "serverInfo": {"name": "B", "version": "1.0"}}
				}))
		})
		.mount(&server)
		.await;

	Mock::given(method("POST"))
		.and(path("/"))
		.and(|req: &wiremock::Request| {
			let body: serde_json::Value = req.body_json().unwrap();
			body["method"] == "notifications/initialized"
		})
		.respond_with(ResponseTemplate::new(202))
		.mount(&server)
		.await;

	Mock::given(method("POST"))
		.and(path("/"))
		.and(header_exists("mcp-session-id"))
		.and(header("mcp-session-id", "xyz"))
		.and(|req: &wiremock::Request| {
			let body: serde_json::Value = req.body_json().unwrap();
			body["method"] == "tools/list"
		})
		.respond_with(|req: &wiremock::Request| {
			let body: serde_json::Value = req.body_json().unwrap();
			ResponseTemplate::new(200).set_body_json(json!({
				"jsonrpc": "2.0", "id": body["id"],
				"result": {"tools": [{"name": "ping", "description": "pings", "parameters": {"type": "object", "properties": {}, "required": []}}]}
			}))
		})
		.mount(&server)
		.await;

	let config_doc = json!({"mcpServers": {"B": {"url": server.uri(), "type": "streamable"}}});
	let config = GatewayConfig::from_str(&config_doc.to_string()).unwrap();
	let gateway = Gateway::bootstrap(&config).await.unwrap();

	let record = gateway.registry.snapshot("B").await.unwrap();
	assert_eq!(record.session.as_ref().unwrap().session_id, "xyz");
}
