//! Seed scenario 3 (spec.md §8): the SSE dialect's two-step handshake and
//! message-endpoint redirection.

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use toolgate::config::GatewayConfig;
use toolgate::Gateway;

#[tokio::test]
async fn handshake_yields_session_and_calls_redirect_to_message_endpoint() {
	let server = MockServer::start().await;

	Mock::given(method("GET"))
		.and(path("/sse"))
		.respond_with(ResponseTemplate::new(200).set_body_string("event: endpoint\ndata: /message?sessionId=s1\n\n"))
		.mount(&server)
		.await;

	Mock::given(method("POST"))
		.and(path("/message"))
		.respond_with(|req: &wiremock::Request| {
			let body: serde_json::Value = req.body_json().unwrap();
			let sse_body = format!(
				"data: {}\n\n",
				json!({"jsonrpc": "2.0", "id": body["id"], "result": {"tools": []}}),
			);
			ResponseTemplate::new(200).set_body_string(sse_body)
		})
		.mount(&server)
		.await;

	let config_doc = json!({"mcpServers": {"C": {"url": format!("{}/sse", server.uri()), "type": "sse"}}});
	let config = GatewayConfig::from_str(&config_doc.to_string()).unwrap();
	let gateway = Gateway::bootstrap(&config).await.unwrap();

	let record = gateway.registry.snapshot("C").await.unwrap();
	let session = record.session.as_ref().unwrap();
	assert_eq!(session.session_id, "s1");
	assert!(session.message_endpoint.as_ref().unwrap().ends_with("/message"));
}
