//! Dialect: plain. A single HTTP POST, JSON request, JSON response. No
//! session, no notification, no special headers.

use reqwest::Client;
use serde_json::Value;

use crate::config::ServerDeclaration;
use crate::error::TransportError;
use crate::jsonrpc::JsonRpcRequest;

use super::{extract_result, initialize_params, method_not_found, next_id, post_jsonrpc, post_notification, InitializeOutcome};
use super::{CALL_TIMEOUT, HEALTH_PROBE_TIMEOUT, INITIALIZE_TIMEOUT};

pub async fn initialize(client: &Client, decl: &ServerDeclaration) -> Result<InitializeOutcome, TransportError> {
	let req = JsonRpcRequest::new(next_id(), "initialize", Some(initialize_params()));
	let resp = post_jsonrpc(client, &decl.url, &decl.headers, &req, &[], INITIALIZE_TIMEOUT).await?;
	if method_not_found(&resp) {
		return Ok(InitializeOutcome::synthesized());
	}
	if let Some(err) = resp.error {
		return Err(TransportError::Rpc(err));
	}
	let result = resp.result.unwrap_or(Value::Null);
	// The plain dialect has no header channel; a cooperative server may still
	// hand back a sessionId in the body (supplemented behavior, §11 item 2).
	let session = result
		.get("sessionId")
		.and_then(Value::as_str)
		.map(|id| crate::registry::SessionState { session_id: id.to_string(), message_endpoint: None });

	// notifications/initialized fires whenever a session_id was obtained at
	// all, not just on the streamable dialect (§11 item 1); plain servers
	// only ever get one via the body fallback above.
	if session.is_some() {
		post_notification(client, &decl.url, &decl.headers, "notifications/initialized", &[], INITIALIZE_TIMEOUT).await?;
	}

	Ok(InitializeOutcome::from_result(&result, session))
}

pub async fn call(client: &Client, decl: &ServerDeclaration, method: &str, params: Option<Value>) -> Result<Value, TransportError> {
	let req = JsonRpcRequest::new(next_id(), method, params);
	let resp = post_jsonrpc(client, &decl.url, &decl.headers, &req, &[], CALL_TIMEOUT).await?;
	extract_result(resp)
}

pub async fn probe_health(client: &Client, decl: &ServerDeclaration) -> bool {
	let url = format!("{}/health", decl.url.trim_end_matches('/'));
	let mut req = client.get(&url);
	for (name, value) in &decl.headers {
		req = req.header(name, value);
	}
	match tokio::time::timeout(HEALTH_PROBE_TIMEOUT, req.send()).await {
		Ok(Ok(resp)) => resp.status().is_success(),
		_ => false,
	}
}
