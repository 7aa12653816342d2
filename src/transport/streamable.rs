//! Dialect: streamable. Chunked HTTP with a session id carried in the
//! `mcp-session-id` response/request header (case-insensitive on the way
//! in, per spec.md §9).

use reqwest::Client;
use serde_json::Value;

use crate::config::ServerDeclaration;
use crate::error::TransportError;
use crate::jsonrpc::JsonRpcRequest;
use crate::registry::SessionState;

use super::{extract_result, initialize_params, method_not_found, next_id, post_jsonrpc, post_jsonrpc_with_headers, post_notification, InitializeOutcome};
use super::{CALL_TIMEOUT, INITIALIZE_TIMEOUT};

const SESSION_HEADER: &str = "mcp-session-id";
const ACCEPT_HEADER: &str = "Accept";
const ACCEPT_VALUE: &str = "application/json, text/event-stream";

pub async fn initialize(client: &Client, decl: &ServerDeclaration) -> Result<InitializeOutcome, TransportError> {
	let req = JsonRpcRequest::new(next_id(), "initialize", Some(initialize_params()));
	let extra = [(ACCEPT_HEADER, ACCEPT_VALUE)];
	let (resp, response_headers) = post_jsonrpc_with_headers(client, &decl.url, &decl.headers, &req, &extra, INITIALIZE_TIMEOUT).await?;
	if method_not_found(&resp) {
		return Ok(InitializeOutcome::synthesized());
	}
	if let Some(err) = resp.error {
		return Err(TransportError::Rpc(err));
	}
	let result = resp.result.clone().unwrap_or(Value::Null);
	// Header wins per spec.md §4.1; body `sessionId` is the supplemented
	// fallback (§11 item 2) for servers that only echo it back in-band.
	let session_id = response_headers
		.get(SESSION_HEADER)
		.and_then(|v| v.to_str().ok())
		.map(String::from)
		.or_else(|| result.get("sessionId").and_then(Value::as_str).map(String::from));
	let session = session_id.map(|session_id| SessionState { session_id, message_endpoint: None });

	// notifications/initialized is unconditional for this dialect per
	// spec.md §4.1; the header/body-derived session (if any) rides along on
	// the call path, not on the notification itself.
	post_notification(client, &decl.url, &decl.headers, "notifications/initialized", &extra, INITIALIZE_TIMEOUT).await?;

	Ok(InitializeOutcome::from_result(&result, session))
}

pub async fn call(
	client: &Client,
	decl: &ServerDeclaration,
	session: Option<&SessionState>,
	method: &str,
	params: Option<Value>,
) -> Result<Value, TransportError> {
	let req = JsonRpcRequest::new(next_id(), method, params);
	let mut extra = vec![(ACCEPT_HEADER, ACCEPT_VALUE)];
	if let Some(s) = session {
		extra.push((SESSION_HEADER, s.session_id.as_str()));
	}
	let resp = post_jsonrpc(client, &decl.url, &decl.headers, &req, &extra, CALL_TIMEOUT).await?;
	extract_result(resp)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn session_header_name_is_lowercase_canonical() {
		assert_eq!(SESSION_HEADER, "mcp-session-id");
	}
}
