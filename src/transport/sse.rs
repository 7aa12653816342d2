//! Dialect: SSE (two-step). Step 1 opens a GET and scans line-oriented SSE
//! frames for the message endpoint. Step 2 POSTs every subsequent JSON-RPC
//! call to that endpoint and reads the reply back out of an SSE frame.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde_json::Value;
use url::Url;

use crate::config::ServerDeclaration;
use crate::error::TransportError;
use crate::jsonrpc::{JsonRpcRequest, JsonRpcResponse};
use crate::registry::SessionState;

use super::{apply_headers, extract_result, initialize_params, method_not_found, next_id, InitializeOutcome};
use super::{CALL_TIMEOUT, INITIALIZE_TIMEOUT};

const ACCEPT_HEADER: &str = "Accept";
const SSE_ACCEPT_VALUE: &str = "text/event-stream";

static MESSAGE_ENDPOINT_PATTERN: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"(?m)^data:\s*(\S*message\?sessionId=([^\s&]+))").unwrap());

static DATA_FRAME_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^data:\s*(\{.*\})\s*$").unwrap());

pub async fn initialize(client: &Client, decl: &ServerDeclaration) -> Result<InitializeOutcome, TransportError> {
	let (endpoint, session_id) = handshake(client, decl).await?;
	let session = SessionState { session_id, message_endpoint: Some(endpoint) };

	let req = JsonRpcRequest::new(next_id(), "initialize", Some(initialize_params()));
	let resp = post_and_read_sse(client, decl, &session, &req).await?;
	if method_not_found(&resp) {
		return Ok(InitializeOutcome { session: Some(session), ..InitializeOutcome::synthesized() });
	}
	if let Some(err) = resp.error {
		return Err(TransportError::Rpc(err));
	}
	let result = resp.result.unwrap_or(Value::Null);
	Ok(InitializeOutcome::from_result(&result, Some(session)))
}

pub async fn call(
	client: &Client,
	decl: &ServerDeclaration,
	session: Option<&SessionState>,
	method: &str,
	params: Option<Value>,
) -> Result<Value, TransportError> {
	let session = session.ok_or_else(|| TransportError::SseHandshakeFailed { url: decl.url.clone() })?;
	let req = JsonRpcRequest::new(next_id(), method, params);
	let resp = post_and_read_sse(client, decl, session, &req).await?;
	extract_result(resp)
}

/// Step 1: GET the server URL, read the SSE stream until the first frame
/// naming a `.../message?sessionId=<id>` endpoint.
async fn handshake(client: &Client, decl: &ServerDeclaration) -> Result<(String, String), TransportError> {
	let mut req = client.get(&decl.url).header(ACCEPT_HEADER, SSE_ACCEPT_VALUE);
	req = apply_headers(req, &decl.headers);
	let send = tokio::time::timeout(INITIALIZE_TIMEOUT, req.send())
		.await
		.map_err(|_| TransportError::Timeout { url: decl.url.clone(), timeout_secs: INITIALIZE_TIMEOUT.as_secs() })?;
	let resp = send.map_err(|source| TransportError::Network { url: decl.url.clone(), source })?;
	let status = resp.status();
	if !status.is_success() {
		return Err(TransportError::HttpStatus { url: decl.url.clone(), status: status.as_u16() });
	}
	let body = resp
		.text()
		.await
		.map_err(|source| TransportError::Network { url: decl.url.clone(), source })?;

	let caps = MESSAGE_ENDPOINT_PATTERN
		.captures(&body)
		.ok_or_else(|| TransportError::SseHandshakeFailed { url: decl.url.clone() })?;
	let path = caps.get(1).unwrap().as_str();
	let session_id = caps.get(2).unwrap().as_str().to_string();

	let origin = Url::parse(&decl.url).map_err(|_| TransportError::SseHandshakeFailed { url: decl.url.clone() })?;
	let endpoint = origin
		.join(path.split('?').next().unwrap_or(path))
		.map_err(|_| TransportError::SseHandshakeFailed { url: decl.url.clone() })?;

	Ok((endpoint.to_string(), session_id))
}

/// Step 2: POST to `message_endpoint?sessionId=<id>`, then scan the SSE
/// response body for the first `data:` frame whose JSON `id` matches the
/// request.
async fn post_and_read_sse(
	client: &Client,
	decl: &ServerDeclaration,
	session: &SessionState,
	body: &JsonRpcRequest,
) -> Result<JsonRpcResponse, TransportError> {
	let endpoint = session
		.message_endpoint
		.as_deref()
		.ok_or_else(|| TransportError::SseHandshakeFailed { url: decl.url.clone() })?;
	let url = format!("{endpoint}?sessionId={}", session.session_id);

	let mut req = client.post(&url).json(body);
	req = apply_headers(req, &decl.headers);
	let send = tokio::time::timeout(CALL_TIMEOUT, req.send())
		.await
		.map_err(|_| TransportError::Timeout { url: url.clone(), timeout_secs: CALL_TIMEOUT.as_secs() })?;
	let resp = send.map_err(|source| TransportError::Network { url: url.clone(), source })?;
	let status = resp.status();
	if status.as_u16() != 200 && status.as_u16() != 202 {
		return Err(TransportError::HttpStatus { url: url.clone(), status: status.as_u16() });
	}
	let text = resp
		.text()
		.await
		.map_err(|source| TransportError::Network { url: url.clone(), source })?;

	for caps in DATA_FRAME_PATTERN.captures_iter(&text) {
		let candidate = &caps[1];
		if let Ok(parsed) = serde_json::from_str::<JsonRpcResponse>(candidate) {
			let matches_id = parsed
				.id
				.as_ref()
				.and_then(Value::as_u64)
				.map(|id| id == body.id)
				.unwrap_or(false);
			if matches_id {
				return Ok(parsed);
			}
		}
	}
	Err(TransportError::SseNoData { url })
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn extracts_message_endpoint_and_session_id() {
		let frame = "event: endpoint\ndata: /c/message?sessionId=s1\n\n";
		let caps = MESSAGE_ENDPOINT_PATTERN.captures(frame).unwrap();
		assert_eq!(&caps[1], "/c/message?sessionId=s1");
		assert_eq!(&caps[2], "s1");
	}

	#[test]
	fn finds_data_frame_json() {
		let frame = "data: {\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{}}\n\n";
		let caps: Vec<_> = DATA_FRAME_PATTERN.captures_iter(frame).collect();
		assert_eq!(caps.len(), 1);
	}
}
