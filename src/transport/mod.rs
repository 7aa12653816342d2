//! The Transport Adapter (C1): one upstream, any of three JSON-RPC 2.0
//! dialects. Exposes `initialize` and `call`; dialect selection happens once
//! per server, at `server.dialect` (spec.md §9 — do not fold the SSE
//! two-step into the plain path).

pub mod plain;
pub mod sse;
pub mod streamable;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};

use crate::config::ServerDeclaration;
use crate::error::TransportError;
use crate::jsonrpc::{codes, JsonRpcRequest, JsonRpcResponse};
use crate::registry::{Dialect, SessionState};

pub const INITIALIZE_TIMEOUT: Duration = Duration::from_secs(10);
pub const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);
pub const CALL_TIMEOUT: Duration = Duration::from_secs(30);
pub const HEALTH_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

const CLIENT_NAME: &str = "toolgate";
const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");
const PROTOCOL_VERSION: &str = "2024-11-05";

/// What a successful (or tolerated) `initialize` yields.
#[derive(Debug, Clone, Default)]
pub struct InitializeOutcome {
	pub name: Option<String>,
	pub description: Option<String>,
	pub capabilities: Value,
	pub protocol_version: Option<String>,
	pub session: Option<SessionState>,
}

impl InitializeOutcome {
	/// `-32601` on `initialize`: treat as a no-op success per spec.md §4.1.
	fn synthesized() -> Self {
		Self::default()
	}

	fn from_result(result: &Value, session: Option<SessionState>) -> Self {
		let server_info = result.get("serverInfo");
		Self {
			name: server_info.and_then(|si| si.get("name")).and_then(Value::as_str).map(String::from),
			description: server_info
				.and_then(|si| si.get("description"))
				.and_then(Value::as_str)
				.map(String::from),
			capabilities: result.get("capabilities").cloned().unwrap_or(Value::Null),
			protocol_version: result.get("protocolVersion").and_then(Value::as_str).map(String::from),
			session,
		}
	}
}

pub fn initialize_params() -> Value {
	json!({
		"protocolVersion": PROTOCOL_VERSION,
		"capabilities": {},
		"clientInfo": { "name": CLIENT_NAME, "version": CLIENT_VERSION },
	})
}

pub async fn initialize(client: &Client, decl: &ServerDeclaration) -> Result<InitializeOutcome, TransportError> {
	match decl.dialect {
		Dialect::Plain => plain::initialize(client, decl).await,
		Dialect::Streamable => streamable::initialize(client, decl).await,
		Dialect::Sse => sse::initialize(client, decl).await,
	}
}

pub async fn call(
	client: &Client,
	decl: &ServerDeclaration,
	session: Option<&SessionState>,
	method: &str,
	params: Option<Value>,
) -> Result<Value, TransportError> {
	match decl.dialect {
		Dialect::Plain => plain::call(client, decl, method, params).await,
		Dialect::Streamable => streamable::call(client, decl, session, method, params).await,
		Dialect::Sse => sse::call(client, decl, session, method, params).await,
	}
}

/// Unwrap a response into its result, turning an upstream `error` object
/// into a typed failure.
fn extract_result(resp: JsonRpcResponse) -> Result<Value, TransportError> {
	if let Some(err) = resp.error {
		return Err(TransportError::Rpc(err));
	}
	Ok(resp.result.unwrap_or(Value::Null))
}

fn apply_headers(mut req: reqwest::RequestBuilder, headers: &HashMap<String, String>) -> reqwest::RequestBuilder {
	for (name, value) in headers {
		req = req.header(name, value);
	}
	req
}

/// POST a JSON-RPC request, enforcing the dialect-shared timeout/status/parse
/// rules from spec.md §4.1: timeouts surface as failures with no retry,
/// non-2xx fails, malformed JSON fails.
async fn post_jsonrpc(
	client: &Client,
	url: &str,
	headers: &HashMap<String, String>,
	body: &JsonRpcRequest,
	extra_headers: &[(&str, &str)],
	timeout: Duration,
) -> Result<JsonRpcResponse, TransportError> {
	Ok(post_jsonrpc_with_headers(client, url, headers, body, extra_headers, timeout).await?.0)
}

/// Same as `post_jsonrpc`, but also returns the response headers — needed by
/// the streamable dialect, which carries its session id in `mcp-session-id`
/// rather than in the body.
async fn post_jsonrpc_with_headers(
	client: &Client,
	url: &str,
	headers: &HashMap<String, String>,
	body: &JsonRpcRequest,
	extra_headers: &[(&str, &str)],
	timeout: Duration,
) -> Result<(JsonRpcResponse, reqwest::header::HeaderMap), TransportError> {
	let mut req = client.post(url).json(body);
	req = apply_headers(req, headers);
	for (name, value) in extra_headers {
		req = req.header(*name, *value);
	}
	let send = tokio::time::timeout(timeout, req.send())
		.await
		.map_err(|_| TransportError::Timeout { url: url.to_string(), timeout_secs: timeout.as_secs() })?;
	let resp = send.map_err(|source| TransportError::Network { url: url.to_string(), source })?;
	let status = resp.status();
	if !status.is_success() {
		return Err(TransportError::HttpStatus { url: url.to_string(), status: status.as_u16() });
	}
	let response_headers = resp.headers().clone();
	let bytes = resp
		.bytes()
		.await
		.map_err(|source| TransportError::Network { url: url.to_string(), source })?;
	let parsed = serde_json::from_slice(&bytes)
		.map_err(|source| TransportError::MalformedResponse { url: url.to_string(), source })?;
	Ok((parsed, response_headers))
}

/// Send a fire-and-forget notification. HTTP 200 or 202 both count as
/// success; there is no response body to parse.
async fn post_notification(
	client: &Client,
	url: &str,
	headers: &HashMap<String, String>,
	method: &str,
	extra_headers: &[(&str, &str)],
	timeout: Duration,
) -> Result<(), TransportError> {
	let body = crate::jsonrpc::JsonRpcNotification::new(method, None);
	let mut req = client.post(url).json(&body);
	req = apply_headers(req, headers);
	for (name, value) in extra_headers {
		req = req.header(*name, *value);
	}
	let send = tokio::time::timeout(timeout, req.send())
		.await
		.map_err(|_| TransportError::Timeout { url: url.to_string(), timeout_secs: timeout.as_secs() })?;
	let resp = send.map_err(|source| TransportError::Network { url: url.to_string(), source })?;
	let status = resp.status();
	if status.as_u16() != 200 && status.as_u16() != 202 {
		return Err(TransportError::HttpStatus { url: url.to_string(), status: status.as_u16() });
	}
	Ok(())
}

fn method_not_found(resp: &JsonRpcResponse) -> bool {
	resp.error.as_ref().is_some_and(|e| e.code == codes::METHOD_NOT_FOUND)
}

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Monotonic request id, unique per process. The dialects don't reuse ids
/// across requests, so a simple counter suffices (no per-server scoping
/// needed).
pub(crate) fn next_id() -> u64 {
	NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed)
}
