//! Shared JSON-RPC 2.0 envelope types used by every transport dialect.
//!
//! These mirror the wire shapes in spec.md §6 ("Upstream JSON-RPC contract")
//! closely enough to round-trip through `serde_json` without a schema, since
//! upstream tool servers are free to omit or add fields the gateway doesn't
//! care about.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

/// Gateway-local and standard JSON-RPC error codes (spec.md §6).
pub mod codes {
	pub const PARSE_ERROR: i64 = -32700;
	pub const INVALID_REQUEST: i64 = -32600;
	pub const METHOD_NOT_FOUND: i64 = -32601;
	pub const INVALID_PARAMS: i64 = -32602;
	pub const INTERNAL_ERROR: i64 = -32603;

	pub const PERMISSION_DENIED: i64 = -32001;
	pub const OS_ERROR: i64 = -32002;
	pub const MISSING_DEPENDENCY: i64 = -32003;
	pub const UPSTREAM_CONNECTION: i64 = -32004;
	pub const UPSTREAM_AUTH: i64 = -32005;
	pub const UNKNOWN_DATABASE: i64 = -32006;
	pub const SQL_SYNTAX: i64 = -32007;
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
	pub jsonrpc: &'static str,
	pub method: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub params: Option<Value>,
	pub id: u64,
}

impl JsonRpcRequest {
	pub fn new(id: u64, method: impl Into<String>, params: Option<Value>) -> Self {
		Self {
			jsonrpc: JSONRPC_VERSION,
			method: method.into(),
			params,
			id,
		}
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcNotification {
	pub jsonrpc: &'static str,
	pub method: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub params: Option<Value>,
}

impl JsonRpcNotification {
	pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
		Self {
			jsonrpc: JSONRPC_VERSION,
			method: method.into(),
			params,
		}
	}
}

/// A parsed JSON-RPC response. Upstreams are liberal in what they send back,
/// so every field beyond `jsonrpc` is optional at the parse boundary and
/// validated afterward.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
	#[serde(default)]
	pub id: Option<Value>,
	#[serde(default)]
	pub result: Option<Value>,
	#[serde(default)]
	pub error: Option<JsonRpcError>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JsonRpcError {
	pub code: i64,
	pub message: String,
	#[serde(default)]
	pub data: Option<Value>,
}

impl std::fmt::Display for JsonRpcError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "[{}] {}", self.code, self.message)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn request_omits_null_params() {
		let req = JsonRpcRequest::new(1, "tools/list", None);
		let v = serde_json::to_value(&req).unwrap();
		assert!(v.get("params").is_none());
		assert_eq!(v["method"], "tools/list");
		assert_eq!(v["jsonrpc"], "2.0");
	}

	#[test]
	fn response_tolerates_missing_fields() {
		let resp: JsonRpcResponse = serde_json::from_str(r#"{"jsonrpc":"2.0","id":1}"#).unwrap();
		assert!(resp.result.is_none());
		assert!(resp.error.is_none());
	}

	#[test]
	fn error_display() {
		let e = JsonRpcError { code: -32601, message: "Method not found".into(), data: None };
		assert_eq!(e.to_string(), "[-32601] Method not found");
	}
}
