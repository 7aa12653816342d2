//! Per-component error types.
//!
//! Each federation-core component owns a `thiserror`-derived enum, matching
//! the shape of `RegistryError` in `agentgateway`'s registry module: leaf
//! errors carry enough context to be logged or surfaced verbatim, and
//! `#[from]` wires up the propagation chain between components (C1 errors
//! flow into C3 discovery errors; config errors are reported, not
//! propagated, since spec.md treats a malformed config entry as "skip with
//! warning", never fatal).

use thiserror::Error;

use crate::jsonrpc::JsonRpcError;

/// Errors raised by the Transport Adapter (C1).
#[derive(Error, Debug)]
pub enum TransportError {
	#[error("request to {url} timed out after {timeout_secs}s")]
	Timeout { url: String, timeout_secs: u64 },

	#[error("network error contacting {url}: {source}")]
	Network {
		url: String,
		#[source]
		source: reqwest::Error,
	},

	#[error("upstream {url} returned HTTP {status}")]
	HttpStatus { url: String, status: u16 },

	#[error("malformed JSON-RPC response from {url}: {source}")]
	MalformedResponse {
		url: String,
		#[source]
		source: serde_json::Error,
	},

	#[error("upstream error: {0}")]
	Rpc(#[from] JsonRpcError),

	#[error("SSE handshake with {url} did not yield a session endpoint")]
	SseHandshakeFailed { url: String },

	#[error("no response frame found in SSE stream from {url}")]
	SseNoData { url: String },
}

impl TransportError {
	/// The upstream JSON-RPC error code, if this failure carries one.
	pub fn rpc_code(&self) -> Option<i64> {
		match self {
			TransportError::Rpc(e) => Some(e.code),
			_ => None,
		}
	}
}

/// Errors raised while loading the `{ mcpServers: ... }` configuration
/// document. Per spec.md §7, a malformed *entry* is skipped with a warning
/// and never propagated; `ConfigError` exists for the one caller (reading
/// the document itself) that wants a hard failure.
#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("failed to read configuration file: {0}")]
	Io(#[from] std::io::Error),

	#[error("failed to parse configuration document: {0}")]
	Parse(#[from] serde_json::Error),
}

/// Errors raised by the Catalogue Manager (C3) during discovery.
#[derive(Error, Debug)]
pub enum CatalogueError {
	#[error("server '{server_id}' is not registered")]
	UnknownServer { server_id: String },

	#[error("discovery against '{server_id}' failed: {source}")]
	Discovery {
		server_id: String,
		#[source]
		source: TransportError,
	},
}

/// Errors raised by the Invocation Dispatcher (C5) that represent a
/// structural problem with the call request, as opposed to an upstream
/// failure (which is surfaced as data, per spec.md §7).
#[derive(Error, Debug)]
pub enum DispatchError {
	#[error("tool '{tool_id}' does not exist")]
	UnknownTool { tool_id: String },

	#[error("server '{server_id}' is not registered")]
	UnknownServer { server_id: String },

	#[error("could not establish a session with '{server_id}': {source}")]
	SessionBootstrapFailed {
		server_id: String,
		#[source]
		source: TransportError,
	},
}
