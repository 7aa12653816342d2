//! The server record and the dialect/session types that describe it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ServerDeclaration;

/// Which of the three JSON-RPC dialects a server speaks (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
	Plain,
	Streamable,
	Sse,
}

impl Dialect {
	/// Plain servers are stateless; streamable and SSE require a session.
	pub fn requires_session(self) -> bool {
		matches!(self, Dialect::Streamable | Dialect::Sse)
	}
}

/// Session state obtained from a dialect's bootstrap handshake.
#[derive(Debug, Clone)]
pub struct SessionState {
	pub session_id: String,
	/// Present only for `sse`, where calls are redirected to a distinct
	/// endpoint discovered during the handshake.
	pub message_endpoint: Option<String>,
}

/// A registered upstream and everything derived about it so far.
///
/// Constructed from configuration, mutated only by the registry during
/// initialize/health/refresh (spec.md §5: single-writer-per-server
/// discipline), never removed except by dropping the declaration.
#[derive(Debug, Clone)]
pub struct ServerRecord {
	pub declaration: ServerDeclaration,

	pub name: String,
	pub description: String,
	pub capabilities: Value,
	pub protocol_version: Option<String>,

	pub category: Option<String>,
	pub tags: Vec<String>,

	pub session: Option<SessionState>,

	/// Last health probe outcome; `None` until the first probe runs.
	pub healthy: Option<bool>,
}

impl ServerRecord {
	/// A freshly loaded record, before bootstrap has run.
	pub fn new(declaration: ServerDeclaration) -> Self {
		let description = format!("MCP server: {}", declaration.id);
		Self {
			name: declaration.id.clone(),
			declaration,
			description,
			capabilities: Value::Null,
			protocol_version: None,
			category: None,
			tags: Vec::new(),
			session: None,
			healthy: None,
		}
	}

	pub fn id(&self) -> &str {
		&self.declaration.id
	}

	pub fn dialect(&self) -> Dialect {
		self.declaration.dialect
	}
}
