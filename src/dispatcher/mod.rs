//! The Invocation Dispatcher (C5): validates a call target, invokes C1, and
//! normalizes the reply into a single textual reply.

pub mod normalize;

use std::sync::Arc;

use reqwest::Client;
use serde_json::{json, Map, Value};

use crate::catalogue::{tool_id, Catalogue, ToolInfo};
use crate::error::{DispatchError, TransportError};
use crate::jsonrpc::codes;
use crate::registry::Registry;
use crate::transport;

pub struct Dispatcher {
	client: Client,
	catalogue: Arc<Catalogue>,
	registry: Arc<Registry>,
}

impl Dispatcher {
	pub fn new(client: Client, catalogue: Arc<Catalogue>, registry: Arc<Registry>) -> Self {
		Self { client, catalogue, registry }
	}

	async fn resolve(&self, server_id: &str, tool_name: &str) -> Result<ToolInfo, DispatchError> {
		if self.registry.snapshot(server_id).await.is_none() {
			return Err(DispatchError::UnknownServer { server_id: server_id.to_string() });
		}
		self.catalogue
			.lookup(server_id, tool_name)
			.ok_or_else(|| DispatchError::UnknownTool { tool_id: tool_id(server_id, tool_name) })
	}

	/// `(server_id, tool_name, arguments) -> textual reply`. Per spec.md §7,
	/// invocation failures are surfaced as data (a string), never an `Err` —
	/// the agent treats the whole thing as a normal tool result.
	pub async fn call(&self, server_id: &str, tool_name: &str, arguments: Value) -> String {
		let tool = match self.resolve(server_id, tool_name).await {
			Ok(tool) => tool,
			Err(DispatchError::UnknownTool { tool_id }) => return self.unknown_tool_message(server_id, &tool_id),
			Err(DispatchError::UnknownServer { server_id }) => return format!("error: server does not exist: {server_id}"),
			Err(DispatchError::SessionBootstrapFailed { .. }) => unreachable!("resolve never returns this variant"),
		};

		if let Err(err) = self.registry.ensure_session(server_id).await {
			return describe_transport_error(&err, &tool_id(server_id, tool_name));
		}

		let mut args = match arguments {
			Value::Object(map) => map,
			Value::Null => Map::new(),
			other => {
				let mut map = Map::new();
				map.insert("value".to_string(), other);
				map
			},
		};
		apply_defaults(&tool.parameters, &mut args);

		let Some(server) = self.registry.snapshot(server_id).await else {
			return format!("error: server does not exist: {server_id}");
		};

		let params = json!({"name": tool_name, "arguments": Value::Object(args)});
		match transport::call(&self.client, &server.declaration, server.session.as_ref(), "tools/call", Some(params)).await {
			Ok(result) => normalize::normalize(&result),
			Err(err) => describe_transport_error(&err, &tool_id(server_id, tool_name)),
		}
	}

	fn unknown_tool_message(&self, server_id: &str, tool_id: &str) -> String {
		let alternatives: Vec<String> = self.catalogue.tools_for_server(server_id).into_iter().map(|t| t.name).collect();
		if alternatives.is_empty() {
			format!("tool does not exist: {tool_id}")
		} else {
			format!("tool does not exist: {tool_id}; available on {server_id}: {}", alternatives.join(", "))
		}
	}

	/// The reflective tool (spec.md §4.5): full listing for one upstream, as
	/// prose naming each parameter and its required-ness, so an agent that
	/// first sees only the high-level catalogue gets detail it can read
	/// rather than a schema dump to re-parse (§11 item 6).
	pub fn get_mcp_server_tools(&self, server_id: &str) -> String {
		let tools = self.catalogue.tools_for_server(server_id);
		if tools.is_empty() {
			return format!("no tools discovered for server: {server_id}");
		}
		tools.iter().map(ToolInfo::describe).collect::<Vec<_>>().join("\n")
	}
}

/// Merge a parameter's JSON-Schema `default` into `arguments` when the
/// caller omitted it (spec.md §11 item 7). Never overrides a supplied value.
fn apply_defaults(parameters: &Value, arguments: &mut Map<String, Value>) {
	let Some(properties) = parameters.get("properties").and_then(Value::as_object) else { return };
	for (name, schema) in properties {
		if arguments.contains_key(name) {
			continue;
		}
		if let Some(default) = schema.get("default") {
			arguments.insert(name.clone(), default.clone());
		}
	}
}

/// `-32601` gets a hint toward `tools/list`; a refused connection gets a
/// distinguishing message naming the unreachable URL (spec.md §11 item 5);
/// everything else is the upstream message verbatim.
fn describe_transport_error(err: &TransportError, tool_id: &str) -> String {
	if err.rpc_code() == Some(codes::METHOD_NOT_FOUND) {
		return format!("error: method not found for {tool_id}; try tools/list to see available tools");
	}
	if let TransportError::Network { url, source } = err {
		if source.is_connect() {
			return format!("error: connection refused contacting {url}");
		}
	}
	format!("error: {err}")
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn apply_defaults_fills_missing_optional_param() {
		let schema = json!({
			"type": "object",
			"properties": {"encoding": {"type": "string", "default": "utf-8"}},
			"required": [],
		});
		let mut args = Map::new();
		apply_defaults(&schema, &mut args);
		assert_eq!(args.get("encoding").and_then(Value::as_str), Some("utf-8"));
	}

	#[test]
	fn apply_defaults_never_overrides_supplied_value() {
		let schema = json!({
			"type": "object",
			"properties": {"encoding": {"type": "string", "default": "utf-8"}},
			"required": [],
		});
		let mut args = Map::new();
		args.insert("encoding".to_string(), json!("latin-1"));
		apply_defaults(&schema, &mut args);
		assert_eq!(args.get("encoding").and_then(Value::as_str), Some("latin-1"));
	}
}
