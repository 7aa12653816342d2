//! Tool document projection and content-addressed versioning (spec.md §4.4).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};

use crate::catalogue::ToolInfo;
use crate::registry::ServerRecord;

/// The index's persisted projection of a discovered tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDocument {
	pub tool_id: String,
	pub name: String,
	pub description: String,
	pub server_id: String,
	pub category: Option<String>,
	pub tags: Vec<String>,
	pub search_text: String,
	pub tool_version: String,
	pub server_version: String,
	pub last_discovered_at: DateTime<Utc>,
	pub indexed_at: DateTime<Utc>,
}

pub fn project(tool: &ToolInfo, server: &ServerRecord, now: DateTime<Utc>) -> ToolDocument {
	ToolDocument {
		tool_id: tool.tool_id(),
		name: tool.name.clone(),
		description: tool.description.clone(),
		server_id: tool.server_id.clone(),
		category: tool.category.clone(),
		tags: tool.tags.clone(),
		search_text: build_search_text(tool, server),
		tool_version: compute_tool_version(tool),
		server_version: compute_server_version(server),
		last_discovered_at: now,
		indexed_at: now,
	}
}

/// Fixed, ordered, labelled-lines format (spec.md §4.4). Order matters: it's
/// part of what makes `search_text` a stable substring-search target.
pub fn build_search_text(tool: &ToolInfo, server: &ServerRecord) -> String {
	let params_line = tool
		.parameters
		.get("properties")
		.and_then(Value::as_object)
		.map(|props| {
			props
				.iter()
				.map(|(name, schema)| {
					let desc = schema.get("description").and_then(Value::as_str).unwrap_or("");
					format!("{name}: {desc}")
				})
				.collect::<Vec<_>>()
				.join(", ")
		})
		.unwrap_or_default();

	format!(
		"tool name: {}\ntool description: {}\nserver name: {}\nserver description: {}\ncategory: {}\ntags: {}\nparameters: {}",
		tool.name,
		tool.description,
		server.name,
		server.description,
		tool.category.as_deref().unwrap_or(""),
		tool.tags.join(", "),
		params_line,
	)
}

/// First 16 hex chars of SHA-256 over the canonical JSON of
/// `{name, description, parameters, server_id, category, tags (sorted)}`
/// (invariant I3).
pub fn compute_tool_version(tool: &ToolInfo) -> String {
	let mut tags = tool.tags.clone();
	tags.sort();
	hash16(&json!({
		"name": tool.name,
		"description": tool.description,
		"parameters": tool.parameters,
		"server_id": tool.server_id,
		"category": tool.category,
		"tags": tags,
	}))
}

/// Same scheme, over `{id, name, description, url, category, tags (sorted)}`.
pub fn compute_server_version(server: &ServerRecord) -> String {
	let mut tags = server.tags.clone();
	tags.sort();
	hash16(&json!({
		"id": server.id(),
		"name": server.name,
		"description": server.description,
		"url": server.declaration.url,
		"category": server.category,
		"tags": tags,
	}))
}

fn hash16(value: &Value) -> String {
	let canonical = canonical_json(value);
	let digest = Sha256::digest(canonical.as_bytes());
	hex::encode(digest)[..16].to_string()
}

/// Byte-stable canonical JSON: keys sorted recursively, no insignificant
/// whitespace, non-ASCII left unescaped.
fn canonical_json(value: &Value) -> String {
	serde_json::to_string(&sort_keys(value)).expect("Value serialization cannot fail")
}

fn sort_keys(value: &Value) -> Value {
	match value {
		Value::Object(map) => {
			let sorted: BTreeMap<&String, &Value> = map.iter().collect();
			let mut out = Map::new();
			for (k, v) in sorted {
				out.insert(k.clone(), sort_keys(v));
			}
			Value::Object(out)
		},
		Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
		other => other.clone(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn tool(name: &str, description: &str) -> ToolInfo {
		ToolInfo {
			name: name.to_string(),
			description: description.to_string(),
			server_id: "a".to_string(),
			parameters: json!({"type": "object", "properties": {"path": {"type": "string", "description": "file path"}}, "required": ["path"]}),
			category: Some("file_operations".to_string()),
			tags: vec!["file".to_string(), "read".to_string()],
		}
	}

	#[test]
	fn tool_version_is_stable_for_equal_input() {
		let t1 = tool("read_file", "reads a file");
		let t2 = tool("read_file", "reads a file");
		assert_eq!(compute_tool_version(&t1), compute_tool_version(&t2));
	}

	#[test]
	fn tool_version_changes_with_description() {
		let t1 = tool("read_file", "reads a file");
		let t2 = tool("read_file", "reads a file, changed");
		assert_ne!(compute_tool_version(&t1), compute_tool_version(&t2));
	}

	#[test]
	fn tool_version_is_insensitive_to_tag_order() {
		let mut t1 = tool("read_file", "reads a file");
		let mut t2 = tool("read_file", "reads a file");
		t1.tags = vec!["file".into(), "read".into()];
		t2.tags = vec!["read".into(), "file".into()];
		assert_eq!(compute_tool_version(&t1), compute_tool_version(&t2));
	}

	#[test]
	fn version_is_16_hex_chars() {
		let v = compute_tool_version(&tool("read_file", "reads a file"));
		assert_eq!(v.len(), 16);
		assert!(v.chars().all(|c| c.is_ascii_hexdigit()));
	}

	#[test]
	fn search_text_contains_labelled_lines() {
		let server = ServerRecord::new(crate::config::ServerDeclaration {
			id: "a".to_string(),
			url: "http://a/".to_string(),
			dialect: crate::registry::Dialect::Plain,
			headers: Default::default(),
		});
		let text = build_search_text(&tool("read_file", "reads a file"), &server);
		assert!(text.contains("tool name: read_file"));
		assert!(text.contains("parameters: path: file path"));
	}
}
