//! The Catalogue Manager (C3): discovers `tools/list` per server, caches
//! with a TTL, and exposes `(server_id, tool_name) -> ToolInfo` lookups.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{CatalogueError, TransportError};
use crate::registry::Registry;
use crate::transport;

pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// A discovered tool, scoped to the server that declared it (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
	pub name: String,
	pub description: String,
	pub server_id: String,
	pub parameters: Value,
	pub category: Option<String>,
	pub tags: Vec<String>,
}

impl ToolInfo {
	pub fn tool_id(&self) -> String {
		tool_id(&self.server_id, &self.name)
	}

	/// A human-readable rendering used by the reflective lookup tool, naming
	/// the server, category, and each parameter with its type/required-ness
	/// (supplemented from the original's `create_dynamic_tool`, §11 item 6).
	pub fn describe(&self) -> String {
		let mut out = format!("[{}] {}\n{}\n", self.server_id, self.name, self.description);
		if let Some(category) = &self.category {
			out.push_str(&format!("category: {category}\n"));
		}
		let required: Vec<&str> = self
			.parameters
			.get("required")
			.and_then(Value::as_array)
			.map(|arr| arr.iter().filter_map(Value::as_str).collect())
			.unwrap_or_default();
		if let Some(properties) = self.parameters.get("properties").and_then(Value::as_object) {
			if properties.is_empty() {
				out.push_str("parameters: none\n");
			} else {
				out.push_str("parameters:\n");
				for (name, schema) in properties {
					let ty = schema.get("type").and_then(Value::as_str).unwrap_or("any");
					let desc = schema.get("description").and_then(Value::as_str).unwrap_or("");
					let req = if required.contains(&name.as_str()) { "required" } else { "optional" };
					out.push_str(&format!("  - {name} ({ty}, {req}): {desc}\n"));
				}
				if !required.is_empty() {
					out.push_str(&format!("required parameters: {}\n", required.join(", ")));
				}
			}
		} else {
			out.push_str("parameters: none\n");
		}
		out
	}
}

pub fn tool_id(server_id: &str, name: &str) -> String {
	format!("{server_id}:{name}")
}

#[derive(Clone)]
struct CacheEntry {
	tools: Vec<ToolInfo>,
	expires_at: Instant,
}

/// `tools_by_id` and the per-server cache are each a whole map behind an
/// `ArcSwap`, matching the hot-swappable-snapshot pattern `agentgateway`
/// uses for its compiled registry: a discovery computes the next map value
/// in full and swaps it in atomically, so a reader never observes a partial
/// merge (spec.md §5).
pub struct Catalogue {
	client: Client,
	registry: Arc<Registry>,
	ttl: Duration,
	tools_by_id: ArcSwap<HashMap<String, ToolInfo>>,
	cache_by_server: ArcSwap<HashMap<String, CacheEntry>>,
}

impl Catalogue {
	pub fn new(client: Client, registry: Arc<Registry>) -> Self {
		Self::with_ttl(client, registry, DEFAULT_TTL)
	}

	pub fn with_ttl(client: Client, registry: Arc<Registry>, ttl: Duration) -> Self {
		Self {
			client,
			registry,
			ttl,
			tools_by_id: ArcSwap::from_pointee(HashMap::new()),
			cache_by_server: ArcSwap::from_pointee(HashMap::new()),
		}
	}

	pub fn lookup(&self, server_id: &str, name: &str) -> Option<ToolInfo> {
		self.tools_by_id.load().get(&tool_id(server_id, name)).cloned()
	}

	pub fn lookup_by_id(&self, tool_id: &str) -> Option<ToolInfo> {
		self.tools_by_id.load().get(tool_id).cloned()
	}

	pub fn all_tools(&self) -> Vec<ToolInfo> {
		self.tools_by_id.load().values().cloned().collect()
	}

	pub fn tools_for_server(&self, server_id: &str) -> Vec<ToolInfo> {
		self.tools_by_id.load().values().filter(|t| t.server_id == server_id).cloned().collect()
	}

	/// Discover one server, or every registered server if `server_id` is
	/// `None`. In the all-servers form, a single failing upstream is logged
	/// and skipped rather than failing the whole call (spec.md §7: discovery
	/// errors are recovered locally).
	pub async fn discover(&self, server_id: Option<&str>, force_refresh: bool) -> Result<Vec<ToolInfo>, CatalogueError> {
		match server_id {
			Some(id) => self.discover_one(id, force_refresh).await,
			None => {
				let mut out = Vec::new();
				for id in self.registry.ids() {
					match self.discover_one(&id, force_refresh).await {
						Ok(tools) => out.extend(tools),
						Err(err) => warn!(target: "catalogue", server_id = %id, error = %err, "discovery failed, skipping server"),
					}
				}
				Ok(out)
			},
		}
	}

	async fn discover_one(&self, id: &str, force_refresh: bool) -> Result<Vec<ToolInfo>, CatalogueError> {
		if self.registry.snapshot(id).await.is_none() {
			return Err(CatalogueError::UnknownServer { server_id: id.to_string() });
		}

		// Invariant I2: an unhealthy server's cache is evicted, never served.
		let healthy = self.registry.check_health(id).await;
		if !healthy {
			self.evict(id);
			return Ok(Vec::new());
		}

		if !force_refresh {
			if let Some(entry) = self.cache_by_server.load().get(id) {
				if entry.expires_at > Instant::now() {
					return Ok(entry.tools.clone());
				}
			}
		}

		match self.fetch_tools(id).await {
			Ok(tools) => {
				let entry = CacheEntry { tools: tools.clone(), expires_at: Instant::now() + self.ttl };
				self.cache_by_server.rcu(|current| {
					let mut next = (**current).clone();
					next.insert(id.to_string(), entry.clone());
					next
				});
				self.tools_by_id.rcu(|current| {
					let mut next = (**current).clone();
					next.retain(|_, t| t.server_id != id);
					for tool in &tools {
						next.insert(tool.tool_id(), tool.clone());
					}
					next
				});
				Ok(tools)
			},
			Err(source) => {
				self.evict(id);
				Err(CatalogueError::Discovery { server_id: id.to_string(), source })
			},
		}
	}

	fn evict(&self, id: &str) {
		self.cache_by_server.rcu(|current| {
			let mut next = (**current).clone();
			next.remove(id);
			next
		});
		self.tools_by_id.rcu(|current| {
			let mut next = (**current).clone();
			next.retain(|_, t| t.server_id != id);
			next
		});
	}

	async fn fetch_tools(&self, id: &str) -> Result<Vec<ToolInfo>, TransportError> {
		let record = self.registry.snapshot(id).await.expect("checked above");
		let result = transport::call(&self.client, &record.declaration, record.session.as_ref(), "tools/list", None).await?;
		let raw_tools = result.get("tools").and_then(Value::as_array).cloned().unwrap_or_default();
		let mut tools = Vec::with_capacity(raw_tools.len());
		for raw in raw_tools {
			let name = match raw.get("name").and_then(Value::as_str) {
				Some(n) => n.to_string(),
				None => continue,
			};
			let description = raw.get("description").and_then(Value::as_str).unwrap_or_default().to_string();
			let parameters = raw
				.get("parameters")
				.or_else(|| raw.get("inputSchema"))
				.cloned()
				.unwrap_or_else(|| serde_json::json!({"type": "object", "properties": {}, "required": []}));
			tools.push(ToolInfo {
				name,
				description,
				server_id: id.to_string(),
				parameters,
				category: record.category.clone(),
				tags: record.tags.clone(),
			});
		}
		Ok(tools)
	}
}
