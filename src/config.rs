//! The gateway's one configuration document: `{ mcpServers: { ... } }`
//! (spec.md §6). Loaded once at startup; never hot-reloaded (that is the
//! Server Registry's job for *server state*, not for this document).

use std::collections::HashMap;
use std::env;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::warn;

use crate::error::ConfigError;
use crate::registry::Dialect;

/// Raw configuration document, as it comes off the wire / disk.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
	#[serde(rename = "mcpServers", default)]
	pub mcp_servers: HashMap<String, RawServerConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawServerConfig {
	pub url: Option<String>,
	#[serde(default)]
	pub r#type: Option<String>,
	#[serde(default)]
	pub headers: Option<HashMap<String, String>>,
}

/// A single server declaration, validated and with `${VAR}` substitution
/// already applied to header values.
#[derive(Debug, Clone)]
pub struct ServerDeclaration {
	pub id: String,
	pub url: String,
	pub dialect: Dialect,
	pub headers: HashMap<String, String>,
}

impl GatewayConfig {
	pub fn from_str(s: &str) -> Result<Self, ConfigError> {
		Ok(serde_json::from_str(s)?)
	}

	pub async fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
		let content = tokio::fs::read_to_string(path).await?;
		Self::from_str(&content)
	}

	/// Validate and substitute environment variables in every declared
	/// server. Entries missing `url` or with an unrecognized `type` are
	/// skipped with a `warn!`, never fatal (spec.md §4.2).
	pub fn declarations(&self) -> Vec<ServerDeclaration> {
		let mut out = Vec::new();
		for (id, raw) in &self.mcp_servers {
			let Some(url) = raw.url.clone() else {
				warn!(target: "registry", server_id = %id, "skipping server: missing url");
				continue;
			};
			let dialect = match raw.r#type.as_deref().unwrap_or("plain") {
				"plain" => Dialect::Plain,
				"streamable" => Dialect::Streamable,
				"sse" => Dialect::Sse,
				other => {
					warn!(target: "registry", server_id = %id, dialect = other, "skipping server: unknown type");
					continue;
				},
			};
			let headers = raw
				.headers
				.clone()
				.unwrap_or_default()
				.into_iter()
				.map(|(k, v)| (k.clone(), substitute_env(&v, id, &k)))
				.collect();
			out.push(ServerDeclaration { id: id.clone(), url, dialect, headers });
		}
		out
	}
}

static ENV_VAR_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").unwrap());

/// Replace every `${NAME}` occurrence in `value` with the environment
/// variable's value, or the empty string (with a warning) if unset.
fn substitute_env(value: &str, server_id: &str, header_name: &str) -> String {
	ENV_VAR_PATTERN
		.replace_all(value, |caps: &regex::Captures| {
			let var_name = &caps[1];
			match env::var(var_name) {
				Ok(v) => v,
				Err(_) => {
					warn!(
						target: "registry",
						server_id,
						header = header_name,
						var = var_name,
						"environment variable not set, substituting empty string"
					);
					String::new()
				},
			}
		})
		.into_owned()
}
