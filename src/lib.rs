//! Tool Federation Gateway: aggregates many JSON-RPC 2.0 MCP tool servers
//! behind one tool-invocation surface. See each module for its component:
//! `transport` (C1), `registry` (C2), `catalogue` (C3), `index` (C4),
//! `dispatcher` (C5).
//!
//! This is a library crate; command-line entry points, environment-variable
//! parsing, and logging setup are the embedder's responsibility (spec.md
//! §1). `init_tracing` is provided for convenience in binaries and tests,
//! but is never called by library code itself.

pub mod catalogue;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod index;
pub mod jsonrpc;
pub mod registry;
pub mod transport;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::info;

use catalogue::{Catalogue, ToolInfo};
use config::GatewayConfig;
use dispatcher::Dispatcher;
use index::{refresh::RefreshLoop, DocumentStore, InMemoryDocumentStore};
use registry::{metadata, Registry};

/// Top-level composition of all five components, matching the
/// `agentgateway` boundary between leaf-module `thiserror` types and
/// top-level `anyhow::Result`.
pub struct Gateway {
	pub registry: Arc<Registry>,
	pub catalogue: Arc<Catalogue>,
	pub store: Arc<dyn DocumentStore>,
	dispatcher: Dispatcher,
	refresh_loop: Option<RefreshLoop>,
}

impl Gateway {
	/// Startup sequence (spec.md §2 data flow): load config, bootstrap every
	/// server, run a first discovery to infer category/tags, then a full
	/// index build against a fresh in-memory document store.
	pub async fn bootstrap(config: &GatewayConfig) -> anyhow::Result<Self> {
		let client = Client::builder().build()?;
		let registry = Arc::new(Registry::new(client.clone()));
		registry.load(config.declarations());
		registry.bootstrap_all().await;

		let catalogue = Arc::new(Catalogue::new(client.clone(), registry.clone()));
		for id in registry.ids() {
			let tools = catalogue.discover(Some(&id), true).await.unwrap_or_default();
			let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
			let descriptions: Vec<(&str, &str)> = tools.iter().map(|t| (t.name.as_str(), t.description.as_str())).collect();
			let category = metadata::infer_category(descriptions);
			let tags = metadata::infer_tags(names);
			registry.set_metadata(&id, category, tags).await;
			// Re-discover so the cached ToolInfo (and later the index
			// projection) carries the category/tags just inferred.
			let _ = catalogue.discover(Some(&id), true).await;
		}

		let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
		let count = index::refresh::full_build(&catalogue, &registry, store.as_ref()).await?;
		info!(target: "index", count, "full build complete");

		let dispatcher = Dispatcher::new(client, catalogue.clone(), registry.clone());

		Ok(Self { registry, catalogue, store, dispatcher, refresh_loop: None })
	}

	/// Start the Index Engine's background refresh loop. Not started
	/// automatically by `bootstrap` — an embedder without a long-running
	/// process (e.g. a one-shot CLI) has no use for it.
	pub fn start_background_refresh(&mut self, interval: Duration) {
		self.refresh_loop = Some(RefreshLoop::spawn(self.catalogue.clone(), self.registry.clone(), self.store.clone(), interval));
	}

	/// Cooperative shutdown: signal the refresh loop and wait for it, up to
	/// its bounded join deadline.
	pub async fn shutdown(mut self) {
		if let Some(loop_) = self.refresh_loop.take() {
			loop_.shutdown().await;
		}
	}

	pub async fn call(&self, server_id: &str, tool_name: &str, arguments: Value) -> String {
		self.dispatcher.call(server_id, tool_name, arguments).await
	}

	pub fn get_mcp_server_tools(&self, server_id: &str) -> String {
		self.dispatcher.get_mcp_server_tools(server_id)
	}

	pub async fn search(&self, query: &str, top_k: usize, min_score: Option<f64>) -> Vec<ToolInfo> {
		index::search(self.store.as_ref(), &self.catalogue, query, top_k, min_score).await
	}
}

/// Installs a `tracing_subscriber::fmt` subscriber reading `RUST_LOG`.
/// Provided for binaries/tests; a library must never install a global
/// subscriber on its caller's behalf, so this is opt-in.
pub fn init_tracing() {
	use tracing_subscriber::{fmt, EnvFilter};
	let _ = fmt().with_env_filter(EnvFilter::from_default_env()).try_init();
}
