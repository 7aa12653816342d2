//! Full and incremental index builds, and the background refresh loop
//! (spec.md §4.4).

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::catalogue::Catalogue;
use crate::error::CatalogueError;
use crate::registry::{Registry, ServerRecord};

use super::document;
use super::store::DocumentStore;

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(600);
const SHUTDOWN_JOIN_DEADLINE: Duration = Duration::from_secs(5);

#[derive(Debug, Default, Clone)]
pub struct ChangeSet {
	pub added: Vec<String>,
	pub updated: Vec<String>,
	pub removed: Vec<String>,
	pub unchanged: Vec<String>,
}

impl ChangeSet {
	pub fn counts(&self) -> (usize, usize, usize, usize) {
		(self.added.len(), self.updated.len(), self.removed.len(), self.unchanged.len())
	}
}

/// Clear the store and re-index every discoverable tool, so the index
/// reflects the current configuration as ground truth (spec.md §4.4).
pub async fn full_build(catalogue: &Catalogue, registry: &Registry, store: &dyn DocumentStore) -> Result<usize, CatalogueError> {
	store.clear().await;
	let tools = catalogue.discover(None, true).await?;
	let now = Utc::now();
	let mut servers: HashMap<String, ServerRecord> = HashMap::new();
	let mut count = 0;
	for tool in tools {
		let server = server_for(registry, &mut servers, &tool.server_id).await?;
		store.upsert(document::project(&tool, &server, now)).await;
		count += 1;
	}
	Ok(count)
}

/// Compare freshly discovered tool_versions against the store and apply
/// only the delta.
pub async fn incremental_refresh(catalogue: &Catalogue, registry: &Registry, store: &dyn DocumentStore) -> Result<ChangeSet, CatalogueError> {
	let tools = catalogue.discover(None, true).await?;
	let now = Utc::now();
	let mut servers: HashMap<String, ServerRecord> = HashMap::new();
	let mut local_docs = Vec::with_capacity(tools.len());
	for tool in &tools {
		let server = server_for(registry, &mut servers, &tool.server_id).await?;
		local_docs.push(document::project(tool, &server, now));
	}

	let stored = store.all().await;
	let stored_versions: HashMap<String, String> = stored.iter().map(|d| (d.tool_id.clone(), d.tool_version.clone())).collect();
	let local_ids: HashSet<String> = local_docs.iter().map(|d| d.tool_id.clone()).collect();

	let mut change = ChangeSet::default();
	for doc in &local_docs {
		match stored_versions.get(&doc.tool_id) {
			None => change.added.push(doc.tool_id.clone()),
			Some(v) if *v != doc.tool_version => change.updated.push(doc.tool_id.clone()),
			Some(_) => change.unchanged.push(doc.tool_id.clone()),
		}
	}
	for doc in &stored {
		if !local_ids.contains(&doc.tool_id) {
			change.removed.push(doc.tool_id.clone());
		}
	}

	for id in &change.removed {
		store.delete(id).await;
	}
	for doc in local_docs {
		if change.added.contains(&doc.tool_id) || change.updated.contains(&doc.tool_id) {
			store.upsert(doc).await;
		}
	}

	Ok(change)
}

async fn server_for(registry: &Registry, cache: &mut HashMap<String, ServerRecord>, server_id: &str) -> Result<ServerRecord, CatalogueError> {
	if let Some(server) = cache.get(server_id) {
		return Ok(server.clone());
	}
	let server = registry
		.snapshot(server_id)
		.await
		.ok_or_else(|| CatalogueError::UnknownServer { server_id: server_id.to_string() })?;
	cache.insert(server_id.to_string(), server.clone());
	Ok(server)
}

/// One worker that alternates `sleep(interval)` and `refresh`, terminated by
/// a single shutdown signal observed at the sleep boundary (spec.md §9).
pub struct RefreshLoop {
	handle: JoinHandle<()>,
	shutdown_flag: Arc<AtomicBool>,
	notify: Arc<Notify>,
}

impl RefreshLoop {
	pub fn spawn(catalogue: Arc<Catalogue>, registry: Arc<Registry>, store: Arc<dyn DocumentStore>, interval: Duration) -> Self {
		let shutdown_flag = Arc::new(AtomicBool::new(false));
		let notify = Arc::new(Notify::new());
		let flag = shutdown_flag.clone();
		let wake = notify.clone();

		let handle = tokio::spawn(async move {
			loop {
				tokio::select! {
					_ = tokio::time::sleep(interval) => {},
					_ = wake.notified() => break,
				}
				if flag.load(Ordering::Relaxed) {
					break;
				}
				match incremental_refresh(&catalogue, &registry, store.as_ref()).await {
					Ok(change) => {
						let (added, updated, removed, unchanged) = change.counts();
						info!(target: "index", added, updated, removed, unchanged, "refresh completed");
					},
					Err(err) => warn!(target: "index", error = %err, "refresh failed, will retry next cycle"),
				}
			}
		});

		Self { handle, shutdown_flag, notify }
	}

	/// Signal the loop to exit at its next sleep boundary and wait for it,
	/// up to a bounded deadline; an in-progress refresh still runs to
	/// completion.
	pub async fn shutdown(self) {
		self.shutdown_flag.store(true, Ordering::Relaxed);
		self.notify.notify_one();
		let _ = tokio::time::timeout(SHUTDOWN_JOIN_DEADLINE, self.handle).await;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn change_set_counts_match_vectors() {
		let change = ChangeSet {
			added: vec!["a".into()],
			updated: vec![],
			removed: vec!["b".into(), "c".into()],
			unchanged: vec!["d".into()],
		};
		assert_eq!(change.counts(), (1, 0, 2, 1));
	}
}
