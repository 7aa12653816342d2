//! The Server Registry (C2): loads upstream declarations, bootstraps them
//! against C1, tracks derived metadata, and owns health state. Process-wide
//! mutable state (spec.md §9) — a per-server `tokio::sync::Mutex` enforces
//! the single-writer discipline spec.md §5 requires; readers take an
//! immutable snapshot (a clone) rather than holding a lock across I/O.

pub mod health;
pub mod metadata;
pub mod server;

pub use server::{Dialect, ServerRecord, SessionState};

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use reqwest::Client;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{info, warn};

use crate::config::ServerDeclaration;
use crate::transport;

type Slot = Arc<AsyncMutex<ServerRecord>>;

pub struct Registry {
	client: Client,
	servers: RwLock<HashMap<String, Slot>>,
}

impl Registry {
	pub fn new(client: Client) -> Self {
		Self { client, servers: RwLock::new(HashMap::new()) }
	}

	/// Insert one record per declaration (spec.md §4.2: malformed entries
	/// never reach here — `GatewayConfig::declarations` already filtered
	/// them). Re-loading an id replaces its record.
	pub fn load(&self, declarations: Vec<ServerDeclaration>) {
		let mut servers = self.servers.write();
		for decl in declarations {
			servers.insert(decl.id.clone(), Arc::new(AsyncMutex::new(ServerRecord::new(decl))));
		}
	}

	pub fn ids(&self) -> Vec<String> {
		self.servers.read().keys().cloned().collect()
	}

	fn slot(&self, id: &str) -> Option<Slot> {
		self.servers.read().get(id).cloned()
	}

	/// An immutable copy of one server's current state.
	pub async fn snapshot(&self, id: &str) -> Option<ServerRecord> {
		let slot = self.slot(id)?;
		Some(slot.lock().await.clone())
	}

	pub async fn snapshot_all(&self) -> Vec<ServerRecord> {
		let slots: Vec<Slot> = self.servers.read().values().cloned().collect();
		let mut out = Vec::with_capacity(slots.len());
		for slot in slots {
			out.push(slot.lock().await.clone());
		}
		out
	}

	/// Bootstrap every registered server against C1, recording whatever
	/// `initialize` yields. Failures are kept (spec.md §4.2: "still keep the
	/// record... remains a candidate for later recovery"), never fatal.
	pub async fn bootstrap_all(&self) {
		for id in self.ids() {
			self.bootstrap_one(&id).await;
		}
	}

	pub async fn bootstrap_one(&self, id: &str) {
		let Some(slot) = self.slot(id) else { return };
		let mut record = slot.lock().await;
		match transport::initialize(&self.client, &record.declaration).await {
			Ok(outcome) => {
				if let Some(name) = outcome.name {
					record.name = name;
				}
				if let Some(description) = outcome.description {
					record.description = description;
				}
				record.capabilities = outcome.capabilities;
				record.protocol_version = outcome.protocol_version;
				record.session = outcome.session;
				info!(target: "registry", server_id = id, "bootstrap succeeded");
			},
			Err(err) => {
				warn!(target: "registry", server_id = id, error = %err, "bootstrap failed, server remains registered");
			},
		}
	}

	/// Record category/tags inferred from a server's discovered tool set
	/// (spec.md §4.2, driven from C3's first discovery).
	pub async fn set_metadata(&self, id: &str, category: Option<String>, tags: Vec<String>) {
		let Some(slot) = self.slot(id) else { return };
		let mut record = slot.lock().await;
		record.category = category;
		record.tags = tags;
	}

	/// Run a health probe and persist the outcome (and any refreshed
	/// session) on the record. Returns the updated healthiness.
	pub async fn check_health(&self, id: &str) -> bool {
		let Some(slot) = self.slot(id) else { return false };
		let (decl, current_session) = {
			let record = slot.lock().await;
			(record.declaration.clone(), record.session.clone())
		};
		let status = health::probe(&self.client, &decl, current_session).await;
		let mut record = slot.lock().await;
		match status {
			health::HealthStatus::Healthy { session } => {
				if session.is_some() {
					record.session = session;
				}
				record.healthy = Some(true);
				true
			},
			health::HealthStatus::Unhealthy => {
				record.healthy = Some(false);
				false
			},
		}
	}

	pub async fn ensure_session(&self, id: &str) -> Result<(), crate::error::TransportError> {
		let Some(slot) = self.slot(id) else { return Ok(()) };
		let mut record = slot.lock().await;
		if !record.dialect().requires_session() || record.session.is_some() {
			return Ok(());
		}
		let outcome = transport::initialize(&self.client, &record.declaration).await?;
		record.session = outcome.session;
		Ok(())
	}
}
