//! The document store (spec.md §6 "Persisted state layout"): an abstract
//! collaborator out of this crate's scope. `DocumentStore` is the seam;
//! `InMemoryDocumentStore` is a reference implementation sufficient for
//! tests and for embedding the gateway without a real document database.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::document::ToolDocument;

#[async_trait]
pub trait DocumentStore: Send + Sync {
	async fn get(&self, tool_id: &str) -> Option<ToolDocument>;
	async fn upsert(&self, document: ToolDocument);
	async fn delete(&self, tool_id: &str);
	/// Secondary lookup by `server_id` (spec.md §6: "must be efficient").
	async fn list_by_server(&self, server_id: &str) -> Vec<ToolDocument>;
	async fn all(&self) -> Vec<ToolDocument>;
	async fn clear(&self);
}

#[derive(Default)]
pub struct InMemoryDocumentStore {
	documents: RwLock<HashMap<String, ToolDocument>>,
}

impl InMemoryDocumentStore {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
	async fn get(&self, tool_id: &str) -> Option<ToolDocument> {
		self.documents.read().get(tool_id).cloned()
	}

	async fn upsert(&self, document: ToolDocument) {
		self.documents.write().insert(document.tool_id.clone(), document);
	}

	async fn delete(&self, tool_id: &str) {
		self.documents.write().remove(tool_id);
	}

	async fn list_by_server(&self, server_id: &str) -> Vec<ToolDocument> {
		self.documents.read().values().filter(|d| d.server_id == server_id).cloned().collect()
	}

	async fn all(&self) -> Vec<ToolDocument> {
		self.documents.read().values().cloned().collect()
	}

	async fn clear(&self) {
		self.documents.write().clear();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Utc;

	fn doc(tool_id: &str, server_id: &str, version: &str) -> ToolDocument {
		let now = Utc::now();
		ToolDocument {
			tool_id: tool_id.to_string(),
			name: tool_id.to_string(),
			description: String::new(),
			server_id: server_id.to_string(),
			category: None,
			tags: vec![],
			search_text: String::new(),
			tool_version: version.to_string(),
			server_version: "v1".to_string(),
			last_discovered_at: now,
			indexed_at: now,
		}
	}

	#[tokio::test]
	async fn upsert_then_get_round_trips() {
		let store = InMemoryDocumentStore::new();
		store.upsert(doc("a:t", "a", "v1")).await;
		assert_eq!(store.get("a:t").await.unwrap().tool_version, "v1");
	}

	#[tokio::test]
	async fn delete_removes_entry() {
		let store = InMemoryDocumentStore::new();
		store.upsert(doc("a:t", "a", "v1")).await;
		store.delete("a:t").await;
		assert!(store.get("a:t").await.is_none());
	}

	#[tokio::test]
	async fn list_by_server_filters() {
		let store = InMemoryDocumentStore::new();
		store.upsert(doc("a:t1", "a", "v1")).await;
		store.upsert(doc("b:t2", "b", "v1")).await;
		let a_docs = store.list_by_server("a").await;
		assert_eq!(a_docs.len(), 1);
		assert_eq!(a_docs[0].tool_id, "a:t1");
	}

	#[tokio::test]
	async fn clear_empties_store() {
		let store = InMemoryDocumentStore::new();
		store.upsert(doc("a:t", "a", "v1")).await;
		store.clear().await;
		assert!(store.all().await.is_empty());
	}
}
