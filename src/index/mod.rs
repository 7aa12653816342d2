//! The Index Engine (C4): projects discovered tools into searchable
//! documents, hash-versions them, and keeps the document store synchronized.

pub mod document;
pub mod refresh;
pub mod store;

pub use document::ToolDocument;
pub use refresh::{ChangeSet, RefreshLoop};
pub use store::{DocumentStore, InMemoryDocumentStore};

use crate::catalogue::{Catalogue, ToolInfo};

/// Case-insensitive substring match over `tool_name ∨ tool_description ∨
/// search_text`, returning at most `top_k` tools resolved back to live
/// `ToolInfo` via the catalogue. `min_score` is reserved for a future ranked
/// retrieval and is a no-op today (spec.md §4.4).
pub async fn search(store: &dyn DocumentStore, catalogue: &Catalogue, query: &str, top_k: usize, _min_score: Option<f64>) -> Vec<ToolInfo> {
	let needle = query.to_lowercase();
	let mut matched = Vec::new();
	for doc in store.all().await {
		if matched.len() >= top_k {
			break;
		}
		if doc.name.to_lowercase().contains(&needle)
			|| doc.description.to_lowercase().contains(&needle)
			|| doc.search_text.to_lowercase().contains(&needle)
		{
			matched.push(doc.tool_id);
		}
	}
	matched.into_iter().filter_map(|id| catalogue.lookup_by_id(&id)).collect()
}
