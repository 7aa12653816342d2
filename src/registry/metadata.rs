//! Category and tag inference over a server's discovered tool set
//! (spec.md §4.2). Ported faithfully from the keyword table in
//! `mcp_server_manager.py::_auto_discover_server_metadata`; a pluggable
//! classifier is explicitly out of scope (spec.md §9 open questions).

const CATEGORY_KEYWORDS: &[(&[&str], &str)] = &[
	(&["file", "read", "write"], "file_operations"),
	(&["time", "date"], "system"),
	(&["mysql", "sql", "query"], "database"),
	(&["music", "song"], "music"),
	(&["train", "ticket", "12306"], "travel"),
];

const STOPWORD_VERBS: &[&str] = &["get", "set", "list", "create", "delete", "update"];

/// First matching category in `CATEGORY_KEYWORDS`, scanning each tool's name
/// and description for a keyword. `None` if nothing matches.
pub fn infer_category<'a>(tools: impl IntoIterator<Item = (&'a str, &'a str)>) -> Option<String> {
	let haystacks: Vec<String> = tools
		.into_iter()
		.map(|(name, description)| format!("{name} {description}").to_lowercase())
		.collect();
	for (keywords, category) in CATEGORY_KEYWORDS {
		if haystacks.iter().any(|h| keywords.iter().any(|kw| h.contains(kw))) {
			return Some((*category).to_string());
		}
	}
	None
}

/// Up to five lower-cased tokens extracted from tool names, splitting on
/// `_`/`-` and dropping the stopword verbs.
pub fn infer_tags<'a>(tool_names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
	let mut tags = Vec::new();
	for name in tool_names {
		for token in name.split(|c| c == '_' || c == '-') {
			let token = token.to_lowercase();
			if token.is_empty() || STOPWORD_VERBS.contains(&token.as_str()) {
				continue;
			}
			if !tags.contains(&token) {
				tags.push(token);
			}
			if tags.len() == 5 {
				return tags;
			}
		}
	}
	tags
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn infers_file_operations_category() {
		let tools = [("read_file", "reads a file from disk")];
		assert_eq!(infer_category(tools), Some("file_operations".to_string()));
	}

	#[test]
	fn infers_no_category_when_no_keyword_matches() {
		let tools = [("play_song", "plays a song")];
		assert_eq!(infer_category(tools.iter().map(|(n, d)| (*n, *d))), Some("music".to_string()));
		let tools = [("noop", "does nothing relevant")];
		assert_eq!(infer_category(tools), None);
	}

	#[test]
	fn tags_drop_stopword_verbs_and_cap_at_five() {
		let names = ["get_user_profile_settings_data_extra", "list_items"];
		let tags = infer_tags(names);
		assert!(!tags.contains(&"get".to_string()));
		assert!(!tags.contains(&"list".to_string()));
		assert!(tags.len() <= 5);
	}

	#[test]
	fn tags_deduplicate() {
		let names = ["read_file", "read_file_contents"];
		let tags = infer_tags(names);
		assert_eq!(tags.iter().filter(|t| t.as_str() == "read").count(), 1);
	}
}
