//! Envelope normalization (spec.md §4.5 step 5). The rules are intentionally
//! ordered; implemented as a sequence of pattern predicates evaluated
//! top-to-bottom, first match wins (spec.md §9) — the gateway is
//! downstream-tolerant by design, never strict about which subset of the
//! envelope an upstream actually populates.

use serde_json::Value;

pub fn normalize(result: &Value) -> String {
	if result.is_null() {
		return "operation complete (no result)".to_string();
	}

	if let Some(text) = first_content_text(result) {
		return match serde_json::from_str::<Value>(text) {
			Ok(parsed) => serde_json::to_string_pretty(&parsed).unwrap_or_else(|_| text.to_string()),
			Err(_) => text.to_string(),
		};
	}

	if let (Some(content), Some(size)) = (result.get("content").and_then(Value::as_str), result.get("size")) {
		return format!("file content ({size} chars): {content}");
	}

	if result.get("success").is_some() {
		return result.get("message").and_then(Value::as_str).map(str::to_string).unwrap_or_else(|| "operation successful".to_string());
	}

	if result.get("files").is_some() {
		return format_directory_listing(result);
	}

	serde_json::to_string_pretty(result).unwrap_or_else(|_| result.to_string())
}

fn first_content_text(result: &Value) -> Option<&str> {
	result.get("content")?.as_array()?.first()?.get("text")?.as_str()
}

/// Directory listing: header line with path and both file and directory
/// counts (the directory count is a supplemented detail, spec.md §11 item
/// 4 — the original reports it alongside the file count), then up to the
/// first ten entries.
fn format_directory_listing(result: &Value) -> String {
	let path = result.get("path").and_then(Value::as_str).unwrap_or("");
	let files = result.get("files").and_then(Value::as_array).cloned().unwrap_or_default();
	let directories = result.get("directories").and_then(Value::as_u64).unwrap_or(0);

	let mut out = format!("directory: {path} (files: {}, directories: {directories})\n", files.len());
	for entry in files.iter().take(10) {
		let name = entry.get("name").and_then(Value::as_str).unwrap_or_default();
		let size = entry.get("size").and_then(Value::as_u64).unwrap_or(0);
		out.push_str(&format!("- {name} ({size} bytes)\n"));
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn null_result_reports_no_result() {
		assert_eq!(normalize(&Value::Null), "operation complete (no result)");
	}

	#[test]
	fn pretty_prints_json_text_content() {
		let result = json!({"content": [{"type": "text", "text": "{\"k\":1}"}]});
		assert_eq!(normalize(&result), "{\n  \"k\": 1\n}");
	}

	#[test]
	fn falls_back_to_raw_text_when_not_json() {
		let result = json!({"content": [{"type": "text", "text": "hello"}]});
		assert_eq!(normalize(&result), "hello");
	}

	#[test]
	fn string_content_with_size_formats_file_content() {
		let result = json!({"content": "hi there", "size": 8});
		assert_eq!(normalize(&result), "file content (8 chars): hi there");
	}

	#[test]
	fn success_flag_uses_message_or_default() {
		assert_eq!(normalize(&json!({"success": true, "message": "done"})), "done");
		assert_eq!(normalize(&json!({"success": true})), "operation successful");
	}

	#[test]
	fn directory_listing_truncates_at_ten_but_reports_true_counts() {
		let files: Vec<Value> = (0..15).map(|i| json!({"name": format!("f{i}"), "size": i})).collect();
		let result = json!({"path": "/tmp", "files": files, "directories": 3});
		let rendered = normalize(&result);
		assert!(rendered.starts_with("directory: /tmp (files: 15, directories: 3)\n"));
		assert_eq!(rendered.matches("- f").count(), 10);
	}

	#[test]
	fn unrecognized_shape_pretty_prints_raw_result() {
		let result = json!({"whatever": 1});
		assert_eq!(normalize(&result), "{\n  \"whatever\": 1\n}");
	}
}
