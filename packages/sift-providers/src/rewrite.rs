use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};

const MAX_ATTEMPTS: usize = 3;
const SYSTEM_PROMPT: &str = "You rewrite a passage so it answers a search query directly. \
Keep every fact, number and heading of the original. Lead with the answer, prefer short \
declarative sentences and lists, and repeat the query's key terms naturally. Return only the \
rewritten passage.";

/// Asks the chat model for a rewrite of `chunk_text` targeting `query`. Empty completions are
/// retried.
pub async fn rewrite(
	cfg: &sift_config::LlmProviderConfig,
	chunk_text: &str,
	query: &str,
) -> Result<String> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = crate::endpoint(&cfg.api_base, &cfg.path);
	let messages = build_messages(chunk_text, query);

	for attempt in 1..=MAX_ATTEMPTS {
		let body = serde_json::json!({
			"model": cfg.model,
			"temperature": cfg.temperature,
			"messages": messages,
		});
		let res = client
			.post(&url)
			.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
			.json(&body)
			.send()
			.await?;
		let json: Value = res.error_for_status()?.json().await?;

		match parse_rewrite_response(&json) {
			Ok(text) => return Ok(text),
			Err(err) => {
				tracing::warn!(error = %err, attempt, "Rewrite response was unusable.");
			},
		}
	}

	Err(Error::invalid_response("Rewrite provider returned no usable content."))
}

pub fn build_messages(chunk_text: &str, query: &str) -> Vec<Value> {
	vec![
		serde_json::json!({ "role": "system", "content": SYSTEM_PROMPT }),
		serde_json::json!({
			"role": "user",
			"content": format!("Query: {query}\n\nPassage:\n{chunk_text}"),
		}),
	]
}

fn parse_rewrite_response(json: &Value) -> Result<String> {
	let content = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
		.ok_or_else(|| Error::invalid_response("Rewrite response is missing message content."))?;
	let trimmed = content.trim();

	if trimmed.is_empty() {
		return Err(Error::invalid_response("Rewrite content is empty."));
	}

	Ok(trimmed.to_string())
}
