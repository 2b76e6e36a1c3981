use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};

/// Embeds `texts` in one request. Vectors come back in input order.
pub async fn embed(
	cfg: &sift_config::EmbeddingProviderConfig,
	texts: &[String],
) -> Result<Vec<Vec<f32>>> {
	if texts.is_empty() {
		return Ok(Vec::new());
	}

	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = crate::endpoint(&cfg.api_base, &cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"input": texts,
		"dimensions": cfg.dimensions,
	});

	tracing::debug!(provider = %cfg.provider_id, texts = texts.len(), "Requesting embeddings.");

	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_embedding_response(json)
}

/// Places each item at its `index` (or its position when the field is absent). Every slot in
/// `0..data.len()` must be filled exactly once.
fn parse_embedding_response(json: Value) -> Result<Vec<Vec<f32>>> {
	let data = json
		.get("data")
		.and_then(Value::as_array)
		.ok_or_else(|| Error::invalid_response("Embedding response is missing data array."))?;
	let mut slots: Vec<Option<Vec<f32>>> = vec![None; data.len()];

	for (position, item) in data.iter().enumerate() {
		let index = match item.get("index") {
			None => position,
			Some(raw) => raw
				.as_u64()
				.and_then(|index| usize::try_from(index).ok())
				.ok_or_else(|| Error::invalid_response("Embedding index must be an integer."))?,
		};
		let Some(slot) = slots.get_mut(index) else {
			return Err(Error::invalid_response(format!(
				"Embedding index {index} is out of range for {} items.",
				data.len()
			)));
		};

		if slot.is_some() {
			return Err(Error::invalid_response(format!("Embedding index {index} is duplicated.")));
		}

		*slot = Some(parse_vector(item)?);
	}

	// Every index landed in range and none repeated, so all slots are filled.
	Ok(slots.into_iter().flatten().collect())
}

fn parse_vector(item: &Value) -> Result<Vec<f32>> {
	item.get("embedding")
		.and_then(Value::as_array)
		.ok_or_else(|| Error::invalid_response("Embedding item missing embedding array."))?
		.iter()
		.map(|value| {
			value
				.as_f64()
				.map(|number| number as f32)
				.ok_or_else(|| Error::invalid_response("Embedding value must be numeric."))
		})
		.collect()
}
