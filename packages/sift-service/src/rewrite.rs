use serde::{Deserialize, Serialize};

use crate::{Error, Result, SiftService};
use sift_chunking::Chunk;
use sift_domain::{PassageScoreResult, SemanticSimilarity, metrics, passage_score};

#[derive(Clone, Debug)]
pub struct RewriteRequest {
	pub document: String,
	pub chunk_index: usize,
	pub query: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RewriteOutcome {
	pub query: String,
	pub original: Chunk,
	pub rewritten: Chunk,
	pub similarity_before: f32,
	pub similarity_after: f32,
	pub before: PassageScoreResult,
	pub after: PassageScoreResult,
	pub score_delta: i64,
}

impl SiftService {
	/// Rewrites one chunk toward `query` and scores it before and after. The rewritten chunk
	/// keeps the original's headings and position.
	pub async fn rewrite_chunk(&self, req: RewriteRequest) -> Result<RewriteOutcome> {
		let query = req.query.trim().to_string();

		if query.is_empty() {
			return Err(Error::InvalidRequest { message: "Query must not be empty.".to_string() });
		}

		let chunks = self.chunk(&req.document)?;
		let Some(original) = chunks.into_iter().nth(req.chunk_index) else {
			return Err(Error::InvalidRequest {
				message: format!("Chunk index {} is out of range.", req.chunk_index),
			});
		};
		let text = self
			.providers
			.rewrite
			.rewrite(&self.cfg.providers.rewrite, &original.text_without_cascade, &query)
			.await?;
		let body = text.trim();

		if body.is_empty() {
			return Err(Error::InvalidRewrite { chunk_index: original.index });
		}

		let rewritten =
			original.with_body(body, self.cfg.chunking.cascade_headings, self.counter());
		let texts = [original.text.clone(), rewritten.text.clone(), query.clone()];
		let vectors = self.embed_batch(&texts).await?;
		let similarity_before = metrics::cosine(&vectors[0], &vectors[2]);
		let similarity_after = metrics::cosine(&vectors[1], &vectors[2]);
		let before = passage_score(&original, &query, SemanticSimilarity::Unit(similarity_before));
		let after = passage_score(&rewritten, &query, SemanticSimilarity::Unit(similarity_after));
		let score_delta = i64::from(after.passage_score) - i64::from(before.passage_score);

		tracing::info!(
			chunk = original.index,
			before = before.passage_score,
			after = after.passage_score,
			"Rewrite scored."
		);

		Ok(RewriteOutcome {
			query,
			original,
			rewritten,
			similarity_before,
			similarity_after,
			before,
			after,
			score_delta,
		})
	}
}
