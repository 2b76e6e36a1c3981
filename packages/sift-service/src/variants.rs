use serde::{Deserialize, Serialize};

use crate::{EmbeddingBatch, Error, Result, SiftService};
use sift_chunking::Chunk;
use sift_domain::{
	CategorizationReport, QueryVariant, SemanticSimilarity, analyze_intent, categorize_all,
	entity_overlap, metrics, passage_score,
};

#[derive(Clone, Debug)]
pub struct VariantRequest {
	pub document: String,
	pub primary_query: String,
	pub variants: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VariantReport {
	pub primary_query: String,
	pub chunks: Vec<Chunk>,
	pub report: CategorizationReport,
}

impl SiftService {
	/// Measures each fan-out variant against the document and the primary query, then sorts
	/// the variants into categories.
	pub async fn categorize_variants(&self, req: VariantRequest) -> Result<VariantReport> {
		let primary_query = req.primary_query.trim().to_string();

		if primary_query.is_empty() {
			return Err(Error::InvalidRequest {
				message: "Primary query must not be empty.".to_string(),
			});
		}

		let variants = crate::clean_queries(&req.variants);
		let chunks = self.chunk(&req.document)?;

		if variants.is_empty() {
			return Ok(VariantReport {
				primary_query,
				report: categorize_all(Vec::new(), &chunks),
				chunks,
			});
		}

		tracing::info!(chunks = chunks.len(), variants = variants.len(), "Categorization started.");

		let mut batch = EmbeddingBatch::default();
		let document_slot = batch.push(req.document.as_str());
		let primary_slot = batch.push(primary_query.as_str());
		let variant_slots = batch.extend(variants.iter().cloned());
		let chunk_slots = batch.extend(chunks.iter().map(|chunk| chunk.text.clone()));
		let vectors = self.embed_batch(batch.texts()).await?;
		let document_vector = &vectors[document_slot];
		let primary_vector = &vectors[primary_slot];
		let chunk_vectors = &vectors[chunk_slots];
		let measured: Vec<QueryVariant> = variants
			.into_iter()
			.zip(variant_slots)
			.map(|(query, slot)| {
				let vector = &vectors[slot];
				let best = best_chunk(chunk_vectors, vector);
				let passage = best
					.map(|(index, cosine)| {
						passage_score(&chunks[index], &query, SemanticSimilarity::Unit(cosine))
							.passage_score
					})
					.unwrap_or(0);
				let intent =
					analyze_intent(&primary_query, &query, metrics::cosine(primary_vector, vector));

				QueryVariant {
					content_similarity: metrics::cosine(document_vector, vector),
					passage_score: passage,
					best_chunk_index: best.map(|(index, _)| index),
					intent,
					entity_overlap: entity_overlap(&query, &req.document),
					query,
				}
			})
			.collect();
		let report = categorize_all(measured, &chunks);

		tracing::info!(
			opportunities = report.summary.counts.optimization_opportunity,
			gaps = report.summary.counts.content_gap,
			drift = report.summary.counts.intent_drift,
			out_of_scope = report.summary.counts.out_of_scope,
			"Categorization finished."
		);

		Ok(VariantReport { primary_query, chunks, report })
	}
}

/// Most similar chunk by cosine; the lowest index wins ties.
fn best_chunk(chunk_vectors: &[Vec<f32>], query_vector: &[f32]) -> Option<(usize, f32)> {
	let mut best: Option<(usize, f32)> = None;

	for (index, chunk_vector) in chunk_vectors.iter().enumerate() {
		let cosine = metrics::cosine(chunk_vector, query_vector);

		if best.is_none_or(|(_, current)| cosine > current) {
			best = Some((index, cosine));
		}
	}

	best
}
