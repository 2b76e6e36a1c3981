use std::{collections::HashMap, ops::Range};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{EmbeddingBatch, Error, Result, SiftService};
use sift_chunking::Chunk;
use sift_domain::{
	ChunkPosition, ChunkScores, PassageScoreResult, QueryAssignmentMap, SemanticSimilarity,
	SimilarityScores, compute_query_assignments, metrics, passage_score, position, reassign_query,
	text,
};

#[derive(Clone, Debug)]
pub struct AnalyzeRequest {
	pub document: String,
	pub queries: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuerySimilarity {
	pub query: String,
	/// Cosine between the query and the whole document.
	pub cosine: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PairScore {
	pub query: String,
	pub chunk_index: usize,
	pub similarity: SimilarityScores,
	pub passage: PassageScoreResult,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
	pub chunks: Vec<Chunk>,
	pub queries: Vec<String>,
	pub document_similarity: Vec<QuerySimilarity>,
	/// Query-major: every chunk for the first query, then the next query.
	pub pairs: Vec<PairScore>,
	pub scores: ChunkScores,
	pub assignments: QueryAssignmentMap,
	pub positions: Vec<ChunkPosition>,
}
impl AnalysisReport {
	pub fn pair(&self, query: &str, chunk_index: usize) -> Option<&PairScore> {
		let query_index = self.queries.iter().position(|declared| declared == query)?;

		pair_at(&self.pairs, self.chunks.len(), query_index, chunk_index)
	}

	/// Manual override of one assignment. Returns the query evicted from the target chunk.
	pub fn reassign(&mut self, query: &str, chunk_index: usize) -> Result<Option<String>> {
		let reassignment = reassign_query(&self.assignments, query, chunk_index, &self.scores)?;

		self.assignments = reassignment.map;
		self.positions =
			estimate_positions(&self.chunks, &self.queries, &self.pairs, &self.assignments);

		Ok(reassignment.evicted_query)
	}
}

struct ChunkSlots {
	chunk: usize,
	sentences: Option<Range<usize>>,
}

struct QuerySlots {
	query: usize,
	clauses: Option<Range<usize>>,
}

/// Everything one scoring pass needs, owned so it can move onto a blocking thread.
struct ScoringMatrix {
	chunks: Vec<Chunk>,
	queries: Vec<String>,
	vectors: Vec<Vec<f32>>,
	chunk_slots: Vec<ChunkSlots>,
	query_slots: Vec<QuerySlots>,
}
impl ScoringMatrix {
	/// Query-major: every chunk for the first query, then the next query.
	fn score_pairs(&self) -> Vec<PairScore> {
		let chunk_count = self.chunks.len();

		(0..self.queries.len() * chunk_count)
			.into_par_iter()
			.map(|pair_index| {
				let query_index = pair_index / chunk_count;
				let chunk_index = pair_index % chunk_count;
				let chunk_slot = &self.chunk_slots[chunk_index];
				let query_slot = &self.query_slots[query_index];
				let chunk_vector = &self.vectors[chunk_slot.chunk];
				let query_vector = &self.vectors[query_slot.query];
				let similarity = match (&chunk_slot.sentences, &query_slot.clauses) {
					(Some(sentences), Some(clauses)) => SimilarityScores::with_chamfer(
						chunk_vector,
						query_vector,
						&self.vectors[sentences.clone()],
						&self.vectors[clauses.clone()],
					),
					_ => SimilarityScores::between(chunk_vector, query_vector),
				};
				let query = &self.queries[query_index];
				let passage = passage_score(
					&self.chunks[chunk_index],
					query,
					SemanticSimilarity::Unit(similarity.cosine),
				);

				PairScore { query: query.clone(), chunk_index, similarity, passage }
			})
			.collect()
	}
}

impl SiftService {
	/// Chunks the document, embeds everything in one batch, scores every (query, chunk) pair
	/// and assigns each query to at most one chunk.
	pub async fn analyze(&self, req: AnalyzeRequest) -> Result<AnalysisReport> {
		let queries = crate::clean_queries(&req.queries);
		let chunks = self.chunk(&req.document)?;

		tracing::info!(chunks = chunks.len(), queries = queries.len(), "Analysis started.");

		if chunks.is_empty() || queries.is_empty() {
			let scores = ChunkScores::new(chunks.len());
			let assignments =
				compute_query_assignments(&scores, &queries, self.cfg.scoring.min_assignment_score);

			return Ok(AnalysisReport {
				chunks,
				document_similarity: Vec::new(),
				pairs: Vec::new(),
				scores,
				assignments,
				positions: Vec::new(),
				queries,
			});
		}

		let sentence_chamfer = self.cfg.scoring.sentence_chamfer;
		let mut batch = EmbeddingBatch::default();
		let document_slot = batch.push(req.document.as_str());
		let mut chunk_slots: Vec<ChunkSlots> = Vec::with_capacity(chunks.len());
		let mut query_slots: Vec<QuerySlots> = Vec::with_capacity(queries.len());

		for chunk in &chunks {
			let slot = batch.push(chunk.text.as_str());
			let sentences =
				sentence_chamfer.then(|| text::sentences(&chunk.text_without_cascade));

			chunk_slots.push(ChunkSlots {
				chunk: slot,
				sentences: sentences.map(|sentences| batch.extend(sentences)),
			});
		}
		for query in &queries {
			let slot = batch.push(query.as_str());
			let clauses = sentence_chamfer.then(|| text::clauses(query));

			query_slots.push(QuerySlots {
				query: slot,
				clauses: clauses.map(|clauses| batch.extend(clauses)),
			});
		}

		let vectors = self.embed_batch(batch.texts()).await?;
		let document_vector = &vectors[document_slot];
		let document_similarity: Vec<QuerySimilarity> = queries
			.iter()
			.zip(query_slots.iter())
			.map(|(query, slots)| QuerySimilarity {
				query: query.clone(),
				cosine: metrics::cosine(document_vector, &vectors[slots.query]),
			})
			.collect();
		let matrix = ScoringMatrix { chunks, queries, vectors, chunk_slots, query_slots };
		// Scoring is CPU-bound; keep it off the async workers.
		let (matrix, pairs) = tokio::task::spawn_blocking(move || {
			let pairs = matrix.score_pairs();

			(matrix, pairs)
		})
		.await
		.map_err(|err| Error::Scoring { message: err.to_string() })?;
		let ScoringMatrix { chunks, queries, .. } = matrix;
		let mut scores = ChunkScores::new(chunks.len());

		for pair in &pairs {
			let score = pair.passage.passage_score as f32;

			scores.insert(pair.query.as_str(), pair.chunk_index, score)?;
		}

		let assignments =
			compute_query_assignments(&scores, &queries, self.cfg.scoring.min_assignment_score);
		let positions = estimate_positions(&chunks, &queries, &pairs, &assignments);

		tracing::info!(
			assigned = assignments.assignments.len(),
			unassigned = assignments.unassigned_queries.len(),
			"Analysis finished."
		);

		Ok(AnalysisReport {
			chunks,
			queries,
			document_similarity,
			pairs,
			scores,
			assignments,
			positions,
		})
	}
}

/// Pairs are query-major, so the pair for `(query_index, chunk_index)` sits at a fixed offset.
fn pair_at(
	pairs: &[PairScore],
	chunk_count: usize,
	query_index: usize,
	chunk_index: usize,
) -> Option<&PairScore> {
	if chunk_index >= chunk_count {
		return None;
	}

	pairs.get(query_index * chunk_count + chunk_index)
}

/// Each chunk is placed by the pair it is assigned to, or by its best-scoring pair when no
/// query holds it.
fn estimate_positions(
	chunks: &[Chunk],
	queries: &[String],
	pairs: &[PairScore],
	assignments: &QueryAssignmentMap,
) -> Vec<ChunkPosition> {
	let chunk_count = chunks.len();
	let query_indices: HashMap<&str, usize> =
		queries.iter().enumerate().map(|(index, query)| (query.as_str(), index)).collect();
	let triples: Vec<(usize, f32, f32)> = chunks
		.iter()
		.enumerate()
		.filter_map(|(chunk_index, chunk)| {
			let pair = match assignments.chunk_occupant(chunk_index) {
				Some(assignment) => query_indices
					.get(assignment.query.as_str())
					.and_then(|&query_index| pair_at(pairs, chunk_count, query_index, chunk_index)),
				// Reversed so the earliest query wins ties.
				None => (0..queries.len())
					.rev()
					.filter_map(|query_index| pair_at(pairs, chunk_count, query_index, chunk_index))
					.max_by_key(|pair| pair.passage.passage_score),
			}?;

			Some((chunk.index, pair.passage.retrieval_score, pair.passage.rerank_score))
		})
		.collect();

	position::estimate_all(&triples)
}
