//! Where a chunk is likely to land in a model's context window, and how much attention it
//! gets there.

use serde::{Deserialize, Serialize};

pub const MISMATCH_GAP: f32 = 15.0;
pub const NEEDS_REWORK_BELOW: f32 = 40.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextBand {
	Lead,
	Supporting,
	/// Lost in the middle.
	Middle,
	Trailing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttentionLevel {
	High,
	Medium,
	Low,
	LowRecencyBoosted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreMismatch {
	/// Retrieval finds it but reranking pushes it down.
	RetrievedButBuried,
	/// Reranking likes it but retrieval rarely surfaces it.
	RerankedButNotRetrieved,
	NeedsRework,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionAnalysis {
	pub hybrid_score: f32,
	pub rerank_score: f32,
	pub effective_score: f32,
	/// 1-based slot, fractional between band edges.
	pub estimated_position: f32,
	pub band: ContextBand,
	pub attention: AttentionLevel,
	pub mismatches: Vec<ScoreMismatch>,
	pub recommendation: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChunkPosition {
	pub chunk_index: usize,
	pub analysis: PositionAnalysis,
}

/// Scores are on 0-100; the weaker of the two decides the band.
pub fn estimate(hybrid_score: f32, rerank_score: f32) -> PositionAnalysis {
	let hybrid_score = bounded(hybrid_score);
	let rerank_score = bounded(rerank_score);
	let effective = hybrid_score.min(rerank_score);
	let (band, attention, estimated_position) = if effective >= 85.0 {
		(ContextBand::Lead, AttentionLevel::High, 1.0 + (100.0 - effective) / 15.0 * 4.0)
	} else if effective >= 75.0 {
		(ContextBand::Supporting, AttentionLevel::Medium, 5.0 + (85.0 - effective) / 10.0 * 5.0)
	} else if effective >= 60.0 {
		(ContextBand::Middle, AttentionLevel::Low, 10.0 + (75.0 - effective) / 15.0 * 5.0)
	} else {
		(
			ContextBand::Trailing,
			AttentionLevel::LowRecencyBoosted,
			15.0 + (60.0 - effective) / 60.0 * 15.0,
		)
	};
	let mut mismatches = Vec::new();
	let gap = hybrid_score - rerank_score;

	if gap > MISMATCH_GAP {
		mismatches.push(ScoreMismatch::RetrievedButBuried);
	}
	if gap < -MISMATCH_GAP {
		mismatches.push(ScoreMismatch::RerankedButNotRetrieved);
	}
	if hybrid_score < NEEDS_REWORK_BELOW && rerank_score < NEEDS_REWORK_BELOW {
		mismatches.push(ScoreMismatch::NeedsRework);
	}

	let recommendation = recommendation(band, &mismatches);

	PositionAnalysis {
		hybrid_score,
		rerank_score,
		effective_score: effective,
		estimated_position,
		band,
		attention,
		mismatches,
		recommendation,
	}
}

/// Estimates every `(chunk_index, hybrid, rerank)` triple, ordered by estimated position.
/// Equal positions keep input order.
pub fn estimate_all(scores: &[(usize, f32, f32)]) -> Vec<ChunkPosition> {
	let mut positions: Vec<ChunkPosition> = scores
		.iter()
		.map(|&(chunk_index, hybrid, rerank)| ChunkPosition {
			chunk_index,
			analysis: estimate(hybrid, rerank),
		})
		.collect();

	positions.sort_by(|lhs, rhs| {
		lhs.analysis.estimated_position.total_cmp(&rhs.analysis.estimated_position)
	});

	positions
}

fn recommendation(band: ContextBand, mismatches: &[ScoreMismatch]) -> String {
	if mismatches.contains(&ScoreMismatch::NeedsRework) {
		return "Both retrieval and reranking are weak; rework the chunk around the query."
			.to_string();
	}
	if mismatches.contains(&ScoreMismatch::RetrievedButBuried) {
		return "Retrieval finds this chunk but reranking buries it; lead with a direct answer \
			and clearer structure."
			.to_string();
	}
	if mismatches.contains(&ScoreMismatch::RerankedButNotRetrieved) {
		return "Reranking favours this chunk but retrieval misses it; echo the query's terms \
			and entities."
			.to_string();
	}

	match band {
		ContextBand::Lead => "Likely to lead the context with high attention.",
		ContextBand::Supporting => "Likely to support the answer; tighten it to reach the lead band.",
		ContextBand::Middle =>
			"Likely lost in the middle of the context; strengthen relevance to move up.",
		ContextBand::Trailing => "Likely near the end of the context; only recency keeps it visible.",
	}
	.to_string()
}

fn bounded(score: f32) -> f32 {
	if score.is_nan() { 0.0 } else { score.clamp(0.0, 100.0) }
}
