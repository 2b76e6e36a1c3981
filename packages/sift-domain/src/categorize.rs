//! Sorts query variants into what a content author should do about them.

use serde::{Deserialize, Serialize};

use crate::{
	entities::EntityOverlap,
	intent::{IntentAnalysis, SearchIntent},
	tier::ScoreTier,
};
use sift_chunking::Chunk;

pub const DRIFT_THRESHOLD: f32 = 40.0;
pub const OUT_OF_SCOPE_SIMILARITY: f32 = 0.40;
pub const MIN_PASSAGE_SCORE: u32 = 40;
pub const BRIEF_MIN_WORDS: u32 = 400;
pub const BRIEF_MAX_WORDS: u32 = 600;

/// Measurements for one variant, gathered before categorization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryVariant {
	pub query: String,
	/// Cosine between the variant and the whole document.
	pub content_similarity: f32,
	/// Passage score against the best-matching chunk.
	pub passage_score: u32,
	pub best_chunk_index: Option<usize>,
	pub intent: IntentAnalysis,
	pub entity_overlap: EntityOverlap,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VariantCategory {
	OptimizationOpportunity,
	ContentGap,
	IntentDrift,
	OutOfScope,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendedAction {
	ReportDrift {
		primary_intent: SearchIntent,
		variant_intent: SearchIntent,
		drift_score: f32,
	},
	Delete {
		content_similarity: f32,
	},
	AssignToChunk {
		chunk_index: usize,
		heading: Option<String>,
		current_score: u32,
	},
	GenerateContentBrief {
		missing_entities: Vec<String>,
		min_words: u32,
		max_words: u32,
	},
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategorizedVariant {
	pub query: String,
	pub content_similarity: f32,
	pub passage_score: u32,
	pub tier: ScoreTier,
	pub best_chunk_index: Option<usize>,
	pub intent: IntentAnalysis,
	pub entity_overlap: EntityOverlap,
	pub category: VariantCategory,
	pub reasoning: String,
	pub action: RecommendedAction,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounts {
	pub optimization_opportunity: usize,
	pub content_gap: usize,
	pub intent_drift: usize,
	pub out_of_scope: usize,
}
impl CategoryCounts {
	fn record(&mut self, category: VariantCategory) {
		match category {
			VariantCategory::OptimizationOpportunity => self.optimization_opportunity += 1,
			VariantCategory::ContentGap => self.content_gap += 1,
			VariantCategory::IntentDrift => self.intent_drift += 1,
			VariantCategory::OutOfScope => self.out_of_scope += 1,
		}
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorizationSummary {
	pub total: usize,
	pub counts: CategoryCounts,
	pub average_content_similarity: f32,
	pub average_passage_score: f32,
	pub average_drift_score: f32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorizationReport {
	pub variants: Vec<CategorizedVariant>,
	pub summary: CategorizationSummary,
}

/// Checks run in order: drift, scope, an existing chunk worth optimizing, otherwise a gap.
pub fn categorize(variant: QueryVariant, chunks: &[Chunk]) -> CategorizedVariant {
	let QueryVariant {
		query,
		content_similarity,
		passage_score,
		best_chunk_index,
		intent,
		entity_overlap,
	} = variant;
	let best_chunk = best_chunk_index.and_then(|index| chunks.get(index));
	let (category, reasoning, action) = if intent.drift_score > DRIFT_THRESHOLD {
		(
			VariantCategory::IntentDrift,
			format!(
				"Drift score {:.0} exceeds {DRIFT_THRESHOLD:.0}. {}",
				intent.drift_score, intent.explanation
			),
			RecommendedAction::ReportDrift {
				primary_intent: intent.primary_intent,
				variant_intent: intent.variant_intent,
				drift_score: intent.drift_score,
			},
		)
	} else if content_similarity < OUT_OF_SCOPE_SIMILARITY {
		(
			VariantCategory::OutOfScope,
			format!(
				"Content similarity {content_similarity:.2} is below \
				 {OUT_OF_SCOPE_SIMILARITY:.2}; the document does not cover this query."
			),
			RecommendedAction::Delete { content_similarity },
		)
	} else if let Some(chunk) = best_chunk.filter(|_| passage_score >= MIN_PASSAGE_SCORE) {
		(
			VariantCategory::OptimizationOpportunity,
			format!(
				"Chunk {} already scores {passage_score} for this query and can be optimized for it.",
				chunk.index
			),
			RecommendedAction::AssignToChunk {
				chunk_index: chunk.index,
				heading: chunk.heading().map(str::to_string),
				current_score: passage_score,
			},
		)
	} else {
		(
			VariantCategory::ContentGap,
			format!(
				"The topic is in scope but no chunk scores at least {MIN_PASSAGE_SCORE}; \
				 {} of {} entities are missing.",
				entity_overlap.missing.len(),
				entity_overlap.entities.len()
			),
			RecommendedAction::GenerateContentBrief {
				missing_entities: entity_overlap.missing.clone(),
				min_words: BRIEF_MIN_WORDS,
				max_words: BRIEF_MAX_WORDS,
			},
		)
	};

	CategorizedVariant {
		query,
		content_similarity,
		passage_score,
		tier: ScoreTier::from_score(passage_score as f32),
		best_chunk_index,
		intent,
		entity_overlap,
		category,
		reasoning,
		action,
	}
}

pub fn categorize_all(variants: Vec<QueryVariant>, chunks: &[Chunk]) -> CategorizationReport {
	let variants: Vec<CategorizedVariant> =
		variants.into_iter().map(|variant| categorize(variant, chunks)).collect();
	let mut counts = CategoryCounts::default();

	for variant in &variants {
		counts.record(variant.category);
	}

	let total = variants.len();
	let summary = if total == 0 {
		CategorizationSummary::default()
	} else {
		let n = total as f32;

		CategorizationSummary {
			total,
			counts,
			average_content_similarity: variants.iter().map(|v| v.content_similarity).sum::<f32>()
				/ n,
			average_passage_score: variants.iter().map(|v| v.passage_score as f32).sum::<f32>()
				/ n,
			average_drift_score: variants.iter().map(|v| v.intent.drift_score).sum::<f32>() / n,
		}
	};

	CategorizationReport { variants, summary }
}
