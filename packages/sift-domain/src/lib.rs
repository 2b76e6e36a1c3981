pub mod assignment;
pub mod categorize;
pub mod entities;
pub mod intent;
pub mod metrics;
pub mod passage;
pub mod position;
pub mod text;
pub mod tier;

pub use assignment::{
	AssignmentError, ChunkScores, QueryAssignment, QueryAssignmentMap, Reassignment,
	compute_query_assignments, reassign_query,
};
pub use categorize::{
	CategorizationReport, CategorizationSummary, CategorizedVariant, CategoryCounts, QueryVariant,
	RecommendedAction, VariantCategory, categorize, categorize_all,
};
pub use entities::{EntityOverlap, entity_overlap, extract_entities};
pub use intent::{IntentAnalysis, SearchIntent, analyze_intent, classify_intent};
pub use metrics::SimilarityScores;
pub use passage::{PassageComponents, PassageScoreResult, SemanticSimilarity, passage_score};
pub use position::{AttentionLevel, ChunkPosition, ContextBand, PositionAnalysis, ScoreMismatch};
pub use tier::ScoreTier;
