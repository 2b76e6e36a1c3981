use serde::{Deserialize, Serialize};

use crate::text;

/// Similarity loss contributes up to this much drift.
pub const SIMILARITY_DRIFT_WEIGHT: f32 = 60.0;
/// Added when the variant's intent differs from the primary query's.
pub const INTENT_CHANGE_PENALTY: f32 = 40.0;

const TRANSACTIONAL_CUES: &[&str] = &[
	"buy", "order", "purchase", "checkout", "price", "pricing", "cost", "cheap", "discount",
	"coupon", "deal", "deals", "download", "subscribe", "sign up", "free trial", "hire",
	"near me", "for sale", "shipping",
];
const COMMERCIAL_CUES: &[&str] = &[
	"best", "top", "review", "reviews", "vs", "versus", "compare", "comparison", "alternative",
	"alternatives", "recommended", "ranking", "rated", "pros and cons",
];
const NAVIGATIONAL_CUES: &[&str] = &[
	"login", "log in", "sign in", "official", "website", "homepage", "home page", "contact",
	"account", "dashboard", "portal", "app",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchIntent {
	Informational,
	Navigational,
	Commercial,
	Transactional,
}
impl SearchIntent {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Informational => "informational",
			Self::Navigational => "navigational",
			Self::Commercial => "commercial",
			Self::Transactional => "transactional",
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntentAnalysis {
	pub primary_intent: SearchIntent,
	pub variant_intent: SearchIntent,
	pub semantic_similarity: f32,
	pub drift_score: f32,
	pub explanation: String,
}

/// Classifies by cue words. Transactional cues win over commercial ones, commercial over
/// navigational; a query without cues is informational.
pub fn classify_intent(query: &str) -> SearchIntent {
	let normalized = text::normalize(query);

	if text::count_phrases(&normalized, TRANSACTIONAL_CUES) > 0 {
		SearchIntent::Transactional
	} else if text::count_phrases(&normalized, COMMERCIAL_CUES) > 0 {
		SearchIntent::Commercial
	} else if text::count_phrases(&normalized, NAVIGATIONAL_CUES) > 0 {
		SearchIntent::Navigational
	} else {
		SearchIntent::Informational
	}
}

/// `semantic_similarity` is the cosine between the two query embeddings.
pub fn analyze_intent(primary: &str, variant: &str, semantic_similarity: f32) -> IntentAnalysis {
	let primary_intent = classify_intent(primary);
	let variant_intent = classify_intent(variant);
	let drift_score = drift_score(semantic_similarity, primary_intent != variant_intent);
	let explanation = if primary_intent == variant_intent {
		format!(
			"Both queries are {}; drift comes from a semantic similarity of {:.2}.",
			variant_intent.as_str(),
			semantic_similarity,
		)
	} else {
		format!(
			"The variant shifts from {} to {} intent at a semantic similarity of {:.2}.",
			primary_intent.as_str(),
			variant_intent.as_str(),
			semantic_similarity,
		)
	};

	IntentAnalysis {
		primary_intent,
		variant_intent,
		semantic_similarity,
		drift_score,
		explanation,
	}
}

pub fn drift_score(semantic_similarity: f32, intent_changed: bool) -> f32 {
	let similarity =
		if semantic_similarity.is_nan() { 0.0 } else { semantic_similarity.clamp(0.0, 1.0) };
	let mut drift = (1.0 - similarity) * SIMILARITY_DRIFT_WEIGHT;

	if intent_changed {
		drift += INTENT_CHANGE_PENALTY;
	}

	drift.clamp(0.0, 100.0)
}
