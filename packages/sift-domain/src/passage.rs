//! Composite passage score: how likely a chunk is to be retrieved, kept by a reranker and
//! quoted by the model for a given query.

use std::{collections::HashSet, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{text, tier::ScoreTier};
use sift_chunking::Chunk;

pub const SEMANTIC_WEIGHT: f32 = 0.70;
pub const LEXICAL_WEIGHT: f32 = 0.30;

pub const RETRIEVAL_WEIGHT: f32 = 0.40;
pub const RERANK_WEIGHT: f32 = 0.35;
pub const CITATION_WEIGHT: f32 = 0.25;

const LEAD_WINDOW_CHARS: usize = 100;
const SHORT_PARAGRAPH_WORDS: f32 = 80.0;
const AUTHORITY_BASELINE: f32 = 100.0;

const ANAPHORA: &[&str] = &[
	"this", "that", "these", "those", "it", "its", "they", "them", "their", "he", "she", "his",
	"her", "such", "also", "however", "furthermore", "moreover", "additionally", "therefore",
	"thus", "hence", "another", "and", "but", "so",
];
const HEDGE_WORDS: &[&str] = &[
	"might", "maybe", "perhaps", "possibly", "probably", "somewhat", "apparently", "arguably",
	"seemingly", "generally", "often", "sometimes", "likely", "could",
];
const UNCERTAINTY_PHRASES: &[&str] = &[
	"not sure", "unclear", "uncertain", "unknown", "it seems", "it appears", "some say",
	"some believe", "it is believed", "may or may not", "hard to say", "debatable",
];
const CITATION_PHRASES: &[&str] = &[
	"according to", "study", "studies", "research", "researchers", "survey", "report",
	"published", "data from", "source", "et al", "journal", "cited",
];
const EXAMPLE_MARKERS: &[&str] = &[
	"for example", "for instance", "e.g.", "such as", "example:", "case study", "consider",
	"imagine",
];

static DEFINITIONAL_OPENING: LazyLock<Option<Regex>> = LazyLock::new(|| {
	Regex::new(
		r"(?i)^[\w\s'’()-]{1,80}?\b(is|are|was|were|refers to|means|describes|consists of|represents|involves)\b",
	)
	.ok()
});
static HOW_TO_OPENING: LazyLock<Option<Regex>> = LazyLock::new(|| {
	Regex::new(r"(?i)^(to\s+\w+|you\s+(can|should|need)|first,?\s|start\s+by|step\s*\d|use\s)").ok()
});
static FACTUAL_VERB: LazyLock<Option<Regex>> = LazyLock::new(|| {
	Regex::new(
		r"(?i)\b(is|are|was|were|has|have|contains|includes|measures|equals|costs|weighs|lasts|requires|produces)\b",
	)
	.ok()
});
static NUMBER: LazyLock<Option<Regex>> =
	LazyLock::new(|| Regex::new(r"\d+(?:[.,]\d+)*%?").ok());
static BRACKET_CITATION: LazyLock<Option<Regex>> =
	LazyLock::new(|| Regex::new(r"\[\d+\]").ok());

/// Semantic similarity with its scale made explicit, so the conversion to 0-100 never has to
/// guess.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scale", content = "value", rename_all = "snake_case")]
pub enum SemanticSimilarity {
	/// Cosine-style value; negatives count as zero.
	Unit(f32),
	/// Already on 0-100.
	Percent(f32),
}
impl SemanticSimilarity {
	pub fn as_percent(self) -> f32 {
		match self {
			Self::Unit(value) => bounded(value, 1.0) * 100.0,
			Self::Percent(value) => bounded(value, 100.0),
		}
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PassageComponents {
	pub entity_prominence: f32,
	pub direct_answer_score: f32,
	pub structural_clarity: f32,
	pub query_restatement: f32,
	pub quotability: f32,
	pub specificity: f32,
	pub authority_signals: f32,
	pub sentence_structure: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PassageScoreResult {
	pub passage_score: u32,
	pub tier: ScoreTier,
	pub retrieval_score: f32,
	pub lexical_score: f32,
	pub rerank_score: f32,
	pub citation_score: f32,
	pub components: PassageComponents,
}
impl PassageScoreResult {
	pub fn minimum() -> Self {
		Self {
			passage_score: 0,
			tier: ScoreTier::Poor,
			retrieval_score: 0.0,
			lexical_score: 0.0,
			rerank_score: 0.0,
			citation_score: 0.0,
			components: PassageComponents::default(),
		}
	}
}

/// Scores `query` against the chunk body. Blank bodies or queries score the minimum.
pub fn passage_score(
	chunk: &Chunk,
	query: &str,
	semantic: SemanticSimilarity,
) -> PassageScoreResult {
	let body = chunk.text_without_cascade.trim();

	if body.is_empty() || text::tokenize(query).is_empty() {
		return PassageScoreResult::minimum();
	}

	let query_terms = text::content_terms(query);
	let lexical = lexical_score(chunk, query);
	let retrieval = retrieval_score(semantic, lexical);
	let components = PassageComponents {
		entity_prominence: entity_prominence(body, &query_terms),
		direct_answer_score: direct_answer_score(body),
		structural_clarity: structural_clarity(chunk),
		query_restatement: query_restatement(body, &query_terms),
		quotability: quotability(body),
		specificity: specificity(body),
		authority_signals: authority_signals(body),
		sentence_structure: sentence_structure(body),
	};
	let rerank = rerank_score(&components);
	let citation = citation_score(&components);
	let composite =
		retrieval * RETRIEVAL_WEIGHT + rerank * RERANK_WEIGHT + citation * CITATION_WEIGHT;
	let passage_score = bounded(composite, 100.0).round() as u32;

	PassageScoreResult {
		passage_score,
		tier: ScoreTier::from_score(passage_score as f32),
		retrieval_score: retrieval,
		lexical_score: lexical,
		rerank_score: rerank,
		citation_score: citation,
		components,
	}
}

/// Term coverage (40), exact phrase (25), heading-path terms (20) and terms in the opening
/// characters of the body (15).
pub fn lexical_score(chunk: &Chunk, query: &str) -> f32 {
	let query_terms = text::content_terms(query);

	if query_terms.is_empty() {
		return 0.0;
	}

	let body = chunk.text_without_cascade.as_str();
	let normalized_body = text::normalize(body);
	let body_terms: HashSet<String> =
		normalized_body.split_whitespace().map(str::to_string).collect();
	let heading_terms = text::term_set(&chunk.heading_path.join(" "));
	let lead: String = body.chars().take(LEAD_WINDOW_CHARS).collect();
	let lead_terms = text::term_set(&lead);
	let mut score = text::term_fraction(&query_terms, &body_terms) * 40.0;

	if text::contains_phrase(&normalized_body, query) {
		score += 25.0;
	}

	score += text::term_fraction(&query_terms, &heading_terms) * 20.0;
	score += text::term_fraction(&query_terms, &lead_terms) * 15.0;

	bounded(score, 100.0)
}

pub fn retrieval_score(semantic: SemanticSimilarity, lexical: f32) -> f32 {
	semantic.as_percent() * SEMANTIC_WEIGHT + bounded(lexical, 100.0) * LEXICAL_WEIGHT
}

pub fn rerank_score(components: &PassageComponents) -> f32 {
	components.entity_prominence * 0.35
		+ components.direct_answer_score * 0.30
		+ components.structural_clarity * 0.20
		+ components.query_restatement * 0.15
}

pub fn citation_score(components: &PassageComponents) -> f32 {
	components.quotability * 0.30
		+ components.specificity * 0.25
		+ components.authority_signals * 0.25
		+ components.sentence_structure * 0.20
}

fn entity_prominence(body: &str, query_terms: &[String]) -> f32 {
	let sentences = text::sentences(body);
	let Some(first) = sentences.first() else { return 0.0 };

	text::term_fraction(query_terms, &text::term_set(first)) * 100.0
}

fn direct_answer_score(body: &str) -> f32 {
	let sentences = text::sentences(body);
	let Some(first) = sentences.first() else { return 0.0 };
	let first = first.trim_start_matches(['-', '*', '+', ' ']);

	if first.ends_with('?') {
		10.0
	} else if matches_pattern(&DEFINITIONAL_OPENING, first) {
		100.0
	} else if matches_pattern(&HOW_TO_OPENING, first) {
		70.0
	} else if first.ends_with(['.', '!']) {
		50.0
	} else {
		30.0
	}
}

fn structural_clarity(chunk: &Chunk) -> f32 {
	let body = chunk.text_without_cascade.as_str();
	let mut score = 0.0;

	if body.lines().any(text::is_list_line) {
		score += 50.0;
	}
	if !chunk.heading_path.is_empty() || body.lines().any(text::is_heading_line) {
		score += 30.0;
	}

	let paragraphs: Vec<&str> =
		body.split("\n\n").filter(|paragraph| !paragraph.trim().is_empty()).collect();

	if !paragraphs.is_empty() {
		let words: usize = paragraphs.iter().map(|paragraph| text::word_count(paragraph)).sum();

		if words as f32 / paragraphs.len() as f32 <= SHORT_PARAGRAPH_WORDS {
			score += 20.0;
		}
	}

	score
}

fn query_restatement(body: &str, query_terms: &[String]) -> f32 {
	text::term_fraction(query_terms, &text::term_set(body)) * 100.0
}

/// Standalone sentences (50), factual language (30), absence of hedging (20).
fn quotability(body: &str) -> f32 {
	let sentences = text::sentences(body);

	if sentences.is_empty() {
		return 0.0;
	}

	let total = sentences.len() as f32;
	let standalone = sentences
		.iter()
		.filter(|sentence| {
			text::tokenize(sentence)
				.first()
				.map(|first| !ANAPHORA.contains(&first.as_str()))
				.unwrap_or(false)
		})
		.count() as f32;
	let factual = sentences
		.iter()
		.filter(|sentence| {
			sentence.chars().any(|ch| ch.is_ascii_digit()) || matches_pattern(&FACTUAL_VERB, sentence)
		})
		.count() as f32;
	let hedges = text::count_phrases(&text::normalize(body), HEDGE_WORDS) as f32;
	let hedge_density = (hedges / total).min(1.0);

	(standalone / total) * 50.0 + (factual / total) * 30.0 + (1.0 - hedge_density) * 20.0
}

/// Numbers (40), worked examples (35), long technical words (25).
fn specificity(body: &str) -> f32 {
	let numbers = count_matches(&NUMBER, body) as f32;
	let lowered = body.to_lowercase();
	let normalized = text::normalize(body);
	let has_example = EXAMPLE_MARKERS.iter().any(|marker| {
		if marker.chars().all(|ch| ch.is_alphanumeric() || ch == ' ') {
			text::contains_phrase(&normalized, marker)
		} else {
			lowered.contains(marker)
		}
	});
	let words: Vec<&str> = normalized.split_whitespace().collect();
	let long_density = if words.is_empty() {
		0.0
	} else {
		let long = words
			.iter()
			.filter(|word| word.chars().count() >= 9 && word.chars().all(char::is_alphabetic))
			.count();

		long as f32 / words.len() as f32
	};
	let example_score = if has_example { 100.0 } else { 0.0 };

	(numbers / 3.0).min(1.0) * 100.0 * 0.40
		+ example_score * 0.35
		+ (long_density / 0.15).min(1.0) * 100.0 * 0.25
}

/// Citation phrases (40), a constant technical-accuracy baseline (35), absence of
/// uncertainty (25).
fn authority_signals(body: &str) -> f32 {
	let normalized = text::normalize(body);
	let citations = (text::count_phrases(&normalized, CITATION_PHRASES)
		+ count_matches(&BRACKET_CITATION, body)) as f32;
	let uncertainty = text::count_phrases(&normalized, UNCERTAINTY_PHRASES) as f32;

	(citations / 2.0).min(1.0) * 100.0 * 0.40
		+ AUTHORITY_BASELINE * 0.35
		+ (1.0 - (uncertainty / 3.0).min(1.0)) * 100.0 * 0.25
}

fn sentence_structure(body: &str) -> f32 {
	let sentences = text::sentences(body);

	if sentences.is_empty() {
		return 0.0;
	}

	let total: f32 =
		sentences.iter().map(|sentence| sentence_length_score(text::word_count(sentence))).sum();

	total / sentences.len() as f32
}

fn sentence_length_score(words: usize) -> f32 {
	match words {
		15..=25 => 100.0,
		10..=14 | 26..=30 => 70.0,
		5..=9 | 31..=40 => 40.0,
		_ => 20.0,
	}
}

fn matches_pattern(pattern: &LazyLock<Option<Regex>>, haystack: &str) -> bool {
	pattern.as_ref().map(|re| re.is_match(haystack)).unwrap_or(false)
}

fn count_matches(pattern: &LazyLock<Option<Regex>>, haystack: &str) -> usize {
	pattern.as_ref().map(|re| re.find_iter(haystack).count()).unwrap_or(0)
}

fn bounded(value: f32, max: f32) -> f32 {
	if value.is_nan() { 0.0 } else { value.clamp(0.0, max) }
}
