use std::collections::HashSet;

use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

pub const STOP_WORDS: &[&str] = &[
	"a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
	"as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
	"by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for",
	"from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "him", "his",
	"how", "i", "if", "in", "into", "is", "it", "its", "itself", "just", "me", "more", "most",
	"my", "no", "nor", "not", "now", "of", "off", "on", "once", "only", "or", "other", "our",
	"ours", "out", "over", "own", "same", "she", "should", "so", "some", "such", "than", "that",
	"the", "their", "them", "then", "there", "these", "they", "this", "those", "through", "to",
	"too", "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
	"while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours",
];

pub fn is_stop_word(token: &str) -> bool {
	STOP_WORDS.contains(&token)
}

/// NFKC, lowercase, every non-alphanumeric character replaced by a space.
pub fn normalize(text: &str) -> String {
	let mut out = String::with_capacity(text.len());

	for ch in text.nfkc() {
		if ch.is_alphanumeric() {
			out.extend(ch.to_lowercase());
		} else {
			out.push(' ');
		}
	}

	out
}

/// Normalized tokens in order. Single characters are dropped unless they are digits.
pub fn tokenize(text: &str) -> Vec<String> {
	normalize(text)
		.split_whitespace()
		.filter(|token| token.chars().count() >= 2 || token.chars().all(|ch| ch.is_ascii_digit()))
		.map(str::to_string)
		.collect()
}

/// Unique non-stop-word tokens, first occurrence order.
pub fn content_terms(text: &str) -> Vec<String> {
	let mut seen = HashSet::new();
	let mut out = Vec::new();

	for token in tokenize(text) {
		if is_stop_word(&token) {
			continue;
		}
		if seen.insert(token.clone()) {
			out.push(token);
		}
	}

	out
}

pub fn term_set(text: &str) -> HashSet<String> {
	tokenize(text).into_iter().collect()
}

/// Fraction of `terms` present in `haystack`; zero when there are no terms.
pub fn term_fraction(terms: &[String], haystack: &HashSet<String>) -> f32 {
	if terms.is_empty() {
		return 0.0;
	}

	let matched = terms.iter().filter(|term| haystack.contains(term.as_str())).count();

	matched as f32 / terms.len() as f32
}

/// Whole-phrase containment on normalized text.
pub fn contains_phrase(normalized_haystack: &str, phrase: &str) -> bool {
	let needle = padded(&normalize(phrase));

	if needle.trim().is_empty() {
		return false;
	}

	padded(normalized_haystack).contains(&needle)
}

/// Counts phrase occurrences on word boundaries.
pub fn count_phrases(normalized_haystack: &str, phrases: &[&str]) -> usize {
	let haystack = padded(normalized_haystack);

	phrases
		.iter()
		.map(|phrase| {
			let needle = padded(&normalize(phrase));

			if needle.trim().is_empty() { 0 } else { haystack.matches(needle.as_str()).count() }
		})
		.sum()
}

fn padded(normalized: &str) -> String {
	format!(" {} ", normalized.split_whitespace().collect::<Vec<_>>().join(" "))
}

pub fn is_list_line(line: &str) -> bool {
	let trimmed = line.trim_start();

	if trimmed.starts_with("- ") || trimmed.starts_with("* ") || trimmed.starts_with("+ ") {
		return true;
	}

	let digits = trimmed.chars().take_while(|ch| ch.is_ascii_digit()).count();

	digits > 0 && (trimmed[digits..].starts_with(". ") || trimmed[digits..].starts_with(") "))
}

pub fn is_heading_line(line: &str) -> bool {
	let trimmed = line.trim_start();
	let level = trimmed.chars().take_while(|ch| *ch == '#').count();

	(1..=6).contains(&level) && trimmed[level..].starts_with(' ')
}

/// Sentences of `text`. List items and heading lines are sentences of their own; wrapped
/// paragraph lines are joined before segmentation.
pub fn sentences(text: &str) -> Vec<String> {
	let mut units: Vec<String> = Vec::new();

	for paragraph in text.split("\n\n") {
		let mut pending: Vec<&str> = Vec::new();

		for line in paragraph.lines().map(str::trim).filter(|line| !line.is_empty()) {
			if is_list_line(line) || is_heading_line(line) {
				if !pending.is_empty() {
					units.push(pending.join(" "));
					pending.clear();
				}

				units.push(line.to_string());
			} else {
				pending.push(line);
			}
		}

		if !pending.is_empty() {
			units.push(pending.join(" "));
		}
	}

	units
		.iter()
		.flat_map(|unit| unit.split_sentence_bounds())
		.map(str::trim)
		.filter(|sentence| sentence.chars().any(char::is_alphanumeric))
		.map(str::to_string)
		.collect()
}

/// Query clauses split on punctuation and coordinating conjunctions. A query without
/// separators is its own single clause.
pub fn clauses(query: &str) -> Vec<String> {
	let mut out = Vec::new();

	for part in query.split([',', ';', ':', '?', '!']) {
		let mut current: Vec<&str> = Vec::new();

		for word in part.split_whitespace() {
			if matches!(word.to_lowercase().as_str(), "and" | "or" | "versus" | "vs") {
				if !current.is_empty() {
					out.push(current.join(" "));
					current.clear();
				}

				continue;
			}

			current.push(word);
		}

		if !current.is_empty() {
			out.push(current.join(" "));
		}
	}

	if out.is_empty() && !query.trim().is_empty() {
		out.push(query.trim().to_string());
	}

	out
}

pub fn word_count(sentence: &str) -> usize {
	sentence.split_whitespace().filter(|word| word.chars().any(char::is_alphanumeric)).count()
}
