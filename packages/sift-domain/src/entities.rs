use serde::{Deserialize, Serialize};

use crate::text;

const MIN_TERM_CHARS: usize = 3;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityOverlap {
	pub entities: Vec<String>,
	pub matched: Vec<String>,
	pub missing: Vec<String>,
	/// Zero when the query yields no entities.
	pub overlap_ratio: f32,
}

/// Quoted phrases first, then content terms of at least three characters from the rest of
/// the query. Everything is normalized and deduplicated.
pub fn extract_entities(query: &str) -> Vec<String> {
	let mut entities: Vec<String> = Vec::new();
	let mut remainder = String::with_capacity(query.len());
	let mut quoted = String::new();
	let mut in_quote = false;

	for ch in query.chars() {
		match ch {
			'"' | '“' | '”' => {
				if in_quote {
					push_unique(&mut entities, normalize_phrase(&quoted));
					quoted.clear();
				}

				in_quote = !in_quote;
				remainder.push(' ');
			},
			_ if in_quote => quoted.push(ch),
			_ => remainder.push(ch),
		}
	}

	// An unmatched quote counts as ordinary text.
	remainder.push_str(&quoted);

	for term in text::content_terms(&remainder) {
		if term.chars().count() >= MIN_TERM_CHARS {
			push_unique(&mut entities, term);
		}
	}

	entities
}

pub fn entity_overlap(query: &str, haystack: &str) -> EntityOverlap {
	let entities = extract_entities(query);
	let normalized = text::normalize(haystack);
	let (matched, missing): (Vec<String>, Vec<String>) =
		entities.iter().cloned().partition(|entity| text::contains_phrase(&normalized, entity));
	let overlap_ratio =
		if entities.is_empty() { 0.0 } else { matched.len() as f32 / entities.len() as f32 };

	EntityOverlap { entities, matched, missing, overlap_ratio }
}

fn normalize_phrase(phrase: &str) -> String {
	text::normalize(phrase).split_whitespace().collect::<Vec<_>>().join(" ")
}

fn push_unique(entities: &mut Vec<String>, entity: String) {
	if !entity.is_empty() && !entities.contains(&entity) {
		entities.push(entity);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn quoted_phrases_stay_whole() {
		assert_eq!(extract_entities("how to season a \"Carbon Steel\" wok at home"), vec![
			"carbon steel".to_string(),
			"season".to_string(),
			"wok".to_string(),
			"home".to_string(),
		]);
	}

	#[test]
	fn unmatched_quote_is_plain_text() {
		assert_eq!(extract_entities("cast \"iron skillet"), vec![
			"cast".to_string(),
			"iron".to_string(),
			"skillet".to_string(),
		]);
	}

	#[test]
	fn overlap_splits_matched_and_missing() {
		let overlap = entity_overlap("\"carbon steel\" wok seasoning", "A carbon steel wok needs oil.");

		assert_eq!(overlap.matched, vec!["carbon steel".to_string(), "wok".to_string()]);
		assert_eq!(overlap.missing, vec!["seasoning".to_string()]);
		assert!((overlap.overlap_ratio - 2.0 / 3.0).abs() < 1e-6);
	}

	#[test]
	fn no_entities_means_zero_ratio() {
		let overlap = entity_overlap("is it a", "anything");

		assert!(overlap.entities.is_empty());
		assert_eq!(overlap.overlap_ratio, 0.0);
	}
}
