use sift_chunking::{
	Chunk, ChunkStrategy, ChunkingConfig, HeuristicCounter, TokenCounter, chunk_document,
};

const GUIDE: &str = "# Guide

Intro paragraph about widgets.

## Setup

Install the widget. Then configure it.

Restart the service afterwards.

## Usage

Use it daily.
";

fn cfg(strategy: ChunkStrategy, max_tokens: u32, overlap_tokens: u32) -> ChunkingConfig {
	ChunkingConfig { strategy, max_tokens, overlap_tokens, cascade_headings: true }
}

fn bodies(chunks: &[Chunk]) -> Vec<&str> {
	chunks.iter().map(|chunk| chunk.text_without_cascade.as_str()).collect()
}

#[test]
fn empty_document_yields_no_chunks() {
	for strategy in [ChunkStrategy::Paragraph, ChunkStrategy::Semantic, ChunkStrategy::Fixed] {
		assert!(chunk_document("", &cfg(strategy, 64, 8), &HeuristicCounter).is_empty());
		assert!(chunk_document("  \n\n# Only a heading\n", &cfg(strategy, 64, 8), &HeuristicCounter)
			.is_empty());
	}
}

#[test]
fn semantic_breaks_at_headings_and_packs_paragraphs() {
	let chunks = chunk_document(GUIDE, &cfg(ChunkStrategy::Semantic, 256, 16), &HeuristicCounter);

	assert_eq!(
		bodies(&chunks),
		vec![
			"Intro paragraph about widgets.",
			"Install the widget. Then configure it.\n\nRestart the service afterwards.",
			"Use it daily.",
		]
	);
	assert_eq!(chunks[1].heading_path, vec!["Guide".to_string(), "Setup".to_string()]);
	assert_eq!(chunks[1].heading_levels, vec![1, 2]);
	assert_eq!((chunks[1].source_line_range.start, chunks[1].source_line_range.end), (7, 9));
	assert_eq!(chunks[2].heading(), Some("Usage"));
	assert_eq!(chunks.iter().map(|chunk| chunk.index).collect::<Vec<_>>(), vec![0, 1, 2]);
}

#[test]
fn cascade_prefixes_heading_markers() {
	let chunks = chunk_document(GUIDE, &cfg(ChunkStrategy::Semantic, 256, 16), &HeuristicCounter);
	let setup = &chunks[1];

	assert!(setup.has_cascade);
	assert_eq!(setup.text, format!("# Guide\n## Setup\n\n{}", setup.text_without_cascade));
	assert_eq!(setup.token_estimate, HeuristicCounter.count(&setup.text));
	assert_eq!(setup.word_count, 10);
	assert_eq!(setup.char_count, setup.text_without_cascade.chars().count());
}

#[test]
fn cascade_disabled_keeps_body_only() {
	let mut options = cfg(ChunkStrategy::Semantic, 256, 16);

	options.cascade_headings = false;

	for chunk in chunk_document(GUIDE, &options, &HeuristicCounter) {
		assert!(!chunk.has_cascade);
		assert_eq!(chunk.text, chunk.text_without_cascade);
		assert!(!chunk.heading_path.is_empty());
	}
}

#[test]
fn text_before_first_heading_has_no_cascade() {
	let chunks = chunk_document(
		"Preamble text.\n\n# Later\n\nBody.",
		&cfg(ChunkStrategy::Semantic, 256, 16),
		&HeuristicCounter,
	);

	assert_eq!(chunks.len(), 2);
	assert!(!chunks[0].has_cascade);
	assert_eq!(chunks[0].text, "Preamble text.");
	assert!(chunks[1].has_cascade);
}

#[test]
fn paragraph_strategy_keeps_paragraphs_apart() {
	let chunks = chunk_document(GUIDE, &cfg(ChunkStrategy::Paragraph, 256, 16), &HeuristicCounter);

	assert_eq!(
		bodies(&chunks),
		vec![
			"Intro paragraph about widgets.",
			"Install the widget. Then configure it.",
			"Restart the service afterwards.",
			"Use it daily.",
		]
	);
	assert_eq!(chunks[2].heading(), Some("Setup"));
}

#[test]
fn semantic_starts_new_chunk_when_budget_is_exceeded() {
	// "Install the widget. Then configure it." is 38 chars; together with the next paragraph
	// the section needs 18 heuristic tokens.
	let chunks = chunk_document(GUIDE, &cfg(ChunkStrategy::Semantic, 12, 2), &HeuristicCounter);

	assert_eq!(
		bodies(&chunks),
		vec![
			"Intro paragraph about widgets.",
			"Install the widget. Then configure it.",
			"Restart the service afterwards.",
			"Use it daily.",
		]
	);
}

#[test]
fn oversized_paragraph_respects_budget_with_overlap() {
	let paragraph = (1..=40).map(|n| format!("Sentence number {n} is here.")).collect::<Vec<_>>();
	let document = format!("# Long\n\n{}", paragraph.join(" "));
	let options = cfg(ChunkStrategy::Semantic, 40, 8);
	let chunks = chunk_document(&document, &options, &HeuristicCounter);

	assert!(chunks.len() > 1);

	for chunk in &chunks {
		assert!(HeuristicCounter.count(&chunk.text_without_cascade) <= 40);
		assert_eq!(chunk.heading_path, vec!["Long".to_string()]);
		assert_eq!(chunk.source_line_range.start, 3);
	}
	for pair in chunks.windows(2) {
		let previous = &pair[0].text_without_cascade;
		let next = &pair[1].text_without_cascade;
		let first_word = next.split_whitespace().next().expect("chunk has words");

		assert!(previous.contains(first_word), "{next:?} does not overlap {previous:?}");
	}
}

#[test]
fn oversized_sentence_carries_its_tail_into_the_next_piece() {
	let words = (0..30).map(|n| format!("w{n:02}")).collect::<Vec<_>>().join(" ");
	let document = format!("# Long\n\n{words}. Short tail sentence here.");
	let options = cfg(ChunkStrategy::Paragraph, 20, 6);
	let chunks = chunk_document(&document, &options, &HeuristicCounter);

	assert_eq!(bodies(&chunks), vec![
		"w00 w01 w02 w03 w04 w05 w06 w07 w08 w09 w10 w11 w12 w13 w14 w15 w16 w17 w18 w19",
		"w14 w15 w16 w17 w18 w19 w20 w21 w22 w23 w24 w25 w26 w27 w28 w29.",
		"w24 w25 w26 w27 w28 w29. Short tail sentence here.",
	]);
}

#[test]
fn fixed_windows_overlap_and_track_headings() {
	let options = cfg(ChunkStrategy::Fixed, 6, 2);
	let chunks = chunk_document(GUIDE, &options, &HeuristicCounter);

	assert!(chunks.len() > 3);
	assert_eq!(chunks[0].heading_path, vec!["Guide".to_string()]);
	assert_eq!(chunks.last().and_then(Chunk::heading), Some("Usage"));

	for chunk in &chunks {
		let single_word = chunk.text_without_cascade.split_whitespace().count() == 1;

		assert!(HeuristicCounter.count(&chunk.text_without_cascade) <= 6 || single_word);
	}
	for pair in chunks.windows(2) {
		assert!(pair[1].source_line_range.start >= pair[0].source_line_range.start);
	}
}

#[test]
fn rechunking_is_deterministic() {
	for strategy in [ChunkStrategy::Paragraph, ChunkStrategy::Semantic, ChunkStrategy::Fixed] {
		let options = cfg(strategy, 10, 3);
		let first = chunk_document(GUIDE, &options, &HeuristicCounter);
		let second = chunk_document(GUIDE, &options, &HeuristicCounter);

		assert_eq!(first, second);
		assert_eq!(
			serde_json::to_string(&first).expect("serialize"),
			serde_json::to_string(&second).expect("serialize")
		);
	}
}

#[test]
fn chunk_ids_are_unique_and_stable() {
	let chunks = chunk_document(GUIDE, &cfg(ChunkStrategy::Paragraph, 256, 16), &HeuristicCounter);
	let mut ids: Vec<&str> = chunks.iter().map(|chunk| chunk.id.as_str()).collect();

	assert!(ids[0].starts_with("chunk-0-"));

	ids.sort_unstable();
	ids.dedup();

	assert_eq!(ids.len(), chunks.len());
}

#[test]
fn with_body_keeps_headings_and_position() {
	let chunks = chunk_document(GUIDE, &cfg(ChunkStrategy::Semantic, 256, 16), &HeuristicCounter);
	let rewritten = chunks[1].with_body("  Setup is quick.  ", true, &HeuristicCounter);

	assert_eq!(rewritten.index, 1);
	assert_eq!(rewritten.heading_path, chunks[1].heading_path);
	assert_eq!(rewritten.text_without_cascade, "Setup is quick.");
	assert_eq!(rewritten.text, "# Guide\n## Setup\n\nSetup is quick.");
	assert_ne!(rewritten.id, chunks[1].id);
}

#[test]
fn strategy_parses_from_config_strings() {
	assert_eq!("Semantic".parse::<ChunkStrategy>(), Ok(ChunkStrategy::Semantic));
	assert_eq!("fixed".parse::<ChunkStrategy>(), Ok(ChunkStrategy::Fixed));
	assert!("sliding".parse::<ChunkStrategy>().is_err());
}
