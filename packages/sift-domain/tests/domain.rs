use sift_chunking::{Chunk, ChunkStrategy, ChunkingConfig, HeuristicCounter, chunk_document};
use sift_domain::{
	AttentionLevel, ContextBand, EntityOverlap, IntentAnalysis, QueryVariant, RecommendedAction,
	ScoreMismatch, ScoreTier, SearchIntent, SemanticSimilarity, SimilarityScores,
	VariantCategory, categorize, categorize_all, metrics,
	passage::{self, PassageComponents},
	passage_score, position,
};

const WOK_GUIDE: &str = "# Woks

## Seasoning

A carbon steel wok is a pan that needs seasoning before its first use. Heat the wok until \
it smokes, then wipe a thin layer of oil over the surface with a paper towel.

- Wash off the factory coating.
- Heat the wok for 10 minutes.
- Repeat the oil layer 3 times.

## Storage

Dry the wok completely and keep it in a dry cupboard.
";

fn chunks() -> Vec<Chunk> {
	let cfg = ChunkingConfig {
		strategy: ChunkStrategy::Semantic,
		max_tokens: 256,
		overlap_tokens: 16,
		cascade_headings: true,
	};

	chunk_document(WOK_GUIDE, &cfg, &HeuristicCounter)
}

const FILLER: &str = "Pans come in many shapes and sizes, and every kitchen ends up with a \
favourite one after some years of use.";

fn single_chunk(document: &str) -> Chunk {
	let cfg = ChunkingConfig {
		strategy: ChunkStrategy::Paragraph,
		max_tokens: 512,
		overlap_tokens: 0,
		cascade_headings: true,
	};
	let mut chunks = chunk_document(document, &cfg, &HeuristicCounter);

	assert_eq!(chunks.len(), 1);

	chunks.remove(0)
}

fn assert_close(actual: f32, expected: f32) {
	assert!((actual - expected).abs() < 1e-3, "{actual} != {expected}");
}

fn only(set: fn(&mut PassageComponents)) -> PassageComponents {
	let mut components = PassageComponents::default();

	set(&mut components);

	components
}

fn intent(drift_score: f32) -> IntentAnalysis {
	IntentAnalysis {
		primary_intent: SearchIntent::Informational,
		variant_intent: SearchIntent::Informational,
		semantic_similarity: 0.9,
		drift_score,
		explanation: "test".to_string(),
	}
}

fn variant(content_similarity: f32, passage_score: u32, drift_score: f32) -> QueryVariant {
	QueryVariant {
		query: "how to season a wok".to_string(),
		content_similarity,
		passage_score,
		best_chunk_index: Some(0),
		intent: intent(drift_score),
		entity_overlap: EntityOverlap {
			entities: vec!["season".to_string(), "wok".to_string(), "rust".to_string()],
			matched: vec!["season".to_string(), "wok".to_string()],
			missing: vec!["rust".to_string()],
			overlap_ratio: 2.0 / 3.0,
		},
	}
}

#[test]
fn cosine_is_reflexive_and_symmetric() {
	let a = [0.3, -1.2, 2.0, 0.5];
	let b = [1.0, 0.4, -0.7, 2.2];

	assert!((metrics::cosine(&a, &a) - 1.0).abs() < 1e-6);
	assert_eq!(metrics::cosine(&a, &b), metrics::cosine(&b, &a));
	assert_eq!(metrics::cosine(&a, &[0.0; 4]), 0.0);
	assert_eq!(metrics::cosine(&a, &b[..3]), 0.0);
}

#[test]
fn chamfer_is_symmetric_and_degenerates_to_cosine() {
	let lhs: Vec<Vec<f32>> = vec![vec![1.0, 0.0], vec![0.6, 0.8]];
	let rhs: Vec<Vec<f32>> = vec![vec![0.0, 1.0], vec![1.0, 1.0], vec![-1.0, 0.0]];

	assert!((metrics::chamfer(&lhs, &rhs) - metrics::chamfer(&rhs, &lhs)).abs() < 1e-6);

	let single_lhs: [Vec<f32>; 1] = [vec![1.0, 2.0]];
	let single_rhs: [Vec<f32>; 1] = [vec![2.0, 1.0]];

	assert!(
		(metrics::chamfer(&single_lhs, &single_rhs) - metrics::cosine(&[1.0, 2.0], &[2.0, 1.0]))
			.abs() < 1e-6
	);
	assert_eq!(metrics::chamfer::<Vec<f32>, Vec<f32>>(&[], &rhs), 0.0);
}

#[test]
fn similarity_scores_report_every_metric() {
	let scores = SimilarityScores::between(&[3.0, 4.0], &[0.0, 4.0]);

	assert!((scores.cosine - 0.8).abs() < 1e-6);
	assert!((scores.euclidean - 3.0).abs() < 1e-6);
	assert!((scores.manhattan - 3.0).abs() < 1e-6);
	assert!((scores.dot_product - 16.0).abs() < 1e-6);
	assert!((scores.chamfer - 0.8).abs() < 1e-6);
}

#[test]
fn passage_score_is_monotonic_in_semantic_similarity() {
	let chunks = chunks();
	let chunk = &chunks[0];
	let mut previous = 0;

	for step in 0..=20 {
		let similarity = step as f32 / 20.0;
		let semantic = SemanticSimilarity::Unit(similarity);
		let result = passage_score(chunk, "how to season a carbon steel wok", semantic);

		assert!(result.passage_score >= previous, "dropped at similarity {similarity}");
		assert!(result.passage_score <= 100);

		previous = result.passage_score;
	}
}

#[test]
fn unit_and_percent_scales_agree() {
	let chunks = chunks();
	let unit = passage_score(&chunks[0], "carbon steel wok", SemanticSimilarity::Unit(0.62));
	let percent = passage_score(&chunks[0], "carbon steel wok", SemanticSimilarity::Percent(62.0));

	assert_eq!(unit.passage_score, percent.passage_score);
	assert!((unit.retrieval_score - percent.retrieval_score).abs() < 1e-4);
	assert_eq!(unit.components, percent.components);
}

#[test]
fn relevant_chunk_outscores_unrelated_chunk() {
	let chunks = chunks();
	let query = "how to season a carbon steel wok";
	let seasoning = passage_score(&chunks[0], query, SemanticSimilarity::Unit(0.8));
	let storage = passage_score(&chunks[1], query, SemanticSimilarity::Unit(0.8));

	assert_eq!(chunks[0].heading(), Some("Seasoning"));
	assert!(seasoning.lexical_score > storage.lexical_score);
	assert!(seasoning.passage_score > storage.passage_score);
	assert_eq!(seasoning.components.direct_answer_score, 100.0);
	assert!(seasoning.components.structural_clarity >= 80.0);
}

#[test]
fn blank_inputs_score_the_minimum() {
	let chunks = chunks();
	let result = passage_score(&chunks[0], "   ", SemanticSimilarity::Unit(1.0));

	assert_eq!(result.passage_score, 0);
	assert_eq!(result.tier, ScoreTier::Poor);
	assert_eq!(result.retrieval_score, 0.0);
}

#[test]
fn lexical_score_adds_each_bonus() {
	let lead_phrase = single_chunk("Cast iron pans last for decades.");
	let late_terms = single_chunk(&format!("{FILLER} Good iron holds heat, and a cast one lasts."));
	let heading_only = single_chunk(&format!("# Cast Iron\n\n{FILLER}"));

	// Coverage 40, exact phrase 25, opening terms 15.
	assert_close(passage::lexical_score(&lead_phrase, "cast iron"), 80.0);
	// Coverage only: no phrase and both terms sit past the opening window.
	assert_close(passage::lexical_score(&late_terms, "cast iron"), 40.0);
	// Heading path only.
	assert_close(passage::lexical_score(&heading_only, "cast iron"), 20.0);
	// Two of three terms covered and in the opening window.
	assert_close(passage::lexical_score(&lead_phrase, "cast iron skillet"), 40.0 * 2.0 / 3.0 + 10.0);
}

#[test]
fn sub_scores_use_their_weights() {
	assert_close(passage::retrieval_score(SemanticSimilarity::Unit(1.0), 0.0), 70.0);
	assert_close(passage::retrieval_score(SemanticSimilarity::Unit(0.0), 100.0), 30.0);

	assert_close(passage::rerank_score(&only(|c| c.entity_prominence = 100.0)), 35.0);
	assert_close(passage::rerank_score(&only(|c| c.direct_answer_score = 100.0)), 30.0);
	assert_close(passage::rerank_score(&only(|c| c.structural_clarity = 100.0)), 20.0);
	assert_close(passage::rerank_score(&only(|c| c.query_restatement = 100.0)), 15.0);
	assert_close(passage::citation_score(&only(|c| c.quotability = 100.0)), 30.0);
	assert_close(passage::citation_score(&only(|c| c.specificity = 100.0)), 25.0);
	assert_close(passage::citation_score(&only(|c| c.authority_signals = 100.0)), 25.0);
	assert_close(passage::citation_score(&only(|c| c.sentence_structure = 100.0)), 20.0);
}

#[test]
fn passage_score_rebuilds_from_its_parts() {
	for chunk in &chunks() {
		for query in ["how to season a carbon steel wok", "store a wok dry"] {
			let result = passage_score(chunk, query, SemanticSimilarity::Unit(0.64));
			let c = result.components;

			assert_close(result.lexical_score, passage::lexical_score(chunk, query));
			assert_close(result.retrieval_score, 64.0 * 0.70 + result.lexical_score * 0.30);
			assert_close(
				result.rerank_score,
				c.entity_prominence * 0.35
					+ c.direct_answer_score * 0.30
					+ c.structural_clarity * 0.20
					+ c.query_restatement * 0.15,
			);
			assert_close(
				result.citation_score,
				c.quotability * 0.30
					+ c.specificity * 0.25
					+ c.authority_signals * 0.25
					+ c.sentence_structure * 0.20,
			);

			let composite = result.retrieval_score * 0.40
				+ result.rerank_score * 0.35
				+ result.citation_score * 0.25;

			assert!((result.passage_score as f32 - composite).abs() <= 0.5 + 1e-3);
			assert_eq!(result.tier, ScoreTier::from_score(result.passage_score as f32));
		}
	}
}

#[test]
fn drifting_variant_is_reported_first() {
	let categorized = categorize(variant(0.2, 80, 85.0), &chunks());

	assert_eq!(categorized.category, VariantCategory::IntentDrift);
	assert!(matches!(categorized.action, RecommendedAction::ReportDrift { .. }));
}

#[test]
fn dissimilar_variant_is_out_of_scope() {
	let categorized = categorize(variant(0.3, 80, 10.0), &chunks());

	assert_eq!(categorized.category, VariantCategory::OutOfScope);
	assert!(matches!(categorized.action, RecommendedAction::Delete { .. }));
}

#[test]
fn scoring_variant_is_an_optimization_opportunity() {
	let categorized = categorize(variant(0.7, 55, 10.0), &chunks());

	assert_eq!(categorized.category, VariantCategory::OptimizationOpportunity);
	assert_eq!(categorized.tier, ScoreTier::Weak);
	assert_eq!(categorized.action, RecommendedAction::AssignToChunk {
		chunk_index: 0,
		heading: Some("Seasoning".to_string()),
		current_score: 55,
	});
}

#[test]
fn low_scoring_variant_is_a_content_gap() {
	let categorized = categorize(variant(0.6, 25, 10.0), &chunks());

	assert_eq!(categorized.category, VariantCategory::ContentGap);
	assert_eq!(categorized.action, RecommendedAction::GenerateContentBrief {
		missing_entities: vec!["rust".to_string()],
		min_words: 400,
		max_words: 600,
	});
}

#[test]
fn missing_best_chunk_is_a_content_gap() {
	let mut input = variant(0.7, 55, 10.0);

	input.best_chunk_index = Some(99);

	assert_eq!(categorize(input, &chunks()).category, VariantCategory::ContentGap);
}

#[test]
fn categorize_all_summarizes() {
	let report = categorize_all(
		vec![variant(0.2, 80, 85.0), variant(0.7, 55, 10.0), variant(0.6, 25, 15.0)],
		&chunks(),
	);

	assert_eq!(report.summary.total, 3);
	assert_eq!(report.summary.counts.intent_drift, 1);
	assert_eq!(report.summary.counts.optimization_opportunity, 1);
	assert_eq!(report.summary.counts.content_gap, 1);
	assert_eq!(report.summary.counts.out_of_scope, 0);
	assert!((report.summary.average_passage_score - 160.0 / 3.0).abs() < 1e-4);
	assert!((report.summary.average_drift_score - 110.0 / 3.0).abs() < 1e-4);
}

#[test]
fn categorize_all_of_nothing_is_zero() {
	let report = categorize_all(Vec::new(), &[]);

	assert!(report.variants.is_empty());
	assert_eq!(report.summary.total, 0);
	assert_eq!(report.summary.counts, Default::default());
	assert_eq!(report.summary.average_content_similarity, 0.0);
	assert_eq!(report.summary.average_passage_score, 0.0);
	assert_eq!(report.summary.average_drift_score, 0.0);
}

#[test]
fn position_bands_follow_the_weaker_score() {
	let lead = position::estimate(95.0, 90.0);

	assert_eq!(lead.band, ContextBand::Lead);
	assert_eq!(lead.attention, AttentionLevel::High);
	assert!((lead.estimated_position - (1.0 + 10.0 / 15.0 * 4.0)).abs() < 1e-4);
	assert!(lead.mismatches.is_empty());

	let supporting = position::estimate(80.0, 85.0);

	assert_eq!(supporting.band, ContextBand::Supporting);
	assert!((supporting.estimated_position - 7.5).abs() < 1e-4);

	let buried = position::estimate(90.0, 60.0);

	assert_eq!(buried.band, ContextBand::Middle);
	assert_eq!(buried.attention, AttentionLevel::Low);
	assert!((buried.estimated_position - 15.0).abs() < 1e-4);
	assert_eq!(buried.mismatches, vec![ScoreMismatch::RetrievedButBuried]);

	let weak = position::estimate(30.0, 20.0);

	assert_eq!(weak.band, ContextBand::Trailing);
	assert_eq!(weak.attention, AttentionLevel::LowRecencyBoosted);
	assert!((weak.estimated_position - 25.0).abs() < 1e-4);
	assert_eq!(weak.mismatches, vec![ScoreMismatch::NeedsRework]);

	let unretrieved = position::estimate(50.0, 70.0);

	assert_eq!(unretrieved.mismatches, vec![ScoreMismatch::RerankedButNotRetrieved]);
}

#[test]
fn estimate_all_orders_by_position() {
	let positions = position::estimate_all(&[(0, 50.0, 50.0), (1, 95.0, 95.0), (2, 80.0, 80.0)]);
	let order: Vec<usize> = positions.iter().map(|position| position.chunk_index).collect();

	assert_eq!(order, vec![1, 2, 0]);
}

#[test]
fn report_enums_serialize_as_labels() {
	let categorized = categorize(variant(0.6, 25, 10.0), &chunks());
	let value = serde_json::to_value(&categorized).expect("Serialization must succeed.");

	assert_eq!(value["category"], "CONTENT_GAP");
	assert_eq!(value["action"]["type"], "GENERATE_CONTENT_BRIEF");
	assert_eq!(value["tier"], "poor");
	assert_eq!(value["intent"]["primary_intent"], "informational");
}
