use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub providers: Providers,
	pub chunking: Chunking,
	#[serde(default)]
	pub scoring: Scoring,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub rewrite: LlmProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Chunking {
	#[serde(default = "default_strategy")]
	pub strategy: String,
	pub max_tokens: u32,
	pub overlap_tokens: u32,
	#[serde(default = "default_cascade_headings")]
	pub cascade_headings: bool,
	/// Optional. Hugging Face repo used for exact token counts; the heuristic counter is used
	/// when unset.
	pub tokenizer_repo: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Scoring {
	/// Passage score (0-100) a query must reach before the greedy pass may assign it.
	pub min_assignment_score: f32,
	/// Embed chunk sentences and query clauses so chamfer compares sets instead of singletons.
	pub sentence_chamfer: bool,
}
impl Default for Scoring {
	fn default() -> Self {
		Self { min_assignment_score: 40.0, sentence_chamfer: false }
	}
}

fn default_strategy() -> String {
	"semantic".to_string()
}

fn default_cascade_headings() -> bool {
	true
}
