mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Chunking, Config, EmbeddingProviderConfig, LlmProviderConfig, Providers, Scoring, Service,
};

use std::{fs, path::Path};

pub const CHUNK_STRATEGIES: [&str; 3] = ["paragraph", "semantic", "fixed"];

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::validation("service.log_level", "must be non-empty"));
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::validation(
			"providers.embedding.dimensions",
			"must be greater than zero",
		));
	}

	for (field, key) in [
		("providers.embedding.api_key", &cfg.providers.embedding.api_key),
		("providers.rewrite.api_key", &cfg.providers.rewrite.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::validation(field, "must be non-empty"));
		}
	}

	let temperature = cfg.providers.rewrite.temperature;

	if !temperature.is_finite() || !(0.0..=2.0).contains(&temperature) {
		return Err(Error::validation(
			"providers.rewrite.temperature",
			"must be a finite number in the range 0.0-2.0",
		));
	}
	if !CHUNK_STRATEGIES.contains(&cfg.chunking.strategy.as_str()) {
		return Err(Error::validation(
			"chunking.strategy",
			"must be one of paragraph, semantic, or fixed",
		));
	}
	if cfg.chunking.max_tokens == 0 {
		return Err(Error::validation("chunking.max_tokens", "must be greater than zero"));
	}
	if cfg.chunking.overlap_tokens >= cfg.chunking.max_tokens {
		return Err(Error::validation(
			"chunking.overlap_tokens",
			"must be less than chunking.max_tokens",
		));
	}

	let min_score = cfg.scoring.min_assignment_score;

	if !min_score.is_finite() {
		return Err(Error::validation("scoring.min_assignment_score", "must be a finite number"));
	}
	if !(0.0..=100.0).contains(&min_score) {
		return Err(Error::validation(
			"scoring.min_assignment_score",
			"must be in the range 0.0-100.0",
		));
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.chunking.tokenizer_repo.as_deref().map(|repo| repo.trim().is_empty()).unwrap_or(false) {
		cfg.chunking.tokenizer_repo = None;
	}

	cfg.chunking.strategy = cfg.chunking.strategy.trim().to_ascii_lowercase();
}
