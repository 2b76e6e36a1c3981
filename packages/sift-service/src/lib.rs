pub mod analyze;
pub mod rewrite;
pub mod variants;

mod error;

pub use analyze::{AnalysisReport, AnalyzeRequest, PairScore, QuerySimilarity};
pub use error::{Error, Result};
pub use rewrite::{RewriteOutcome, RewriteRequest};
pub use variants::{VariantReport, VariantRequest};

use std::{collections::HashSet, future::Future, pin::Pin, sync::Arc};

use sift_chunking::{
	Chunk, ChunkStrategy, ChunkingConfig, HeuristicCounter, TokenCounter, chunk_document,
};
use sift_config::{Config, EmbeddingProviderConfig, LlmProviderConfig};
use sift_providers::{embedding, rewrite as rewrite_provider};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub type SharedCounter = Arc<dyn TokenCounter + Send + Sync>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>>;
}

pub trait RewriteProvider
where
	Self: Send + Sync,
{
	fn rewrite<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		chunk_text: &'a str,
		query: &'a str,
	) -> BoxFuture<'a, Result<String>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub rewrite: Arc<dyn RewriteProvider>,
}
impl Providers {
	pub fn new(embedding: Arc<dyn EmbeddingProvider>, rewrite: Arc<dyn RewriteProvider>) -> Self {
		Self { embedding, rewrite }
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { embedding: provider.clone(), rewrite: provider }
	}
}

struct DefaultProviders;

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, Result<Vec<Vec<f32>>>> {
		Box::pin(async move { Ok(embedding::embed(cfg, texts).await?) })
	}
}

impl RewriteProvider for DefaultProviders {
	fn rewrite<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		chunk_text: &'a str,
		query: &'a str,
	) -> BoxFuture<'a, Result<String>> {
		Box::pin(async move { Ok(rewrite_provider::rewrite(cfg, chunk_text, query).await?) })
	}
}

pub struct SiftService {
	pub cfg: Config,
	pub providers: Providers,
	counter: SharedCounter,
}
impl SiftService {
	/// Loads the configured tokenizer, if any, and wires the HTTP providers.
	pub fn new(cfg: Config) -> Result<Self> {
		Self::with_providers(cfg, Providers::default())
	}

	pub fn with_providers(cfg: Config, providers: Providers) -> Result<Self> {
		let counter: SharedCounter = match cfg.chunking.tokenizer_repo.as_deref() {
			Some(repo) => {
				let tokenizer = sift_chunking::load_tokenizer(repo).map_err(|err| {
					Error::Tokenizer { message: format!("Failed to load {repo}: {err}") }
				})?;

				Arc::new(tokenizer)
			},
			None => Arc::new(HeuristicCounter),
		};

		Ok(Self { cfg, providers, counter })
	}

	/// Replaces the token counter, for callers that already hold one.
	pub fn with_counter(mut self, counter: SharedCounter) -> Self {
		self.counter = counter;

		self
	}

	pub fn chunking_config(&self) -> Result<ChunkingConfig> {
		let chunking = &self.cfg.chunking;

		Ok(ChunkingConfig {
			strategy: chunking.strategy.parse::<ChunkStrategy>()?,
			max_tokens: chunking.max_tokens,
			overlap_tokens: chunking.overlap_tokens,
			cascade_headings: chunking.cascade_headings,
		})
	}

	pub fn chunk(&self, document: &str) -> Result<Vec<Chunk>> {
		Ok(chunk_document(document, &self.chunking_config()?, self.counter.as_ref()))
	}

	pub(crate) fn counter(&self) -> &dyn TokenCounter {
		self.counter.as_ref()
	}

	/// One provider call for the whole run. A short or long answer fails the run.
	pub(crate) async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
		let vectors = match self.providers.embedding.embed(&self.cfg.providers.embedding, texts).await
		{
			Ok(vectors) => vectors,
			Err(err) => {
				tracing::error!(error = %err, texts = texts.len(), "Embedding request failed.");

				return Err(err);
			},
		};

		if vectors.len() != texts.len() {
			return Err(Error::EmbeddingMismatch { expected: texts.len(), actual: vectors.len() });
		}

		Ok(vectors)
	}
}

/// Trims, drops blanks and collapses repeats, keeping first-seen order.
pub fn clean_queries<I, S>(queries: I) -> Vec<String>
where
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	let mut seen = HashSet::new();
	let mut out: Vec<String> = Vec::new();

	for query in queries {
		let query = query.as_ref().trim();

		if !query.is_empty() && seen.insert(query.to_string()) {
			out.push(query.to_string());
		}
	}

	out
}

/// Appends texts to a single embedding batch and remembers where each group landed.
#[derive(Default)]
pub(crate) struct EmbeddingBatch {
	texts: Vec<String>,
}
impl EmbeddingBatch {
	pub(crate) fn push(&mut self, text: impl Into<String>) -> usize {
		self.texts.push(text.into());

		self.texts.len() - 1
	}

	pub(crate) fn extend<I>(&mut self, texts: I) -> std::ops::Range<usize>
	where
		I: IntoIterator,
		I::Item: Into<String>,
	{
		let start = self.texts.len();

		self.texts.extend(texts.into_iter().map(Into::into));

		start..self.texts.len()
	}

	pub(crate) fn texts(&self) -> &[String] {
		&self.texts
	}
}
