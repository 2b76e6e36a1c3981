mod blocks;
mod tokens;

pub use tokens::{HeuristicCounter, TokenCounter, Tokenizer, TokenizerError, load_tokenizer};

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use blocks::{Block, BlockKind};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkStrategy {
	/// One chunk per paragraph block.
	Paragraph,
	/// Blocks packed up to the token budget, always breaking at headings.
	#[default]
	Semantic,
	/// Token windows over the body text, ignoring layout.
	Fixed,
}
impl ChunkStrategy {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Paragraph => "paragraph",
			Self::Semantic => "semantic",
			Self::Fixed => "fixed",
		}
	}
}
impl FromStr for ChunkStrategy {
	type Err = UnknownStrategy;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw.trim().to_ascii_lowercase().as_str() {
			"paragraph" => Ok(Self::Paragraph),
			"semantic" => Ok(Self::Semantic),
			"fixed" => Ok(Self::Fixed),
			_ => Err(UnknownStrategy(raw.to_string())),
		}
	}
}
impl fmt::Display for ChunkStrategy {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownStrategy(pub String);
impl fmt::Display for UnknownStrategy {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Unknown chunking strategy {:?}.", self.0)
	}
}
impl std::error::Error for UnknownStrategy {}

#[derive(Clone, Debug)]
pub struct ChunkingConfig {
	pub strategy: ChunkStrategy,
	pub max_tokens: u32,
	pub overlap_tokens: u32,
	pub cascade_headings: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
	pub start: usize,
	pub end: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
	pub id: String,
	pub index: usize,
	/// What gets embedded: cascade prefix (when enabled) followed by the body.
	pub text: String,
	pub text_without_cascade: String,
	pub heading_path: Vec<String>,
	pub heading_levels: Vec<usize>,
	pub source_line_range: LineRange,
	pub token_estimate: usize,
	pub word_count: usize,
	pub char_count: usize,
	pub has_cascade: bool,
}
impl Chunk {
	/// Innermost heading, if the chunk sits under one.
	pub fn heading(&self) -> Option<&str> {
		self.heading_path.last().map(String::as_str)
	}

	/// Same headings and position, new body. Used to re-score rewritten text.
	pub fn with_body(
		&self,
		body: &str,
		cascade_headings: bool,
		counter: &dyn TokenCounter,
	) -> Self {
		let headings: Vec<Heading> = self
			.heading_path
			.iter()
			.zip(self.heading_levels.iter())
			.map(|(text, level)| Heading { text: text.clone(), level: *level })
			.collect();
		let draft = Draft {
			headings,
			body: body.trim().to_string(),
			start_line: self.source_line_range.start,
			end_line: self.source_line_range.end,
		};

		draft.into_chunk(self.index, cascade_headings, counter)
	}
}

#[derive(Clone, Debug)]
struct Heading {
	text: String,
	level: usize,
}

#[derive(Clone, Debug)]
struct Draft {
	headings: Vec<Heading>,
	body: String,
	start_line: usize,
	end_line: usize,
}
impl Draft {
	fn into_chunk(self, index: usize, cascade_headings: bool, counter: &dyn TokenCounter) -> Chunk {
		let has_cascade = cascade_headings && !self.headings.is_empty();
		let text = if has_cascade {
			format!("{}\n\n{}", render_cascade(&self.headings), self.body)
		} else {
			self.body.clone()
		};
		let hash = blake3::hash(text.as_bytes()).to_hex();

		Chunk {
			id: format!("chunk-{index}-{}", &hash.as_str()[..12]),
			index,
			token_estimate: counter.count(&text),
			word_count: self.body.split_whitespace().count(),
			char_count: self.body.chars().count(),
			text,
			heading_path: self.headings.iter().map(|heading| heading.text.clone()).collect(),
			heading_levels: self.headings.iter().map(|heading| heading.level).collect(),
			source_line_range: LineRange { start: self.start_line, end: self.end_line },
			has_cascade,
			text_without_cascade: self.body,
		}
	}
}

/// A run of body text cut from a single block, with byte offsets into the block text.
struct Piece<'a> {
	text: &'a str,
	start: usize,
	end: usize,
}

/// Splits `document` into ordered chunks. Empty documents produce no chunks.
pub fn chunk_document(
	document: &str,
	cfg: &ChunkingConfig,
	counter: &dyn TokenCounter,
) -> Vec<Chunk> {
	let cfg = effective_config(cfg);
	let blocks = blocks::parse_blocks(document);
	let drafts = match cfg.strategy {
		ChunkStrategy::Paragraph => paragraph_drafts(&blocks, &cfg, counter),
		ChunkStrategy::Semantic => semantic_drafts(&blocks, &cfg, counter),
		ChunkStrategy::Fixed => fixed_drafts(&blocks, &cfg, counter),
	};
	let chunks: Vec<Chunk> = drafts
		.into_iter()
		.filter(|draft| !draft.body.trim().is_empty())
		.enumerate()
		.map(|(index, draft)| draft.into_chunk(index, cfg.cascade_headings, counter))
		.collect();

	tracing::debug!(
		strategy = cfg.strategy.as_str(),
		blocks = blocks.len(),
		chunks = chunks.len(),
		"Chunked document."
	);

	chunks
}

fn effective_config(cfg: &ChunkingConfig) -> ChunkingConfig {
	let max_tokens = cfg.max_tokens.max(1);

	ChunkingConfig {
		strategy: cfg.strategy,
		max_tokens,
		overlap_tokens: cfg.overlap_tokens.min(max_tokens - 1),
		cascade_headings: cfg.cascade_headings,
	}
}

fn render_cascade(headings: &[Heading]) -> String {
	headings
		.iter()
		.map(|heading| format!("{} {}", "#".repeat(heading.level), heading.text))
		.collect::<Vec<_>>()
		.join("\n")
}

fn push_heading(stack: &mut Vec<Heading>, text: &str, level: usize) {
	while stack.last().map(|top| top.level >= level).unwrap_or(false) {
		stack.pop();
	}

	stack.push(Heading { text: text.to_string(), level });
}

fn paragraph_drafts(
	blocks: &[Block],
	cfg: &ChunkingConfig,
	counter: &dyn TokenCounter,
) -> Vec<Draft> {
	let mut stack = Vec::new();
	let mut drafts = Vec::new();

	for block in blocks {
		match block.kind {
			BlockKind::Heading { level } => push_heading(&mut stack, &block.text, level),
			BlockKind::Paragraph | BlockKind::Code => {
				drafts.extend(block_drafts(block, &stack, cfg, counter));
			},
		}
	}

	drafts
}

fn semantic_drafts(
	blocks: &[Block],
	cfg: &ChunkingConfig,
	counter: &dyn TokenCounter,
) -> Vec<Draft> {
	let max_tokens = cfg.max_tokens as usize;
	let mut stack = Vec::new();
	let mut drafts = Vec::new();
	let mut current: Option<Draft> = None;

	for block in blocks {
		if let BlockKind::Heading { level } = block.kind {
			drafts.extend(current.take());
			push_heading(&mut stack, &block.text, level);

			continue;
		}
		if counter.count(&block.text) > max_tokens {
			drafts.extend(current.take());
			drafts.extend(block_drafts(block, &stack, cfg, counter));

			continue;
		}

		let fits = current
			.as_ref()
			.map(|draft| {
				counter.count(&format!("{}\n\n{}", draft.body, block.text)) <= max_tokens
			})
			.unwrap_or(false);

		if let Some(draft) = current.as_mut().filter(|_| fits) {
			draft.body.push_str("\n\n");
			draft.body.push_str(&block.text);

			draft.end_line = block.end_line;
		} else {
			drafts.extend(current.take());

			current = Some(Draft {
				headings: stack.clone(),
				body: block.text.clone(),
				start_line: block.start_line,
				end_line: block.end_line,
			});
		}
	}

	drafts.extend(current);

	drafts
}

fn fixed_drafts(blocks: &[Block], cfg: &ChunkingConfig, counter: &dyn TokenCounter) -> Vec<Draft> {
	struct Segment {
		start: usize,
		start_line: usize,
		headings: Vec<Heading>,
	}

	let mut stack = Vec::new();
	let mut body = String::new();
	let mut segments = Vec::new();

	for block in blocks {
		if let BlockKind::Heading { level } = block.kind {
			push_heading(&mut stack, &block.text, level);

			continue;
		}
		if !body.is_empty() {
			body.push_str("\n\n");
		}

		let start = body.len();

		body.push_str(&block.text);
		segments.push(Segment {
			start,
			start_line: block.start_line,
			headings: stack.clone(),
		});
	}

	let spans = tokens::word_spans(&body);
	let windows =
		tokens::window_spans(&body, &spans, cfg.max_tokens, cfg.overlap_tokens, counter);
	let segment_at = |offset: usize| {
		segments.iter().rev().find(|segment| segment.start <= offset).or(segments.first())
	};

	windows
		.into_iter()
		.filter_map(|(start, end)| {
			let first = segment_at(start)?;
			let last = segment_at(end.saturating_sub(1))?;

			Some(Draft {
				headings: first.headings.clone(),
				body: body[start..end].to_string(),
				start_line: line_at(&body, first.start, first.start_line, start),
				end_line: line_at(&body, last.start, last.start_line, end),
			})
		})
		.collect()
}

/// One block, split into as many drafts as the token budget requires.
fn block_drafts(
	block: &Block,
	stack: &[Heading],
	cfg: &ChunkingConfig,
	counter: &dyn TokenCounter,
) -> Vec<Draft> {
	let pieces = if counter.count(&block.text) <= cfg.max_tokens as usize {
		vec![Piece { text: block.text.as_str(), start: 0, end: block.text.len() }]
	} else {
		split_oversized(&block.text, cfg, counter)
	};

	pieces
		.into_iter()
		.map(|piece| Draft {
			headings: stack.to_vec(),
			body: piece.text.to_string(),
			start_line: line_at(&block.text, 0, block.start_line, piece.start),
			end_line: line_at(&block.text, 0, block.start_line, piece.end),
		})
		.collect()
}

/// Sentence-bounded pieces of at most `max_tokens`; the tail of each piece (up to
/// `overlap_tokens`) opens the next one. Sentences above the budget fall back to word windows.
fn split_oversized<'a>(
	text: &'a str,
	cfg: &ChunkingConfig,
	counter: &dyn TokenCounter,
) -> Vec<Piece<'a>> {
	let max_tokens = cfg.max_tokens as usize;
	let mut pieces = Vec::new();
	let mut current_start: Option<usize> = None;
	// Start of the overlap tail left by the last word-window split, if any.
	let mut carried_tail: Option<usize> = None;
	let mut last_end = 0_usize;

	for (idx, sentence) in text.split_sentence_bound_indices() {
		let sentence_end = idx + sentence.len();

		if counter.count(sentence.trim()) > max_tokens {
			if let Some(start) = current_start.take() {
				pieces.extend(make_piece(text, start, last_end));
			}

			let spans: Vec<(usize, usize)> = tokens::word_spans(sentence)
				.into_iter()
				.map(|(start, end)| (idx + start, idx + end))
				.collect();

			let windows =
				tokens::window_spans(text, &spans, cfg.max_tokens, cfg.overlap_tokens, counter);

			for &(start, end) in &windows {
				pieces.extend(make_piece(text, start, end));
			}

			carried_tail = windows.last().and_then(|&(start, end)| {
				let tail = tokens::overlap_tail(&text[start..end], cfg.overlap_tokens, counter);

				(!tail.trim().is_empty()).then(|| end - tail.len())
			});
			last_end = sentence_end;

			continue;
		}

		match current_start {
			None => {
				let carries = carried_tail.filter(|&tail_start| {
					counter.count(text[tail_start..sentence_end].trim()) <= max_tokens
				});

				current_start = Some(carries.unwrap_or(idx));
			},
			Some(start) if counter.count(text[start..sentence_end].trim()) > max_tokens => {
				pieces.extend(make_piece(text, start, last_end));

				let tail = tokens::overlap_tail(&text[start..last_end], cfg.overlap_tokens, counter);
				let tail_start = last_end - tail.len();
				let carries = !tail.trim().is_empty()
					&& counter.count(text[tail_start..sentence_end].trim()) <= max_tokens;

				current_start = Some(if carries { tail_start } else { idx });
			},
			Some(_) => {},
		}

		last_end = sentence_end;
	}

	if let Some(start) = current_start {
		pieces.extend(make_piece(text, start, last_end));
	}

	pieces
}

fn make_piece(text: &str, start: usize, end: usize) -> Option<Piece<'_>> {
	let raw = &text[start..end];
	let trimmed = raw.trim();

	if trimmed.is_empty() {
		return None;
	}

	let lead = raw.len() - raw.trim_start().len();
	let start = start + lead;

	Some(Piece { text: trimmed, start, end: start + trimmed.len() })
}

/// Line number of byte `offset` in `text`, given that `base_offset` sits on `base_line`.
fn line_at(text: &str, base_offset: usize, base_line: usize, offset: usize) -> usize {
	let offset = offset.clamp(base_offset, text.len());

	base_line + text[base_offset..offset].trim_end().matches('\n').count()
}
