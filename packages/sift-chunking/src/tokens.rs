pub use tokenizers::Tokenizer;

pub type TokenizerError = tokenizers::Error;

/// Counts tokens the way the embedding model will see them.
pub trait TokenCounter {
	fn count(&self, text: &str) -> usize;
}

/// Four characters per token, rounded up.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeuristicCounter;
impl TokenCounter for HeuristicCounter {
	fn count(&self, text: &str) -> usize {
		text.chars().count().div_ceil(4)
	}
}

impl TokenCounter for Tokenizer {
	fn count(&self, text: &str) -> usize {
		match self.encode(text, false) {
			Ok(encoding) => encoding.len(),
			Err(err) => {
				tracing::error!(error = %err, "Tokenizer failed to encode chunk text.");

				HeuristicCounter.count(text)
			},
		}
	}
}

pub fn load_tokenizer(repo: &str) -> Result<Tokenizer, TokenizerError> {
	Tokenizer::from_pretrained(repo, None)
}

/// Byte spans of whitespace-separated words.
pub(crate) fn word_spans(text: &str) -> Vec<(usize, usize)> {
	let mut spans = Vec::new();
	let mut start = None;

	for (idx, ch) in text.char_indices() {
		match (ch.is_whitespace(), start) {
			(true, Some(begin)) => {
				spans.push((begin, idx));

				start = None;
			},
			(false, None) => start = Some(idx),
			_ => {},
		}
	}

	if let Some(begin) = start {
		spans.push((begin, text.len()));
	}

	spans
}

/// Longest proper suffix of `text`, starting at a word boundary, that fits in `overlap_tokens`.
pub(crate) fn overlap_tail<'a>(
	text: &'a str,
	overlap_tokens: u32,
	counter: &dyn TokenCounter,
) -> &'a str {
	if overlap_tokens == 0 {
		return "";
	}

	let spans = word_spans(text);
	let mut start = text.len();

	for (begin, _) in spans.iter().skip(1).rev() {
		if counter.count(text[*begin..].trim_end()) > overlap_tokens as usize {
			break;
		}

		start = *begin;
	}

	&text[start..]
}

/// Greedy windows over `spans` of at most `max_tokens`, consecutive windows sharing up to
/// `overlap_tokens` of trailing words. Returns byte ranges into `text`.
pub(crate) fn window_spans(
	text: &str,
	spans: &[(usize, usize)],
	max_tokens: u32,
	overlap_tokens: u32,
	counter: &dyn TokenCounter,
) -> Vec<(usize, usize)> {
	let max_tokens = max_tokens as usize;
	let overlap_tokens = overlap_tokens as usize;
	let mut out = Vec::new();
	let mut first = 0_usize;

	while first < spans.len() {
		let mut last = first;

		while last + 1 < spans.len()
			&& counter.count(&text[spans[first].0..spans[last + 1].1]) <= max_tokens
		{
			last += 1;
		}

		out.push((spans[first].0, spans[last].1));

		if last + 1 >= spans.len() {
			break;
		}

		let mut next = last + 1;

		if overlap_tokens > 0 {
			let mut k = last;

			while k > first && counter.count(&text[spans[k].0..spans[last].1]) <= overlap_tokens {
				next = k;
				k -= 1;
			}
		}

		first = next;
	}

	out
}
