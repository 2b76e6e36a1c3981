#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BlockKind {
	Heading { level: usize },
	Paragraph,
	Code,
}

#[derive(Clone, Debug)]
pub(crate) struct Block {
	pub(crate) kind: BlockKind,
	pub(crate) text: String,
	pub(crate) start_line: usize,
	pub(crate) end_line: usize,
}

struct OpenFence {
	marker: &'static str,
	lines: Vec<String>,
	start_line: usize,
}

/// Splits Markdown-like text into headings, paragraphs and fenced code, in document order.
/// Line numbers are 1-based and inclusive.
pub(crate) fn parse_blocks(document: &str) -> Vec<Block> {
	let mut blocks = Vec::new();
	let mut paragraph: Vec<&str> = Vec::new();
	let mut paragraph_start = 0_usize;
	let mut fence: Option<OpenFence> = None;
	let mut last_line = 0_usize;

	for (idx, raw) in document.lines().enumerate() {
		let line_no = idx + 1;
		let line = raw.trim_end();
		let trimmed = line.trim_start();

		last_line = line_no;

		if let Some(open) = fence.as_mut() {
			open.lines.push(line.to_string());

			if trimmed.starts_with(open.marker) && open.lines.len() > 1 {
				let closed = fence.take().map(|open| Block {
					kind: BlockKind::Code,
					text: open.lines.join("\n"),
					start_line: open.start_line,
					end_line: line_no,
				});

				blocks.extend(closed);
			}

			continue;
		}

		if let Some(marker) = fence_marker(trimmed) {
			flush_paragraph(&mut blocks, &mut paragraph, paragraph_start, line_no - 1);

			fence = Some(OpenFence { marker, lines: vec![line.to_string()], start_line: line_no });

			continue;
		}
		if let Some((level, heading)) = parse_heading(trimmed) {
			flush_paragraph(&mut blocks, &mut paragraph, paragraph_start, line_no - 1);

			if !heading.is_empty() {
				blocks.push(Block {
					kind: BlockKind::Heading { level },
					text: heading.to_string(),
					start_line: line_no,
					end_line: line_no,
				});
			}

			continue;
		}
		if trimmed.is_empty() {
			flush_paragraph(&mut blocks, &mut paragraph, paragraph_start, line_no - 1);

			continue;
		}
		if paragraph.is_empty() {
			paragraph_start = line_no;
		}

		paragraph.push(line);
	}

	flush_paragraph(&mut blocks, &mut paragraph, paragraph_start, last_line);

	if let Some(open) = fence {
		blocks.push(Block {
			kind: BlockKind::Code,
			text: open.lines.join("\n"),
			start_line: open.start_line,
			end_line: last_line,
		});
	}

	blocks
}

fn flush_paragraph(
	blocks: &mut Vec<Block>,
	paragraph: &mut Vec<&str>,
	start_line: usize,
	end_line: usize,
) {
	if paragraph.is_empty() {
		return;
	}

	blocks.push(Block {
		kind: BlockKind::Paragraph,
		text: paragraph.join("\n"),
		start_line,
		end_line,
	});
	paragraph.clear();
}

fn fence_marker(trimmed: &str) -> Option<&'static str> {
	if trimmed.starts_with("```") {
		Some("```")
	} else if trimmed.starts_with("~~~") {
		Some("~~~")
	} else {
		None
	}
}

fn parse_heading(trimmed: &str) -> Option<(usize, &str)> {
	let level = trimmed.chars().take_while(|ch| *ch == '#').count();

	if level == 0 || level > 6 {
		return None;
	}

	let rest = &trimmed[level..];

	if !rest.is_empty() && !rest.starts_with([' ', '\t']) {
		return None;
	}

	Some((level, rest.trim().trim_end_matches('#').trim_end()))
}
