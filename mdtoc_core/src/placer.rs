use serde::Serialize;
use tracing::trace;

use crate::directives::TocConfig;
use crate::directives::config_block_end;
use crate::document::LineEdit;
use crate::headings::is_toc_title;
use crate::headings::parse_heading;

/// The line range of a previously generated table of contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TocBlock {
	/// 0-indexed line of the `Table of Contents` heading.
	pub start: usize,
	/// 0-indexed last line of the block (inclusive).
	pub end: usize,
}

impl TocBlock {
	/// Locate the existing table of contents, if any.
	pub fn find<S: AsRef<str>>(lines: &[S]) -> Option<Self> {
		let start = find_toc_start(lines)?;
		let end = find_toc_end(lines, start);

		Some(Self { start, end })
	}

	/// Number of lines covered by the block.
	pub fn line_count(&self) -> usize {
		self.end - self.start + 1
	}

	/// The edit that removes the whole block.
	pub fn delete_edit(&self) -> LineEdit {
		LineEdit::Delete {
			start_line: self.start,
			end_line: self.end + 1,
		}
	}
}

/// Index of the first line that is exactly a `Table of Contents` heading, at
/// any level and in any letter case.
pub fn find_toc_start<S: AsRef<str>>(lines: &[S]) -> Option<usize> {
	lines.iter().position(|line| {
		parse_heading(line.as_ref()).is_some_and(|(_, title)| is_toc_title(title))
	})
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EndScan {
	Blanks,
	List,
	TrailingBlank,
	Done,
}

/// Index of the last line belonging to the table of contents that starts at
/// `start`.
///
/// Blank lines after the heading are consumed, then generated list items,
/// then at most one blank line. Returns `start` when nothing follows.
pub fn find_toc_end<S: AsRef<str>>(lines: &[S], start: usize) -> usize {
	let mut index = start + 1;
	let mut state = EndScan::Blanks;

	while state != EndScan::Done {
		let line: Option<&str> = lines.get(index).map(AsRef::as_ref);
		let (next, consumed) = match state {
			EndScan::Blanks => {
				match line {
					Some(line) if is_blank(line) => (EndScan::Blanks, true),
					_ => (EndScan::List, false),
				}
			}
			EndScan::List => {
				match line {
					Some(line) if is_toc_item(line) => (EndScan::List, true),
					_ => (EndScan::TrailingBlank, false),
				}
			}
			EndScan::TrailingBlank => (EndScan::Done, line.is_some_and(is_blank)),
			EndScan::Done => (EndScan::Done, false),
		};

		if consumed {
			index += 1;
		}

		trace!(index, ?next, "toc end scan");
		state = next;
	}

	index - 1
}

/// True for empty or whitespace-only lines.
pub fn is_blank(line: &str) -> bool {
	line.trim().is_empty()
}

/// True for lines shaped like a generated entry: `1. [title](#anchor)` with
/// any indentation.
pub fn is_toc_item(line: &str) -> bool {
	let Some(rest) = line.trim_start().strip_prefix("1.") else {
		return false;
	};

	if !rest.starts_with(char::is_whitespace) {
		return false;
	}

	let link = rest.trim();
	let Some(inner) = link
		.strip_prefix('[')
		.and_then(|link| link.strip_suffix(')'))
	else {
		return false;
	};

	inner.contains("](#")
}

/// Where the new table of contents goes, and why.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Placement {
	/// Last line of the leading config block.
	pub config_end: Option<usize>,
	/// Line of the configured anchor heading, when it exists.
	pub heading_index: Option<usize>,
	/// 0-indexed line the block is inserted before.
	pub line: usize,
}

impl Placement {
	/// Resolve the insertion line against the current document.
	///
	/// Defaults to the line after the config block (or the top of the
	/// document). When the configured anchor heading exists the block goes
	/// `offset` lines after it, never past the end of the document.
	pub fn resolve<S: AsRef<str>>(lines: &[S], config: &TocConfig) -> Self {
		let config_end = config_block_end(lines);
		let heading_index = find_anchor_heading(lines, config);

		let line = match heading_index {
			Some(index) => {
				index
					.saturating_add(1)
					.saturating_add(config.insert_after_heading_offset)
					.min(lines.len())
			}
			None => config_end.map_or(0, |end| end + 1),
		};

		Self {
			config_end,
			heading_index,
			line,
		}
	}
}

/// Shortcut for the line chosen by [`Placement::resolve`].
pub fn resolve_insertion_line<S: AsRef<str>>(lines: &[S], config: &TocConfig) -> usize {
	Placement::resolve(lines, config).line
}

/// First heading whose title matches the configured anchor heading.
pub fn find_anchor_heading<S: AsRef<str>>(lines: &[S], config: &TocConfig) -> Option<usize> {
	config.heading()?;

	lines.iter().position(|line| {
		parse_heading(line.as_ref()).is_some_and(|(_, title)| config.is_anchor_heading(title))
	})
}
