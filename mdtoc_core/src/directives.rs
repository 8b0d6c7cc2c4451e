//! Inline `<!-- toc:... -->` directives that control where the table of
//! contents is placed.
//!
//! ```markdown
//! <!-- toc:insertAfterHeading=Introduction -->
//! <!-- toc:insertAfterHeadingOffset=2 -->
//! ```
//!
//! Directives are recognised anywhere in the document and the last occurrence
//! of each key wins. Separately, the leading run of comment lines that holds
//! the directives (the config block) provides the default insertion point.

use tracing::trace;

const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";
const HEADING_KEY: &str = "toc:insertAfterHeading";
const OFFSET_KEY: &str = "toc:insertAfterHeadingOffset";

/// The default directives inserted into new documents. A blank line is
/// inserted after them.
pub const DEFAULT_CONFIG_COMMENTS: &str =
	"<!-- toc:insertAfterHeading= -->\n<!-- toc:insertAfterHeadingOffset=0 -->\n";

/// Placement settings read from inline directives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TocConfig {
	/// Title of the heading the table of contents follows. Empty when unset.
	pub insert_after_heading: String,
	/// Number of lines to skip after the anchor heading.
	pub insert_after_heading_offset: usize,
}

impl TocConfig {
	/// Scan every line for directives. Later directives override earlier ones.
	pub fn scan<S: AsRef<str>>(lines: &[S]) -> Self {
		let mut config = Self::default();

		for line in lines {
			let line = line.as_ref();

			if let Some(heading) = heading_directive(line) {
				config.insert_after_heading = heading.to_string();
			}

			if let Some(offset) = offset_directive(line) {
				config.insert_after_heading_offset = offset;
			}
		}

		config
	}

	/// The configured anchor heading, if one is set.
	pub fn heading(&self) -> Option<&str> {
		if self.insert_after_heading.is_empty() {
			None
		} else {
			Some(self.insert_after_heading.as_str())
		}
	}

	/// Case-insensitive comparison against the configured anchor heading.
	/// Always false when no heading is configured.
	pub fn is_anchor_heading(&self, title: &str) -> bool {
		self.heading()
			.is_some_and(|heading| heading.to_lowercase() == title.to_lowercase())
	}
}

/// Value of a `<!-- toc:insertAfterHeading=VALUE -->` directive, trimmed.
pub fn heading_directive(line: &str) -> Option<&str> {
	directive_values(line, HEADING_KEY).find_map(|rest| {
		// The value needs at least one character before the closing marker.
		let first = rest.chars().next()?.len_utf8();
		let close = rest[first..].find(COMMENT_CLOSE)? + first;
		Some(rest[..close].trim())
	})
}

/// Value of a `<!-- toc:insertAfterHeadingOffset=DIGITS -->` directive.
/// Values too large for `usize` saturate.
pub fn offset_directive(line: &str) -> Option<usize> {
	directive_values(line, OFFSET_KEY).find_map(|rest| {
		let rest = rest.trim_start();
		let digits_end = rest
			.find(|c: char| !c.is_ascii_digit())
			.unwrap_or(rest.len());

		if digits_end == 0 || !rest[digits_end..].trim_start().starts_with(COMMENT_CLOSE) {
			return None;
		}

		Some(rest[..digits_end].parse().unwrap_or(usize::MAX))
	})
}

/// True when the line carries either directive key, whether or not its value
/// is well formed.
pub fn is_config_marker(line: &str) -> bool {
	comment_bodies(line).any(|body| starts_with_ignore_case(body, HEADING_KEY))
}

/// True when the line opens an HTML comment after optional whitespace.
pub fn is_comment_line(line: &str) -> bool {
	line.trim_start().starts_with(COMMENT_OPEN)
}

/// True when the document carries any directive at all.
pub fn has_config<S: AsRef<str>>(lines: &[S]) -> bool {
	config_block_end(lines).is_some() || TocConfig::scan(lines).heading().is_some()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockScan {
	/// Only unrelated comment lines seen so far.
	Leading,
	/// At least one directive seen; `end` is the last directive line.
	InBlock { end: usize },
}

/// Index of the last line of the leading config block, or `None` when the
/// document does not start with one.
///
/// Unrelated comment lines may precede the first directive. Once a directive
/// has been seen, the first line without one ends the block.
pub fn config_block_end<S: AsRef<str>>(lines: &[S]) -> Option<usize> {
	let mut state = BlockScan::Leading;

	for (index, line) in lines.iter().enumerate() {
		let line = line.as_ref();
		let next = match (state, is_config_marker(line)) {
			(_, true) => BlockScan::InBlock { end: index },
			(BlockScan::InBlock { end }, false) => return Some(end),
			(BlockScan::Leading, false) if is_comment_line(line) => BlockScan::Leading,
			(BlockScan::Leading, false) => return None,
		};

		trace!(index, ?next, "config block scan");
		state = next;
	}

	match state {
		BlockScan::InBlock { end } => Some(end),
		BlockScan::Leading => None,
	}
}

/// Text following every `<!--` in the line, with leading whitespace removed.
fn comment_bodies(line: &str) -> impl Iterator<Item = &str> {
	line.match_indices(COMMENT_OPEN)
		.map(move |(index, _)| line[index + COMMENT_OPEN.len()..].trim_start())
}

/// The raw text after `=` for every comment in the line that starts with
/// `key`. Whitespace before `=` is tolerated.
fn directive_values<'a>(line: &'a str, key: &'static str) -> impl Iterator<Item = &'a str> {
	comment_bodies(line).filter_map(move |body| {
		if !starts_with_ignore_case(body, key) {
			return None;
		}

		body[key.len()..].trim_start().strip_prefix('=')
	})
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
	text.get(..prefix.len())
		.is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}
