use serde::Serialize;
use tracing::debug;

use crate::directives::TocConfig;
use crate::fence::FenceTracker;

/// Title of the generated heading.
pub const TOC_TITLE: &str = "Table of Contents";

/// Indentation for each level of nesting below the minimum level.
const INDENT: &str = "    ";

/// An ATX heading line eligible for the table of contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heading {
	/// 0-indexed line number.
	pub line_index: usize,
	/// Number of leading `#` characters (1-6).
	pub level: u8,
	/// Heading text with surrounding whitespace removed.
	pub title: String,
}

/// Split an ATX heading line into its level and trimmed title.
///
/// The line must start with one to six `#` characters followed by at least
/// one whitespace character. The title may be empty.
pub fn parse_heading(line: &str) -> Option<(u8, &str)> {
	let level = line.bytes().take_while(|byte| *byte == b'#').count();

	if level == 0 || level > 6 {
		return None;
	}

	let rest = &line[level..];
	if !rest.starts_with(char::is_whitespace) {
		return None;
	}

	Some((level as u8, rest.trim()))
}

/// True when the title names a table of contents heading.
pub fn is_toc_title(title: &str) -> bool {
	title.eq_ignore_ascii_case(TOC_TITLE)
}

/// Convert a heading title into the fragment used for its link.
///
/// The title is lowercased, every character other than ASCII letters, digits,
/// `_`, whitespace and `-` is removed, and each run of whitespace and hyphens
/// becomes a single `-`. Duplicate titles produce duplicate anchors.
pub fn slugify(title: &str) -> String {
	let mut slug = String::with_capacity(title.len());
	let mut in_separator = false;

	for c in title.to_lowercase().chars() {
		if c.is_whitespace() || c == '-' {
			if !in_separator {
				slug.push('-');
				in_separator = true;
			}
		} else if c.is_ascii_alphanumeric() || c == '_' {
			slug.push(c);
			in_separator = false;
		}
	}

	slug
}

/// Collect the headings that belong in the table of contents, in document
/// order.
///
/// Lines inside fenced code blocks are ignored, as are the configured anchor
/// heading and any existing table of contents heading.
pub fn collect_headings<S: AsRef<str>>(lines: &[S], config: &TocConfig) -> Vec<Heading> {
	let mut fence = FenceTracker::new();
	let mut headings = Vec::new();

	for (line_index, line) in lines.iter().enumerate() {
		let line = line.as_ref();
		if fence.is_inside_fence(line) {
			continue;
		}

		let Some((level, title)) = parse_heading(line) else {
			continue;
		};
		if config.is_anchor_heading(title) || is_toc_title(title) {
			continue;
		}

		headings.push(Heading {
			line_index,
			level,
			title: title.to_string(),
		});
	}

	if fence.in_fence() {
		debug!("code fence is never closed, later headings were ignored");
	}

	headings
}

/// A single linked entry of the table of contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
	pub level: u8,
	pub title: String,
	pub anchor: String,
}

impl TocEntry {
	pub fn new(level: u8, title: impl Into<String>) -> Self {
		let title = title.into();
		let anchor = slugify(&title);

		Self {
			level,
			title,
			anchor,
		}
	}

	/// Render the entry as an ordered list item indented relative to
	/// `min_level`.
	pub fn render(&self, min_level: u8) -> String {
		let depth = usize::from(self.level.saturating_sub(min_level));
		format!("{}1. [{}](#{})", INDENT.repeat(depth), self.title, self.anchor)
	}
}

impl From<&Heading> for TocEntry {
	fn from(heading: &Heading) -> Self {
		Self::new(heading.level, heading.title.clone())
	}
}

/// The generated table of contents for a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableOfContents {
	/// Smallest level among the entries. Used for the heading and as the
	/// zero-indent baseline.
	pub min_level: u8,
	pub entries: Vec<TocEntry>,
}

impl TableOfContents {
	/// Build the table of contents for the document. Returns `None` when no
	/// heading is eligible.
	pub fn build<S: AsRef<str>>(lines: &[S], config: &TocConfig) -> Option<Self> {
		let headings = collect_headings(lines, config);
		let min_level = headings.iter().map(|heading| heading.level).min()?;

		Some(Self {
			min_level,
			entries: headings.iter().map(TocEntry::from).collect(),
		})
	}

	/// The heading line, e.g. `## Table of Contents`.
	pub fn heading_line(&self) -> String {
		format!("{} {TOC_TITLE}", "#".repeat(usize::from(self.min_level)))
	}

	/// The rendered list items, one per entry.
	pub fn entry_lines(&self) -> Vec<String> {
		self.entries
			.iter()
			.map(|entry| entry.render(self.min_level))
			.collect()
	}

	/// The complete block: heading, blank line, entries and a trailing blank
	/// line.
	pub fn render(&self) -> String {
		format!(
			"{}\n\n{}\n\n",
			self.heading_line(),
			self.entry_lines().join("\n")
		)
	}
}
