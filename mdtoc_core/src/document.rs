use crate::TocError;
use crate::TocResult;

/// A line-addressed change to a document. Lines are 0-indexed.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LineEdit {
	/// Insert `text` at `column` (in characters) of `line`.
	Insert {
		line: usize,
		column: usize,
		text: String,
	},
	/// Remove the lines `start_line..end_line` including the trailing line
	/// break of the last one.
	Delete { start_line: usize, end_line: usize },
}

impl LineEdit {
	pub fn insert(line: usize, text: impl Into<String>) -> Self {
		Self::Insert {
			line,
			column: 0,
			text: text.into(),
		}
	}
}

/// The editor-side collaborator that owns a document.
///
/// Every update reads the document, then applies at most two edits. An
/// implementation must make an applied edit visible to the next
/// [`read_lines`](DocumentHost::read_lines) call before returning.
pub trait DocumentHost {
	/// The current content split into lines. See [`split_lines`].
	fn read_lines(&self) -> Vec<String>;

	/// Apply a single edit to the document.
	fn apply_edit(&mut self, edit: LineEdit) -> TocResult<()>;

	/// True when the document holds nothing but whitespace.
	fn is_blank(&self) -> bool {
		self.read_lines().iter().all(|line| line.trim().is_empty())
	}
}

/// Split text into lines on `\n` and `\r\n`.
///
/// A trailing line break produces a final empty line, so the number of lines
/// is always the number of line breaks plus one.
pub fn split_lines(text: &str) -> Vec<String> {
	let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();
	let last = lines.len() - 1;

	for line in &mut lines[..last] {
		if line.ends_with('\r') {
			line.pop();
		}
	}

	lines
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineEnding {
	#[default]
	Lf,
	CrLf,
}

impl LineEnding {
	/// `CrLf` as soon as the text contains a single `\r\n`.
	pub fn detect(text: &str) -> Self {
		if text.contains("\r\n") {
			Self::CrLf
		} else {
			Self::Lf
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Lf => "\n",
			Self::CrLf => "\r\n",
		}
	}

	/// Rewrite every line break in `text` to this line ending.
	pub fn normalize(self, text: &str) -> String {
		let text = text.replace("\r\n", "\n");
		match self {
			Self::Lf => text,
			Self::CrLf => text.replace('\n', "\r\n"),
		}
	}
}

/// An in-memory document. Used by the command line, the language server and
/// in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
	text: String,
	line_ending: LineEnding,
	edits: Vec<LineEdit>,
}

impl MemoryDocument {
	pub fn new(text: impl Into<String>) -> Self {
		let text = text.into();
		let line_ending = LineEnding::detect(&text);

		Self {
			text,
			line_ending,
			edits: Vec::new(),
		}
	}

	pub fn text(&self) -> &str {
		&self.text
	}

	pub fn into_text(self) -> String {
		self.text
	}

	#[cfg(test)]
	pub(crate) fn line_ending(&self) -> LineEnding {
		self.line_ending
	}

	/// Every edit applied so far, in order.
	pub fn edits(&self) -> &[LineEdit] {
		&self.edits
	}

	/// True once at least one edit has been applied.
	pub fn is_modified(&self) -> bool {
		!self.edits.is_empty()
	}

	pub fn line_count(&self) -> usize {
		self.text.matches('\n').count() + 1
	}

	/// Byte offset of the start of `line`. `None` past the last line.
	fn line_start(&self, line: usize) -> Option<usize> {
		if line == 0 {
			return Some(0);
		}

		self.text
			.match_indices('\n')
			.nth(line - 1)
			.map(|(index, _)| index + 1)
	}

	/// Byte offset of `column` characters into `line`, clamped to the end of
	/// the line's content.
	fn column_offset(&self, line_start: usize, column: usize) -> usize {
		let rest = &self.text[line_start..];
		let content = rest.find('\n').map_or(rest, |end| &rest[..end]);
		let content = content.strip_suffix('\r').unwrap_or(content);

		line_start
			+ content
				.char_indices()
				.nth(column)
				.map_or(content.len(), |(index, _)| index)
	}

	fn insert(&mut self, line: usize, column: usize, text: &str) -> TocResult<()> {
		let line_count = self.line_count();
		let text = self.line_ending.normalize(text);

		if line > line_count {
			return Err(TocError::InvalidEdit { line, line_count });
		}

		match self.line_start(line) {
			Some(start) => {
				let offset = self.column_offset(start, column);
				self.text.insert_str(offset, &text);
			}
			None => {
				// Past the last line: append, keeping the inserted text on a
				// line of its own.
				if !self.text.is_empty() && !self.text.ends_with('\n') {
					self.text.push_str(self.line_ending.as_str());
				}
				self.text.push_str(&text);
			}
		}

		Ok(())
	}

	fn delete(&mut self, start_line: usize, end_line: usize) -> TocResult<()> {
		let line_count = self.line_count();
		let Some(start) = self.line_start(start_line) else {
			return Err(TocError::InvalidEdit {
				line: start_line,
				line_count,
			});
		};

		if end_line < start_line {
			return Err(TocError::InvalidEdit {
				line: end_line,
				line_count,
			});
		}

		let end = self.line_start(end_line).unwrap_or(self.text.len());
		self.text.replace_range(start..end, "");

		Ok(())
	}
}

impl DocumentHost for MemoryDocument {
	fn read_lines(&self) -> Vec<String> {
		split_lines(&self.text)
	}

	fn apply_edit(&mut self, edit: LineEdit) -> TocResult<()> {
		match &edit {
			LineEdit::Insert { line, column, text } => self.insert(*line, *column, text)?,
			LineEdit::Delete {
				start_line,
				end_line,
			} => self.delete(*start_line, *end_line)?,
		}

		self.edits.push(edit);
		Ok(())
	}

	fn is_blank(&self) -> bool {
		self.text.trim().is_empty()
	}
}

impl From<&str> for MemoryDocument {
	fn from(text: &str) -> Self {
		Self::new(text)
	}
}

impl From<String> for MemoryDocument {
	fn from(text: String) -> Self {
		Self::new(text)
	}
}
