use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum TocError {
	#[error(transparent)]
	#[diagnostic(code(mdtoc::io_error))]
	Io(#[from] std::io::Error),

	#[error("no active markdown document found")]
	#[diagnostic(
		code(mdtoc::no_active_document),
		help("open a markdown document or pass the path of an existing `.md` file")
	)]
	NoActiveDocument,

	#[error("not a markdown document: `{path}`")]
	#[diagnostic(
		code(mdtoc::not_markdown),
		help("only `.md`, `.markdown` and `.mdx` files carry a table of contents")
	)]
	NotMarkdown { path: String },

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(mdtoc::config_parse),
		help("check that mdtoc.toml is valid TOML and its flags are booleans")
	)]
	ConfigParse(String),

	#[error("edit at line {line} is outside the document ({line_count} line(s))")]
	#[diagnostic(code(mdtoc::invalid_edit))]
	InvalidEdit { line: usize, line_count: usize },
}

pub type TocResult<T> = Result<T, TocError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
