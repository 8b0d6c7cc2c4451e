//! `mdtoc_core` is the core library for [mdtoc](https://github.com/ifiokjr/mdtoc). It keeps a generated "Table of Contents" block inside a markdown document in sync with the document's headings.
//!
//! ## Update Pipeline
//!
//! ```text
//! Markdown document (lines)
//!   → Directive scan (`<!-- toc:... -->` overrides + leading config block)
//!   → Heading collection (fence aware, self-exclusion, minimum level)
//!   → Old block detection (heading + generated list + trailing blank line)
//!   → Delete old block, re-read, resolve insertion line, insert new block
//! ```
//!
//! ## Modules
//!
//! - [`directives`]: Inline `toc:insertAfterHeading` / `toc:insertAfterHeadingOffset` comments and the leading config block.
//! - [`fence`]: Fenced code block tracking.
//! - [`headings`]: Heading parsing, anchor slugs and rendering of the table of contents.
//! - [`placer`]: Detection of an existing table of contents and insertion line resolution.
//! - [`document`]: The host interface (`DocumentHost`) and an in-memory document.
//! - [`config`]: Host settings loaded from `mdtoc.toml` or sent by an editor.
//! - [`project`]: Markdown file discovery.
//!
//! ## Quick Start
//!
//! ```rust
//! use mdtoc_core::UpdateMode;
//! use mdtoc_core::update_text;
//!
//! let (text, _) = update_text("# Intro\n## Usage\n", UpdateMode::Manual).unwrap();
//! assert!(text.starts_with("# Table of Contents\n\n1. [Intro](#intro)\n    1. [Usage](#usage)\n"));
//! ```

pub use config::*;
pub use directives::DEFAULT_CONFIG_COMMENTS;
pub use directives::TocConfig;
pub use document::*;
pub use engine::*;
pub use error::*;
pub use headings::Heading;
pub use headings::TableOfContents;
pub use headings::TocEntry;
pub use headings::slugify;
pub use placer::Placement;
pub use placer::TocBlock;

pub mod config;
pub mod directives;
pub mod document;
mod engine;
#[allow(unused_assignments)]
mod error;
pub mod fence;
pub mod headings;
pub mod placer;
pub mod project;
