use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Keep the table of contents of your markdown documents up to date.",
	long_about = "mdtoc generates a numbered \"Table of Contents\" from the headings of a markdown \
	              document and keeps it in sync as the document changes.\n\nPlacement is \
	              controlled by comments inside the document:\n  <!-- \
	              toc:insertAfterHeading=Introduction -->\n  <!-- \
	              toc:insertAfterHeadingOffset=0 -->\n\nQuick start:\n  mdtoc init    Add the \
	              config comments to your documents\n  mdtoc update  Insert or refresh every \
	              table of contents\n  mdtoc check   Verify everything is up to date"
)]
pub struct MdtocCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the project root directory.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Insert or refresh the table of contents of markdown documents.
	///
	/// Every markdown document under the project root is updated, or only the
	/// given files and directories. Documents without eligible headings are
	/// left untouched.
	///
	/// Without `--auto` this runs in manual mode: every document with headings
	/// gets a table of contents, including documents without `toc:` config
	/// comments. Pass `--auto` or explicit paths to limit the update.
	///
	/// Use `--dry-run` to preview which files would change without writing
	/// to disk.
	Update {
		/// Files or directories to update, relative to the project root.
		/// Defaults to the whole project.
		paths: Vec<PathBuf>,

		/// Only update documents that carry `toc:` config comments, the way
		/// the on-save trigger does.
		#[arg(long, default_value_t = false)]
		auto: bool,

		/// Preview changes without writing files.
		#[arg(long, default_value_t = false)]
		dry_run: bool,
	},
	/// Check that every table of contents is up to date.
	///
	/// Exits with a non-zero status code when an update would change any
	/// document. Ideal for CI pipelines. Use `--diff` to see exactly what
	/// would change.
	Check {
		/// Files or directories to check, relative to the project root.
		/// Defaults to the whole project.
		paths: Vec<PathBuf>,

		/// Only check documents that carry `toc:` config comments.
		#[arg(long, default_value_t = false)]
		auto: bool,

		/// Show a diff of each out-of-date document.
		#[arg(long, default_value_t = false)]
		diff: bool,
	},
	/// Add the default `toc:` config comments to markdown documents.
	///
	/// The comments are prepended to each document followed by a blank line.
	/// Documents that already carry config comments are skipped.
	Init {
		/// Files or directories to initialize, relative to the project root.
		/// Defaults to the whole project.
		paths: Vec<PathBuf>,
	},
	/// Watch for file changes and keep tables of contents up to date.
	///
	/// Modified documents are updated when `auto_update_on_save` is enabled
	/// in `mdtoc.toml`, and newly created empty documents receive the config
	/// comments when `insert_config_on_create` is enabled.
	Watch {
		/// Files or directories to watch, relative to the project root.
		/// Defaults to the whole project.
		paths: Vec<PathBuf>,
	},
	/// Start the mdtoc language server (LSP).
	///
	/// Communicates over stdin/stdout using the Language Server Protocol.
	/// Configure your editor to run `mdtoc lsp` as the language server
	/// command for markdown files.
	///
	/// Updates the table of contents before each save and provides the
	/// `markdownToc.insertTOC` and `markdownToc.insertTOCConfig` commands.
	Lsp,
}
