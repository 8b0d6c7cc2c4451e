use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;

use ignore::gitignore::Gitignore;
use ignore::gitignore::GitignoreBuilder;
use tracing::debug;
use tracing::warn;

use crate::TocError;
use crate::TocResult;

/// File extensions treated as markdown documents.
pub const MARKDOWN_EXTENSIONS: [&str; 3] = ["md", "markdown", "mdx"];

/// Check if a path names a markdown document, by extension.
pub fn is_markdown_path(path: &Path) -> bool {
	path.extension()
		.and_then(|ext| ext.to_str())
		.is_some_and(|ext| {
			MARKDOWN_EXTENSIONS
				.iter()
				.any(|candidate| ext.eq_ignore_ascii_case(candidate))
		})
}

/// Collect the markdown documents named by `paths`, relative to `root`.
///
/// Files are taken as given and must exist and be markdown. Directories are walked
/// recursively, honoring the root `.gitignore` and the gitignore-style
/// `exclude` patterns. When `paths` is empty the whole of `root` is walked.
/// The result is sorted and free of duplicates.
pub fn collect_markdown_files(
	root: &Path,
	paths: &[PathBuf],
	exclude: &[String],
) -> TocResult<Vec<PathBuf>> {
	let rules = build_ignore_rules(root, exclude)?;
	let mut files = Vec::new();
	let mut visited_dirs = HashSet::new();

	let targets = if paths.is_empty() {
		vec![root.to_path_buf()]
	} else {
		paths.iter().map(|path| root.join(path)).collect()
	};

	for target in targets {
		if target.is_dir() {
			walk_dir(&target, &mut files, &rules, &mut visited_dirs)?;
		} else if !target.is_file() {
			debug!(path = %target.display(), "path does not exist");
			return Err(TocError::NoActiveDocument);
		} else if is_markdown_path(&target) {
			files.push(target);
		} else {
			return Err(TocError::NotMarkdown {
				path: target.display().to_string(),
			});
		}
	}

	files.sort();
	files.dedup();
	debug!(count = files.len(), "collected markdown files");

	Ok(files)
}

/// Build the ignore rules for a walk: the root `.gitignore` followed by the
/// `exclude` patterns from `mdtoc.toml`.
///
/// Later patterns win, so `!path` in `exclude` re-includes a gitignored path.
/// An unreadable `.gitignore` is skipped with a warning. An invalid `exclude`
/// pattern is a config error.
fn build_ignore_rules(root: &Path, exclude: &[String]) -> TocResult<Gitignore> {
	let mut builder = GitignoreBuilder::new(root);

	let gitignore_path = root.join(".gitignore");
	if gitignore_path.is_file() {
		if let Some(error) = builder.add(&gitignore_path) {
			warn!(path = %gitignore_path.display(), %error, "skipping invalid .gitignore rules");
		}
	}

	for pattern in exclude {
		builder.add_line(None, pattern).map_err(|e| {
			TocError::ConfigParse(format!("invalid exclude pattern `{pattern}`: {e}"))
		})?;
	}

	builder
		.build()
		.map_err(|e| TocError::ConfigParse(format!("failed to build ignore rules: {e}")))
}

fn is_ignored_directory_name(name: &str) -> bool {
	name.starts_with('.') || name == "node_modules" || name == "target"
}

fn walk_dir(
	dir: &Path,
	files: &mut Vec<PathBuf>,
	rules: &Gitignore,
	visited_dirs: &mut HashSet<PathBuf>,
) -> TocResult<()> {
	// Symlinked directories may point back up the tree.
	let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
	if !visited_dirs.insert(canonical) {
		return Ok(());
	}

	for entry in std::fs::read_dir(dir)? {
		let path = entry?.path();

		let is_dir = path.is_dir();
		if is_dir
			&& path
				.file_name()
				.and_then(|name| name.to_str())
				.is_some_and(is_ignored_directory_name)
		{
			continue;
		}

		if rules.matched(&path, is_dir).is_ignore() {
			continue;
		}

		if is_dir {
			walk_dir(&path, files, rules, visited_dirs)?;
		} else if is_markdown_path(&path) {
			files.push(path);
		}
	}

	Ok(())
}
