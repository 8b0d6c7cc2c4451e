mod common;

use mdtoc_core::AnyEmptyResult;
use similar_asserts::assert_eq;

const README: &str = "# Readme\n## Usage\n";
const README_WITH_TOC: &str =
	"# Table of Contents\n\n1. [Readme](#readme)\n    1. [Usage](#usage)\n\n# Readme\n## Usage\n";

#[test]
fn update_inserts_table_of_contents() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("readme.md"), README)?;

	common::mdtoc_cmd()
		.arg("update")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Updated 1 file(s)."));

	let content = std::fs::read_to_string(tmp.path().join("readme.md"))?;
	assert_eq!(content, README_WITH_TOC);

	Ok(())
}

#[test]
fn update_help_describes_manual_walk() {
	common::mdtoc_cmd()
		.arg("update")
		.arg("--help")
		.assert()
		.success()
		.stdout(predicates::str::contains("manual mode"))
		.stdout(predicates::str::contains(
			"including documents without `toc:` config comments",
		));
}

#[test]
fn update_noop_when_in_sync() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("readme.md"), README_WITH_TOC)?;

	common::mdtoc_cmd()
		.arg("update")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("already up to date"));

	let content = std::fs::read_to_string(tmp.path().join("readme.md"))?;
	assert_eq!(content, README_WITH_TOC);

	Ok(())
}

#[test]
fn update_refreshes_renamed_heading() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("readme.md"),
		README_WITH_TOC.replace("## Usage", "## Getting Started"),
	)?;

	common::mdtoc_cmd()
		.arg("update")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	let content = std::fs::read_to_string(tmp.path().join("readme.md"))?;
	assert_eq!(
		content,
		"# Table of Contents\n\n1. [Readme](#readme)\n    1. [Getting \
		 Started](#getting-started)\n\n# Readme\n## Getting Started\n"
	);

	Ok(())
}

#[test]
fn update_dry_run_does_not_write() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("readme.md"), README)?;

	common::mdtoc_cmd()
		.arg("update")
		.arg("--dry-run")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Dry run: would update 1 file(s)"))
		.stdout(predicates::str::contains("readme.md"));

	let content = std::fs::read_to_string(tmp.path().join("readme.md"))?;
	assert_eq!(content, README);

	Ok(())
}

#[test]
fn update_auto_only_touches_configured_documents() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let configured = "<!-- toc:insertAfterHeading=Readme -->\n# Readme\n## Usage\n";
	std::fs::write(tmp.path().join("plain.md"), README)?;
	std::fs::write(tmp.path().join("configured.md"), configured)?;

	common::mdtoc_cmd()
		.arg("update")
		.arg("--auto")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Updated 1 file(s)."));

	assert_eq!(std::fs::read_to_string(tmp.path().join("plain.md"))?, README);
	assert_eq!(
		std::fs::read_to_string(tmp.path().join("configured.md"))?,
		"<!-- toc:insertAfterHeading=Readme -->\n# Readme\n## Table of Contents\n\n1. \
		 [Usage](#usage)\n\n## Usage\n"
	);

	Ok(())
}

#[test]
fn update_explicit_paths() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::create_dir_all(tmp.path().join("docs"))?;
	std::fs::write(tmp.path().join("readme.md"), README)?;
	std::fs::write(tmp.path().join("docs/guide.md"), README)?;

	common::mdtoc_cmd()
		.arg("update")
		.arg("docs")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Updated 1 file(s)."));

	assert_eq!(std::fs::read_to_string(tmp.path().join("readme.md"))?, README);
	assert_eq!(
		std::fs::read_to_string(tmp.path().join("docs/guide.md"))?,
		README_WITH_TOC
	);

	Ok(())
}

#[test]
fn update_leaves_documents_without_headings() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let content = "<!-- toc:insertAfterHeading=Intro -->\nJust some prose.\n";
	std::fs::write(tmp.path().join("notes.md"), content)?;

	common::mdtoc_cmd()
		.arg("update")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("already up to date"));

	assert_eq!(std::fs::read_to_string(tmp.path().join("notes.md"))?, content);

	Ok(())
}

#[test]
fn update_rejects_non_markdown_file() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("notes.txt"), "# Notes\n")?;

	common::mdtoc_cmd()
		.arg("update")
		.arg("notes.txt")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("not a markdown document"));

	assert_eq!(
		std::fs::read_to_string(tmp.path().join("notes.txt"))?,
		"# Notes\n"
	);

	Ok(())
}

#[test]
fn update_rejects_missing_file() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::mdtoc_cmd()
		.arg("update")
		.arg("missing.md")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("no active markdown document"));

	Ok(())
}

#[test]
fn update_preserves_crlf() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("readme.md"), "# Readme\r\n## Usage\r\n")?;

	common::mdtoc_cmd()
		.arg("update")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	let content = std::fs::read_to_string(tmp.path().join("readme.md"))?;
	assert_eq!(content, README_WITH_TOC.replace('\n', "\r\n"));

	Ok(())
}

#[test]
fn no_subcommand_exits_with_error() {
	common::mdtoc_cmd()
		.assert()
		.code(2)
		.stderr(predicates::str::contains("No subcommand specified"));
}
