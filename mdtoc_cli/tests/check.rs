mod common;

use mdtoc_core::AnyEmptyResult;
use rstest::rstest;

const README: &str = "# Readme\n## Usage\n";
const README_WITH_TOC: &str =
	"# Table of Contents\n\n1. [Readme](#readme)\n    1. [Usage](#usage)\n\n# Readme\n## Usage\n";

#[test]
fn check_passes_when_up_to_date() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("readme.md"), README_WITH_TOC)?;

	common::mdtoc_cmd()
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Check passed"));

	Ok(())
}

#[test]
fn check_passes_for_empty_project() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::mdtoc_cmd()
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Check passed"));

	Ok(())
}

#[rstest]
#[case::missing(README)]
#[case::stale_entry("# Table of Contents\n\n1. [Readme](#readme)\n\n# Readme\n## Usage\n")]
#[case::renamed_heading(
	"# Table of Contents\n\n1. [Readme](#readme)\n    1. [Use](#use)\n\n# Readme\n## Usage\n"
)]
fn check_fails_when_stale(#[case] content: &str) -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("readme.md"), content)?;

	common::mdtoc_cmd()
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(1)
		.stderr(predicates::str::contains("Check failed"))
		.stderr(predicates::str::contains("readme.md"))
		.stderr(predicates::str::contains("Run `mdtoc update` to fix."));

	// Check never writes.
	assert_eq!(std::fs::read_to_string(tmp.path().join("readme.md"))?, content);

	Ok(())
}

#[test]
fn check_diff_shows_changes() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("readme.md"), README)?;

	common::mdtoc_cmd()
		.arg("check")
		.arg("--diff")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(1)
		.stderr(predicates::str::contains("+# Table of Contents"))
		.stderr(predicates::str::contains("+    1. [Usage](#usage)"));

	Ok(())
}

#[test]
fn check_auto_ignores_unconfigured_documents() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("readme.md"), README)?;

	common::mdtoc_cmd()
		.arg("check")
		.arg("--auto")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Check passed"));

	Ok(())
}

#[test]
fn check_auto_reports_configured_documents() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("readme.md"),
		"<!-- toc:insertAfterHeading= -->\n# Readme\n",
	)?;

	common::mdtoc_cmd()
		.arg("check")
		.arg("--auto")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(1)
		.stderr(predicates::str::contains("1 document(s)"));

	Ok(())
}

#[test]
fn check_ignores_gitignored_documents() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::create_dir_all(tmp.path().join("build"))?;
	std::fs::write(tmp.path().join(".gitignore"), "build/\n")?;
	std::fs::write(tmp.path().join("build/readme.md"), README)?;
	std::fs::write(tmp.path().join("readme.md"), README_WITH_TOC)?;

	common::mdtoc_cmd()
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	Ok(())
}
