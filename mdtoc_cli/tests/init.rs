mod common;

use mdtoc_core::AnyEmptyResult;
use mdtoc_core::DEFAULT_CONFIG_COMMENTS;
use similar_asserts::assert_eq;

#[test]
fn init_adds_config_comments() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("readme.md"), "# Readme\n")?;

	common::mdtoc_cmd()
		.arg("init")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Added config comments to 1 file(s)"))
		.stdout(predicates::str::contains("readme.md"))
		.stdout(predicates::str::contains("Next steps:"));

	let content = std::fs::read_to_string(tmp.path().join("readme.md"))?;
	assert_eq!(
		content,
		"<!-- toc:insertAfterHeading= -->\n<!-- toc:insertAfterHeadingOffset=0 -->\n\n# Readme\n"
	);

	Ok(())
}

#[test]
fn init_skips_configured_documents() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let configured = "# Readme\n<!-- toc:insertAfterHeading=Readme -->\n";
	std::fs::write(tmp.path().join("readme.md"), configured)?;

	common::mdtoc_cmd()
		.arg("init")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("already have config comments"));

	assert_eq!(
		std::fs::read_to_string(tmp.path().join("readme.md"))?,
		configured
	);

	Ok(())
}

#[test]
fn init_is_idempotent() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("readme.md"), "")?;

	common::mdtoc_cmd()
		.arg("init")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	common::mdtoc_cmd()
		.arg("init")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("already have config comments"));

	let content = std::fs::read_to_string(tmp.path().join("readme.md"))?;
	assert_eq!(content, format!("{DEFAULT_CONFIG_COMMENTS}\n"));

	Ok(())
}

#[test]
fn init_then_auto_update_inserts_after_config() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("readme.md"), "# Readme\n")?;

	common::mdtoc_cmd()
		.arg("init")
		.arg("readme.md")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	common::mdtoc_cmd()
		.arg("update")
		.arg("--auto")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Updated 1 file(s)."));

	let content = std::fs::read_to_string(tmp.path().join("readme.md"))?;
	assert_eq!(
		content,
		"<!-- toc:insertAfterHeading= -->\n<!-- toc:insertAfterHeadingOffset=0 -->\n# Table of \
		 Contents\n\n1. [Readme](#readme)\n\n\n# Readme\n"
	);

	Ok(())
}
