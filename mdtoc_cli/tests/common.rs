use assert_cmd::Command;

pub fn mdtoc_cmd() -> Command {
	let mut cmd = Command::cargo_bin("mdtoc").unwrap_or_else(|e| panic!("mdtoc binary: {e}"));
	cmd.env("NO_COLOR", "1").env_remove("MDTOC_LOG");
	cmd
}
