use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;
use std::process;
use std::sync::mpsc;
use std::time::Duration;

use clap::Parser;
use mdtoc_cli::Commands;
use mdtoc_cli::MdtocCli;
use mdtoc_core::AnyEmptyResult;
use mdtoc_core::AnyResult;
use mdtoc_core::DocumentHost;
use mdtoc_core::MemoryDocument;
use mdtoc_core::TocError;
use mdtoc_core::TocSettings;
use mdtoc_core::TocUpdater;
use mdtoc_core::UpdateMode;
use mdtoc_core::UpdateOutcome;
use mdtoc_core::directives::has_config;
use mdtoc_core::insert_config_on_create;
use mdtoc_core::insert_default_config;
use mdtoc_core::project::collect_markdown_files;
use mdtoc_core::update_on_save;
use owo_colors::OwoColorize;
use similar::ChangeTag;
use similar::TextDiff;
use tracing::debug;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

/// Environment variable holding the log filter, e.g. `MDTOC_LOG=mdtoc_core=trace`.
const LOG_ENV: &str = "MDTOC_LOG";

fn main() {
	let args = MdtocCli::parse();

	// Respect NO_COLOR env var, --no-color flag and terminal support.
	let use_color = !args.no_color
		&& std::env::var_os("NO_COLOR").is_none()
		&& supports_color::on(supports_color::Stream::Stderr).is_some();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	init_tracing(args.verbose, use_color);

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	let result = match &args.command {
		Some(Commands::Update {
			paths,
			auto,
			dry_run,
		}) => run_update(&args, paths, update_mode(*auto), *dry_run),
		Some(Commands::Check { paths, auto, diff }) => {
			run_check(&args, paths, update_mode(*auto), *diff)
		}
		Some(Commands::Init { paths }) => run_init(&args, paths),
		Some(Commands::Watch { paths }) => run_watch(&args, paths),
		Some(Commands::Lsp) => run_lsp(),
		None => {
			eprintln!("No subcommand specified. Run `mdtoc --help` for usage.");
			process::exit(2);
		}
	};

	if let Err(e) = result {
		// Try to render through miette for rich diagnostics with help text
		// and error codes.
		match e.downcast::<TocError>() {
			Ok(toc_err) => {
				let report: miette::Report = (*toc_err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

/// Logs go to stderr so that the language server keeps stdout to itself.
fn init_tracing(verbose: bool, use_color: bool) {
	let filter = if verbose {
		EnvFilter::new("debug")
	} else {
		EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
	};

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.try_init()
		.ok();
}

fn update_mode(auto: bool) -> UpdateMode {
	if auto {
		UpdateMode::Automatic
	} else {
		UpdateMode::Manual
	}
}

fn resolve_root(args: &MdtocCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// A document whose table of contents would change.
struct PendingUpdate {
	path: PathBuf,
	current: String,
	updated: String,
}

/// Run an update for every selected document in memory and return the ones
/// that changed.
fn compute_updates(root: &Path, paths: &[PathBuf], mode: UpdateMode) -> AnyResult<Vec<PendingUpdate>> {
	let settings = TocSettings::load_or_default(root)?;
	let files = collect_markdown_files(root, paths, &settings.exclude)?;
	let mut pending = Vec::new();

	for path in files {
		let current = std::fs::read_to_string(&path)?;
		let mut document = MemoryDocument::new(current.as_str());
		let outcome = TocUpdater::global().update(&mut document, mode)?;
		debug!(path = %path.display(), ?outcome, "computed update");

		if outcome.is_applied() && document.text() != current {
			pending.push(PendingUpdate {
				path,
				current,
				updated: document.into_text(),
			});
		}
	}

	Ok(pending)
}

fn run_update(args: &MdtocCli, paths: &[PathBuf], mode: UpdateMode, dry_run: bool) -> AnyEmptyResult {
	let root = resolve_root(args);
	let updates = compute_updates(&root, paths, mode)?;

	if updates.is_empty() {
		println!("All tables of contents are already up to date.");
		return Ok(());
	}

	if dry_run {
		println!("Dry run: would update {} file(s):", updates.len());
		for update in &updates {
			println!("  {}", make_relative(&update.path, &root));
		}
		return Ok(());
	}

	for update in &updates {
		std::fs::write(&update.path, &update.updated)?;
	}
	println!("Updated {} file(s).", updates.len());

	if args.verbose {
		for update in &updates {
			println!("  {}", make_relative(&update.path, &root));
		}
	}

	Ok(())
}

fn run_check(args: &MdtocCli, paths: &[PathBuf], mode: UpdateMode, show_diff: bool) -> AnyEmptyResult {
	let root = resolve_root(args);
	let updates = compute_updates(&root, paths, mode)?;

	if updates.is_empty() {
		println!("Check passed: all tables of contents are up to date.");
		return Ok(());
	}

	eprintln!("Check failed.");
	eprintln!();
	eprintln!("Out-of-date documents:");
	for update in &updates {
		eprintln!("  {}", make_relative(&update.path, &root));

		if show_diff {
			print_diff(&update.current, &update.updated);
		}
	}

	eprintln!();
	eprintln!(
		"{} document(s) have an out-of-date table of contents. Run `mdtoc update` to fix.",
		updates.len()
	);
	process::exit(1);
}

fn run_init(args: &MdtocCli, paths: &[PathBuf]) -> AnyEmptyResult {
	let root = resolve_root(args);
	let settings = TocSettings::load_or_default(&root)?;
	let files = collect_markdown_files(&root, paths, &settings.exclude)?;
	let mut initialized = Vec::new();

	for path in files {
		let content = std::fs::read_to_string(&path)?;
		let mut document = MemoryDocument::new(content);

		if has_config(&document.read_lines()) {
			debug!(path = %path.display(), "already configured");
			continue;
		}

		insert_default_config(&mut document)?;
		std::fs::write(&path, document.text())?;
		initialized.push(path);
	}

	if initialized.is_empty() {
		println!("All documents already have config comments.");
		return Ok(());
	}

	println!("Added config comments to {} file(s):", initialized.len());
	for path in &initialized {
		println!("  {}", colored!(make_relative(path, &root), green));
	}

	println!();
	println!("Next steps:");
	println!("  1. Set the heading the table of contents should follow:");
	println!("     <!-- toc:insertAfterHeading=Introduction -->");
	println!("  2. Run `mdtoc update` to insert the table of contents");

	Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileChange {
	Created,
	Modified,
}

fn run_watch(args: &MdtocCli, paths: &[PathBuf]) -> AnyEmptyResult {
	let root = resolve_root(args).canonicalize()?;
	let settings = TocSettings::load_or_default(&root)?;
	// Fail early on paths that cannot be watched.
	collect_markdown_files(&root, paths, &settings.exclude)?;

	println!(
		"{} (press Ctrl+C to stop)",
		colored!("Watching for file changes...", bold)
	);

	let (tx, rx) = mpsc::channel();

	let mut watcher =
		notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
			if let Ok(event) = res {
				let change = match event.kind {
					notify::EventKind::Create(_) => FileChange::Created,
					notify::EventKind::Modify(_) => FileChange::Modified,
					_ => return,
				};
				for path in event.paths {
					let _ = tx.send((path, change));
				}
			}
		})?;

	use notify::Watcher;
	watcher.watch(&root, notify::RecursiveMode::Recursive)?;

	loop {
		let mut pending = BTreeMap::new();
		let (path, change) = rx.recv()?;
		pending.insert(path, change);

		// Debounce: drain additional events within 200ms.
		while let Ok((path, change)) = rx.recv_timeout(Duration::from_millis(200)) {
			let entry = pending.entry(path).or_insert(change);
			if change == FileChange::Created {
				*entry = FileChange::Created;
			}
		}

		if let Err(e) = handle_changes(&root, paths, &settings, &pending) {
			eprintln!("{} {e}", colored!("error:", red));
		}
	}
}

/// Apply the creation and save triggers to the changed documents. Our own
/// writes come back as further events and settle once the update is a no-op.
fn handle_changes(
	root: &Path,
	paths: &[PathBuf],
	settings: &TocSettings,
	changes: &BTreeMap<PathBuf, FileChange>,
) -> AnyEmptyResult {
	let watched = collect_markdown_files(root, paths, &settings.exclude)?;

	for (path, change) in changes {
		if !watched.contains(path) {
			continue;
		}

		let current = std::fs::read_to_string(path)?;
		let mut document = MemoryDocument::new(current.as_str());

		if *change == FileChange::Created && insert_config_on_create(&mut document, settings)? {
			println!("Added config comments to {}", make_relative(path, root));
		}

		let outcome = update_on_save(TocUpdater::global(), &mut document, settings)?;
		debug!(
			path = %path.display(),
			?change,
			?outcome,
			edits = document.edits().len(),
			"handled change"
		);

		if document.is_modified() && document.text() != current {
			std::fs::write(path, document.text())?;
			if let UpdateOutcome::Inserted { .. } | UpdateOutcome::Replaced { .. } = outcome {
				println!("Updated {}", make_relative(path, root));
			}
		}
	}

	Ok(())
}

fn run_lsp() -> AnyEmptyResult {
	let rt = tokio::runtime::Runtime::new()?;
	rt.block_on(mdtoc_lsp::run_server());
	Ok(())
}

/// Print a unified diff between two strings, colorized.
fn print_diff(current: &str, expected: &str) {
	let diff = TextDiff::from_lines(current, expected);
	for change in diff.iter_all_changes() {
		match change.tag() {
			ChangeTag::Delete => {
				eprint!("  {}", colored!(format!("-{change}"), red));
			}
			ChangeTag::Insert => {
				eprint!("  {}", colored!(format!("+{change}"), green));
			}
			ChangeTag::Equal => {
				eprint!("   {change}");
			}
		}
	}
}

/// Make a path relative to root for display purposes.
fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.display()
		.to_string()
}
