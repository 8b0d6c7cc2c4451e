use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use serde::Serialize;
use tracing::debug;

use crate::TocResult;
use crate::config::ConfigFlag;
use crate::config::TocSettings;
use crate::directives::DEFAULT_CONFIG_COMMENTS;
use crate::directives::TocConfig;
use crate::document::DocumentHost;
use crate::document::LineEdit;
use crate::document::MemoryDocument;
use crate::headings::TableOfContents;
use crate::placer::Placement;
use crate::placer::TocBlock;

/// How an update was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UpdateMode {
	/// Explicitly requested by the user. Runs even when the document has no
	/// `toc:` comments.
	Manual,
	/// Triggered by the host, e.g. before a save. Only runs for documents
	/// that carry `toc:` comments.
	Automatic,
}

/// Why an update made no edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
	/// Another update was already running.
	Reentrant,
	/// Automatic update of a document without `toc:` comments.
	MissingConfig,
	/// No heading is eligible for the table of contents. An existing table
	/// of contents is left untouched.
	NoHeadings,
	/// The host flag that enables this trigger is off.
	Disabled,
}

/// The result of a single update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UpdateOutcome {
	/// A new table of contents was inserted before `line`.
	Inserted { line: usize },
	/// The block at `removed` was deleted and the new table of contents
	/// inserted before `line` of the edited document.
	Replaced { removed: TocBlock, line: usize },
	Skipped(SkipReason),
}

impl UpdateOutcome {
	/// True when edits were applied to the document.
	pub fn is_applied(&self) -> bool {
		!matches!(self, Self::Skipped(_))
	}
}

static GLOBAL_UPDATER: TocUpdater = TocUpdater::new();

/// Runs table of contents updates, at most one at a time.
///
/// A request that arrives while an update is in progress is dropped rather
/// than queued, since an update's own edits can trigger further requests.
#[derive(Debug, Default)]
pub struct TocUpdater {
	busy: AtomicBool,
}

impl TocUpdater {
	pub const fn new() -> Self {
		Self {
			busy: AtomicBool::new(false),
		}
	}

	/// The process-wide updater used by the command line and the language
	/// server.
	pub fn global() -> &'static Self {
		&GLOBAL_UPDATER
	}

	/// True while an update holds the latch.
	pub fn is_busy(&self) -> bool {
		self.busy.load(Ordering::Acquire)
	}

	/// Take the latch. Returns `None` when another update holds it. The latch
	/// is released when the guard is dropped.
	pub fn try_acquire(&self) -> Option<UpdateGuard<'_>> {
		self.busy
			.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
			.ok()
			.map(|_| UpdateGuard { updater: self })
	}

	/// Update the table of contents of the host's document.
	pub fn update<H: DocumentHost + ?Sized>(
		&self,
		host: &mut H,
		mode: UpdateMode,
	) -> TocResult<UpdateOutcome> {
		let Some(guard) = self.try_acquire() else {
			debug!("update already in progress, dropping request");
			return Ok(UpdateOutcome::Skipped(SkipReason::Reentrant));
		};

		guard.update(host, mode)
	}
}

/// Proof that the update latch is held.
///
/// Hosts that apply edits asynchronously keep the guard alive until their
/// edits have landed.
#[derive(Debug)]
pub struct UpdateGuard<'a> {
	updater: &'a TocUpdater,
}

impl UpdateGuard<'_> {
	/// Update the table of contents while holding the latch.
	pub fn update<H: DocumentHost + ?Sized>(
		&self,
		host: &mut H,
		mode: UpdateMode,
	) -> TocResult<UpdateOutcome> {
		update_document(host, mode)
	}
}

impl Drop for UpdateGuard<'_> {
	fn drop(&mut self) {
		self.updater.busy.store(false, Ordering::Release);
	}
}

fn update_document<H: DocumentHost + ?Sized>(
	host: &mut H,
	mode: UpdateMode,
) -> TocResult<UpdateOutcome> {
	let lines = host.read_lines();
	let config = TocConfig::scan(&lines);
	let placement = Placement::resolve(&lines, &config);

	if mode == UpdateMode::Automatic && placement.config_end.is_none() && config.heading().is_none()
	{
		debug!("document has no toc comments, skipping automatic update");
		return Ok(UpdateOutcome::Skipped(SkipReason::MissingConfig));
	}

	let Some(toc) = TableOfContents::build(&lines, &config) else {
		debug!("no eligible headings, skipping update");
		return Ok(UpdateOutcome::Skipped(SkipReason::NoHeadings));
	};

	let old_block = TocBlock::find(&lines);
	if let Some(block) = old_block {
		debug!(
			start = block.start,
			end = block.end,
			lines = block.line_count(),
			"removing existing table of contents"
		);
		host.apply_edit(block.delete_edit())?;
	}

	// The deletion shifts every later line, so placement is resolved again
	// against the edited document.
	let lines = host.read_lines();
	let config = TocConfig::scan(&lines);
	let placement = Placement::resolve(&lines, &config);
	debug!(
		line = placement.line,
		config_end = ?placement.config_end,
		heading_index = ?placement.heading_index,
		entries = toc.entries.len(),
		"inserting table of contents"
	);
	host.apply_edit(LineEdit::insert(placement.line, toc.render()))?;

	Ok(match old_block {
		Some(removed) => {
			UpdateOutcome::Replaced {
				removed,
				line: placement.line,
			}
		}
		None => UpdateOutcome::Inserted {
			line: placement.line,
		},
	})
}

/// Pre-save trigger: runs an automatic update when `auto_update_on_save` is
/// enabled.
pub fn update_on_save<H: DocumentHost + ?Sized>(
	updater: &TocUpdater,
	host: &mut H,
	settings: &TocSettings,
) -> TocResult<UpdateOutcome> {
	if !settings.flag(ConfigFlag::AutoUpdateOnSave) {
		debug!(flag = ConfigFlag::AutoUpdateOnSave.name(), "disabled, skipping update");
		return Ok(UpdateOutcome::Skipped(SkipReason::Disabled));
	}

	updater.update(host, UpdateMode::Automatic)
}

/// Prepend the default `toc:` comments and a blank line to the document.
pub fn insert_default_config<H: DocumentHost + ?Sized>(host: &mut H) -> TocResult<()> {
	host.apply_edit(LineEdit::insert(0, format!("{DEFAULT_CONFIG_COMMENTS}\n")))
}

/// Creation trigger: inserts the default `toc:` comments into a blank
/// document when `insert_config_on_create` is enabled. Returns whether the
/// comments were inserted.
pub fn insert_config_on_create<H: DocumentHost + ?Sized>(
	host: &mut H,
	settings: &TocSettings,
) -> TocResult<bool> {
	if !settings.flag(ConfigFlag::InsertConfigOnCreate) {
		debug!(flag = ConfigFlag::InsertConfigOnCreate.name(), "disabled, skipping config comments");
		return Ok(false);
	}

	if !host.is_blank() {
		return Ok(false);
	}

	insert_default_config(host)?;
	Ok(true)
}

/// Update the table of contents of `text` and return the new text.
///
/// Uses a private latch, so calls never contend with the global updater.
pub fn update_text(text: &str, mode: UpdateMode) -> TocResult<(String, UpdateOutcome)> {
	let updater = TocUpdater::new();
	let mut document = MemoryDocument::new(text);
	let outcome = updater.update(&mut document, mode)?;

	Ok((document.into_text(), outcome))
}
