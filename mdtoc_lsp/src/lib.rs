//! Language server for [mdtoc](https://github.com/ifiokjr/mdtoc).
//!
//! The server keeps the table of contents of markdown documents up to date
//! from inside the editor:
//!
//! - `textDocument/willSaveWaitUntil` refreshes the table of contents of
//!   documents that carry `toc:` comments, when `autoUpdateOnSave` is set.
//! - `workspace/executeCommand` provides `markdownToc.insertTOC` and
//!   `markdownToc.insertTOCConfig`. Both take the document URI as their only
//!   argument.
//! - New empty markdown documents receive the default `toc:` comments when
//!   `insertConfigOnCreate` is set.
//!
//! Settings are read from `initializationOptions` and
//! `workspace/didChangeConfiguration`, optionally nested under `markdownToc`.
//! Without them the server falls back to `mdtoc.toml` in the workspace root.

use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

use mdtoc_core::MemoryDocument;
use mdtoc_core::TocResult;
use mdtoc_core::TocSettings;
use mdtoc_core::TocUpdater;
use mdtoc_core::UpdateGuard;
use mdtoc_core::UpdateMode;
use mdtoc_core::insert_config_on_create;
use mdtoc_core::insert_default_config;
use mdtoc_core::project::is_markdown_path;
use mdtoc_core::update_on_save;
use serde_json::Value;
use tokio::sync::RwLock;
use tower_lsp_server::Client;
use tower_lsp_server::LanguageServer;
use tower_lsp_server::jsonrpc;
use tower_lsp_server::jsonrpc::Result as LspResult;
use tower_lsp_server::ls_types::*;
use tracing::debug;
use tracing::warn;

/// Insert or refresh the table of contents, even without `toc:` comments.
pub const INSERT_TOC_COMMAND: &str = "markdownToc.insertTOC";
/// Prepend the default `toc:` comments.
pub const INSERT_CONFIG_COMMAND: &str = "markdownToc.insertTOCConfig";
/// Shown when a command targets a document that is not an open markdown
/// document.
pub const NO_ACTIVE_EDITOR_MESSAGE: &str = "No active Markdown editor found.";

const MARKDOWN_LANGUAGE_ID: &str = "markdown";
const UNTITLED_SCHEME: &str = "untitled:";

/// State for a single open document.
#[derive(Debug, Clone)]
struct DocumentState {
	/// The full text content of the document.
	content: String,
	/// Language identifier reported by the client.
	language_id: String,
}

/// Workspace-level state shared across all LSP requests.
#[derive(Debug, Default)]
struct WorkspaceState {
	/// The workspace root path.
	root: Option<PathBuf>,
	/// Open documents keyed by URI.
	documents: HashMap<Uri, DocumentState>,
	/// Flags controlling the automatic triggers.
	settings: TocSettings,
}

impl WorkspaceState {
	/// The open document at `uri`, when it is a markdown document.
	fn markdown_document(&self, uri: &Uri) -> Option<&DocumentState> {
		self.documents
			.get(uri)
			.filter(|document| is_markdown_document(uri, &document.language_id))
	}

	/// Replace the settings with those sent by the client. `None` reloads
	/// them from the config file in the workspace root.
	fn configure(&mut self, options: Option<&Value>) {
		self.settings = resolve_settings(self.root.as_deref(), options);
		debug!(settings = ?self.settings, "settings updated");
	}
}

fn resolve_settings(root: Option<&Path>, options: Option<&Value>) -> TocSettings {
	let result = match (options, root) {
		(Some(options), _) if !options.is_null() => TocSettings::from_json(options),
		(_, Some(root)) => TocSettings::load_or_default(root),
		_ => Ok(TocSettings::default()),
	};

	result.unwrap_or_else(|e| {
		warn!(error = %e, "invalid settings, using defaults");
		TocSettings::default()
	})
}

/// True for documents the client reports as markdown or whose path has a
/// markdown extension.
fn is_markdown_document(uri: &Uri, language_id: &str) -> bool {
	language_id.eq_ignore_ascii_case(MARKDOWN_LANGUAGE_ID)
		|| is_markdown_path(Path::new(uri.path().as_str()))
}

/// True for unsaved buffers the client has not written to disk yet.
fn is_untitled(uri: &Uri) -> bool {
	uri.as_str().starts_with(UNTITLED_SCHEME)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TocCommand {
	InsertToc,
	InsertConfig,
}

impl TocCommand {
	fn from_name(name: &str) -> Option<Self> {
		match name {
			INSERT_TOC_COMMAND => Some(Self::InsertToc),
			INSERT_CONFIG_COMMAND => Some(Self::InsertConfig),
			_ => None,
		}
	}
}

/// The document URI passed as the first command argument.
fn command_uri(arguments: &[Value]) -> Option<Uri> {
	arguments.first()?.as_str()?.parse::<Uri>().ok()
}

/// Convert an LSP `Position` (0-indexed line, character in UTF-16 code units)
/// to a byte offset within `content`. Returns `None` if the position is out of
/// bounds.
fn lsp_position_to_offset(content: &str, position: Position) -> Option<usize> {
	let mut offset = 0;
	for (i, line) in content.split('\n').enumerate() {
		if i == position.line as usize {
			// LSP character offsets are in UTF-16 code units, so we need to
			// walk the line converting from UTF-16 units to byte indices.
			let mut utf16_offset = 0u32;
			for (byte_idx, c) in line.char_indices() {
				if utf16_offset == position.character {
					return Some(offset + byte_idx);
				}
				utf16_offset += c.len_utf16() as u32;
			}
			// Position at end of line (past last character).
			if utf16_offset == position.character {
				return Some(offset + line.len());
			}
			return None;
		}
		offset += line.len() + 1; // +1 for '\n'
	}
	None
}

/// Apply the changes of a `textDocument/didChange` notification in order.
/// Each ranged change is relative to the result of the previous one. Changes
/// without a range replace the whole content.
fn apply_content_changes(mut content: String, changes: Vec<TextDocumentContentChangeEvent>) -> String {
	for change in changes {
		if let Some(range) = change.range {
			let start = lsp_position_to_offset(&content, range.start);
			let end = lsp_position_to_offset(&content, range.end);
			if let (Some(start), Some(end)) = (start, end) {
				content.replace_range(start..end, &change.text);
			}
		} else {
			content = change.text;
		}
	}

	content
}

/// The range spanning all of `content`.
fn full_document_range(content: &str) -> Range {
	let line_count = content.matches('\n').count();
	let last_line = content.rsplit('\n').next().unwrap_or_default();

	Range {
		start: Position::new(0, 0),
		end: Position::new(
			u32::try_from(line_count).unwrap_or(u32::MAX),
			u32::try_from(last_line.encode_utf16().count()).unwrap_or(u32::MAX),
		),
	}
}

/// A single edit that turns `original` into `updated`, or `None` when they
/// are equal.
fn replace_document_edit(original: &str, updated: String) -> Option<TextEdit> {
	(original != updated).then(|| TextEdit::new(full_document_range(original), updated))
}

/// The edits to apply before `uri` is saved.
fn compute_save_edits(
	state: &WorkspaceState,
	uri: &Uri,
	updater: &TocUpdater,
) -> TocResult<Option<Vec<TextEdit>>> {
	let Some(document) = state.markdown_document(uri) else {
		return Ok(None);
	};

	let mut memory = MemoryDocument::new(document.content.as_str());
	let outcome = update_on_save(updater, &mut memory, &state.settings)?;
	debug!(uri = uri.as_str(), ?outcome, "will save");

	Ok(replace_document_edit(&document.content, memory.into_text()).map(|edit| vec![edit]))
}

/// The edit produced by running `command` against `document`.
fn compute_command_edit(
	guard: &UpdateGuard<'_>,
	document: &DocumentState,
	command: TocCommand,
) -> TocResult<Option<TextEdit>> {
	let mut memory = MemoryDocument::new(document.content.as_str());

	match command {
		TocCommand::InsertToc => {
			let outcome = guard.update(&mut memory, UpdateMode::Manual)?;
			debug!(?outcome, "insert table of contents");
		}
		TocCommand::InsertConfig => insert_default_config(&mut memory)?,
	}

	Ok(replace_document_edit(&document.content, memory.into_text()))
}

/// The edit inserting the default config into a newly created document.
fn compute_create_edit(content: &str, settings: &TocSettings) -> TocResult<Option<TextEdit>> {
	let mut memory = MemoryDocument::new(content);

	if !insert_config_on_create(&mut memory, settings)? {
		return Ok(None);
	}

	Ok(replace_document_edit(content, memory.into_text()))
}

/// The create edit for a file that appeared on disk. The file is read first,
/// so the edit is always computed against its real content.
fn compute_created_file_edit(path: &Path, settings: &TocSettings) -> TocResult<Option<TextEdit>> {
	let content = std::fs::read_to_string(path)?;
	compute_create_edit(&content, settings)
}

/// The mdtoc language server.
#[derive(Debug)]
pub struct MdtocLanguageServer {
	client: Client,
	state: RwLock<WorkspaceState>,
}

impl MdtocLanguageServer {
	pub fn new(client: Client) -> Self {
		Self {
			client,
			state: RwLock::new(WorkspaceState::default()),
		}
	}

	/// Ask the client to apply `edit` to `uri` and wait for the answer.
	async fn apply_edit(&self, uri: Uri, edit: TextEdit) {
		let workspace_edit = WorkspaceEdit {
			changes: Some(HashMap::from([(uri, vec![edit])])),
			..WorkspaceEdit::default()
		};

		match self.client.apply_edit(workspace_edit).await {
			Ok(response) if !response.applied => {
				warn!(reason = ?response.failure_reason, "client rejected edit");
			}
			Ok(_) => {}
			Err(e) => warn!(error = %e, "failed to apply edit"),
		}
	}

	async fn show_error(&self, message: impl std::fmt::Display) {
		self.client.show_message(MessageType::ERROR, message).await;
	}
}

impl LanguageServer for MdtocLanguageServer {
	async fn initialize(&self, params: InitializeParams) -> LspResult<InitializeResult> {
		// Determine workspace root. Prefer `workspace_folders` (modern LSP),
		// fall back to the deprecated `root_uri` for older clients.
		let root = params
			.workspace_folders
			.as_ref()
			.and_then(|folders| folders.first())
			.and_then(|folder| folder.uri.to_file_path().map(std::borrow::Cow::into_owned))
			.or_else(|| {
				#[allow(deprecated)]
				params
					.root_uri
					.as_ref()
					.and_then(|uri| uri.to_file_path().map(std::borrow::Cow::into_owned))
			});

		{
			let mut state = self.state.write().await;
			state.root = root;
			state.configure(params.initialization_options.as_ref());
		}

		let markdown_files = FileOperationRegistrationOptions {
			filters: vec![FileOperationFilter {
				scheme: Some("file".to_string()),
				pattern: FileOperationPattern {
					glob: "**/*.{md,markdown,mdx}".to_string(),
					matches: Some(FileOperationPatternKind::File),
					options: None,
				},
			}],
		};

		Ok(InitializeResult {
			capabilities: ServerCapabilities {
				text_document_sync: Some(TextDocumentSyncCapability::Options(
					TextDocumentSyncOptions {
						open_close: Some(true),
						change: Some(TextDocumentSyncKind::INCREMENTAL),
						will_save_wait_until: Some(true),
						..Default::default()
					},
				)),
				execute_command_provider: Some(ExecuteCommandOptions {
					commands: vec![
						INSERT_TOC_COMMAND.to_string(),
						INSERT_CONFIG_COMMAND.to_string(),
					],
					..Default::default()
				}),
				workspace: Some(WorkspaceServerCapabilities {
					file_operations: Some(WorkspaceFileOperationsServerCapabilities {
						did_create: Some(markdown_files),
						..Default::default()
					}),
					..Default::default()
				}),
				..Default::default()
			},
			server_info: Some(ServerInfo {
				name: "mdtoc-lsp".to_string(),
				version: Some(env!("CARGO_PKG_VERSION").to_string()),
			}),
			offset_encoding: None,
		})
	}

	async fn initialized(&self, _: InitializedParams) {
		self.client
			.log_message(MessageType::INFO, "mdtoc language server initialized")
			.await;
	}

	async fn shutdown(&self) -> LspResult<()> {
		Ok(())
	}

	async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
		let mut state = self.state.write().await;
		state.configure(Some(&params.settings));
	}

	async fn did_open(&self, params: DidOpenTextDocumentParams) {
		let uri = params.text_document.uri;
		let document = DocumentState {
			content: params.text_document.text,
			language_id: params.text_document.language_id,
		};

		let edit = {
			let mut state = self.state.write().await;
			let edit = if is_untitled(&uri) && is_markdown_document(&uri, &document.language_id) {
				compute_create_edit(&document.content, &state.settings)
			} else {
				Ok(None)
			};
			state.documents.insert(uri.clone(), document);
			edit
		};

		match edit {
			Ok(Some(edit)) => self.apply_edit(uri, edit).await,
			Ok(None) => {}
			Err(e) => warn!(error = %e, "failed to insert config"),
		}
	}

	async fn did_change(&self, params: DidChangeTextDocumentParams) {
		let uri = params.text_document.uri;
		let mut state = self.state.write().await;

		match state.documents.get_mut(&uri) {
			Some(document) => {
				let content = std::mem::take(&mut document.content);
				document.content = apply_content_changes(content, params.content_changes);
			}
			None => {
				// Document not tracked yet, use the last change as full content.
				if let Some(change) = params.content_changes.into_iter().next_back() {
					let language_id = String::new();
					state.documents.insert(
						uri,
						DocumentState {
							content: change.text,
							language_id,
						},
					);
				}
			}
		}
	}

	async fn did_close(&self, params: DidCloseTextDocumentParams) {
		let mut state = self.state.write().await;
		state.documents.remove(&params.text_document.uri);
	}

	async fn will_save_wait_until(
		&self,
		params: WillSaveTextDocumentParams,
	) -> LspResult<Option<Vec<TextEdit>>> {
		let state = self.state.read().await;

		match compute_save_edits(&state, &params.text_document.uri, TocUpdater::global()) {
			Ok(edits) => Ok(edits),
			Err(e) => {
				warn!(error = %e, "failed to update table of contents before save");
				Ok(None)
			}
		}
	}

	async fn execute_command(&self, params: ExecuteCommandParams) -> LspResult<Option<LSPAny>> {
		let Some(command) = TocCommand::from_name(&params.command) else {
			return Err(jsonrpc::Error::invalid_params(format!(
				"unknown command `{}`",
				params.command
			)));
		};

		let target = match command_uri(&params.arguments) {
			Some(uri) => {
				let state = self.state.read().await;
				state
					.markdown_document(&uri)
					.cloned()
					.map(|document| (uri, document))
			}
			None => None,
		};

		let Some((uri, document)) = target else {
			self.show_error(NO_ACTIVE_EDITOR_MESSAGE).await;
			return Ok(None);
		};

		// The latch stays held until the client has applied the edit, so
		// saves triggered meanwhile do not run a second update.
		let Some(guard) = TocUpdater::global().try_acquire() else {
			debug!(command = %params.command, "update already in progress");
			return Ok(None);
		};

		match compute_command_edit(&guard, &document, command) {
			Ok(Some(edit)) => self.apply_edit(uri, edit).await,
			Ok(None) => debug!(command = %params.command, "no changes"),
			Err(e) => self.show_error(e).await,
		}

		drop(guard);
		Ok(None)
	}

	async fn did_create_files(&self, params: CreateFilesParams) {
		let settings = self.state.read().await.settings.clone();

		for file in params.files {
			let Ok(uri) = file.uri.parse::<Uri>() else {
				continue;
			};
			let Some(path) = uri.to_file_path().map(std::borrow::Cow::into_owned) else {
				continue;
			};
			if !is_markdown_path(&path) {
				continue;
			}

			match compute_created_file_edit(&path, &settings) {
				Ok(Some(edit)) => self.apply_edit(uri, edit).await,
				Ok(None) => {}
				Err(e) => warn!(error = %e, path = %path.display(), "skipping created file"),
			}
		}
	}
}

/// Start the LSP server on stdin/stdout. This is used by the `mdtoc lsp` CLI
/// subcommand.
pub async fn run_server() {
	let stdin = tokio::io::stdin();
	let stdout = tokio::io::stdout();

	let (service, socket) = tower_lsp_server::LspService::new(MdtocLanguageServer::new);
	tower_lsp_server::Server::new(stdin, stdout, socket)
		.serve(service)
		.await;
}
