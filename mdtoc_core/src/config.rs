use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::TocError;
use crate::TocResult;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] =
	["mdtoc.toml", ".mdtoc.toml", ".config/mdtoc.toml"];

/// Key editor clients nest their settings under.
pub const SETTINGS_SECTION: &str = "markdownToc";

/// Host-level switches controlling when updates run automatically.
///
/// ```toml
/// auto_update_on_save = true
/// insert_config_on_create = false
/// exclude = ["vendor/", "CHANGELOG.md"]
/// ```
///
/// Editor clients send the same settings as camel case JSON, optionally
/// nested under `markdownToc`:
///
/// ```json
/// { "markdownToc": { "autoUpdateOnSave": true, "insertConfigOnCreate": true } }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct TocSettings {
	/// Refresh the table of contents before a document is saved. Only
	/// documents that opt in with `toc:` comments are touched.
	#[serde(alias = "autoUpdateOnSave")]
	pub auto_update_on_save: bool,
	/// Insert the default `toc:` comments into newly created, empty markdown
	/// documents.
	#[serde(alias = "insertConfigOnCreate")]
	pub insert_config_on_create: bool,
	/// Gitignore-style patterns skipped when walking directories.
	pub exclude: Vec<String>,
}

impl Default for TocSettings {
	fn default() -> Self {
		Self {
			auto_update_on_save: true,
			insert_config_on_create: false,
			exclude: Vec::new(),
		}
	}
}

/// The named boolean flags a host exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFlag {
	AutoUpdateOnSave,
	InsertConfigOnCreate,
}

impl ConfigFlag {
	/// The setting name as editor clients spell it.
	pub fn name(self) -> &'static str {
		match self {
			Self::AutoUpdateOnSave => "autoUpdateOnSave",
			Self::InsertConfigOnCreate => "insertConfigOnCreate",
		}
	}
}

impl TocSettings {
	pub fn flag(&self, flag: ConfigFlag) -> bool {
		match flag {
			ConfigFlag::AutoUpdateOnSave => self.auto_update_on_save,
			ConfigFlag::InsertConfigOnCreate => self.insert_config_on_create,
		}
	}

	/// Load settings from the first config file found in `root`. Returns
	/// `None` when no config file exists.
	pub fn load(root: &Path) -> TocResult<Option<(PathBuf, Self)>> {
		let Some(path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&path)?;
		let settings = Self::from_toml(&content)?;

		Ok(Some((path, settings)))
	}

	/// Like [`TocSettings::load`], falling back to the defaults.
	pub fn load_or_default(root: &Path) -> TocResult<Self> {
		Ok(Self::load(root)?.map(|(_, settings)| settings).unwrap_or_default())
	}

	/// The config file that [`TocSettings::load`] would read.
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	pub fn from_toml(content: &str) -> TocResult<Self> {
		toml::from_str(content).map_err(|e| TocError::ConfigParse(e.to_string()))
	}

	/// Parse settings sent by an editor client. Accepts the settings object
	/// itself or an object holding it under `markdownToc`. `null` yields the
	/// defaults.
	pub fn from_json(value: &Value) -> TocResult<Self> {
		let section = value.get(SETTINGS_SECTION).unwrap_or(value);

		if section.is_null() {
			return Ok(Self::default());
		}

		Self::deserialize(section).map_err(|e| TocError::ConfigParse(e.to_string()))
	}
}
