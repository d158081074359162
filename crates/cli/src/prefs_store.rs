//! Preference file used by the CLI.
//!
//! Lives at `<config dir>/scrape-export/preferences.json` unless a path is
//! given explicitly. A missing or unreadable file means default preferences.

use std::fs;
use std::path::{Path, PathBuf};

use scrape_protocol::Preferences;
use tracing::{debug, warn};

use crate::error::{CliError, Result};

pub const APP_DIR: &str = "scrape-export";
pub const FILE_NAME: &str = "preferences.json";

#[derive(Debug, Clone)]
pub struct PreferenceFile {
	path: PathBuf,
}

impl PreferenceFile {
	pub fn at(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	/// The explicit path, or the default location.
	pub fn resolve(explicit: Option<PathBuf>) -> Result<Self> {
		match explicit {
			Some(path) => Ok(Self::at(path)),
			None => dirs::config_dir()
				.map(|dir| Self::at(dir.join(APP_DIR).join(FILE_NAME)))
				.ok_or(CliError::NoConfigDir),
		}
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn load(&self) -> Preferences {
		let content = match fs::read_to_string(&self.path) {
			Ok(content) => content,
			Err(err) => {
				debug!(target = "scrape.prefs", path = %self.path.display(), error = %err, "using default preferences");
				return Preferences::default();
			}
		};
		serde_json::from_str(&content).unwrap_or_else(|err| {
			warn!(target = "scrape.prefs", path = %self.path.display(), error = %err, "malformed preference file");
			Preferences::default()
		})
	}

	pub fn save(&self, prefs: &Preferences) -> Result<()> {
		let io_err = |source: std::io::Error| CliError::SavePreferences {
			path: self.path.clone(),
			source,
		};
		if let Some(parent) = self.path.parent() {
			fs::create_dir_all(parent).map_err(io_err)?;
		}
		fs::write(&self.path, serde_json::to_string_pretty(prefs)?).map_err(io_err)?;
		debug!(target = "scrape.prefs", path = %self.path.display(), "preferences saved");
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use scrape_protocol::TargetKind;
	use tempfile::TempDir;

	use super::*;

	#[test]
	fn missing_file_yields_defaults() {
		let tmp = TempDir::new().unwrap();
		let file = PreferenceFile::at(tmp.path().join("nope.json"));
		assert_eq!(file.load(), Preferences::default());
	}

	#[test]
	fn save_creates_parent_dirs_and_round_trips() {
		let tmp = TempDir::new().unwrap();
		let file = PreferenceFile::at(tmp.path().join("nested/dir").join(FILE_NAME));
		let prefs = Preferences {
			delimiter: '\t',
			target: TargetKind::Tables,
			..Preferences::default()
		};

		file.save(&prefs).unwrap();
		assert_eq!(file.load(), prefs);

		let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(file.path()).unwrap()).unwrap();
		assert_eq!(raw["fileNamePrefix"], "data");
	}

	#[test]
	fn malformed_values_fall_back_per_field() {
		let tmp = TempDir::new().unwrap();
		let path = tmp.path().join(FILE_NAME);
		fs::write(&path, r#"{"delimiter": ";;", "includeHeaders": 0, "fileNamePrefix": "a/b"}"#).unwrap();

		let prefs = PreferenceFile::at(&path).load();
		assert_eq!(prefs.delimiter, ',');
		assert!(!prefs.include_headers);
		assert_eq!(prefs.file_name_prefix, "data");
	}

	#[test]
	fn garbage_file_yields_defaults() {
		let tmp = TempDir::new().unwrap();
		let path = tmp.path().join(FILE_NAME);
		fs::write(&path, "not json").unwrap();
		assert_eq!(PreferenceFile::at(&path).load(), Preferences::default());
	}

	#[test]
	fn explicit_path_wins() {
		let file = PreferenceFile::resolve(Some(PathBuf::from("/tmp/custom.json"))).unwrap();
		assert_eq!(file.path(), Path::new("/tmp/custom.json"));
	}
}
