//! User preferences shared by the options page, coordinator and CLI.
//!
//! Preferences never fail to load: each field that is missing or malformed
//! falls back to its default independently of the others.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// File name prefix used when the stored one is empty or unusable.
pub const DEFAULT_FILE_NAME_PREFIX: &str = "data";

const ILLEGAL_FILE_NAME_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Which page elements a scrape targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
	/// `H1` and `H2` elements.
	#[default]
	Headings,
	/// `TABLE` elements, exported row by row.
	Tables,
}

impl TargetKind {
	/// Upper-case tag names accepted for manual selection.
	pub fn accepted_tags(self) -> &'static [&'static str] {
		match self {
			TargetKind::Headings => &["H1", "H2"],
			TargetKind::Tables => &["TABLE"],
		}
	}

	/// Selector used by auto-detection.
	pub fn selector(self) -> &'static str {
		match self {
			TargetKind::Headings => "h1, h2",
			TargetKind::Tables => "table",
		}
	}
}

/// Export preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawPreferences")]
pub struct Preferences {
	/// Single-character CSV delimiter.
	pub delimiter: char,
	pub include_headers: bool,
	/// Offer auto-detection in the popup.
	pub auto_detect: bool,
	/// Prefix of downloaded file names, see [`export_file_name`].
	pub file_name_prefix: String,
	/// Ask for a download location instead of saving directly.
	pub prompt_on_download: bool,
	pub target: TargetKind,
}

impl Default for Preferences {
	fn default() -> Self {
		Self {
			delimiter: ',',
			include_headers: true,
			auto_detect: true,
			file_name_prefix: DEFAULT_FILE_NAME_PREFIX.to_string(),
			prompt_on_download: false,
			target: TargetKind::Headings,
		}
	}
}

impl Preferences {
	/// Re-validates values set directly on the struct.
	pub fn validated(self) -> Self {
		let defaults = Self::default();
		let prefix = self.file_name_prefix.trim();
		Self {
			delimiter: if is_usable_delimiter(self.delimiter) {
				self.delimiter
			} else {
				defaults.delimiter
			},
			file_name_prefix: if is_valid_prefix(prefix) {
				prefix.to_string()
			} else {
				defaults.file_name_prefix
			},
			..self
		}
	}
}

fn is_usable_delimiter(c: char) -> bool {
	c != '\n' && c != '\r'
}

fn is_valid_prefix(prefix: &str) -> bool {
	!prefix.is_empty() && !prefix.contains(ILLEGAL_FILE_NAME_CHARS)
}

/// Untyped preferences as found in storage.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawPreferences {
	delimiter: Option<Value>,
	include_headers: Option<Value>,
	auto_detect: Option<Value>,
	file_name_prefix: Option<Value>,
	prompt_on_download: Option<Value>,
	target: Option<Value>,
}

impl From<RawPreferences> for Preferences {
	fn from(raw: RawPreferences) -> Self {
		let defaults = Preferences::default();

		let delimiter = raw
			.delimiter
			.as_ref()
			.and_then(Value::as_str)
			.and_then(single_char)
			.filter(|c| is_usable_delimiter(*c))
			.unwrap_or(defaults.delimiter);

		let file_name_prefix = raw
			.file_name_prefix
			.as_ref()
			.and_then(Value::as_str)
			.map(str::trim)
			.filter(|p| is_valid_prefix(p))
			.map_or(defaults.file_name_prefix, str::to_string);

		let target = raw
			.target
			.and_then(|v| serde_json::from_value(v).ok())
			.unwrap_or_default();

		Self {
			delimiter,
			include_headers: raw.include_headers.as_ref().map_or(defaults.include_headers, truthy),
			auto_detect: raw.auto_detect.as_ref().map_or(defaults.auto_detect, truthy),
			file_name_prefix,
			prompt_on_download: raw
				.prompt_on_download
				.as_ref()
				.map_or(defaults.prompt_on_download, truthy),
			target,
		}
	}
}

fn single_char(s: &str) -> Option<char> {
	let mut chars = s.chars();
	let c = chars.next()?;
	chars.next().is_none().then_some(c)
}

/// Truthiness as the options page applies it to stored values.
fn truthy(value: &Value) -> bool {
	match value {
		Value::Null => false,
		Value::Bool(b) => *b,
		Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
		Value::String(s) => !s.is_empty(),
		Value::Array(_) | Value::Object(_) => true,
	}
}

/// Name of a downloaded export: `{prefix}_{unix_millis}.csv`.
pub fn export_file_name(prefix: &str, unix_millis: u64) -> String {
	let prefix = prefix.trim();
	let prefix = if is_valid_prefix(prefix) {
		prefix
	} else {
		DEFAULT_FILE_NAME_PREFIX
	};
	format!("{prefix}_{unix_millis}.csv")
}
