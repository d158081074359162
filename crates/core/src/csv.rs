//! CSV encoding of scrape records.
//!
//! The output is RFC 4180-like with two deliberate differences: rows are
//! joined with `\n`, and cells that a spreadsheet would evaluate as a formula
//! (leading `=`, `+`, `-` or `@`) are prefixed with an apostrophe.

use indexmap::IndexSet;
use scrape_protocol::{Preferences, ScrapeRecord};
use serde::Deserialize;
use serde_json::{Number, Value};

const FORMULA_TRIGGERS: [char; 4] = ['=', '+', '-', '@'];

/// Encoder options. Deserialization never fails; bad values use defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawCsvOptions")]
pub struct CsvOptions {
	pub delimiter: char,
	pub include_headers: bool,
	pub quote_char: char,
	/// Explicit column order. `None` or empty derives the union of record keys.
	pub headers: Option<Vec<String>>,
}

impl Default for CsvOptions {
	fn default() -> Self {
		Self {
			delimiter: ',',
			include_headers: true,
			quote_char: '"',
			headers: None,
		}
	}
}

impl From<&Preferences> for CsvOptions {
	fn from(prefs: &Preferences) -> Self {
		Self {
			delimiter: prefs.delimiter,
			include_headers: prefs.include_headers,
			..Self::default()
		}
	}
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawCsvOptions {
	delimiter: Option<Value>,
	include_headers: Option<Value>,
	quote_char: Option<Value>,
	headers: Option<Value>,
}

impl From<RawCsvOptions> for CsvOptions {
	fn from(raw: RawCsvOptions) -> Self {
		let defaults = CsvOptions::default();
		let headers = match raw.headers {
			Some(Value::Array(items)) => Some(
				items
					.into_iter()
					.map(|item| match item {
						Value::String(s) => s,
						other => other.to_string(),
					})
					.collect(),
			),
			_ => None,
		};

		Self {
			delimiter: raw.delimiter.as_ref().and_then(single_char).unwrap_or(defaults.delimiter),
			include_headers: raw
				.include_headers
				.as_ref()
				.and_then(Value::as_bool)
				.unwrap_or(defaults.include_headers),
			quote_char: raw.quote_char.as_ref().and_then(single_char).unwrap_or(defaults.quote_char),
			headers,
		}
	}
}

fn single_char(value: &Value) -> Option<char> {
	let mut chars = value.as_str()?.chars();
	let c = chars.next()?;
	chars.next().is_none().then_some(c)
}

/// Union of record keys in first-seen order.
pub fn header_union(records: &[ScrapeRecord]) -> Vec<String> {
	let keys: IndexSet<&str> = records.iter().flat_map(ScrapeRecord::keys).collect();
	keys.into_iter().map(str::to_string).collect()
}

/// Encodes `records` as delimited text.
///
/// Returns an empty string for an empty batch, even when explicit headers
/// are configured.
pub fn encode(records: &[ScrapeRecord], options: &CsvOptions) -> String {
	if records.is_empty() {
		return String::new();
	}

	let headers = match &options.headers {
		Some(explicit) if !explicit.is_empty() => explicit.clone(),
		_ => header_union(records),
	};
	let delimiter = options.delimiter.to_string();

	let mut csv = String::new();
	if options.include_headers {
		let row: Vec<String> = headers.iter().map(|h| escape_cell(h.clone(), options)).collect();
		csv.push_str(&row.join(&delimiter));
		csv.push('\n');
	}

	let rows: Vec<String> = records
		.iter()
		.map(|record| {
			headers
				.iter()
				.map(|h| escape_cell(stringify(record.get(h)), options))
				.collect::<Vec<_>>()
				.join(&delimiter)
		})
		.collect();
	csv.push_str(&rows.join("\n"));
	csv
}

fn escape_cell(mut cell: String, options: &CsvOptions) -> String {
	if cell.starts_with(FORMULA_TRIGGERS) {
		cell.insert(0, '\'');
	}

	let q = options.quote_char;
	let needs_quotes = cell.contains(options.delimiter) || cell.contains(['\n', '\r']) || cell.contains(q);
	if !needs_quotes {
		return cell;
	}

	let doubled: String = [q, q].iter().collect();
	let mut quoted = String::with_capacity(cell.len() + 2);
	quoted.push(q);
	quoted.push_str(&cell.replace(q, &doubled));
	quoted.push(q);
	quoted
}

fn stringify(value: Option<&Value>) -> String {
	match value {
		None | Some(Value::Null) => String::new(),
		Some(Value::String(s)) => s.clone(),
		Some(Value::Bool(b)) => b.to_string(),
		Some(Value::Number(n)) => format_number(n),
		Some(composite) => serde_json::to_string(composite).unwrap_or_else(|_| composite.to_string()),
	}
}

/// Prints numbers the way the page would: integral floats lose their `.0`,
/// and magnitudes from `1e21` up or below `1e-6` switch to exponent form.
fn format_number(n: &Number) -> String {
	let Some(f) = n.as_f64().filter(|_| n.is_f64()) else {
		return n.to_string();
	};
	if f == 0.0 {
		return "0".to_string();
	}
	let magnitude = f.abs();
	if magnitude >= 1e21 || magnitude < 1e-6 {
		return exponent_form(f);
	}
	if f.fract() == 0.0 {
		return format!("{f:.0}");
	}
	f.to_string()
}

/// `1e21` as `1e+21`, `1.5e-7` as `1.5e-7`.
fn exponent_form(f: f64) -> String {
	let formatted = format!("{f:e}");
	match formatted.split_once('e') {
		Some((mantissa, exponent)) if !exponent.starts_with('-') => format!("{mantissa}e+{exponent}"),
		_ => formatted,
	}
}
