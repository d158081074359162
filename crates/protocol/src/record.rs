//! Tabular records and payload shape checks.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::messages::ScrapeMode;
use crate::preferences::TargetKind;

/// One exported row: an ordered mapping from field name to scalar value.
///
/// Field sets may differ between records of the same batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScrapeRecord(IndexMap<String, Value>);

impl ScrapeRecord {
	pub fn new() -> Self {
		Self::default()
	}

	/// The `{url, text}` row produced by heading and manual scrapes.
	pub fn page_text(url: &str, text: &str) -> Self {
		let mut record = Self::new();
		record.insert("url", url);
		record.insert("text", text);
		record
	}

	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
		self.0.insert(key.into(), value.into())
	}

	pub fn get(&self, key: &str) -> Option<&Value> {
		self.0.get(key)
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.0.keys().map(String::as_str)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v))
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl From<ScrapeRecord> for Value {
	fn from(record: ScrapeRecord) -> Self {
		Value::Object(record.0.into_iter().collect())
	}
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ScrapeRecord {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}
}

/// A scrape payload that cannot be exported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
	#[error("scrape data must be a list of records, got {0}")]
	NotAList(&'static str),

	#[error("record {index} is not an object")]
	NotAnObject { index: usize },

	#[error("record {index} is missing string field `{field}`")]
	MissingField { index: usize, field: String },

	#[error("record {index} field `{field}` is not a scalar value")]
	NotScalar { index: usize, field: String },
}

/// String fields every record must carry for a given scrape.
///
/// Heading scrapes produce `{url, text}` (single picks only `{text}`);
/// manual selections always produce `{url, text}`; table scrapes have
/// page-defined columns.
pub fn expected_fields(mode: &ScrapeMode, target: TargetKind) -> &'static [&'static str] {
	match (mode, target) {
		(ScrapeMode::Manual, _) => &["url", "text"],
		(ScrapeMode::Auto, TargetKind::Headings) => &["url", "text"],
		(ScrapeMode::Single(_), TargetKind::Headings) => &["text"],
		(_, TargetKind::Tables) => &[],
	}
}

/// Validates a raw payload and converts it into records.
///
/// Every record must be an object of scalar values holding each field of
/// `required` as a string.
pub fn validate_records(data: &Value, required: &[&str]) -> Result<Vec<ScrapeRecord>, ShapeError> {
	let items = data.as_array().ok_or(ShapeError::NotAList(json_type(data)))?;

	items
		.iter()
		.enumerate()
		.map(|(index, item)| -> Result<ScrapeRecord, ShapeError> {
			let object = item.as_object().ok_or(ShapeError::NotAnObject { index })?;
			for field in required {
				if !object.get(*field).is_some_and(Value::is_string) {
					return Err(ShapeError::MissingField {
						index,
						field: (*field).to_string(),
					});
				}
			}
			object
				.iter()
				.map(|(field, value)| {
					if value.is_array() || value.is_object() {
						Err(ShapeError::NotScalar {
							index,
							field: field.clone(),
						})
					} else {
						Ok((field.clone(), value.clone()))
					}
				})
				.collect()
		})
		.collect()
}

/// Converts sanitized page output into records.
///
/// A lone object becomes a one-record batch; a list keeps only its object
/// entries. Nested values are kept and stringified by the CSV encoder.
pub fn records_from_value(value: Value) -> Result<Vec<ScrapeRecord>, ShapeError> {
	match value {
		Value::Object(map) => Ok(vec![ScrapeRecord(map.into_iter().collect())]),
		Value::Array(items) => items
			.into_iter()
			.enumerate()
			.map(|(index, item)| match item {
				Value::Object(map) => Ok(ScrapeRecord(map.into_iter().collect())),
				_ => Err(ShapeError::NotAnObject { index }),
			})
			.collect(),
		other => Err(ShapeError::NotAList(json_type(&other))),
	}
}

fn json_type(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "boolean",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Array(_) => "array",
		Value::Object(_) => "object",
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn record_keeps_insertion_order() {
		let record: ScrapeRecord = [("zeta", json!(1)), ("alpha", json!(2))].into_iter().collect();
		assert_eq!(record.keys().collect::<Vec<_>>(), ["zeta", "alpha"]);
		assert_eq!(serde_json::to_string(&record).unwrap(), r#"{"zeta":1,"alpha":2}"#);
	}

	#[test]
	fn validate_accepts_page_text_records() {
		let data = json!([{"url": "https://a", "text": "One"}, {"url": "https://a", "text": "Two"}]);
		let records = validate_records(&data, &["url", "text"]).unwrap();
		assert_eq!(records.len(), 2);
		assert_eq!(records[1], ScrapeRecord::page_text("https://a", "Two"));
	}

	#[test]
	fn validate_rejects_missing_or_non_string_fields() {
		let data = json!([{"url": "https://a", "text": 5}]);
		assert_eq!(
			validate_records(&data, &["url", "text"]),
			Err(ShapeError::MissingField {
				index: 0,
				field: "text".into()
			})
		);
	}

	#[test]
	fn validate_rejects_nested_values_and_non_lists() {
		let nested = json!([{"text": "a", "extra": {"deep": true}}]);
		assert!(matches!(
			validate_records(&nested, &["text"]),
			Err(ShapeError::NotScalar { index: 0, .. })
		));
		assert_eq!(
			validate_records(&json!({"text": "a"}), &["text"]),
			Err(ShapeError::NotAList("object"))
		);
		assert_eq!(
			validate_records(&json!([1]), &[]),
			Err(ShapeError::NotAnObject { index: 0 })
		);
	}

	#[test]
	fn lone_object_becomes_single_record() {
		let records = records_from_value(json!({"text": "Title"})).unwrap();
		assert_eq!(records.len(), 1);
		assert_eq!(records[0].get("text"), Some(&json!("Title")));
	}

	#[test]
	fn expected_fields_follow_mode_and_target() {
		assert_eq!(expected_fields(&ScrapeMode::Manual, TargetKind::Tables), ["url", "text"]);
		assert_eq!(expected_fields(&ScrapeMode::Single("pick".into()), TargetKind::Headings), ["text"]);
		assert!(expected_fields(&ScrapeMode::Auto, TargetKind::Tables).is_empty());
	}
}
