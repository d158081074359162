//! Reduction of captured page values to plain JSON.
//!
//! Output of [`sanitize`] can cross the boundary between the page and the
//! coordinator and can be handed to the CSV encoder as-is.

use std::fmt;

use indexmap::IndexMap;
use serde_json::{Map, Number, Value};

use crate::dom::Node;

/// Value captured from the page before sanitization.
pub enum Captured<N> {
	Null,
	Bool(bool),
	Number(Number),
	Text(String),
	List(Vec<Captured<N>>),
	/// A DOM node, reduced to its text content.
	Node(N),
	Map(IndexMap<String, Captured<N>>),
	/// Anything else, reduced to its display string.
	Opaque(Box<dyn fmt::Display>),
}

impl<N> Captured<N> {
	pub fn text(s: impl Into<String>) -> Self {
		Captured::Text(s.into())
	}

	/// Non-finite numbers have no JSON form and become null.
	pub fn number(n: f64) -> Self {
		Number::from_f64(n).map_or(Captured::Null, Captured::Number)
	}

	pub fn map<K: Into<String>>(fields: impl IntoIterator<Item = (K, Captured<N>)>) -> Self {
		Captured::Map(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
	}
}

impl<N> fmt::Debug for Captured<N> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Captured::Null => f.write_str("Null"),
			Captured::Bool(b) => write!(f, "Bool({b})"),
			Captured::Number(n) => write!(f, "Number({n})"),
			Captured::Text(s) => write!(f, "Text({s:?})"),
			Captured::List(items) => f.debug_list().entries(items).finish(),
			Captured::Node(_) => f.write_str("Node(..)"),
			Captured::Map(map) => f.debug_map().entries(map).finish(),
			Captured::Opaque(value) => write!(f, "Opaque({value})"),
		}
	}
}

impl<N> From<Value> for Captured<N> {
	fn from(value: Value) -> Self {
		match value {
			Value::Null => Captured::Null,
			Value::Bool(b) => Captured::Bool(b),
			Value::Number(n) => Captured::Number(n),
			Value::String(s) => Captured::Text(s),
			Value::Array(items) => Captured::List(items.into_iter().map(Captured::from).collect()),
			Value::Object(map) => Captured::Map(map.into_iter().map(|(k, v)| (k, Captured::from(v))).collect()),
		}
	}
}

/// Converts a captured value into plain data. Never fails.
///
/// Image nodes reduce to an empty string so alt text and sources never leak
/// into exports.
pub fn sanitize<N: Node>(value: Captured<N>) -> Value {
	match value {
		Captured::Null => Value::Null,
		Captured::Bool(b) => Value::Bool(b),
		Captured::Number(n) => Value::Number(n),
		Captured::Text(s) => Value::String(s),
		Captured::List(items) => Value::Array(items.into_iter().map(sanitize).collect()),
		Captured::Node(node) => {
			let is_image = node.tag_name().is_some_and(|tag| tag.eq_ignore_ascii_case("img"));
			if is_image {
				Value::String(String::new())
			} else {
				node.text_content().map_or(Value::Null, Value::String)
			}
		}
		Captured::Map(fields) => {
			let object: Map<String, Value> = fields.into_iter().map(|(k, v)| (k, sanitize(v))).collect();
			Value::Object(object)
		}
		Captured::Opaque(value) => Value::String(value.to_string()),
	}
}
