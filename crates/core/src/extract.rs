//! Extraction strategies.
//!
//! Each strategy turns page content into a [`Captured`] value that is then
//! sanitized into records. Failures are reported as [`ExtractionError`] and
//! never escape the session.

use scrape_protocol::TargetKind;

use crate::dom::{Document, Node};
use crate::error::{ExtractionError, Result};
use crate::sanitize::Captured;

/// How records are produced.
#[derive(Debug)]
pub enum Strategy<N> {
	/// Every heading on the page, or the first table.
	Auto,
	/// One element picked with the hover overlay.
	Single(N),
	/// Elements collected during a manual session.
	Manual { selected: Vec<N> },
}

impl<N: Node> Strategy<N> {
	pub fn name(&self) -> &'static str {
		match self {
			Strategy::Auto => "auto",
			Strategy::Single(_) => "single",
			Strategy::Manual { .. } => "manual",
		}
	}

	pub fn extract<D: Document<Node = N>>(self, doc: &D, target: TargetKind) -> Result<Captured<N>> {
		match self {
			Strategy::Auto => auto_detect(doc, target),
			Strategy::Single(node) => pick(node, target),
			Strategy::Manual { selected } => collect(doc, &selected),
		}
	}
}

fn page_url<D: Document>(doc: &D) -> Result<String> {
	doc.location()
		.filter(|url| !url.is_empty())
		.ok_or(ExtractionError::MissingUrl)
}

fn page_text<N: Node>(url: &str, node: &N) -> Captured<N> {
	Captured::map([("url", Captured::text(url)), ("text", Captured::text(node.trimmed_text()))])
}

fn auto_detect<D: Document>(doc: &D, target: TargetKind) -> Result<Captured<D::Node>> {
	match target {
		TargetKind::Headings => {
			let url = page_url(doc)?;
			let headings = doc.query_selector_all(target.selector());
			if headings.is_empty() {
				return Err(ExtractionError::NoHeadings);
			}
			Ok(Captured::List(headings.iter().map(|h| page_text(&url, h)).collect()))
		}
		TargetKind::Tables => {
			let table = doc
				.query_selector_all(target.selector())
				.into_iter()
				.next()
				.ok_or(ExtractionError::NoTable)?;
			Ok(table_rows(&table))
		}
	}
}

/// Whether `node`'s tag is one `target` scrapes.
pub(crate) fn has_accepted_tag<N: Node>(node: &N, target: TargetKind) -> bool {
	node.tag_name()
		.is_some_and(|tag| target.accepted_tags().iter().any(|t| t.eq_ignore_ascii_case(&tag)))
}

fn pick<N: Node>(node: N, target: TargetKind) -> Result<Captured<N>> {
	if !node.is_element() {
		return Err(ExtractionError::InvalidSelection);
	}
	match target {
		TargetKind::Headings if has_accepted_tag(&node, target) => {
			Ok(Captured::map([("text", Captured::text(node.trimmed_text()))]))
		}
		TargetKind::Headings => Err(ExtractionError::NotAHeading),
		TargetKind::Tables if has_accepted_tag(&node, target) => Ok(table_rows(&node)),
		TargetKind::Tables => Ok(Captured::map([("text", Captured::Node(node))])),
	}
}

fn collect<D: Document>(doc: &D, selected: &[D::Node]) -> Result<Captured<D::Node>> {
	let url = page_url(doc)?;
	if selected.is_empty() {
		return Err(ExtractionError::NothingSelected);
	}
	Ok(Captured::List(selected.iter().map(|node| page_text(&url, node)).collect()))
}

/// Rows of a table as records keyed by the first row's cell texts.
///
/// Empty header cells are named `col1`, `col2`, ... by position; cells
/// missing from a row export as empty strings.
pub fn table_rows<N: Node>(table: &N) -> Captured<N> {
	let rows = table.query_selector_all("tr");
	let Some((head, body)) = rows.split_first() else {
		return Captured::List(Vec::new());
	};

	let headers: Vec<String> = head
		.cells()
		.iter()
		.enumerate()
		.map(|(i, cell)| {
			let text = cell.trimmed_text();
			if text.is_empty() { format!("col{}", i + 1) } else { text }
		})
		.collect();

	Captured::List(
		body.iter()
			.map(|row| {
				let cells = row.cells();
				Captured::map(headers.iter().enumerate().map(|(i, header)| {
					let text = cells.get(i).map(Node::trimmed_text).unwrap_or_default();
					(header.clone(), Captured::Text(text))
				}))
			})
			.collect(),
	)
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::sanitize::sanitize;
	use crate::testing::{MockDocument, MockNode};

	fn run(strategy: Strategy<MockNode>, doc: &MockDocument, target: TargetKind) -> Result<serde_json::Value> {
		strategy.extract(doc, target).map(sanitize)
	}

	fn table(rows: &[&[&str]]) -> MockNode {
		let table = MockNode::container("TABLE");
		for cells in rows {
			let row = MockNode::container("TR");
			for (i, text) in cells.iter().enumerate() {
				row.append(&MockNode::element(if i == 0 { "TH" } else { "TD" }, text));
			}
			table.append(&row);
		}
		table
	}

	#[test]
	fn auto_collects_every_heading_with_page_url() {
		let mut doc = MockDocument::new("https://example.com/a");
		doc.append(&MockNode::element("H1", " Main "));
		doc.append(&MockNode::element("P", "body"));
		doc.append(&MockNode::element("H2", "Sub"));

		let value = run(Strategy::Auto, &doc, TargetKind::Headings).unwrap();
		assert_eq!(
			value,
			json!([
				{"url": "https://example.com/a", "text": "Main"},
				{"url": "https://example.com/a", "text": "Sub"},
			])
		);
	}

	#[test]
	fn auto_without_headings_fails() {
		let doc = MockDocument::new("https://example.com");
		let err = run(Strategy::Auto, &doc, TargetKind::Headings).unwrap_err();
		assert_eq!(err.to_string(), "No H1 or H2 elements found on page");
	}

	#[test]
	fn auto_tables_takes_first_table() {
		let mut doc = MockDocument::new("https://example.com");
		doc.append(&table(&[&["Name", "Age"], &["Ada", "36"], &["Alan"]]));
		doc.append(&table(&[&["Other"], &["ignored"]]));

		let value = run(Strategy::Auto, &doc, TargetKind::Tables).unwrap();
		assert_eq!(
			value,
			json!([
				{"Name": "Ada", "Age": "36"},
				{"Name": "Alan", "Age": ""},
			])
		);
	}

	#[test]
	fn auto_tables_without_table_fails() {
		let doc = MockDocument::new("https://example.com");
		assert_eq!(
			run(Strategy::Auto, &doc, TargetKind::Tables).unwrap_err(),
			ExtractionError::NoTable
		);
	}

	#[test]
	fn empty_header_cells_are_numbered() {
		let value = sanitize(table_rows(&table(&[&["", "Score"], &["a", "1"]])));
		assert_eq!(value, json!([{"col1": "a", "Score": "1"}]));
	}

	#[test]
	fn table_without_rows_is_empty() {
		let value = sanitize(table_rows(&MockNode::container("TABLE")));
		assert_eq!(value, json!([]));
	}

	#[test]
	fn single_pick_requires_heading() {
		let doc = MockDocument::new("https://example.com");
		let ok = run(Strategy::Single(MockNode::element("H2", " Hi ")), &doc, TargetKind::Headings).unwrap();
		assert_eq!(ok, json!({"text": "Hi"}));

		let err = run(Strategy::Single(MockNode::element("DIV", "no")), &doc, TargetKind::Headings).unwrap_err();
		assert_eq!(err.to_string(), "Only H1 and H2 elements can be scraped");

		let err = run(Strategy::Single(MockNode::text_node("loose")), &doc, TargetKind::Headings).unwrap_err();
		assert_eq!(err, ExtractionError::InvalidSelection);
	}

	#[test]
	fn single_pick_in_table_mode() {
		let doc = MockDocument::new("https://example.com");
		let rows = run(Strategy::Single(table(&[&["K"], &["v"]])), &doc, TargetKind::Tables).unwrap();
		assert_eq!(rows, json!([{"K": "v"}]));

		let text = run(Strategy::Single(MockNode::element("SPAN", "raw ")), &doc, TargetKind::Tables).unwrap();
		assert_eq!(text, json!({"text": "raw "}));

		let image = run(Strategy::Single(MockNode::element("IMG", "alt")), &doc, TargetKind::Tables).unwrap();
		assert_eq!(image, json!({"text": ""}));
	}

	#[test]
	fn manual_checks_url_before_selection() {
		let mut doc = MockDocument::new("https://example.com");
		doc.url = None;
		let err = run(Strategy::Manual { selected: vec![] }, &doc, TargetKind::Headings).unwrap_err();
		assert_eq!(err.to_string(), "Unable to retrieve page URL");

		doc.url = Some("https://example.com".into());
		let err = run(Strategy::Manual { selected: vec![] }, &doc, TargetKind::Headings).unwrap_err();
		assert_eq!(err.to_string(), "No elements selected");
	}
}
