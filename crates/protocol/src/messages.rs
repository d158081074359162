//! Messages exchanged between popup, coordinator and content script.
//!
//! Field names and `type` tags are fixed by the extension's JavaScript side
//! and must not change.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::ScrapeRecord;

/// Browser tab identifier as handed out by `chrome.tabs`.
pub type TabId = i32;

/// How a scrape is performed.
///
/// Any mode label other than `auto` or `manual` starts a single-element pick;
/// the label is kept so it can be relayed unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ScrapeMode {
	/// Heuristic extraction without user interaction.
	Auto,
	/// Multi-step selection of several elements.
	Manual,
	/// Pick exactly one element under the pointer.
	Single(String),
}

impl ScrapeMode {
	pub fn as_str(&self) -> &str {
		match self {
			ScrapeMode::Auto => "auto",
			ScrapeMode::Manual => "manual",
			ScrapeMode::Single(label) => label,
		}
	}
}

impl From<String> for ScrapeMode {
	fn from(value: String) -> Self {
		match value.as_str() {
			"auto" => ScrapeMode::Auto,
			"manual" => ScrapeMode::Manual,
			_ => ScrapeMode::Single(value),
		}
	}
}

impl From<&str> for ScrapeMode {
	fn from(value: &str) -> Self {
		ScrapeMode::from(value.to_string())
	}
}

impl From<ScrapeMode> for String {
	fn from(mode: ScrapeMode) -> Self {
		match mode {
			ScrapeMode::Single(label) => label,
			other => other.as_str().to_string(),
		}
	}
}

impl fmt::Display for ScrapeMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Request sent from the popup to the coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PopupRequest {
	/// Begin a scrape in the active tab.
	StartScrape { mode: ScrapeMode },
	/// Abort whatever the active tab is doing.
	CancelScrape,
	/// Finalize a manual selection and export it.
	ExportCsv,
}

impl PopupRequest {
	/// Maps the request onto the command delivered to the page.
	pub fn to_page_command(&self) -> PageCommand {
		match self {
			PopupRequest::StartScrape { mode } => PageCommand::PerformScrape { mode: mode.clone() },
			PopupRequest::CancelScrape => PageCommand::CancelScrape,
			PopupRequest::ExportCsv => PageCommand::FinalizeSelection,
		}
	}
}

/// Command sent from the coordinator to a tab's content script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PageCommand {
	PerformScrape { mode: ScrapeMode },
	CancelScrape,
	FinalizeSelection,
}

impl PageCommand {
	/// Wire tag, used for logging.
	pub fn kind(&self) -> &'static str {
		match self {
			PageCommand::PerformScrape { .. } => "PERFORM_SCRAPE",
			PageCommand::CancelScrape => "CANCEL_SCRAPE",
			PageCommand::FinalizeSelection => "FINALIZE_SELECTION",
		}
	}
}

/// What the page-side session is asked to do, stripped of wire details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportCommand {
	Auto,
	Manual,
	Single,
	Cancel,
	Finalize,
}

impl From<&PageCommand> for ExportCommand {
	fn from(command: &PageCommand) -> Self {
		match command {
			PageCommand::PerformScrape { mode } => match mode {
				ScrapeMode::Auto => ExportCommand::Auto,
				ScrapeMode::Manual => ExportCommand::Manual,
				ScrapeMode::Single(_) => ExportCommand::Single,
			},
			PageCommand::CancelScrape => ExportCommand::Cancel,
			PageCommand::FinalizeSelection => ExportCommand::Finalize,
		}
	}
}

/// Event emitted by the content script.
///
/// Everything except [`ScrapeResult`](Self::ScrapeResult) is relayed to
/// listening UIs; results are turned into a CSV download.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PageEvent {
	/// Successful capture.
	ScrapeResult { data: Vec<ScrapeRecord> },
	/// Failed capture or a rejected selection.
	ScrapeError { error: String },
	/// The session was aborted.
	ScrapeCanceled,
	/// Manual-mode progress.
	ElementAdded { count: usize },
}

impl PageEvent {
	pub fn error(message: impl Into<String>) -> Self {
		PageEvent::ScrapeError { error: message.into() }
	}

	/// Wire tag, used for logging.
	pub fn kind(&self) -> &'static str {
		match self {
			PageEvent::ScrapeResult { .. } => "SCRAPE_RESULT",
			PageEvent::ScrapeError { .. } => "SCRAPE_ERROR",
			PageEvent::ScrapeCanceled => "SCRAPE_CANCELED",
			PageEvent::ElementAdded { .. } => "ELEMENT_ADDED",
		}
	}
}

/// Outcome of a command, returned to whoever issued it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandResult {
	pub success: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub response: Option<Value>,
}

impl CommandResult {
	pub fn ok(response: Value) -> Self {
		Self {
			success: true,
			error: None,
			response: Some(response),
		}
	}

	pub fn failure(error: impl Into<String>) -> Self {
		Self {
			success: false,
			error: Some(error.into()),
			response: None,
		}
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn popup_requests_use_screaming_tags() {
		let start = serde_json::to_value(PopupRequest::StartScrape { mode: ScrapeMode::Manual }).unwrap();
		assert_eq!(start, json!({"type": "START_SCRAPE", "mode": "manual"}));

		let export = serde_json::to_value(PopupRequest::ExportCsv).unwrap();
		assert_eq!(export, json!({"type": "EXPORT_CSV"}));
	}

	#[test]
	fn unknown_mode_is_a_single_pick() {
		let request: PopupRequest = serde_json::from_value(json!({"type": "START_SCRAPE", "mode": "pick"})).unwrap();
		let command = request.to_page_command();
		assert_eq!(
			serde_json::to_value(&command).unwrap(),
			json!({"type": "PERFORM_SCRAPE", "mode": "pick"})
		);
		assert_eq!(ExportCommand::from(&command), ExportCommand::Single);
	}

	#[test]
	fn canceled_event_keeps_single_l_spelling() {
		let json = serde_json::to_string(&PageEvent::ScrapeCanceled).unwrap();
		assert_eq!(json, r#"{"type":"SCRAPE_CANCELED"}"#);
	}

	#[test]
	fn element_added_carries_count() {
		let event: PageEvent = serde_json::from_value(json!({"type": "ELEMENT_ADDED", "count": 3})).unwrap();
		assert_eq!(event, PageEvent::ElementAdded { count: 3 });
	}

	#[test]
	fn command_result_omits_absent_fields() {
		let failed = serde_json::to_value(CommandResult::failure("content script not found")).unwrap();
		assert_eq!(failed, json!({"success": false, "error": "content script not found"}));

		let ok = serde_json::to_value(CommandResult::ok(json!({"started": true}))).unwrap();
		assert_eq!(ok, json!({"success": true, "response": {"started": true}}));
	}
}
