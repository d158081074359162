//! State behind the popup's four buttons and status line.
//!
//! The controller never talks to the browser. The wasm popup calls
//! [`PopupController::begin`] on a click, sends the returned request, and
//! feeds the outcome back through [`PopupController::complete`]; relayed page
//! events go through [`PopupController::on_event`].

use scrape_protocol::{CommandResult, PageEvent, PopupRequest, Preferences, ScrapeMode};

/// A popup button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupAction {
	Auto,
	Manual,
	Export,
	Cancel,
}

impl PopupAction {
	pub const ALL: [PopupAction; 4] = [PopupAction::Auto, PopupAction::Manual, PopupAction::Export, PopupAction::Cancel];

	/// DOM id of the button.
	pub fn button_id(self) -> &'static str {
		match self {
			PopupAction::Auto => "autoBtn",
			PopupAction::Manual => "manualBtn",
			PopupAction::Export => "exportBtn",
			PopupAction::Cancel => "cancelBtn",
		}
	}

	pub fn request(self) -> PopupRequest {
		match self {
			PopupAction::Auto => PopupRequest::StartScrape { mode: ScrapeMode::Auto },
			PopupAction::Manual => PopupRequest::StartScrape { mode: ScrapeMode::Manual },
			PopupAction::Export => PopupRequest::ExportCsv,
			PopupAction::Cancel => PopupRequest::CancelScrape,
		}
	}

	fn pending_text(self) -> &'static str {
		match self {
			PopupAction::Auto => "Starting auto scrape...",
			PopupAction::Manual => "Entering manual selection mode...",
			PopupAction::Export => "Exporting CSV...",
			PopupAction::Cancel => "Cancelling scrape...",
		}
	}

	/// Start actions keep their pending text; progress arrives as events.
	fn success_text(self) -> Option<&'static str> {
		match self {
			PopupAction::Export => Some("Export initiated."),
			PopupAction::Cancel => Some("Scrape cancelled."),
			PopupAction::Auto | PopupAction::Manual => None,
		}
	}

	fn fallback_error(self) -> &'static str {
		match self {
			PopupAction::Auto => "Error starting auto scrape",
			PopupAction::Manual => "Error starting manual selection",
			PopupAction::Export => "Error exporting CSV",
			PopupAction::Cancel => "Error cancelling scrape",
		}
	}
}

/// Text shown in the status line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopupStatus {
	pub text: String,
	pub is_error: bool,
}

impl PopupStatus {
	fn info(text: impl Into<String>) -> Self {
		Self {
			text: text.into(),
			is_error: false,
		}
	}

	fn error(text: impl Into<String>) -> Self {
		Self {
			text: text.into(),
			is_error: true,
		}
	}
}

#[derive(Debug, Default)]
pub struct PopupController {
	status: PopupStatus,
	in_flight: Option<PopupAction>,
	offer_auto: bool,
}

impl PopupController {
	pub fn new(prefs: &Preferences) -> Self {
		Self {
			offer_auto: prefs.auto_detect,
			..Self::default()
		}
	}

	pub fn status(&self) -> &PopupStatus {
		&self.status
	}

	/// All buttons are disabled while a request is in flight.
	pub fn buttons_enabled(&self) -> bool {
		self.in_flight.is_none()
	}

	/// Whether the auto button is shown at all.
	pub fn offers(&self, action: PopupAction) -> bool {
		action != PopupAction::Auto || self.offer_auto
	}

	/// Starts `action`. Returns the request to send, or [`None`] when the
	/// buttons are disabled.
	pub fn begin(&mut self, action: PopupAction) -> Option<PopupRequest> {
		if !self.buttons_enabled() || !self.offers(action) {
			return None;
		}
		self.in_flight = Some(action);
		self.status = PopupStatus::info(action.pending_text());
		Some(action.request())
	}

	/// Records the outcome of the in-flight request and re-enables the buttons.
	///
	/// `Err` carries a delivery failure message, which may be empty.
	pub fn complete(&mut self, outcome: Result<CommandResult, String>) {
		let Some(action) = self.in_flight.take() else {
			return;
		};
		let failure = match outcome {
			Ok(result) if result.success => None,
			Ok(result) => Some(result.error.unwrap_or_default()),
			Err(message) => Some(message),
		};
		self.status = match failure {
			None => match action.success_text() {
				Some(text) => PopupStatus::info(text),
				None => return,
			},
			Some(message) if message.is_empty() => PopupStatus::error(action.fallback_error()),
			Some(message) => PopupStatus::error(message),
		};
	}

	/// Applies a page event relayed by the coordinator.
	pub fn on_event(&mut self, event: &PageEvent) {
		self.status = match event {
			PageEvent::ElementAdded { count } => PopupStatus::info(format!("Selected {count} element(s)")),
			PageEvent::ScrapeError { error } => PopupStatus::error(format!("Error: {error}")),
			PageEvent::ScrapeCanceled => PopupStatus::info("Scrape cancelled."),
			PageEvent::ScrapeResult { .. } => PopupStatus::info("Scrape complete."),
		};
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn controller() -> PopupController {
		PopupController::new(&Preferences::default())
	}

	#[test]
	fn buttons_are_disabled_while_in_flight() {
		let mut popup = controller();
		let request = popup.begin(PopupAction::Manual);
		assert_eq!(request, Some(PopupRequest::StartScrape { mode: ScrapeMode::Manual }));
		assert!(!popup.buttons_enabled());
		assert_eq!(popup.status().text, "Entering manual selection mode...");
		assert_eq!(popup.begin(PopupAction::Cancel), None);

		popup.complete(Ok(CommandResult::ok(serde_json::json!({ "started": true }))));
		assert!(popup.buttons_enabled());
		assert_eq!(popup.status().text, "Entering manual selection mode...");
	}

	#[test]
	fn success_texts() {
		let mut popup = controller();
		popup.begin(PopupAction::Export);
		popup.complete(Ok(CommandResult::ok(serde_json::Value::Null)));
		assert_eq!(popup.status(), &PopupStatus::info("Export initiated."));

		popup.begin(PopupAction::Cancel);
		popup.complete(Ok(CommandResult::ok(serde_json::Value::Null)));
		assert_eq!(popup.status().text, "Scrape cancelled.");
	}

	#[test]
	fn failures_use_message_or_fallback() {
		let mut popup = controller();
		popup.begin(PopupAction::Auto);
		popup.complete(Ok(CommandResult::failure("content script not found")));
		assert_eq!(popup.status(), &PopupStatus::error("content script not found"));

		popup.begin(PopupAction::Auto);
		popup.complete(Err(String::new()));
		assert_eq!(popup.status(), &PopupStatus::error("Error starting auto scrape"));
		assert!(popup.buttons_enabled());
	}

	#[test]
	fn relayed_events_update_status() {
		let mut popup = controller();
		popup.on_event(&PageEvent::ElementAdded { count: 3 });
		assert_eq!(popup.status().text, "Selected 3 element(s)");

		popup.on_event(&PageEvent::error("No elements selected"));
		assert_eq!(popup.status(), &PopupStatus::error("Error: No elements selected"));

		popup.on_event(&PageEvent::ScrapeResult { data: vec![] });
		assert_eq!(popup.status(), &PopupStatus::info("Scrape complete."));
	}

	#[test]
	fn auto_button_hidden_when_disabled_in_preferences() {
		let prefs = Preferences {
			auto_detect: false,
			..Preferences::default()
		};
		let mut popup = PopupController::new(&prefs);
		assert!(!popup.offers(PopupAction::Auto));
		assert_eq!(popup.begin(PopupAction::Auto), None);
		assert!(popup.begin(PopupAction::Manual).is_some());
	}
}
