use std::collections::HashMap;

use parking_lot::Mutex;
use scrape::CsvOptions;
use scrape_protocol::{
	CommandResult, PageCommand, PageEvent, PopupRequest, ScrapeMode, TabId, expected_fields,
	export_file_name, validate_records,
};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::events::EventBus;
use crate::platform::{ExportFile, ExportSink, PreferenceStore, TabChannel};

pub const NO_DATA_MESSAGE: &str = "No data received for export.";

/// Routes popup requests to tabs and page results to downloads.
///
/// Holds no page state: only the mode of the last scrape started in each tab,
/// used to check the shape of its result.
pub struct Coordinator<T, E, P> {
	tabs: T,
	exports: E,
	prefs: P,
	clock: Box<dyn Fn() -> u64>,
	in_flight: Mutex<HashMap<TabId, ScrapeMode>>,
	events: EventBus,
}

impl<T: TabChannel, E: ExportSink, P: PreferenceStore> Coordinator<T, E, P> {
	/// `clock` returns the current Unix time in milliseconds.
	pub fn new(tabs: T, exports: E, prefs: P, clock: impl Fn() -> u64 + 'static) -> Self {
		Self {
			tabs,
			exports,
			prefs,
			clock: Box::new(clock),
			in_flight: Mutex::new(HashMap::new()),
			events: EventBus::default(),
		}
	}

	pub fn tabs(&self) -> &T {
		&self.tabs
	}

	pub fn exports(&self) -> &E {
		&self.exports
	}

	/// Receives every page event except raw results.
	pub fn subscribe(&self) -> broadcast::Receiver<PageEvent> {
		self.events.subscribe()
	}

	/// Mode of the scrape in flight in `tab`.
	pub fn mode_of(&self, tab: TabId) -> Option<ScrapeMode> {
		self.in_flight.lock().get(&tab).cloned()
	}

	/// Forwards a popup request to the active tab.
	pub async fn handle_popup(&self, request: PopupRequest) -> CommandResult {
		let tab = match self.tabs.active_tab().await {
			Ok(Some(tab)) => tab,
			Ok(None) => return CommandResult::failure(Error::NoActiveTab.to_string()),
			Err(err) => return CommandResult::failure(err.to_string()),
		};
		self.dispatch(tab, request.to_page_command()).await
	}

	/// Starts an auto scrape from the context menu, in `tab` or the active tab.
	pub async fn quick_export(&self, tab: Option<TabId>) -> CommandResult {
		let tab = match tab {
			Some(tab) => Ok(tab),
			None => self.tabs.active_tab().await.and_then(|tab| tab.ok_or(Error::NoActiveTab)),
		};
		match tab {
			Ok(tab) => self.dispatch(tab, PageCommand::PerformScrape { mode: ScrapeMode::Auto }).await,
			Err(err) => {
				warn!(target = "scrape.coordinator", error = %err, "quick export without tab");
				self.exports.notify(&err.to_string()).await;
				CommandResult::failure(err.to_string())
			}
		}
	}

	/// Sends `command` to `tab`, injecting the content script once if needed.
	///
	/// A scrape's mode is recorded before delivery, since its result may
	/// arrive ahead of the acknowledgement. It is rolled back when delivery
	/// fails or the page reports it did not start.
	pub async fn dispatch(&self, tab: TabId, command: PageCommand) -> CommandResult {
		let previous = match &command {
			PageCommand::PerformScrape { mode } => Some(self.in_flight.lock().insert(tab, mode.clone())),
			_ => None,
		};

		let outcome = self.deliver(tab, &command).await;
		if let Some(previous) = previous {
			let started = matches!(&outcome, Ok(ack) if ack.get("started").and_then(Value::as_bool) != Some(false));
			if !started {
				self.restore_mode(tab, previous);
			}
		}

		match outcome {
			Ok(ack) => {
				debug!(target = "scrape.coordinator", tab, command = command.kind(), "command acknowledged");
				CommandResult::ok(ack)
			}
			Err(err) => {
				warn!(target = "scrape.coordinator", tab, command = command.kind(), error = %err, "command failed");
				CommandResult::failure(err.to_string())
			}
		}
	}

	fn restore_mode(&self, tab: TabId, previous: Option<ScrapeMode>) {
		let mut in_flight = self.in_flight.lock();
		match previous {
			Some(mode) => {
				in_flight.insert(tab, mode);
			}
			None => {
				in_flight.remove(&tab);
			}
		}
	}

	async fn deliver(&self, tab: TabId, command: &PageCommand) -> Result<Value> {
		match self.tabs.send(tab, command).await {
			Err(err) if err.is_missing_receiver() => {
				info!(target = "scrape.coordinator", tab, "injecting content script");
				self.tabs
					.inject(tab)
					.await
					.map_err(|err| Error::Injection(err.to_string()))?;
				self.tabs.send(tab, command).await
			}
			other => other,
		}
	}

	/// Handles a raw message from a content script.
	///
	/// Results are validated from their raw JSON so malformed payloads are
	/// reported instead of dropped.
	pub async fn handle_page_message(&self, tab: TabId, message: Value) -> Result<()> {
		if message.get("type").and_then(Value::as_str) == Some("SCRAPE_RESULT") {
			let data = message.get("data").unwrap_or(&Value::Null);
			self.export(tab, data).await;
			return Ok(());
		}
		let event: PageEvent =
			serde_json::from_value(message).map_err(|err| Error::InvalidMessage(err.to_string()))?;
		self.handle_page_event(tab, event).await;
		Ok(())
	}

	pub async fn handle_page_event(&self, tab: TabId, event: PageEvent) {
		match event {
			PageEvent::ScrapeResult { data } => {
				let data = Value::Array(data.into_iter().map(Value::from).collect());
				self.export(tab, &data).await;
			}
			// Rejected selections arrive as errors while the session keeps running.
			PageEvent::ElementAdded { .. } | PageEvent::ScrapeError { .. } => self.events.publish(event),
			PageEvent::ScrapeCanceled => {
				self.in_flight.lock().remove(&tab);
				self.events.publish(event);
			}
		}
	}

	async fn export(&self, tab: TabId, data: &Value) {
		let mode = self.in_flight.lock().remove(&tab);

		if is_empty(data) {
			warn!(target = "scrape.coordinator", tab, "result without data");
			self.exports.notify(NO_DATA_MESSAGE).await;
			return;
		}

		let prefs = self.prefs.load().await;
		let required = mode.as_ref().map_or(&[][..], |mode| expected_fields(mode, prefs.target));
		let records = match validate_records(data, required) {
			Ok(records) => records,
			Err(err) => {
				let err = Error::from(err);
				warn!(target = "scrape.coordinator", tab, error = %err, "rejected scrape result");
				self.events.publish(PageEvent::error(err.to_string()));
				self.exports.notify(&err.to_string()).await;
				return;
			}
		};

		let contents = scrape::encode(&records, &CsvOptions::from(&prefs));
		let file = ExportFile {
			file_name: export_file_name(&prefs.file_name_prefix, (self.clock)()),
			contents,
			save_as: prefs.prompt_on_download,
		};
		info!(target = "scrape.coordinator", tab, records = records.len(), file = %file.file_name, "exporting");
		self.events.publish(PageEvent::ScrapeResult { data: records });

		if let Err(err) = self.exports.download(file).await {
			let err = match err {
				Error::Download(_) => err,
				other => Error::Download(other.to_string()),
			};
			warn!(target = "scrape.coordinator", tab, error = %err, "download failed");
			self.exports.notify(&err.to_string()).await;
		}
	}
}

fn is_empty(data: &Value) -> bool {
	match data {
		Value::Null => true,
		Value::Array(items) => items.is_empty(),
		_ => false,
	}
}
