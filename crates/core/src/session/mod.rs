//! Per-page selection session.
//!
//! [`PageContext`] owns everything a page needs while scraping: the
//! [`SelectionSession`], the hover overlay and the confirmation prompt. It
//! receives commands from the coordinator, DOM events from the listeners it
//! registered, and emits [`PageEvent`]s through an [`EventSink`].
//!
//! # States
//!
//! ```text
//! Idle --PERFORM_SCRAPE(single)--> AwaitingHoverTarget --click/Escape--> Idle
//! Idle --PERFORM_SCRAPE(manual)--> ManualCollecting --finalize/cancel--> Idle
//! ```
//!
//! Auto scrapes run synchronously and never leave `Idle`.

mod state;


use scrape_protocol::{ExportCommand, PageCommand, PageEvent, Preferences, TargetKind, records_from_value};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

pub use self::state::{SelectionSession, SessionState};
use crate::dom::{Disposition, Document, DomEvent, ListenerId, Node, PromptAction};
use crate::error::{ExtractionError, Result};
use crate::extract::{Strategy, has_accepted_tag};
use crate::overlay::{ConfirmationPrompt, HoverOutcome, HoverOverlay};
use crate::sanitize::sanitize;

/// Receiver of events leaving the page.
pub trait EventSink {
	fn emit(&mut self, event: PageEvent);
}

impl EventSink for Vec<PageEvent> {
	fn emit(&mut self, event: PageEvent) {
		self.push(event);
	}
}

/// Behavior knobs of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
	pub target: TargetKind,
	/// `KeyboardEvent.key` that cancels selection.
	pub cancel_key: String,
	/// Ask "Add more elements?" after each accepted element instead of
	/// re-arming the overlay straight away.
	pub confirm_each_selection: bool,
}

impl Default for SessionConfig {
	fn default() -> Self {
		Self {
			target: TargetKind::default(),
			cancel_key: "Escape".to_string(),
			confirm_each_selection: true,
		}
	}
}

impl From<&Preferences> for SessionConfig {
	fn from(prefs: &Preferences) -> Self {
		Self {
			target: prefs.target,
			..Self::default()
		}
	}
}

/// Page-side owner of the selection session.
pub struct PageContext<D: Document, S> {
	document: D,
	sink: S,
	config: SessionConfig,
	session: SelectionSession<D::Node>,
	overlay: HoverOverlay<D::Node>,
	prompt: ConfirmationPrompt,
}

impl<D: Document, S: EventSink> PageContext<D, S> {
	pub fn new(document: D, sink: S, config: SessionConfig) -> Self {
		let overlay = HoverOverlay::new(config.cancel_key.clone());
		Self {
			document,
			sink,
			config,
			session: SelectionSession::default(),
			overlay,
			prompt: ConfirmationPrompt::default(),
		}
	}

	pub fn document(&self) -> &D {
		&self.document
	}

	pub fn document_mut(&mut self) -> &mut D {
		&mut self.document
	}

	pub fn sink(&self) -> &S {
		&self.sink
	}

	pub fn sink_mut(&mut self) -> &mut S {
		&mut self.sink
	}

	pub fn config(&self) -> &SessionConfig {
		&self.config
	}

	/// Applies new settings; takes effect for the next session.
	pub fn set_config(&mut self, config: SessionConfig) {
		self.config = config;
	}

	pub fn state(&self) -> SessionState {
		self.session.state()
	}

	pub fn selected_count(&self) -> usize {
		self.session.len()
	}

	pub fn prompt_shown(&self) -> bool {
		self.prompt.is_shown()
	}

	pub fn overlay_armed(&self) -> bool {
		self.overlay.is_armed()
	}

	/// Runs a coordinator command and returns the acknowledgement sent back.
	pub fn handle_command(&mut self, command: &PageCommand) -> Value {
		debug!(target = "scrape.session", command = command.kind(), "page command");
		let export = ExportCommand::from(command);
		// Auto runs regardless; a selection is only begun from idle.
		let starts = export == ExportCommand::Auto || self.session.is_idle();
		self.execute(export);
		match export {
			ExportCommand::Cancel => json!({ "canceled": true }),
			ExportCommand::Finalize => json!({ "finalized": true }),
			ExportCommand::Auto | ExportCommand::Manual | ExportCommand::Single => json!({ "started": starts }),
		}
	}

	pub fn execute(&mut self, command: ExportCommand) {
		match command {
			ExportCommand::Auto => self.run(Strategy::Auto),
			ExportCommand::Manual => self.begin_manual(),
			ExportCommand::Single => self.begin_single(),
			ExportCommand::Cancel => self.cancel(),
			ExportCommand::Finalize => self.finalize(),
		}
	}

	/// Dispatches an event delivered to one of the registered listeners.
	pub fn handle_event(&mut self, listener: ListenerId, event: DomEvent<D::Node>) -> Disposition {
		if self.session.owns_listener(listener) {
			return match event {
				DomEvent::KeyDown { key } if key == self.config.cancel_key => {
					self.cancel();
					Disposition::Consumed
				}
				_ => Disposition::Ignored,
			};
		}

		match self.overlay.handle(&mut self.document, listener, event) {
			HoverOutcome::Ignored | HoverOutcome::Moved => Disposition::Ignored,
			HoverOutcome::Committed(node) => {
				self.commit(node);
				Disposition::Consumed
			}
			HoverOutcome::Dismissed => {
				self.abandon();
				Disposition::Consumed
			}
		}
	}

	pub fn on_animation_frame(&mut self) {
		self.overlay.on_frame(&mut self.document);
	}

	/// Handles a button on the confirmation prompt. Stale clicks are ignored.
	pub fn on_prompt_action(&mut self, action: PromptAction) {
		if !self.prompt.dismiss(&mut self.document) {
			return;
		}
		match action {
			PromptAction::AddMore => self.overlay.arm(&mut self.document),
			PromptAction::Export => self.finalize(),
			PromptAction::Dismiss => self.cancel(),
		}
	}

	fn begin_single(&mut self) {
		if !self.session.is_idle() {
			debug!(target = "scrape.session", state = ?self.session.state(), "session already active");
			return;
		}
		self.session.start_single();
		self.overlay.arm(&mut self.document);
	}

	fn begin_manual(&mut self) {
		if !self.session.is_idle() {
			debug!(target = "scrape.session", state = ?self.session.state(), "session already active");
			return;
		}
		self.session.start_manual(&mut self.document);
		self.overlay.arm(&mut self.document);
		info!(target = "scrape.session", target_kind = ?self.config.target, "manual selection started");
	}

	fn commit(&mut self, node: Option<D::Node>) {
		match self.session.state() {
			SessionState::AwaitingHoverTarget => {
				self.session.end(&mut self.document);
				match node {
					Some(node) => self.run(Strategy::Single(node)),
					None => self.sink.emit(PageEvent::ScrapeCanceled),
				}
			}
			SessionState::ManualCollecting => self.accept(node),
			SessionState::Idle => {}
		}
	}

	fn accept(&mut self, node: Option<D::Node>) {
		let node = match self.check_selection(node) {
			Ok(node) => node,
			Err(err) => {
				warn!(target = "scrape.session", error = %err, "selection rejected");
				self.sink.emit(PageEvent::error(err.to_string()));
				self.overlay.arm(&mut self.document);
				return;
			}
		};

		let count = self.session.push(&mut self.document, node);
		debug!(target = "scrape.session", count, "element selected");
		self.sink.emit(PageEvent::ElementAdded { count });

		if self.config.confirm_each_selection {
			self.prompt.show(&mut self.document);
		} else {
			self.overlay.arm(&mut self.document);
		}
	}

	fn check_selection(&self, node: Option<D::Node>) -> Result<D::Node> {
		let node = node.filter(Node::is_element).ok_or(ExtractionError::InvalidSelection)?;
		if !has_accepted_tag(&node, self.config.target) {
			return Err(ExtractionError::NotAccepted {
				allowed: self.config.target.accepted_tags().join(" or "),
			});
		}
		if self.session.contains(&node) {
			return Err(ExtractionError::AlreadySelected);
		}
		Ok(node)
	}

	fn finalize(&mut self) {
		self.overlay.disarm(&mut self.document);
		self.prompt.dismiss(&mut self.document);
		let selected = self.session.end(&mut self.document);
		self.run(Strategy::Manual { selected });
	}

	fn cancel(&mut self) {
		self.overlay.disarm(&mut self.document);
		self.prompt.dismiss(&mut self.document);
		self.session.end(&mut self.document);
		info!(target = "scrape.session", "scrape canceled");
		self.sink.emit(PageEvent::ScrapeCanceled);
	}

	/// The overlay was dismissed with the cancel key.
	fn abandon(&mut self) {
		match self.session.state() {
			SessionState::AwaitingHoverTarget => {
				self.session.end(&mut self.document);
				self.sink.emit(PageEvent::ScrapeCanceled);
			}
			SessionState::ManualCollecting => self.cancel(),
			SessionState::Idle => {}
		}
	}

	fn run(&mut self, strategy: Strategy<D::Node>) {
		let name = strategy.name();
		let outcome = strategy
			.extract(&self.document, self.config.target)
			.map(sanitize)
			.and_then(|value| records_from_value(value).map_err(ExtractionError::from));

		match outcome {
			Ok(data) => {
				info!(target = "scrape.session", strategy = name, records = data.len(), "scrape finished");
				self.sink.emit(PageEvent::ScrapeResult { data });
			}
			Err(err) => {
				warn!(target = "scrape.session", strategy = name, error = %err, "scrape failed");
				self.sink.emit(PageEvent::error(err.to_string()));
			}
		}
	}
}
