use scrape_protocol::PageEvent;
use tokio::sync::broadcast;
use tracing::trace;

/// Fan-out of page events to every open UI.
#[derive(Debug, Clone)]
pub struct EventBus {
	sender: broadcast::Sender<PageEvent>,
}

impl EventBus {
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	pub fn publish(&self, event: PageEvent) {
		if let Err(err) = self.sender.send(event) {
			trace!(target = "scrape.events", event = err.0.kind(), "no subscribers");
		}
	}

	pub fn subscribe(&self) -> broadcast::Receiver<PageEvent> {
		self.sender.subscribe()
	}
}

impl Default for EventBus {
	fn default() -> Self {
		Self::new(64)
	}
}
