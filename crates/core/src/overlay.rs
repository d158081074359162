//! Transient visuals: the hover overlay, selection highlights and the
//! confirmation prompt.
//!
//! None of these know about selection rules. The session decides what a
//! committed element means; the renderer only mounts and removes layers.

use crate::dom::{Document, DomEvent, Layer, LayerId, ListenerId, ListenerKind, Node, Rect};

pub const PROMPT_MESSAGE: &str = "Add more elements?";
pub const PROMPT_ADD_MORE: &str = "Yes";
pub const PROMPT_EXPORT: &str = "Export";
pub const PROMPT_CANCEL: &str = "Cancel";

/// What a hover-overlay listener made of an event.
#[derive(Debug)]
pub enum HoverOutcome<N> {
	/// Not an overlay listener, or an irrelevant event.
	Ignored,
	/// Pointer moved; a redraw may have been scheduled.
	Moved,
	/// The user clicked. Holds the element under the pointer, if any.
	/// The overlay is already torn down.
	Committed(Option<N>),
	/// The cancel key was pressed. The overlay is already torn down.
	Dismissed,
}

#[derive(Debug, Clone, Copy)]
struct Armed {
	layer: LayerId,
	pointer: ListenerId,
	click: ListenerId,
	key: ListenerId,
}

/// Single box tracking the element under the pointer.
///
/// Pointer moves only record the latest target; the box is repositioned on
/// the next animation frame, so any burst of moves costs one redraw.
#[derive(Debug)]
pub struct HoverOverlay<N> {
	armed: Option<Armed>,
	last_target: Option<N>,
	redraw_pending: bool,
	cancel_key: String,
}

impl<N: Node> HoverOverlay<N> {
	pub fn new(cancel_key: impl Into<String>) -> Self {
		Self {
			armed: None,
			last_target: None,
			redraw_pending: false,
			cancel_key: cancel_key.into(),
		}
	}

	pub fn is_armed(&self) -> bool {
		self.armed.is_some()
	}

	pub fn redraw_pending(&self) -> bool {
		self.redraw_pending
	}

	/// Whether `listener` belongs to the armed overlay.
	pub fn owns(&self, listener: ListenerId) -> bool {
		self.armed
			.is_some_and(|a| a.pointer == listener || a.click == listener || a.key == listener)
	}

	/// Mounts the overlay and its listeners, replacing any previous instance.
	pub fn arm<D: Document<Node = N>>(&mut self, doc: &mut D) {
		self.disarm(doc);
		let layer = doc.mount_layer(Layer::Hover(Rect::default()));
		self.armed = Some(Armed {
			layer,
			pointer: doc.add_listener(ListenerKind::PointerMove),
			click: doc.add_listener(ListenerKind::Click),
			key: doc.add_listener(ListenerKind::KeyDown),
		});
	}

	/// Removes the overlay and its listeners. Safe when not armed.
	pub fn disarm<D: Document<Node = N>>(&mut self, doc: &mut D) {
		if let Some(armed) = self.armed.take() {
			doc.remove_listener(armed.pointer);
			doc.remove_listener(armed.click);
			doc.remove_listener(armed.key);
			doc.remove_layer(armed.layer);
		}
		self.last_target = None;
		self.redraw_pending = false;
	}

	pub fn handle<D: Document<Node = N>>(&mut self, doc: &mut D, listener: ListenerId, event: DomEvent<N>) -> HoverOutcome<N> {
		if !self.owns(listener) {
			return HoverOutcome::Ignored;
		}

		match event {
			DomEvent::PointerMove { target } => {
				self.last_target = Some(target);
				if !self.redraw_pending {
					self.redraw_pending = true;
					doc.request_animation_frame();
				}
				HoverOutcome::Moved
			}
			DomEvent::Click { target } => {
				self.disarm(doc);
				HoverOutcome::Committed(target.element_or_parent())
			}
			DomEvent::KeyDown { key } if key == self.cancel_key => {
				self.disarm(doc);
				HoverOutcome::Dismissed
			}
			DomEvent::KeyDown { .. } => HoverOutcome::Ignored,
		}
	}

	/// Repositions the box over the latest pointer target.
	pub fn on_frame<D: Document<Node = N>>(&mut self, doc: &mut D) {
		self.redraw_pending = false;
		let Some(armed) = self.armed else {
			return;
		};
		let Some(target) = self.last_target.clone().and_then(Node::element_or_parent) else {
			return;
		};
		let rect = target.client_rect().offset(doc.scroll_offset());
		doc.move_layer(armed.layer, rect);
	}
}

/// Mounts a non-interactive highlight over `node`, in page coordinates.
pub fn mount_highlight<D: Document>(doc: &mut D, node: &D::Node) -> LayerId {
	let rect = node.client_rect().offset(doc.scroll_offset());
	doc.mount_layer(Layer::Highlight(rect))
}

/// Prompt asking whether to keep selecting or export.
#[derive(Debug, Default)]
pub struct ConfirmationPrompt {
	layer: Option<LayerId>,
}

impl ConfirmationPrompt {
	pub fn is_shown(&self) -> bool {
		self.layer.is_some()
	}

	/// Shows the prompt, replacing any previous instance.
	pub fn show<D: Document>(&mut self, doc: &mut D) {
		self.dismiss(doc);
		self.layer = Some(doc.mount_layer(Layer::Prompt {
			message: PROMPT_MESSAGE,
			add_more_label: PROMPT_ADD_MORE,
			export_label: PROMPT_EXPORT,
			cancel_label: PROMPT_CANCEL,
		}));
	}

	/// Removes the prompt. Returns `false` if none was shown.
	pub fn dismiss<D: Document>(&mut self, doc: &mut D) -> bool {
		match self.layer.take() {
			Some(layer) => {
				doc.remove_layer(layer);
				true
			}
			None => false,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{MockDocument, MockNode};

	fn armed_overlay(doc: &mut MockDocument) -> HoverOverlay<MockNode> {
		let mut overlay = HoverOverlay::new("Escape");
		overlay.arm(doc);
		overlay
	}

	fn listener(doc: &MockDocument, kind: ListenerKind) -> ListenerId {
		doc.listeners_of(kind)[0]
	}

	#[test]
	fn arming_twice_keeps_a_single_overlay() {
		let mut doc = MockDocument::new("https://example.com");
		let mut overlay = armed_overlay(&mut doc);
		overlay.arm(&mut doc);

		assert_eq!(doc.count_layers(|l| matches!(l, Layer::Hover(_))), 1);
		assert_eq!(doc.listener_count(), 3);
	}

	#[test]
	fn pointer_moves_coalesce_into_one_frame() {
		let mut doc = MockDocument::new("https://example.com");
		let heading = MockNode::element("H1", "Title").with_rect(Rect::new(10.0, 20.0, 100.0, 30.0));
		doc.append(&heading);
		doc.scroll = (5.0, 50.0);
		let mut overlay = armed_overlay(&mut doc);
		let pointer = listener(&doc, ListenerKind::PointerMove);

		for _ in 0..5 {
			overlay.handle(&mut doc, pointer, DomEvent::PointerMove { target: heading.clone() });
		}
		assert_eq!(doc.frame_requests, 1);
		assert!(overlay.redraw_pending());

		overlay.on_frame(&mut doc);
		assert!(!overlay.redraw_pending());
		assert_eq!(doc.hover_rect(), Some(Rect::new(60.0, 25.0, 100.0, 30.0)));

		overlay.handle(&mut doc, pointer, DomEvent::PointerMove { target: heading });
		assert_eq!(doc.frame_requests, 2);
	}

	#[test]
	fn text_targets_resolve_to_parent_element() {
		let mut doc = MockDocument::new("https://example.com");
		let heading = MockNode::container("H2").with_rect(Rect::new(1.0, 2.0, 3.0, 4.0));
		let text = MockNode::text_node("inner");
		heading.append(&text);
		doc.append(&heading);
		let mut overlay = armed_overlay(&mut doc);

		let click = listener(&doc, ListenerKind::Click);
		match overlay.handle(&mut doc, click, DomEvent::Click { target: text }) {
			HoverOutcome::Committed(Some(node)) => assert!(node.is_same_node(&heading)),
			other => panic!("expected commit, got {other:?}"),
		}
	}

	#[test]
	fn click_and_cancel_key_tear_everything_down() {
		let mut doc = MockDocument::new("https://example.com");
		let mut overlay = armed_overlay(&mut doc);
		let key = listener(&doc, ListenerKind::KeyDown);

		let outcome = overlay.handle(&mut doc, key, DomEvent::KeyDown { key: "a".into() });
		assert!(matches!(outcome, HoverOutcome::Ignored));
		assert!(overlay.is_armed());

		let outcome = overlay.handle(&mut doc, key, DomEvent::KeyDown { key: "Escape".into() });
		assert!(matches!(outcome, HoverOutcome::Dismissed));
		assert!(!overlay.is_armed());
		assert_eq!(doc.listener_count(), 0);
		assert!(doc.layers().is_empty());
	}

	#[test]
	fn foreign_listeners_are_ignored() {
		let mut doc = MockDocument::new("https://example.com");
		let other = doc.add_listener(ListenerKind::Click);
		let mut overlay = armed_overlay(&mut doc);
		let outcome = overlay.handle(&mut doc, other, DomEvent::Click { target: MockNode::element("P", "x") });
		assert!(matches!(outcome, HoverOutcome::Ignored));
		assert!(overlay.is_armed());
	}

	#[test]
	fn prompt_replaces_previous_instance() {
		let mut doc = MockDocument::new("https://example.com");
		let mut prompt = ConfirmationPrompt::default();
		prompt.show(&mut doc);
		prompt.show(&mut doc);
		assert_eq!(doc.count_layers(|l| matches!(l, Layer::Prompt { .. })), 1);
		assert_eq!(
			doc.count_layers(|l| matches!(l, Layer::Prompt { cancel_label: PROMPT_CANCEL, .. })),
			1
		);

		assert!(prompt.dismiss(&mut doc));
		assert!(!prompt.dismiss(&mut doc));
		assert!(doc.layers().is_empty());
	}

	#[test]
	fn highlight_uses_page_coordinates() {
		let mut doc = MockDocument::new("https://example.com");
		doc.scroll = (0.0, 200.0);
		let node = MockNode::element("H1", "x").with_rect(Rect::new(10.0, 10.0, 50.0, 20.0));
		mount_highlight(&mut doc, &node);
		assert_eq!(doc.layers(), [&Layer::Highlight(Rect::new(210.0, 10.0, 50.0, 20.0))]);
	}
}
