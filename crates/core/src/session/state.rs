use crate::dom::{Document, LayerId, ListenerId, ListenerKind, Node};
use crate::overlay::mount_highlight;

/// Phase of the per-page selection session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionState {
	#[default]
	Idle,
	/// Single-select: waiting for one click on the hover overlay.
	AwaitingHoverTarget,
	/// Manual-select: collecting elements until finalize or cancel.
	ManualCollecting,
}

#[derive(Debug)]
struct Selected<N> {
	node: N,
	highlight: LayerId,
}

/// Elements picked so far, each paired with its highlight.
///
/// Every selected node owns exactly one highlight layer, and an idle session
/// holds neither nodes nor its cancel-key listener.
#[derive(Debug)]
pub struct SelectionSession<N> {
	state: SessionState,
	selected: Vec<Selected<N>>,
	key_listener: Option<ListenerId>,
}

impl<N> Default for SelectionSession<N> {
	fn default() -> Self {
		Self {
			state: SessionState::Idle,
			selected: Vec::new(),
			key_listener: None,
		}
	}
}

impl<N: Node> SelectionSession<N> {
	pub fn state(&self) -> SessionState {
		self.state
	}

	pub fn is_idle(&self) -> bool {
		self.state == SessionState::Idle
	}

	pub fn len(&self) -> usize {
		self.selected.len()
	}

	pub fn is_empty(&self) -> bool {
		self.selected.is_empty()
	}

	pub fn start_single(&mut self) {
		self.state = SessionState::AwaitingHoverTarget;
	}

	/// Enters manual collection with a fresh selection and a cancel-key listener.
	pub fn start_manual<D: Document<Node = N>>(&mut self, doc: &mut D) {
		self.end(doc);
		self.key_listener = Some(doc.add_listener(ListenerKind::KeyDown));
		self.state = SessionState::ManualCollecting;
	}

	pub fn owns_listener(&self, listener: ListenerId) -> bool {
		self.key_listener == Some(listener)
	}

	/// Identity check against the current selection.
	pub fn contains(&self, node: &N) -> bool {
		self.selected.iter().any(|s| s.node.is_same_node(node))
	}

	/// Adds `node` with its highlight and returns the new selection size.
	pub fn push<D: Document<Node = N>>(&mut self, doc: &mut D, node: N) -> usize {
		let highlight = mount_highlight(doc, &node);
		self.selected.push(Selected { node, highlight });
		self.selected.len()
	}

	/// Returns to idle, releasing every layer and listener.
	///
	/// Yields the selected nodes in selection order.
	pub fn end<D: Document<Node = N>>(&mut self, doc: &mut D) -> Vec<N> {
		if let Some(listener) = self.key_listener.take() {
			doc.remove_listener(listener);
		}
		self.state = SessionState::Idle;
		self.selected
			.drain(..)
			.map(|Selected { node, highlight }| {
				doc.remove_layer(highlight);
				node
			})
			.collect()
	}
}
