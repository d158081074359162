//! In-memory page used by unit tests.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use scrape_protocol::PageEvent;

use crate::dom::{Disposition, Document, DomEvent, Layer, LayerId, ListenerId, ListenerKind, Node, PromptAction, Rect};
use crate::session::{PageContext, SessionConfig};

#[derive(Debug)]
struct NodeData {
	tag: Option<String>,
	text: Option<String>,
	rect: Cell<Rect>,
	parent: RefCell<Weak<NodeData>>,
	children: RefCell<Vec<MockNode>>,
}

/// Shared handle to a node of a tiny in-memory tree.
#[derive(Debug, Clone)]
pub struct MockNode(Rc<NodeData>);

impl MockNode {
	fn build(tag: Option<&str>, text: Option<&str>) -> Self {
		Self(Rc::new(NodeData {
			tag: tag.map(str::to_ascii_uppercase),
			text: text.map(str::to_string),
			rect: Cell::new(Rect::default()),
			parent: RefCell::new(Weak::new()),
			children: RefCell::new(Vec::new()),
		}))
	}

	/// Element with its own text.
	pub fn element(tag: &str, text: &str) -> Self {
		Self::build(Some(tag), Some(text))
	}

	/// Element whose text comes from its children.
	pub fn container(tag: &str) -> Self {
		Self::build(Some(tag), None)
	}

	pub fn text_node(text: &str) -> Self {
		Self::build(None, Some(text))
	}

	/// Node whose `textContent` is null.
	pub fn without_text() -> Self {
		Self::build(None, None)
	}

	pub fn with_rect(self, rect: Rect) -> Self {
		self.0.rect.set(rect);
		self
	}

	pub fn append(&self, child: &MockNode) {
		*child.0.parent.borrow_mut() = Rc::downgrade(&self.0);
		self.0.children.borrow_mut().push(child.clone());
	}

	fn descendants(&self, out: &mut Vec<MockNode>) {
		for child in self.0.children.borrow().iter() {
			out.push(child.clone());
			child.descendants(out);
		}
	}

	fn matches(&self, selector: &str) -> bool {
		let Some(tag) = &self.0.tag else {
			return false;
		};
		selector.split(',').any(|s| s.trim().eq_ignore_ascii_case(tag))
	}
}

impl Node for MockNode {
	fn is_element(&self) -> bool {
		self.0.tag.is_some()
	}

	fn parent_element(&self) -> Option<Self> {
		self.0.parent.borrow().upgrade().map(MockNode).filter(MockNode::is_element)
	}

	fn tag_name(&self) -> Option<String> {
		self.0.tag.clone()
	}

	fn text_content(&self) -> Option<String> {
		if let Some(text) = &self.0.text {
			return Some(text.clone());
		}
		if !self.is_element() {
			return None;
		}
		Some(
			self.0
				.children
				.borrow()
				.iter()
				.filter_map(MockNode::text_content)
				.collect(),
		)
	}

	fn client_rect(&self) -> Rect {
		self.0.rect.get()
	}

	fn is_same_node(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}

	fn query_selector_all(&self, selector: &str) -> Vec<Self> {
		let mut all = Vec::new();
		self.descendants(&mut all);
		all.retain(|n| n.matches(selector));
		all
	}

	fn cells(&self) -> Vec<Self> {
		self.0
			.children
			.borrow()
			.iter()
			.filter(|c| c.matches("td, th"))
			.cloned()
			.collect()
	}
}

/// Page with a body, mounted layers and registered listeners.
#[derive(Debug)]
pub struct MockDocument {
	pub url: Option<String>,
	body: MockNode,
	pub scroll: (f64, f64),
	pub frame_requests: usize,
	layers: IndexMap<LayerId, Layer>,
	listeners: IndexMap<ListenerId, ListenerKind>,
	next_id: u64,
}

impl MockDocument {
	pub fn new(url: &str) -> Self {
		Self {
			url: Some(url.to_string()),
			body: MockNode::container("BODY"),
			scroll: (0.0, 0.0),
			frame_requests: 0,
			layers: IndexMap::new(),
			listeners: IndexMap::new(),
			next_id: 0,
		}
	}

	pub fn append(&mut self, node: &MockNode) {
		self.body.append(node);
	}

	pub fn layers(&self) -> Vec<&Layer> {
		self.layers.values().collect()
	}

	pub fn count_layers(&self, pred: impl Fn(&Layer) -> bool) -> usize {
		self.layers.values().filter(|l| pred(l)).count()
	}

	pub fn hover_rect(&self) -> Option<Rect> {
		self.layers.values().find_map(|l| match l {
			Layer::Hover(rect) => Some(*rect),
			_ => None,
		})
	}

	pub fn listener_count(&self) -> usize {
		self.listeners.len()
	}

	/// Listeners of `kind` in registration order.
	pub fn listeners_of(&self, kind: ListenerKind) -> Vec<ListenerId> {
		self.listeners
			.iter()
			.filter(|(_, k)| **k == kind)
			.map(|(id, _)| *id)
			.collect()
	}

	pub fn has_listener(&self, id: ListenerId) -> bool {
		self.listeners.contains_key(&id)
	}

	fn next(&mut self) -> u64 {
		self.next_id += 1;
		self.next_id
	}
}

impl Document for MockDocument {
	type Node = MockNode;

	fn location(&self) -> Option<String> {
		self.url.clone()
	}

	fn query_selector_all(&self, selector: &str) -> Vec<MockNode> {
		self.body.query_selector_all(selector)
	}

	fn scroll_offset(&self) -> (f64, f64) {
		self.scroll
	}

	fn mount_layer(&mut self, layer: Layer) -> LayerId {
		let id = LayerId(self.next());
		self.layers.insert(id, layer);
		id
	}

	fn move_layer(&mut self, id: LayerId, rect: Rect) {
		if let Some(Layer::Hover(r) | Layer::Highlight(r)) = self.layers.get_mut(&id) {
			*r = rect;
		}
	}

	fn remove_layer(&mut self, id: LayerId) {
		self.layers.shift_remove(&id);
	}

	fn add_listener(&mut self, kind: ListenerKind) -> ListenerId {
		let id = ListenerId(self.next());
		self.listeners.insert(id, kind);
		id
	}

	fn remove_listener(&mut self, id: ListenerId) {
		self.listeners.shift_remove(&id);
	}

	fn request_animation_frame(&mut self) {
		self.frame_requests += 1;
	}
}

pub type MockContext = PageContext<MockDocument, Vec<PageEvent>>;

pub fn context(doc: MockDocument) -> MockContext {
	PageContext::new(doc, Vec::new(), SessionConfig::default())
}

/// Delivers `event` to every listener of `kind` the way the browser would:
/// in registration order, skipping listeners removed by an earlier one.
/// Returns `Consumed` if any listener consumed it.
pub fn fire(ctx: &mut MockContext, kind: ListenerKind, event: DomEvent<MockNode>) -> Disposition {
	let mut disposition = Disposition::Ignored;
	for id in ctx.document().listeners_of(kind) {
		if !ctx.document().has_listener(id) {
			continue;
		}
		if ctx.handle_event(id, event.clone()) == Disposition::Consumed {
			disposition = Disposition::Consumed;
		}
	}
	disposition
}

pub fn hover(ctx: &mut MockContext, target: &MockNode) {
	fire(ctx, ListenerKind::PointerMove, DomEvent::PointerMove { target: target.clone() });
}

pub fn click(ctx: &mut MockContext, target: &MockNode) -> Disposition {
	fire(ctx, ListenerKind::Click, DomEvent::Click { target: target.clone() })
}

pub fn press(ctx: &mut MockContext, key: &str) -> Disposition {
	fire(ctx, ListenerKind::KeyDown, DomEvent::KeyDown { key: key.to_string() })
}

/// Runs any pending animation frame.
pub fn frame(ctx: &mut MockContext) {
	ctx.on_animation_frame();
}

pub fn prompt(ctx: &mut MockContext, action: PromptAction) {
	ctx.on_prompt_action(action);
}
