//! Browser-independent view of the page.
//!
//! [`Node`] is an opaque handle compared by identity, never by value.
//! [`Document`] owns the page-level side effects: layers drawn over the page,
//! capture-phase event listeners and animation-frame requests. The renderer
//! only ever holds [`LayerId`]s, never page content.

use std::fmt;

/// Box in CSS pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
	pub top: f64,
	pub left: f64,
	pub width: f64,
	pub height: f64,
}

impl Rect {
	pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
		Self {
			top,
			left,
			width,
			height,
		}
	}

	/// Translates a viewport-relative box into page coordinates.
	pub fn offset(self, (scroll_x, scroll_y): (f64, f64)) -> Self {
		Self {
			top: self.top + scroll_y,
			left: self.left + scroll_x,
			..self
		}
	}
}

/// Handle to a DOM node.
pub trait Node: Clone + fmt::Debug {
	/// `true` for element nodes; text and comment nodes return `false`.
	fn is_element(&self) -> bool;

	fn parent_element(&self) -> Option<Self>;

	/// Upper-case tag name, [`None`] for non-elements.
	fn tag_name(&self) -> Option<String>;

	/// `textContent`, [`None`] where the DOM reports null.
	fn text_content(&self) -> Option<String>;

	/// Viewport-relative bounding box.
	fn client_rect(&self) -> Rect;

	/// Identity comparison.
	fn is_same_node(&self, other: &Self) -> bool;

	/// Descendants matching a CSS selector, in document order.
	fn query_selector_all(&self, selector: &str) -> Vec<Self>;

	/// Cells of a table row.
	fn cells(&self) -> Vec<Self>;

	/// Trimmed text content, empty when absent.
	fn trimmed_text(&self) -> String {
		self.text_content().map(|t| t.trim().to_string()).unwrap_or_default()
	}

	/// Resolves an event target to an element: itself, or its parent element.
	fn element_or_parent(self) -> Option<Self> {
		if self.is_element() {
			Some(self)
		} else {
			self.parent_element()
		}
	}
}

/// Identifier of a layer mounted by [`Document::mount_layer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub u64);

/// Identifier of a listener registered by [`Document::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// Document-level listeners, all registered in the capture phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
	PointerMove,
	Click,
	KeyDown,
}

/// Event delivered to a listener.
#[derive(Debug, Clone)]
pub enum DomEvent<N> {
	PointerMove { target: N },
	Click { target: N },
	KeyDown { key: String },
}

/// Whether the page should still see an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
	Ignored,
	/// Call `preventDefault` and `stopPropagation`.
	Consumed,
}

/// Button pressed on the confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptAction {
	AddMore,
	Export,
	Dismiss,
}

/// Visual element drawn over the page.
#[derive(Debug, Clone, PartialEq)]
pub enum Layer {
	/// Box following the pointer, positioned in page coordinates.
	Hover(Rect),
	/// Box marking a confirmed selection, positioned in page coordinates.
	Highlight(Rect),
	/// Fixed-position prompt offering to add more elements, export, or cancel.
	Prompt {
		message: &'static str,
		add_more_label: &'static str,
		export_label: &'static str,
		/// Produces [`PromptAction::Dismiss`].
		cancel_label: &'static str,
	},
}

impl Layer {
	/// Inline CSS applied to the layer's root element.
	pub fn style(&self) -> &'static [(&'static str, &'static str)] {
		match self {
			Layer::Hover(_) => &[
				("position", "absolute"),
				("background", "rgba(0, 123, 255, 0.3)"),
				("pointer-events", "none"),
				("z-index", "2147483647"),
			],
			Layer::Highlight(_) => &[
				("position", "absolute"),
				("background", "rgba(0, 123, 255, 0.3)"),
				("pointer-events", "none"),
				("z-index", "2147483646"),
			],
			Layer::Prompt { .. } => &[
				("position", "fixed"),
				("top", "20px"),
				("right", "20px"),
				("background", "#fff"),
				("color", "#000"),
				("padding", "10px"),
				("z-index", "2147483647"),
				("border-radius", "8px"),
				("box-shadow", "0 0 10px rgba(0,0,0,0.3)"),
			],
		}
	}

	/// Page position for boxes, [`None`] for fixed layers.
	pub fn rect(&self) -> Option<Rect> {
		match self {
			Layer::Hover(rect) | Layer::Highlight(rect) => Some(*rect),
			Layer::Prompt { .. } => None,
		}
	}
}

/// The page a session runs in.
pub trait Document {
	type Node: Node;

	/// Current page URL, [`None`] when it cannot be resolved.
	fn location(&self) -> Option<String>;

	fn query_selector_all(&self, selector: &str) -> Vec<Self::Node>;

	/// Horizontal and vertical scroll offsets.
	fn scroll_offset(&self) -> (f64, f64);

	fn mount_layer(&mut self, layer: Layer) -> LayerId;

	/// Moves a box layer; unknown ids are ignored.
	fn move_layer(&mut self, id: LayerId, rect: Rect);

	/// Removes a layer; unknown ids are ignored.
	fn remove_layer(&mut self, id: LayerId);

	fn add_listener(&mut self, kind: ListenerKind) -> ListenerId;

	fn remove_listener(&mut self, id: ListenerId);

	/// Schedules one `on_animation_frame` call before the next repaint.
	fn request_animation_frame(&mut self);
}
