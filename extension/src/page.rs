//! `web-sys` implementation of the page abstraction.

use std::collections::HashMap;

use scrape::{Document, DomEvent, Layer, LayerId, ListenerId, ListenerKind, Node, PromptAction, Rect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{AddEventListenerOptions, Element, Event, HtmlElement, KeyboardEvent};

use crate::content;

/// DOM node compared by identity.
#[derive(Debug, Clone)]
pub struct WebNode(pub web_sys::Node);

impl Node for WebNode {
    fn is_element(&self) -> bool {
        self.0.node_type() == web_sys::Node::ELEMENT_NODE
    }

    fn parent_element(&self) -> Option<Self> {
        self.0.parent_element().map(|el| WebNode(el.into()))
    }

    fn tag_name(&self) -> Option<String> {
        self.0
            .dyn_ref::<Element>()
            .map(|el| el.tag_name().to_ascii_uppercase())
    }

    fn text_content(&self) -> Option<String> {
        self.0.text_content()
    }

    fn client_rect(&self) -> Rect {
        match self.0.dyn_ref::<Element>() {
            Some(el) => {
                let r = el.get_bounding_client_rect();
                Rect::new(r.top(), r.left(), r.width(), r.height())
            }
            None => Rect::default(),
        }
    }

    fn is_same_node(&self, other: &Self) -> bool {
        self.0.is_same_node(Some(&other.0))
    }

    fn query_selector_all(&self, selector: &str) -> Vec<Self> {
        match self.0.dyn_ref::<Element>() {
            Some(el) => collect(el.query_selector_all(selector).ok()),
            None => Vec::new(),
        }
    }

    fn cells(&self) -> Vec<Self> {
        match self.0.dyn_ref::<web_sys::HtmlTableRowElement>() {
            Some(row) => {
                let cells = row.cells();
                (0..cells.length())
                    .filter_map(|i| cells.item(i))
                    .map(|el| WebNode(el.into()))
                    .collect()
            }
            None => Vec::new(),
        }
    }
}

fn collect(list: Option<web_sys::NodeList>) -> Vec<WebNode> {
    let Some(list) = list else {
        return Vec::new();
    };
    (0..list.length())
        .filter_map(|i| list.item(i))
        .map(WebNode)
        .collect()
}

struct MountedLayer {
    element: HtmlElement,
    _handlers: Vec<Closure<dyn FnMut(Event)>>,
}

struct Listener {
    kind: ListenerKind,
    closure: Closure<dyn FnMut(Event)>,
}

/// The page the content script runs in.
///
/// Closures of removed listeners and layers may still be on the stack when
/// they are removed, so they are retired and dropped at the next dispatch.
pub struct WebDocument {
    window: web_sys::Window,
    document: web_sys::Document,
    layers: HashMap<LayerId, MountedLayer>,
    listeners: HashMap<ListenerId, Listener>,
    retired_listeners: Vec<Listener>,
    retired_layers: Vec<MountedLayer>,
    next_id: u64,
}

impl WebDocument {
    pub fn new() -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;
        Ok(Self {
            window,
            document,
            layers: HashMap::new(),
            listeners: HashMap::new(),
            retired_listeners: Vec::new(),
            retired_layers: Vec::new(),
            next_id: 0,
        })
    }

    /// Drops closures retired by earlier dispatches.
    pub fn collect_garbage(&mut self) {
        self.retired_listeners.clear();
        self.retired_layers.clear();
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn create_div(&self, layer: &Layer) -> Result<HtmlElement, JsValue> {
        let element: HtmlElement = self.document.create_element("div")?.dyn_into()?;
        let style = element.style();
        for (name, value) in layer.style() {
            style.set_property(name, value)?;
        }
        if let Some(rect) = layer.rect() {
            place(&element, rect)?;
        }
        Ok(element)
    }

    fn build_prompt(
        &self,
        element: &HtmlElement,
        message: &str,
        buttons: [(&str, PromptAction); 3],
    ) -> Result<Vec<Closure<dyn FnMut(Event)>>, JsValue> {
        let text = self.document.create_element("div")?;
        text.set_text_content(Some(message));
        element.append_child(&text)?;

        let mut handlers = Vec::new();
        for (label, action) in buttons {
            let button = self.document.create_element("button")?;
            button.set_text_content(Some(label));
            let handler = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
                event.stop_propagation();
                content::prompt_action(action);
            });
            button.add_event_listener_with_callback("click", handler.as_ref().unchecked_ref())?;
            element.append_child(&button)?;
            handlers.push(handler);
        }
        Ok(handlers)
    }

    fn try_mount(&mut self, layer: &Layer) -> Result<MountedLayer, JsValue> {
        let element = self.create_div(layer)?;
        let handlers = match layer {
            Layer::Prompt {
                message,
                add_more_label,
                export_label,
                cancel_label,
            } => self.build_prompt(
                &element,
                message,
                [
                    (*add_more_label, PromptAction::AddMore),
                    (*export_label, PromptAction::Export),
                    (*cancel_label, PromptAction::Dismiss),
                ],
            )?,
            Layer::Hover(_) | Layer::Highlight(_) => Vec::new(),
        };
        let body = self.document.body().ok_or("no body")?;
        body.append_child(&element)?;
        Ok(MountedLayer {
            element,
            _handlers: handlers,
        })
    }
}

fn place(element: &HtmlElement, rect: Rect) -> Result<(), JsValue> {
    let style = element.style();
    style.set_property("top", &format!("{}px", rect.top))?;
    style.set_property("left", &format!("{}px", rect.left))?;
    style.set_property("width", &format!("{}px", rect.width))?;
    style.set_property("height", &format!("{}px", rect.height))?;
    Ok(())
}

fn event_name(kind: ListenerKind) -> &'static str {
    match kind {
        ListenerKind::PointerMove => "mousemove",
        ListenerKind::Click => "click",
        ListenerKind::KeyDown => "keydown",
    }
}

/// Translates a browser event for the listener kind it was registered as.
fn translate(kind: ListenerKind, event: &Event) -> Option<DomEvent<WebNode>> {
    match kind {
        ListenerKind::PointerMove | ListenerKind::Click => {
            let target: web_sys::Node = event.target()?.dyn_into().ok()?;
            let target = WebNode(target);
            Some(if kind == ListenerKind::Click {
                DomEvent::Click { target }
            } else {
                DomEvent::PointerMove { target }
            })
        }
        ListenerKind::KeyDown => {
            let key = event.dyn_ref::<KeyboardEvent>()?.key();
            Some(DomEvent::KeyDown { key })
        }
    }
}

impl Document for WebDocument {
    type Node = WebNode;

    fn location(&self) -> Option<String> {
        self.window.location().href().ok()
    }

    fn query_selector_all(&self, selector: &str) -> Vec<WebNode> {
        collect(self.document.query_selector_all(selector).ok())
    }

    fn scroll_offset(&self) -> (f64, f64) {
        (
            self.window.scroll_x().unwrap_or_default(),
            self.window.scroll_y().unwrap_or_default(),
        )
    }

    fn mount_layer(&mut self, layer: Layer) -> LayerId {
        let id = LayerId(self.next());
        match self.try_mount(&layer) {
            Ok(mounted) => {
                self.layers.insert(id, mounted);
            }
            Err(err) => {
                tracing::warn!(target = "scrape.page", error = ?err, "failed to mount layer");
            }
        }
        id
    }

    fn move_layer(&mut self, id: LayerId, rect: Rect) {
        if let Some(layer) = self.layers.get(&id) {
            let _ = place(&layer.element, rect);
        }
    }

    fn remove_layer(&mut self, id: LayerId) {
        if let Some(layer) = self.layers.remove(&id) {
            layer.element.remove();
            self.retired_layers.push(layer);
        }
    }

    fn add_listener(&mut self, kind: ListenerKind) -> ListenerId {
        let id = ListenerId(self.next());
        let closure = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            if let Some(dom_event) = translate(kind, &event) {
                content::dispatch(id, dom_event, &event);
            }
        });

        let options = AddEventListenerOptions::new();
        options.set_capture(true);
        let added = self
            .document
            .add_event_listener_with_callback_and_add_event_listener_options(
                event_name(kind),
                closure.as_ref().unchecked_ref(),
                &options,
            );
        if let Err(err) = added {
            tracing::warn!(target = "scrape.page", error = ?err, "failed to add listener");
        }
        self.listeners.insert(id, Listener { kind, closure });
        id
    }

    fn remove_listener(&mut self, id: ListenerId) {
        if let Some(listener) = self.listeners.remove(&id) {
            let _ = self.document.remove_event_listener_with_callback_and_bool(
                event_name(listener.kind),
                listener.closure.as_ref().unchecked_ref(),
                true,
            );
            self.retired_listeners.push(listener);
        }
    }

    fn request_animation_frame(&mut self) {
        let callback = Closure::once_into_js(content::animation_frame);
        let _ = self
            .window
            .request_animation_frame(callback.unchecked_ref());
    }
}
