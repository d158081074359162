//! Content script: owns the page's selection session.

use std::cell::RefCell;

use scrape::{Disposition, DomEvent, EventSink, ListenerId, PageContext, PromptAction, SessionConfig};
use scrape_protocol::{PageCommand, PageEvent, Preferences};
use tracing::{debug, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::Event;

use crate::chrome::{self, runtime_on_message_add_listener, runtime_send_message, storage_sync_get};
use crate::page::{WebDocument, WebNode};

const LOADED_MARKER: &str = "__scrapeExportLoaded";

type Page = PageContext<WebDocument, RuntimeSink>;

thread_local! {
    static PAGE: RefCell<Option<Page>> = const { RefCell::new(None) };
}

/// Sends page events to the background worker.
pub struct RuntimeSink;

impl EventSink for RuntimeSink {
    fn emit(&mut self, event: PageEvent) {
        debug!(target = "scrape.content", event = event.kind(), "emit");
        let message = match chrome::to_js(&event) {
            Ok(message) => message,
            Err(err) => {
                warn!(target = "scrape.content", error = %chrome::stringify_js_error(err), "unserializable event");
                return;
            }
        };
        let promise = runtime_send_message(&message);
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(err) = JsFuture::from(promise).await {
                warn!(target = "scrape.content", error = %chrome::stringify_js_error(err), "event not delivered");
            }
        });
    }
}

/// Runs `f` on the page context unless it is already in use.
///
/// The closure currently running is never among the retired ones, so they
/// can be dropped on entry.
fn with_page<R>(f: impl FnOnce(&mut Page) -> R) -> Option<R> {
    PAGE.with(|page| match page.try_borrow_mut() {
        Ok(mut page) => page.as_mut().map(|page| {
            page.document_mut().collect_garbage();
            f(page)
        }),
        Err(_) => {
            warn!(target = "scrape.content", "re-entrant page access");
            None
        }
    })
}

pub fn dispatch(listener: ListenerId, dom_event: DomEvent<WebNode>, event: &Event) {
    let disposition = with_page(|page| page.handle_event(listener, dom_event));
    if disposition == Some(Disposition::Consumed) {
        event.prevent_default();
        event.stop_propagation();
    }
}

pub fn prompt_action(action: PromptAction) {
    with_page(|page| page.on_prompt_action(action));
}

pub fn animation_frame() {
    with_page(|page| page.on_animation_frame());
}

fn handle_message(message: JsValue, send_response: &js_sys::Function) -> bool {
    let Ok(command) = serde_wasm_bindgen::from_value::<PageCommand>(message) else {
        return false;
    };
    let Some(ack) = with_page(|page| page.handle_command(&command)) else {
        return false;
    };
    match chrome::to_js(&ack) {
        Ok(ack) => {
            let _ = send_response.call1(&JsValue::NULL, &ack);
        }
        Err(err) => {
            warn!(target = "scrape.content", error = %chrome::stringify_js_error(err), "unserializable ack");
        }
    }
    false
}

async fn load_preferences() -> Result<Preferences, JsValue> {
    let items = JsFuture::from(storage_sync_get(&JsValue::NULL)).await?;
    Ok(serde_wasm_bindgen::from_value(items)?)
}

pub fn start() -> Result<(), JsValue> {
    // Injection may run more than once per page; each run is a new module instance.
    let window = web_sys::window().ok_or("no window")?;
    let marker = JsValue::from_str(LOADED_MARKER);
    if js_sys::Reflect::get(&window, &marker)?.is_truthy() {
        debug!(target = "scrape.content", "content script already running");
        return Ok(());
    }
    js_sys::Reflect::set(&window, &marker, &JsValue::TRUE)?;

    let document = WebDocument::new()?;
    PAGE.with(|page| {
        *page.borrow_mut() = Some(PageContext::new(document, RuntimeSink, SessionConfig::default()));
    });

    let on_message = Closure::<dyn FnMut(JsValue, JsValue, js_sys::Function) -> bool>::new(
        |message: JsValue, _sender: JsValue, send_response: js_sys::Function| {
            handle_message(message, &send_response)
        },
    );
    runtime_on_message_add_listener(&on_message);
    on_message.forget();

    wasm_bindgen_futures::spawn_local(async {
        match load_preferences().await {
            Ok(prefs) => {
                with_page(|page| page.set_config(SessionConfig::from(&prefs)));
            }
            Err(err) => {
                warn!(target = "scrape.content", error = %chrome::stringify_js_error(err), "using default preferences");
            }
        }
    });
    Ok(())
}
