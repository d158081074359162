//! Popup page: four buttons and a status line.

use std::cell::RefCell;

use scrape::{PopupAction, PopupController};
use scrape_protocol::{CommandResult, PageEvent, Preferences};
use tracing::warn;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, HtmlButtonElement, HtmlElement};

use crate::chrome;

const STATUS_ID: &str = "status";
const ERROR_CLASS: &str = "status-error";

thread_local! {
    static POPUP: RefCell<PopupController> = RefCell::new(PopupController::default());
}

fn document() -> Option<Document> {
    web_sys::window()?.document()
}

fn render() {
    let Some(document) = document() else {
        return;
    };
    POPUP.with(|popup| {
        let popup = popup.borrow();
        if let Some(status) = document.get_element_by_id(STATUS_ID) {
            status.set_text_content(Some(&popup.status().text));
            let _ = status
                .class_list()
                .toggle_with_force(ERROR_CLASS, popup.status().is_error);
        }
        for action in PopupAction::ALL {
            let Some(button) = document
                .get_element_by_id(action.button_id())
                .and_then(|el| el.dyn_into::<HtmlButtonElement>().ok())
            else {
                continue;
            };
            button.set_disabled(!popup.buttons_enabled());
            if !popup.offers(action) {
                let _ = button.style().set_property("display", "none");
            }
        }
    });
}

async fn send(action: PopupAction) {
    let Some(request) = POPUP.with(|popup| popup.borrow_mut().begin(action)) else {
        return;
    };
    render();

    let outcome = match chrome::to_js(&request) {
        Ok(message) => match JsFuture::from(chrome::runtime_send_message(&message)).await {
            Ok(reply) => serde_wasm_bindgen::from_value::<CommandResult>(reply).map_err(|err| err.to_string()),
            Err(err) => Err(chrome::stringify_js_error(err)),
        },
        Err(err) => Err(chrome::stringify_js_error(err)),
    };
    if let Err(err) = &outcome {
        warn!(target = "scrape.popup", action = ?action, error = %err, "request failed");
    }

    POPUP.with(|popup| popup.borrow_mut().complete(outcome));
    render();
}

/// Relayed events come from the background worker, never from a tab.
fn on_message(message: JsValue, sender: JsValue, _send_response: js_sys::Function) -> bool {
    if chrome::sender_tab(&sender).is_some() {
        return false;
    }
    if let Ok(event) = serde_wasm_bindgen::from_value::<PageEvent>(message) {
        POPUP.with(|popup| popup.borrow_mut().on_event(&event));
        render();
    }
    false
}

pub async fn start() -> Result<(), JsValue> {
    let prefs = match JsFuture::from(chrome::storage_sync_get(&JsValue::NULL)).await {
        Ok(items) => serde_wasm_bindgen::from_value(items).unwrap_or_default(),
        Err(err) => {
            warn!(target = "scrape.popup", error = %chrome::stringify_js_error(err), "using default preferences");
            Preferences::default()
        }
    };
    POPUP.with(|popup| *popup.borrow_mut() = PopupController::new(&prefs));

    let document = document().ok_or("no document")?;
    for action in PopupAction::ALL {
        let Some(button) = document.get_element_by_id(action.button_id()) else {
            continue;
        };
        let button: HtmlElement = button.dyn_into()?;
        let on_click = Closure::<dyn FnMut()>::new(move || {
            wasm_bindgen_futures::spawn_local(send(action));
        });
        button.set_onclick(Some(on_click.as_ref().unchecked_ref()));
        on_click.forget();
    }

    let messages = Closure::<dyn FnMut(JsValue, JsValue, js_sys::Function) -> bool>::new(on_message);
    chrome::runtime_on_message_add_listener(&messages);
    messages.forget();

    render();
    Ok(())
}
