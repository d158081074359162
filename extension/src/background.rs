//! Background worker: hosts the coordinator.

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use scrape_protocol::{PageCommand, PopupRequest, Preferences, TabId};
use scrape_runtime::{Coordinator, Error, ExportFile, ExportSink, PreferenceStore, Result, TabChannel};
use serde_json::{Value, json};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::chrome::{self, get};

const CONTENT_SCRIPT: &str = "content.js";
const MENU_ID: &str = "quickExport";
const NOTIFICATION_TITLE: &str = "Data Miner";
const NOTIFICATION_ICON: &str = "icons/icon48.png";
/// Browser message when no content script listens in the tab.
const NO_RECEIVER: &str = "Receiving end does not exist";

type Background = Coordinator<ChromeTabs, ChromeExports, SyncPreferences>;

thread_local! {
    static COORDINATOR: RefCell<Option<Rc<Background>>> = const { RefCell::new(None) };
}

pub struct ChromeTabs;

#[async_trait(?Send)]
impl TabChannel for ChromeTabs {
    async fn active_tab(&self) -> Result<Option<TabId>> {
        let query = chrome::to_js(&json!({ "active": true, "currentWindow": true })).map_err(transport)?;
        let tabs = JsFuture::from(chrome::tabs_query(&query)).await.map_err(transport)?;
        let tab = js_sys::Array::from(&tabs).get(0);
        Ok(get(&tab, "id").and_then(|id| id.as_f64()).map(|id| id as TabId))
    }

    async fn send(&self, tab: TabId, command: &PageCommand) -> Result<Value> {
        let message = chrome::to_js(command).map_err(transport)?;
        match JsFuture::from(chrome::tabs_send_message(tab, &message)).await {
            Ok(reply) if reply.is_undefined() => Err(Error::ContentScriptMissing),
            Ok(reply) => serde_wasm_bindgen::from_value(reply).map_err(|err| Error::Transport(err.to_string())),
            Err(err) => {
                let message = chrome::stringify_js_error(err);
                if message.contains(NO_RECEIVER) {
                    Err(Error::ContentScriptMissing)
                } else {
                    Err(Error::Transport(message))
                }
            }
        }
    }

    async fn inject(&self, tab: TabId) -> Result<()> {
        let injection = chrome::to_js(&json!({
            "target": { "tabId": tab },
            "files": [CONTENT_SCRIPT],
        }))
        .map_err(transport)?;
        JsFuture::from(chrome::scripting_execute_script(&injection))
            .await
            .map_err(transport)?;
        Ok(())
    }
}

pub struct ChromeExports;

#[async_trait(?Send)]
impl ExportSink for ChromeExports {
    async fn download(&self, file: ExportFile) -> Result<()> {
        // Service workers have no object URLs; data URLs carry the CSV instead.
        let encoded = String::from(js_sys::encode_uri_component(&file.contents));
        let options = chrome::to_js(&json!({
            "url": format!("data:text/csv;charset=utf-8,{encoded}"),
            "filename": file.file_name,
            "saveAs": file.save_as,
        }))
        .map_err(transport)?;
        let id = JsFuture::from(chrome::downloads_download(&options))
            .await
            .map_err(|err| Error::Download(chrome::stringify_js_error(err)))?;
        debug!(target = "scrape.background", download = ?id.as_f64(), "download started");
        Ok(())
    }

    async fn notify(&self, message: &str) {
        let options = chrome::to_js(&json!({
            "type": "basic",
            "iconUrl": NOTIFICATION_ICON,
            "title": NOTIFICATION_TITLE,
            "message": message,
        }));
        let shown = match options {
            Ok(options) => JsFuture::from(chrome::notifications_create(&options)).await.map(|_| ()),
            Err(err) => Err(err),
        };
        if let Err(err) = shown {
            info!(target = "scrape.background", message, error = %chrome::stringify_js_error(err), "notification");
        }
    }
}

pub struct SyncPreferences;

#[async_trait(?Send)]
impl PreferenceStore for SyncPreferences {
    async fn load(&self) -> Preferences {
        let items = match JsFuture::from(chrome::storage_sync_get(&JsValue::NULL)).await {
            Ok(items) => items,
            Err(err) => {
                warn!(target = "scrape.background", error = %chrome::stringify_js_error(err), "preferences unavailable");
                return Preferences::default();
            }
        };
        serde_wasm_bindgen::from_value(items).unwrap_or_default()
    }
}

fn transport(err: JsValue) -> Error {
    Error::Transport(chrome::stringify_js_error(err))
}

fn coordinator() -> Option<Rc<Background>> {
    COORDINATOR.with(|c| c.borrow().clone())
}

fn now_millis() -> u64 {
    js_sys::Date::now() as u64
}

fn respond<T: serde::Serialize>(send_response: &js_sys::Function, value: &T) {
    match chrome::to_js(value) {
        Ok(value) => {
            let _ = send_response.call1(&JsValue::NULL, &value);
        }
        Err(err) => warn!(target = "scrape.background", error = %chrome::stringify_js_error(err), "unserializable reply"),
    }
}

/// Routes a runtime message. Returns `true` when the reply is sent later.
fn on_message(message: JsValue, sender: JsValue, send_response: js_sys::Function) -> bool {
    let Some(coordinator) = coordinator() else {
        return false;
    };

    if let Some(tab) = chrome::sender_tab(&sender) {
        let Ok(message) = serde_wasm_bindgen::from_value::<Value>(message) else {
            return false;
        };
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(err) = coordinator.handle_page_message(tab, message).await {
                warn!(target = "scrape.background", tab, error = %err, "ignored page message");
            }
        });
        return false;
    }

    let Ok(request) = serde_wasm_bindgen::from_value::<PopupRequest>(message) else {
        return false;
    };
    wasm_bindgen_futures::spawn_local(async move {
        let result = coordinator.handle_popup(request).await;
        respond(&send_response, &result);
    });
    true
}

fn on_menu_click(info: JsValue, tab: JsValue) {
    if get(&info, "menuItemId").and_then(|id| id.as_string()).as_deref() != Some(MENU_ID) {
        return;
    }
    let Some(coordinator) = coordinator() else {
        return;
    };
    let tab = get(&tab, "id").and_then(|id| id.as_f64()).map(|id| id as TabId);
    wasm_bindgen_futures::spawn_local(async move {
        coordinator.quick_export(tab).await;
    });
}

fn on_installed(_details: JsValue) {
    let properties = chrome::to_js(&json!({
        "id": MENU_ID,
        "title": "Export CSV",
        "contexts": ["all"],
    }));
    match properties {
        Ok(properties) => chrome::context_menus_create(&properties),
        Err(err) => warn!(target = "scrape.background", error = %chrome::stringify_js_error(err), "context menu"),
    }
}

/// Forwards relayed page events to open popups.
async fn relay(coordinator: Rc<Background>) {
    let mut events = coordinator.subscribe();
    loop {
        match events.recv().await {
            Ok(event) => {
                let Ok(message) = chrome::to_js(&event) else {
                    continue;
                };
                // Rejects when no popup is open.
                let _ = JsFuture::from(chrome::runtime_send_message(&message)).await;
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(target = "scrape.background", skipped, "relay lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

pub fn start() {
    let coordinator = Rc::new(Coordinator::new(ChromeTabs, ChromeExports, SyncPreferences, now_millis));
    COORDINATOR.with(|c| *c.borrow_mut() = Some(coordinator.clone()));

    let installed = Closure::<dyn FnMut(JsValue)>::new(on_installed);
    chrome::runtime_on_installed_add_listener(&installed);
    installed.forget();

    let menu = Closure::<dyn FnMut(JsValue, JsValue)>::new(on_menu_click);
    chrome::context_menus_on_clicked_add_listener(&menu);
    menu.forget();

    let messages = Closure::<dyn FnMut(JsValue, JsValue, js_sys::Function) -> bool>::new(on_message);
    chrome::runtime_on_message_add_listener(&messages);
    messages.forget();

    wasm_bindgen_futures::spawn_local(relay(coordinator));
    info!(target = "scrape.background", "background worker started");
}
