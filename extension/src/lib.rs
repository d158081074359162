//! WebAssembly entry points of the page-data exporter extension.
//!
//! One module serves all three contexts; each context's JavaScript shim
//! loads it and calls its entry point:
//!
//! - `background.js` calls [`start_background`]
//! - `content.js` calls [`start_content`]
//! - `popup.js` calls [`start_popup`]

mod background;
mod chrome;
mod content;
mod log;
mod page;
mod popup;

use wasm_bindgen::prelude::*;

#[wasm_bindgen(js_name = startBackground)]
pub fn start_background() {
    console_error_panic_hook::set_once();
    log::init("background");
    background::start();
}

#[wasm_bindgen(js_name = startContent)]
pub fn start_content() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    log::init("content");
    content::start()
}

#[wasm_bindgen(js_name = startPopup)]
pub async fn start_popup() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    log::init("popup");
    popup::start().await
}
