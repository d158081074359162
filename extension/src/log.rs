//! Console logging with a bounded log ring persisted to `chrome.storage.local`.

use std::cell::{Cell, RefCell};
use std::io;

use js_sys::Array;
use tracing_subscriber::fmt::MakeWriter;
use wasm_bindgen::JsValue;

use crate::chrome::{object, storage_local_set};

const LOG_LIMIT: usize = 40;

thread_local! {
    static LOG: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
    static CONTEXT: Cell<&'static str> = const { Cell::new("extension") };
}

/// Installs the `tracing` subscriber for this context.
///
/// `context` names the storage key the ring is persisted under, so the
/// background, content and popup logs do not overwrite each other.
pub fn init(context: &'static str) {
    CONTEXT.with(|c| c.set(context));
    let _ = tracing_subscriber::fmt()
        .with_writer(ConsoleWriter)
        .without_time()
        .with_target(true)
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub fn push_log(line: &str) {
    LOG.with(|log| {
        let mut vec = log.borrow_mut();
        vec.push(line.to_string());
        if vec.len() > LOG_LIMIT {
            let excess = vec.len() - LOG_LIMIT;
            vec.drain(0..excess);
        }
        persist_log(&vec);
    });
}

fn persist_log(lines: &[String]) {
    let array = Array::new();
    for line in lines {
        array.push(&JsValue::from_str(line));
    }
    let key = CONTEXT.with(|c| format!("scrape_log_{}", c.get()));
    if let Ok(items) = object(&[(key.as_str(), array.into())]) {
        let _ = storage_local_set(&items);
    }
}

#[derive(Clone, Copy)]
struct ConsoleWriter;

/// Buffers one formatted event and emits it when dropped.
struct LineWriter {
    buf: Vec<u8>,
}

impl io::Write for LineWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for LineWriter {
    fn drop(&mut self) {
        let text = String::from_utf8_lossy(&self.buf);
        let line = text.trim_end();
        if line.is_empty() {
            return;
        }
        web_sys::console::log_1(&JsValue::from_str(line));
        push_log(line);
    }
}

impl<'a> MakeWriter<'a> for ConsoleWriter {
    type Writer = LineWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LineWriter { buf: Vec::new() }
    }
}
