//! Page-side logic of the page-data exporter.
//!
//! Everything here is independent of the browser: the DOM is reached through
//! the [`Document`] and [`Node`] traits, and events leave through an
//! [`EventSink`]. The wasm adapter implements those traits on `web-sys`.
//!
//! # Main Types
//!
//! - [`PageContext`] - Per-page owner of the selection session and overlays
//! - [`SelectionSession`] - Elements picked during a manual scrape
//! - [`HoverOverlay`] - Pointer-tracking box used to pick elements
//! - [`Strategy`] - Auto, single and manual extraction
//! - [`PopupController`] - State behind the popup buttons
//!
//! CSV encoding lives in [`csv`], sanitization in [`sanitize`].

pub mod csv;
pub mod dom;
mod error;
pub mod extract;
pub mod overlay;
pub mod popup;
pub mod sanitize;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use csv::{CsvOptions, encode};
pub use dom::{Disposition, Document, DomEvent, Layer, LayerId, ListenerId, ListenerKind, Node, PromptAction, Rect};
pub use error::{ErrorKind, ExtractionError, Result};
pub use extract::Strategy;
pub use overlay::{ConfirmationPrompt, HoverOutcome, HoverOverlay};
pub use popup::{PopupAction, PopupController, PopupStatus};
pub use sanitize::{Captured, sanitize};
pub use session::{EventSink, PageContext, SelectionSession, SessionConfig, SessionState};
