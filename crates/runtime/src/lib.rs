//! Coordinator of the page-data exporter.
//!
//! Sits between the popup and the content scripts: forwards commands to the
//! active tab (injecting the content script when it is missing), relays page
//! events to every open UI, and turns scrape results into CSV downloads.
//!
//! # Main Types
//!
//! - [`Coordinator`] - Command routing and export pipeline
//! - [`TabChannel`], [`ExportSink`], [`PreferenceStore`] - Browser collaborators
//! - [`EventBus`] - Broadcast of page events to UI subscribers

mod coordinator;
mod error;
mod events;
mod platform;


pub use coordinator::{Coordinator, NO_DATA_MESSAGE};
pub use error::{Error, Result};
pub use events::EventBus;
pub use platform::{ExportFile, ExportSink, PreferenceStore, TabChannel};
