//! Host-side tooling for the page-data exporter.
//!
//! The `scrape` binary converts saved scrape results to CSV with the same
//! encoder the extension uses, and manages the preference file that mirrors
//! the extension's options page.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod prefs_store;
pub mod styles;
