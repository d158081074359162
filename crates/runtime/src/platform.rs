//! Browser collaborators of the coordinator.
//!
//! Browser futures are not `Send`, so every trait here is `?Send`.

use async_trait::async_trait;
use scrape_protocol::{PageCommand, Preferences, TabId};
use serde_json::Value;

use crate::error::Result;

/// Messaging with content scripts.
#[async_trait(?Send)]
pub trait TabChannel {
	/// Tab of the focused window, if any.
	async fn active_tab(&self) -> Result<Option<TabId>>;

	/// Sends `command` and waits for the page's acknowledgement.
	///
	/// Must fail with [`Error::ContentScriptMissing`](crate::Error::ContentScriptMissing)
	/// when nothing in the tab answered.
	async fn send(&self, tab: TabId, command: &PageCommand) -> Result<Value>;

	/// Injects the content script into `tab`.
	async fn inject(&self, tab: TabId) -> Result<()>;
}

/// A CSV file ready to be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
	pub file_name: String,
	pub contents: String,
	/// Ask the user where to save.
	pub save_as: bool,
}

/// Downloads and user-facing notices.
#[async_trait(?Send)]
pub trait ExportSink {
	async fn download(&self, file: ExportFile) -> Result<()>;

	/// Shows `message` to the user. Best effort.
	async fn notify(&self, message: &str);
}

#[async_trait(?Send)]
pub trait PreferenceStore {
	/// Current preferences; missing or malformed entries fall back to defaults.
	async fn load(&self) -> Preferences;
}
