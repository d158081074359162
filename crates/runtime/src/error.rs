use scrape_protocol::ShapeError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Coordinator failure.
///
/// `Display` texts are shown to the user, either as the popup's error status
/// or as a notification.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
	/// Nothing listens in the tab; the content script must be injected.
	#[error("content script not found")]
	ContentScriptMissing,

	#[error("Failed to inject content script: {0}")]
	Injection(String),

	#[error("No active tab found to perform scrape.")]
	NoActiveTab,

	/// Any other messaging failure reported by the browser.
	#[error("{0}")]
	Transport(String),

	#[error("invalid page message: {0}")]
	InvalidMessage(String),

	#[error("Error converting data to CSV: {0}")]
	Conversion(#[from] ShapeError),

	#[error("Download failed: {0}")]
	Download(String),
}

impl Error {
	/// Whether injecting the content script may fix the failure.
	pub fn is_missing_receiver(&self) -> bool {
		matches!(self, Error::ContentScriptMissing)
	}
}
