use scrape_protocol::ShapeError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Failure while turning page content into records.
///
/// The `Display` text is what the user sees in the `SCRAPE_ERROR` event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
	#[error("No H1 or H2 elements found on page")]
	NoHeadings,

	#[error("No table found on page")]
	NoTable,

	#[error("Invalid selection")]
	InvalidSelection,

	#[error("Only H1 and H2 elements can be scraped")]
	NotAHeading,

	#[error("Only {allowed} elements allowed")]
	NotAccepted { allowed: String },

	#[error("You already selected this element")]
	AlreadySelected,

	#[error("Unable to retrieve page URL")]
	MissingUrl,

	#[error("No elements selected")]
	NothingSelected,

	#[error(transparent)]
	Shape(#[from] ShapeError),
}

/// Coarse classification deciding what happens to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	/// Bad element or payload; the session stays usable.
	Validation,
	/// The session cannot produce a result and is torn down.
	SessionState,
	/// Data could not be converted for export.
	Conversion,
}

impl ExtractionError {
	pub fn kind(&self) -> ErrorKind {
		match self {
			ExtractionError::InvalidSelection
			| ExtractionError::NotAHeading
			| ExtractionError::NotAccepted { .. }
			| ExtractionError::AlreadySelected => ErrorKind::Validation,
			ExtractionError::NoHeadings
			| ExtractionError::NoTable
			| ExtractionError::MissingUrl
			| ExtractionError::NothingSelected => ErrorKind::SessionState,
			ExtractionError::Shape(_) => ErrorKind::Conversion,
		}
	}
}
