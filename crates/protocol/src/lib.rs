//! Wire types for the page-data exporter.
//!
//! Three contexts exchange JSON messages tagged by `type`:
//!
//! 1. The popup sends a [`PopupRequest`] to the coordinator
//! 2. The coordinator forwards a [`PageCommand`] to the content script of the active tab
//! 3. The content script answers with an acknowledgement and later emits [`PageEvent`]s
//! 4. The coordinator resolves the popup request with a [`CommandResult`]
//!
//! # Main Types
//!
//! - [`ScrapeRecord`] - One exported row
//! - [`ScrapeMode`] - How a scrape is performed
//! - [`Preferences`] - User configuration shared by every context

mod messages;
mod preferences;
mod record;

pub use messages::{CommandResult, ExportCommand, PageCommand, PageEvent, PopupRequest, ScrapeMode, TabId};
pub use preferences::{DEFAULT_FILE_NAME_PREFIX, Preferences, TargetKind, export_file_name};
pub use record::{ScrapeRecord, ShapeError, expected_fields, records_from_value, validate_records};
