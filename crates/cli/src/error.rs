use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	#[error("no configuration directory on this platform; pass --config")]
	NoConfigDir,

	#[error("failed to write preferences to {path}")]
	SavePreferences {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("input is neither a SCRAPE_RESULT message nor a list of records")]
	UnrecognizedInput,

	#[error(transparent)]
	Shape(#[from] scrape_protocol::ShapeError),

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}
