
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use scrape_protocol::TargetKind;

use crate::styles::cli_styles;

/// Offline companion of the page-data exporter.
#[derive(Parser, Debug)]
#[command(name = "scrape")]
#[command(about = "Convert scrape results to CSV and manage export preferences")]
#[command(version)]
#[command(styles = cli_styles())]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Preference file to use instead of the default location
	#[arg(long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Convert a saved SCRAPE_RESULT message or a JSON list of records to CSV.
	Csv(CsvArgs),
	/// Show or change stored preferences.
	Prefs(PrefsArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CsvArgs {
	/// JSON input file (stdin when omitted)
	#[arg(value_name = "INPUT")]
	pub input: Option<PathBuf>,

	/// CSV output file (stdout when omitted)
	#[arg(short, long, value_name = "FILE")]
	pub output: Option<PathBuf>,

	/// Field delimiter, defaults to the stored preference
	#[arg(long, value_name = "CHAR")]
	pub delimiter: Option<char>,

	/// Quote character
	#[arg(long, value_name = "CHAR")]
	pub quote: Option<char>,

	/// Omit the header row
	#[arg(long)]
	pub no_headers: bool,

	/// Explicit column order
	#[arg(long, value_name = "NAMES", value_delimiter = ',')]
	pub headers: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct PrefsArgs {
	#[command(subcommand)]
	pub action: PrefsAction,
}

#[derive(Subcommand, Debug, Clone)]
pub enum PrefsAction {
	/// Print the effective preferences as JSON.
	Show,
	/// Update and save preferences.
	Set(PrefsSetArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct PrefsSetArgs {
	#[arg(long, value_name = "CHAR")]
	pub delimiter: Option<char>,

	#[arg(long, value_name = "BOOL")]
	pub include_headers: Option<bool>,

	#[arg(long, value_name = "BOOL")]
	pub auto_detect: Option<bool>,

	/// File name prefix of downloads
	#[arg(long, value_name = "PREFIX")]
	pub prefix: Option<String>,

	#[arg(long, value_name = "BOOL")]
	pub prompt_on_download: Option<bool>,

	/// Elements targeted by scrapes
	#[arg(long, value_enum)]
	pub target: Option<TargetArg>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum TargetArg {
	/// H1 and H2 headings
	Headings,
	/// The first table, row by row
	Tables,
}

impl From<TargetArg> for TargetKind {
	fn from(target: TargetArg) -> Self {
		match target {
			TargetArg::Headings => TargetKind::Headings,
			TargetArg::Tables => TargetKind::Tables,
		}
	}
}
