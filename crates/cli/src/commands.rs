//! Command implementations.

use std::fs;
use std::io::{self, Read, Write};

use anyhow::{Context, Result};
use scrape::CsvOptions;
use scrape_protocol::{Preferences, ScrapeRecord, records_from_value, validate_records};
use serde_json::Value;
use tracing::{info, warn};

use crate::cli::{Cli, Commands, CsvArgs, PrefsAction, PrefsSetArgs};
use crate::error::CliError;
use crate::prefs_store::PreferenceFile;

pub fn dispatch(cli: Cli) -> Result<()> {
	let store = PreferenceFile::resolve(cli.config)?;
	match cli.command {
		Commands::Csv(args) => csv(&args, &store.load()),
		Commands::Prefs(prefs) => match prefs.action {
			PrefsAction::Show => {
				println!("{}", serde_json::to_string_pretty(&store.load())?);
				Ok(())
			}
			PrefsAction::Set(set) => {
				let updated = apply(store.load(), set);
				store.save(&updated)?;
				info!(target = "scrape.prefs", path = %store.path().display(), "preferences updated");
				println!("{}", serde_json::to_string_pretty(&updated)?);
				Ok(())
			}
		},
	}
}

fn csv(args: &CsvArgs, prefs: &Preferences) -> Result<()> {
	let input = match &args.input {
		Some(path) => fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?,
		None => {
			let mut buf = String::new();
			io::stdin().read_to_string(&mut buf).context("failed to read stdin")?;
			buf
		}
	};

	let records = parse_records(&input)?;
	let contents = scrape::encode(&records, &csv_options(args, prefs));
	info!(target = "scrape.csv", records = records.len(), "encoded");

	match &args.output {
		Some(path) => fs::write(path, &contents).with_context(|| format!("failed to write {}", path.display()))?,
		None => {
			let mut stdout = io::stdout().lock();
			stdout.write_all(contents.as_bytes())?;
			if !contents.is_empty() {
				stdout.write_all(b"\n")?;
			}
		}
	}
	Ok(())
}

/// Accepts a `SCRAPE_RESULT` message or a bare list of records.
pub fn parse_records(input: &str) -> Result<Vec<ScrapeRecord>, CliError> {
	let value: Value = serde_json::from_str(input)?;
	match value {
		Value::Object(ref message) if message.get("type").and_then(Value::as_str) == Some("SCRAPE_RESULT") => {
			let data = message.get("data").unwrap_or(&Value::Null);
			Ok(validate_records(data, &[])?)
		}
		Value::Array(_) => Ok(records_from_value(value)?),
		_ => Err(CliError::UnrecognizedInput),
	}
}

/// Stored preferences overridden by command-line flags.
pub fn csv_options(args: &CsvArgs, prefs: &Preferences) -> CsvOptions {
	let mut options = CsvOptions::from(prefs);
	if let Some(delimiter) = args.delimiter {
		options.delimiter = delimiter;
	}
	if let Some(quote) = args.quote {
		options.quote_char = quote;
	}
	if args.no_headers {
		options.include_headers = false;
	}
	if !args.headers.is_empty() {
		options.headers = Some(args.headers.clone());
	}
	options
}

pub fn apply(prefs: Preferences, set: PrefsSetArgs) -> Preferences {
	let requested = Preferences {
		delimiter: set.delimiter.unwrap_or(prefs.delimiter),
		include_headers: set.include_headers.unwrap_or(prefs.include_headers),
		auto_detect: set.auto_detect.unwrap_or(prefs.auto_detect),
		file_name_prefix: set.prefix.unwrap_or(prefs.file_name_prefix),
		prompt_on_download: set.prompt_on_download.unwrap_or(prefs.prompt_on_download),
		target: set.target.map_or(prefs.target, Into::into),
	};
	let validated = requested.clone().validated();
	if validated != requested {
		warn!(target = "scrape.prefs", "invalid values replaced by defaults");
	}
	validated
}
