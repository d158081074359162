//! Integration tests for the `scrape` binary.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

fn scrape(config: &Path, args: &[&str], stdin: Option<&str>) -> Output {
	let mut child = Command::new(env!("CARGO_BIN_EXE_scrape"))
		.arg("--config")
		.arg(config)
		.args(args)
		.stdin(Stdio::piped())
		.stdout(Stdio::piped())
		.stderr(Stdio::piped())
		.spawn()
		.expect("failed to execute scrape");

	let mut pipe = child.stdin.take().unwrap();
	pipe.write_all(stdin.unwrap_or_default().as_bytes()).unwrap();
	drop(pipe);

	child.wait_with_output().unwrap()
}

fn stdout(output: &Output) -> String {
	String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn converts_result_message_from_stdin() {
	let tmp = TempDir::new().unwrap();
	let config = tmp.path().join("prefs.json");
	let message = r#"{"type":"SCRAPE_RESULT","data":[{"url":"a","text":"x,y"},{"url":"a","text":"=1+1"}]}"#;

	let output = scrape(&config, &["csv"], Some(message));

	assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
	assert_eq!(stdout(&output), "url,text\na,\"x,y\"\na,'=1+1\n");
}

#[test]
fn writes_output_file_with_stored_delimiter() {
	let tmp = TempDir::new().unwrap();
	let config = tmp.path().join("prefs.json");
	let input = tmp.path().join("records.json");
	let out = tmp.path().join("out.csv");
	fs::write(&input, r#"[{"name":"Ada","age":36},{"name":"Alan"}]"#).unwrap();

	let set = scrape(&config, &["prefs", "set", "--delimiter", ";"], None);
	assert!(set.status.success());

	let output = scrape(
		&config,
		&["csv", input.to_str().unwrap(), "-o", out.to_str().unwrap()],
		None,
	);
	assert!(output.status.success());
	assert_eq!(fs::read_to_string(&out).unwrap(), "name;age\nAda;36\nAlan;");
}

#[test]
fn explicit_headers_and_no_headers() {
	let tmp = TempDir::new().unwrap();
	let config = tmp.path().join("prefs.json");
	let input = r#"[{"a":"1","b":"2"}]"#;

	let output = scrape(&config, &["csv", "--headers", "b,a"], Some(input));
	assert_eq!(stdout(&output), "b,a\n2,1\n");

	let output = scrape(&config, &["csv", "--no-headers"], Some(input));
	assert_eq!(stdout(&output), "1,2\n");
}

#[test]
fn empty_list_prints_nothing() {
	let tmp = TempDir::new().unwrap();
	let output = scrape(&tmp.path().join("prefs.json"), &["csv"], Some("[]"));
	assert!(output.status.success());
	assert_eq!(stdout(&output), "");
}

#[test]
fn malformed_input_fails() {
	let tmp = TempDir::new().unwrap();
	let output = scrape(&tmp.path().join("prefs.json"), &["csv"], Some(r#"{"type":"SCRAPE_ERROR"}"#));
	assert!(!output.status.success());
	assert!(String::from_utf8_lossy(&output.stderr).contains("neither a SCRAPE_RESULT message"));
}

#[test]
fn prefs_show_reports_defaults() {
	let tmp = TempDir::new().unwrap();
	let output = scrape(&tmp.path().join("prefs.json"), &["prefs", "show"], None);
	let prefs: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
	assert_eq!(prefs["delimiter"], ",");
	assert_eq!(prefs["fileNamePrefix"], "data");
	assert_eq!(prefs["target"], "headings");
}
