use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::{Command, Output};
use tempfile::NamedTempFile;

const BINARY: &str = "keti-tsn";

fn binary_output(args: &[&str]) -> Output {
    #[allow(deprecated)]
    let mut command =
        Command::cargo_bin(BINARY).unwrap_or_else(|error| panic!("failed to locate {BINARY}: {error}"));
    command.args(args);
    command
        .output()
        .unwrap_or_else(|error| panic!("failed to run {BINARY}: {error}"))
}

#[test]
fn help_lists_usage() {
    let output = binary_output(&["--help"]);
    assert!(output.status.success(), "--help should succeed");
    let stdout = String::from_utf8(output.stdout).expect("stdout is UTF-8");
    assert!(stdout.contains("Usage:"));
    assert!(stdout.contains("fetch"));
    assert!(stdout.contains("patch"));
}

#[test]
fn without_subcommand_reports_usage_error() {
    let output = binary_output(&[]);
    assert!(!output.status.success(), "running without a subcommand should fail");
    let stderr = String::from_utf8(output.stderr).expect("stderr is UTF-8");
    assert!(stderr.contains("Usage:"));
}

#[test]
fn unknown_flag_is_rejected() {
    let output = binary_output(&["get", "--definitely-not-a-flag"]);
    assert!(!output.status.success());
}

#[test]
fn fetch_without_device_connection_fails_with_transport_error() {
    let output = binary_output(&["--device", "/nonexistent/tty", "fetch", "/a"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).expect("stderr is UTF-8");
    let diagnostic = predicate::str::starts_with("error:").and(predicate::str::contains("serial"));
    assert!(diagnostic.eval(stderr.trim()), "unexpected diagnostic: {stderr}");
}

#[test]
fn put_accepts_a_file_path_and_fails_on_connect_without_hardware() {
    let file = NamedTempFile::new().expect("create temp file");
    let path = file.path().to_str().expect("utf-8 path").to_string();
    let output = binary_output(&["--device", "/nonexistent/tty", "put", &path]);
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).expect("stderr is UTF-8");
    assert!(stderr.contains("error:"));
}
