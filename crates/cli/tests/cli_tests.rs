//! CLI integration tests

use std::process::{Command, Output};

fn cmon(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cmon"))
        .args(args)
        .env_remove("CMON_API_URL")
        .output()
        .expect("Failed to execute command")
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = cmon(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("Component Monitor"), "Should show app name");
    assert!(stdout.contains("alert"), "Should show alert command");
    assert!(stdout.contains("root-cause"), "Should show root-cause command");
    assert!(stdout.contains("diagnose"), "Should show diagnose command");
    assert!(stdout.contains("latest"), "Should show latest command");
    assert!(stdout.contains("topology"), "Should show topology command");
    assert!(stdout.contains("disks"), "Should show disks command");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = cmon(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("cmon"), "Should show binary name");
}

#[test]
fn test_alert_help() {
    let output = cmon(&["alert", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("--cpu"), "Should show cpu option");
    assert!(stdout.contains("--mem"), "Should show mem option");
    assert!(stdout.contains("--response-ms"), "Should show response option");
}

#[test]
fn test_root_cause_help() {
    let output = cmon(&["root-cause", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("component") || stdout.contains("COMPONENT"));
}

#[test]
fn test_diagnose_help() {
    let output = cmon(&["diagnose", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("--window"), "Should show window option");
}

#[test]
fn test_disks_help() {
    let output = cmon(&["disks", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("disks"));
}

#[test]
fn test_format_option() {
    let output = cmon(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(stdout.contains("--format"), "Should show format option");
    assert!(stdout.contains("table"), "Should show table format");
    assert!(stdout.contains("json"), "Should show json format");
}

#[test]
fn test_api_url_option() {
    let output = cmon(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(stdout.contains("--api-url"), "Should show api-url option");
    assert!(stdout.contains("CMON_API_URL"), "Should show env var");
}

#[test]
fn test_invalid_command() {
    let output = cmon(&["explode"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success(), "Invalid command should fail");
    assert!(
        stderr.contains("error") || stderr.contains("invalid"),
        "Should show error message"
    );
}

#[test]
fn test_missing_argument() {
    let output = cmon(&["alert", "checkout", "--cpu", "50"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success(), "Missing --mem should fail");
    assert!(
        stderr.contains("required") || stderr.contains("error"),
        "Should show required argument error"
    );
}

#[test]
fn test_unreachable_server_fails() {
    let output = cmon(&["--api-url", "http://127.0.0.1:1", "latest"]);

    assert!(!output.status.success(), "Unreachable API should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to send request"));
}
