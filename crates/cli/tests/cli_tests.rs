//! CLI integration tests

use std::process::Command;

fn irisctl(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_irisctl"))
        .args(args)
        .output()
        .expect("Failed to execute command")
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = irisctl(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("Iris classifier"), "Should show app name");
    assert!(stdout.contains("predict"), "Should show predict command");
    assert!(stdout.contains("retrain"), "Should show retrain command");
    assert!(stdout.contains("model"), "Should show model command");
    assert!(stdout.contains("health"), "Should show health command");
    assert!(stdout.contains("--admin-url"), "Should show admin url option");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = irisctl(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("irisctl"), "Should show binary name");
}

/// Test predict subcommand help
#[test]
fn test_predict_help() {
    let output = irisctl(&["predict", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Predict help should succeed");
    assert!(stdout.contains("SEPAL_LENGTH"), "Should list sepal length");
    assert!(stdout.contains("PETAL_WIDTH"), "Should list petal width");
}

/// Test that predict requires all four measurements
#[test]
fn test_predict_requires_four_values() {
    let output = irisctl(&["predict", "5.1", "3.5", "1.4"]);
    assert!(!output.status.success(), "Should fail with three values");
}

/// Test that non-numeric measurements are rejected before any request
#[test]
fn test_predict_rejects_non_numeric() {
    let output = irisctl(&["predict", "5.1", "wide", "1.4", "0.2"]);
    assert!(!output.status.success(), "Should fail on non-numeric value");
}

/// Test invalid output format
#[test]
fn test_invalid_format() {
    let output = irisctl(&["--format", "yaml", "health"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success(), "Should fail with invalid format");
    assert!(stderr.contains("invalid value"), "Should report invalid value");
}

/// Test that an unreachable server is reported as an error
#[test]
fn test_unreachable_server() {
    let output = irisctl(&["--api-url", "http://127.0.0.1:1", "health"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success(), "Should fail without a server");
    assert!(stderr.contains("Failed to send request"));
}
