//! CLI integration tests

use std::process::Command;

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = Command::new("cargo")
        .args(["run", "-p", "nurd-cli", "--", "--help"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("NURD"), "Should show app name");
    assert!(stdout.contains("jobs"), "Should show jobs command");
    assert!(stdout.contains("job"), "Should show job command");
    assert!(stdout.contains("health"), "Should show health command");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = Command::new("cargo")
        .args(["run", "-p", "nurd-cli", "--", "--version"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("nurdctl"), "Should show binary name");
}

/// Test jobs subcommand help
#[test]
fn test_jobs_help() {
    let output = Command::new("cargo")
        .args(["run", "-p", "nurd-cli", "--", "jobs", "--help"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Jobs help should succeed");
    assert!(stdout.contains("--namespace"), "Should show namespace option");
    assert!(stdout.contains("--latest"), "Should show latest option");
}

/// Test that an unreachable API is reported as an error
#[test]
fn test_unreachable_api_fails() {
    let output = Command::new("cargo")
        .args([
            "run",
            "-p",
            "nurd-cli",
            "--",
            "--api-url",
            "http://127.0.0.1:1",
            "jobs",
        ])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Unreachable API should fail");
}
