#![forbid(unsafe_code)]

use assert_cmd::Command;
use predicates::prelude::*;

// Smoke test: the binary parses its surface and refuses to run without a
// server command. No server, perf, or FlameGraph checkout needed.
#[test]
fn help_lists_the_harness_knobs() {
    Command::cargo_bin("volley")
        .expect("binary under test")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--shots"))
        .stdout(predicate::str::contains("--cooldown-ms"))
        .stdout(predicate::str::contains("--flamegraph-dir"));
}

#[test]
fn server_command_is_required() {
    Command::cargo_bin("volley")
        .expect("binary under test")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn missing_config_file_fails_before_spawning_anything() {
    Command::cargo_bin("volley")
        .expect("binary under test")
        .arg("--config")
        .arg("definitely-not-a-config.toml")
        .arg("some-server")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load config"));
}

#[test]
fn version_flag_works() {
    // Plain std invocation, same as the rest of the workspace's CLI tests.
    let output = std::process::Command::new(env!("CARGO_BIN_EXE_volley"))
        .arg("--version")
        .output()
        .expect("failed to run volley --version");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("volley"));
}
