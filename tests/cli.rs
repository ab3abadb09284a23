use assert_cmd::prelude::*;
use predicates::str::contains;
use std::process::Command;

#[test]
fn cli_rejects_unknown_flags() {
    let mut cmd = Command::cargo_bin("orbit-viewer").expect("binary exists");
    cmd.arg("--bogus");
    cmd.assert()
        .failure()
        .stderr(contains("Unknown argument: --bogus"))
        .stderr(contains("Usage: orbit-viewer"));
}

#[test]
fn cli_rejects_a_second_positional_argument() {
    let mut cmd = Command::cargo_bin("orbit-viewer").expect("binary exists");
    cmd.arg("first.png").arg("second.png");
    cmd.assert()
        .failure()
        .stderr(contains("Unknown argument: second.png"));
}
