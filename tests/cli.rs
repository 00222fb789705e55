// Binary smoke tests. The full TUI needs a TTY and a live backend, so only
// the argument surface is exercised here.

use assert_cmd::Command;

#[test]
fn help_describes_the_session() {
    let mut cmd = Command::cargo_bin("invigil").unwrap();
    let assert = cmd.arg("--help").assert().success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    assert!(stdout.contains("proctored"));
    assert!(stdout.contains("--session-id"));
}

#[test]
fn missing_required_args_fail() {
    let mut cmd = Command::cargo_bin("invigil").unwrap();
    cmd.assert().failure();
}

#[test]
fn session_id_is_required() {
    let mut cmd = Command::cargo_bin("invigil").unwrap();
    cmd.arg("some-test-link").assert().failure();
}
