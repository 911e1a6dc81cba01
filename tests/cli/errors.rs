//! Tests for error handling and CLI flags.

use crate::support::*;
use predicates::prelude::*;

#[test]
fn test_help_lists_commands() {
    let t = Test::new();

    let output = t.cmd().arg("--help").output().unwrap();
    assert_success(&output);
    assert_stdout_contains(&output, "start");
    assert_stdout_contains(&output, "status");
}

#[test]
fn test_unknown_command_fails() {
    let t = Test::new();

    let output = t.cmd().arg("unknown-command").output().unwrap();
    assert_failure(&output);
}

#[test]
fn test_version_flag() {
    let t = Test::new();

    let output = t.cmd().arg("--version").output().unwrap();
    assert_success(&output);
    assert_stdout_contains(&output, "openslides");
}

#[test]
fn test_verbose_flag_logs_to_stderr() {
    let t = Test::new();
    let source = Responder::serve(200, full_listing("v1"));

    let output = t
        .cmd()
        .arg("--verbose")
        .arg("start")
        .arg("--data-dir")
        .arg(t.dir.path())
        .args(["--source-url", &source.url])
        .output()
        .unwrap();
    assert_success(&output);
    assert_stderr_contains(&output, "fetching component listing");
}

#[test]
fn test_completions_bash_outputs_script() {
    let t = Test::new();

    t.cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("openslides"));
}

#[test]
fn test_start_help_lists_flags() {
    let t = Test::new();

    t.cmd()
        .args(["start", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--ref"))
        .stdout(predicate::str::contains("--force"))
        .stdout(predicate::str::contains("OPENSLIDES_HTTP_PORT"));
}

#[test]
fn test_same_ports_rejected() {
    let t = Test::new();

    let output = t.start(
        "http://127.0.0.1:1",
        &["--http-port", "9000", "--manage-port", "9000"],
    );
    assert_failure(&output);
    assert_stderr_contains(&output, "manage_port");
    assert_nothing_written(t.dir.path());
}

#[test]
fn test_empty_ref_rejected() {
    let t = Test::new();

    let output = t.start("http://127.0.0.1:1", &["--ref", ""]);
    assert_failure(&output);
    assert_stderr_contains(&output, "'ref'");
}

#[test]
fn test_missing_config_file() {
    let t = Test::new();

    let output = t.start("http://127.0.0.1:1", &["--config", "/nonexistent/manage.toml"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "config file not found");
}

#[test]
fn test_unknown_config_field() {
    let t = Test::new();
    let config = t.write_config("[bootstrap]\nport = 80\n");

    let output = t.start("http://127.0.0.1:1", &["--config", config.to_str().unwrap()]);
    assert_failure(&output);
    assert_stderr_contains(&output, "failed to parse config");
}

#[test]
fn test_unreachable_source() {
    let t = Test::new();

    let output = t.start("http://127.0.0.1:1", &[]);
    assert_failure(&output);
    assert_stderr_contains(&output, "request to version source failed");
    assert_nothing_written(t.dir.path());
}
