//! End-to-end smoke tests for the binary. No network: every case either stops
//! at argument validation or fails configuration resolution first.

use assert_cmd::Command;
use predicates::prelude::*;

/// Command with a scrubbed environment so the host's config and tokens cannot
/// leak into assertions.
fn sentry_tool(config_home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("sentry-tool").unwrap();
    cmd.env_remove("SENTRY_AUTH_TOKEN")
        .env_remove("SENTRY_URL")
        .env_remove("SENTRY_ORG")
        .env_remove("SENTRY_PROJECT")
        .env_remove("SENTRY_PROFILE")
        .env("XDG_CONFIG_HOME", config_home)
        .env("HOME", config_home);
    cmd
}

#[test]
fn help_lists_subcommands() {
    let tmp = tempfile::tempdir().unwrap();
    sentry_tool(tmp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("tags"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn conflicting_scope_flags_fail_before_config_resolution() {
    // No token anywhere: if validation ran after resolution this would exit 1
    // with a configuration error instead of 2.
    let tmp = tempfile::tempdir().unwrap();
    sentry_tool(tmp.path())
        .args(["list", "-A", "-p", "foo"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("mutually exclusive"));
}

#[test]
fn missing_token_is_a_configuration_error() {
    let tmp = tempfile::tempdir().unwrap();
    sentry_tool(tmp.path())
        .arg("list")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("auth token"));
}

#[test]
fn malformed_trace_id_is_a_usage_error() {
    let tmp = tempfile::tempdir().unwrap();
    sentry_tool(tmp.path())
        .args(["trace", "not-a-trace-id"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("32-character hex"));
}

#[test]
fn config_profiles_reads_the_config_file() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("sentry-tool");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("config.toml"),
        r#"
default_profile = "work"

[profiles.work]
auth_token = "sntrys_work"

[profiles.personal]
auth_token = "sntrys_home"
"#,
    )
    .unwrap();

    sentry_tool(tmp.path())
        .args(["config", "profiles"])
        .assert()
        .success()
        .stdout(predicate::str::contains("work"))
        .stdout(predicate::str::contains("personal"))
        .stdout(predicate::str::contains("2 profiles"));
}

#[test]
fn config_show_masks_tokens() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("sentry-tool");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("config.toml"),
        r#"
[profiles.default]
auth_token = "sntrys_abc123xyz9"
"#,
    )
    .unwrap();

    sentry_tool(tmp.path())
        .args(["config", "show", "-f", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("***...xyz9"))
        .stdout(predicate::str::contains("sntrys_abc123xyz9").not());
}
