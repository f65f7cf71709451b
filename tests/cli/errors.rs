//! Startup and error reporting tests.

use crate::support::*;

#[test]
fn test_missing_key_is_fatal() {
    let t = Test::new();

    let output = t
        .cmd()
        .env_remove("NATIVE_FORM_KEY")
        .args(["connection", "list"])
        .output()
        .unwrap();

    assert_failure(&output);
    assert_eq!(output.status.code(), Some(1));
    assert_stderr_contains(&output, "NATIVE_FORM_KEY is not set");
    assert_stderr_contains(&output, "native-form keygen");
    assert!(!t.dir.path().join("inventory.json").exists());
}

#[test]
fn test_invalid_key_is_fatal() {
    let t = Test::new();

    let output = t
        .cmd()
        .env("NATIVE_FORM_KEY", "not-a-key")
        .arg("status")
        .output()
        .unwrap();

    assert_failure(&output);
    assert_stderr_contains(&output, "invalid encryption key");
}

#[test]
fn test_bad_timeout_rejected() {
    let t = Test::new();

    let output = t
        .cmd()
        .env("DISCOVERY_TIMEOUT_SECONDS", "soon")
        .args(["connection", "list"])
        .output()
        .unwrap();

    assert_failure(&output);
    assert_stderr_contains(&output, "DISCOVERY_TIMEOUT_SECONDS");
}

#[test]
fn test_unknown_provider_rejected() {
    let t = Test::new();

    let output = t
        .cmd()
        .args(["connection", "add", "gcp", "prod"])
        .write_stdin("x\n")
        .output()
        .unwrap();

    assert_failure(&output);
    assert_stderr_contains(&output, "gcp");
}

#[test]
fn test_malformed_id_rejected() {
    let t = Test::new();

    let output = t.cmd().args(["connection", "test", "nope"]).output().unwrap();

    assert_failure(&output);
    assert_stderr_contains(&output, "invalid id: nope");
}

#[test]
fn test_logs_stay_off_stdout() {
    let t = Test::new();
    assert_success(&t.add_aws("prod"));

    let output = t
        .cmd()
        .args(["-v", "connection", "list", "--json"])
        .output()
        .unwrap();

    assert_success(&output);
    // stdout must still parse as JSON with debug logging on.
    let listed = stdout_json(&output);
    assert_eq!(listed.as_array().unwrap().len(), 1);
}
