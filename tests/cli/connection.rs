//! Tests for `native-form connection`.

use crate::support::*;

#[test]
fn test_add_via_stdin() {
    let t = Test::new();

    let output = t.add_aws("prod");

    assert_success(&output);
    assert_stdout_contains(&output, "✓ created aws connection");
    assert_stdout_contains(&output, "(personal)");
}

#[test]
fn test_list_json_omits_secret() {
    let t = Test::new();
    assert_success(&t.add_aws("prod"));

    let output = t.list_json();

    assert_success(&output);
    assert_stdout_excludes(&output, "wJalrXUtnFEMI");
    let listed = stdout_json(&output);
    let conn = &listed[0];
    assert_eq!(conn["name"], "prod");
    assert_eq!(conn["provider"], "aws");
    assert_eq!(conn["scope"], "personal");
    assert_eq!(conn["owner"], "alice");
    assert_eq!(conn["region"], "eu-west-1");
    assert!(conn.get("secret").is_none());
}

#[test]
fn test_missing_field_rejected() {
    let t = Test::new();

    let output = t
        .cmd()
        .args(["connection", "add", "aws", "prod"])
        .write_stdin("AKIAEXAMPLE\n\n")
        .output()
        .unwrap();

    assert_failure(&output);
    assert_stderr_contains(&output, "aws_secret_access_key");
}

#[test]
fn test_duplicate_name_rejected() {
    let t = Test::new();
    assert_success(&t.add_aws("prod"));

    let output = t.add_aws("prod");

    assert_failure(&output);
    assert_stderr_contains(&output, "already exists");
}

#[test]
fn test_default_requires_admin() {
    let t = Test::new();

    let output = t
        .cmd()
        .args(["connection", "add", "aws", "shared", "--default"])
        .write_stdin(AWS_STDIN)
        .output()
        .unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "access denied");

    let output = t
        .cmd()
        .env("NATIVE_FORM_ADMIN", "1")
        .args(["connection", "add", "aws", "shared", "--default"])
        .write_stdin(AWS_STDIN)
        .output()
        .unwrap();
    assert_success(&output);
    assert_stdout_contains(&output, "(default)");
}

#[test]
fn test_users_see_only_their_connections() {
    let t = Test::new();
    assert_success(&t.add_aws("alice-prod"));

    let output = t
        .cmd_as("bob")
        .args(["connection", "list", "--json"])
        .output()
        .unwrap();

    assert_success(&output);
    assert_eq!(stdout_json(&output), serde_json::json!([]));
}

#[test]
fn test_edit_and_remove() {
    let t = Test::new();
    assert_success(&t.add_aws("prod"));
    let id = t.first_connection_id();

    let output = t
        .cmd()
        .args(["connection", "edit", &id, "--name", "production", "--clear-region"])
        .output()
        .unwrap();
    assert_success(&output);

    let listed = stdout_json(&t.list_json());
    assert_eq!(listed[0]["name"], "production");
    assert_eq!(listed[0]["region"], serde_json::Value::Null);

    let output = t.cmd().args(["connection", "rm", &id]).output().unwrap();
    assert_success(&output);
    assert_eq!(stdout_json(&t.list_json()), serde_json::json!([]));
}

#[test]
fn test_other_user_cannot_remove() {
    let t = Test::new();
    assert_success(&t.add_aws("prod"));
    let id = t.first_connection_id();

    let output = t.cmd_as("bob").args(["connection", "rm", &id]).output().unwrap();

    assert_failure(&output);
    assert_stderr_contains(&output, "access denied");
    assert_eq!(stdout_json(&t.list_json()).as_array().unwrap().len(), 1);
}

#[test]
fn test_connection_test_against_fake_cli() {
    let t = Test::new();
    assert_success(&t.add_aws("prod"));
    let id = t.first_connection_id();
    let aws = t.script(
        "aws",
        r#"echo '{"Account": "123456789012", "Arn": "arn:aws:iam::123456789012:user/ci"}'"#,
    );

    let output = t
        .cmd()
        .env("AWS_CLI_PATH", &aws)
        .args(["connection", "test", &id, "--json"])
        .output()
        .unwrap();

    assert_success(&output);
    let result = stdout_json(&output);
    assert_eq!(result["ok"], true);
    assert_eq!(result["details"]["Account"], "123456789012");
    assert!(stdout_json(&t.list_json())[0]["last_tested"].is_string());
}

#[test]
fn test_connection_test_failure_exits_nonzero() {
    let t = Test::new();
    assert_success(&t.add_aws("prod"));
    let id = t.first_connection_id();
    let aws = t.script("aws", "echo 'InvalidClientTokenId' >&2\nexit 254");

    let output = t
        .cmd()
        .env("AWS_CLI_PATH", &aws)
        .args(["connection", "test", &id])
        .output()
        .unwrap();

    assert_failure(&output);
    assert_stderr_contains(&output, "InvalidClientTokenId");
}
