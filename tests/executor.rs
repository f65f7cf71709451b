//! CLI executor tests against fake provider CLIs.

mod support;

use std::path::Path;
use std::time::{Duration, Instant};

use native_form::core::domain::Credentials;
use native_form::core::exec::{CliExecutor, EnvMap, Invocation};
use native_form::core::provider::{aws, AwsCli, AzureCli, Probe, ProbeContext, ProviderCli, TableProbe};
use native_form::error::ExecError;
use serde_json::json;
use support::*;

/// Parent environment with secrets that must never reach a child.
fn hostile_parent() -> CliExecutor {
    let path = std::env::var("PATH").unwrap_or_else(|_| "/usr/bin:/bin".to_string());
    CliExecutor::with_parent_env([
        ("PATH", path.as_str()),
        ("LANG", "C.UTF-8"),
        ("NATIVE_FORM_KEY", "AGE-SECRET-KEY-1PARENT"),
        ("DATABASE_URL", "postgres://app:pw@db/app"),
        ("SECRET_KEY", "flask-secret"),
        ("AWS_ACCESS_KEY_ID", "AKIAPARENT"),
        ("AWS_SESSION_TOKEN", "parent-session"),
        ("SOME_APP_SETTING", "1"),
    ])
}

/// Parent variables no child may ever see.
const FORBIDDEN: [&str; 4] = ["NATIVE_FORM_KEY", "DATABASE_URL", "SECRET_KEY", "AKIAPARENT"];

fn assert_clean(env: &str) {
    for leaked in FORBIDDEN {
        assert!(!env.contains(leaked), "{} reached the child", leaked);
    }
}

fn ctx(credentials: &Credentials) -> ProbeContext<'_> {
    ProbeContext {
        credentials,
        region: None,
    }
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap_or_else(|e| panic!("{}: {}", path.display(), e))
}

#[test]
fn test_child_environment_is_sanitized() {
    let t = Test::new();
    let capture = t.capture("env.txt");
    let cli = t.script("fake", &format!("env > '{}'\necho '{{}}'", capture.display()));

    let mut overrides = EnvMap::new();
    overrides
        .set("AWS_ACCESS_KEY_ID", "AKIACALL")
        .set("NATIVE_FORM_KEY", "smuggled");
    hostile_parent()
        .execute(&Invocation::new(&cli), &overrides, Duration::from_secs(10))
        .unwrap();

    let env = read(&capture);
    assert!(env.contains("LANG=C.UTF-8"));
    assert!(env.contains("AWS_ACCESS_KEY_ID=AKIACALL"));
    for leaked in [
        "NATIVE_FORM_KEY",
        "DATABASE_URL",
        "SECRET_KEY",
        "AWS_SESSION_TOKEN",
        "SOME_APP_SETTING",
        "AKIAPARENT",
    ] {
        assert!(!env.contains(leaked), "{} reached the child", leaked);
    }
}

#[test]
fn test_json_output_parsed() {
    let t = Test::new();
    let cli = t.script("fake", r#"echo '{"Buckets": [{"Name": "logs"}]}'"#);

    let value = CliExecutor::new()
        .execute(&Invocation::new(&cli), &EnvMap::new(), Duration::from_secs(10))
        .unwrap();
    assert_eq!(value, json!({ "Buckets": [{ "Name": "logs" }] }));
}

#[test]
fn test_empty_output_is_empty_object() {
    let t = Test::new();
    let cli = t.script("fake", "exit 0");

    let value = CliExecutor::new()
        .execute(&Invocation::new(&cli), &EnvMap::new(), Duration::from_secs(10))
        .unwrap();
    assert_eq!(value, json!({}));
}

#[test]
fn test_nonzero_exit_carries_stderr() {
    let t = Test::new();
    let cli = t.script("aws", "echo 'An error occurred (AccessDenied)' >&2\nexit 254");

    let err = CliExecutor::new()
        .execute(&Invocation::new(&cli), &EnvMap::new(), Duration::from_secs(10))
        .unwrap_err();
    match err {
        ExecError::CommandFailed {
            command,
            code,
            stderr,
        } => {
            assert_eq!(command, "aws");
            assert_eq!(code, 254);
            assert_eq!(stderr, "An error occurred (AccessDenied)");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_stderr_excerpt_is_capped() {
    let t = Test::new();
    let cli = t.script(
        "fake",
        "i=0\nwhile [ $i -lt 100 ]; do printf 'denied-denied-' >&2; i=$((i+1)); done\nexit 1",
    );

    let err = CliExecutor::new()
        .execute(&Invocation::new(&cli), &EnvMap::new(), Duration::from_secs(10))
        .unwrap_err();
    match err {
        ExecError::CommandFailed { stderr, .. } => assert_eq!(stderr.chars().count(), 500),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_malformed_output() {
    let t = Test::new();
    let cli = t.script("fake", "echo '<html>rate limited</html>'");

    let err = CliExecutor::new()
        .execute(&Invocation::new(&cli), &EnvMap::new(), Duration::from_secs(10))
        .unwrap_err();
    assert!(matches!(err, ExecError::MalformedOutput { .. }));
    assert!(err.is_soft());
}

#[test]
fn test_timeout_kills_child() {
    let t = Test::new();
    let cli = t.script("fake", "sleep 5\necho '{}'");

    let started = Instant::now();
    let err = CliExecutor::new()
        .execute(&Invocation::new(&cli), &EnvMap::new(), Duration::from_secs(1))
        .unwrap_err();

    assert_eq!(
        err,
        ExecError::CommandTimeout {
            command: "fake".to_string(),
            seconds: 1
        }
    );
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[test]
fn test_timeout_path_environment_is_sanitized() {
    let t = Test::new();
    let capture = t.capture("env.txt");
    let cli = t.script("fake", &format!("env > '{}'\nsleep 5", capture.display()));

    let err = hostile_parent()
        .execute(&Invocation::new(&cli), &EnvMap::new(), Duration::from_secs(1))
        .unwrap_err();

    assert!(matches!(err, ExecError::CommandTimeout { seconds: 1, .. }));
    let env = read(&capture);
    assert!(env.contains("LANG=C.UTF-8"));
    assert_clean(&env);
}

#[test]
fn test_arguments_are_not_shell_interpreted() {
    let t = Test::new();
    let capture = t.capture("args.txt");
    let marker = t.capture("pwned");
    let cli = t.script(
        "fake",
        &format!("printf '%s\\n' \"$@\" > '{}'\necho '{{}}'", capture.display()),
    );

    let hostile = format!("x; touch {}", marker.display());
    CliExecutor::new()
        .execute(
            &Invocation::new(&cli).arg(hostile.as_str()).arg("$(id)"),
            &EnvMap::new(),
            Duration::from_secs(10),
        )
        .unwrap();

    assert_eq!(read(&capture), format!("{}\n$(id)\n", hostile));
    assert!(!marker.exists());
}

#[test]
fn test_aws_credentials_only_via_environment() {
    let t = Test::new();
    let capture = t.capture("aws.txt");
    let cli = t.script(
        "aws",
        &format!(
            "{{ echo \"ARGS=$*\"; env; }} > '{}'\necho '{{\"Vpcs\": []}}'",
            capture.display()
        ),
    );

    let aws = AwsCli::new(hostile_parent(), cli, Duration::from_secs(10));
    let credentials = aws_credentials();
    aws.run(&["ec2", "describe-vpcs"], &ctx(&credentials)).unwrap();

    let seen = read(&capture);
    assert!(seen.contains("ARGS=ec2 describe-vpcs --output json"));
    assert!(seen.contains("AWS_ACCESS_KEY_ID=AKIAEXAMPLE"));
    assert!(seen.contains("AWS_SECRET_ACCESS_KEY=wJalrXUtnFEMI/K7MDENG"));
    assert!(seen.contains("AWS_DEFAULT_REGION=eu-west-1"));
    assert!(seen.contains("AWS_SHARED_CREDENTIALS_FILE=/dev/null"));
    assert!(!seen.contains("AWS_SESSION_TOKEN"));
    assert!(!seen.lines().any(|l| l.starts_with("ARGS=") && l.contains("wJalr")));
}

/// Fake `aws` that reports the region it was called in on every VPC.
const REGION_ECHO: &str =
    r#"echo "{\"Vpcs\": [{\"VpcId\": \"vpc-1\", \"Queried\": \"$AWS_DEFAULT_REGION\"}]}""#;

fn vpcs_in(region: Option<&str>, credentials: &Credentials) -> (String, Option<String>) {
    let t = Test::new();
    let cli = t.script("aws", REGION_ECHO);
    let aws = AwsCli::new(CliExecutor::new(), cli, Duration::from_secs(10));
    let spec = aws::PROBES.iter().find(|p| p.name == "vpcs").unwrap();

    let found = TableProbe::new(&aws, spec)
        .discover(&ProbeContext {
            credentials,
            region,
        })
        .unwrap();

    assert_eq!(found.len(), 1);
    let queried = found[0].raw_data["Queried"].as_str().unwrap().to_string();
    (queried, found[0].region.clone())
}

#[test]
fn test_connection_region_is_queried_and_recorded() {
    let (queried, recorded) = vpcs_in(Some("us-west-2"), &aws_credentials());

    assert_eq!(queried, "us-west-2");
    assert_eq!(recorded.as_deref(), Some("us-west-2"));
}

#[test]
fn test_credential_region_used_without_connection_region() {
    let (queried, recorded) = vpcs_in(Some("  "), &aws_credentials());
    assert_eq!(queried, "eu-west-1");
    assert_eq!(recorded.as_deref(), Some("eu-west-1"));

    let bare = Credentials::new()
        .with("aws_access_key_id", "AKIAEXAMPLE")
        .with("aws_secret_access_key", "secret");
    let (queried, recorded) = vpcs_in(None, &bare);
    assert_eq!(queried, "us-east-1");
    assert_eq!(recorded.as_deref(), Some("us-east-1"));
}

fn fake_az(t: &Test, login_exit: i32) -> (std::path::PathBuf, std::path::PathBuf) {
    let record = t.capture("session.txt");
    let cli = t.script(
        "az",
        &format!(
            "if [ \"$1\" = login ]; then echo \"$AZURE_CONFIG_DIR\" > '{}'; exit {}; fi\n\
             [ -d \"$AZURE_CONFIG_DIR\" ] || exit 9\n\
             echo '[{{\"id\": \"/subscriptions/sub-1/resourceGroups/rg\", \"name\": \"rg\"}}]'",
            record.display(),
            login_exit
        ),
    );
    (cli, record)
}

#[test]
fn test_azure_session_removed_after_success() {
    let t = Test::new();
    let (cli, record) = fake_az(&t, 0);

    let az = AzureCli::new(CliExecutor::new(), cli, Duration::from_secs(10));
    let credentials = azure_credentials();
    let value = az.run(&["group", "list"], &ctx(&credentials)).unwrap();

    assert_eq!(value[0]["name"], "rg");
    let session = read(&record);
    let session = Path::new(session.trim());
    assert!(session.is_absolute());
    assert!(!session.exists());
}

#[test]
fn test_azure_session_removed_after_login_failure() {
    let t = Test::new();
    let (cli, record) = fake_az(&t, 1);

    let az = AzureCli::new(CliExecutor::new(), cli, Duration::from_secs(10));
    let credentials = azure_credentials();
    let err = az.run(&["group", "list"], &ctx(&credentials)).unwrap_err();

    assert!(matches!(err, ExecError::CommandFailed { code: 1, .. }));
    let session = read(&record);
    assert!(!Path::new(session.trim()).exists());
}

#[test]
fn test_azure_sessions_are_isolated() {
    let t = Test::new();
    let (cli, record) = fake_az(&t, 0);
    let az = AzureCli::new(CliExecutor::new(), cli, Duration::from_secs(10));

    let credentials = azure_credentials();

    az.run(&["group", "list"], &ctx(&credentials)).unwrap();
    let first = read(&record);
    az.run(&["group", "list"], &ctx(&credentials)).unwrap();
    let second = read(&record);

    assert_ne!(first, second);
}

#[test]
fn test_login_then_execute_environment_is_sanitized() {
    let t = Test::new();
    let login_env = t.capture("login-env.txt");
    let call_env = t.capture("call-env.txt");
    let cli = t.script(
        "az",
        &format!(
            "if [ \"$1\" = login ]; then env > '{}'; exit 0; fi\n\
             env > '{}'\n\
             echo '[]'",
            login_env.display(),
            call_env.display()
        ),
    );

    let az = AzureCli::new(hostile_parent(), cli, Duration::from_secs(10));
    let credentials = azure_credentials();
    az.run(&["group", "list"], &ctx(&credentials)).unwrap();

    for capture in [&login_env, &call_env] {
        let env = read(capture);
        assert!(env.contains("AZURE_CONFIG_DIR="));
        assert_clean(&env);
    }
}
