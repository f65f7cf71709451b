//! Tests for `native-form keygen` and `completions`.

use crate::support::*;
use native_form::core::cipher::SecretCipher;
use predicates::prelude::*;

#[test]
fn test_keygen_needs_no_key() {
    let t = Test::new();

    let output = t.cmd().env_remove("NATIVE_FORM_KEY").arg("keygen").output().unwrap();

    assert_success(&output);
    let key = stdout(&output);
    assert!(key.trim().starts_with("AGE-SECRET-KEY-1"));
    assert!(SecretCipher::from_key(key.trim()).is_ok());
}

#[test]
fn test_keygen_prints_only_the_key() {
    let t = Test::new();

    t.cmd()
        .arg("keygen")
        .assert()
        .success()
        .stdout(
            predicate::str::starts_with("AGE-SECRET-KEY-1")
                .and(predicate::str::contains("\n").count(1)),
        );
}

#[test]
fn test_keygen_keys_differ() {
    let t = Test::new();
    let first = stdout(&t.cmd().arg("keygen").output().unwrap());
    let second = stdout(&t.cmd().arg("keygen").output().unwrap());
    assert_ne!(first, second);
}

#[test]
fn test_completions_bash() {
    let t = Test::new();

    let output = t.cmd().args(["completions", "bash"]).output().unwrap();

    assert_success(&output);
    assert_stdout_contains(&output, "native-form");
}
