//! Tests for `native-form discover`, `resources` and `export`.

use crate::support::*;

/// Fake `aws` answering two probes and denying the rest.
const FAKE_AWS: &str = r#"case "$1 $2" in
  "ec2 describe-instances")
    echo '{"Reservations": [{"Instances": [{"InstanceId": "i-0abc", "Tags": [{"Key": "Name", "Value": "web"}]}]}]}' ;;
  "s3api list-buckets")
    echo '{"Buckets": [{"Name": "logs"}]}' ;;
  *)
    echo 'An error occurred (AccessDenied)' >&2; exit 254 ;;
esac"#;

fn discovered(t: &Test) -> String {
    assert_success(&t.add_aws("prod"));
    let id = t.first_connection_id();
    let aws = t.script("aws", FAKE_AWS);
    let output = t.discover(&id, &aws);
    assert_success(&output);
    id
}

#[test]
fn test_discover_reports_count() {
    let t = Test::new();
    assert_success(&t.add_aws("prod"));
    let id = t.first_connection_id();
    let aws = t.script("aws", FAKE_AWS);

    let output = t.discover(&id, &aws);

    assert_success(&output);
    let response = stdout_json(&output);
    assert_eq!(response["status"], "ok");
    assert_eq!(response["count"], 2);
}

#[test]
fn test_resources_listed_after_discovery() {
    let t = Test::new();
    discovered(&t);

    let output = t.resources_json();

    assert_success(&output);
    let resources = stdout_json(&output);
    let resources = resources.as_array().unwrap();
    assert_eq!(resources.len(), 2);
    assert_eq!(resources[0]["resource_type"], "ec2_instance");
    assert_eq!(resources[0]["resource_name"], "web");
    assert_eq!(resources[0]["region"], "eu-west-1");
    assert_eq!(resources[1]["resource_id"], "logs");
}

#[test]
fn test_discovery_for_provider_uses_effective_connection() {
    let t = Test::new();
    assert_success(&t.add_aws("prod"));
    let aws = t.script("aws", FAKE_AWS);

    let output = t
        .cmd()
        .env("AWS_CLI_PATH", &aws)
        .args(["discover", "--provider", "aws", "--json"])
        .output()
        .unwrap();

    assert_success(&output);
    assert_eq!(stdout_json(&output)["count"], 2);
}

#[test]
fn test_all_probes_failing() {
    let t = Test::new();
    assert_success(&t.add_aws("prod"));
    let id = t.first_connection_id();
    let aws = t.script("aws", "echo 'ExpiredToken' >&2\nexit 254");

    let output = t.discover(&id, &aws);

    assert_failure(&output);
    let response = stdout_json(&output);
    assert_eq!(response["status"], "error");
    assert!(response["message"]
        .as_str()
        .unwrap()
        .starts_with("all discoveries failed"));
}

#[test]
fn test_missing_cli() {
    let t = Test::new();
    assert_success(&t.add_aws("prod"));
    let id = t.first_connection_id();

    let output = t.discover(&id, &t.capture("no-such-aws"));

    assert_failure(&output);
    assert_stderr_contains(&output, "CLI executable not found");
}

#[test]
fn test_discover_without_id() {
    let t = Test::new();

    let output = t.cmd().args(["discover"]).output().unwrap();

    assert_failure(&output);
    assert_stderr_contains(&output, "No connection specified");
}

#[test]
fn test_other_user_cannot_discover() {
    let t = Test::new();
    assert_success(&t.add_aws("prod"));
    let id = t.first_connection_id();
    let aws = t.script("aws", FAKE_AWS);

    let output = t
        .cmd_as("bob")
        .env("AWS_CLI_PATH", &aws)
        .args(["discover", &id])
        .output()
        .unwrap();

    assert_failure(&output);
    assert_stderr_contains(&output, "access denied");
}

#[test]
fn test_export_csv_to_stdout() {
    let t = Test::new();
    discovered(&t);

    let output = t.cmd().args(["export", "csv"]).output().unwrap();

    assert_success(&output);
    let csv = stdout(&output);
    let lines: Vec<_> = csv.split_terminator("\r\n").collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("Resource Type,Resource ID,Name"));
    assert!(lines[1].starts_with("ec2_instance,i-0abc,web,eu-west-1,prod,aws,"));
}

#[test]
fn test_export_json_to_file() {
    let t = Test::new();
    discovered(&t);
    let target = t.capture("export.json");

    let output = t
        .cmd()
        .args(["export", "json", "--type", "s3_bucket", "-o"])
        .arg(&target)
        .output()
        .unwrap();

    assert_success(&output);
    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&target).unwrap()).unwrap();
    assert_eq!(written.as_array().unwrap().len(), 1);
    assert_eq!(written[0]["raw_data"]["Name"], "logs");
}

#[test]
fn test_show_resource() {
    let t = Test::new();
    discovered(&t);
    let resources = stdout_json(&t.resources_json());
    let id = resources[0]["id"].as_str().unwrap().to_string();

    let output = t.cmd().args(["show", &id]).output().unwrap();
    assert_success(&output);
    assert_stdout_contains(&output, "i-0abc");

    let output = t.cmd_as("bob").args(["show", &id]).output().unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "access denied");
}

#[test]
fn test_edited_region_is_queried_and_recorded() {
    let t = Test::new();
    assert_success(&t.add_aws("prod"));
    let id = t.first_connection_id();
    let edit = t
        .cmd()
        .args(["connection", "edit", &id, "--region", "us-west-2"])
        .output()
        .unwrap();
    assert_success(&edit);
    let aws = t.script(
        "aws",
        r#"case "$1 $2" in
  "ec2 describe-vpcs")
    echo "{\"Vpcs\": [{\"VpcId\": \"vpc-1\", \"Queried\": \"$AWS_DEFAULT_REGION\"}]}" ;;
  *)
    echo 'AccessDenied' >&2; exit 254 ;;
esac"#,
    );

    assert_success(&t.discover(&id, &aws));

    let resources = stdout_json(&t.resources_json());
    assert_eq!(resources[0]["resource_id"], "vpc-1");
    assert_eq!(resources[0]["raw_data"]["Queried"], "us-west-2");
    assert_eq!(resources[0]["region"], "us-west-2");
}
