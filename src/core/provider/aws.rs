//! AWS adapter.
//!
//! Credentials are passed only through the child environment. The shared
//! credentials and config files are pointed at `/dev/null` so a profile on
//! the host can never be picked up instead.

use std::path::PathBuf;
use std::time::Duration;

use serde_json::Value;

use super::{ProbeContext, ProbeSpec, ProviderCli, RegionSource};
use crate::core::constants;
use crate::core::domain::Credentials;
use crate::core::exec::{CliExecutor, EnvMap, Invocation};
use crate::error::ExecError;

/// Discovery probes, in run order.
pub static PROBES: [ProbeSpec; 6] = [
    ProbeSpec {
        name: "ec2_instances",
        resource_type: "ec2_instance",
        args: &["ec2", "describe-instances"],
        items: &["Reservations", "Instances"],
        id: &["InstanceId"],
        name_fields: &[],
        region: RegionSource::Connection,
    },
    ProbeSpec {
        name: "s3_buckets",
        resource_type: "s3_bucket",
        args: &["s3api", "list-buckets"],
        items: &["Buckets"],
        id: &["Name"],
        name_fields: &["Name"],
        region: RegionSource::Connection,
    },
    ProbeSpec {
        name: "rds_instances",
        resource_type: "rds_instance",
        args: &["rds", "describe-db-instances"],
        items: &["DBInstances"],
        id: &["DBInstanceArn", "DBInstanceIdentifier"],
        name_fields: &["DBInstanceIdentifier"],
        region: RegionSource::Connection,
    },
    ProbeSpec {
        name: "lambda_functions",
        resource_type: "lambda_function",
        args: &["lambda", "list-functions"],
        items: &["Functions"],
        id: &["FunctionArn", "FunctionName"],
        name_fields: &["FunctionName"],
        region: RegionSource::Connection,
    },
    ProbeSpec {
        name: "iam_users",
        resource_type: "iam_user",
        args: &["iam", "list-users"],
        items: &["Users"],
        id: &["Arn", "UserName"],
        name_fields: &["UserName"],
        region: RegionSource::Global,
    },
    ProbeSpec {
        name: "vpcs",
        resource_type: "vpc",
        args: &["ec2", "describe-vpcs"],
        items: &["Vpcs"],
        id: &["VpcId"],
        name_fields: &[],
        region: RegionSource::Connection,
    },
];

/// The `aws` command line.
#[derive(Debug, Clone)]
pub struct AwsCli {
    executor: CliExecutor,
    program: PathBuf,
    timeout: Duration,
}

impl AwsCli {
    pub fn new(executor: CliExecutor, program: PathBuf, timeout: Duration) -> Self {
        Self {
            executor,
            program,
            timeout,
        }
    }

    pub fn resolve(&self) -> Result<PathBuf, ExecError> {
        self.executor.resolve(&self.program)
    }

    /// Per-call environment carrying the access key pair and `region`.
    pub fn env(credentials: &Credentials, region: &str) -> EnvMap {
        let mut env = EnvMap::new();
        env.set(
            "AWS_ACCESS_KEY_ID",
            credentials.get_or("aws_access_key_id", ""),
        )
        .set(
            "AWS_SECRET_ACCESS_KEY",
            credentials.get_or("aws_secret_access_key", ""),
        )
        .set("AWS_DEFAULT_REGION", region)
        .set("AWS_SHARED_CREDENTIALS_FILE", "/dev/null")
        .set("AWS_CONFIG_FILE", "/dev/null");
        env
    }

    fn invocation(&self, args: &[&str]) -> Invocation {
        Invocation::new(self.program.clone())
            .args(args.iter().copied())
            .args(["--output", "json"])
    }

    /// `sts get-caller-identity`.
    pub fn check(&self, ctx: &ProbeContext<'_>) -> Result<Value, ExecError> {
        self.executor.execute(
            &self.invocation(&["sts", "get-caller-identity"]),
            &Self::env(ctx.credentials, self.region(ctx)),
            Duration::from_secs(constants::AWS_TEST_TIMEOUT_SECS),
        )
    }
}

impl ProviderCli for AwsCli {
    /// The connection region, else the credential region, else `us-east-1`.
    fn region<'a>(&self, ctx: &ProbeContext<'a>) -> &'a str {
        ctx.connection_region().unwrap_or_else(|| {
            ctx.credentials
                .get_or("aws_default_region", constants::DEFAULT_AWS_REGION)
        })
    }

    fn run(&self, args: &[&str], ctx: &ProbeContext<'_>) -> Result<Value, ExecError> {
        let env = Self::env(ctx.credentials, self.region(ctx));
        self.executor
            .execute(&self.invocation(args), &env, self.timeout)
    }
}
