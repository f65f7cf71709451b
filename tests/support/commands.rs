//! Command helper methods for Test.

use std::path::Path;
use std::process::Output;

use assert_cmd::Command;

use super::Test;

impl Test {
    /// Create a native-form command bound to this environment.
    ///
    /// Returns a Command configured with:
    /// - the process key and data directory
    /// - acting user `alice`, colors off, no inherited log filter
    pub fn cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("native-form").expect("failed to find native-form binary");
        cmd.env("NATIVE_FORM_KEY", &self.key)
            .env("NATIVE_FORM_DATA_DIR", self.dir.path())
            .env("NATIVE_FORM_USER", "alice")
            .env("NO_COLOR", "1")
            .env_remove("NATIVE_FORM_ADMIN")
            .env_remove("NATIVE_FORM_LOG");
        cmd
    }

    /// Same as [`Test::cmd`], acting as `user`.
    pub fn cmd_as(&self, user: &str) -> Command {
        let mut cmd = self.cmd();
        cmd.env("NATIVE_FORM_USER", user);
        cmd
    }

    /// Shortcut for `native-form connection add aws <name>` with piped credentials.
    pub fn add_aws(&self, name: &str) -> Output {
        self.cmd()
            .args(["connection", "add", "aws", name])
            .write_stdin(super::AWS_STDIN)
            .output()
            .expect("failed to run native-form connection add")
    }

    /// Shortcut for `native-form connection list --json`.
    pub fn list_json(&self) -> Output {
        self.cmd()
            .args(["connection", "list", "--json"])
            .output()
            .expect("failed to run native-form connection list")
    }

    /// Id of the first listed connection.
    pub fn first_connection_id(&self) -> String {
        let output = self.list_json();
        super::assert_success(&output);
        super::stdout_json(&output)[0]["id"]
            .as_str()
            .expect("no connection listed")
            .to_string()
    }

    /// Shortcut for `native-form discover <id> --json` using `aws_cli`.
    pub fn discover(&self, id: &str, aws_cli: &Path) -> Output {
        self.cmd()
            .env("AWS_CLI_PATH", aws_cli)
            .args(["discover", id, "--json"])
            .output()
            .expect("failed to run native-form discover")
    }

    /// Shortcut for `native-form resources --json`.
    pub fn resources_json(&self) -> Output {
        self.cmd()
            .args(["resources", "--json"])
            .output()
            .expect("failed to run native-form resources")
    }
}
