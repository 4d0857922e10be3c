//! Per-run Terraform invocation configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::command_runner::{DEFAULT_CMD_TIMEOUT, DEFAULT_PROVISION_TIMEOUT};

/// Configuration for one provision cycle. Created at the start of a test,
/// owned by that test, discarded after teardown.
///
/// Variable files are passed to terraform in declaration order; terraform's
/// own merge rule makes later files override earlier ones.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Directory containing the `.tf` definitions (passed via `-chdir`).
    pub terraform_dir: PathBuf,
    /// `-var-file` paths, in order.
    pub var_files: Vec<PathBuf>,
    /// Inline `-var key=value` pairs, in order.
    pub vars: Vec<(String, String)>,
    /// When set, `init` runs with `-upgrade` to refresh providers/modules.
    pub upgrade: bool,
    /// Binary to invoke. Defaults to `terraform`; override for wrappers
    /// such as `tofu`.
    pub binary: String,
    /// Timeout for init/apply/destroy.
    pub provision_timeout: Duration,
    /// Timeout for quick subcommands (output, version).
    pub cmd_timeout: Duration,
}

impl RunOptions {
    #[must_use]
    pub fn new(terraform_dir: impl Into<PathBuf>) -> Self {
        Self {
            terraform_dir: terraform_dir.into(),
            var_files: Vec::new(),
            vars: Vec::new(),
            upgrade: false,
            binary: "terraform".to_owned(),
            provision_timeout: DEFAULT_PROVISION_TIMEOUT,
            cmd_timeout: DEFAULT_CMD_TIMEOUT,
        }
    }

    /// Append a `-var-file` path.
    #[must_use]
    pub fn var_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.var_files.push(path.into());
        self
    }

    /// Append an inline `-var key=value` pair.
    #[must_use]
    pub fn var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.push((key.into(), value.into()));
        self
    }

    /// Enable `init -upgrade`.
    #[must_use]
    pub fn upgrade(mut self) -> Self {
        self.upgrade = true;
        self
    }

    /// Override the terraform binary.
    #[must_use]
    pub fn binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// The `-chdir=<dir>` global argument. Terraform requires global flags
    /// before the subcommand, so every argument vector starts with this.
    #[must_use]
    pub fn chdir_arg(&self) -> String {
        format!("-chdir={}", self.terraform_dir.display())
    }
}
