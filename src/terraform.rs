//! Terraform CLI abstraction — enables test doubles for all terraform calls.
//!
//! The [`Terraform`] trait is the port; [`TerraformCli`] is the production
//! adapter that builds argument vectors and routes them through a
//! [`CommandRunner`], so unit tests can inject a mock runner (or a mock
//! `Terraform`) without spawning real processes.

use std::process::Output;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::command_runner::{CommandRunner, DEFAULT_CMD_TIMEOUT, TokioCommandRunner};
use crate::error::{OutputError, TerraformError};
use crate::options::RunOptions;
use crate::output::OutputValue;

/// The external-tool contract: init, apply, destroy, output.
///
/// Every method blocks (asynchronously) for the duration of the external
/// call; there is no retry layer here. Implementations report failures as
/// errors local to the calling test case.
#[allow(async_fn_in_trait)]
pub trait Terraform {
    /// Run `terraform init` for the configured directory.
    ///
    /// # Errors
    ///
    /// Returns [`TerraformError::Init`] when terraform exits non-zero.
    async fn init(&self, opts: &RunOptions) -> Result<()>;

    /// Run `terraform apply -auto-approve` with the configured variable
    /// files and inline vars. May suspend for minutes while real resources
    /// are provisioned.
    ///
    /// # Errors
    ///
    /// Returns [`TerraformError::Apply`] when terraform exits non-zero.
    async fn apply(&self, opts: &RunOptions) -> Result<()>;

    /// Init followed by apply — the standard start of a provision cycle.
    ///
    /// # Errors
    ///
    /// Propagates the first failing phase.
    async fn init_and_apply(&self, opts: &RunOptions) -> Result<()> {
        self.init(opts).await?;
        self.apply(opts).await
    }

    /// Run `terraform destroy -auto-approve`. Called unconditionally in
    /// teardown, including after a failed apply.
    ///
    /// # Errors
    ///
    /// Returns [`TerraformError::Destroy`] when terraform exits non-zero.
    async fn destroy(&self, opts: &RunOptions) -> Result<()>;

    /// Fetch a named output as a parsed JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError::NotFound`] when the name is absent from the
    /// applied configuration, [`OutputError::Parse`] on malformed JSON.
    async fn output(&self, opts: &RunOptions, name: &str) -> Result<OutputValue>;

    /// Run `terraform version` — environment preflight.
    ///
    /// # Errors
    ///
    /// Returns an error if the binary cannot be spawned (not on PATH).
    async fn version(&self, opts: &RunOptions) -> Result<String>;

    /// Fetch a scalar string output.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError::Type`] when the output exists but is not a
    /// string.
    async fn output_str(&self, opts: &RunOptions, name: &str) -> Result<String> {
        let value = self.output(opts, name).await?;
        match value {
            OutputValue::Str(s) => Ok(s),
            other => Err(OutputError::Type {
                name: name.to_owned(),
                expected: "string",
                actual: other.type_name(),
            }
            .into()),
        }
    }

    /// Fetch a sequence-of-strings output.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError::Type`] when the output is not a list of
    /// strings.
    async fn output_str_list(&self, opts: &RunOptions, name: &str) -> Result<Vec<String>> {
        let value = self.output(opts, name).await?;
        match value.as_str_list() {
            Some(items) => Ok(items.into_iter().map(str::to_owned).collect()),
            None => Err(OutputError::Type {
                name: name.to_owned(),
                expected: "list of strings",
                actual: value.type_name(),
            }
            .into()),
        }
    }
}

/// Production adapter — shells out to the terraform binary via a
/// [`CommandRunner`]. Generic over the runner so tests can record calls and
/// return canned results.
pub struct TerraformCli<R: CommandRunner> {
    runner: R,
}

impl<R: CommandRunner> TerraformCli<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    async fn run_phase(&self, opts: &RunOptions, args: &[String]) -> Result<Output> {
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        self.runner
            .run_with_timeout(&opts.binary, &arg_refs, opts.provision_timeout)
            .await
    }

    async fn run_quick(&self, opts: &RunOptions, args: &[String]) -> Result<Output> {
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        self.runner
            .run_with_timeout(&opts.binary, &arg_refs, opts.cmd_timeout)
            .await
    }
}

impl TerraformCli<TokioCommandRunner> {
    /// Convenience constructor for production use. Per-phase timeouts come
    /// from [`RunOptions`], so the runner default only covers stray calls.
    #[must_use]
    pub fn default_runner() -> Self {
        Self {
            runner: TokioCommandRunner::new(DEFAULT_CMD_TIMEOUT),
        }
    }
}

/// `terraform init` argument vector (after `-chdir`).
fn init_args(opts: &RunOptions) -> Vec<String> {
    let mut args = vec![
        opts.chdir_arg(),
        "init".to_owned(),
        "-input=false".to_owned(),
        "-no-color".to_owned(),
    ];
    if opts.upgrade {
        args.push("-upgrade".to_owned());
    }
    args
}

/// Arguments shared by apply and destroy: auto-approve plus the variable
/// files (in declaration order, later overriding earlier) and inline vars.
fn provision_args(opts: &RunOptions, subcommand: &str) -> Vec<String> {
    let mut args = vec![
        opts.chdir_arg(),
        subcommand.to_owned(),
        "-input=false".to_owned(),
        "-auto-approve".to_owned(),
        "-no-color".to_owned(),
    ];
    for file in &opts.var_files {
        args.push(format!("-var-file={}", file.display()));
    }
    for (key, value) in &opts.vars {
        args.push("-var".to_owned());
        args.push(format!("{key}={value}"));
    }
    args
}

fn output_args(opts: &RunOptions, name: &str) -> Vec<String> {
    vec![
        opts.chdir_arg(),
        "output".to_owned(),
        "-json".to_owned(),
        "-no-color".to_owned(),
        name.to_owned(),
    ]
}

fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

impl<R: CommandRunner> Terraform for TerraformCli<R> {
    async fn init(&self, opts: &RunOptions) -> Result<()> {
        info!(dir = %opts.terraform_dir.display(), upgrade = opts.upgrade, "terraform init");
        let output = self.run_phase(opts, &init_args(opts)).await?;
        if output.status.success() {
            Ok(())
        } else {
            Err(TerraformError::Init {
                stderr: stderr_text(&output),
            }
            .into())
        }
    }

    async fn apply(&self, opts: &RunOptions) -> Result<()> {
        info!(dir = %opts.terraform_dir.display(), "terraform apply");
        let output = self.run_phase(opts, &provision_args(opts, "apply")).await?;
        if output.status.success() {
            Ok(())
        } else {
            Err(TerraformError::Apply {
                stderr: stderr_text(&output),
            }
            .into())
        }
    }

    async fn destroy(&self, opts: &RunOptions) -> Result<()> {
        info!(dir = %opts.terraform_dir.display(), "terraform destroy");
        let output = self
            .run_phase(opts, &provision_args(opts, "destroy"))
            .await?;
        if output.status.success() {
            Ok(())
        } else {
            Err(TerraformError::Destroy {
                stderr: stderr_text(&output),
            }
            .into())
        }
    }

    async fn output(&self, opts: &RunOptions, name: &str) -> Result<OutputValue> {
        debug!(name, "terraform output");
        let output = self.run_quick(opts, &output_args(opts, name)).await?;
        if !output.status.success() {
            let stderr = stderr_text(&output);
            // Terraform reports an unknown name on stderr; other failures
            // (no state, lock errors) stay generic.
            if stderr.contains(&format!("\"{name}\" not found"))
                || stderr.contains("could not be found")
            {
                return Err(OutputError::NotFound(name.to_owned()).into());
            }
            anyhow::bail!("terraform output {name} failed:\n{stderr}");
        }
        let value: serde_json::Value =
            serde_json::from_slice(&output.stdout).map_err(|source| OutputError::Parse {
                name: name.to_owned(),
                source,
            })?;
        Ok(OutputValue::from(value))
    }

    async fn version(&self, opts: &RunOptions) -> Result<String> {
        let args = vec!["version".to_owned()];
        let output = self
            .run_quick(opts, &args)
            .await
            .context("terraform not found on PATH?")?;
        if !output.status.success() {
            anyhow::bail!("terraform version failed:\n{}", stderr_text(&output));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().next().unwrap_or_default().to_owned())
    }
}
