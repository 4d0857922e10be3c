//! Terraform test harness — drive a provision → verify → deprovision cycle
//! against real infrastructure definitions from Rust tests.
//!
//! The heavy lifting (resource graphs, state, providers) belongs to the
//! terraform binary; this crate only configures an invocation, applies it,
//! reads named outputs, and guarantees teardown on every exit path.

#![cfg_attr(test, allow(clippy::expect_used))]

pub mod command_runner;
pub mod error;
pub mod harness;
pub mod options;
pub mod output;
pub mod terraform;

pub use error::{OutputError, TerraformError};
pub use harness::{verify_output, verify_output_list_first, with_applied};
pub use options::RunOptions;
pub use output::OutputValue;
pub use terraform::{Terraform, TerraformCli};
