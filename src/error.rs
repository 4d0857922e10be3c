//! Typed error enums for the provision cycle.
//!
//! All error types implement `thiserror::Error` and convert to
//! `anyhow::Error` via the `?` operator. Callers that need to branch on the
//! taxonomy (e.g. missing output vs. wrong type) downcast with
//! `err.downcast_ref::<OutputError>()`.

use thiserror::Error;

// ── Provisioning errors ──────────────────────────────────────────────────────

/// Failures reported by the terraform binary itself. Each variant carries
/// the captured stderr so the test report shows the provider's diagnostics.
///
/// No variant is retryable here: any failure is terminal for its test case,
/// and retry logic belongs to terraform, not this wrapper.
#[derive(Debug, Error)]
pub enum TerraformError {
    #[error("terraform init failed:\n{stderr}")]
    Init { stderr: String },

    #[error("terraform apply failed:\n{stderr}")]
    Apply { stderr: String },

    #[error("terraform destroy failed:\n{stderr}")]
    Destroy { stderr: String },
}

// ── Output resolution errors ─────────────────────────────────────────────────

/// Failures resolving a named output after a successful apply. Distinct from
/// an assertion mismatch: these mean the value could not be fetched at all.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("output \"{0}\" not found in the applied configuration")]
    NotFound(String),

    #[error("output \"{name}\" is not a {expected} (got {actual})")]
    Type {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("output \"{name}\" is not valid JSON: {source}")]
    Parse {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}
