//! The provision cycle: apply, verify, destroy — with teardown guaranteed
//! on every exit path.
//!
//! There is no state machine here. The sequence is strictly linear per test
//! case; the only branching is success/failure of each step, and every
//! branch funnels through exactly one destroy.

use std::panic::AssertUnwindSafe;

use anyhow::Result;
use futures_util::FutureExt;
use tracing::warn;

use crate::options::RunOptions;
use crate::terraform::Terraform;

/// Init-and-apply `opts`, run `body` against the applied infrastructure,
/// then destroy — exactly once, no matter how apply or `body` end.
///
/// `body` is typically an async block capturing the same `tf` and `opts`,
/// fetching outputs and asserting on them. Assertion macros panic; the
/// harness catches the unwind, destroys, then resumes it so the enclosing
/// test still fails with the original assertion message.
///
/// Failure precedence:
/// - apply failure wins over a destroy failure (the destroy error is logged);
/// - a `body` error or panic wins over a destroy failure (logged);
/// - after a successful `body`, a destroy failure is the returned error.
///
/// # Errors
///
/// Propagates the apply error, the `body` error, or (only when everything
/// else succeeded) the destroy error.
pub async fn with_applied<T, Fut, R>(tf: &T, opts: &RunOptions, body: Fut) -> Result<R>
where
    T: Terraform,
    Fut: Future<Output = Result<R>>,
{
    if let Err(apply_err) = tf.init_and_apply(opts).await {
        if let Err(destroy_err) = tf.destroy(opts).await {
            warn!(error = %destroy_err, "destroy after failed apply also failed");
        }
        return Err(apply_err);
    }

    let body_result = AssertUnwindSafe(body).catch_unwind().await;
    let destroy_result = tf.destroy(opts).await;

    match body_result {
        Err(panic) => {
            if let Err(destroy_err) = destroy_result {
                warn!(error = %destroy_err, "destroy after panicked verification failed");
            }
            std::panic::resume_unwind(panic)
        }
        Ok(Err(body_err)) => {
            if let Err(destroy_err) = destroy_result {
                warn!(error = %destroy_err, "destroy after failed verification failed");
            }
            Err(body_err)
        }
        Ok(Ok(value)) => {
            destroy_result?;
            Ok(value)
        }
    }
}

/// One-shot cycle for the common case: apply, fetch a scalar string output,
/// compare it to `expected`, destroy.
///
/// # Errors
///
/// Apply/output/destroy failures propagate; a mismatch is reported with
/// expected-vs-actual detail.
pub async fn verify_output<T: Terraform>(
    tf: &T,
    opts: &RunOptions,
    name: &str,
    expected: &str,
) -> Result<()> {
    with_applied(tf, opts, async {
        let actual = tf.output_str(opts, name).await?;
        if actual == expected {
            Ok(())
        } else {
            anyhow::bail!("output \"{name}\" mismatch: expected {expected:?}, got {actual:?}")
        }
    })
    .await
}

/// One-shot cycle for sequence outputs: apply, fetch a list-of-strings
/// output, compare its FIRST element to `expected`, destroy.
///
/// The comparison target is deliberately the first element, not the whole
/// sequence — scale-set fixtures expose one name per instance and the
/// fixtures here provision a single instance.
///
/// # Errors
///
/// Apply/output/destroy failures propagate; an empty sequence or a
/// first-element mismatch is reported with expected-vs-actual detail.
pub async fn verify_output_list_first<T: Terraform>(
    tf: &T,
    opts: &RunOptions,
    name: &str,
    expected: &str,
) -> Result<()> {
    with_applied(tf, opts, async {
        let actual = tf.output_str_list(opts, name).await?;
        match actual.first() {
            Some(first) if first == expected => Ok(()),
            Some(first) => {
                anyhow::bail!(
                    "output \"{name}\" first element mismatch: expected {expected:?}, got {first:?}"
                )
            }
            None => anyhow::bail!("output \"{name}\" is an empty sequence"),
        }
    })
    .await
}
