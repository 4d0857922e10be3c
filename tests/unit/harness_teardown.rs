//! Teardown-always properties of the provision cycle.
//!
//! Exactly one destroy must follow every apply attempt: body success, body
//! error, body panic, and apply failure all funnel through a single destroy.

#![allow(clippy::expect_used)]

use std::panic::AssertUnwindSafe;
use std::sync::atomic::Ordering;

use pretty_assertions::assert_eq;
use tfharness::error::{OutputError, TerraformError};
use tfharness::output::OutputValue;
use tfharness::{RunOptions, verify_output, verify_output_list_first, with_applied};

use crate::mocks::ScriptedTerraform;

fn opts() -> RunOptions {
    RunOptions::new("../examples").var_file("terratest.tfvars").upgrade()
}

#[tokio::test]
async fn successful_verification_destroys_exactly_once() {
    let tf = ScriptedTerraform::with_output(
        "linux_virtual_machine_name",
        OutputValue::Str("VMLINUX01.test".to_owned()),
    );

    verify_output(&tf, &opts(), "linux_virtual_machine_name", "VMLINUX01.test")
        .await
        .expect("verification should pass");

    assert_eq!(tf.init_calls.load(Ordering::SeqCst), 1);
    assert_eq!(tf.apply_calls.load(Ordering::SeqCst), 1);
    assert_eq!(tf.destroy_count(), 1);
}

#[tokio::test]
async fn assertion_mismatch_fails_but_still_destroys() {
    let tf = ScriptedTerraform::with_output(
        "linux_virtual_machine_name",
        OutputValue::Str("VMLINUX02.test".to_owned()),
    );

    let err = verify_output(&tf, &opts(), "linux_virtual_machine_name", "VMLINUX01.test")
        .await
        .expect_err("mismatch should fail");

    let msg = err.to_string();
    assert!(msg.contains("mismatch"), "unexpected error: {msg}");
    assert!(msg.contains("VMLINUX01.test") && msg.contains("VMLINUX02.test"));
    assert_eq!(tf.destroy_count(), 1);
}

#[tokio::test]
async fn apply_failure_skips_verification_and_still_destroys() {
    let tf = ScriptedTerraform {
        fail_apply: true,
        ..ScriptedTerraform::default()
    };

    let err = verify_output(&tf, &opts(), "linux_virtual_machine_name", "VMLINUX01.test")
        .await
        .expect_err("apply failure should fail the run");

    assert!(
        matches!(
            err.downcast_ref::<TerraformError>(),
            Some(TerraformError::Apply { .. })
        ),
        "expected apply error, got: {err:#}"
    );
    assert_eq!(tf.apply_calls.load(Ordering::SeqCst), 1);
    assert_eq!(tf.destroy_count(), 1);
}

#[test]
fn body_panic_still_destroys_exactly_once_then_resumes() {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime");
    let tf = ScriptedTerraform::default();
    let opts = opts();

    let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
        rt.block_on(with_applied(&tf, &opts, async {
            assert_eq!("linux-vm", "windows-vm", "simulated assertion failure");
            Ok::<(), anyhow::Error>(())
        }))
    }));

    assert!(outcome.is_err(), "panic must resume after teardown");
    assert_eq!(tf.destroy_count(), 1);
}

#[tokio::test]
async fn missing_output_is_distinct_from_mismatch() {
    let tf = ScriptedTerraform::default();

    let err = verify_output(&tf, &opts(), "no_such_output", "anything")
        .await
        .expect_err("absent output should fail");

    assert!(
        matches!(
            err.downcast_ref::<OutputError>(),
            Some(OutputError::NotFound(name)) if name == "no_such_output"
        ),
        "expected output-resolution failure, got: {err:#}"
    );
    assert_eq!(tf.destroy_count(), 1);
}

#[tokio::test]
async fn destroy_failure_after_success_is_the_reported_error() {
    let mut tf = ScriptedTerraform::with_output("name", OutputValue::Str("linux-vm".to_owned()));
    tf.fail_destroy = true;

    let err = verify_output(&tf, &opts(), "name", "linux-vm")
        .await
        .expect_err("destroy failure should surface");

    assert!(matches!(
        err.downcast_ref::<TerraformError>(),
        Some(TerraformError::Destroy { .. })
    ));
    assert_eq!(tf.destroy_count(), 1);
}

#[tokio::test]
async fn body_error_wins_over_destroy_failure() {
    let mut tf = ScriptedTerraform::with_output("name", OutputValue::Str("other".to_owned()));
    tf.fail_destroy = true;

    let err = verify_output(&tf, &opts(), "name", "linux-vm")
        .await
        .expect_err("mismatch should fail");

    // The verification failure is reported; the destroy failure is only logged.
    assert!(err.to_string().contains("mismatch"), "got: {err:#}");
    assert_eq!(tf.destroy_count(), 1);
}

// ── Sequence outputs (scale-set variant) ─────────────────────────────────────

fn names_list(names: &[&str]) -> OutputValue {
    OutputValue::List(
        names
            .iter()
            .map(|n| OutputValue::Str((*n).to_owned()))
            .collect(),
    )
}

#[tokio::test]
async fn list_first_element_matches() {
    let tf = ScriptedTerraform::with_output(
        "linux_virtual_machine_names",
        names_list(&["linux-vm", "linux-vm-2"]),
    );

    verify_output_list_first(&tf, &opts(), "linux_virtual_machine_names", "linux-vm")
        .await
        .expect("first element should match");

    assert_eq!(tf.destroy_count(), 1);
}

#[tokio::test]
async fn list_first_element_mismatch_reports_both_values() {
    let tf =
        ScriptedTerraform::with_output("linux_virtual_machine_names", names_list(&["windows-vm"]));

    let err = verify_output_list_first(&tf, &opts(), "linux_virtual_machine_names", "linux-vm")
        .await
        .expect_err("first element differs");

    let msg = err.to_string();
    assert!(msg.contains("linux-vm") && msg.contains("windows-vm"), "got: {msg}");
    assert_eq!(tf.destroy_count(), 1);
}

#[tokio::test]
async fn scalar_output_where_list_expected_is_a_type_error() {
    let tf = ScriptedTerraform::with_output(
        "linux_virtual_machine_names",
        OutputValue::Str("linux-vm".to_owned()),
    );

    let err = verify_output_list_first(&tf, &opts(), "linux_virtual_machine_names", "linux-vm")
        .await
        .expect_err("scalar is not a sequence");

    assert!(matches!(
        err.downcast_ref::<OutputError>(),
        Some(OutputError::Type { .. })
    ));
    assert_eq!(tf.destroy_count(), 1);
}

#[tokio::test]
async fn empty_list_output_fails_verification() {
    let tf = ScriptedTerraform::with_output("linux_virtual_machine_names", names_list(&[]));

    let err = verify_output_list_first(&tf, &opts(), "linux_virtual_machine_names", "linux-vm")
        .await
        .expect_err("empty sequence has no first element");

    assert!(err.to_string().contains("empty sequence"));
    assert_eq!(tf.destroy_count(), 1);
}
