//! End-to-end orchestrator behavior against a real file state store.

mod common;

use common::{catalog, Behavior, Harness, PROJECT};
use serde_json::json;
use snesdev::executor::OperationRegistry;
use snesdev::provision::{
    Catalog, HistoryEntry, OperationRef, RunRequest, RunState, RunStatus, SkipReason,
    StateStore, StepDefinition, StepStatus, ENVIRONMENT_FILE_KEY,
};
use std::fs;

const A: OperationRef = OperationRef::CheckHost;
const B: OperationRef = OperationRef::InstallSdk;
const C: OperationRef = OperationRef::ValidateInstall;
const D: OperationRef = OperationRef::ConfigureToolchain;

fn four_required() -> Catalog {
    catalog(&[("a", true, A), ("b", true, B), ("c", true, C), ("d", true, D)])
}

fn all_succeed(h: &Harness) -> OperationRegistry {
    OperationRegistry::new()
        .with(A, h.op("a", Behavior::Succeed))
        .with(B, h.op("b", Behavior::Succeed))
        .with(C, h.op("c", Behavior::Succeed))
        .with(D, h.op("d", Behavior::Succeed))
}

fn save_progress(h: &Harness, request: &RunRequest, done: &[&str]) {
    let mut state = RunState::new(&request.install_prefix.display().to_string(), PROJECT);
    for name in done {
        state.mark_completed(name);
    }
    h.store().save(&h.key(), &state).expect("save state");
}

#[test]
fn fresh_run_executes_steps_in_order_and_clears_state() {
    let h = Harness::new();
    let request = h.request();
    let report = h.run(&four_required(), all_succeed(&h), &request);

    assert_eq!(h.calls(), vec!["a", "b", "c", "d"]);
    assert!(report.success);
    assert_eq!(report.status, RunStatus::Succeeded);
    assert_eq!(report.completed_count, 4);
    assert_eq!(report.total_count, 4);
    assert!(report
        .steps
        .iter()
        .all(|step| step.status == StepStatus::Completed));
    assert!(h.store().load(&h.key()).expect("load").is_none());

    let history = fs::read_to_string(h.paths().history_path()).expect("read history");
    let entries: Vec<HistoryEntry> = history
        .lines()
        .map(|line| serde_json::from_str(line).expect("history line"))
        .collect();
    assert_eq!(entries.len(), 4);
    assert_eq!(entries[0].step, "a");
    assert!(entries.iter().all(|entry| entry.status == StepStatus::Completed));
}

#[test]
fn second_run_invokes_nothing_when_effects_are_present() {
    let h = Harness::new();
    let request = h.request();
    let probed = || {
        OperationRegistry::new()
            .with(A, h.op("a", Behavior::Succeed).with_probe())
            .with(B, h.op("b", Behavior::Succeed).with_probe())
            .with(C, h.op("c", Behavior::Succeed).with_probe())
    };
    let steps = catalog(&[("a", true, A), ("b", true, B), ("c", true, C)]);

    assert!(h.run(&steps, probed(), &request).success);
    h.clear_calls();

    let report = h.run(&steps, probed(), &request);
    assert!(h.calls().is_empty());
    assert!(report.success);
    assert_eq!(report.completed_count, 3);
    for step in &report.steps {
        assert_eq!(step.status, StepStatus::Skipped);
        assert_eq!(step.skip_reason, Some(SkipReason::AlreadySatisfied));
    }
}

#[test]
fn resume_skips_recorded_steps_only() {
    let h = Harness::new();
    let mut request = h.request();
    request.resume = true;
    save_progress(&h, &request, &["a"]);

    let report = h.run(&four_required(), all_succeed(&h), &request);

    assert_eq!(h.calls(), vec!["b", "c", "d"]);
    assert_eq!(report.steps[0].status, StepStatus::Skipped);
    assert_eq!(report.steps[0].skip_reason, Some(SkipReason::AlreadyCompleted));
    assert!(report.success);
    assert_eq!(report.completed_count, 4);
}

#[test]
fn saved_progress_is_honoured_without_resume_flag() {
    let h = Harness::new();
    let request = h.request();
    save_progress(&h, &request, &["a", "b"]);

    h.run(&four_required(), all_succeed(&h), &request);
    assert_eq!(h.calls(), vec!["c", "d"]);
}

#[test]
fn optional_failure_is_reported_without_aborting() {
    let h = Harness::new();
    let request = h.request();
    let steps = catalog(&[("a", true, A), ("b", false, B), ("c", true, C)]);
    let registry = OperationRegistry::new()
        .with(A, h.op("a", Behavior::Succeed))
        .with(B, h.op("b", Behavior::Fail))
        .with(C, h.op("c", Behavior::Succeed));

    let report = h.run(&steps, registry, &request);

    assert_eq!(h.calls(), vec!["a", "b", "c"]);
    assert!(report.success);
    assert_eq!(report.status, RunStatus::Succeeded);
    assert_eq!(report.completed_count, 2);
    assert_eq!(report.steps[1].status, StepStatus::Failed);
    assert_eq!(report.steps[1].error_message.as_deref(), Some("b broke"));
    assert!(h.store().load(&h.key()).expect("load").is_none());
}

#[test]
fn required_failure_aborts_and_next_run_resumes_there() {
    let h = Harness::new();
    let request = h.request();
    let steps = catalog(&[("a", true, A), ("b", true, B), ("c", false, C), ("d", true, D)]);
    let failing = OperationRegistry::new()
        .with(A, h.op("a", Behavior::Succeed))
        .with(B, h.op("b", Behavior::Error))
        .with(C, h.op("c", Behavior::Succeed))
        .with(D, h.op("d", Behavior::Succeed));

    let report = h.run(&steps, failing, &request);
    assert_eq!(h.calls(), vec!["a", "b"]);
    assert!(!report.success);
    assert_eq!(report.status, RunStatus::Aborted);
    assert_eq!(report.steps[1].status, StepStatus::Failed);
    assert_eq!(report.steps[1].error_message.as_deref(), Some("b errored"));
    assert_eq!(report.steps[2].status, StepStatus::Pending);
    assert_eq!(report.steps[3].status, StepStatus::Pending);
    assert_eq!(report.completed_count, 1);

    let saved = h.store().load(&h.key()).expect("load").expect("progress kept");
    assert_eq!(
        saved.completed_step_names.iter().collect::<Vec<_>>(),
        vec!["a"]
    );

    h.clear_calls();
    let mut resume = request.clone();
    resume.resume = true;
    let report = h.run(&steps, all_succeed(&h), &resume);
    assert_eq!(h.calls(), vec!["b", "c", "d"]);
    assert!(report.success);
    assert_eq!(report.completed_count, 4);
}

#[test]
fn panicking_operation_becomes_a_failed_step() {
    let h = Harness::new();
    let request = h.request();
    let steps = catalog(&[("a", true, A), ("b", true, B)]);
    let registry = OperationRegistry::new()
        .with(A, h.op("a", Behavior::Panic))
        .with(B, h.op("b", Behavior::Succeed));

    let report = h.run(&steps, registry, &request);
    assert_eq!(report.status, RunStatus::Aborted);
    let message = report.steps[0].error_message.as_deref().unwrap_or_default();
    assert!(message.contains("panicked"), "{message}");
    assert!(message.contains("a exploded"), "{message}");
    assert_eq!(h.calls(), vec!["a"]);
}

#[test]
fn force_reruns_recorded_and_satisfied_steps() {
    let h = Harness::new();
    let mut request = h.request();
    let steps = catalog(&[("a", true, A), ("b", true, B)]);
    let registry = || {
        OperationRegistry::new()
            .with(A, h.op("a", Behavior::Succeed).with_probe())
            .with(B, h.op("b", Behavior::Succeed).with_probe())
    };
    h.run(&steps, registry(), &request);
    save_progress(&h, &request, &["a", "b"]);
    h.clear_calls();

    request.force_reinstall = true;
    let report = h.run(&steps, registry(), &request);
    assert_eq!(h.calls(), vec!["a", "b"]);
    assert!(report
        .steps
        .iter()
        .all(|step| step.status == StepStatus::Completed));
}

#[test]
fn recorded_step_whose_effect_vanished_runs_again() {
    let h = Harness::new();
    let request = h.request();
    save_progress(&h, &request, &["a", "b"]);
    let registry = OperationRegistry::new()
        .with(A, h.op("a", Behavior::Succeed).with_probe())
        .with(B, h.op("b", Behavior::Succeed))
        .with(C, h.op("c", Behavior::Succeed));

    let report = h.run(
        &catalog(&[("a", true, A), ("b", true, B), ("c", true, C)]),
        registry,
        &request,
    );
    assert_eq!(h.calls(), vec!["a", "c"]);
    assert_eq!(report.steps[0].status, StepStatus::Completed);
    assert_eq!(report.steps[1].skip_reason, Some(SkipReason::AlreadyCompleted));
}

#[test]
fn record_for_another_target_is_ignored() {
    let h = Harness::new();
    let request = h.request();
    let mut state = RunState::new("/somewhere/else", PROJECT);
    state.mark_completed("a");
    h.store().save(&h.key(), &state).expect("save state");

    h.run(&four_required(), all_succeed(&h), &request);
    assert_eq!(h.calls(), vec!["a", "b", "c", "d"]);
}

#[test]
fn record_without_target_fields_is_resumed() {
    let h = Harness::new();
    let request = h.request();
    let path = h.paths().state_path(&h.key());
    fs::create_dir_all(path.parent().expect("state dir")).expect("mkdir");
    fs::write(&path, r#"{"completedStepNames":["a"]}"#).expect("write record");

    let report = h.run(&four_required(), all_succeed(&h), &request);
    assert_eq!(h.calls(), vec!["b", "c", "d"]);
    assert_eq!(report.steps[0].skip_reason, Some(SkipReason::AlreadyCompleted));
    assert!(report.success);
}

#[test]
fn corrupt_record_starts_fresh() {
    let h = Harness::new();
    let request = h.request();
    let path = h.paths().state_path(&h.key());
    fs::create_dir_all(path.parent().expect("state dir")).expect("mkdir");
    fs::write(&path, "{ not json").expect("write garbage");

    let report = h.run(&four_required(), all_succeed(&h), &request);
    assert_eq!(h.calls(), vec!["a", "b", "c", "d"]);
    assert!(report.success);
}

#[test]
fn unknown_recorded_names_are_tolerated() {
    let h = Harness::new();
    let request = h.request();
    save_progress(&h, &request, &["a", "retired_step"]);

    let report = h.run(&four_required(), all_succeed(&h), &request);
    assert_eq!(h.calls(), vec!["b", "c", "d"]);
    assert!(report.success);
}

#[test]
fn environment_file_metadata_is_carried_and_persisted() {
    let h = Harness::new();
    let request = h.request();
    let steps = catalog(&[("a", true, A), ("b", true, B)]);
    let registry = OperationRegistry::new()
        .with(
            A,
            h.op("a", Behavior::Succeed)
                .with_metadata(ENVIRONMENT_FILE_KEY, json!("/opt/snes/env.sh")),
        )
        .with(B, h.op("b", Behavior::Fail));

    let report = h.run(&steps, registry, &request);
    assert_eq!(report.environment_file.as_deref(), Some("/opt/snes/env.sh"));
    let params = h.params_for("b").expect("b ran");
    assert_eq!(params[ENVIRONMENT_FILE_KEY], json!("/opt/snes/env.sh"));

    let saved = h.store().load(&h.key()).expect("load").expect("progress kept");
    assert_eq!(
        saved.environment_file_path.as_deref(),
        Some("/opt/snes/env.sh")
    );

    h.clear_calls();
    let retry = OperationRegistry::new()
        .with(A, h.op("a", Behavior::Succeed))
        .with(B, h.op("b", Behavior::Succeed));
    let report = h.run(&steps, retry, &request);
    assert_eq!(h.calls(), vec!["b"]);
    let params = h.params_for("b").expect("b ran");
    assert_eq!(params[ENVIRONMENT_FILE_KEY], json!("/opt/snes/env.sh"));
    assert_eq!(report.environment_file.as_deref(), Some("/opt/snes/env.sh"));
}

#[test]
fn satisfied_step_still_reports_environment_file() {
    let h = Harness::new();
    let request = h.request();
    let steps = Catalog::new(vec![
        StepDefinition::new("a", "step a", true, A),
        StepDefinition::new("b", "step b", true, B)
            .with_param(ENVIRONMENT_FILE_KEY, json!("/opt/snes/env.sh")),
    ]);
    let probed = || {
        OperationRegistry::new()
            .with(A, h.op("a", Behavior::Succeed).with_probe())
            .with(
                B,
                h.op("b", Behavior::Succeed)
                    .with_probe()
                    .with_metadata(ENVIRONMENT_FILE_KEY, json!("/opt/snes/env.sh")),
            )
    };

    let report = h.run(&steps, probed(), &request);
    assert_eq!(report.environment_file.as_deref(), Some("/opt/snes/env.sh"));
    h.clear_calls();

    let report = h.run(&steps, probed(), &request);
    assert!(h.calls().is_empty());
    assert_eq!(report.steps[1].skip_reason, Some(SkipReason::AlreadySatisfied));
    assert_eq!(report.environment_file.as_deref(), Some("/opt/snes/env.sh"));
    assert!(snesdev::report::render(&report).contains("source /opt/snes/env.sh"));
}

#[test]
fn missing_operation_fails_the_step() {
    let h = Harness::new();
    let request = h.request();
    let steps = catalog(&[("a", true, A), ("b", true, B)]);
    let registry = OperationRegistry::new().with(A, h.op("a", Behavior::Succeed));

    let report = h.run(&steps, registry, &request);
    assert_eq!(report.status, RunStatus::Aborted);
    assert!(report.steps[1]
        .error_message
        .as_deref()
        .unwrap_or_default()
        .contains("no operation registered"));
}
