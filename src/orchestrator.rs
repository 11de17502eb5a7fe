//! Resumable step orchestration.
//!
//! Steps run strictly in catalog order, one at a time. Progress is saved
//! after every successful step; a required failure aborts the run and leaves
//! the saved progress in place for the next resume, while a fully successful
//! run clears it.
use crate::executor::StepExecutor;
use crate::provision::{
    append_history, state_key, Catalog, HistoryEntry, Params, RunReport, RunRequest, RunState,
    RunStatus, SkipReason, StateStore, StepDefinition, StepRecord, StepStatus,
    ENVIRONMENT_FILE_KEY, HISTORY_SCHEMA_VERSION,
};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::path::PathBuf;

/// Walks a customized catalog against a state store and an executor.
pub struct Orchestrator<'a> {
    executor: &'a StepExecutor,
    store: &'a dyn StateStore,
    history_path: Option<PathBuf>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(executor: &'a StepExecutor, store: &'a dyn StateStore) -> Self {
        Self {
            executor,
            store,
            history_path: None,
        }
    }

    /// Append one JSONL history line per finished step to `path`.
    pub fn with_history(mut self, path: PathBuf) -> Self {
        self.history_path = Some(path);
        self
    }

    /// Run every step of `catalog` for `request` and report the result.
    pub fn run(&self, catalog: &Catalog, request: &RunRequest) -> RunReport {
        let key = state_key(&request.install_prefix, &request.project_name);
        let mut state = self.resolve_state(&key, request);
        let mut carried = Params::new();
        if let Some(path) = state.environment_file_path.as_deref() {
            carried.insert(ENVIRONMENT_FILE_KEY.to_string(), json!(path));
        }

        let mut records: Vec<StepRecord> =
            catalog.steps().iter().map(StepRecord::pending).collect();
        let mut run_status = RunStatus::InProgress;
        tracing::info!(
            steps = catalog.len(),
            completed = state.completed_step_names.len(),
            key = %key,
            "provisioning started"
        );

        for (record, step) in records.iter_mut().zip(catalog.steps()) {
            let started_at = Utc::now();
            let params = invocation_params(step, &carried);

            let skip = self.skip_reason(step, &state, &params, request.force_reinstall);
            if let Some(reason) = skip {
                record.status = StepStatus::Skipped;
                record.skip_reason = Some(reason);
                tracing::info!(step = %step.name, reason = reason.as_str(), "step skipped");
                if let Some(Value::String(path)) = params.get(ENVIRONMENT_FILE_KEY) {
                    state.environment_file_path = Some(path.clone());
                    carried.insert(ENVIRONMENT_FILE_KEY.to_string(), json!(path));
                }
                if reason == SkipReason::AlreadySatisfied {
                    state.mark_completed(&step.name);
                    self.persist(&key, &state);
                }
                self.record_history(step, record, started_at);
                continue;
            }

            record.status = StepStatus::Running;
            tracing::info!(step = %step.name, required = step.required, "step running");
            let outcome = self.executor.execute(step.operation, &params);

            if outcome.success {
                record.status = StepStatus::Completed;
                for (name, value) in &outcome.metadata {
                    carried.insert(name.clone(), value.clone());
                }
                if let Some(Value::String(path)) = outcome.metadata.get(ENVIRONMENT_FILE_KEY) {
                    state.environment_file_path = Some(path.clone());
                }
                state.mark_completed(&step.name);
                self.persist(&key, &state);
                tracing::info!(step = %step.name, "step completed");
                self.record_history(step, record, started_at);
                continue;
            }

            record.status = StepStatus::Failed;
            record.error_message = outcome.error_message;
            self.record_history(step, record, started_at);
            if step.required {
                tracing::error!(
                    step = %step.name,
                    error = record.error_message.as_deref().unwrap_or_default(),
                    "required step failed; aborting run"
                );
                run_status = RunStatus::Aborted;
                break;
            }
            tracing::warn!(
                step = %step.name,
                error = record.error_message.as_deref().unwrap_or_default(),
                "optional step failed; continuing"
            );
        }

        if run_status == RunStatus::InProgress {
            run_status = RunStatus::Succeeded;
            if let Err(err) = self.store.clear(&key) {
                tracing::warn!(
                    key = %key,
                    error = %format!("{err:#}"),
                    "could not clear run state"
                );
            }
        }
        tracing::info!(status = %run_status, "provisioning finished");

        RunReport::from_records(
            run_status,
            records,
            request,
            state.environment_file_path.clone(),
        )
    }

    /// Load prior progress, or start fresh when forcing or when the record
    /// belongs to a different target.
    fn resolve_state(&self, key: &str, request: &RunRequest) -> RunState {
        let prefix = request.install_prefix.display().to_string();
        let fresh = RunState::new(&prefix, &request.project_name);

        if request.force_reinstall {
            if let Err(err) = self.store.clear(key) {
                tracing::warn!(key, error = %format!("{err:#}"), "could not reset run state");
            }
            return fresh;
        }

        let loaded = match self.store.load(key) {
            Ok(loaded) => loaded,
            Err(err) => {
                tracing::warn!(key, error = %format!("{err:#}"), "could not load run state");
                None
            }
        };
        match loaded {
            Some(mut state)
                if matches_or_unknown(&state.install_prefix, &prefix)
                    && matches_or_unknown(&state.project_name, &request.project_name) =>
            {
                tracing::info!(
                    completed = state.completed_step_names.len(),
                    "resuming from previous progress"
                );
                state.install_prefix = prefix;
                state.project_name = request.project_name.clone();
                state
            }
            Some(_) => {
                tracing::warn!(key, "run state belongs to another target; ignoring it");
                fresh
            }
            None => {
                if request.resume {
                    tracing::warn!("nothing to resume; starting a fresh run");
                }
                fresh
            }
        }
    }

    fn skip_reason(
        &self,
        step: &StepDefinition,
        state: &RunState,
        params: &Params,
        force: bool,
    ) -> Option<SkipReason> {
        if force {
            return None;
        }
        let probe = self.executor.is_satisfied(step.operation, params);
        if state.is_completed(&step.name) {
            if probe == Some(false) {
                tracing::info!(step = %step.name, "recorded complete but no longer satisfied");
                return None;
            }
            return Some(SkipReason::AlreadyCompleted);
        }
        (probe == Some(true)).then_some(SkipReason::AlreadySatisfied)
    }

    fn persist(&self, key: &str, state: &RunState) {
        if let Err(err) = self.store.save(key, state) {
            tracing::warn!(key, error = %format!("{err:#}"), "could not save run state");
        }
    }

    fn record_history(
        &self,
        step: &StepDefinition,
        record: &StepRecord,
        started_at: DateTime<Utc>,
    ) {
        let Some(path) = self.history_path.as_deref() else {
            return;
        };
        let entry = HistoryEntry {
            schema_version: HISTORY_SCHEMA_VERSION,
            started_at,
            finished_at: Utc::now(),
            step: step.name.clone(),
            status: record.status,
            required: step.required,
            message: record
                .error_message
                .clone()
                .or_else(|| record.skip_reason.map(|reason| reason.as_str().to_string())),
        };
        if let Err(err) = append_history(path, &entry) {
            tracing::warn!(
                path = %path.display(),
                error = %format!("{err:#}"),
                "could not append history"
            );
        }
    }
}

/// Records missing a target field still belong to the key they were saved
/// under.
fn matches_or_unknown(recorded: &str, expected: &str) -> bool {
    recorded.is_empty() || recorded == expected
}

/// The step's own parameters plus metadata carried from earlier steps that
/// the step does not define itself.
fn invocation_params(step: &StepDefinition, carried: &Params) -> Params {
    let mut params = step.parameters.clone();
    for (key, value) in carried {
        params.entry(key.clone()).or_insert_with(|| value.clone());
    }
    params
}

#[cfg(test)]
mod tests {
    use super::invocation_params;
    use crate::provision::{OperationRef, Params, StepDefinition};
    use serde_json::json;

    #[test]
    fn step_parameters_win_over_carried_metadata() {
        let step = StepDefinition::new(
            "configure",
            "Configure",
            true,
            OperationRef::ConfigureToolchain,
        )
        .with_param("environment_file", json!("/explicit/env.sh"));
        let mut carried = Params::new();
        carried.insert("environment_file".to_string(), json!("/carried/env.sh"));
        carried.insert("sdk_version".to_string(), json!("4.3.0"));

        let params = invocation_params(&step, &carried);
        assert_eq!(params["environment_file"], json!("/explicit/env.sh"));
        assert_eq!(params["sdk_version"], json!("4.3.0"));
        assert_eq!(step.parameters.len(), 1);
    }
}
