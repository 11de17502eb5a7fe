//! Shared types for catalog entries, step outcomes, persisted run state, and
//! run reports.
//!
//! The JSON shapes here are the on-disk contract for `.snesdev/` so they stay
//! tolerant of missing and unknown fields.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

/// Opaque parameter bag handed to an operation.
pub type Params = BTreeMap<String, Value>;

/// Metadata key an operation uses to publish the environment file it wrote.
pub const ENVIRONMENT_FILE_KEY: &str = "environment_file";

/// Identifies which collaborator a step invokes.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OperationRef {
    CheckHost,
    InstallSdk,
    ValidateInstall,
    ConfigureToolchain,
    IntegrateIde,
    CreateProject,
}

impl OperationRef {
    /// Return the stable string identifier used in JSON artifacts.
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationRef::CheckHost => "check_host",
            OperationRef::InstallSdk => "install_sdk",
            OperationRef::ValidateInstall => "validate_install",
            OperationRef::ConfigureToolchain => "configure_toolchain",
            OperationRef::IntegrateIde => "integrate_ide",
            OperationRef::CreateProject => "create_project",
        }
    }
}

impl fmt::Display for OperationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One catalog entry. Only the request customizer produces modified copies.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StepDefinition {
    pub name: String,
    pub description: String,
    pub required: bool,
    pub operation: OperationRef,
    #[serde(default)]
    pub parameters: Params,
}

impl StepDefinition {
    pub fn new(name: &str, description: &str, required: bool, operation: OperationRef) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            required,
            operation,
            parameters: Params::new(),
        }
    }

    /// Builder-style default parameter.
    pub fn with_param(mut self, key: &str, value: Value) -> Self {
        self.parameters.insert(key.to_string(), value);
        self
    }
}

/// Ordered, read-only list of steps. Position encodes dependency order.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct Catalog {
    steps: Vec<StepDefinition>,
}

impl Catalog {
    pub fn new(steps: Vec<StepDefinition>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&StepDefinition> {
        self.steps.iter().find(|step| step.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

/// Normalized result of one operation invocation.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct StepOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: Params,
}

impl StepOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_message: Some(message.into()),
            metadata: Params::new(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }
}

/// Persisted progress for one install target.
///
/// Every field defaults so records written by older or newer versions still
/// load; unknown fields are ignored.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RunState {
    #[serde(default)]
    pub schema_version: u32,
    #[serde(default)]
    pub install_prefix: String,
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub completed_step_names: BTreeSet<String>,
    #[serde(default)]
    pub environment_file_path: Option<String>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl RunState {
    pub fn new(install_prefix: &str, project_name: &str) -> Self {
        Self {
            schema_version: super::STATE_SCHEMA_VERSION,
            install_prefix: install_prefix.to_string(),
            project_name: project_name.to_string(),
            ..Self::default()
        }
    }

    pub fn is_completed(&self, step_name: &str) -> bool {
        self.completed_step_names.contains(step_name)
    }

    pub fn mark_completed(&mut self, step_name: &str) {
        self.completed_step_names.insert(step_name.to_string());
        self.schema_version = super::STATE_SCHEMA_VERSION;
        self.last_updated = Some(Utc::now());
    }
}

/// User-declared configuration for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRequest {
    pub project_name: String,
    /// Directory that receives the `<project_name>/` starter project.
    pub project_parent: PathBuf,
    pub install_prefix: PathBuf,
    pub version: String,
    pub download_url: String,
    pub offline_source: Option<PathBuf>,
    pub force_reinstall: bool,
    pub resume: bool,
    pub skip_ide: bool,
    pub skip_ci: bool,
    pub skip_project: bool,
    pub non_interactive: bool,
    pub update_shell_profile: bool,
    /// Per-step parameter overrides keyed by step name.
    pub step_params: BTreeMap<String, Params>,
}

impl RunRequest {
    /// Request with default version, download location and no flags set.
    pub fn new(project_name: &str, install_prefix: PathBuf, project_parent: PathBuf) -> Self {
        Self {
            project_name: project_name.to_string(),
            project_parent,
            install_prefix,
            version: crate::config::DEFAULT_SDK_VERSION.to_string(),
            download_url: crate::config::DEFAULT_DOWNLOAD_URL.to_string(),
            offline_source: None,
            force_reinstall: false,
            resume: false,
            skip_ide: false,
            skip_ci: false,
            skip_project: false,
            non_interactive: false,
            update_shell_profile: false,
            step_params: BTreeMap::new(),
        }
    }

    pub fn project_dir(&self) -> PathBuf {
        self.project_parent.join(&self.project_name)
    }
}

/// Per-step lifecycle state.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Skipped,
    Running,
    Completed,
    Failed,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::Skipped => "skipped",
            StepStatus::Running => "running",
            StepStatus::Completed => "completed",
            StepStatus::Failed => "failed",
        }
    }

    /// Terminal and satisfied: completed now or skipped as already done.
    pub fn is_done(&self) -> bool {
        matches!(self, StepStatus::Completed | StepStatus::Skipped)
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a step was skipped.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Recorded complete in the persisted run state.
    AlreadyCompleted,
    /// Not recorded, but the operation's probe reports it satisfied.
    AlreadySatisfied,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::AlreadyCompleted => "already completed",
            SkipReason::AlreadySatisfied => "already satisfied",
        }
    }
}

/// Run-level lifecycle state.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    NotStarted,
    InProgress,
    Succeeded,
    Aborted,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::NotStarted => "not_started",
            RunStatus::InProgress => "in_progress",
            RunStatus::Succeeded => "succeeded",
            RunStatus::Aborted => "aborted",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to one step during a run.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StepRecord {
    pub name: String,
    pub description: String,
    pub operation: OperationRef,
    pub required: bool,
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<SkipReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl StepRecord {
    pub fn pending(step: &StepDefinition) -> Self {
        Self {
            name: step.name.clone(),
            description: step.description.clone(),
            operation: step.operation,
            required: step.required,
            status: StepStatus::Pending,
            skip_reason: None,
            error_message: None,
        }
    }
}

/// Final summary of a run, produced once when the run ends.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RunReport {
    pub schema_version: u32,
    pub success: bool,
    pub status: RunStatus,
    pub completed_count: usize,
    pub total_count: usize,
    pub steps: Vec<StepRecord>,
    pub install_prefix: String,
    pub project_name: String,
    pub project_dir: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_file: Option<String>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    /// Build the report from final step records.
    ///
    /// `success` holds iff every required step ended done; optional failures
    /// never flip it.
    pub fn from_records(
        status: RunStatus,
        steps: Vec<StepRecord>,
        request: &RunRequest,
        environment_file: Option<String>,
    ) -> Self {
        let success = steps
            .iter()
            .filter(|step| step.required)
            .all(|step| step.status.is_done());
        let completed_count = steps.iter().filter(|step| step.status.is_done()).count();
        Self {
            schema_version: super::REPORT_SCHEMA_VERSION,
            success,
            status,
            completed_count,
            total_count: steps.len(),
            steps,
            install_prefix: request.install_prefix.display().to_string(),
            project_name: request.project_name.clone(),
            project_dir: request.project_dir().display().to_string(),
            environment_file,
            finished_at: Utc::now(),
        }
    }

    pub fn failed_steps(&self) -> impl Iterator<Item = &StepRecord> {
        self.steps
            .iter()
            .filter(|step| step.status == StepStatus::Failed)
    }

    pub fn step(&self, operation: OperationRef) -> Option<&StepRecord> {
        self.steps.iter().find(|step| step.operation == operation)
    }
}

/// One line of `.snesdev/history.jsonl`.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HistoryEntry {
    pub schema_version: u32,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub step: String,
    pub status: StepStatus,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
