//! Shared test infrastructure for integration tests.
#![allow(dead_code)]

use anyhow::anyhow;
use snesdev::executor::{Operation, OperationRegistry, StepExecutor};
use snesdev::orchestrator::Orchestrator;
use snesdev::provision::{
    state_key, Catalog, FileStateStore, OperationRef, Params, RunReport, RunRequest,
    SetupPaths, StepDefinition, StepOutcome,
};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Project name every harness request uses.
pub const PROJECT: &str = "demo";

/// Shared record of (operation label, params) in invocation order.
pub type CallLog = Arc<Mutex<Vec<(String, Params)>>>;

/// What a scripted operation does when run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Behavior {
    Succeed,
    Fail,
    Error,
    Panic,
}

/// Fake collaborator that logs its calls and, on success, drops a marker file
/// its optional probe checks. Markers live on disk so they survive across
/// orchestrator runs the way real side effects do.
pub struct ScriptedOp {
    label: String,
    behavior: Behavior,
    probe: bool,
    metadata: Params,
    marker_dir: PathBuf,
    log: CallLog,
}

impl ScriptedOp {
    pub fn with_probe(mut self) -> Self {
        self.probe = true;
        self
    }

    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    fn marker(&self) -> PathBuf {
        self.marker_dir.join(format!("{}.done", self.label))
    }
}

impl Operation for ScriptedOp {
    fn run(&self, params: &Params) -> anyhow::Result<StepOutcome> {
        self.log
            .lock()
            .expect("call log")
            .push((self.label.clone(), params.clone()));
        match self.behavior {
            Behavior::Succeed => {
                fs::write(self.marker(), "")?;
                Ok(StepOutcome {
                    metadata: self.metadata.clone(),
                    ..StepOutcome::ok()
                })
            }
            Behavior::Fail => Ok(StepOutcome::failed(format!("{} broke", self.label))),
            Behavior::Error => Err(anyhow!("{} errored", self.label)),
            Behavior::Panic => panic!("{} exploded", self.label),
        }
    }

    fn is_satisfied(&self, _params: &Params) -> Option<bool> {
        self.probe.then(|| self.marker().exists())
    }
}

/// Temp install prefix, state store and call log for orchestrator tests.
pub struct Harness {
    pub temp: TempDir,
    log: CallLog,
}

impl Default for Harness {
    fn default() -> Self {
        let temp = tempfile::tempdir().expect("create temp dir");
        fs::create_dir_all(temp.path().join("markers")).expect("create marker dir");
        Self {
            temp,
            log: CallLog::default(),
        }
    }
}

impl Harness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prefix(&self) -> PathBuf {
        self.temp.path().join("prefix")
    }

    pub fn paths(&self) -> SetupPaths {
        SetupPaths::new(self.prefix())
    }

    pub fn key(&self) -> String {
        state_key(&self.prefix(), PROJECT)
    }

    pub fn store(&self) -> FileStateStore {
        FileStateStore::new(self.paths().state_dir())
    }

    pub fn request(&self) -> RunRequest {
        RunRequest::new(PROJECT, self.prefix(), self.temp.path().join("projects"))
    }

    pub fn op(&self, label: &str, behavior: Behavior) -> ScriptedOp {
        ScriptedOp {
            label: label.to_string(),
            behavior,
            probe: false,
            metadata: Params::new(),
            marker_dir: self.temp.path().join("markers"),
            log: Arc::clone(&self.log),
        }
    }

    /// Labels of every operation invoked so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.log
            .lock()
            .expect("call log")
            .iter()
            .map(|(label, _)| label.clone())
            .collect()
    }

    /// Params the most recent call of `label` received.
    pub fn params_for(&self, label: &str) -> Option<Params> {
        self.log
            .lock()
            .expect("call log")
            .iter()
            .rev()
            .find(|(name, _)| name == label)
            .map(|(_, params)| params.clone())
    }

    pub fn clear_calls(&self) {
        self.log.lock().expect("call log").clear();
    }

    pub fn run(
        &self,
        catalog: &Catalog,
        registry: OperationRegistry,
        request: &RunRequest,
    ) -> RunReport {
        let executor = StepExecutor::new(registry);
        let store = self.store();
        Orchestrator::new(&executor, &store)
            .with_history(self.paths().history_path())
            .run(catalog, request)
    }
}

/// Catalog of `(name, required, operation)` entries in order.
pub fn catalog(steps: &[(&str, bool, OperationRef)]) -> Catalog {
    Catalog::new(
        steps
            .iter()
            .map(|(name, required, operation)| {
                StepDefinition::new(name, &format!("step {name}"), *required, *operation)
            })
            .collect(),
    )
}

/// Run the built binary with an isolated config location.
pub fn snesdev(temp: &TempDir, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_snesdev"))
        .args(args)
        .env("SNESDEV_CONFIG", temp.path().join("no-config.json"))
        .env_remove("SNESDEV_PREFIX")
        .env_remove("SNESDEV_VERSION")
        .env_remove("SNESDEV_LOG")
        .output()
        .expect("run snesdev")
}
