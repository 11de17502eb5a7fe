//! Step execution boundary.
//!
//! `StepExecutor::execute` is the only place collaborator code is called.
//! Whatever the operation does (return a failure, return `Err`, panic) comes
//! back as a `StepOutcome`, so the orchestrator never unwinds.
use crate::provision::{OperationRef, Params, StepOutcome};
use anyhow::Result;
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

/// One external provisioning action.
pub trait Operation {
    /// Perform the action with the step's parameter bag.
    fn run(&self, params: &Params) -> Result<StepOutcome>;

    /// Cheap check that the action's effect is already present.
    ///
    /// `None` means the operation has no probe.
    fn is_satisfied(&self, _params: &Params) -> Option<bool> {
        None
    }
}

/// Operations keyed by the reference catalog steps use.
#[derive(Default)]
pub struct OperationRegistry {
    operations: BTreeMap<OperationRef, Box<dyn Operation>>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, operation_ref: OperationRef, operation: impl Operation + 'static) {
        self.operations.insert(operation_ref, Box::new(operation));
    }

    pub fn with(
        mut self,
        operation_ref: OperationRef,
        operation: impl Operation + 'static,
    ) -> Self {
        self.register(operation_ref, operation);
        self
    }

    fn get(&self, operation_ref: OperationRef) -> Option<&dyn Operation> {
        self.operations.get(&operation_ref).map(|op| op.as_ref())
    }
}

/// Adapter that normalizes every operation result.
pub struct StepExecutor {
    registry: OperationRegistry,
}

impl StepExecutor {
    pub fn new(registry: OperationRegistry) -> Self {
        Self { registry }
    }

    /// Invoke `operation_ref` and normalize the outcome.
    pub fn execute(&self, operation_ref: OperationRef, params: &Params) -> StepOutcome {
        let Some(operation) = self.registry.get(operation_ref) else {
            return StepOutcome::failed(format!("no operation registered for {operation_ref}"));
        };
        let start = Instant::now();
        let result = panic::catch_unwind(AssertUnwindSafe(|| operation.run(params)));
        let elapsed_ms = start.elapsed().as_millis();
        let outcome = match result {
            Ok(Ok(outcome)) if outcome.success => outcome,
            Ok(Ok(outcome)) => StepOutcome {
                error_message: Some(
                    outcome
                        .error_message
                        .filter(|message| !message.trim().is_empty())
                        .unwrap_or_else(|| format!("{operation_ref} reported failure")),
                ),
                ..outcome
            },
            Ok(Err(err)) => StepOutcome::failed(format!("{err:#}")),
            Err(payload) => StepOutcome::failed(format!(
                "{operation_ref} panicked: {}",
                panic_message(payload.as_ref())
            )),
        };
        tracing::debug!(
            operation = %operation_ref,
            elapsed_ms,
            success = outcome.success,
            "operation finished"
        );
        outcome
    }

    /// Ask the operation's probe whether its effect is present.
    ///
    /// A probe that panics counts as no probe.
    pub fn is_satisfied(&self, operation_ref: OperationRef, params: &Params) -> Option<bool> {
        let operation = self.registry.get(operation_ref)?;
        match panic::catch_unwind(AssertUnwindSafe(|| operation.is_satisfied(params))) {
            Ok(answer) => answer,
            Err(payload) => {
                tracing::warn!(
                    operation = %operation_ref,
                    panic = %panic_message(payload.as_ref()),
                    "satisfaction probe panicked; ignoring it"
                );
                None
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    "unknown panic payload".to_string()
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
