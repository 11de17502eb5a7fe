use super::{path_param, str_list_param};
use crate::catalog::param;
use crate::executor::Operation;
use crate::provision::{Params, StepOutcome};
use anyhow::Result;
use std::path::Path;

/// Checks that the installed SDK tree has the expected layout and tools.
///
/// Always runs: it has no probe, so a recorded completion is the only thing
/// that skips it.
pub struct ValidateInstall;

impl Operation for ValidateInstall {
    fn run(&self, params: &Params) -> Result<StepOutcome> {
        let sdk_root = path_param(params, param::SDK_ROOT)?;
        let mut problems = Vec::new();
        for relative in str_list_param(params, param::EXPECTED_PATHS) {
            if !sdk_root.join(&relative).exists() {
                problems.push(format!("missing {relative}"));
            }
        }
        for relative in str_list_param(params, param::EXPECTED_TOOLS) {
            let tool = sdk_root.join(&relative);
            if !tool.is_file() {
                problems.push(format!("missing {relative}"));
            } else if !is_executable(&tool) {
                problems.push(format!("{relative} is not executable"));
            }
        }
        if problems.is_empty() {
            tracing::debug!(root = %sdk_root.display(), "SDK layout ok");
            return Ok(StepOutcome::ok());
        }
        Ok(StepOutcome::failed(format!(
            "SDK at {} is incomplete: {}",
            sdk_root.display(),
            problems.join("; ")
        )))
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|meta| meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
