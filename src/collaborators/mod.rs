//! Concrete provisioning operations for a PVSnesLib environment.
//!
//! Each collaborator reads its inputs from the step parameter bag and reports
//! through `StepOutcome`; expected problems (missing tool, unreadable source)
//! are failed outcomes, while `Err` is kept for I/O the step cannot recover
//! from.
use crate::executor::OperationRegistry;
use crate::provision::{OperationRef, Params};
use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

mod host;
mod integration;
mod scaffold;
mod sdk;
mod toolchain;
mod verify;

pub use host::CheckHost;
pub use integration::IntegrateIde;
pub use scaffold::CreateProject;
pub use sdk::{render_download_url, InstallSdk};
pub use toolchain::{render_env_file, ConfigureToolchain};
pub use verify::ValidateInstall;

/// Registry wiring every catalog operation to its real implementation.
pub fn default_registry() -> OperationRegistry {
    OperationRegistry::new()
        .with(OperationRef::CheckHost, CheckHost)
        .with(OperationRef::InstallSdk, InstallSdk)
        .with(OperationRef::ValidateInstall, ValidateInstall)
        .with(OperationRef::ConfigureToolchain, ConfigureToolchain)
        .with(OperationRef::IntegrateIde, IntegrateIde)
        .with(OperationRef::CreateProject, CreateProject)
}

pub(crate) fn str_param<'a>(params: &'a Params, key: &str) -> Result<&'a str> {
    opt_str_param(params, key).ok_or_else(|| anyhow!("missing string parameter {key:?}"))
}

pub(crate) fn opt_str_param<'a>(params: &'a Params, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

pub(crate) fn path_param(params: &Params, key: &str) -> Result<PathBuf> {
    str_param(params, key).map(PathBuf::from)
}

pub(crate) fn bool_param(params: &Params, key: &str, default: bool) -> bool {
    params.get(key).and_then(Value::as_bool).unwrap_or(default)
}

/// String entries of an array parameter; anything else reads as empty.
pub(crate) fn str_list_param(params: &Params, key: &str) -> Vec<String> {
    params
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Write `contents` unless the file exists and `overwrite` is off.
///
/// Returns whether the file was written.
pub(crate) fn write_file(path: &Path, contents: &str, overwrite: bool) -> Result<bool> {
    if path.exists() && !overwrite {
        tracing::debug!(path = %path.display(), "keeping existing file");
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("write {}", path.display()))?;
    Ok(true)
}

#[cfg(test)]
#[path = "collaborators_tests.rs"]
mod tests;
