//! Request customization: map run options onto a per-run catalog copy.
//!
//! `customize` never mutates its input, never adds steps and never reorders
//! them. Overrides for step names the catalog does not know are ignored.
use crate::catalog::param;
use crate::provision::{Catalog, OperationRef, RunRequest, SetupPaths, StepDefinition};
use serde_json::{json, Value};
use std::path::Path;

/// Produce the catalog for one run.
pub fn customize(catalog: &Catalog, request: &RunRequest) -> Catalog {
    let steps = catalog
        .steps()
        .iter()
        .filter_map(|step| customize_step(step, request))
        .collect();
    Catalog::new(steps)
}

/// Names in `request.step_params` that match no step of `catalog`.
pub fn unknown_override_names<'a>(catalog: &Catalog, request: &'a RunRequest) -> Vec<&'a str> {
    request
        .step_params
        .keys()
        .filter(|name| !catalog.contains(name))
        .map(String::as_str)
        .collect()
}

fn customize_step(step: &StepDefinition, request: &RunRequest) -> Option<StepDefinition> {
    let mut step = step.clone();
    let paths = SetupPaths::new(request.install_prefix.clone());
    let prefix = path_value(paths.prefix());
    let sdk_root = path_value(&paths.sdk_root());

    let params = &mut step.parameters;
    match step.operation {
        OperationRef::CheckHost => {
            params.insert(
                param::ARCHIVE_TOOL.to_string(),
                archive_tool(request.offline_source.as_deref()),
            );
        }
        OperationRef::InstallSdk => {
            params.insert(param::INSTALL_PREFIX.to_string(), prefix);
            params.insert(param::SDK_ROOT.to_string(), sdk_root);
            params.insert(param::VERSION.to_string(), json!(request.version));
            params.insert(param::DOWNLOAD_URL.to_string(), json!(request.download_url));
            params.insert(
                param::ARCHIVE_TOOL.to_string(),
                archive_tool(request.offline_source.as_deref()),
            );
            if let Some(source) = request.offline_source.as_deref() {
                params.insert(param::OFFLINE_SOURCE.to_string(), path_value(source));
            }
            params.insert(param::OVERWRITE.to_string(), json!(request.force_reinstall));
        }
        OperationRef::ValidateInstall => {
            params.insert(param::SDK_ROOT.to_string(), sdk_root);
        }
        OperationRef::ConfigureToolchain => {
            params.insert(param::SDK_ROOT.to_string(), sdk_root);
            params.insert(
                param::ENVIRONMENT_FILE.to_string(),
                path_value(&paths.env_file_path()),
            );
            params.insert(
                param::UPDATE_SHELL_PROFILE.to_string(),
                json!(request.update_shell_profile),
            );
            params.insert(
                param::NON_INTERACTIVE.to_string(),
                json!(request.non_interactive),
            );
        }
        OperationRef::IntegrateIde => {
            if request.skip_ide && request.skip_ci {
                return None;
            }
            if request.skip_ide || request.skip_ci {
                step.required = false;
            }
            params.insert(param::IDE.to_string(), json!(!request.skip_ide));
            params.insert(param::CI.to_string(), json!(!request.skip_ci));
            params.insert(param::SDK_ROOT.to_string(), sdk_root);
            params.insert(
                param::PROJECT_DIR.to_string(),
                path_value(&request.project_dir()),
            );
            params.insert(param::PROJECT_NAME.to_string(), json!(request.project_name));
            params.insert(param::VERSION.to_string(), json!(request.version));
            params.insert(param::DOWNLOAD_URL.to_string(), json!(request.download_url));
            params.insert(param::OVERWRITE.to_string(), json!(request.force_reinstall));
        }
        OperationRef::CreateProject => {
            if request.skip_project {
                return None;
            }
            params.insert(param::SDK_ROOT.to_string(), sdk_root);
            params.insert(
                param::PROJECT_DIR.to_string(),
                path_value(&request.project_dir()),
            );
            params.insert(param::PROJECT_NAME.to_string(), json!(request.project_name));
            params.insert(param::OVERWRITE.to_string(), json!(request.force_reinstall));
        }
    }

    if let Some(overrides) = request.step_params.get(&step.name) {
        for (key, value) in overrides {
            step.parameters.insert(key.clone(), value.clone());
        }
    }
    Some(step)
}

/// Extraction tool the SDK source needs, judged from its file name.
///
/// Downloads are zip releases; an offline source with no archive suffix is
/// taken to be an unpacked directory.
fn archive_tool(offline_source: Option<&Path>) -> Value {
    let Some(source) = offline_source else {
        return json!("unzip");
    };
    let name = source
        .file_name()
        .map(|name| name.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    if name.ends_with(".zip") {
        json!("unzip")
    } else if name.ends_with(".tar")
        || name.ends_with(".tar.gz")
        || name.ends_with(".tgz")
        || name.ends_with(".tar.xz")
        || name.ends_with(".tar.bz2")
    {
        json!("tar")
    } else {
        Value::Null
    }
}

fn path_value(path: &Path) -> Value {
    json!(path.display().to_string())
}

#[cfg(test)]
#[path = "customize_tests.rs"]
mod tests;
