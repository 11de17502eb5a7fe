use super::{bool_param, path_param, render_download_url, str_param, write_file};
use crate::catalog::param;
use crate::executor::Operation;
use crate::provision::{Params, StepOutcome};
use crate::templates::{self, render};
use anyhow::Result;
use serde_json::json;
use std::path::{Path, PathBuf};

/// Platform CI runners use; the workflow template targets `ubuntu-latest`.
const CI_PLATFORM: &str = "linux";

/// Adds VS Code build tasks and a CI workflow to the project directory.
pub struct IntegrateIde;

impl Operation for IntegrateIde {
    fn run(&self, params: &Params) -> Result<StepOutcome> {
        let project_dir = path_param(params, param::PROJECT_DIR)?;
        let project_name = str_param(params, param::PROJECT_NAME)?;
        let sdk_root = path_param(params, param::SDK_ROOT)?;
        let overwrite = bool_param(params, param::OVERWRITE, false);
        let sdk_root = sdk_root.display().to_string();

        let mut written = Vec::new();
        if bool_param(params, param::IDE, true) {
            let values = [("project_name", project_name), ("sdk_root", sdk_root.as_str())];
            let vscode = project_dir.join(".vscode");
            for (name, template) in [
                ("tasks.json", templates::VSCODE_TASKS_JSON),
                ("c_cpp_properties.json", templates::VSCODE_CPP_PROPERTIES_JSON),
            ] {
                let path = vscode.join(name);
                if write_file(&path, &render(template, &values), overwrite)? {
                    written.push(path);
                }
            }
        }
        if bool_param(params, param::CI, true) {
            let version = str_param(params, param::VERSION)?;
            let url = render_download_url(
                str_param(params, param::DOWNLOAD_URL)?,
                version,
                CI_PLATFORM,
            );
            let values = [
                ("project_name", project_name),
                ("version", version),
                ("download_url", url.as_str()),
            ];
            let path = ci_workflow_path(&project_dir);
            if write_file(&path, &render(templates::CI_WORKFLOW_YML, &values), overwrite)? {
                written.push(path);
            }
        }
        tracing::info!(
            files = written.len(),
            dir = %project_dir.display(),
            "integration files written"
        );
        Ok(StepOutcome::ok().with_metadata(
            "integration_files",
            json!(written
                .iter()
                .map(|path| path.display().to_string())
                .collect::<Vec<_>>()),
        ))
    }

    fn is_satisfied(&self, params: &Params) -> Option<bool> {
        let project_dir = path_param(params, param::PROJECT_DIR).ok()?;
        let files = expected_files(
            &project_dir,
            bool_param(params, param::IDE, true),
            bool_param(params, param::CI, true),
        );
        Some(!files.is_empty() && files.iter().all(|path| path.is_file()))
    }
}

fn ci_workflow_path(project_dir: &Path) -> PathBuf {
    project_dir.join(".github").join("workflows").join("build.yml")
}

fn expected_files(project_dir: &Path, ide: bool, ci: bool) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if ide {
        files.push(project_dir.join(".vscode").join("tasks.json"));
        files.push(project_dir.join(".vscode").join("c_cpp_properties.json"));
    }
    if ci {
        files.push(ci_workflow_path(project_dir));
    }
    files
}
