use super::{bool_param, path_param, str_param, write_file};
use crate::catalog::param;
use crate::executor::Operation;
use crate::provision::{Params, StepOutcome};
use crate::templates::{self, render};
use anyhow::{Context, Result};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

/// Font the starter `data.asm` embeds, shipped with the SDK examples.
pub const FONT_FILE: &str = "pvsneslibfont.png";
/// Width of the cartridge title field in the ROM header.
const ROM_TITLE_LEN: usize = 21;

/// Creates the starter hello-world project.
///
/// Existing files are kept unless `overwrite` is set, so re-running never
/// clobbers edits the user made to their project.
pub struct CreateProject;

impl Operation for CreateProject {
    fn run(&self, params: &Params) -> Result<StepOutcome> {
        let project_dir = path_param(params, param::PROJECT_DIR)?;
        let project_name = str_param(params, param::PROJECT_NAME)?;
        let sdk_root = path_param(params, param::SDK_ROOT)?;
        let overwrite = bool_param(params, param::OVERWRITE, false);
        fs::create_dir_all(&project_dir)
            .with_context(|| format!("create {}", project_dir.display()))?;

        let title = rom_title(project_name);
        let values = [("project_name", project_name), ("rom_title", title.as_str())];
        let mut written = 0;
        for (name, template) in [
            ("main.c", templates::STARTER_MAIN_C),
            ("hdr.asm", templates::STARTER_HDR_ASM),
            ("data.asm", templates::STARTER_DATA_ASM),
            ("Makefile", templates::STARTER_MAKEFILE),
            (".gitignore", templates::STARTER_GITIGNORE),
        ] {
            if write_file(&project_dir.join(name), &render(template, &values), overwrite)? {
                written += 1;
            }
        }

        let mut outcome = StepOutcome::ok()
            .with_metadata("project_dir", json!(project_dir.display().to_string()));
        let font = project_dir.join(FONT_FILE);
        if overwrite || !font.exists() {
            match font_source(&sdk_root) {
                Some(source) => {
                    fs::copy(&source, &font).with_context(|| {
                        format!("copy {} to {}", source.display(), font.display())
                    })?;
                    written += 1;
                }
                None => {
                    tracing::warn!(
                        sdk = %sdk_root.display(),
                        font = FONT_FILE,
                        "SDK ships no starter font; add one before running make"
                    );
                    outcome = outcome.with_metadata("font_missing", json!(true));
                }
            }
        }
        tracing::info!(dir = %project_dir.display(), files = written, "starter project ready");
        Ok(outcome)
    }

    fn is_satisfied(&self, params: &Params) -> Option<bool> {
        let project_dir = path_param(params, param::PROJECT_DIR).ok()?;
        Some(project_dir.join("main.c").is_file() && project_dir.join("Makefile").is_file())
    }
}

/// Project name as a ROM header title: upper-case, padded or cut to the
/// header's fixed width.
pub fn rom_title(project_name: &str) -> String {
    let upper: String = project_name
        .chars()
        .map(|ch| match ch {
            '_' | '-' => ' ',
            other => other.to_ascii_uppercase(),
        })
        .take(ROM_TITLE_LEN)
        .collect();
    format!("{upper:<width$}", width = ROM_TITLE_LEN)
}

fn font_source(sdk_root: &Path) -> Option<PathBuf> {
    [
        "snes-examples/hello_world",
        "snes-examples/hello_world/res",
        "snes-examples/text/hello_world",
    ]
    .iter()
    .map(|dir| sdk_root.join(dir).join(FONT_FILE))
    .find(|path| path.is_file())
}
