use super::{bool_param, path_param, write_file};
use crate::catalog::param;
use crate::executor::Operation;
use crate::provision::{Params, StepOutcome, ENVIRONMENT_FILE_KEY};
use anyhow::{anyhow, Context, Result};
use serde_json::json;
use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};

/// Marks lines this tool appends to a shell profile.
const PROFILE_MARKER: &str = "# added by snesdev";

/// Writes `env.sh` exporting `PVSNESLIB_HOME` and the toolchain `PATH`, and
/// optionally hooks it into the user's shell profile.
pub struct ConfigureToolchain;

impl Operation for ConfigureToolchain {
    fn run(&self, params: &Params) -> Result<StepOutcome> {
        let sdk_root = path_param(params, param::SDK_ROOT)?;
        let env_file = path_param(params, param::ENVIRONMENT_FILE)?;
        write_file(&env_file, &render_env_file(&sdk_root), true)?;
        tracing::info!(path = %env_file.display(), "environment file written");

        let mut outcome = StepOutcome::ok().with_metadata(
            ENVIRONMENT_FILE_KEY,
            json!(env_file.display().to_string()),
        );
        if bool_param(params, param::UPDATE_SHELL_PROFILE, false) {
            let non_interactive = bool_param(params, param::NON_INTERACTIVE, false);
            match update_shell_profile(&env_file, non_interactive)? {
                Some(profile) => {
                    outcome = outcome
                        .with_metadata("shell_profile", json!(profile.display().to_string()));
                }
                None => tracing::info!("shell profile left unchanged"),
            }
        }
        Ok(outcome)
    }

    fn is_satisfied(&self, params: &Params) -> Option<bool> {
        let sdk_root = path_param(params, param::SDK_ROOT).ok()?;
        let env_file = path_param(params, param::ENVIRONMENT_FILE).ok()?;
        let current = fs::read_to_string(env_file).ok();
        Some(current.as_deref() == Some(render_env_file(&sdk_root).as_str()))
    }
}

/// POSIX shell snippet that puts the SDK toolchain on `PATH`.
pub fn render_env_file(sdk_root: &Path) -> String {
    let root = sdk_root.display().to_string();
    let bin = sdk_root.join("devkitsnes").join("bin").display().to_string();
    format!(
        "# PVSnesLib environment generated by snesdev; source it before running make.\n\
         export PVSNESLIB_HOME={root}\n\
         export PATH={bin}:\"$PATH\"\n",
        root = shell_words::quote(&root),
        bin = shell_words::quote(&bin),
    )
}

/// Append a `source` line for `env_file` to the user's shell profile.
///
/// Returns the profile path when it was changed.
fn update_shell_profile(env_file: &Path, non_interactive: bool) -> Result<Option<PathBuf>> {
    let profile = shell_profile_path()?;
    let quoted = shell_words::quote(&env_file.display().to_string()).into_owned();
    let line = format!("[ -f {quoted} ] && . {quoted} {PROFILE_MARKER}");

    let existing = fs::read_to_string(&profile).unwrap_or_default();
    if existing.lines().any(|current| current.trim() == line) {
        tracing::debug!(profile = %profile.display(), "profile already sources env file");
        return Ok(None);
    }
    if !non_interactive && !confirm(&format!("Add PVSnesLib to {}?", profile.display()))? {
        return Ok(None);
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&profile)
        .with_context(|| format!("open {}", profile.display()))?;
    let separator = if existing.is_empty() || existing.ends_with('\n') {
        ""
    } else {
        "\n"
    };
    writeln!(file, "{separator}{line}")
        .with_context(|| format!("write {}", profile.display()))?;
    tracing::info!(profile = %profile.display(), "shell profile updated");
    Ok(Some(profile))
}

/// `~/.zshrc` for zsh users, `~/.bashrc` otherwise.
fn shell_profile_path() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow!("cannot determine home directory"))?;
    let shell = std::env::var("SHELL").unwrap_or_default();
    let name = if shell.ends_with("zsh") {
        ".zshrc"
    } else {
        ".bashrc"
    };
    Ok(home.join(name))
}

/// Ask a yes/no question on the terminal; a closed or non-tty stdin is "no".
fn confirm(question: &str) -> Result<bool> {
    let stdin = io::stdin();
    if !stdin.is_terminal() {
        return Ok(false);
    }
    eprint!("{question} [y/N] ");
    io::stderr().flush().context("flush prompt")?;
    let mut answer = String::new();
    stdin.lock().read_line(&mut answer).context("read answer")?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes" | "Yes"))
}
