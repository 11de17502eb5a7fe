//! CLI argument parsing for the provisioning workflow.
//!
//! The CLI stays thin: it collects options into typed args and leaves every
//! decision about what to run to the workflow handlers.
use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;

/// Root CLI entrypoint for provisioning.
#[derive(Parser, Debug)]
#[command(
    name = "snesdev",
    version,
    about = "Set up a PVSnesLib SNES development environment, resumably",
    after_help = "Commands:\n  install  Install the SDK, configure the toolchain and create a starter project\n  status   Show saved progress and the last run report\n  reset    Forget saved progress for a target\n  steps    List the provisioning steps\n\nExamples:\n  snesdev install\n  snesdev install --project space_game --skip-ci\n  snesdev install --offline --offline-source ~/Downloads/pvsneslib_4.3.0.zip\n  snesdev install --resume\n  snesdev status --json",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    /// Emit debug logging (overridden by SNESDEV_LOG)
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    Install(InstallArgs),
    Status(StatusArgs),
    Reset(ResetArgs),
    Steps(StepsArgs),
}

/// Options naming one install target (prefix plus project).
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Install prefix that receives the SDK, env.sh and run state
    #[arg(long, value_name = "DIR")]
    pub prefix: Option<PathBuf>,

    /// Starter project name
    #[arg(long, value_name = "NAME")]
    pub project: Option<String>,

    /// Config file (defaults to SNESDEV_CONFIG or the user config dir)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Install command inputs.
#[derive(Parser, Debug)]
#[command(about = "Provision the SDK, toolchain environment and starter project")]
pub struct InstallArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Directory that receives the starter project (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub project_dir: Option<PathBuf>,

    /// PVSnesLib release to install
    #[arg(long = "version", value_name = "VERSION")]
    pub sdk_version: Option<String>,

    /// Install from a local archive or directory instead of downloading
    #[arg(long, requires = "offline_source")]
    pub offline: bool,

    /// Local SDK archive (.zip, .tar.*) or unpacked directory
    #[arg(long, value_name = "PATH", requires = "offline")]
    pub offline_source: Option<PathBuf>,

    /// Ignore saved progress and probes; reinstall and overwrite everything
    #[arg(long, conflicts_with = "resume")]
    pub force: bool,

    /// Continue a previous run (saved progress is honoured either way)
    #[arg(long)]
    pub resume: bool,

    /// Do not write VS Code integration files
    #[arg(long)]
    pub skip_ide: bool,

    /// Do not write the CI workflow
    #[arg(long)]
    pub skip_ci: bool,

    /// Do not create the starter project
    #[arg(long)]
    pub skip_project: bool,

    /// Never prompt; assume the answer given by flags
    #[arg(long)]
    pub non_interactive: bool,

    /// Source env.sh from your shell profile
    #[arg(long)]
    pub update_shell_profile: bool,

    /// Per-step parameter override (repeatable)
    #[arg(long = "param", value_name = "STEP.KEY=VALUE", value_parser = parse_step_param)]
    pub params: Vec<StepParam>,

    /// Emit the run report as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

/// Status command inputs.
#[derive(Parser, Debug)]
#[command(about = "Show saved progress and the last run report")]
pub struct StatusArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

/// Reset command inputs.
#[derive(Parser, Debug)]
#[command(about = "Forget saved progress so the next install starts fresh")]
pub struct ResetArgs {
    #[command(flatten)]
    pub target: TargetArgs,
}

/// Steps command inputs.
#[derive(Parser, Debug)]
#[command(about = "List the provisioning steps an install would run, in order")]
pub struct StepsArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Leave out VS Code integration files
    #[arg(long)]
    pub skip_ide: bool,

    /// Leave out the CI workflow
    #[arg(long)]
    pub skip_ci: bool,

    /// Leave out the starter project
    #[arg(long)]
    pub skip_project: bool,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

/// One `--param STEP.KEY=VALUE` override.
#[derive(Debug, Clone, PartialEq)]
pub struct StepParam {
    pub step: String,
    pub key: String,
    pub value: Value,
}

/// Parse `STEP.KEY=VALUE`; the value is JSON when it parses, else a string.
pub fn parse_step_param(raw: &str) -> Result<StepParam> {
    let (target, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected STEP.KEY=VALUE, got {raw:?}"))?;
    let (step, key) = target
        .split_once('.')
        .filter(|(step, key)| !step.is_empty() && !key.is_empty())
        .ok_or_else(|| anyhow!("expected STEP.KEY before '=', got {target:?}"))?;
    let value =
        serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok(StepParam {
        step: step.to_string(),
        key: key.to_string(),
        value,
    })
}
