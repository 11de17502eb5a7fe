//! Workflow status step.
//!
//! Status reads saved progress, the SDK marker and the last report without
//! changing anything under the prefix.
use super::SetupContext;
use crate::catalog::default_catalog;
use crate::cli::StatusArgs;
use crate::provision::{load_report, lock_holder, RunStatus, StateStore};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;

/// Snapshot of one install target.
#[derive(Debug, Serialize)]
pub struct StatusSummary {
    pub install_prefix: String,
    pub project_name: String,
    pub state_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installed_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment_file: Option<String>,
    pub completed_steps: Vec<String>,
    pub pending_steps: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_holder: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_run: Option<LastRun>,
}

/// Outcome of the most recent run recorded in `report.json`.
#[derive(Debug, Serialize)]
pub struct LastRun {
    pub status: RunStatus,
    pub success: bool,
    pub completed_count: usize,
    pub total_count: usize,
    pub finished_at: DateTime<Utc>,
}

/// Build the status summary for a target without side effects.
pub fn status_summary(ctx: &SetupContext) -> Result<StatusSummary> {
    let state = ctx.store().load(&ctx.key)?;
    let completed: Vec<String> = state
        .as_ref()
        .map(|state| state.completed_step_names.iter().cloned().collect())
        .unwrap_or_default();
    let pending = default_catalog()
        .steps()
        .iter()
        .filter(|step| !completed.contains(&step.name))
        .map(|step| step.name.clone())
        .collect();

    let installed_version = fs::read_to_string(ctx.paths.version_marker_path())
        .ok()
        .map(|text| text.trim().to_string());
    let env_file = ctx.paths.env_file_path();
    let environment_file = state
        .as_ref()
        .and_then(|state| state.environment_file_path.clone())
        .or_else(|| env_file.is_file().then(|| env_file.display().to_string()));
    let last_run = match load_report(&ctx.paths) {
        Ok(report) => report
            .filter(|report| report.project_name == ctx.project_name)
            .map(|report| LastRun {
                status: report.status,
                success: report.success,
                completed_count: report.completed_count,
                total_count: report.total_count,
                finished_at: report.finished_at,
            }),
        Err(err) => {
            tracing::warn!(error = %format!("{err:#}"), "could not read last run report");
            None
        }
    };

    Ok(StatusSummary {
        install_prefix: ctx.paths.prefix().display().to_string(),
        project_name: ctx.project_name.clone(),
        state_key: ctx.key.clone(),
        installed_version,
        environment_file,
        completed_steps: completed,
        pending_steps: pending,
        last_updated: state.and_then(|state| state.last_updated),
        lock_holder: lock_holder(&ctx.lock_path()),
        last_run,
    })
}

/// Print the status of the target as text or JSON.
pub fn run_status(args: &StatusArgs) -> Result<()> {
    let ctx = SetupContext::load(&args.target)?;
    let summary = status_summary(&ctx)?;
    if args.json {
        let text = serde_json::to_string_pretty(&summary)?;
        println!("{text}");
        return Ok(());
    }

    println!(
        "snesdev status: {} at {}",
        summary.project_name, summary.install_prefix
    );
    match summary.installed_version.as_deref() {
        Some(version) => println!("  SDK:            PVSnesLib {version}"),
        None => println!("  SDK:            not installed"),
    }
    if let Some(env_file) = summary.environment_file.as_deref() {
        println!("  Environment:    {env_file}");
    }
    if summary.completed_steps.is_empty() {
        println!("  Saved progress: none");
    } else {
        println!(
            "  Saved progress: {} done ({})",
            summary.completed_steps.len(),
            summary.completed_steps.join(", ")
        );
        if let Some(next) = summary.pending_steps.first() {
            println!("  Next step:      {next} (snesdev install --resume)");
        }
    }
    if let Some(run) = summary.last_run.as_ref() {
        println!(
            "  Last run:       {} ({}/{} steps) at {}",
            run.status,
            run.completed_count,
            run.total_count,
            run.finished_at.to_rfc3339()
        );
    }
    if let Some(pid) = summary.lock_holder {
        println!("  Lock:           held by pid {pid}");
    }
    Ok(())
}
