//! Workflow install step.
//!
//! Install resolves the request, takes the run lock for its target, and hands
//! the customized catalog to the orchestrator.
use super::SetupContext;
use crate::catalog::default_catalog;
use crate::cli::InstallArgs;
use crate::collaborators::default_registry;
use crate::config;
use crate::customize::{customize, unknown_override_names};
use crate::executor::StepExecutor;
use crate::orchestrator::Orchestrator;
use crate::provision::{write_report, RunLock, RunReport, RunRequest};
use anyhow::Result;

/// Translate install args plus resolved config into a run request.
pub fn build_request(args: &InstallArgs, ctx: &SetupContext) -> Result<RunRequest> {
    let project_parent =
        config::resolve_project_parent(args.project_dir.as_deref(), &ctx.config)?;
    let mut request = RunRequest::new(
        &ctx.project_name,
        ctx.paths.prefix().to_path_buf(),
        project_parent,
    );
    request.version = config::resolve_version(args.sdk_version.as_deref(), &ctx.config)?;
    request.download_url = config::resolve_download_url(&ctx.config);
    if args.offline {
        request.offline_source = args
            .offline_source
            .as_deref()
            .map(config::absolutize)
            .transpose()?;
    }
    request.force_reinstall = args.force;
    request.resume = args.resume;
    request.skip_ide = args.skip_ide;
    request.skip_ci = args.skip_ci;
    request.skip_project = args.skip_project;
    request.non_interactive = args.non_interactive;
    request.update_shell_profile = args.update_shell_profile;
    for param in &args.params {
        request
            .step_params
            .entry(param.step.clone())
            .or_default()
            .insert(param.key.clone(), param.value.clone());
    }
    Ok(request)
}

/// Run the install workflow and write `.snesdev/report.json`.
///
/// Only setup problems (bad config, held lock) are errors; a failed step is
/// reported through the returned report.
pub fn run_install(args: &InstallArgs) -> Result<RunReport> {
    let ctx = SetupContext::load(&args.target)?;
    let request = build_request(args, &ctx)?;
    let _lock = RunLock::acquire(&ctx.lock_path())?;

    let base = default_catalog();
    for name in unknown_override_names(&base, &request) {
        tracing::warn!(step = name, "ignoring --param for unknown step");
    }
    let catalog = customize(&base, &request);
    let store = ctx.store();
    let executor = StepExecutor::new(default_registry());
    let report = Orchestrator::new(&executor, &store)
        .with_history(ctx.paths.history_path())
        .run(&catalog, &request);

    if let Err(err) = write_report(&ctx.paths, &report) {
        tracing::warn!(error = %format!("{err:#}"), "could not write run report");
    }
    Ok(report)
}
