//! Workflow steps listing.
use super::SetupContext;
use crate::catalog::default_catalog;
use crate::cli::StepsArgs;
use crate::config;
use crate::customize::customize;
use crate::provision::RunRequest;
use anyhow::Result;

/// Print the catalog an install with the same flags would run.
pub fn run_steps(args: &StepsArgs) -> Result<()> {
    let ctx = SetupContext::load(&args.target)?;
    let mut request = RunRequest::new(
        &ctx.project_name,
        ctx.paths.prefix().to_path_buf(),
        config::resolve_project_parent(None, &ctx.config)?,
    );
    request.version = config::resolve_version(None, &ctx.config)?;
    request.download_url = config::resolve_download_url(&ctx.config);
    request.skip_ide = args.skip_ide;
    request.skip_ci = args.skip_ci;
    request.skip_project = args.skip_project;
    let catalog = customize(&default_catalog(), &request);

    if args.json {
        let text = serde_json::to_string_pretty(catalog.steps())?;
        println!("{text}");
        return Ok(());
    }
    let width = catalog
        .steps()
        .iter()
        .map(|step| step.name.len())
        .max()
        .unwrap_or(0);
    for (index, step) in catalog.steps().iter().enumerate() {
        let kind = if step.required { "required" } else { "optional" };
        println!(
            "{}. {:<width$}  {} ({kind})",
            index + 1,
            step.name,
            step.description
        );
    }
    Ok(())
}
