//! Workflow reset step.
use super::SetupContext;
use crate::cli::ResetArgs;
use crate::provision::{lock_holder, StateStore};
use anyhow::{anyhow, Result};

/// Forget saved progress for the target. Installed files are left alone.
pub fn run_reset(args: &ResetArgs) -> Result<()> {
    let ctx = SetupContext::load(&args.target)?;
    if let Some(pid) = lock_holder(&ctx.lock_path()) {
        return Err(anyhow!(
            "another run in progress (pid {pid}, lock {}); not resetting",
            ctx.lock_path().display()
        ));
    }
    ctx.store().clear(&ctx.key)?;
    println!(
        "cleared saved progress for {} at {}",
        ctx.project_name,
        ctx.paths.prefix().display()
    );
    Ok(())
}
