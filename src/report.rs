//! Human-readable rendering of a run report.
//!
//! Rendering is a pure function of the report. Successful runs get ordered
//! next steps; failed runs get troubleshooting with required failures first.
use crate::provision::{OperationRef, RunReport, StepRecord, StepStatus};
use std::fmt::Write;

/// Render the full text report.
pub fn render(report: &RunReport) -> String {
    let mut out = String::new();
    let headline = if report.success {
        "environment ready"
    } else {
        "setup incomplete"
    };
    let _ = writeln!(
        out,
        "snesdev: {headline} ({}/{} steps done)",
        report.completed_count, report.total_count
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "Steps:");
    let width = report
        .steps
        .iter()
        .map(|step| step.name.len())
        .max()
        .unwrap_or(0);
    for step in &report.steps {
        let _ = writeln!(
            out,
            "  {:<10} {:<width$}  {}",
            status_label(step.status),
            step.name,
            step_detail(step),
        );
    }

    if report.success {
        let warnings: Vec<&StepRecord> = report.failed_steps().collect();
        if !warnings.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "Warnings (non-fatal):");
            for step in warnings {
                let _ = writeln!(out, "  - {}: {}", step.name, error_text(step));
                let _ = writeln!(out, "    hint: {}", troubleshooting_hint(step.operation));
            }
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "Next steps:");
        for (index, line) in next_steps(report).iter().enumerate() {
            let _ = writeln!(out, "  {}. {line}", index + 1);
        }
    } else {
        let _ = writeln!(out);
        let _ = writeln!(out, "Troubleshooting:");
        let failures = ordered_failures(report);
        for (index, step) in failures.iter().enumerate() {
            let kind = if step.required { "required" } else { "optional" };
            let _ = writeln!(
                out,
                "  {}. {} ({kind}) failed: {}",
                index + 1,
                step.name,
                error_text(step)
            );
            let _ = writeln!(out, "     hint: {}", troubleshooting_hint(step.operation));
        }
        let _ = writeln!(
            out,
            "  {}. Fix the problem above, then resume where the run stopped:",
            failures.len() + 1
        );
        let _ = writeln!(out, "     {}", resume_command(report));
    }
    out
}

/// Ordered guidance for a successful run.
pub fn next_steps(report: &RunReport) -> Vec<String> {
    let mut steps = Vec::new();
    match report.environment_file.as_deref() {
        Some(env_file) => steps.push(format!(
            "Load the toolchain environment: source {}",
            shell_words::quote(env_file)
        )),
        None => steps.push(format!(
            "Export PVSNESLIB_HOME={}/pvsneslib before building",
            report.install_prefix
        )),
    }
    let project_ready = report
        .step(OperationRef::CreateProject)
        .is_some_and(|step| step.status.is_done());
    if project_ready {
        steps.push(format!(
            "Build the starter ROM: cd {} && make",
            shell_words::quote(&report.project_dir)
        ));
        steps.push(format!(
            "Run {}.sfc in a SNES emulator such as bsnes, Mesen or snes9x",
            report.project_name
        ));
    } else {
        steps.push(format!(
            "Start from an SDK example: cp -r {}/pvsneslib/snes-examples/hello_world {}",
            report.install_prefix,
            shell_words::quote(&report.project_dir)
        ));
    }
    let ide_ready = report
        .step(OperationRef::IntegrateIde)
        .is_some_and(|step| step.status.is_done());
    if ide_ready {
        steps.push(format!(
            "Open {} in VS Code; the default build task runs make",
            report.project_dir
        ));
    }
    steps
}

/// Failed steps with required failures ahead of optional ones, each group in
/// catalog order.
pub fn ordered_failures(report: &RunReport) -> Vec<&StepRecord> {
    let (mut required, optional): (Vec<&StepRecord>, Vec<&StepRecord>) =
        report.failed_steps().partition(|step| step.required);
    required.extend(optional);
    required
}

/// The `install` invocation that resumes this target.
pub fn resume_command(report: &RunReport) -> String {
    format!(
        "snesdev install --resume --prefix {} --project {}",
        shell_words::quote(&report.install_prefix),
        shell_words::quote(&report.project_name)
    )
}

fn status_label(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Completed => "[done]",
        StepStatus::Skipped => "[skipped]",
        StepStatus::Failed => "[failed]",
        StepStatus::Running => "[running]",
        StepStatus::Pending => "[not run]",
    }
}

fn step_detail(step: &StepRecord) -> String {
    let mut detail = step.description.clone();
    if !step.required {
        detail.push_str(" (optional)");
    }
    if let Some(reason) = step.skip_reason {
        detail.push_str(&format!(" ({})", reason.as_str()));
    }
    detail
}

fn error_text(step: &StepRecord) -> &str {
    step.error_message.as_deref().unwrap_or("no error message captured")
}

fn troubleshooting_hint(operation: OperationRef) -> &'static str {
    match operation {
        OperationRef::CheckHost => {
            "install the missing tools with your package manager (e.g. `apt install make unzip`)"
        }
        OperationRef::InstallSdk => {
            "check network access to the release URL, or pass --offline --offline-source <archive|dir>"
        }
        OperationRef::ValidateInstall => {
            "the SDK tree is incomplete; re-run with --force to reinstall it"
        }
        OperationRef::ConfigureToolchain => {
            "make sure the install prefix is writable and your shell profile exists"
        }
        OperationRef::IntegrateIde => {
            "the project directory must be writable; use --skip-ide or --skip-ci to leave it out"
        }
        OperationRef::CreateProject => {
            "the project directory must be writable; use --skip-project to leave it out"
        }
    }
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
