//! Command handlers for the provisioning workflow.
//!
//! Each handler resolves its target through `SetupContext`, does one job, and
//! leaves rendering choices (text or JSON) to its own args.
mod context;
mod install;
mod reset;
mod status;
mod steps;

pub use context::SetupContext;
pub use install::{build_request, run_install};
pub use reset::run_reset;
pub use status::{run_status, status_summary, StatusSummary};
pub use steps::run_steps;
