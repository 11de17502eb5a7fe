use super::{opt_str_param, str_list_param};
use crate::catalog::param;
use crate::executor::Operation;
use crate::provision::{Params, StepOutcome};
use anyhow::Result;
use serde_json::json;
use std::env::consts;

/// Host operating systems with a PVSnesLib release this tool can unpack.
const SUPPORTED_OS: [&str; 2] = ["linux", "macos"];

/// Confirms the host OS is supported and the build tools are on `PATH`.
pub struct CheckHost;

impl Operation for CheckHost {
    fn run(&self, params: &Params) -> Result<StepOutcome> {
        if !SUPPORTED_OS.contains(&consts::OS) {
            return Ok(StepOutcome::failed(format!(
                "unsupported host OS {}; use the PVSnesLib Windows installer there",
                consts::OS
            )));
        }

        let mut tools = str_list_param(params, param::REQUIRED_TOOLS);
        if let Some(tool) = opt_str_param(params, param::ARCHIVE_TOOL) {
            tools.push(tool.to_string());
        }
        let missing: Vec<&str> = tools
            .iter()
            .map(String::as_str)
            .filter(|tool| which::which(tool).is_err())
            .collect();
        if !missing.is_empty() {
            return Ok(StepOutcome::failed(format!(
                "required tools not found on PATH: {}",
                missing.join(", ")
            )));
        }
        tracing::debug!(os = consts::OS, arch = consts::ARCH, tools = ?tools, "host ok");
        Ok(StepOutcome::ok()
            .with_metadata("host_os", json!(consts::OS))
            .with_metadata("host_arch", json!(consts::ARCH)))
    }
}
