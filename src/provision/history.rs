//! Run history and report snapshots.
//!
//! History is append-only JSONL; the report is the snapshot of the most
//! recent run for a prefix.
use super::{HistoryEntry, RunReport, SetupPaths};
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Append a history entry as JSONL.
pub fn append_history(path: &Path, entry: &HistoryEntry) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("create state dir")?;
    }
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open {}", path.display()))?;
    let line = serde_json::to_string(entry).context("serialize history entry")?;
    file.write_all(line.as_bytes())
        .with_context(|| format!("write {}", path.display()))?;
    file.write_all(b"\n")
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Write the latest run report snapshot.
pub fn write_report(paths: &SetupPaths, report: &RunReport) -> Result<()> {
    let path = paths.report_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("create state dir")?;
    }
    let text = serde_json::to_string_pretty(report).context("serialize run report")?;
    fs::write(&path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Load the latest run report snapshot, if one was written.
pub fn load_report(paths: &SetupPaths) -> Result<Option<RunReport>> {
    let path = paths.report_path();
    if !path.is_file() {
        return Ok(None);
    }
    let bytes = fs::read(&path).with_context(|| format!("read {}", path.display()))?;
    let report = serde_json::from_slice(&bytes).context("parse run report JSON")?;
    Ok(Some(report))
}
