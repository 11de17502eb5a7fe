//! Core provisioning model and the durable pieces around it.
//!
//! This module owns schema versions, the persisted layout under the install
//! prefix, the run-state store, the run lock, and the append-only history so
//! the orchestrator never touches files directly.
/// Current schema version for `.snesdev/<key>.json`.
pub const STATE_SCHEMA_VERSION: u32 = 1;
/// Current schema version for `.snesdev/report.json`.
pub const REPORT_SCHEMA_VERSION: u32 = 1;
/// Current schema version for `.snesdev/history.jsonl`.
pub const HISTORY_SCHEMA_VERSION: u32 = 1;

mod history;
mod lock;
mod paths;
mod state;
mod types;

pub use history::{append_history, load_report, write_report};
pub use lock::{lock_holder, RunLock};
pub use paths::{state_key, SetupPaths};
pub use state::{FileStateStore, StateStore};
pub use types::*;
