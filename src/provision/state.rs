//! Run-state persistence.
//!
//! A record is written after every successful step and removed when a run
//! fully succeeds. Unreadable records load as "no progress" so a damaged file
//! costs re-execution, never a crash.
use super::RunState;
use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Durable key-value store for run progress.
pub trait StateStore {
    /// Load the record for `key`; `None` when absent or unreadable.
    fn load(&self, key: &str) -> Result<Option<RunState>>;
    /// Overwrite the record for `key`.
    fn save(&self, key: &str, state: &RunState) -> Result<()>;
    /// Remove the record for `key`; a missing record is not an error.
    fn clear(&self, key: &str) -> Result<()>;
}

/// JSON-file store rooted at `<prefix>/.snesdev`.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    dir: PathBuf,
}

impl FileStateStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StateStore for FileStateStore {
    fn load(&self, key: &str) -> Result<Option<RunState>> {
        let path = self.path_for(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "run state unreadable; starting without prior progress"
                );
                return Ok(None);
            }
        };
        match serde_json::from_slice::<RunState>(&bytes) {
            Ok(state) => Ok(Some(state)),
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "run state corrupt; starting without prior progress"
                );
                Ok(None)
            }
        }
    }

    fn save(&self, key: &str, state: &RunState) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("create {}", self.dir.display()))?;
        let path = self.path_for(key);
        let tmp_path = self.dir.join(format!(".{key}.json.tmp"));
        let text = serde_json::to_string_pretty(state).context("serialize run state")?;
        fs::write(&tmp_path, text.as_bytes())
            .with_context(|| format!("write {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &path).with_context(|| format!("publish {}", path.display()))?;
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| format!("remove {}", path.display())),
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
