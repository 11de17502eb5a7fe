//! Shared target resolution for workflow commands.
use crate::cli::TargetArgs;
use crate::config::{self, UserConfig, DEFAULT_PROJECT_NAME};
use crate::provision::{state_key, FileStateStore, SetupPaths};
use anyhow::Result;
use std::path::PathBuf;

/// Resolved install target: config, prefix layout, project and state key.
#[derive(Debug, Clone)]
pub struct SetupContext {
    pub config: UserConfig,
    pub paths: SetupPaths,
    pub project_name: String,
    pub key: String,
}

impl SetupContext {
    /// Resolve the target from CLI args, environment and user config.
    pub fn load(target: &TargetArgs) -> Result<Self> {
        let config = config::load_user_config(target.config.as_deref())?;
        let prefix = config::resolve_prefix(target.prefix.as_deref(), &config)?;
        let project_name = target
            .project
            .clone()
            .unwrap_or_else(|| DEFAULT_PROJECT_NAME.to_string());
        config::validate_project_name(&project_name)?;
        let key = state_key(&prefix, &project_name);
        Ok(Self {
            config,
            paths: SetupPaths::new(prefix),
            project_name,
            key,
        })
    }

    pub fn store(&self) -> FileStateStore {
        FileStateStore::new(self.paths.state_dir())
    }

    pub fn lock_path(&self) -> PathBuf {
        self.paths.lock_path(&self.key)
    }
}
