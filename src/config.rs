//! User configuration and setting resolution.
//!
//! Every setting resolves as: explicit flag, then environment variable, then
//! the user config file, then the built-in default.
use anyhow::{anyhow, Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Current schema version for `config.json`.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;
/// Latest PVSnesLib release known to work with the starter project.
pub const DEFAULT_SDK_VERSION: &str = "4.3.0";
/// Starter project name when none is given.
pub const DEFAULT_PROJECT_NAME: &str = "hello_world";
/// Release archive location; `{version}` and `{platform}` are substituted.
pub const DEFAULT_DOWNLOAD_URL: &str =
    "https://github.com/alekmaul/pvsneslib/releases/download/{version}/pvsneslib_{version}_64b_{platform}_release.zip";

pub const PREFIX_ENV: &str = "SNESDEV_PREFIX";
pub const VERSION_ENV: &str = "SNESDEV_VERSION";
pub const CONFIG_ENV: &str = "SNESDEV_CONFIG";
pub const LOG_ENV: &str = "SNESDEV_LOG";

/// Optional defaults stored in `<config_dir>/snesdev/config.json`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct UserConfig {
    pub schema_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_prefix: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_dir: Option<PathBuf>,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            schema_version: CONFIG_SCHEMA_VERSION,
            install_prefix: None,
            version: None,
            download_url: None,
            project_dir: None,
        }
    }
}

/// Locate the config file: explicit path, `SNESDEV_CONFIG`, then the
/// platform config directory.
pub fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = env::var_os(CONFIG_ENV).filter(|value| !value.is_empty()) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("snesdev").join("config.json"))
}

/// Load and validate the user config.
///
/// An explicitly named file must exist; the default location may be absent.
pub fn load_user_config(explicit: Option<&Path>) -> Result<UserConfig> {
    let Some(path) = config_path(explicit) else {
        return Ok(UserConfig::default());
    };
    if !path.is_file() {
        if explicit.is_some() {
            return Err(anyhow!("config file {} not found", path.display()));
        }
        return Ok(UserConfig::default());
    }
    let bytes = fs::read(&path).with_context(|| format!("read config {}", path.display()))?;
    let config: UserConfig = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse config JSON {}", path.display()))?;
    validate_config(&config)?;
    tracing::debug!(path = %path.display(), "loaded user config");
    Ok(config)
}

/// Validate config schema and user-provided values.
pub fn validate_config(config: &UserConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!("unsupported config schema_version {}", config.schema_version));
    }
    if let Some(version) = config.version.as_deref() {
        validate_version(version)?;
    }
    if let Some(url) = config.download_url.as_deref() {
        validate_download_url(url)?;
    }
    Ok(())
}

/// Version pins look like `4.3.0` or `4.3`.
pub fn validate_version(version: &str) -> Result<()> {
    let pattern = Regex::new(r"^\d+\.\d+(\.\d+)?$").expect("regex for version pins");
    if !pattern.is_match(version) {
        return Err(anyhow!("version must look like 4.3.0 (got {version:?})"));
    }
    Ok(())
}

/// Project names become directory and ROM names.
pub fn validate_project_name(name: &str) -> Result<()> {
    let pattern = Regex::new(r"^[A-Za-z][A-Za-z0-9_-]*$").expect("regex for project names");
    if !pattern.is_match(name) {
        return Err(anyhow!(
            "project name must start with a letter and use only letters, digits, '_' or '-' (got {name:?})"
        ));
    }
    Ok(())
}

pub fn validate_download_url(url: &str) -> Result<()> {
    if !url.contains("{version}") {
        return Err(anyhow!("download_url must contain a {{version}} placeholder (got {url:?})"));
    }
    Ok(())
}

/// Resolve the install prefix, defaulting to `<home>/.pvsneslib`.
pub fn resolve_prefix(explicit: Option<&Path>, config: &UserConfig) -> Result<PathBuf> {
    let prefix = explicit
        .map(Path::to_path_buf)
        .or_else(|| env_path(PREFIX_ENV))
        .or_else(|| config.install_prefix.clone());
    if let Some(prefix) = prefix {
        return absolutize(&prefix);
    }
    let home = dirs::home_dir().ok_or_else(|| anyhow!("cannot determine home directory"))?;
    Ok(home.join(".pvsneslib"))
}

/// Resolve the SDK version pin.
pub fn resolve_version(explicit: Option<&str>, config: &UserConfig) -> Result<String> {
    let version = explicit
        .map(str::to_string)
        .or_else(|| env::var(VERSION_ENV).ok().filter(|value| !value.is_empty()))
        .or_else(|| config.version.clone())
        .unwrap_or_else(|| DEFAULT_SDK_VERSION.to_string());
    validate_version(&version)?;
    Ok(version)
}

/// Resolve the directory that receives the starter project.
pub fn resolve_project_parent(explicit: Option<&Path>, config: &UserConfig) -> Result<PathBuf> {
    match explicit.map(Path::to_path_buf).or_else(|| config.project_dir.clone()) {
        Some(dir) => absolutize(&dir),
        None => env::current_dir().context("resolve current directory"),
    }
}

pub fn resolve_download_url(config: &UserConfig) -> String {
    config
        .download_url
        .clone()
        .unwrap_or_else(|| DEFAULT_DOWNLOAD_URL.to_string())
}

fn env_path(name: &str) -> Option<PathBuf> {
    env::var_os(name)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Make `path` absolute without requiring it to exist, expanding `~/`.
pub fn absolutize(path: &Path) -> Result<PathBuf> {
    if let Ok(rest) = path.strip_prefix("~") {
        let home = dirs::home_dir().ok_or_else(|| anyhow!("cannot determine home directory"))?;
        return Ok(home.join(rest));
    }
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = env::current_dir().context("resolve current directory")?;
    Ok(cwd.join(path))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
