//! Typed paths into the install-prefix layout.
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Directory under the prefix that holds resume bookkeeping.
const STATE_DIR: &str = ".snesdev";

/// Convenience wrapper for locating artifacts under an install prefix.
#[derive(Debug, Clone)]
pub struct SetupPaths {
    prefix: PathBuf,
}

impl SetupPaths {
    pub fn new(prefix: PathBuf) -> Self {
        Self { prefix }
    }

    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    /// Return the SDK root (`PVSNESLIB_HOME`).
    pub fn sdk_root(&self) -> PathBuf {
        self.prefix.join("pvsneslib")
    }

    /// Return the installed-version marker inside the SDK root.
    pub fn version_marker_path(&self) -> PathBuf {
        self.sdk_root().join(".snesdev-version")
    }

    /// Return the `env.sh` path written by toolchain configuration.
    pub fn env_file_path(&self) -> PathBuf {
        self.prefix.join("env.sh")
    }

    /// Return the `.snesdev/` directory path.
    pub fn state_dir(&self) -> PathBuf {
        self.prefix.join(STATE_DIR)
    }

    /// Return the `.snesdev/<key>.json` run-state path.
    pub fn state_path(&self, key: &str) -> PathBuf {
        self.state_dir().join(format!("{key}.json"))
    }

    /// Return the `.snesdev/<key>.lock` path.
    pub fn lock_path(&self, key: &str) -> PathBuf {
        self.state_dir().join(format!("{key}.lock"))
    }

    /// Return the `.snesdev/history.jsonl` path.
    pub fn history_path(&self) -> PathBuf {
        self.state_dir().join("history.jsonl")
    }

    /// Return the `.snesdev/report.json` path.
    pub fn report_path(&self) -> PathBuf {
        self.state_dir().join("report.json")
    }
}

/// Derive the run-state key for an install target.
///
/// Same prefix and project always map to the same key; the readable project
/// prefix is only for humans browsing `.snesdev/`.
pub fn state_key(install_prefix: &Path, project_name: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(install_prefix.to_string_lossy().as_bytes());
    hasher.update(b"\0");
    hasher.update(project_name.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    let readable: String = project_name
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect();
    format!("{readable}-{}", &digest[..16])
}
