//! Exclusive run lock colocated with the run-state record.
//!
//! The lock file holds the owner's pid. A lock whose owner no longer exists
//! is reclaimed; a live owner makes acquisition fail immediately.
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Held for the duration of a run; the lock file is removed on drop.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    /// Acquire the lock at `path`, failing fast if another live run holds it.
    pub fn acquire(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        for _ in 0..2 {
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(path)
            {
                Ok(mut file) => {
                    writeln!(file, "{}", std::process::id())
                        .with_context(|| format!("write {}", path.display()))?;
                    tracing::debug!(lock = %path.display(), "run lock acquired");
                    return Ok(Self {
                        path: path.to_path_buf(),
                    });
                }
                Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                    if let Some(pid) = read_pid(path).filter(|pid| process_alive(*pid)) {
                        return Err(anyhow!(
                            "another run in progress (pid {pid}, lock {})",
                            path.display()
                        ));
                    }
                    tracing::warn!(lock = %path.display(), "reclaiming stale run lock");
                    match fs::remove_file(path) {
                        Ok(()) => {}
                        Err(err) if err.kind() == ErrorKind::NotFound => {}
                        Err(err) => {
                            return Err(err)
                                .with_context(|| format!("remove stale {}", path.display()))
                        }
                    }
                }
                Err(err) => {
                    return Err(err).with_context(|| format!("create {}", path.display()));
                }
            }
        }
        Err(anyhow!("could not acquire run lock {}", path.display()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Return the pid of a live lock holder, if any.
pub fn lock_holder(path: &Path) -> Option<u32> {
    read_pid(path).filter(|pid| process_alive(*pid))
}

fn read_pid(path: &Path) -> Option<u32> {
    let text = fs::read_to_string(path).ok()?;
    text.trim().parse().ok()
}

#[cfg(unix)]
fn process_alive(pid: u32) -> bool {
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    if pid <= 0 {
        return false;
    }
    // SAFETY: signal 0 only checks that the process exists.
    let rc = unsafe { libc::kill(pid, 0) };
    if rc == 0 {
        return true;
    }
    std::io::Error::last_os_error().raw_os_error() != Some(libc::ESRCH)
}

#[cfg(not(unix))]
fn process_alive(_pid: u32) -> bool {
    true
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
