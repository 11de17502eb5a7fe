use super::{bool_param, opt_str_param, path_param, str_param};
use crate::catalog::param;
use crate::executor::Operation;
use crate::provision::{Params, StepOutcome};
use anyhow::{anyhow, Context, Result};
use serde_json::json;
use std::env::consts;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

/// File inside the SDK root recording which release was installed.
pub const VERSION_MARKER: &str = ".snesdev-version";
const TOOLCHAIN_DIR: &str = "devkitsnes";

/// Installs the SDK into `<prefix>/pvsneslib` from a download, a local
/// archive, or an unpacked directory.
///
/// Everything is unpacked into a staging directory under the prefix first and
/// moved into place only once the SDK tree has been located, so an interrupted
/// install never leaves a half-populated SDK root behind. An existing tree is
/// kept until its replacement is ready, and one without a version marker is
/// only replaced when overwriting.
pub struct InstallSdk;

impl Operation for InstallSdk {
    fn run(&self, params: &Params) -> Result<StepOutcome> {
        let sdk_root = path_param(params, param::SDK_ROOT)?;
        let version = str_param(params, param::VERSION)?;
        let overwrite = bool_param(params, param::OVERWRITE, false);

        if sdk_root.exists() && !overwrite {
            match installed_version(&sdk_root) {
                Some(installed_as) if installed_as == version => {
                    tracing::info!(root = %sdk_root.display(), version, "SDK already installed");
                    return Ok(installed(&sdk_root, version));
                }
                Some(_) => {}
                None => {
                    return Ok(StepOutcome::failed(format!(
                        "{} holds an SDK snesdev did not install; use --force to replace it",
                        sdk_root.display()
                    )));
                }
            }
        }
        let prefix = sdk_root
            .parent()
            .ok_or_else(|| anyhow!("SDK root {} has no parent", sdk_root.display()))?;
        fs::create_dir_all(prefix).with_context(|| format!("create {}", prefix.display()))?;

        let staging = tempfile::Builder::new()
            .prefix(".sdk-staging-")
            .tempdir_in(prefix)
            .with_context(|| format!("create staging dir in {}", prefix.display()))?;
        let unpacked = staging.path().join("unpacked");
        let tool = opt_str_param(params, param::ARCHIVE_TOOL);

        match opt_str_param(params, param::OFFLINE_SOURCE).map(PathBuf::from) {
            Some(source) if source.is_dir() => {
                tracing::info!(source = %source.display(), "copying SDK from directory");
                copy_dir(&source, &unpacked)?;
            }
            Some(source) if source.is_file() => {
                tracing::info!(source = %source.display(), "unpacking SDK archive");
                if let Err(err) = extract(&source, &unpacked, tool) {
                    return Ok(StepOutcome::failed(format!("{err:#}")));
                }
            }
            Some(source) => {
                return Ok(StepOutcome::failed(format!(
                    "offline source {} does not exist",
                    source.display()
                )));
            }
            None => {
                let template = str_param(params, param::DOWNLOAD_URL)?;
                let url = render_download_url(template, version, host_platform());
                let archive = staging.path().join("pvsneslib.zip");
                if let Err(err) = download(&url, &archive) {
                    return Ok(StepOutcome::failed(format!("{err:#}")));
                }
                if let Err(err) = extract(&archive, &unpacked, tool) {
                    return Ok(StepOutcome::failed(format!("{err:#}")));
                }
            }
        }

        let Some(found) = find_sdk_tree(&unpacked) else {
            return Ok(StepOutcome::failed(format!(
                "no {TOOLCHAIN_DIR}/ directory found in the SDK source"
            )));
        };
        replace_tree(&found, &sdk_root, staging.path())?;
        fs::write(sdk_root.join(VERSION_MARKER), format!("{version}\n"))
            .with_context(|| format!("write version marker in {}", sdk_root.display()))?;
        tracing::info!(root = %sdk_root.display(), version, "SDK installed");
        Ok(installed(&sdk_root, version))
    }

    fn is_satisfied(&self, params: &Params) -> Option<bool> {
        let sdk_root = path_param(params, param::SDK_ROOT).ok()?;
        let version = str_param(params, param::VERSION).ok()?;
        Some(installed_version(&sdk_root).as_deref() == Some(version))
    }
}

/// Substitute `{version}` and `{platform}` in a release URL template.
pub fn render_download_url(template: &str, version: &str, platform: &str) -> String {
    template
        .replace("{version}", version)
        .replace("{platform}", platform)
}

/// Platform label used in PVSnesLib release archive names.
fn host_platform() -> &'static str {
    match consts::OS {
        "macos" => "darwin",
        other => other,
    }
}

fn installed(sdk_root: &Path, version: &str) -> StepOutcome {
    StepOutcome::ok()
        .with_metadata("sdk_root", json!(sdk_root.display().to_string()))
        .with_metadata("sdk_version", json!(version))
}

fn installed_version(sdk_root: &Path) -> Option<String> {
    fs::read_to_string(sdk_root.join(VERSION_MARKER))
        .ok()
        .map(|text| text.trim().to_string())
}

fn download(url: &str, dest: &Path) -> Result<()> {
    tracing::info!(url, "downloading SDK archive");
    let response = ureq::get(url)
        .call()
        .with_context(|| format!("download {url}"))?;
    let mut reader = response.into_body().into_reader();
    let mut file =
        fs::File::create(dest).with_context(|| format!("create {}", dest.display()))?;
    let bytes = io::copy(&mut reader, &mut file).with_context(|| format!("read {url}"))?;
    tracing::debug!(bytes, "download finished");
    Ok(())
}

/// Unpack `archive` into `dest` with `unzip` or `tar`, chosen by the
/// customizer or guessed from the file name.
fn extract(archive: &Path, dest: &Path, tool: Option<&str>) -> Result<()> {
    fs::create_dir_all(dest).with_context(|| format!("create {}", dest.display()))?;
    let name = archive
        .file_name()
        .map(|name| name.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    let tool = tool.unwrap_or(if name.ends_with(".zip") { "unzip" } else { "tar" });
    let program = which::which(tool).with_context(|| format!("{tool} not found on PATH"))?;

    let mut command = Command::new(program);
    match tool {
        "unzip" => command.arg("-q").arg("-o").arg(archive).arg("-d").arg(dest),
        "tar" => command.arg("-xf").arg(archive).arg("-C").arg(dest),
        other => return Err(anyhow!("unsupported archive tool {other:?}")),
    };
    let status = command
        .status()
        .with_context(|| format!("run {tool} on {}", archive.display()))?;
    if !status.success() {
        return Err(anyhow!("{tool} failed on {} ({status})", archive.display()));
    }
    Ok(())
}

/// Move `fresh` to `sdk_root`. A previous tree is parked inside `staging`, so
/// it goes away with the staging dir once the swap succeeds and is put back
/// if it fails.
fn replace_tree(fresh: &Path, sdk_root: &Path, staging: &Path) -> Result<()> {
    let parked = staging.join("previous");
    let had_previous = sdk_root.exists();
    if had_previous {
        tracing::info!(root = %sdk_root.display(), "replacing existing SDK tree");
        fs::rename(sdk_root, &parked)
            .with_context(|| format!("move aside {}", sdk_root.display()))?;
    }
    if let Err(err) = fs::rename(fresh, sdk_root) {
        if had_previous {
            if let Err(restore) = fs::rename(&parked, sdk_root) {
                tracing::warn!(
                    root = %sdk_root.display(),
                    error = %restore,
                    "could not restore the previous SDK tree"
                );
            }
        }
        return Err(err)
            .with_context(|| format!("move {} to {}", fresh.display(), sdk_root.display()));
    }
    Ok(())
}

/// The directory holding `devkitsnes/`: the unpacked root itself or one of
/// its descendants up to two levels down (release archives wrap the tree in a
/// versioned folder).
fn find_sdk_tree(root: &Path) -> Option<PathBuf> {
    if root.join(TOOLCHAIN_DIR).is_dir() {
        return Some(root.to_path_buf());
    }
    let mut frontier = vec![root.to_path_buf()];
    for _ in 0..2 {
        let mut next = Vec::new();
        for dir in frontier {
            let Ok(entries) = fs::read_dir(&dir) else {
                continue;
            };
            let mut children: Vec<PathBuf> = entries
                .filter_map(|entry| entry.ok().map(|entry| entry.path()))
                .filter(|path| path.is_dir())
                .collect();
            children.sort();
            for child in children {
                if child.join(TOOLCHAIN_DIR).is_dir() {
                    return Some(child);
                }
                next.push(child);
            }
        }
        frontier = next;
    }
    None
}

/// Recursive copy that keeps file permissions.
fn copy_dir(source: &Path, dest: &Path) -> Result<()> {
    fs::create_dir_all(dest).with_context(|| format!("create {}", dest.display()))?;
    for entry in fs::read_dir(source).with_context(|| format!("read {}", source.display()))? {
        let entry = entry.with_context(|| format!("read {}", source.display()))?;
        let from = entry.path();
        let to = dest.join(entry.file_name());
        if entry
            .file_type()
            .with_context(|| format!("stat {}", from.display()))?
            .is_dir()
        {
            copy_dir(&from, &to)?;
        } else {
            fs::copy(&from, &to)
                .with_context(|| format!("copy {} to {}", from.display(), to.display()))?;
        }
    }
    Ok(())
}
