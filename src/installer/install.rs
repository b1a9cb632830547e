use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, instrument, warn};

use super::record::{InstallRecord, iso8601_now};
use crate::layout::{InstallLayout, SCRATCH_PREFIX};
use crate::resolver::{checkout_commit, clone_repository, resolve_ref};
use crate::{Error, Result};

/// Scratch directories older than this are assumed abandoned.
const SCRATCH_MAX_AGE: Duration = Duration::from_secs(60 * 60);

/// What to install and where it comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRequest {
    pub version: String,
    pub repository: String,
    /// Path inside the repository holding the config; `.` is the repository root.
    pub config_path: String,
    pub prefix: String,
    pub force: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed { path: PathBuf, record: InstallRecord },
    AlreadyInstalled { path: PathBuf },
}

/// A validated clone waiting in scratch space to be moved into place.
///
/// Dropping it removes the scratch directory.
#[derive(Debug)]
pub struct StagedInstall {
    scratch: TempDir,
    source: PathBuf,
    record: InstallRecord,
}

impl StagedInstall {
    pub fn record(&self) -> &InstallRecord {
        &self.record
    }

    pub fn scratch_path(&self) -> &Path {
        self.scratch.path()
    }
}

/// Clones configs into scratch space and relocates them into install directories.
#[derive(Debug, Clone)]
pub struct Installer {
    layout: InstallLayout,
}

impl Installer {
    pub fn new(layout: InstallLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &InstallLayout {
        &self.layout
    }

    /// Install a version, leaving disk untouched if it is already present and not forced.
    #[instrument(skip(self, request), fields(version = %request.version, prefix = %request.prefix))]
    pub fn install(&self, request: &InstallRequest) -> Result<InstallOutcome> {
        let install_dir = self.layout.install_path(&request.prefix, &request.version);

        if install_dir.exists() && !request.force {
            debug!(path = %install_dir.display(), "already installed");
            return Ok(InstallOutcome::AlreadyInstalled { path: install_dir });
        }

        let staged = self.stage(request)?;
        let record = self.replace(staged, &install_dir)?;

        Ok(InstallOutcome::Installed {
            path: install_dir,
            record,
        })
    }

    /// Clone the requested version into scratch space and validate its config path.
    ///
    /// On error the scratch directory is already gone.
    #[instrument(skip(self, request), fields(version = %request.version))]
    pub fn stage(&self, request: &InstallRequest) -> Result<StagedInstall> {
        let root = self.layout.root();
        std::fs::create_dir_all(root).map_err(|e| Error::FileWrite {
            path: root.to_path_buf(),
            source: e,
        })?;
        self.layout.sweep_stale_scratch(SCRATCH_MAX_AGE);

        let scratch = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(root)
            .map_err(|e| Error::FileWrite {
                path: root.to_path_buf(),
                source: e,
            })?;
        let clone_dir = scratch.path().join("clone");
        debug!(path = %clone_dir.display(), "cloning into scratch");

        let resolved = {
            let repo = clone_repository(&request.repository, &clone_dir)?;
            let resolved = resolve_ref(&repo, &request.repository, &request.version)?;
            checkout_commit(&repo, resolved.commit)?;
            resolved
        };

        let source = config_source(&clone_dir, &request.config_path).ok_or_else(|| {
            Error::ConfigPathNotFound {
                config_path: request.config_path.clone(),
                version: request.version.clone(),
            }
        })?;

        let git_dir = clone_dir.join(".git");
        std::fs::remove_dir_all(&git_dir).map_err(|e| Error::FileWrite {
            path: git_dir,
            source: e,
        })?;

        Ok(StagedInstall {
            scratch,
            source,
            record: InstallRecord {
                repository: request.repository.clone(),
                config_path: request.config_path.clone(),
                prefix: request.prefix.clone(),
                version: request.version.clone(),
                ref_kind: resolved.kind,
                git_commit_sha: resolved.commit.to_string(),
                installed_at: iso8601_now(),
            },
        })
    }

    /// Move a staged config into `install_dir`, replacing whatever is there.
    ///
    /// The previous install is parked in the scratch directory and put back
    /// if the move fails, so `install_dir` is never left half-populated.
    #[instrument(skip(self, staged))]
    pub fn replace(&self, staged: StagedInstall, install_dir: &Path) -> Result<InstallRecord> {
        let backup = staged.scratch.path().join("previous");
        let had_previous = install_dir.exists();

        if had_previous {
            debug!("parking previous install");
            std::fs::rename(install_dir, &backup).map_err(|e| Error::Relocate {
                path: install_dir.to_path_buf(),
                source: e,
            })?;
        }

        let result = relocate(&staged.source, install_dir)
            .map_err(|e| Error::Relocate {
                path: install_dir.to_path_buf(),
                source: e,
            })
            .and_then(|()| staged.record.write(install_dir));

        if let Err(e) = result {
            if install_dir.exists() {
                if let Err(cleanup) = std::fs::remove_dir_all(install_dir) {
                    warn!(error = %cleanup, "failed to remove partial install");
                }
            }
            if had_previous {
                if let Err(restore) = std::fs::rename(&backup, install_dir) {
                    warn!(error = %restore, "failed to restore previous install");
                }
            }
            return Err(e);
        }

        debug!(path = %install_dir.display(), "install complete");
        Ok(staged.record)
    }
}

/// Locate the config inside a clone; `None` if it is missing or escapes the clone.
fn config_source(clone_dir: &Path, config_path: &str) -> Option<PathBuf> {
    let relative = Path::new(config_path);
    let mut source = clone_dir.to_path_buf();

    for component in relative.components() {
        match component {
            Component::Normal(part) => source.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    source.is_dir().then_some(source)
}

/// Move `src` to `dst`, copying when a rename is not possible.
fn relocate(src: &Path, dst: &Path) -> std::io::Result<()> {
    match std::fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(e) => {
            debug!(error = %e, "rename failed, copying instead");
            std::fs::create_dir_all(dst)?;
            copy_dir_recursive(src, dst)
        }
    }
}

/// Recursively copy a directory.
fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let ty = entry.file_type()?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if ty.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}
