use std::path::Path;
use tracing::{debug, instrument, warn};

use super::install::{InstallRequest, Installer};
use super::record::InstallRecord;
use crate::config::Settings;
use crate::resolver::RefKind;
use crate::{Error, Result};

/// Result of updating one installed version as part of a bulk update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateStatus {
    Updated,
    /// Tags do not move, so there is nothing to update.
    SkippedTag,
    /// No install record, so the ref kind is unknown.
    SkippedUnknown,
    Failed(String),
}

/// Re-clones installed versions, replaying the parameters they were installed with.
pub struct Updater<'a> {
    installer: &'a Installer,
    settings: &'a Settings,
}

impl<'a> Updater<'a> {
    pub fn new(installer: &'a Installer, settings: &'a Settings) -> Self {
        Self {
            installer,
            settings,
        }
    }

    /// Replace an installed version with a fresh clone of the same ref.
    ///
    /// The fresh clone is staged before the old install is touched; if
    /// anything fails the old install stays in place.
    #[instrument(skip(self))]
    pub fn update(&self, version: &str, prefix: &str) -> Result<InstallRecord> {
        let install_dir = self.installer.layout().install_path(prefix, version);
        if !install_dir.is_dir() {
            return Err(Error::NotInstalled {
                version: version.to_string(),
                path: install_dir,
            });
        }

        let request = self.replay_request(version, prefix, &install_dir);
        debug!(repository = %request.repository, config_path = %request.config_path, "replaying install");

        let staged = self.installer.stage(&request)?;
        self.installer.replace(staged, &install_dir)
    }

    /// Update every branch-based install under `prefix`.
    ///
    /// Failures are collected per version rather than stopping the run.
    pub fn update_all(&self, prefix: &str) -> Vec<(String, UpdateStatus)> {
        let layout = self.installer.layout();

        layout
            .list_installed(prefix)
            .into_iter()
            .map(|version| {
                let install_dir = layout.install_path(prefix, &version);
                let status = match InstallRecord::read(&install_dir) {
                    Ok(Some(record)) if record.ref_kind == RefKind::Tag => UpdateStatus::SkippedTag,
                    Ok(Some(_)) => match self.update(&version, prefix) {
                        Ok(_) => UpdateStatus::Updated,
                        Err(e) => UpdateStatus::Failed(e.to_string()),
                    },
                    Ok(None) => UpdateStatus::SkippedUnknown,
                    Err(e) => UpdateStatus::Failed(e.to_string()),
                };
                (version, status)
            })
            .collect()
    }

    /// Work out where an install came from.
    ///
    /// Prefers the install record, then a distro owning `prefix`, then the
    /// default repository.
    fn replay_request(&self, version: &str, prefix: &str, install_dir: &Path) -> InstallRequest {
        let (repository, config_path) = match InstallRecord::read(install_dir) {
            Ok(Some(record)) => (record.repository, record.config_path),
            other => {
                if let Err(e) = other {
                    warn!(error = %e, "ignoring unreadable install record");
                }
                match self.settings.distros.find_by_prefix(prefix) {
                    Some(distro) => (distro.url.clone(), distro.config_path.clone()),
                    None => (
                        self.settings.repository.clone(),
                        self.settings.config_path.clone(),
                    ),
                }
            }
        };

        InstallRequest {
            version: version.to_string(),
            repository,
            config_path,
            prefix: prefix.to_string(),
            force: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DistroDescriptor, DistroRegistry, TagStyle};
    use crate::resolver::fixtures::{commit_all, config_repo, url};
    use git2::Repository;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct Fixture {
        _temp_dir: TempDir,
        origin: PathBuf,
        repo: Repository,
        settings: Settings,
    }

    fn fixture() -> Fixture {
        let temp_dir = tempfile::tempdir().unwrap();
        let origin = temp_dir.path().join("origin");
        let repo = config_repo(&origin);

        let settings = Settings {
            repository: url(&origin),
            config_path: "nvim".to_string(),
            install_root: temp_dir.path().join("config"),
            prefix: "mine".to_string(),
            app_name_variable: "NVIM_APPNAME".to_string(),
            tag_style: TagStyle::Verbatim,
            picker: vec!["fzf".to_string()],
            distros: DistroRegistry::with_extra([DistroDescriptor {
                name: "Local".to_string(),
                url: url(&origin),
                config_path: ".".to_string(),
                prefix: "local".to_string(),
                version: "dev".to_string(),
            }]),
        };

        Fixture {
            _temp_dir: temp_dir,
            origin,
            repo,
            settings,
        }
    }

    fn install(installer: &Installer, fx: &Fixture, version: &str, prefix: &str, config_path: &str) {
        installer
            .install(&InstallRequest {
                version: version.to_string(),
                repository: url(&fx.origin),
                config_path: config_path.to_string(),
                prefix: prefix.to_string(),
                force: false,
            })
            .unwrap();
    }

    /// Move the `dev` branch forward with new init.lua content.
    fn advance_dev(fx: &Fixture, content: &str) {
        fx.repo.set_head("refs/heads/dev").unwrap();
        fx.repo
            .checkout_head(Some(git2::build::CheckoutBuilder::new().force()))
            .unwrap();
        fs::write(fx.origin.join("nvim/init.lua"), content).unwrap();
        commit_all(&fx.repo, "Advance dev");
    }

    #[test]
    fn test_update_not_installed() {
        let fx = fixture();
        let installer = Installer::new(fx.settings.layout());
        fs::create_dir_all(&fx.settings.install_root).unwrap();
        fs::create_dir(fx.settings.install_root.join("mine-v1.0.0")).unwrap();

        let updater = Updater::new(&installer, &fx.settings);
        let result = updater.update("v9.9.9", "mine");

        assert!(matches!(result, Err(Error::NotInstalled { .. })));
        assert!(fx.settings.install_root.join("mine-v1.0.0").exists());
    }

    #[test]
    fn test_update_picks_up_moved_branch() {
        let fx = fixture();
        let installer = Installer::new(fx.settings.layout());
        install(&installer, &fx, "dev", "mine", "nvim");

        let installed = fx.settings.install_root.join("mine-dev");
        assert_eq!(fs::read_to_string(installed.join("init.lua")).unwrap(), "-- v1.1.0\n");

        advance_dev(&fx, "-- dev\n");

        let updater = Updater::new(&installer, &fx.settings);
        let record = updater.update("dev", "mine").unwrap();

        assert_eq!(record.ref_kind, RefKind::Branch);
        assert_eq!(fs::read_to_string(installed.join("init.lua")).unwrap(), "-- dev\n");
    }

    #[test]
    fn test_update_replays_recorded_config_path() {
        let fx = fixture();
        let installer = Installer::new(fx.settings.layout());
        // Installed from the repository root, unlike the "nvim" default.
        install(&installer, &fx, "v1.0.0", "mine", ".");

        let updater = Updater::new(&installer, &fx.settings);
        updater.update("v1.0.0", "mine").unwrap();

        let installed = fx.settings.install_root.join("mine-v1.0.0");
        assert!(installed.join("README.md").exists());
        assert!(installed.join("nvim/init.lua").exists());
    }

    #[test]
    fn test_update_without_record_uses_distro() {
        let fx = fixture();
        let installer = Installer::new(fx.settings.layout());
        install(&installer, &fx, "dev", "local", "nvim");

        let installed = fx.settings.install_root.join("local-dev");
        fs::remove_file(InstallRecord::path_in(&installed)).unwrap();

        let updater = Updater::new(&installer, &fx.settings);
        let record = updater.update("dev", "local").unwrap();

        // The distro installs from the repository root.
        assert_eq!(record.config_path, ".");
        assert!(installed.join("README.md").exists());
    }

    #[test]
    fn test_failed_update_keeps_previous_install() {
        let fx = fixture();
        let installer = Installer::new(fx.settings.layout());
        install(&installer, &fx, "dev", "mine", "nvim");

        // Break the remote so the fresh clone fails.
        fs::remove_dir_all(&fx.origin).unwrap();

        let updater = Updater::new(&installer, &fx.settings);
        let result = updater.update("dev", "mine");

        assert!(matches!(result, Err(Error::CloneFailed { .. })));
        let installed = fx.settings.install_root.join("mine-dev");
        assert_eq!(fs::read_to_string(installed.join("init.lua")).unwrap(), "-- v1.1.0\n");

        let leftovers: Vec<_> = fs::read_dir(&fx.settings.install_root)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name())
            .collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn test_update_all_skips_tags() {
        let fx = fixture();
        let installer = Installer::new(fx.settings.layout());
        install(&installer, &fx, "dev", "mine", "nvim");
        install(&installer, &fx, "v1.0.0", "mine", "nvim");
        fs::create_dir(fx.settings.install_root.join("mine-legacy")).unwrap();

        let updater = Updater::new(&installer, &fx.settings);
        let results = updater.update_all("mine");

        assert_eq!(
            results,
            vec![
                ("dev".to_string(), UpdateStatus::Updated),
                ("legacy".to_string(), UpdateStatus::SkippedUnknown),
                ("v1.0.0".to_string(), UpdateStatus::SkippedTag),
            ]
        );
    }
}
