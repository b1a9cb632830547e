use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::distro::{DistroDescriptor, DistroRegistry};
use crate::layout::{InstallLayout, SEPARATOR};
use crate::{Error, Result};

pub const APP_NAME: &str = "nvim-manager";
pub const CONFIG_FILENAME: &str = "config.toml";

pub const DEFAULT_REPOSITORY: &str = "https://github.com/waylonwalker/devtainer";
pub const DEFAULT_CONFIG_PATH: &str = "nvim/.config/nvim";
pub const DEFAULT_PREFIX: &str = "nvim-waylonwalker";
pub const DEFAULT_APP_NAME_VARIABLE: &str = "NVIM_APPNAME";
pub const DEFAULT_PICKER: &[&str] = &["fzf", "--prompt", "{prompt}> ", "--height", "40%", "--reverse"];

pub const ENV_REPOSITORY: &str = "NVIM_GITHUB_REPO";
pub const ENV_CONFIG_PATH: &str = "NVIM_CONFIG_PATH";
pub const ENV_INSTALL_DIR: &str = "NVIM_INSTALL_DIR";
pub const ENV_PREFIX: &str = "NVIM_PREFIX";
pub const ENV_CONFIG_FILE: &str = "NVIM_MANAGER_CONFIG";

/// How tag names are shown to the user.
///
/// Installs always use the tag name as it exists in the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TagStyle {
    #[default]
    Verbatim,
    StripV,
}

impl TagStyle {
    pub fn display<'a>(&self, tag: &'a str) -> &'a str {
        match self {
            TagStyle::Verbatim => tag,
            TagStyle::StripV => tag.strip_prefix('v').unwrap_or(tag),
        }
    }
}

/// Process-wide settings, built once and passed to each component.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Repository user configs are cloned from.
    pub repository: String,
    /// Path inside `repository` holding the Neovim config.
    pub config_path: String,
    pub install_root: PathBuf,
    /// Install family for user configs, without the trailing separator.
    pub prefix: String,
    /// Variable the launcher reads to pick an install.
    pub app_name_variable: String,
    pub tag_style: TagStyle,
    /// Picker command line; `{prompt}` is replaced by the prompt label.
    pub picker: Vec<String>,
    pub distros: DistroRegistry,
}

// Internal struct for TOML deserialization
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSettings {
    repository: Option<String>,
    config_path: Option<String>,
    install_dir: Option<PathBuf>,
    prefix: Option<String>,
    app_name_variable: Option<String>,
    tag_style: Option<TagStyle>,
    picker: Option<Vec<String>>,
    #[serde(default)]
    distros: Vec<DistroDescriptor>,
}

impl RawSettings {
    fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| Error::ConfigParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

impl Settings {
    /// Get the global config file path (~/.config/nvim-manager/config.toml).
    pub fn global_path() -> Option<PathBuf> {
        let dirs = xdg::BaseDirectories::with_prefix(APP_NAME);
        dirs.get_config_home().map(|p| p.join(CONFIG_FILENAME))
    }

    /// Build settings from the process environment and config file.
    pub fn load() -> Result<Self> {
        Self::from_env(|key| std::env::var(key).ok())
    }

    /// Build settings with `env` standing in for the process environment.
    ///
    /// Precedence, highest first: environment, config file, defaults.
    pub fn from_env<F>(env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| env(key).filter(|value| !value.is_empty());

        let config_file = lookup(ENV_CONFIG_FILE)
            .map(PathBuf::from)
            .or_else(Self::global_path);

        let raw = match config_file {
            Some(path) if path.exists() => {
                debug!(path = %path.display(), "loading config file");
                RawSettings::load(&path)?
            }
            _ => RawSettings::default(),
        };

        let install_root = lookup(ENV_INSTALL_DIR)
            .map(PathBuf::from)
            .or(raw.install_dir)
            .or_else(|| xdg::BaseDirectories::new().get_config_home())
            .ok_or(Error::NoInstallRoot)?;

        let prefix = lookup(ENV_PREFIX)
            .or(raw.prefix)
            .unwrap_or_else(|| DEFAULT_PREFIX.to_string());

        Ok(Self {
            repository: lookup(ENV_REPOSITORY)
                .or(raw.repository)
                .unwrap_or_else(|| DEFAULT_REPOSITORY.to_string()),
            config_path: lookup(ENV_CONFIG_PATH)
                .or(raw.config_path)
                .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string()),
            install_root,
            prefix: normalize_prefix(&prefix),
            app_name_variable: raw
                .app_name_variable
                .unwrap_or_else(|| DEFAULT_APP_NAME_VARIABLE.to_string()),
            tag_style: raw.tag_style.unwrap_or_default(),
            picker: raw
                .picker
                .filter(|cmd| !cmd.is_empty())
                .unwrap_or_else(|| DEFAULT_PICKER.iter().map(|s| s.to_string()).collect()),
            distros: DistroRegistry::with_extra(raw.distros),
        })
    }

    /// Apply command-line overrides on top of the loaded settings.
    pub fn with_overrides(
        mut self,
        repository: Option<String>,
        config_path: Option<String>,
        prefix: Option<String>,
    ) -> Self {
        if let Some(repository) = repository {
            self.repository = repository;
        }
        if let Some(config_path) = config_path {
            self.config_path = config_path;
        }
        if let Some(prefix) = prefix {
            self.prefix = normalize_prefix(&prefix);
        }
        self
    }

    /// Layout over the install root, aware of every registered prefix.
    pub fn layout(&self) -> InstallLayout {
        InstallLayout::with_prefixes(
            &self.install_root,
            self.distros
                .prefixes()
                .map(str::to_string)
                .chain(std::iter::once(self.prefix.clone())),
        )
    }

    /// The `VAR=value` line a user exports to activate an install.
    pub fn activation_hint(&self, prefix: &str, version: &str) -> String {
        format!(
            "{}={}",
            self.app_name_variable,
            InstallLayout::dir_name(prefix, version)
        )
    }
}

/// Older configurations spelled the prefix with its trailing separator.
fn normalize_prefix(prefix: &str) -> String {
    prefix.trim_end_matches(SEPARATOR).to_string()
}
