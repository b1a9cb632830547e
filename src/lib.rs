pub mod cli;
pub mod config;
pub mod installer;
pub mod layout;
pub mod picker;
pub mod resolver;

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // Config errors
    #[error("could not determine the install directory (set NVIM_INSTALL_DIR)")]
    NoInstallRoot,

    #[error("failed to parse config file {path}: {reason}")]
    ConfigParse { path: PathBuf, reason: String },

    #[error("unknown distro '{name}' (available: {})", .available.join(", "))]
    UnknownDistro { name: String, available: Vec<String> },

    // Install errors
    #[error("version '{version}' is already installed at {} (use --force to reinstall)", .path.display())]
    AlreadyInstalled { version: String, path: PathBuf },

    #[error("version '{version}' is not installed (expected {})", .path.display())]
    NotInstalled { version: String, path: PathBuf },

    #[error("configuration path '{config_path}' not found in '{version}'")]
    ConfigPathNotFound { config_path: String, version: String },

    #[error("failed to clone {url}: {source}")]
    CloneFailed {
        url: String,
        #[source]
        source: git2::Error,
    },

    #[error("no branch or tag named '{version}' in {url}")]
    RefNotFound { url: String, version: String },

    #[error("failed to move configuration into {}: {source}", .path.display())]
    Relocate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse JSON in {path}: {source}")]
    JsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not list versions for {url}")]
    VersionsUnavailable {
        url: String,
        #[source]
        source: Box<Error>,
    },

    #[error("no versions found in {url}")]
    NoVersions { url: String },

    #[error("{0} update(s) failed")]
    UpdatesFailed(usize),

    // CLI errors
    #[error("no selection made")]
    NoSelectionMade,

    #[error("{0}")]
    Usage(String),

    // Git errors
    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
