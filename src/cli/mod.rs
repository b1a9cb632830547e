mod distros;
mod install;
mod list;
mod update;

use clap::{Args, CommandFactory, Parser, Subcommand};

use crate::config::Settings;
use crate::picker::ExternalPicker;
use crate::{Error, Result};

pub use install::{Entry, resolve_request};

#[derive(Parser)]
#[command(name = "nvim-manager")]
#[command(about = "Install, list and update versions of a Neovim configuration")]
#[command(version)]
pub struct Cli {
    /// List available versions (same as `nvim-manager list`)
    #[arg(long)]
    pub list: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install a version of the configuration or a distro
    ///
    /// Activate an installed version with NVIM_APPNAME=<prefix>-<version> nvim
    Install(InstallArgs),

    /// List versions available in the remote repository
    List {
        /// List the versions of a distro's repository instead
        #[arg(long)]
        distro: Option<String>,

        /// Include branches as well as tags
        #[arg(long)]
        branches: bool,
    },

    /// Replace an installed version with a fresh clone
    Update {
        /// Version to update (a distro defaults to its pinned version)
        #[arg(conflicts_with = "all")]
        version: Option<String>,

        /// Update an install of this distro
        #[arg(long, conflicts_with = "prefix")]
        distro: Option<String>,

        /// Install prefix the version lives under
        #[arg(long)]
        prefix: Option<String>,

        /// Update every branch-based install of the prefix
        #[arg(long)]
        all: bool,
    },

    /// List the known distros
    Distros,

    /// Print the nvim-manager version
    Version,
}

#[derive(Args, Debug, Clone, Default)]
pub struct InstallArgs {
    /// Tag or branch to install
    #[arg(conflicts_with_all = ["distro", "pick", "pick_distro"])]
    pub version: Option<String>,

    /// Install a distro at its pinned version
    #[arg(long, conflicts_with_all = ["pick", "pick_distro"])]
    pub distro: Option<String>,

    /// Pick the version interactively
    #[arg(long, conflicts_with = "pick_distro")]
    pub pick: bool,

    /// Pick a distro interactively
    #[arg(long)]
    pub pick_distro: bool,

    /// Repository to clone from
    #[arg(long)]
    pub repo_url: Option<String>,

    /// Path of the config inside the repository ("." for the root)
    #[arg(long)]
    pub config_path: Option<String>,

    /// Install prefix for the directory name
    #[arg(long)]
    pub prefix: Option<String>,

    /// Reinstall even if the version is already installed
    #[arg(short, long)]
    pub force: bool,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Some(Commands::Install(args)) => install::run(Settings::load()?, args),
            Some(Commands::List { distro, branches }) => list::run(&Settings::load()?, distro, branches),
            Some(Commands::Update {
                version,
                distro,
                prefix,
                all,
            }) => update::run(Settings::load()?, version, distro, prefix, all),
            Some(Commands::Distros) => distros::run(&Settings::load()?),
            Some(Commands::Version) => {
                println!("nvim-manager {}", env!("CARGO_PKG_VERSION"));
                Ok(())
            }
            None if self.list => list::run(&Settings::load()?, None, false),
            None => {
                Cli::command().print_help()?;
                Ok(())
            }
        }
    }
}

/// Reject versions that cannot be encoded as a single directory name.
pub fn validate_version(version: &str) -> Result<()> {
    if version.trim().is_empty() {
        return Err(Error::Usage("version must not be empty".to_string()));
    }
    if version == "." || version == ".." || version.contains(['/', '\\']) {
        return Err(Error::Usage(format!(
            "version '{}' cannot be used as an install directory name",
            version
        )));
    }
    Ok(())
}

fn picker(settings: &Settings) -> Result<ExternalPicker> {
    ExternalPicker::from_command(&settings.picker)
        .ok_or_else(|| Error::Usage("picker command is empty".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_version() {
        assert!(validate_version("v1.0.0").is_ok());
        assert!(validate_version("main").is_ok());
        assert!(matches!(validate_version(""), Err(Error::Usage(_))));
        assert!(matches!(validate_version("  "), Err(Error::Usage(_))));
        assert!(matches!(validate_version(".."), Err(Error::Usage(_))));
        assert!(matches!(validate_version("feature/x"), Err(Error::Usage(_))));
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_install_flags() {
        let cli = Cli::try_parse_from(["nvim-manager", "install", "v1.0.0", "-f", "--prefix", "mine"]).unwrap();
        match cli.command {
            Some(Commands::Install(args)) => {
                assert_eq!(args.version.as_deref(), Some("v1.0.0"));
                assert!(args.force);
                assert_eq!(args.prefix.as_deref(), Some("mine"));
            }
            _ => panic!("expected install"),
        }
    }

    #[test]
    fn test_install_entry_points_conflict() {
        assert!(Cli::try_parse_from(["nvim-manager", "install", "v1.0.0", "--pick"]).is_err());
        assert!(Cli::try_parse_from(["nvim-manager", "install", "--distro", "lazyvim", "--pick-distro"]).is_err());
        assert!(Cli::try_parse_from(["nvim-manager", "install", "--pick", "--pick-distro"]).is_err());
    }

    #[test]
    fn test_bare_list_flag() {
        let cli = Cli::try_parse_from(["nvim-manager", "--list"]).unwrap();
        assert!(cli.list);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_update_all_conflicts_with_version() {
        assert!(Cli::try_parse_from(["nvim-manager", "update", "main", "--all"]).is_err());
        assert!(Cli::try_parse_from(["nvim-manager", "update", "--all"]).is_ok());
    }
}
