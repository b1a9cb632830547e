use colored::Colorize;

use super::{InstallArgs, picker, validate_version};
use crate::config::Settings;
use crate::installer::{InstallOutcome, InstallRequest, Installer};
use crate::picker::Picker;
use crate::resolver::VersionSource;
use crate::{Error, Result};

/// How the user asked for the thing to install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    DirectVersion(String),
    VersionPick,
    DirectDistro(String),
    DistroPick,
}

impl Entry {
    pub fn from_args(args: &InstallArgs) -> Result<Self> {
        if args.pick_distro {
            Ok(Entry::DistroPick)
        } else if let Some(name) = &args.distro {
            Ok(Entry::DirectDistro(name.clone()))
        } else if args.pick {
            Ok(Entry::VersionPick)
        } else if let Some(version) = &args.version {
            Ok(Entry::DirectVersion(version.clone()))
        } else {
            Err(Error::Usage(
                "specify a VERSION, --distro NAME, --pick or --pick-distro".to_string(),
            ))
        }
    }
}

/// Turn an entry point into a concrete install request.
///
/// Distro entries always install the distro's pinned version.
pub fn resolve_request(
    settings: &Settings,
    entry: Entry,
    picker: &dyn Picker,
    force: bool,
) -> Result<InstallRequest> {
    let distro = match &entry {
        Entry::DirectDistro(name) => Some(settings.distros.resolve(name)?),
        Entry::DistroPick => {
            let name = picker
                .pick(&settings.distros.names(), "Distro")
                .ok_or(Error::NoSelectionMade)?;
            Some(settings.distros.resolve(&name)?)
        }
        Entry::DirectVersion(_) | Entry::VersionPick => None,
    };

    if let Some(distro) = distro {
        return Ok(InstallRequest {
            version: distro.version.clone(),
            repository: distro.url.clone(),
            config_path: distro.config_path.clone(),
            prefix: distro.prefix.clone(),
            force,
        });
    }

    let version = match entry {
        Entry::DirectVersion(version) => version,
        _ => pick_version(settings, picker)?,
    };

    Ok(InstallRequest {
        version,
        repository: settings.repository.clone(),
        config_path: settings.config_path.clone(),
        prefix: settings.prefix.clone(),
        force,
    })
}

/// Let the user choose one of the remote versions of the configured repository.
///
/// Names are shown in the configured tag style; the returned name is the
/// ref as it exists in the repository.
fn pick_version(settings: &Settings, picker: &dyn Picker) -> Result<String> {
    let repository = &settings.repository;
    println!("Fetching available versions from {}...", repository);

    let source = VersionSource::new(settings.tag_style);
    let versions = source
        .fetch_versions(repository, false)
        .map_err(|e| Error::VersionsUnavailable {
            url: repository.clone(),
            source: Box::new(e),
        })?;
    if versions.is_empty() {
        return Err(Error::NoVersions {
            url: repository.clone(),
        });
    }

    let shown: Vec<String> = versions
        .iter()
        .map(|v| source.display(v).to_string())
        .collect();
    let selection = picker.pick(&shown, "Version").ok_or(Error::NoSelectionMade)?;

    shown
        .iter()
        .position(|name| *name == selection)
        .map(|index| versions[index].name.clone())
        .ok_or(Error::NoSelectionMade)
}

/// Install a version of the configuration or a distro.
pub fn run(settings: Settings, args: InstallArgs) -> Result<()> {
    let entry = Entry::from_args(&args)?;
    let settings = settings.with_overrides(args.repo_url, args.config_path, args.prefix);
    let picker = picker(&settings)?;

    let request = resolve_request(&settings, entry, &picker, args.force)?;
    validate_version(&request.version)?;

    println!("Cloning version '{}' from {}...", request.version, request.repository);

    let installer = Installer::new(settings.layout());
    match installer.install(&request)? {
        InstallOutcome::Installed { path, .. } => {
            println!(
                "{}",
                format!(
                    "Version '{}' installed successfully at {}.",
                    request.version,
                    path.display()
                )
                .green()
            );
            print_activation_hint(&settings.activation_hint(&request.prefix, &request.version));
            Ok(())
        }
        InstallOutcome::AlreadyInstalled { path } => Err(Error::AlreadyInstalled {
            version: request.version,
            path,
        }),
    }
}

pub(super) fn print_activation_hint(hint: &str) {
    println!();
    println!("Activate it with:");
    println!();
    println!("    export {}", hint.cyan());
    println!();
    println!("or run it once with:");
    println!();
    println!("    {} nvim", hint.cyan());
}
