use colored::Colorize;

use super::install::print_activation_hint;
use super::validate_version;
use crate::config::Settings;
use crate::installer::{Installer, UpdateStatus, Updater};
use crate::{Error, Result};

/// Re-clone one installed version, or every branch-based one with `--all`.
pub fn run(
    settings: Settings,
    version: Option<String>,
    distro: Option<String>,
    prefix: Option<String>,
    all: bool,
) -> Result<()> {
    let settings = settings.with_overrides(None, None, prefix);

    let (prefix, version) = match distro {
        Some(name) => {
            let distro = settings.distros.resolve(&name)?;
            let version = version.or_else(|| (!all).then(|| distro.version.clone()));
            (distro.prefix.clone(), version)
        }
        None => (settings.prefix.clone(), version),
    };

    let installer = Installer::new(settings.layout());
    let updater = Updater::new(&installer, &settings);

    if all {
        return update_all(&updater, &prefix);
    }

    let version = version.ok_or_else(|| Error::Usage("specify a VERSION or --all".to_string()))?;
    validate_version(&version)?;

    println!("Updating version '{}'...", version);
    updater.update(&version, &prefix)?;

    println!(
        "{}",
        format!("Version '{}' updated successfully.", version).green()
    );
    print_activation_hint(&settings.activation_hint(&prefix, &version));
    Ok(())
}

fn update_all(updater: &Updater<'_>, prefix: &str) -> Result<()> {
    let results = updater.update_all(prefix);
    if results.is_empty() {
        println!("No installed versions under '{}'.", prefix);
        return Ok(());
    }

    let mut failed = 0;
    for (version, status) in results {
        match status {
            UpdateStatus::Updated => {
                println!("{}", format!("Version '{}' updated successfully.", version).green())
            }
            UpdateStatus::SkippedTag => println!(
                "{}",
                format!("Version '{}' is based on a tag and cannot be updated.", version).yellow()
            ),
            UpdateStatus::SkippedUnknown => println!(
                "{}",
                format!(
                    "Version '{}' has no install record; update it by name to re-clone it.",
                    version
                )
                .yellow()
            ),
            UpdateStatus::Failed(reason) => {
                failed += 1;
                eprintln!(
                    "{}",
                    format!("Version '{}' failed to update: {}", version, reason).red()
                );
            }
        }
    }

    if failed > 0 {
        return Err(Error::UpdatesFailed(failed));
    }
    Ok(())
}
