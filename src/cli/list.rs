use colored::Colorize;
use prettytable::{Cell, Row, Table, format};
use std::collections::BTreeSet;

use crate::Result;
use crate::config::Settings;
use crate::resolver::{RefKind, RemoteVersion, VersionSource};

/// List remote versions, marking the installed ones.
pub fn run(settings: &Settings, distro: Option<String>, branches: bool) -> Result<()> {
    let (repository, prefix) = match distro {
        Some(name) => {
            let distro = settings.distros.resolve(&name)?;
            (distro.url.clone(), distro.prefix.clone())
        }
        None => (settings.repository.clone(), settings.prefix.clone()),
    };

    println!("Fetching available versions from {}...", repository);

    let source = VersionSource::new(settings.tag_style);
    let versions = match source.fetch_versions(&repository, branches) {
        Ok(versions) => versions,
        Err(e) => {
            // A failed fetch still exits 0.
            println!(
                "{}",
                format!("Could not list versions for {}: {}", repository, e).yellow()
            );
            return Ok(());
        }
    };

    if versions.is_empty() {
        println!("{}", format!("No versions found in {}.", repository).yellow());
        return Ok(());
    }

    let installed = settings.layout().list_installed(&prefix);
    versions_table(&source, &versions, &installed, branches).printstd();

    Ok(())
}

fn versions_table(
    source: &VersionSource,
    versions: &[RemoteVersion],
    installed: &BTreeSet<String>,
    show_kind: bool,
) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);

    let mut titles = vec![Cell::new("Version").style_spec("bFc")];
    if show_kind {
        titles.push(Cell::new("Kind").style_spec("b"));
    }
    titles.push(Cell::new("Installed").style_spec("bFg"));
    table.set_titles(Row::new(titles));

    for version in versions {
        let is_installed = installed.contains(&version.name);

        let mut cells = vec![Cell::new(source.display(version)).style_spec("Fc")];
        if show_kind {
            cells.push(Cell::new(match version.kind {
                RefKind::Branch => "branch",
                RefKind::Tag => "tag",
            }));
        }
        cells.push(if is_installed {
            Cell::new("Yes").style_spec("Fg")
        } else {
            Cell::new("No")
        });

        table.add_row(Row::new(cells));
    }

    table
}
