use prettytable::{Cell, Row, Table, format};

use crate::Result;
use crate::config::{DistroRegistry, Settings};

/// Print the known distros.
pub fn run(settings: &Settings) -> Result<()> {
    distros_table(&settings.distros).printstd();
    Ok(())
}

fn distros_table(distros: &DistroRegistry) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
    table.set_titles(Row::new(
        ["Name", "Repository", "Config path", "Prefix", "Version"]
            .into_iter()
            .map(|title| Cell::new(title).style_spec("bFc"))
            .collect(),
    ));

    for distro in distros.iter() {
        table.add_row(Row::new(vec![
            Cell::new(&distro.name).style_spec("Fc"),
            Cell::new(&distro.url),
            Cell::new(&distro.config_path),
            Cell::new(&distro.prefix),
            Cell::new(&distro.version),
        ]));
    }

    table
}
