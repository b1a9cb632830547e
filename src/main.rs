use clap::Parser;
use colored::Colorize;
use nvim_manager::cli::Cli;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() {
    // Initialize tracing with RUST_LOG env filter
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = cli.run() {
        eprintln!("{} {}", "Error:".red().bold(), e);

        // Print error chain
        let mut source = std::error::Error::source(&e);
        while let Some(s) = source {
            eprintln!("  Caused by: {}", s);
            source = std::error::Error::source(s);
        }

        std::process::exit(1);
    }
}
