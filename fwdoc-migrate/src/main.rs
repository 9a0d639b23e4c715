use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use fwdoc_migrate::profile::{default_profile, load_profile, MigrationProfile};
use tracing_subscriber::EnvFilter;

mod analyze_cmd;
mod cli;
mod convert_cmd;
mod path_guard;
mod tables_cmd;

use cli::{Cli, Command};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Tables(args) => tables_cmd::run_tables(args),
        Command::Analyze(args) => analyze_cmd::run_analyze(args),
        Command::Convert(args) => convert_cmd::run_convert(args),
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

pub(crate) fn read_page(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

pub(crate) fn resolve_profile(path: Option<&Path>) -> Result<MigrationProfile> {
    match path {
        Some(path) => Ok(load_profile(path)?),
        None => Ok(default_profile()),
    }
}
