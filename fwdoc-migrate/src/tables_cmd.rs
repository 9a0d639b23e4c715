use anyhow::{Context, Result};
use fwdoc_migrate::parser::TableParser;
use fwdoc_migrate::report::render_tables;

use crate::cli::{OutputFormat, TablesArgs};
use crate::{read_page, resolve_profile};

pub fn run_tables(args: TablesArgs) -> Result<()> {
    let profile = resolve_profile(args.profile.as_deref())?;
    let markup = read_page(&args.file)?;
    let document = TableParser::with_synonyms(profile.header_synonyms())
        .parse_document(&markup)
        .with_context(|| format!("failed to parse {}", args.file.display()))?;

    match args.format {
        OutputFormat::Text => {
            println!("{}", render_tables(&document.tables));
            println!(
                "rules={} hosts={} networks={} groups={}",
                document.rules.len(),
                document.definitions.hosts.len(),
                document.definitions.networks.len(),
                document.definitions.groups.len()
            );
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&document.tables)?),
    }
    Ok(())
}
