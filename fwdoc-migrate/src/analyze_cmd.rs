use anyhow::{bail, Context, Result};
use fwdoc_migrate::dependency::DependencyAnalyzer;
use fwdoc_migrate::parser::TableParser;
use fwdoc_migrate::report::render_dependency_report;

use crate::cli::{AnalyzeArgs, OutputFormat};
use crate::{read_page, resolve_profile};

pub fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    let profile = resolve_profile(args.profile.as_deref())?;
    let markup = read_page(&args.file)?;
    let document = TableParser::with_synonyms(profile.header_synonyms())
        .parse_document(&markup)
        .with_context(|| format!("failed to parse {}", args.file.display()))?;
    let report = DependencyAnalyzer::new().analyze(&document.definitions);

    match args.format {
        OutputFormat::Text => println!("{}", render_dependency_report(&report)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    if !report.cycles.is_empty() {
        bail!(
            "analysis failed: {} circular dependencies",
            report.cycles.len()
        );
    }
    if args.strict && !report.unresolved.is_empty() {
        bail!(
            "analysis failed in strict mode: {} unresolved references",
            report.unresolved.len()
        );
    }
    Ok(())
}
