use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "fwdoc-migrate")]
#[command(about = "Migrate firewall documentation tables from wiki pages into policy files")]
pub struct Cli {
    /// Raise log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// List the tables found in a page and how each was classified.
    Tables(TablesArgs),
    /// Check host/network/group cross-references for gaps and cycles.
    Analyze(AnalyzeArgs),
    /// Generate .pol, .net and .svc files from a page.
    Convert(ConvertArgs),
}

#[derive(Parser, Debug)]
pub struct TablesArgs {
    /// Saved wiki page (HTML).
    pub file: PathBuf,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    /// Optional migration profile TOML (for extra header synonyms).
    #[arg(long)]
    pub profile: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct AnalyzeArgs {
    /// Saved wiki page (HTML).
    pub file: PathBuf,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    /// Also fail on unresolved references.
    #[arg(long)]
    pub strict: bool,
    /// Optional migration profile TOML (for extra header synonyms).
    #[arg(long)]
    pub profile: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct ConvertArgs {
    /// Saved wiki page (HTML).
    pub file: PathBuf,
    /// Directory receiving <name>.pol, <name>.net and <name>.svc.
    #[arg(long)]
    pub out_dir: PathBuf,
    /// Migration profile TOML. Defaults to the built-in profile.
    #[arg(long)]
    pub profile: Option<PathBuf>,
    /// Policy name; overrides the profile's policy_name.
    #[arg(long)]
    pub name: Option<String>,
    /// Generate even when the analysis gate blocks.
    #[arg(long)]
    pub force: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}
