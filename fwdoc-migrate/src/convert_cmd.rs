use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use fwdoc_migrate::pipeline::migrate;
use fwdoc_migrate::profile::GatePolicy;
use fwdoc_migrate::report::{render_gate, render_summary};
use tracing::{info, warn};

use crate::cli::ConvertArgs;
use crate::path_guard::ensure_output_not_input;
use crate::{read_page, resolve_profile};

pub fn run_convert(args: ConvertArgs) -> Result<()> {
    let mut profile = resolve_profile(args.profile.as_deref())?;
    if let Some(name) = &args.name {
        profile.rename(name.clone());
    }
    validate_file_stem(&profile.policy_name)?;

    let markup = read_page(&args.file)?;
    let gate_policy = profile.gate;
    if args.force {
        profile.gate = GatePolicy {
            block_on_cycles: false,
            block_on_unresolved: false,
        };
    }

    let output = migrate(&markup, &profile)
        .with_context(|| format!("failed to parse {}", args.file.display()))?;

    let gate = fwdoc_migrate::GateDecision::evaluate(&output.report, &gate_policy);
    println!("{}", render_gate(&gate));
    if !gate.passed() {
        if !args.force {
            bail!(
                "conversion blocked: run `fwdoc-migrate analyze {}` for details, or pass --force",
                args.file.display()
            );
        }
        warn!("gate blocked; generating anyway because of --force");
    }

    let Some(generated) = &output.generated else {
        bail!("conversion produced no output");
    };

    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("failed to create {}", args.out_dir.display()))?;

    let files: [(PathBuf, &str); 3] = [
        (output_path(&args, &profile.policy_name, "pol"), &generated.policy),
        (output_path(&args, &profile.policy_name, "net"), &generated.networks),
        (output_path(&args, &profile.policy_name, "svc"), &generated.services),
    ];
    for (path, _) in &files {
        ensure_output_not_input(path, &args.file)?;
    }
    for (path, body) in &files {
        fs::write(path, body).with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), bytes = body.len(), "wrote output");
    }

    println!("{}", render_summary(&output));
    for (path, _) in &files {
        println!("wrote {}", path.display());
    }
    Ok(())
}

fn output_path(args: &ConvertArgs, name: &str, extension: &str) -> PathBuf {
    args.out_dir.join(format!("{name}.{extension}"))
}

fn validate_file_stem(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        bail!("policy name must not be empty");
    }
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        bail!("policy name {name:?} cannot be used as a file name");
    }
    Ok(())
}
