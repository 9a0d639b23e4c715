use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

pub fn ensure_output_not_input(output: &Path, input: &Path) -> Result<()> {
    let out_norm = normalize_for_compare(output)
        .with_context(|| format!("failed to normalize output path {}", output.display()))?;
    let in_norm = normalize_for_compare(input)
        .with_context(|| format!("failed to normalize input path {}", input.display()))?;
    if out_norm == in_norm {
        bail!(
            "refusing to overwrite source page: output {} matches input {}",
            output.display(),
            input.display()
        );
    }
    Ok(())
}

fn normalize_for_compare(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return path
            .canonicalize()
            .with_context(|| format!("canonicalize {}", path.display()));
    }

    // Outputs may not exist yet: canonicalize the parent when it does.
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().context("current_dir")?.join(path)
    };
    match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) if parent.exists() => Ok(parent
            .canonicalize()
            .with_context(|| format!("canonicalize {}", parent.display()))?
            .join(name)),
        _ => Ok(absolute),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::ensure_output_not_input;

    #[test]
    fn same_file_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("page.pol");
        fs::write(&input, "x").expect("write");
        let aliased = dir.path().join(".").join("page.pol");
        assert!(ensure_output_not_input(&aliased, &input).is_err());
    }

    #[test]
    fn distinct_new_file_is_allowed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("page.html");
        fs::write(&input, "x").expect("write");
        assert!(ensure_output_not_input(&dir.path().join("out.pol"), &input).is_ok());
    }
}
