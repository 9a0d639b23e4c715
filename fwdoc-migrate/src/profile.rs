use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::generate::{PolicyHeader, Target};
use crate::headers::{ColumnRole, HeaderSynonyms};

pub const DEFAULT_POLICY_NAME: &str = "generated-policy";

/// Settings for one migration run: policy header, extra header synonyms and
/// the pre-generation gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationProfile {
    pub policy_name: String,
    pub comment: Option<String>,
    pub targets: Vec<Target>,
    pub headers: BTreeMap<String, ColumnRole>,
    pub gate: GatePolicy,
}

/// Which analysis findings stop generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GatePolicy {
    pub block_on_cycles: bool,
    pub block_on_unresolved: bool,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self {
            block_on_cycles: true,
            block_on_unresolved: false,
        }
    }
}

impl Default for MigrationProfile {
    fn default() -> Self {
        Self {
            policy_name: DEFAULT_POLICY_NAME.to_string(),
            comment: None,
            targets: Vec::new(),
            headers: BTreeMap::new(),
            gate: GatePolicy::default(),
        }
    }
}

impl MigrationProfile {
    /// Header block for the generator; targets without a filter use the policy name.
    pub fn policy_header(&self) -> PolicyHeader {
        PolicyHeader {
            policy_name: self.policy_name.clone(),
            targets: self.targets.clone(),
            comment: self.comment.clone(),
        }
    }

    pub fn header_synonyms(&self) -> HeaderSynonyms {
        HeaderSynonyms::with_extra(self.headers.iter().map(|(text, role)| (text, *role)))
    }

    /// Rename the policy, retargeting filters that followed the old name.
    pub fn rename(&mut self, policy_name: impl Into<String>) {
        let policy_name = policy_name.into();
        for target in &mut self.targets {
            if target.filter == self.policy_name {
                target.filter = policy_name.clone();
            }
        }
        self.policy_name = policy_name;
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProfileFile {
    policy_name: Option<String>,
    comment: Option<String>,
    #[serde(default, rename = "target")]
    targets: Vec<TargetEntry>,
    #[serde(default)]
    headers: BTreeMap<String, ColumnRole>,
    #[serde(default)]
    gate: GatePolicy,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TargetEntry {
    platform: String,
    filter: Option<String>,
}

impl From<ProfileFile> for MigrationProfile {
    fn from(file: ProfileFile) -> Self {
        let policy_name = file
            .policy_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_POLICY_NAME.to_string());
        let targets = file
            .targets
            .into_iter()
            .map(|entry| Target {
                platform: entry.platform,
                filter: entry.filter.unwrap_or_else(|| policy_name.clone()),
            })
            .collect();
        Self {
            policy_name,
            comment: file.comment.filter(|c| !c.trim().is_empty()),
            targets,
            headers: file.headers,
            gate: file.gate,
        }
    }
}

/// Errors returned when loading profile files.
#[derive(Debug, Error)]
pub enum ProfileLoadError {
    #[error("failed to read profile {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse profile {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

/// Load a migration profile from a TOML file.
pub fn load_profile(path: &Path) -> Result<MigrationProfile, ProfileLoadError> {
    let raw = fs::read_to_string(path).map_err(|source| ProfileLoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_profile(&raw, path.display().to_string())
}

/// Built-in profile shipped with the binary.
pub fn default_profile() -> MigrationProfile {
    let embedded = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/profiles/default.toml"
    ));
    parse_profile(embedded, "embedded profile".to_string()).unwrap_or_default()
}

pub fn parse_profile(raw: &str, path: String) -> Result<MigrationProfile, ProfileLoadError> {
    let parsed: ProfileFile =
        toml::from_str(raw).map_err(|source| ProfileLoadError::Parse { path, source })?;
    Ok(parsed.into())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::{default_profile, load_profile, parse_profile, ProfileLoadError, DEFAULT_POLICY_NAME};
    use crate::generate::Target;
    use crate::headers::ColumnRole;

    #[test]
    fn embedded_profile_parses() {
        let profile = default_profile();
        assert_eq!(profile.policy_name, DEFAULT_POLICY_NAME);
        assert_eq!(
            profile.targets,
            vec![
                Target::new("cisco", DEFAULT_POLICY_NAME),
                Target::new("juniper", DEFAULT_POLICY_NAME)
            ]
        );
        assert!(profile.gate.block_on_cycles);
        assert!(!profile.gate.block_on_unresolved);
        assert_eq!(
            profile.header_synonyms().lookup("Zielsystem"),
            Some(ColumnRole::Destination)
        );
    }

    #[test]
    fn empty_profile_uses_defaults() {
        let profile = parse_profile("", "inline".into()).expect("parse");
        assert_eq!(profile.policy_name, DEFAULT_POLICY_NAME);
        assert!(profile.targets.is_empty());
        assert!(profile.comment.is_none());
        assert!(profile.gate.block_on_cycles);
        assert_eq!(
            profile.policy_header().effective_targets(),
            vec![
                Target::new("cisco", DEFAULT_POLICY_NAME),
                Target::new("juniper", DEFAULT_POLICY_NAME)
            ]
        );
    }

    #[test]
    fn explicit_filters_and_gate_override() {
        let raw = r#"
policy_name = "edge"

[[target]]
platform = "iptables"
filter = "INPUT"

[[target]]
platform = "nftables"

[gate]
block_on_unresolved = true
"#;
        let profile = parse_profile(raw, "inline".into()).expect("parse");
        assert_eq!(
            profile.targets,
            vec![Target::new("iptables", "INPUT"), Target::new("nftables", "edge")]
        );
        assert!(profile.gate.block_on_cycles);
        assert!(profile.gate.block_on_unresolved);
    }

    #[test]
    fn rename_moves_default_filters_only() {
        let raw = r#"
policy_name = "edge"

[[target]]
platform = "iptables"
filter = "INPUT"

[[target]]
platform = "cisco"
"#;
        let mut profile = parse_profile(raw, "inline".into()).expect("parse");
        profile.rename("core");
        assert_eq!(profile.policy_name, "core");
        assert_eq!(
            profile.targets,
            vec![Target::new("iptables", "INPUT"), Target::new("cisco", "core")]
        );
    }

    #[test]
    fn unknown_role_is_a_parse_error() {
        let err = parse_profile("[headers]\n\"owner\" = \"owner\"\n", "inline".into())
            .expect_err("bad role");
        assert!(matches!(err, ProfileLoadError::Parse { .. }));
    }

    #[test]
    fn loads_from_disk_and_reports_missing_files() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "policy_name = \"from-disk\"").expect("write");
        let profile = load_profile(file.path()).expect("load");
        assert_eq!(profile.policy_name, "from-disk");

        let err = load_profile(std::path::Path::new("/nonexistent/profile.toml"))
            .expect_err("missing");
        assert!(matches!(err, ProfileLoadError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/profile.toml"));
    }
}
