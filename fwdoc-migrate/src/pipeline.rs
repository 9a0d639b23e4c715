//! End-to-end migration of one document.

use std::fmt::{self, Display, Formatter};

use serde::Serialize;
use tracing::{info, warn};

use crate::dependency::{DependencyAnalyzer, DependencyReport};
use crate::extract::{ExtractedObjects, ObjectExtractor};
use crate::generate::PolicyGenerator;
use crate::parser::{ParseError, ParsedDocument, TableParser};
use crate::profile::{GatePolicy, MigrationProfile};

/// Why generation was held back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockReason {
    Cycles,
    Unresolved,
}

impl Display for BlockReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cycles => "cyclic group membership",
            Self::Unresolved => "unresolved references",
        })
    }
}

/// Outcome of checking a dependency report against a gate policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GateDecision {
    pub blocked_by: Vec<BlockReason>,
}

impl GateDecision {
    pub fn evaluate(report: &DependencyReport, policy: &GatePolicy) -> Self {
        let mut blocked_by = Vec::new();
        if policy.block_on_cycles && !report.cycles.is_empty() {
            blocked_by.push(BlockReason::Cycles);
        }
        if policy.block_on_unresolved && !report.unresolved.is_empty() {
            blocked_by.push(BlockReason::Unresolved);
        }
        Self { blocked_by }
    }

    pub fn passed(&self) -> bool {
        self.blocked_by.is_empty()
    }
}

/// Generated file bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedPolicy {
    pub policy: String,
    pub networks: String,
    pub services: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationOutput {
    pub document: ParsedDocument,
    pub report: DependencyReport,
    pub gate: GateDecision,
    pub objects: ExtractedObjects,
    /// `None` when the gate blocked generation.
    pub generated: Option<GeneratedPolicy>,
}

/// Parse, analyze, gate, extract and generate.
///
/// Analysis findings never make this fail; they show up in `report` and,
/// depending on the profile's gate, suppress `generated`.
pub fn migrate(markup: &str, profile: &MigrationProfile) -> Result<MigrationOutput, ParseError> {
    let parser = TableParser::with_synonyms(profile.header_synonyms());
    let document = parser.parse_document(markup)?;
    info!(
        tables = document.tables.len(),
        rules = document.rules.len(),
        definitions = document.definitions.len(),
        "parsed document"
    );

    let report = DependencyAnalyzer::new().analyze(&document.definitions);
    let gate = GateDecision::evaluate(&report, &profile.gate);
    if !gate.passed() {
        for reason in &gate.blocked_by {
            warn!(%reason, "generation blocked");
        }
        return Ok(MigrationOutput {
            document,
            report,
            gate,
            objects: ExtractedObjects::default(),
            generated: None,
        });
    }

    let objects = ObjectExtractor::new().extract(&document.rules);
    let generator = PolicyGenerator::new(objects.networks.clone(), objects.services.clone());
    let generated = GeneratedPolicy {
        policy: generator.generate_policy(&document.rules, &profile.policy_header()),
        networks: generator.generate_network_definitions(),
        services: generator.generate_service_definitions(),
    };
    info!(
        networks = objects.networks.len(),
        services = objects.services.len(),
        "generated policy"
    );

    Ok(MigrationOutput {
        document,
        report,
        gate,
        objects,
        generated: Some(generated),
    })
}

#[cfg(test)]
mod tests {
    use super::{migrate, BlockReason};
    use crate::profile::MigrationProfile;

    const CYCLIC: &str = r#"
    <table>
      <tr><th>Name</th><th>Mitglieder</th></tr>
      <tr><td>Group-A</td><td>Group-B</td></tr>
      <tr><td>Group-B</td><td>Group-A</td></tr>
    </table>
    <table>
      <tr><th>Rule</th><th>Source</th><th>Destination</th><th>Action</th></tr>
      <tr><td>loop</td><td>Group-A</td><td>any</td><td>allow</td></tr>
    </table>"#;

    #[test]
    fn cycles_block_generation_by_default() {
        let output = migrate(CYCLIC, &MigrationProfile::default()).expect("migrate");
        assert_eq!(output.gate.blocked_by, vec![BlockReason::Cycles]);
        assert!(output.generated.is_none());
        assert_eq!(output.report.cycles.len(), 1);
        assert_eq!(output.document.rules.len(), 1);
    }

    #[test]
    fn gate_can_be_relaxed() {
        let mut profile = MigrationProfile::default();
        profile.gate.block_on_cycles = false;
        let output = migrate(CYCLIC, &profile).expect("migrate");
        assert!(output.gate.passed());
        let generated = output.generated.expect("generated");
        assert!(generated.policy.contains("term loop {"));
        assert!(!generated.policy.contains("source-address:: \n"));
    }

    #[test]
    fn unresolved_blocks_only_when_asked() {
        let html = r#"
        <table>
          <tr><th>Name</th><th>Members</th></tr>
          <tr><td>WS</td><td>10.0.0.0/8, Missing</td></tr>
        </table>"#;
        let output = migrate(html, &MigrationProfile::default()).expect("migrate");
        assert!(output.gate.passed());

        let mut strict = MigrationProfile::default();
        strict.gate.block_on_unresolved = true;
        let output = migrate(html, &strict).expect("migrate");
        assert_eq!(output.gate.blocked_by, vec![BlockReason::Unresolved]);
    }

    #[test]
    fn profile_synonyms_reach_the_parser() {
        let html = r#"
        <table>
          <tr><th>Rule</th><th>Zielsystem</th><th>Action</th></tr>
          <tr><td>r1</td><td>10.0.0.1</td><td>deny</td></tr>
        </table>"#;
        let mut profile = MigrationProfile::default();
        profile
            .headers
            .insert("Zielsystem".into(), crate::headers::ColumnRole::Destination);
        let output = migrate(html, &profile).expect("migrate");
        assert_eq!(output.document.rules.len(), 1);
        assert_eq!(output.document.rules[0].destination_addresses, vec!["10.0.0.1"]);
    }

    #[test]
    fn any_source_stays_a_keyword() {
        let html = r#"
        <table>
          <tr><th>Rule</th><th>Source</th><th>Destination</th><th>Action</th></tr>
          <tr><td>r1</td><td>any</td><td>10.0.0.1</td><td>accept</td></tr>
          <tr><td>r2</td><td>any</td><td>10.0.0.2</td><td>accept</td></tr>
        </table>"#;
        let output = migrate(html, &MigrationProfile::default()).expect("migrate");
        let generated = output.generated.expect("generated");
        assert!(output.objects.networks.is_empty());
        assert!(generated.policy.contains("  source-address:: any\n"));
        assert!(!generated.networks.contains("any"));
    }
}
