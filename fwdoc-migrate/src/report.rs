use colored::Colorize;

use crate::dependency::DependencyReport;
use crate::headers::TableKind;
use crate::parser::TableSummary;
use crate::pipeline::{GateDecision, MigrationOutput};

/// Render extracted tables, one line per table.
pub fn render_tables(tables: &[TableSummary]) -> String {
    let mut out = Vec::new();
    for table in tables {
        let kind = match table.kind {
            TableKind::Unclassified => table.kind.to_string().yellow().to_string(),
            _ => table.kind.to_string().cyan().to_string(),
        };
        let mut line = format!(
            "table #{} {kind} records={} skipped={} headers=[{}]",
            table.index,
            table.records,
            table.skipped_rows,
            table.headers.join(" | ")
        );
        if table.skipped_rows > 0 {
            line = line.yellow().to_string();
        }
        out.push(line);
    }
    out.join("\n")
}

/// Render the dependency report with findings highlighted.
pub fn render_dependency_report(report: &DependencyReport) -> String {
    let text = report.format_report();
    let mut section = "";
    let mut out = Vec::new();
    for line in text.lines() {
        if !line.starts_with(' ') && !line.is_empty() {
            section = line;
            out.push(line.bold().to_string());
            continue;
        }
        let colored = if line.trim() == "none" {
            line.green().to_string()
        } else if section.starts_with("Cycles") {
            line.red().to_string()
        } else if section.starts_with("Unresolved") {
            line.yellow().to_string()
        } else {
            line.to_string()
        };
        out.push(colored);
    }
    out.join("\n")
}

/// One-line gate verdict.
pub fn render_gate(gate: &GateDecision) -> String {
    if gate.passed() {
        return "gate: passed".green().to_string();
    }
    let reasons: Vec<String> = gate.blocked_by.iter().map(|r| r.to_string()).collect();
    format!("gate: blocked by {}", reasons.join(", "))
        .red()
        .to_string()
}

/// Summary counts after a conversion.
pub fn render_summary(output: &MigrationOutput) -> String {
    format!(
        "rules={} hosts={} networks={} groups={} network_objects={} service_objects={}",
        output.document.rules.len(),
        output.document.definitions.hosts.len(),
        output.document.definitions.networks.len(),
        output.document.definitions.groups.len(),
        output.objects.networks.len(),
        output.objects.services.len()
    )
    .cyan()
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::{render_gate, render_tables};
    use crate::headers::TableKind;
    use crate::parser::TableSummary;
    use crate::pipeline::{BlockReason, GateDecision};

    #[test]
    fn gate_lists_reasons() {
        colored::control::set_override(false);
        let gate = GateDecision {
            blocked_by: vec![BlockReason::Cycles, BlockReason::Unresolved],
        };
        assert_eq!(
            render_gate(&gate),
            "gate: blocked by cyclic group membership, unresolved references"
        );
        assert_eq!(render_gate(&GateDecision::default()), "gate: passed");
    }

    #[test]
    fn table_lines_carry_counts() {
        colored::control::set_override(false);
        let text = render_tables(&[TableSummary {
            index: 2,
            kind: TableKind::Hosts,
            headers: vec!["FQDN".into(), "IP-Adresse".into()],
            roles: Vec::new(),
            records: 3,
            skipped_rows: 1,
        }]);
        assert_eq!(
            text,
            "table #2 hosts records=3 skipped=1 headers=[FQDN | IP-Adresse]"
        );
    }
}
