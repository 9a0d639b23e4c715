//! Cross-reference analysis over host, network and group definitions.
//!
//! Groups reference other entities by name. This module builds the
//! group → member graph, reports names that are referenced but never defined,
//! finds membership cycles, and lists what each group transitively pulls in.
//! Cycles and dangling references are reported as data; analysis never fails.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt::Write as _;

use serde::Serialize;

use crate::model::{EntityDefinitions, EntityKind};

/// Result of one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DependencyReport {
    pub definitions: BTreeMap<String, EntityKind>,
    pub references: BTreeSet<String>,
    pub unresolved: BTreeSet<String>,
    pub cycles: Vec<Vec<String>>,
    pub dependency_chains: BTreeMap<String, Vec<String>>,
    pub max_depth: usize,
}

impl DependencyReport {
    /// True when every reference is defined and no group is cyclic.
    pub fn is_resolvable(&self) -> bool {
        self.unresolved.is_empty() && self.cycles.is_empty()
    }

    /// Human-readable multi-section report.
    pub fn format_report(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Dependency Analysis Report");
        let _ = writeln!(out, "==========================");
        let _ = writeln!(out);

        let _ = writeln!(out, "Definitions ({}):", self.definitions.len());
        for (name, kind) in &self.definitions {
            let _ = writeln!(out, "  {name} ({kind})");
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "References: {}", self.references.len());
        let _ = writeln!(out);

        let _ = writeln!(out, "Unresolved ({}):", self.unresolved.len());
        if self.unresolved.is_empty() {
            let _ = writeln!(out, "  none");
        }
        for name in &self.unresolved {
            let _ = writeln!(out, "  {name}");
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "Cycles ({}):", self.cycles.len());
        if self.cycles.is_empty() {
            let _ = writeln!(out, "  none");
        }
        for cycle in &self.cycles {
            let _ = writeln!(out, "  {}", cycle.join(" -> "));
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "Dependency Chains (max depth {}):", self.max_depth);
        for (group, chain) in &self.dependency_chains {
            if chain.is_empty() {
                let _ = writeln!(out, "  {group}: (no references)");
            } else {
                let _ = writeln!(out, "  {group}: {}", chain.join(", "));
            }
        }
        out
    }
}

/// Stateless analyzer; every call builds a fresh report.
#[derive(Debug, Clone, Copy, Default)]
pub struct DependencyAnalyzer;

impl DependencyAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, definitions: &EntityDefinitions) -> DependencyReport {
        let mut report = DependencyReport::default();

        for name in definitions.hosts.keys() {
            report.definitions.insert(name.clone(), EntityKind::Host);
        }
        for name in definitions.networks.keys() {
            report.definitions.insert(name.clone(), EntityKind::Network);
        }
        for name in definitions.groups.keys() {
            report.definitions.insert(name.clone(), EntityKind::Group);
        }

        let graph = ReferenceGraph::build(definitions);
        for targets in graph.edges.values() {
            for target in targets {
                report.references.insert(target.to_string());
                if !definitions.is_defined(target) {
                    report.unresolved.insert(target.to_string());
                }
            }
        }

        report.cycles = graph.find_cycles();

        for group in definitions.groups.keys() {
            let chain = graph.reachable_from(group);
            report.max_depth = report.max_depth.max(chain.len());
            report.dependency_chains.insert(group.clone(), chain);
        }

        report
    }
}

/// Group → referenced names, in member order. Only groups have edges.
struct ReferenceGraph<'a> {
    edges: BTreeMap<&'a str, Vec<&'a str>>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

impl<'a> ReferenceGraph<'a> {
    fn build(definitions: &'a EntityDefinitions) -> Self {
        let edges = definitions
            .groups
            .iter()
            .map(|(name, members)| {
                let mut targets: Vec<&str> = Vec::new();
                for target in members.iter().filter_map(|member| member.reference()) {
                    if !targets.contains(&target) {
                        targets.push(target);
                    }
                }
                (name.as_str(), targets)
            })
            .collect();
        Self { edges }
    }

    fn find_cycles(&self) -> Vec<Vec<String>> {
        let mut state: HashMap<&str, Visit> = HashMap::new();
        let mut path: Vec<&str> = Vec::new();
        let mut seen: HashSet<BTreeSet<&str>> = HashSet::new();
        let mut cycles = Vec::new();

        for &start in self.edges.keys() {
            if !state.contains_key(start) {
                self.visit(start, &mut state, &mut path, &mut seen, &mut cycles);
            }
        }
        cycles
    }

    fn visit(
        &self,
        node: &'a str,
        state: &mut HashMap<&'a str, Visit>,
        path: &mut Vec<&'a str>,
        seen: &mut HashSet<BTreeSet<&'a str>>,
        cycles: &mut Vec<Vec<String>>,
    ) {
        state.insert(node, Visit::InProgress);
        path.push(node);

        for &next in self.edges.get(node).into_iter().flatten() {
            match state.get(next) {
                Some(Visit::InProgress) => {
                    let Some(start) = path.iter().position(|&n| n == next) else {
                        continue;
                    };
                    let members: BTreeSet<&str> = path[start..].iter().copied().collect();
                    if seen.insert(members) {
                        let mut cycle: Vec<String> =
                            path[start..].iter().map(|n| n.to_string()).collect();
                        cycle.push(next.to_string());
                        cycles.push(cycle);
                    }
                }
                Some(Visit::Done) => {}
                None if self.edges.contains_key(next) => {
                    self.visit(next, state, path, seen, cycles);
                }
                None => {}
            }
        }

        path.pop();
        state.insert(node, Visit::Done);
    }

    /// Pre-order list of every name reachable from `group`, each once.
    fn reachable_from(&self, group: &str) -> Vec<String> {
        let mut visited: HashSet<&str> = HashSet::from([group]);
        let mut chain = Vec::new();
        let mut stack: Vec<&str> = self
            .edges
            .get(group)
            .map(|targets| targets.iter().rev().copied().collect())
            .unwrap_or_default();

        while let Some(name) = stack.pop() {
            if !visited.insert(name) {
                continue;
            }
            chain.push(name.to_string());
            if let Some(targets) = self.edges.get(name) {
                stack.extend(targets.iter().rev().copied());
            }
        }
        chain
    }
}
