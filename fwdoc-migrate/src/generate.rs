//! Policy text generation.
//!
//! Renders rules as `term` blocks under a `header` block, substituting named
//! network and service objects where a rule's address or port set matches one
//! exactly. Also renders the matching `.net` and `.svc` definition bodies.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::extract::set_key;
use crate::model::{FirewallRule, NetworkObject, ServiceDef};

/// Platforms emitted when the header names none.
pub const DEFAULT_PLATFORMS: [&str; 2] = ["cisco", "juniper"];

/// One `target::` line: platform plus filter name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub platform: String,
    pub filter: String,
}

impl Target {
    pub fn new(platform: impl Into<String>, filter: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            filter: filter.into(),
        }
    }
}

/// Contents of the policy `header` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyHeader {
    pub policy_name: String,
    pub targets: Vec<Target>,
    pub comment: Option<String>,
}

impl PolicyHeader {
    pub fn new(policy_name: impl Into<String>) -> Self {
        Self {
            policy_name: policy_name.into(),
            targets: Vec::new(),
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_targets(mut self, targets: Vec<Target>) -> Self {
        self.targets = targets;
        self
    }

    /// Configured targets, or one per default platform filtering on the policy name.
    pub fn effective_targets(&self) -> Vec<Target> {
        if !self.targets.is_empty() {
            return self.targets.clone();
        }
        DEFAULT_PLATFORMS
            .iter()
            .map(|platform| Target::new(*platform, self.policy_name.clone()))
            .collect()
    }
}

/// Renders policy and definition text from rules and extracted objects.
#[derive(Debug, Clone, Default)]
pub struct PolicyGenerator {
    networks: Vec<NetworkObject>,
    services: Vec<ServiceDef>,
    network_by_set: HashMap<Vec<String>, String>,
    service_by_set: HashMap<(Vec<String>, Vec<String>), String>,
}

impl PolicyGenerator {
    pub fn new(networks: Vec<NetworkObject>, services: Vec<ServiceDef>) -> Self {
        let mut networks = networks;
        let mut services = services;
        networks.sort_by(|a, b| a.name.cmp(&b.name));
        services.sort_by(|a, b| a.name.cmp(&b.name));

        let mut network_by_set = HashMap::new();
        for object in &networks {
            network_by_set
                .entry(set_key(&object.addresses))
                .or_insert_with(|| object.name.clone());
        }
        let mut service_by_set = HashMap::new();
        for service in &services {
            service_by_set
                .entry((set_key(&service.ports), set_key(&service.protocols)))
                .or_insert_with(|| service.name.clone());
        }

        Self {
            networks,
            services,
            network_by_set,
            service_by_set,
        }
    }

    pub fn generate_policy(&self, rules: &[FirewallRule], header: &PolicyHeader) -> String {
        let mut lines = vec!["header {".to_string()];
        if let Some(comment) = &header.comment {
            for line in comment.lines() {
                lines.push(format!("  comment:: \"{}\"", quote_safe(line)));
            }
        }
        for target in header.effective_targets() {
            lines.push(format!("  target:: {} {}", target.platform, target.filter));
        }
        lines.push("}".to_string());
        lines.push(String::new());

        for rule in rules {
            self.push_term(rule, &mut lines);
            lines.push(String::new());
        }
        lines.join("\n")
    }

    fn push_term(&self, rule: &FirewallRule, lines: &mut Vec<String>) {
        lines.push(format!("term {} {{", rule.name));
        if let Some(comment) = rule.comment.as_deref().filter(|c| !c.is_empty()) {
            lines.push(format!("  comment:: \"{}\"", quote_safe(comment)));
        }
        if !rule.source_addresses.is_empty() {
            lines.push(format!(
                "  source-address:: {}",
                self.address_reference(&rule.source_addresses)
            ));
        }
        if !rule.destination_addresses.is_empty() {
            lines.push(format!(
                "  destination-address:: {}",
                self.address_reference(&rule.destination_addresses)
            ));
        }
        if !rule.source_ports.is_empty() {
            lines.push(format!("  source-port:: {}", rule.source_ports.join(" ")));
        }
        if !rule.destination_ports.is_empty() {
            lines.push(format!(
                "  destination-port:: {}",
                self.port_reference(&rule.destination_ports, &rule.protocols)
            ));
        }
        if !rule.protocols.is_empty() {
            lines.push(format!("  protocol:: {}", rule.protocols.join(" ")));
        }
        if !rule.options.is_empty() {
            lines.push(format!("  option:: {}", rule.options.join(" ")));
        }
        lines.push(format!("  action:: {}", rule.action));
        lines.push("}".to_string());
    }

    fn address_reference(&self, addresses: &[String]) -> String {
        self.network_by_set
            .get(&set_key(addresses))
            .cloned()
            .unwrap_or_else(|| addresses.join(" "))
    }

    fn port_reference(&self, ports: &[String], protocols: &[String]) -> String {
        self.service_by_set
            .get(&(set_key(ports), set_key(protocols)))
            .cloned()
            .unwrap_or_else(|| ports.join(" "))
    }

    /// `.net` body: objects sorted by name, one address per line.
    pub fn generate_network_definitions(&self) -> String {
        let mut lines = Vec::new();
        for object in &self.networks {
            push_definition(&mut lines, &object.name, object.addresses.iter().cloned());
        }
        lines.join("\n")
    }

    /// `.svc` body: every `port/protocol` pair of each service.
    pub fn generate_service_definitions(&self) -> String {
        let mut lines = Vec::new();
        for service in &self.services {
            let pairs = service.ports.iter().flat_map(|port| {
                service
                    .protocols
                    .iter()
                    .map(move |protocol| format!("{port}/{protocol}"))
            });
            push_definition(&mut lines, &service.name, pairs);
        }
        lines.join("\n")
    }
}

fn push_definition(lines: &mut Vec<String>, name: &str, values: impl Iterator<Item = String>) {
    let indent = " ".repeat(name.len() + 3);
    let mut values = values.peekable();
    if values.peek().is_none() {
        return;
    }
    for (idx, value) in values.enumerate() {
        if idx == 0 {
            lines.push(format!("{name} = {value}"));
        } else {
            lines.push(format!("{indent}{value}"));
        }
    }
    lines.push(String::new());
}

fn quote_safe(text: &str) -> String {
    text.replace('"', "'")
}
