//! Reusable object extraction.
//!
//! Address lists and port/protocol combinations that repeat across rules, or
//! that bundle several addresses, become named objects the generator can
//! reference instead of inlining literals.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::Serialize;

use crate::address::{is_cidr_shaped, is_reserved};
use crate::model::{FirewallRule, NetworkObject, ServiceDef};

/// Exact-match key for an address or port list: sorted, de-duplicated tokens.
pub(crate) fn set_key(tokens: &[String]) -> Vec<String> {
    tokens
        .iter()
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Networks and services extracted from one rule list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedObjects {
    pub networks: Vec<NetworkObject>,
    pub services: Vec<ServiceDef>,
}

/// Detects repeated address and service sets in a rule list.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectExtractor;

impl ObjectExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, rules: &[FirewallRule]) -> ExtractedObjects {
        ExtractedObjects {
            networks: self.extract_network_objects(rules),
            services: self.extract_service_objects(rules),
        }
    }

    /// One object per address set that holds several addresses or shows up
    /// at least twice across source and destination lists.
    pub fn extract_network_objects(&self, rules: &[FirewallRule]) -> Vec<NetworkObject> {
        let mut tally = Tally::default();
        for rule in rules {
            for addresses in [&rule.source_addresses, &rule.destination_addresses] {
                // `any` stays a keyword in the policy, never an object.
                if addresses.iter().all(|address| is_reserved(address)) {
                    continue;
                }
                tally.record(set_key(addresses), || dedup(addresses));
            }
        }

        let mut names = NameAllocator::default();
        tally
            .into_entries()
            .filter(|(addresses, count)| *count >= 2 || addresses.len() > 1)
            .map(|(addresses, _)| NetworkObject {
                name: names.allocate(network_base_name(&addresses)),
                addresses,
            })
            .collect()
    }

    /// One service per port/protocol combination used by at least two rules.
    pub fn extract_service_objects(&self, rules: &[FirewallRule]) -> Vec<ServiceDef> {
        let mut tally = Tally::default();
        for rule in rules {
            if rule.destination_ports.is_empty() || rule.protocols.is_empty() {
                continue;
            }
            let mut key = set_key(&rule.destination_ports);
            key.push(String::new());
            key.extend(set_key(&rule.protocols));
            tally.record(key, || {
                (dedup(&rule.destination_ports), dedup(&rule.protocols))
            });
        }

        let mut names = NameAllocator::default();
        tally
            .into_entries()
            .filter(|(_, count)| *count >= 2)
            .map(|((ports, protocols), _)| ServiceDef {
                name: names.allocate(service_base_name(&ports, &protocols)),
                ports,
                protocols,
                description: None,
            })
            .collect()
    }
}

/// Occurrence counts per key, remembering first-seen order and value.
struct Tally<T> {
    order: Vec<(T, usize)>,
    index: HashMap<Vec<String>, usize>,
}

impl<T> Default for Tally<T> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T> Tally<T> {
    fn record(&mut self, key: Vec<String>, value: impl FnOnce() -> T) {
        match self.index.get(&key) {
            Some(&pos) => self.order[pos].1 += 1,
            None => {
                self.index.insert(key, self.order.len());
                self.order.push((value(), 1));
            }
        }
    }

    fn into_entries(self) -> impl Iterator<Item = (T, usize)> {
        self.order.into_iter()
    }
}

#[derive(Default)]
struct NameAllocator {
    used: HashSet<String>,
}

impl NameAllocator {
    fn allocate(&mut self, base: String) -> String {
        let mut name = base.clone();
        let mut counter = 1;
        while self.used.contains(&name) {
            name = format!("{base}_{counter}");
            counter += 1;
        }
        self.used.insert(name.clone());
        name
    }
}

fn dedup(tokens: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tokens.len());
    for token in tokens {
        if !out.contains(token) {
            out.push(token.clone());
        }
    }
    out
}

fn identifier(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

fn network_base_name(addresses: &[String]) -> String {
    match addresses {
        [single] if is_cidr_shaped(single) => {
            let network = single.split('/').next().unwrap_or(single);
            format!("NET_{}", identifier(network))
        }
        [single] => format!("HOST_{}", identifier(single)),
        many => format!("NET_GROUP_{}", many.len()),
    }
}

fn service_base_name(ports: &[String], protocols: &[String]) -> String {
    match (ports, protocols) {
        ([port], [protocol]) => {
            format!("SVC_{}_{}", identifier(&protocol.to_uppercase()), identifier(port))
        }
        (_, [protocol]) => format!("SVC_{}_MULTI", identifier(&protocol.to_uppercase())),
        _ => format!("SVC_GROUP_{}", ports.len()),
    }
}
