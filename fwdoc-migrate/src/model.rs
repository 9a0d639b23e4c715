//! Core data types shared by the parser, analyzer, extractor and generator.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use serde::Serialize;

use crate::address::is_literal_or_reserved;

/// Rule verdict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    #[default]
    Accept,
    Deny,
    Reject,
}

impl Action {
    /// Map free-text action wording onto a verdict.
    ///
    /// Unknown or empty values fall back to [`Action::Accept`], never to a
    /// blocking verdict.
    pub fn from_text(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "allow" | "permit" | "accept" => Self::Accept,
            "deny" | "drop" => Self::Deny,
            "reject" => Self::Reject,
            _ => Self::Accept,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Deny => "deny",
            Self::Reject => "reject",
        }
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single firewall rule as read from one table row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FirewallRule {
    pub name: String,
    pub source_addresses: Vec<String>,
    pub destination_addresses: Vec<String>,
    pub source_ports: Vec<String>,
    pub destination_ports: Vec<String>,
    pub protocols: Vec<String>,
    pub action: Action,
    pub comment: Option<String>,
    pub options: Vec<String>,
}

impl FirewallRule {
    /// Create an accept rule with no match criteria.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Named address set synthesized from repeated rule addressing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkObject {
    pub name: String,
    pub addresses: Vec<String>,
}

/// Named port/protocol set synthesized from repeated rule services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceDef {
    pub name: String,
    pub ports: Vec<String>,
    pub protocols: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Kind of a named entity definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Host,
    Network,
    Group,
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Host => "host",
            Self::Network => "network",
            Self::Group => "group",
        })
    }
}

/// One slot of a group membership list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Member {
    /// An address, prefix or the reserved `any`.
    Literal(String),
    /// The name of another host, network or group.
    Reference(String),
}

impl Member {
    /// Classify a raw membership token by its shape.
    pub fn parse(token: &str) -> Self {
        let token = token.trim();
        if is_literal_or_reserved(token) {
            Self::Literal(token.to_string())
        } else {
            Self::Reference(token.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Literal(value) | Self::Reference(value) => value,
        }
    }

    pub fn reference(&self) -> Option<&str> {
        match self {
            Self::Reference(name) => Some(name),
            Self::Literal(_) => None,
        }
    }
}

impl Display for Member {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host, network and group definitions read from one document.
///
/// A name is stored in at most one of the three maps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EntityDefinitions {
    /// Host FQDN to IP literal.
    pub hosts: BTreeMap<String, String>,
    /// Network name to CIDR literal.
    pub networks: BTreeMap<String, String>,
    /// Group name to ordered membership.
    pub groups: BTreeMap<String, Vec<Member>>,
}

impl EntityDefinitions {
    pub fn kind_of(&self, name: &str) -> Option<EntityKind> {
        if self.hosts.contains_key(name) {
            Some(EntityKind::Host)
        } else if self.networks.contains_key(name) {
            Some(EntityKind::Network)
        } else if self.groups.contains_key(name) {
            Some(EntityKind::Group)
        } else {
            None
        }
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.kind_of(name).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty() && self.networks.is_empty() && self.groups.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hosts.len() + self.networks.len() + self.groups.len()
    }

    /// Add a group from raw member tokens, classifying each one.
    pub fn insert_group<I, S>(&mut self, name: impl Into<String>, members: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let members = members
            .into_iter()
            .map(|token| Member::parse(token.as_ref()))
            .collect();
        self.groups.insert(name.into(), members);
    }
}

#[cfg(test)]
mod tests {
    use super::{Action, EntityDefinitions, EntityKind, FirewallRule, Member};

    #[test]
    fn action_mapping_defaults_to_accept() {
        assert_eq!(Action::from_text("Allow"), Action::Accept);
        assert_eq!(Action::from_text("permit"), Action::Accept);
        assert_eq!(Action::from_text(" DROP "), Action::Deny);
        assert_eq!(Action::from_text("deny"), Action::Deny);
        assert_eq!(Action::from_text("reject"), Action::Reject);
        assert_eq!(Action::from_text("block-ish"), Action::Accept);
        assert_eq!(Action::from_text(""), Action::Accept);
    }

    #[test]
    fn new_rule_is_empty_accept() {
        let rule = FirewallRule::new("test-rule");
        assert_eq!(rule.name, "test-rule");
        assert_eq!(rule.action, Action::Accept);
        assert!(rule.source_addresses.is_empty());
    }

    #[test]
    fn members_split_into_literals_and_references() {
        assert_eq!(Member::parse("10.0.0.1"), Member::Literal("10.0.0.1".into()));
        assert_eq!(Member::parse("any"), Member::Literal("any".into()));
        assert_eq!(
            Member::parse(" DMZ "),
            Member::Reference("DMZ".to_string())
        );
        assert_eq!(Member::parse("DMZ").reference(), Some("DMZ"));
    }

    #[test]
    fn kind_lookup_covers_all_namespaces() {
        let mut defs = EntityDefinitions::default();
        defs.hosts.insert("web.de".into(), "10.0.0.1".into());
        defs.networks.insert("DMZ".into(), "172.16.0.0/12".into());
        defs.insert_group("All", ["web.de", "DMZ"]);

        assert_eq!(defs.kind_of("web.de"), Some(EntityKind::Host));
        assert_eq!(defs.kind_of("DMZ"), Some(EntityKind::Network));
        assert_eq!(defs.kind_of("All"), Some(EntityKind::Group));
        assert_eq!(defs.kind_of("missing"), None);
        assert_eq!(defs.len(), 3);
    }
}
