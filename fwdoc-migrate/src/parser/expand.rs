use std::collections::HashMap;

use tracing::warn;

use crate::model::EntityDefinitions;
use crate::parser::rows::push_unique;

/// Replace entity names in an address list with their literals.
///
/// Hosts and networks become their IP/CIDR, groups expand recursively in
/// member order. Tokens that name nothing pass through unchanged. The result
/// keeps the first occurrence of each address.
pub fn expand_addresses(tokens: &[String], definitions: &EntityDefinitions) -> Vec<String> {
    AddressExpander::new(definitions).expand(tokens)
}

/// Group expansion that remembers each group it has fully resolved.
///
/// One expander can serve every rule of a document, so groups shared
/// between rules or reached through several members are walked once.
#[derive(Debug)]
pub struct AddressExpander<'a> {
    definitions: &'a EntityDefinitions,
    resolved: HashMap<&'a str, Vec<String>>,
}

impl<'a> AddressExpander<'a> {
    pub fn new(definitions: &'a EntityDefinitions) -> Self {
        Self {
            definitions,
            resolved: HashMap::new(),
        }
    }

    /// Expand one address list. See [`expand_addresses`].
    pub fn expand(&mut self, tokens: &[String]) -> Vec<String> {
        let mut out = Vec::new();
        for token in tokens {
            let mut path = Vec::new();
            let (addresses, _) = self.resolve(token, &mut path);
            for address in addresses {
                push_unique(&mut out, address);
            }
        }
        out
    }

    /// Resolve `token` below the groups on `path`. The flag is false when
    /// the walk ran into a group already on `path`; such results depend on
    /// the path and are not remembered.
    fn resolve(&mut self, token: &str, path: &mut Vec<&'a str>) -> (Vec<String>, bool) {
        let definitions = self.definitions;
        if let Some(ip) = definitions.hosts.get(token) {
            return (vec![ip.clone()], true);
        }
        if let Some(cidr) = definitions.networks.get(token) {
            return (vec![cidr.clone()], true);
        }
        let Some((name, members)) = definitions.groups.get_key_value(token) else {
            return (vec![token.to_string()], true);
        };
        let name = name.as_str();
        if path.contains(&name) {
            return (Vec::new(), false);
        }
        if let Some(cached) = self.resolved.get(name) {
            return (cached.clone(), true);
        }

        path.push(name);
        let mut out = Vec::new();
        let mut complete = true;
        for member in members {
            let (addresses, member_complete) = self.resolve(member.as_str(), path);
            complete &= member_complete;
            for address in addresses {
                push_unique(&mut out, address);
            }
        }
        path.pop();

        // A named group never expands to an empty list.
        if out.is_empty() {
            warn!(group = name, "group expands to no addresses; keeping its name");
            out.push(name.to_string());
        }
        if complete {
            self.resolved.insert(name, out.clone());
        }
        (out, complete)
    }
}
