use once_cell::sync::Lazy;
use regex::Regex;

use crate::parser::rows::{push_unique, tokenize};

static PORT_PROTOCOL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+(?:-\d+)?)\s*/\s*([A-Za-z][A-Za-z0-9]*)").expect("valid port/protocol")
});
static ANNOTATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\([^)]*\)").expect("valid annotation pattern"));
static BARE_PORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(-\d+)?$").expect("valid bare port pattern"));

/// Ports and protocols read from one port cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortSpec {
    pub ports: Vec<String>,
    pub protocols: Vec<String>,
}

/// Parse a port cell.
///
/// Cells written as `80/tcp (HTTP) 443/tcp (HTTPS)` yield every `port/proto`
/// pair, de-duplicated in first-seen order; annotations in parentheses are
/// dropped, and bare numeric ports next to pairs are kept. Any other cell is
/// tokenized as a plain port list with no protocols.
pub fn parse_port_cell(raw: &str) -> PortSpec {
    let mut spec = PortSpec::default();
    if !PORT_PROTOCOL.is_match(raw) {
        spec.ports = tokenize(raw);
        return spec;
    }

    for caps in PORT_PROTOCOL.captures_iter(raw) {
        push_unique(&mut spec.ports, &caps[1]);
        push_unique(&mut spec.protocols, caps[2].to_lowercase());
    }

    let rest = PORT_PROTOCOL.replace_all(raw, " ");
    let rest = ANNOTATION.replace_all(&rest, " ");
    for token in tokenize(&rest) {
        if BARE_PORT.is_match(&token) {
            push_unique(&mut spec.ports, token);
        }
    }
    spec
}
