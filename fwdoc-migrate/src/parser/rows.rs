//! Row-level parsing: one table row to one rule or entity definition.

use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::headers::{ColumnMap, ColumnRole, TableKind};
use crate::model::{Action, FirewallRule, Member};
use crate::parser::ports::parse_port_cell;

static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[,;\s]+").expect("valid separator"));
static INVALID_NAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_-]").expect("valid name filter"));
static DASH_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").expect("valid dash pattern"));

/// A single row that could not be turned into a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("{kind} row has no {field} value")]
    MissingField { kind: TableKind, field: ColumnRole },
}

/// Split a cell on commas, semicolons and whitespace, dropping empty tokens.
pub fn tokenize(raw: &str) -> Vec<String> {
    SEPARATORS
        .split(raw)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

fn tokenize_lower(raw: &str) -> Vec<String> {
    tokenize(&raw.to_lowercase())
}

/// Turn free text into a policy term identifier.
///
/// Characters outside `[A-Za-z0-9_-]` become `-`, runs of `-` collapse, leading
/// and trailing `-` are trimmed, and the result is lower-cased.
pub fn normalize_name(raw: &str) -> String {
    let replaced = INVALID_NAME_CHARS.replace_all(raw, "-");
    let collapsed = DASH_RUNS.replace_all(&replaced, "-");
    collapsed.trim_matches('-').to_lowercase()
}

/// Stable identifier for an unnamed row: `rule-` plus 8 hex chars of SHA-256.
pub fn synthetic_rule_name(row: &[String]) -> String {
    let digest = Sha256::digest(row.concat().as_bytes());
    format!("rule-{}", hex::encode(&digest[..4]))
}

pub fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|cell| cell.trim().is_empty())
}

pub(crate) fn push_unique(out: &mut Vec<String>, value: impl Into<String>) {
    let value = value.into();
    if !out.contains(&value) {
        out.push(value);
    }
}

/// Parse a rule row. Returns `None` for blank rows.
pub fn parse_rule_row(row: &[String], columns: &ColumnMap) -> Option<FirewallRule> {
    if is_blank_row(row) {
        return None;
    }

    let name = columns
        .value(ColumnRole::Name, row)
        .map(normalize_name)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| synthetic_rule_name(row));
    let mut rule = FirewallRule::new(name);

    if let Some(source) = columns.value(ColumnRole::Source, row) {
        rule.source_addresses = tokenize(source);
    }
    if let Some(destination) = columns.value(ColumnRole::Destination, row) {
        rule.destination_addresses = tokenize(destination);
    }
    if let Some(ports) = columns.value(ColumnRole::SourcePort, row) {
        rule.source_ports = tokenize(ports);
    }

    let ports = columns
        .value(ColumnRole::Port, row)
        .map(parse_port_cell)
        .unwrap_or_default();
    let mut protocols = columns
        .value(ColumnRole::Protocol, row)
        .map(tokenize_lower)
        .unwrap_or_default();
    for protocol in ports.protocols {
        push_unique(&mut protocols, protocol);
    }
    rule.destination_ports = ports.ports;
    rule.protocols = protocols;

    if let Some(action) = columns.value(ColumnRole::Action, row) {
        rule.action = Action::from_text(action);
    }
    rule.comment = columns
        .value(ColumnRole::Description, row)
        .map(ToOwned::to_owned);
    if let Some(options) = columns.value(ColumnRole::Options, row) {
        rule.options = tokenize_lower(options);
    }

    Some(rule)
}

/// Parse a host row into `(fqdn, ip)`.
pub fn parse_host_row(
    row: &[String],
    columns: &ColumnMap,
) -> Result<Option<(String, String)>, RowError> {
    if is_blank_row(row) {
        return Ok(None);
    }
    let name = required(row, columns, TableKind::Hosts, ColumnRole::HostName)?;
    let ip = required(row, columns, TableKind::Hosts, ColumnRole::HostIp)?;
    Ok(Some((name, first_token(&ip))))
}

/// Parse a network row into `(name, cidr)`.
pub fn parse_network_row(
    row: &[String],
    columns: &ColumnMap,
) -> Result<Option<(String, String)>, RowError> {
    if is_blank_row(row) {
        return Ok(None);
    }
    let name = required(row, columns, TableKind::Networks, ColumnRole::Name)?;
    let cidr = required(row, columns, TableKind::Networks, ColumnRole::NetworkCidr)?;
    Ok(Some((name, first_token(&cidr))))
}

/// Parse a group row into `(name, members)`. An empty member cell is allowed.
pub fn parse_group_row(
    row: &[String],
    columns: &ColumnMap,
) -> Result<Option<(String, Vec<Member>)>, RowError> {
    if is_blank_row(row) {
        return Ok(None);
    }
    let name = required(row, columns, TableKind::Groups, ColumnRole::Name)?;
    let members = columns
        .value(ColumnRole::GroupMembers, row)
        .map(tokenize)
        .unwrap_or_default()
        .iter()
        .map(|token| Member::parse(token))
        .collect();
    Ok(Some((name, members)))
}

fn required(
    row: &[String],
    columns: &ColumnMap,
    kind: TableKind,
    field: ColumnRole,
) -> Result<String, RowError> {
    columns
        .value(field, row)
        .map(ToOwned::to_owned)
        .ok_or(RowError::MissingField { kind, field })
}

fn first_token(raw: &str) -> String {
    tokenize(raw)
        .into_iter()
        .next()
        .unwrap_or_else(|| raw.trim().to_string())
}
