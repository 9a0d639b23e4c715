//! Wiki table parsing.
//!
//! Turns page markup into firewall rules and host/network/group definitions.
//!
//! ## Flow
//!
//! 1. Extract raw tables with `wiki-table-core`
//! 2. Map each table's headers to column roles and classify the table
//! 3. Parse entity tables (hosts, networks, groups) in document order
//! 4. Parse rule tables
//! 5. Expand entity names in rule addresses to literals
//!
//! Classification runs per table, so one page may mix every table kind.
//!
//! ## Failure policy
//!
//! A row that cannot be parsed is skipped with a warning and never stops the
//! remaining rows. Only a document with no tables, or with no table carrying a
//! recognizable header, is a hard [`ParseError`].

mod expand;
mod ports;
mod rows;

use std::collections::HashSet;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};
use wiki_table_core::{parse_tables, MarkupError, RawTable};

use crate::headers::{classify, ColumnMap, ColumnRole, HeaderSynonyms, TableKind};
use crate::model::{EntityDefinitions, FirewallRule};

pub use expand::{expand_addresses, AddressExpander};
pub use ports::{parse_port_cell, PortSpec};
pub use rows::{normalize_name, synthetic_rule_name, tokenize, RowError};

/// Document-level parse failure.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The markup contains no `<table>` at all.
    #[error("no table found in document")]
    NoTables,
    /// Tables exist but none has a single known column header.
    #[error("none of the {tables} table(s) has a recognizable header")]
    NoRecognizableHeaders { tables: usize },
    #[error(transparent)]
    Markup(#[from] MarkupError),
}

/// Per-table parse outcome, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSummary {
    pub index: usize,
    pub kind: TableKind,
    pub headers: Vec<String>,
    pub roles: Vec<ColumnRole>,
    pub records: usize,
    pub skipped_rows: usize,
}

/// Everything read from one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedDocument {
    pub definitions: EntityDefinitions,
    pub rules: Vec<FirewallRule>,
    pub tables: Vec<TableSummary>,
}

/// Parser configuration for one run. Holds no state between documents.
#[derive(Debug, Clone, Default)]
pub struct TableParser {
    synonyms: HeaderSynonyms,
}

impl TableParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parser that also recognizes profile-supplied header texts.
    pub fn with_synonyms(synonyms: HeaderSynonyms) -> Self {
        Self { synonyms }
    }

    /// Parse every table of a page: definitions, rules, and rule expansion.
    pub fn parse_document(&self, markup: &str) -> Result<ParsedDocument, ParseError> {
        let tables = parse_tables(markup)?;
        self.parse_raw_tables(&tables)
    }

    /// Same as [`TableParser::parse_document`] for tables already extracted.
    pub fn parse_raw_tables(&self, tables: &[RawTable]) -> Result<ParsedDocument, ParseError> {
        if tables.is_empty() {
            return Err(ParseError::NoTables);
        }

        let classified: Vec<(&RawTable, ColumnMap, TableKind)> = tables
            .iter()
            .map(|table| {
                let columns = ColumnMap::from_headers(&table.headers, &self.synonyms);
                let kind = classify(&columns);
                debug!(table = table.index, %kind, headers = ?table.headers, "classified table");
                (table, columns, kind)
            })
            .collect();

        if classified.iter().all(|(_, columns, _)| columns.is_empty()) {
            return Err(ParseError::NoRecognizableHeaders {
                tables: tables.len(),
            });
        }

        let mut summaries: Vec<TableSummary> = classified
            .iter()
            .map(|(table, columns, kind)| TableSummary {
                index: table.index,
                kind: *kind,
                headers: table.headers.clone(),
                roles: columns.roles().collect(),
                records: 0,
                skipped_rows: 0,
            })
            .collect();

        let mut doc = ParsedDocument::default();

        for (pos, (table, columns, kind)) in classified.iter().enumerate() {
            let stats = match kind {
                TableKind::Hosts => parse_hosts(table, columns, &mut doc.definitions),
                TableKind::Networks => parse_networks(table, columns, &mut doc.definitions),
                TableKind::Groups => parse_groups(table, columns, &mut doc.definitions),
                TableKind::Rules => continue,
                TableKind::Unclassified => {
                    if columns.is_empty() {
                        warn!(table = table.index, "skipping table without recognizable headers");
                    } else {
                        warn!(
                            table = table.index,
                            headers = ?table.headers,
                            "skipping table that matches no known table layout"
                        );
                    }
                    continue;
                }
            };
            summaries[pos].records = stats.records;
            summaries[pos].skipped_rows = stats.skipped;
        }

        let mut seen_names = HashSet::new();
        for (pos, (table, columns, kind)) in classified.iter().enumerate() {
            if *kind != TableKind::Rules {
                continue;
            }
            let rules = parse_rules(table, columns);
            summaries[pos].records = rules.len();
            for rule in rules {
                if !seen_names.insert(rule.name.clone()) {
                    warn!(table = table.index, rule = %rule.name, "duplicate rule name");
                }
                doc.rules.push(rule);
            }
        }

        if !doc.definitions.is_empty() {
            let mut expander = AddressExpander::new(&doc.definitions);
            for rule in &mut doc.rules {
                rule.source_addresses = expander.expand(&rule.source_addresses);
                rule.destination_addresses = expander.expand(&rule.destination_addresses);
            }
        }

        doc.tables = summaries;
        Ok(doc)
    }

    /// Parse the first table with any known header as a rule table.
    ///
    /// No classification and no entity expansion take place, so a table with
    /// only `Rule | Source | Destination` columns still yields rules.
    pub fn parse_rule_table(&self, markup: &str) -> Result<Vec<FirewallRule>, ParseError> {
        let tables = parse_tables(markup)?;
        if tables.is_empty() {
            return Err(ParseError::NoTables);
        }

        let Some((table, columns)) = tables.iter().find_map(|table| {
            let columns = ColumnMap::from_headers(&table.headers, &self.synonyms);
            (!columns.is_empty()).then_some((table, columns))
        }) else {
            return Err(ParseError::NoRecognizableHeaders {
                tables: tables.len(),
            });
        };

        if table.is_empty() {
            warn!(table = table.index, "rule table has no data rows");
        }
        Ok(parse_rules(table, &columns))
    }
}

#[derive(Debug, Default)]
struct RowStats {
    records: usize,
    skipped: usize,
}

fn parse_rules(table: &RawTable, columns: &ColumnMap) -> Vec<FirewallRule> {
    table
        .rows
        .iter()
        .filter_map(|row| rows::parse_rule_row(row, columns))
        .collect()
}

fn parse_hosts(
    table: &RawTable,
    columns: &ColumnMap,
    definitions: &mut EntityDefinitions,
) -> RowStats {
    parse_entity_rows(table, columns, definitions, rows::parse_host_row, |defs, name, ip| {
        defs.hosts.insert(name, ip);
    })
}

fn parse_networks(
    table: &RawTable,
    columns: &ColumnMap,
    definitions: &mut EntityDefinitions,
) -> RowStats {
    parse_entity_rows(table, columns, definitions, rows::parse_network_row, |defs, name, cidr| {
        defs.networks.insert(name, cidr);
    })
}

fn parse_groups(
    table: &RawTable,
    columns: &ColumnMap,
    definitions: &mut EntityDefinitions,
) -> RowStats {
    parse_entity_rows(table, columns, definitions, rows::parse_group_row, |defs, name, members| {
        defs.groups.insert(name, members);
    })
}

/// Shared loop for entity tables: skip bad rows, first definition of a name wins.
fn parse_entity_rows<T>(
    table: &RawTable,
    columns: &ColumnMap,
    definitions: &mut EntityDefinitions,
    parse_row: fn(&[String], &ColumnMap) -> Result<Option<(String, T)>, RowError>,
    mut insert: impl FnMut(&mut EntityDefinitions, String, T),
) -> RowStats {
    let mut stats = RowStats::default();
    for (idx, row) in table.rows.iter().enumerate() {
        let (name, value) = match parse_row(row, columns) {
            Ok(Some(entry)) => entry,
            Ok(None) => continue,
            Err(err) => {
                warn!(table = table.index, row = idx + 1, error = %err, "skipping row");
                stats.skipped += 1;
                continue;
            }
        };
        if let Some(existing) = definitions.kind_of(&name) {
            warn!(
                table = table.index,
                row = idx + 1,
                name = %name,
                defined_as = %existing,
                "name already defined; keeping first definition"
            );
            stats.skipped += 1;
            continue;
        }
        insert(definitions, name, value);
        stats.records += 1;
    }
    stats
}
