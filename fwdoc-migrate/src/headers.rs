//! Header classification for wiki tables.
//!
//! Wiki authors label columns inconsistently and in several languages. Each
//! header cell is normalized and looked up in a fixed synonym table to find
//! the column's role; the set of roles present then decides what kind of
//! table it is. Columns whose header has no role are never read.

use std::collections::{BTreeMap, HashMap};
use std::fmt::{self, Display, Formatter};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Meaning of one table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColumnRole {
    /// Rule identifier, or entity name in network/group tables.
    Name,
    Source,
    Destination,
    /// Destination port(s).
    Port,
    SourcePort,
    Protocol,
    Action,
    Description,
    Options,
    HostName,
    HostIp,
    GroupMembers,
    NetworkCidr,
}

impl ColumnRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Source => "source",
            Self::Destination => "destination",
            Self::Port => "port",
            Self::SourcePort => "source-port",
            Self::Protocol => "protocol",
            Self::Action => "action",
            Self::Description => "description",
            Self::Options => "options",
            Self::HostName => "host-name",
            Self::HostIp => "host-ip",
            Self::GroupMembers => "group-members",
            Self::NetworkCidr => "network-cidr",
        }
    }
}

impl Display for ColumnRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static SYNONYMS: Lazy<HashMap<&'static str, ColumnRole>> = Lazy::new(|| {
    use ColumnRole::*;
    HashMap::from([
        ("rule", Name),
        ("regel", Name),
        ("name", Name),
        ("nummer", Name),
        ("nr", Name),
        ("source", Source),
        ("quelle", Source),
        ("src", Source),
        ("destination", Destination),
        ("ziel", Destination),
        ("dest", Destination),
        ("dst", Destination),
        ("port", Port),
        ("ports", Port),
        ("ports/protokolle", Port),
        ("ports/protocols", Port),
        ("source port", SourcePort),
        ("src port", SourcePort),
        ("quellport", SourcePort),
        ("protocol", Protocol),
        ("proto", Protocol),
        ("protokoll", Protocol),
        ("action", Action),
        ("aktion", Action),
        ("description", Description),
        ("comment", Description),
        ("beschreibung", Description),
        ("kommentar", Description),
        ("option", Options),
        ("options", Options),
        ("optionen", Options),
        ("fqdn", HostName),
        ("hostname", HostName),
        ("ip-adresse", HostIp),
        ("ip address", HostIp),
        ("ip", HostIp),
        ("mitglieder", GroupMembers),
        ("members", GroupMembers),
        ("mitglieder (fqdn)", GroupMembers),
        ("ip-adresse (cidr)", NetworkCidr),
        ("cidr", NetworkCidr),
    ])
});

/// Lower-case, trim and collapse inner whitespace of a header label.
pub fn normalize_header(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Header lookup: the built-in synonyms plus optional profile extras.
///
/// Extras only add new header texts; a text already known to the built-in
/// table keeps its built-in role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSynonyms {
    extra: HashMap<String, ColumnRole>,
}

impl HeaderSynonyms {
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = (S, ColumnRole)>,
        S: AsRef<str>,
    {
        Self {
            extra: extra
                .into_iter()
                .map(|(text, role)| (normalize_header(text.as_ref()), role))
                .collect(),
        }
    }

    pub fn lookup(&self, header: &str) -> Option<ColumnRole> {
        let key = normalize_header(header);
        SYNONYMS
            .get(key.as_str())
            .copied()
            .or_else(|| self.extra.get(&key).copied())
    }
}

/// Role to column index for one table. The first column with a role wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    columns: BTreeMap<ColumnRole, usize>,
}

impl ColumnMap {
    pub fn from_headers(headers: &[String], synonyms: &HeaderSynonyms) -> Self {
        let mut columns = BTreeMap::new();
        for (idx, header) in headers.iter().enumerate() {
            if let Some(role) = synonyms.lookup(header) {
                columns.entry(role).or_insert(idx);
            }
        }
        Self { columns }
    }

    pub fn has(&self, role: ColumnRole) -> bool {
        self.columns.contains_key(&role)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn roles(&self) -> impl Iterator<Item = ColumnRole> + '_ {
        self.columns.keys().copied()
    }

    /// Trimmed cell text for `role`, or `None` when the column is absent or blank.
    pub fn value<'a>(&self, role: ColumnRole, row: &'a [String]) -> Option<&'a str> {
        let idx = *self.columns.get(&role)?;
        let value = row.get(idx)?.trim();
        (!value.is_empty()).then_some(value)
    }
}

/// What a table describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    Rules,
    Hosts,
    Networks,
    Groups,
    Unclassified,
}

impl Display for TableKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Rules => "rules",
            Self::Hosts => "hosts",
            Self::Networks => "networks",
            Self::Groups => "groups",
            Self::Unclassified => "unclassified",
        })
    }
}

/// Decide the table kind from the roles present.
pub fn classify(columns: &ColumnMap) -> TableKind {
    use ColumnRole::*;
    if columns.has(Destination)
        && (columns.has(Action) || columns.has(Protocol) || columns.has(Port))
    {
        TableKind::Rules
    } else if columns.has(HostName) && columns.has(HostIp) {
        TableKind::Hosts
    } else if columns.has(Name) && columns.has(NetworkCidr) {
        TableKind::Networks
    } else if columns.has(Name) && columns.has(GroupMembers) {
        TableKind::Groups
    } else {
        TableKind::Unclassified
    }
}

#[cfg(test)]
mod tests {
    use super::{classify, normalize_header, ColumnMap, ColumnRole, HeaderSynonyms, TableKind};

    fn headers(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|h| h.to_string()).collect()
    }

    fn kind_of(raw: &[&str]) -> TableKind {
        classify(&ColumnMap::from_headers(
            &headers(raw),
            &HeaderSynonyms::default(),
        ))
    }

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize_header("  IP-Adresse   (CIDR) "), "ip-adresse (cidr)");
    }

    #[test]
    fn german_and_english_synonyms_resolve() {
        let synonyms = HeaderSynonyms::default();
        assert_eq!(synonyms.lookup("Regel"), Some(ColumnRole::Name));
        assert_eq!(synonyms.lookup("Quelle"), Some(ColumnRole::Source));
        assert_eq!(synonyms.lookup("DST"), Some(ColumnRole::Destination));
        assert_eq!(synonyms.lookup("Beschreibung"), Some(ColumnRole::Description));
        assert_eq!(synonyms.lookup("Funktion"), None);
    }

    #[test]
    fn classifies_each_table_kind() {
        assert_eq!(
            kind_of(&["Rule", "Source", "Destination", "Port", "Protocol", "Action"]),
            TableKind::Rules
        );
        assert_eq!(
            kind_of(&["FQDN", "IP-Adresse", "Funktion"]),
            TableKind::Hosts
        );
        assert_eq!(
            kind_of(&["Name", "IP-Adresse (CIDR)", "Kommentar"]),
            TableKind::Networks
        );
        assert_eq!(
            kind_of(&["Name", "Mitglieder (FQDN)", "Funktion"]),
            TableKind::Groups
        );
        assert_eq!(
            kind_of(&["Rule", "Source", "Destination"]),
            TableKind::Unclassified
        );
    }

    #[test]
    fn first_column_for_a_role_wins() {
        let map = ColumnMap::from_headers(
            &headers(&["Comment", "Description"]),
            &HeaderSynonyms::default(),
        );
        let row = vec!["first".to_string(), "second".to_string()];
        assert_eq!(map.value(ColumnRole::Description, &row), Some("first"));
    }

    #[test]
    fn blank_cells_read_as_none() {
        let map = ColumnMap::from_headers(&headers(&["Name"]), &HeaderSynonyms::default());
        assert_eq!(map.value(ColumnRole::Name, &["  ".to_string()]), None);
        assert_eq!(map.value(ColumnRole::Name, &[]), None);
    }

    #[test]
    fn extras_add_but_never_override() {
        let synonyms = HeaderSynonyms::with_extra([
            ("Zielsystem", ColumnRole::Destination),
            ("source", ColumnRole::Destination),
        ]);
        assert_eq!(synonyms.lookup("zielsystem"), Some(ColumnRole::Destination));
        assert_eq!(synonyms.lookup("Source"), Some(ColumnRole::Source));
    }
}
