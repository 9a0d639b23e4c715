use std::fmt::{self, Display, Formatter};

use serde::Serialize;

/// One logical table extracted from page markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawTable {
    /// Position of the table in document order (by opening tag).
    pub index: usize,
    /// Header labels, whitespace-collapsed.
    pub headers: Vec<String>,
    /// Data rows; each row holds one entry per cell in source order.
    pub rows: Vec<Vec<String>>,
    /// Whether the header came from a `<th>` row rather than the first plain row.
    pub header_from_th: bool,
}

impl RawTable {
    /// Create an empty table at the given document position.
    pub fn new(index: usize) -> Self {
        Self {
            index,
            headers: Vec::new(),
            rows: Vec::new(),
            header_from_th: false,
        }
    }

    /// Return cell text at `row`/`column`, or an empty string when the row is short.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// True when the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Display for RawTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "table #{} | {}", self.index, self.headers.join(" | "))?;
        for row in &self.rows {
            writeln!(f, "  | {}", row.join(" | "))?;
        }
        Ok(())
    }
}
