use std::borrow::Cow;
use std::fs;
use std::path::Path;

use quick_xml::events::{BytesText, Event};
use quick_xml::Reader;
use thiserror::Error;

use crate::table::RawTable;

/// Errors that can occur while extracting tables from markup.
#[derive(Debug, Error)]
pub enum MarkupError {
    /// Markup could not be tokenized (for example an unterminated comment or tag).
    #[error("failed to tokenize markup: {0}")]
    Xml(#[from] quick_xml::Error),
    /// Failed to read input file.
    #[error("failed to read markup file: {0}")]
    Io(#[from] std::io::Error),
}

/// Extract every table from `markup`, in document order.
///
/// The reader is lenient about HTML habits: end tags are not matched against
/// start tags, void elements such as `<br>` need no closing tag, and text with
/// entities the reader does not know is kept verbatim. Nested tables are
/// returned as separate tables and their text does not leak into the outer cell.
///
/// The first row made only of `<th>` cells is the header when it precedes
/// every plain row; otherwise the first row is. All-`<th>` rows after the
/// header are dropped. A `<` in text that cannot start a tag (`ports < 1024`)
/// is kept as a literal; `a<b` still reads as the start of a `<b>` tag.
pub fn parse_tables(markup: &str) -> Result<Vec<RawTable>, MarkupError> {
    let markup = escape_stray_angles(markup);
    let mut reader = Reader::from_str(&markup);
    let config = reader.config_mut();
    config.trim_text(false);
    config.check_end_names = false;

    let mut open: Vec<TableBuilder> = Vec::new();
    let mut tables: Vec<RawTable> = Vec::new();
    let mut next_index = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let element = Element::from_name(e.local_name().as_ref());
                if element == Element::Table {
                    open.push(TableBuilder::new(next_index));
                    next_index += 1;
                } else if let Some(table) = open.last_mut() {
                    table.open_element(element);
                }
            }
            Event::Empty(e) => {
                let element = Element::from_name(e.local_name().as_ref());
                if element == Element::Table {
                    tables.push(RawTable::new(next_index));
                    next_index += 1;
                } else if let Some(table) = open.last_mut() {
                    table.open_element(element);
                    table.close_element(element);
                }
            }
            Event::End(e) => {
                let element = Element::from_name(e.local_name().as_ref());
                if element == Element::Table {
                    if let Some(table) = open.pop() {
                        tables.push(table.finish());
                    }
                } else if let Some(table) = open.last_mut() {
                    table.close_element(element);
                }
            }
            Event::Text(e) => {
                if let Some(table) = open.last_mut() {
                    if table.in_cell() {
                        table.push_text(&decode_text(&e));
                    }
                }
            }
            Event::CData(e) => {
                if let Some(table) = open.last_mut() {
                    if table.in_cell() {
                        table.push_text(&String::from_utf8_lossy(e.as_ref()));
                    }
                }
            }
            Event::Eof => break,
            Event::Decl(_) | Event::PI(_) | Event::DocType(_) | Event::Comment(_) => {}
        }
    }

    // Tables left open at end of input are closed implicitly.
    while let Some(table) = open.pop() {
        tables.push(table.finish());
    }

    tables.sort_by_key(|table| table.index);
    Ok(tables)
}

/// Read a markup file and extract its tables.
pub fn parse_tables_file(path: &Path) -> Result<Vec<RawTable>, MarkupError> {
    let raw = fs::read_to_string(path)?;
    parse_tables(&raw)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Element {
    Table,
    Row,
    HeaderCell,
    DataCell,
    Other,
}

impl Element {
    fn from_name(name: &[u8]) -> Self {
        if name.eq_ignore_ascii_case(b"table") {
            Self::Table
        } else if name.eq_ignore_ascii_case(b"tr") {
            Self::Row
        } else if name.eq_ignore_ascii_case(b"th") {
            Self::HeaderCell
        } else if name.eq_ignore_ascii_case(b"td") {
            Self::DataCell
        } else {
            Self::Other
        }
    }
}

#[derive(Debug, Default)]
struct RowBuilder {
    cells: Vec<String>,
    header_cells: usize,
}

impl RowBuilder {
    fn is_header(&self) -> bool {
        !self.cells.is_empty() && self.header_cells == self.cells.len()
    }
}

#[derive(Debug)]
struct CellBuilder {
    text: String,
    header: bool,
}

#[derive(Debug)]
struct TableBuilder {
    index: usize,
    rows: Vec<RowBuilder>,
    row: Option<RowBuilder>,
    cell: Option<CellBuilder>,
}

impl TableBuilder {
    fn new(index: usize) -> Self {
        Self {
            index,
            rows: Vec::new(),
            row: None,
            cell: None,
        }
    }

    fn in_cell(&self) -> bool {
        self.cell.is_some()
    }

    fn open_element(&mut self, element: Element) {
        match element {
            Element::Row => self.start_row(),
            Element::HeaderCell => self.start_cell(true),
            Element::DataCell => self.start_cell(false),
            // Any other tag inside a cell separates words (`<br>`, `<p>`, ...).
            Element::Other | Element::Table => self.push_text(""),
        }
    }

    fn close_element(&mut self, element: Element) {
        match element {
            Element::Row => self.end_row(),
            Element::HeaderCell | Element::DataCell => self.end_cell(),
            Element::Other | Element::Table => self.push_text(""),
        }
    }

    fn start_row(&mut self) {
        self.end_row();
        self.row = Some(RowBuilder::default());
    }

    fn end_row(&mut self) {
        self.end_cell();
        if let Some(row) = self.row.take() {
            if !row.cells.is_empty() {
                self.rows.push(row);
            }
        }
    }

    fn start_cell(&mut self, header: bool) {
        self.end_cell();
        if self.row.is_none() {
            self.row = Some(RowBuilder::default());
        }
        self.cell = Some(CellBuilder {
            text: String::new(),
            header,
        });
    }

    fn end_cell(&mut self) {
        let Some(cell) = self.cell.take() else {
            return;
        };
        let row = self.row.get_or_insert_with(RowBuilder::default);
        row.cells.push(collapse_whitespace(&cell.text));
        if cell.header {
            row.header_cells += 1;
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(cell) = self.cell.as_mut() {
            cell.text.push(' ');
            cell.text.push_str(text);
        }
    }

    fn finish(mut self) -> RawTable {
        self.end_row();

        let mut table = RawTable::new(self.index);
        // A `<th>` row only heads the table when no plain data row comes
        // before it. Later all-`<th>` rows are section dividers.
        let header_pos = self
            .rows
            .iter()
            .take_while(|row| row.header_cells > 0)
            .position(RowBuilder::is_header);
        table.header_from_th = header_pos.is_some();

        let mut rows = self.rows.into_iter().skip(header_pos.unwrap_or(0));
        if let Some(header) = rows.next() {
            table.headers = header.cells;
        }
        table.rows = rows
            .filter(|row| !row.is_header())
            .map(|row| row.cells)
            .collect();
        table
    }
}

/// Rewrite each `<` that cannot open a tag, comment or declaration as `&lt;`.
fn escape_stray_angles(markup: &str) -> Cow<'_, str> {
    let starts_tag = |next: Option<char>| {
        matches!(next, Some(c) if c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?'))
    };

    let mut chars = markup.char_indices().peekable();
    let mut out: Option<String> = None;
    while let Some((pos, c)) = chars.next() {
        let stray = c == '<' && !starts_tag(chars.peek().map(|&(_, next)| next));
        if stray {
            out.get_or_insert_with(|| markup[..pos].to_string())
                .push_str("&lt;");
        } else if let Some(escaped) = out.as_mut() {
            escaped.push(c);
        }
    }
    match out {
        Some(escaped) => Cow::Owned(escaped),
        None => Cow::Borrowed(markup),
    }
}

fn decode_text(text: &BytesText<'_>) -> String {
    match text.unescape_with(resolve_entity) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => String::from_utf8_lossy(text.as_ref()).replace("&lt;", "<"),
    }
}

fn resolve_entity(entity: &str) -> Option<&'static str> {
    match entity {
        "lt" => Some("<"),
        "gt" => Some(">"),
        "amp" => Some("&"),
        "apos" => Some("'"),
        "quot" => Some("\""),
        "nbsp" => Some(" "),
        _ => None,
    }
}

fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
