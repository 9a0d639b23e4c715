//! Generic table extraction primitives for wiki page markup.
//!
//! The crate turns raw page markup into [`RawTable`] values: one ordered list
//! of header labels plus ordered rows of whitespace-collapsed cell text. It
//! knows nothing about what the tables mean.

pub mod parser;
pub mod table;

pub use parser::{parse_tables, parse_tables_file, MarkupError};
pub use table::RawTable;
