//! Migration of wiki firewall documentation into Capirca-style policy files.
//!
//! Firewall documentation often lives in wiki pages as HTML tables: rule
//! tables, plus host, network and group tables whose names the rules refer
//! to. This library reads those tables, checks the cross-references between
//! them, and renders a `.pol` policy with matching `.net` and `.svc`
//! definition files.
//!
//! # Architecture
//!
//! - [`headers`]: Column role synonyms and table classification
//! - [`parser`]: Table rows to rules and entity definitions, with address expansion
//! - [`dependency`]: Reference graph analysis: unresolved names, cycles, chains
//! - [`extract`]: Reusable network and service object detection
//! - [`generate`]: Policy and definition file rendering
//! - [`profile`]: TOML migration profiles (header extras, targets, gate)
//! - [`pipeline`]: One-call migration of a document
//! - [`report`]: Terminal-friendly colored output
//!
//! # Workflow
//!
//! ```text
//! HTML ─▶ parser ─▶ dependency ─▶ gate ─▶ extract ─▶ generate ─▶ .pol/.net/.svc
//! ```
//!
//! The dependency analysis can also run on its own as a pre-flight check.

pub mod address;
pub mod dependency;
pub mod extract;
pub mod generate;
pub mod headers;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod profile;
pub mod report;

pub use dependency::{DependencyAnalyzer, DependencyReport};
pub use extract::{ExtractedObjects, ObjectExtractor};
pub use generate::{PolicyGenerator, PolicyHeader, Target};
pub use model::{Action, EntityDefinitions, EntityKind, FirewallRule, Member, NetworkObject, ServiceDef};
pub use parser::{ParseError, ParsedDocument, TableParser, TableSummary};
pub use pipeline::{migrate, GateDecision, MigrationOutput};
pub use profile::{default_profile, load_profile, MigrationProfile, ProfileLoadError};
