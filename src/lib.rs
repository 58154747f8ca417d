//! bibfuse: normalization of bibliographic records.
//!
//! This library provides functionality to:
//! - Parse and validate BibTeX author fields
//! - Map raw citation fields onto a canonical record schema
//! - Fill missing fields with `(TODO)` / `(OPTIONAL)` placeholders per citation type
//! - Collapse groups of redundant fields ("one-of" groups) in smart mode
//! - Read `.bib` entries and render normalized records as BibTeX or JSON

pub mod author;
pub mod bib;
pub mod builder;
pub mod config;
pub mod fields;
pub mod name;
pub mod output;
pub mod rules;

pub use author::{AuthorError, NameList};
pub use bib::{parse_entries, BibError};
pub use builder::{BuildError, RawEntry, RecordBuilder, OPTIONAL_SENTINEL, TODO_SENTINEL};
pub use config::{builtin_rules, load_rules, ConfigError, RuleConfig};
pub use fields::{registry, Field, FieldError, FieldRegistry, Record};
pub use name::{Name, NameError};
pub use output::{render_bibtex, render_json, to_external_entry, ExternalEntry, OutputOptions};
pub use rules::{OneOfGroups, RuleKind, RuleSet, RuleTable};
