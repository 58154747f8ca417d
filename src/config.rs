//! Rule configuration loading.
//!
//! A configuration is a two-level key space, `citation_type.rule_kind =
//! [field names]`, written as TOML or JSON:
//!
//! ```toml
//! [article]
//! todos = ["author", "title", "journal", "year"]
//! optionals = ["doi", "pages"]
//! oneof_doi_pages = ["doi", "pages"]
//! ```
//!
//! `todos` and `optionals` populate the [`RuleTable`]; every `oneof_*` key
//! appends one group to [`OneOfGroups`] in declaration order.

use std::fs;
use std::path::Path;

use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::rules::{OneOfGroups, RuleKind, RuleTable};

/// Key prefix of one-of groups.
pub const ONE_OF_PREFIX: &str = "oneof_";

/// Errors that can occur when loading a rule configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Rules for {0:?} must be a table")]
    NotATable(String),

    #[error("Rule {key:?} must be a list of field names")]
    NotAFieldList { key: String },
}

/// Rules consumed by the record builder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleConfig {
    pub rules: RuleTable,
    pub one_ofs: OneOfGroups,
}

impl RuleConfig {
    /// Parses a TOML configuration.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let value: Value = toml::from_str(content)?;
        Self::from_value(&value)
    }

    /// Parses a JSON configuration.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(content)?;
        Self::from_value(&value)
    }

    fn from_value(value: &Value) -> Result<Self, ConfigError> {
        let mut config = RuleConfig::default();
        let Some(types) = value.as_object() else {
            return Err(ConfigError::NotATable(String::from("<root>")));
        };

        for (citation_type, kinds) in types {
            let citation_type = citation_type.to_lowercase();
            let kinds = kinds
                .as_object()
                .ok_or_else(|| ConfigError::NotATable(citation_type.clone()))?;

            for (kind, fields) in kinds {
                let kind = kind.to_lowercase();
                let key = format!("{}.{}", citation_type, kind);
                let fields = field_list(fields).ok_or(ConfigError::NotAFieldList { key })?;

                if kind.starts_with(ONE_OF_PREFIX) {
                    config.one_ofs.add(&citation_type, fields);
                } else if let Ok(rule_kind) = kind.parse::<RuleKind>() {
                    config.rules.insert(&citation_type, rule_kind, fields);
                } else {
                    warn!("ignoring unknown rule {}.{}", citation_type, kind);
                }
            }
        }

        Ok(config)
    }
}

fn field_list(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|field| field.as_str().map(str::to_lowercase))
        .collect()
}

/// Loads a rule configuration file.
///
/// Files ending in `.json` are read as JSON, anything else as TOML.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid rule
/// configuration.
pub fn load_rules(path: &Path) -> Result<RuleConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        RuleConfig::from_json_str(&content)
    } else {
        RuleConfig::from_toml_str(&content)
    }
}

/// Returns the builtin rule configuration.
pub fn builtin_rules() -> RuleConfig {
    match RuleConfig::from_toml_str(BUILTIN_RULES) {
        Ok(config) => config,
        Err(e) => panic!("invalid builtin rules: {}", e),
    }
}

/// Builtin rules for the common BibTeX entry types.
pub const BUILTIN_RULES: &str = r#"
[default]
todos = ["author", "title", "year"]
optionals = ["metanote", "url"]

[article]
todos = ["author", "title", "journal", "year"]
optionals = ["doi", "isbn", "issn", "metanote", "number", "numpages", "pages", "publisher", "url", "volume"]
oneof_doi_pages = ["doi", "pages", "numpages"]
oneof_doi_isbn = ["doi", "isbn"]
oneof_doi_issn = ["doi", "issn"]
oneof_doi_number = ["doi", "number"]
oneof_doi_publisher = ["doi", "publisher"]
oneof_doi_volume = ["doi", "volume"]
oneof_doi_url = ["doi", "url"]

[book]
todos = ["author", "title", "publisher", "year"]
optionals = ["doi", "edition", "isbn", "issn", "metanote", "url"]

[incollection]
todos = ["author", "title", "booktitle", "publisher", "year"]
optionals = ["doi", "isbn", "issn", "metanote", "numpages", "pages", "url"]

[inproceedings]
todos = ["author", "title", "booktitle", "year"]
optionals = ["doi", "isbn", "issn", "keyword", "location", "metanote", "numpages", "pages", "publisher", "series", "url"]

[mastersthesis]
todos = ["author", "title", "school", "year"]
optionals = ["metanote", "url"]

[misc]
todos = ["author", "title", "note", "url", "year"]
optionals = ["institution", "metanote"]

[phdthesis]
todos = ["author", "title", "school", "year"]
optionals = ["metanote", "url"]

[techreport]
todos = ["author", "title", "institution", "year"]
optionals = ["metanote", "series", "url", "version"]

[unpublished]
todos = ["author", "title", "note", "url"]
optionals = ["metanote"]
"#;
