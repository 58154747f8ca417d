//! Output generation for normalized records.
//!
//! This module projects records onto external `name = value` entries and
//! renders them as a BibTeX bibliography or as JSON.

use serde::{Serialize, Serializer};

use crate::builder::{OPTIONAL_SENTINEL, TODO_SENTINEL};
use crate::fields::{registry, Field, Record};

/// A record as seen by the bibliography writer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalEntry {
    pub cite_type: String,
    pub cite_key: String,
    /// Every schema field except citation key/type, in schema order.
    #[serde(serialize_with = "serialize_fields")]
    pub fields: Vec<(&'static str, String)>,
}

fn serialize_fields<S>(fields: &[(&'static str, String)], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_map(fields.iter().map(|(name, value)| (*name, value)))
}

/// Which fields the writer drops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputOptions {
    /// Drop fields holding `(TODO)`.
    pub no_todo: bool,
    /// Drop fields holding `(OPTIONAL)`.
    pub no_optional: bool,
    /// Keep fields with an empty value.
    pub show_empty: bool,
}

impl OutputOptions {
    fn keeps(&self, value: &str) -> bool {
        if value.is_empty() {
            return self.show_empty;
        }
        !(self.no_todo && value.contains(TODO_SENTINEL)
            || self.no_optional && value.contains(OPTIONAL_SENTINEL))
    }
}

/// Projects a record onto its external entry.
///
/// Empty values are included; suppression is left to [`ExternalEntry::filtered`].
pub fn to_external_entry(record: &Record) -> ExternalEntry {
    let fields = registry()
        .specs()
        .iter()
        .filter(|spec| !matches!(spec.field, Field::CiteName | Field::CiteType))
        .map(|spec| (spec.external_name, record.get(spec.field).to_string()))
        .collect();

    ExternalEntry {
        cite_type: record.cite_type().to_string(),
        cite_key: record.cite_name().to_string(),
        fields,
    }
}

impl ExternalEntry {
    /// Returns the entry without the fields `options` suppresses.
    pub fn filtered(&self, options: &OutputOptions) -> ExternalEntry {
        ExternalEntry {
            cite_type: self.cite_type.clone(),
            cite_key: self.cite_key.clone(),
            fields: self
                .fields
                .iter()
                .filter(|(_, value)| options.keeps(value))
                .cloned()
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Renders the entry in BibTeX syntax with aligned field names.
    pub fn to_bibtex(&self) -> String {
        let width = self.fields.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
        let mut out = format!("@{}{{{},\n", self.cite_type, self.cite_key);
        for (name, value) in &self.fields {
            out.push_str(&format!("    {:<width$} = {},\n", name, delimit(value), width = width));
        }
        out.push_str("}\n");
        out
    }
}

/// Wraps a value in braces, or in quotes when its own braces do not balance.
fn delimit(value: &str) -> String {
    if braces_balanced(value) {
        format!("{{{}}}", value)
    } else {
        format!("\"{}\"", value)
    }
}

fn braces_balanced(value: &str) -> bool {
    let mut depth = 0usize;
    for c in value.chars() {
        match c {
            '{' => depth += 1,
            '}' if depth == 0 => return false,
            '}' => depth -= 1,
            _ => {}
        }
    }
    depth == 0
}

/// Renders entries as a BibTeX bibliography, one blank line between entries.
pub fn render_bibtex(entries: &[ExternalEntry]) -> String {
    entries
        .iter()
        .map(ExternalEntry::to_bibtex)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders entries as a pretty-printed JSON array.
pub fn render_json(entries: &[ExternalEntry]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(entries)
}
