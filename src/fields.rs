//! Canonical record schema.
//!
//! A [`Record`] is a closed set of string fields. Every field is described
//! once in [`FIELD_SPECS`] (external name + default value); the
//! [`FieldRegistry`] built from it is the single source of truth for default
//! construction, population by external name and rule resolution.

use std::collections::HashMap;

use lazy_static::lazy_static;
use thiserror::Error;

/// Errors raised by the field registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("no such field: {0}")]
    NoSuchField(String),

    #[error("duplicate field mapping for external name {0:?}")]
    DuplicateFieldMapping(String),
}

/// A slot of the canonical record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    CiteName,
    CiteType,
    Title,
    Author,
    Booktitle,
    Doi,
    Edition,
    Isbn,
    Issn,
    Institution,
    Journal,
    Keyword,
    Location,
    Metanote,
    Note,
    Number,
    Numpages,
    Pages,
    Publisher,
    School,
    Series,
    ReportType,
    Url,
    Version,
    Volume,
    Year,
}

impl Field {
    /// Number of slots in a record.
    pub const COUNT: usize = 26;

    fn index(self) -> usize {
        self as usize
    }
}

/// Static description of one record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub field: Field,
    pub external_name: &'static str,
    pub default: &'static str,
}

const fn spec(field: Field, external_name: &'static str) -> FieldSpec {
    FieldSpec {
        field,
        external_name,
        default: "",
    }
}

/// The canonical schema, in output order.
pub const FIELD_SPECS: &[FieldSpec] = &[
    spec(Field::CiteName, "cite_name"),
    spec(Field::CiteType, "cite_type"),
    spec(Field::Title, "title"),
    spec(Field::Author, "author"),
    spec(Field::Booktitle, "booktitle"),
    spec(Field::Doi, "doi"),
    spec(Field::Edition, "edition"),
    spec(Field::Isbn, "isbn"),
    spec(Field::Issn, "issn"),
    spec(Field::Institution, "institution"),
    spec(Field::Journal, "journal"),
    spec(Field::Keyword, "keyword"),
    spec(Field::Location, "location"),
    spec(Field::Metanote, "metanote"),
    spec(Field::Note, "note"),
    spec(Field::Number, "number"),
    spec(Field::Numpages, "numpages"),
    spec(Field::Pages, "pages"),
    spec(Field::Publisher, "publisher"),
    spec(Field::School, "school"),
    spec(Field::Series, "series"),
    spec(Field::ReportType, "type"),
    spec(Field::Url, "url"),
    spec(Field::Version, "version"),
    spec(Field::Volume, "volume"),
    spec(Field::Year, "year"),
];

lazy_static! {
    static ref REGISTRY: FieldRegistry = match FieldRegistry::new(FIELD_SPECS) {
        Ok(registry) => registry,
        Err(e) => panic!("invalid record schema: {}", e),
    };
}

/// The process-wide registry for [`FIELD_SPECS`].
///
/// Built on first use; an invalid schema panics at that point.
pub fn registry() -> &'static FieldRegistry {
    &REGISTRY
}

/// A normalized bibliography record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    values: [String; Field::COUNT],
}

impl Record {
    pub fn get(&self, field: Field) -> &str {
        &self.values[field.index()]
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        self.values[field.index()] = value.into();
    }

    pub fn cite_name(&self) -> &str {
        self.get(Field::CiteName)
    }

    pub fn cite_type(&self) -> &str {
        self.get(Field::CiteType)
    }
}

impl Default for Record {
    fn default() -> Self {
        registry().default_record()
    }
}

/// Name-based access to record fields.
#[derive(Debug)]
pub struct FieldRegistry {
    specs: &'static [FieldSpec],
    by_name: HashMap<&'static str, Field>,
}

impl FieldRegistry {
    /// Builds a registry, rejecting schemas that map one external name twice.
    pub fn new(specs: &'static [FieldSpec]) -> Result<Self, FieldError> {
        let mut by_name = HashMap::with_capacity(specs.len());
        for spec in specs {
            if by_name.insert(spec.external_name, spec.field).is_some() {
                return Err(FieldError::DuplicateFieldMapping(
                    spec.external_name.to_string(),
                ));
            }
        }
        Ok(FieldRegistry { specs, by_name })
    }

    pub fn specs(&self) -> &'static [FieldSpec] {
        self.specs
    }

    /// External names of every field, in schema order.
    pub fn external_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.specs.iter().map(|spec| spec.external_name)
    }

    pub fn contains(&self, external_name: &str) -> bool {
        self.by_name.contains_key(external_name)
    }

    pub fn lookup(&self, external_name: &str) -> Option<Field> {
        self.by_name.get(external_name).copied()
    }

    /// A record with every field at its default value.
    pub fn default_record(&self) -> Record {
        let mut record = Record {
            values: std::array::from_fn(|_| String::new()),
        };
        for spec in self.specs {
            record.set(spec.field, spec.default);
        }
        record
    }

    /// Reads a field by external name; `None` if the name is unknown.
    pub fn get<'r>(&self, record: &'r Record, external_name: &str) -> Option<&'r str> {
        self.lookup(external_name).map(|field| record.get(field))
    }

    /// Writes a field by external name.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::NoSuchField`] for an unknown name; the record
    /// is left unchanged.
    pub fn set(
        &self,
        record: &mut Record,
        external_name: &str,
        value: impl Into<String>,
    ) -> Result<(), FieldError> {
        let field = self
            .lookup(external_name)
            .ok_or_else(|| FieldError::NoSuchField(external_name.to_string()))?;
        record.set(field, value);
        Ok(())
    }
}
