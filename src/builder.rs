//! Record building.
//!
//! Turns one raw bibliography entry into a normalized [`Record`]: the author
//! field is reparsed into canonical form, empty fields get placeholders from
//! the rule table, and smart mode collapses redundant one-of groups.

use thiserror::Error;
use tracing::debug;

use crate::author::{AuthorError, NameList};
use crate::fields::{registry, Field, FieldRegistry, Record};
use crate::rules::{OneOfGroups, RuleTable};

/// Placeholder for an empty mandatory field.
pub const TODO_SENTINEL: &str = "(TODO)";

/// Placeholder for an empty optional field.
pub const OPTIONAL_SENTINEL: &str = "(OPTIONAL)";

/// Errors that can occur while building a record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("[{cite_key}] {source}")]
    Author {
        cite_key: String,
        #[source]
        source: AuthorError,
    },
}

impl BuildError {
    pub fn cite_key(&self) -> &str {
        match self {
            BuildError::Author { cite_key, .. } => cite_key,
        }
    }
}

/// One entry as handed over by the bibliography reader.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEntry {
    pub cite_type: String,
    pub cite_name: String,
    /// Field values by external name, in source order.
    pub fields: Vec<(String, String)>,
}

impl RawEntry {
    pub fn new(cite_type: impl Into<String>, cite_name: impl Into<String>) -> Self {
        RawEntry {
            cite_type: cite_type.into(),
            cite_name: cite_name.into(),
            fields: Vec::new(),
        }
    }

    /// Adds a field, builder style.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }
}

/// Returns true for a value that carries information (not empty, not a
/// placeholder).
pub fn is_informative(value: &str) -> bool {
    !value.is_empty() && value != TODO_SENTINEL && value != OPTIONAL_SENTINEL
}

/// Builds normalized records from raw entries with a fixed rule set.
#[derive(Debug, Clone, Copy)]
pub struct RecordBuilder<'a> {
    registry: &'a FieldRegistry,
    rules: &'a RuleTable,
    one_ofs: &'a OneOfGroups,
    smart: bool,
}

impl<'a> RecordBuilder<'a> {
    pub fn new(rules: &'a RuleTable, one_ofs: &'a OneOfGroups) -> Self {
        RecordBuilder {
            registry: registry(),
            rules,
            one_ofs,
            smart: false,
        }
    }

    /// Enables one-of resolution.
    pub fn smart(mut self, smart: bool) -> Self {
        self.smart = smart;
        self
    }

    /// Builds the record for `entry`.
    ///
    /// Unknown field names in the entry are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Author`] when the author field does not parse;
    /// no partial record is returned.
    pub fn build(&self, entry: &RawEntry) -> Result<Record, BuildError> {
        let mut record = self.registry.default_record();
        record.set(Field::CiteName, entry.cite_name.as_str());
        record.set(Field::CiteType, entry.cite_type.as_str());

        self.populate(&mut record, entry)?;
        self.fill_placeholders(&mut record);
        if self.smart {
            self.resolve_one_ofs(&mut record);
        }

        Ok(record)
    }

    fn populate(&self, record: &mut Record, entry: &RawEntry) -> Result<(), BuildError> {
        for (name, value) in &entry.fields {
            let field = match self.registry.lookup(name) {
                Some(Field::CiteName | Field::CiteType) | None => {
                    debug!("[{}] ignoring field {:?}", entry.cite_name, name);
                    continue;
                }
                Some(field) => field,
            };

            if field == Field::Author {
                let authors = NameList::parse(value).map_err(|source| BuildError::Author {
                    cite_key: entry.cite_name.clone(),
                    source,
                })?;
                record.set(field, authors.to_string());
            } else {
                record.set(field, value.as_str());
            }
        }
        Ok(())
    }

    /// Mandatory fields are filled first, so a field listed in both sets
    /// ends up as `(TODO)`.
    fn fill_placeholders(&self, record: &mut Record) {
        let rules = self.rules.resolve(record.cite_type());
        let passes = [
            (&rules.mandatory, TODO_SENTINEL),
            (&rules.optional, OPTIONAL_SENTINEL),
        ];

        for (names, sentinel) in passes {
            for name in names {
                if let Some(field) = self.registry.lookup(name) {
                    if record.get(field).is_empty() {
                        record.set(field, sentinel);
                    }
                }
            }
        }
    }

    /// Keeps the first informative member of each group and clears the rest.
    fn resolve_one_ofs(&self, record: &mut Record) {
        let Some(groups) = self.one_ofs.groups_for(record.cite_type()) else {
            return;
        };

        for group in groups {
            let members: Vec<Field> = group
                .iter()
                .filter_map(|name| self.registry.lookup(name))
                .collect();
            let Some(kept) = members
                .iter()
                .copied()
                .find(|&field| is_informative(record.get(field)))
            else {
                continue;
            };

            for &field in &members {
                if field != kept {
                    record.set(field, "");
                }
            }
            debug!(
                "[{}] kept {:?} from one-of group {:?}",
                record.cite_name(),
                kept,
                group
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleKind;

    fn article_rules() -> RuleTable {
        let mut rules = RuleTable::new();
        rules.insert("article", RuleKind::Mandatory, ["journal", "year"]);
        rules.insert("article", RuleKind::Optional, ["doi"]);
        rules
    }

    fn article() -> RawEntry {
        RawEntry::new("article", "mizutani2021article")
            .with_field("title", "{Title of the Article}")
            .with_field("author", "Mizutani, Iori")
    }

    #[test]
    fn test_build_sets_key_and_type() {
        let rules = RuleTable::new();
        let one_ofs = OneOfGroups::new();

        let record = RecordBuilder::new(&rules, &one_ofs).build(&article()).unwrap();

        assert_eq!(record.cite_name(), "mizutani2021article");
        assert_eq!(record.cite_type(), "article");
        assert_eq!(record.get(Field::Title), "{Title of the Article}");
    }

    #[test]
    fn test_build_fills_mandatory_and_optional() {
        // Given: an article with only title and author
        let rules = article_rules();
        let one_ofs = OneOfGroups::new();

        // When: we build it
        let record = RecordBuilder::new(&rules, &one_ofs).build(&article()).unwrap();

        // Then: missing fields get their placeholders, the rest stays empty
        assert_eq!(record.get(Field::Journal), TODO_SENTINEL);
        assert_eq!(record.get(Field::Year), TODO_SENTINEL);
        assert_eq!(record.get(Field::Doi), OPTIONAL_SENTINEL);
        assert_eq!(record.get(Field::Isbn), "");
        assert_eq!(record.get(Field::Publisher), "");
        assert_eq!(record.get(Field::Author), "Mizutani, Iori");
    }

    #[test]
    fn test_build_does_not_overwrite_present_fields() {
        let rules = article_rules();
        let one_ofs = OneOfGroups::new();
        let entry = article().with_field("year", "2021");

        let record = RecordBuilder::new(&rules, &one_ofs).build(&entry).unwrap();

        assert_eq!(record.get(Field::Year), "2021");
    }

    #[test]
    fn test_mandatory_wins_over_optional() {
        let mut rules = RuleTable::new();
        rules.insert("article", RuleKind::Mandatory, ["year"]);
        rules.insert("article", RuleKind::Optional, ["year", "doi"]);
        let one_ofs = OneOfGroups::new();

        let record = RecordBuilder::new(&rules, &one_ofs).build(&article()).unwrap();

        assert_eq!(record.get(Field::Year), TODO_SENTINEL);
        assert_eq!(record.get(Field::Doi), OPTIONAL_SENTINEL);
    }

    #[test]
    fn test_default_rules_apply_to_unknown_type() {
        let mut rules = RuleTable::new();
        rules.insert("default", RuleKind::Mandatory, ["url"]);
        let one_ofs = OneOfGroups::new();
        let entry = RawEntry::new("manual", "manual2021");

        let record = RecordBuilder::new(&rules, &one_ofs).build(&entry).unwrap();

        assert_eq!(record.get(Field::Url), TODO_SENTINEL);
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let rules = RuleTable::new();
        let one_ofs = OneOfGroups::new();
        let entry = article()
            .with_field("abstract", "Some text")
            .with_field("cite_name", "hijacked");

        let record = RecordBuilder::new(&rules, &one_ofs).build(&entry).unwrap();

        assert_eq!(record.cite_name(), "mizutani2021article");
    }

    #[test]
    fn test_author_is_normalized() {
        let rules = RuleTable::new();
        let one_ofs = OneOfGroups::new();
        let entry = RawEntry::new("misc", "ietf").with_field(
            "author",
            "  Mizutani ,Iori and Internet Engineering Task Force ",
        );

        let record = RecordBuilder::new(&rules, &one_ofs).build(&entry).unwrap();

        assert_eq!(
            record.get(Field::Author),
            "Mizutani, Iori and Internet Engineering Task Force"
        );
    }

    #[test]
    fn test_author_error_carries_cite_key() {
        let rules = article_rules();
        let one_ofs = OneOfGroups::new();
        let entry = RawEntry::new("article", "bad2021").with_field("author", "M., Iori");

        let err = RecordBuilder::new(&rules, &one_ofs).build(&entry).unwrap_err();

        assert_eq!(err.cite_key(), "bad2021");
        assert!(err.to_string().starts_with("[bad2021]"));
        assert!(err.to_string().contains("last name should not be abbreviated"));
    }

    #[test]
    fn test_smart_mode_keeps_first_informative_member() {
        // Given: doi and pages both present, grouped as alternatives
        let rules = RuleTable::new();
        let mut one_ofs = OneOfGroups::new();
        one_ofs.add("article", ["doi", "pages", "numpages"]);
        let entry = article()
            .with_field("doi", "10.1/x")
            .with_field("pages", "1--10");

        // When: we build in smart mode
        let record = RecordBuilder::new(&rules, &one_ofs)
            .smart(true)
            .build(&entry)
            .unwrap();

        // Then: doi wins by group order and pages is dropped
        assert_eq!(record.get(Field::Doi), "10.1/x");
        assert_eq!(record.get(Field::Pages), "");
    }

    #[test]
    fn test_smart_mode_skips_placeholders() {
        let rules = article_rules();
        let mut one_ofs = OneOfGroups::new();
        one_ofs.add("article", ["doi", "isbn"]);
        let entry = article().with_field("isbn", "978-3-16-148410-0");

        let record = RecordBuilder::new(&rules, &one_ofs)
            .smart(true)
            .build(&entry)
            .unwrap();

        // doi only held a placeholder, so isbn is kept and doi is cleared
        assert_eq!(record.get(Field::Isbn), "978-3-16-148410-0");
        assert_eq!(record.get(Field::Doi), "");
    }

    #[test]
    fn test_smart_mode_leaves_uninformative_group_alone() {
        let rules = article_rules();
        let mut one_ofs = OneOfGroups::new();
        one_ofs.add("article", ["doi", "isbn"]);

        let record = RecordBuilder::new(&rules, &one_ofs)
            .smart(true)
            .build(&article())
            .unwrap();

        assert_eq!(record.get(Field::Doi), OPTIONAL_SENTINEL);
        assert_eq!(record.get(Field::Isbn), "");
    }

    #[test]
    fn test_one_ofs_ignored_without_smart_mode() {
        let rules = RuleTable::new();
        let mut one_ofs = OneOfGroups::new();
        one_ofs.add("article", ["doi", "pages"]);
        let entry = article()
            .with_field("doi", "10.1/x")
            .with_field("pages", "1--10");

        let record = RecordBuilder::new(&rules, &one_ofs).build(&entry).unwrap();

        assert_eq!(record.get(Field::Pages), "1--10");
    }

    #[test]
    fn test_is_informative() {
        assert!(is_informative("2021"));
        assert!(!is_informative(""));
        assert!(!is_informative(TODO_SENTINEL));
        assert!(!is_informative(OPTIONAL_SENTINEL));
    }
}
