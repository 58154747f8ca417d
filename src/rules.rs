//! Per-citation-type field rules.
//!
//! [`RuleTable`] says which fields are mandatory (`todos`) and optional
//! (`optionals`) for each citation type; [`OneOfGroups`] lists groups of
//! mutually redundant fields. Both are plain data filled by [`crate::config`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Citation type used when a specific type has no rules.
pub const DEFAULT_CITATION_TYPE: &str = "default";

static EMPTY_RULE_SET: RuleSet = RuleSet {
    mandatory: BTreeSet::new(),
    optional: BTreeSet::new(),
};

/// Kind of a rule list in the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// Fields filled with `(TODO)` when empty.
    Mandatory,
    /// Fields filled with `(OPTIONAL)` when empty.
    Optional,
}

impl RuleKind {
    pub fn config_key(self) -> &'static str {
        match self {
            RuleKind::Mandatory => "todos",
            RuleKind::Optional => "optionals",
        }
    }
}

impl FromStr for RuleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todos" => Ok(RuleKind::Mandatory),
            "optionals" => Ok(RuleKind::Optional),
            other => Err(format!("unknown rule kind: {}", other)),
        }
    }
}

/// Mandatory and optional field names for one citation type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    pub mandatory: BTreeSet<String>,
    pub optional: BTreeSet<String>,
}

impl RuleSet {
    pub fn is_mandatory(&self, field: &str) -> bool {
        self.mandatory.contains(field)
    }

    pub fn is_optional(&self, field: &str) -> bool {
        self.optional.contains(field)
    }

    fn fields_mut(&mut self, kind: RuleKind) -> &mut BTreeSet<String> {
        match kind {
            RuleKind::Mandatory => &mut self.mandatory,
            RuleKind::Optional => &mut self.optional,
        }
    }
}

/// Rule sets keyed by citation type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleTable {
    rules: BTreeMap<String, RuleSet>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the `kind` list of `citation_type` with `fields`.
    pub fn insert<I, S>(&mut self, citation_type: &str, kind: RuleKind, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set = self
            .rules
            .entry(citation_type.to_string())
            .or_default()
            .fields_mut(kind);
        *set = fields.into_iter().map(Into::into).collect();
    }

    pub fn get(&self, citation_type: &str) -> Option<&RuleSet> {
        self.rules.get(citation_type)
    }

    /// Rules for `citation_type`, falling back to the `default` entry, then
    /// to an empty rule set.
    pub fn resolve(&self, citation_type: &str) -> &RuleSet {
        self.rules
            .get(citation_type)
            .or_else(|| self.rules.get(DEFAULT_CITATION_TYPE))
            .unwrap_or(&EMPTY_RULE_SET)
    }

    pub fn citation_types(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Ordered one-of groups keyed by citation type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OneOfGroups {
    groups: BTreeMap<String, Vec<Vec<String>>>,
}

impl OneOfGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a group for `citation_type`, keeping member order.
    pub fn add<I, S>(&mut self, citation_type: &str, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups
            .entry(citation_type.to_string())
            .or_default()
            .push(fields.into_iter().map(Into::into).collect());
    }

    pub fn groups_for(&self, citation_type: &str) -> Option<&[Vec<String>]> {
        self.groups.get(citation_type).map(Vec::as_slice)
    }

    pub fn citation_types(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |set: &BTreeSet<String>| set.iter().cloned().collect::<Vec<_>>().join(", ");
        write!(
            f,
            "{}: [{}]; {}: [{}]",
            RuleKind::Mandatory.config_key(),
            join(&self.mandatory),
            RuleKind::Optional.config_key(),
            join(&self.optional)
        )
    }
}
