//! Author field parsing.
//!
//! Splits a raw BibTeX author field (`"Last, First and Last2, First2"`) into
//! structured [`Name`]s and renders them back to canonical text.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::name::{Name, NameError};

/// Separator between authors in an author field.
pub const AUTHOR_SEPARATOR: &str = " and ";

/// Errors that can occur when parsing an author field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthorError {
    #[error("too many commas in author {0:?}")]
    TooManyCommas(String),

    #[error("invalid author {segment:?}: {source}")]
    InvalidName {
        segment: String,
        #[source]
        source: NameError,
    },
}

impl AuthorError {
    /// The author segment that failed to parse.
    pub fn segment(&self) -> &str {
        match self {
            AuthorError::TooManyCommas(segment) => segment,
            AuthorError::InvalidName { segment, .. } => segment,
        }
    }
}

/// Ordered list of authors, in order of appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameList(Vec<Name>);

impl NameList {
    /// Parses a raw author field.
    ///
    /// Each `" and "`-separated segment is either `"Last, First"` or a single
    /// unit with no comma (e.g. an organization). Blank segments are skipped.
    ///
    /// # Errors
    ///
    /// The first failing segment aborts the whole parse.
    ///
    /// # Examples
    ///
    /// ```
    /// use bibfuse::NameList;
    ///
    /// let authors = NameList::parse("Mizutani, Iori and Internet Engineering Task Force").unwrap();
    /// assert_eq!(authors.len(), 2);
    /// assert_eq!(authors.names()[1].first_name, "");
    /// assert_eq!(
    ///     authors.to_string(),
    ///     "Mizutani, Iori and Internet Engineering Task Force"
    /// );
    /// ```
    pub fn parse(raw: &str) -> Result<Self, AuthorError> {
        let mut names = Vec::new();

        for segment in raw.split(AUTHOR_SEPARATOR) {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            names.push(parse_segment(segment)?);
        }

        Ok(NameList(names))
    }

    /// The parsed names.
    pub fn names(&self) -> &[Name] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn parse_segment(segment: &str) -> Result<Name, AuthorError> {
    let parts: Vec<&str> = segment.split(',').collect();
    let (first_name, last_name) = match parts.as_slice() {
        [last] => ("", last.trim()),
        [last, first] => (first.trim(), last.trim()),
        _ => return Err(AuthorError::TooManyCommas(segment.to_string())),
    };

    Name::new(first_name, last_name).map_err(|source| AuthorError::InvalidName {
        segment: segment.to_string(),
        source,
    })
}

impl fmt::Display for NameList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, name) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(AUTHOR_SEPARATOR)?;
            }
            if name.first_name.is_empty() {
                f.write_str(&name.last_name)?;
            } else {
                write!(f, "{}, {}", name.last_name, name.first_name)?;
            }
        }
        Ok(())
    }
}

impl FromStr for NameList {
    type Err = AuthorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NameList::parse(s)
    }
}
