//! Name cleaning.
//!
//! Validates and normalizes single first/last name strings before they are
//! assembled into an author list.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    /// Runs of two or more backslashes left over from repeated escaping.
    static ref BACKSLASH_RUN: Regex = Regex::new(r"\\{2,}").unwrap();

    /// A capital initial followed by anything other than a period, a letter
    /// or markup delimiters, or by the end of the string.
    static ref UNTERMINATED_INITIAL: Regex =
        Regex::new(r"\b[A-ZÀ-Ú]([^.\p{L}\{\}\(\)]|\z)").unwrap();

    /// A last name made of a single capital initial.
    static ref ABBREVIATED_LAST_NAME: Regex = Regex::new(r"\A[A-ZÀ-Ú]\.\z").unwrap();
}

/// Errors raised when a name part fails validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("no dot in abbreviation: {0:?}")]
    InvalidAbbreviation(String),

    #[error("last name should not be abbreviated: {0:?}")]
    LastNameAbbreviated(String),
}

/// A single author name.
///
/// `first_name` is empty for single-unit authors such as organizations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name {
    pub first_name: String,
    pub last_name: String,
}

impl Name {
    /// Cleans and validates both parts of a name.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure, first name checked first.
    pub fn new(first_name: &str, last_name: &str) -> Result<Self, NameError> {
        let first_name = clean_first_name(first_name)?;
        let last_name = clean_last_name(last_name)?;
        Ok(Name {
            first_name,
            last_name,
        })
    }
}

/// Collapses every run of backslashes to a single backslash.
pub fn collapse_backslashes(name: &str) -> String {
    BACKSLASH_RUN.replace_all(name, r"\").into_owned()
}

/// Returns a cleaned-up first name.
///
/// Initials must be terminated by a period (`"William B."`, not
/// `"William B"`). Capitals inside `{...}` or `(...)` groups are BibTeX
/// markup and are not checked.
///
/// # Errors
///
/// Returns [`NameError::InvalidAbbreviation`] for an unterminated initial.
pub fn clean_first_name(first_name: &str) -> Result<String, NameError> {
    let cleaned = collapse_backslashes(first_name);
    let unterminated = UNTERMINATED_INITIAL
        .find_iter(&cleaned)
        .any(|m| group_depth(&cleaned[..m.start()]) == 0);
    if unterminated {
        return Err(NameError::InvalidAbbreviation(cleaned));
    }
    Ok(cleaned)
}

/// Returns a cleaned-up last name.
///
/// # Errors
///
/// Returns [`NameError::LastNameAbbreviated`] when the last name is a bare
/// initial such as `"M."`.
pub fn clean_last_name(last_name: &str) -> Result<String, NameError> {
    let cleaned = collapse_backslashes(last_name);
    if ABBREVIATED_LAST_NAME.is_match(&cleaned) {
        return Err(NameError::LastNameAbbreviated(cleaned));
    }
    Ok(cleaned)
}

/// Brace/parenthesis nesting depth at the end of `prefix`.
fn group_depth(prefix: &str) -> usize {
    prefix.chars().fold(0usize, |depth, c| match c {
        '{' | '(' => depth + 1,
        '}' | ')' => depth.saturating_sub(1),
        _ => depth,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- Tests for collapse_backslashes ---

    #[test]
    fn test_collapse_backslashes_repeated_escapes() {
        assert_eq!(collapse_backslashes(r"M \\\\\\\& A"), r"M \& A");
        assert_eq!(collapse_backslashes(r"M \\\\\\& A"), r"M \& A");
        assert_eq!(collapse_backslashes(r"M \\& A"), r"M \& A");
    }

    #[test]
    fn test_collapse_backslashes_single_is_untouched() {
        assert_eq!(collapse_backslashes(r"M \& A"), r"M \& A");
        assert_eq!(collapse_backslashes("Mizutani"), "Mizutani");
    }

    #[test]
    fn test_clean_is_idempotent() {
        for input in [r"S{\o}ren Aabye", "William B.", r"Jos\\\\'e"] {
            let once = clean_first_name(input).unwrap();
            assert_eq!(clean_first_name(&once).unwrap(), once, "first name {:?}", input);
        }
        for input in [r"M \\\\& A", "Mizutani"] {
            let once = clean_last_name(input).unwrap();
            assert_eq!(clean_last_name(&once).unwrap(), once, "last name {:?}", input);
        }
    }

    // --- Tests for clean_first_name ---

    #[test]
    fn test_first_name_plain() {
        assert_eq!(clean_first_name("Iori").unwrap(), "Iori");
        assert_eq!(
            clean_first_name("Salvador Domingo Felipe Jacinto").unwrap(),
            "Salvador Domingo Felipe Jacinto"
        );
    }

    #[test]
    fn test_first_name_terminated_initial() {
        assert_eq!(clean_first_name("William B.").unwrap(), "William B.");
        assert_eq!(clean_first_name("J.-P.").unwrap(), "J.-P.");
    }

    #[test]
    fn test_first_name_unterminated_initial_at_end() {
        // Given: a first name ending in a bare initial
        let result = clean_first_name("William B");

        // Then: it is rejected
        assert_eq!(
            result,
            Err(NameError::InvalidAbbreviation("William B".to_string()))
        );
    }

    #[test]
    fn test_first_name_unterminated_initial_in_middle() {
        assert!(matches!(
            clean_first_name("John F Kennedy"),
            Err(NameError::InvalidAbbreviation(_))
        ));
    }

    #[test]
    fn test_first_name_accented_initial() {
        assert!(clean_first_name("Émile").is_ok());
        assert!(matches!(
            clean_first_name("Jean É"),
            Err(NameError::InvalidAbbreviation(_))
        ));
    }

    #[test]
    fn test_first_name_capital_followed_by_any_letter() {
        assert_eq!(clean_first_name("Oğuz").unwrap(), "Oğuz");
        assert_eq!(clean_first_name("Łukasz Şahin").unwrap(), "Łukasz Şahin");
        assert!(clean_first_name("Oğuz K").is_err());
    }

    #[test]
    fn test_first_name_brace_markup_is_tolerated() {
        assert_eq!(
            clean_first_name(r"S{\o}ren Aabye").unwrap(),
            r"S{\o}ren Aabye"
        );
        assert!(clean_first_name(r"{\'E}mile").is_ok());
        assert!(clean_first_name("{J R} Tolkien").is_ok());
        assert!(clean_first_name("(J R) Tolkien").is_ok());
    }

    #[test]
    fn test_first_name_empty() {
        assert_eq!(clean_first_name("").unwrap(), "");
    }

    // --- Tests for clean_last_name ---

    #[test]
    fn test_last_name_plain() {
        assert_eq!(clean_last_name("Mizutani").unwrap(), "Mizutani");
        assert_eq!(clean_last_name(r"M \\\\& A").unwrap(), r"M \& A");
    }

    #[test]
    fn test_last_name_abbreviated() {
        assert_eq!(
            clean_last_name("M."),
            Err(NameError::LastNameAbbreviated("M.".to_string()))
        );
    }

    #[test]
    fn test_last_name_initial_without_period_is_accepted() {
        // Only the exact "X." form counts as an abbreviated surname
        assert!(clean_last_name("M").is_ok());
        assert!(clean_last_name("Mc.").is_ok());
    }

    // --- Tests for Name::new ---

    #[test]
    fn test_name_new() {
        let name = Name::new("Iori", "Mizutani").unwrap();
        assert_eq!(
            name,
            Name {
                first_name: "Iori".to_string(),
                last_name: "Mizutani".to_string(),
            }
        );
    }

    #[test]
    fn test_name_new_with_markup() {
        let last = r"Dal{\'i} i Dom{\`e}nech";
        let name = Name::new("Salvador", last).unwrap();
        assert_eq!(name.last_name, last);
    }

    #[test]
    fn test_name_new_rejects_abbreviated_last_name() {
        assert!(matches!(
            Name::new("Iori", "M."),
            Err(NameError::LastNameAbbreviated(_))
        ));
    }
}
