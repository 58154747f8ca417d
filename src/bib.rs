//! BibTeX entry reader.
//!
//! Extracts `@type{key, name = value, ...}` entries from `.bib` text and hands
//! them over as [`RawEntry`] values. Values may be `{braced}`, `"quoted"`,
//! numbers or `@string` macro names, joined with `#`. `@comment` and
//! `@preamble` blocks are skipped.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::builder::RawEntry;

lazy_static! {
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
}

/// Entry types that carry no citation.
const SKIPPED_TYPES: &[&str] = &["comment", "preamble"];

/// Month macros every BibTeX style predefines.
const MONTH_MACROS: &[(&str, &str)] = &[
    ("jan", "January"),
    ("feb", "February"),
    ("mar", "March"),
    ("apr", "April"),
    ("may", "May"),
    ("jun", "June"),
    ("jul", "July"),
    ("aug", "August"),
    ("sep", "September"),
    ("oct", "October"),
    ("nov", "November"),
    ("dec", "December"),
];

/// Errors that can occur when reading `.bib` text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BibError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("line {line}: undefined string macro {name:?}")]
    UndefinedMacro { line: usize, name: String },

    #[error("line {line}: unterminated entry")]
    Unterminated { line: usize },
}

/// Parses every entry in `input`, in source order.
///
/// Entry types and field names are lower-cased; whitespace runs inside
/// values are collapsed to a single space. `@string` definitions apply to
/// the entries that follow them.
///
/// # Examples
///
/// ```
/// use bibfuse::parse_entries;
///
/// let entries = parse_entries("@Article{key, Title = {{A Title}}, year = 2021}").unwrap();
/// assert_eq!(entries[0].cite_type, "article");
/// assert_eq!(entries[0].fields[0], ("title".to_string(), "{A Title}".to_string()));
/// assert_eq!(entries[0].fields[1], ("year".to_string(), "2021".to_string()));
/// ```
pub fn parse_entries(input: &str) -> Result<Vec<RawEntry>, BibError> {
    let mut scanner = Scanner::new(input);
    let mut macros: HashMap<String, String> = MONTH_MACROS
        .iter()
        .map(|(name, expansion)| (name.to_string(), expansion.to_string()))
        .collect();
    let mut entries = Vec::new();

    while scanner.skip_to('@') {
        let start_line = scanner.line();
        scanner.bump();
        let cite_type = scanner.take_while(|c| c.is_alphanumeric() || c == '_' || c == '-');
        let cite_type = cite_type.to_lowercase();
        scanner.skip_whitespace();

        let close = match scanner.bump() {
            Some('{') => '}',
            Some('(') => ')',
            _ => {
                return Err(BibError::Syntax {
                    line: start_line,
                    message: format!("expected '{{' or '(' after @{}", cite_type),
                })
            }
        };

        if SKIPPED_TYPES.contains(&cite_type.as_str()) {
            scanner.skip_group(close, start_line)?;
            continue;
        }

        if cite_type == "string" {
            let (name, expansion) = scanner.string_definition(close, start_line, &macros)?;
            macros.insert(name, expansion);
            continue;
        }

        entries.push(scanner.entry_body(cite_type, close, start_line, &macros)?);
    }

    Ok(entries)
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | ':' | '.')
}

struct Scanner<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Scanner {
            input,
            pos: 0,
            line: 1,
        }
    }

    fn line(&self) -> usize {
        self.line
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn advance_to(&mut self, end: usize) {
        self.line += self.input[self.pos..end].matches('\n').count();
        self.pos = end;
    }

    /// Moves to the next `target`; false at end of input.
    fn skip_to(&mut self, target: char) -> bool {
        match self.input[self.pos..].find(target) {
            Some(offset) => {
                self.advance_to(self.pos + offset);
                true
            }
            None => {
                self.advance_to(self.input.len());
                false
            }
        }
    }

    fn skip_whitespace(&mut self) {
        self.take_while(char::is_whitespace);
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        let rest = &self.input[start..];
        let len = rest.find(|c: char| !pred(c)).unwrap_or(rest.len());
        self.advance_to(start + len);
        &self.input[start..self.pos]
    }

    fn expect(&mut self, expected: char) -> Result<(), BibError> {
        let line = self.line();
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(BibError::Syntax {
                line,
                message: format!("expected {:?}, found {:?}", expected, c),
            }),
            None => Err(BibError::Unterminated { line }),
        }
    }

    /// Skips to the matching `close`, honoring nested braces.
    fn skip_group(&mut self, close: char, start_line: usize) -> Result<(), BibError> {
        let mut depth = 0usize;
        while let Some(c) = self.bump() {
            match c {
                '{' => depth += 1,
                '}' if depth > 0 => depth -= 1,
                c if c == close && depth == 0 => return Ok(()),
                _ => {}
            }
        }
        Err(BibError::Unterminated { line: start_line })
    }

    /// Reads the `name = value` body of an `@string` block.
    fn string_definition(
        &mut self,
        close: char,
        start_line: usize,
        macros: &HashMap<String, String>,
    ) -> Result<(String, String), BibError> {
        self.skip_whitespace();
        let name = self.take_while(is_name_char).to_lowercase();
        if name.is_empty() {
            return Err(BibError::Syntax {
                line: self.line(),
                message: "expected a macro name in @string".to_string(),
            });
        }
        self.skip_whitespace();
        self.expect('=')?;
        let expansion = self.value(close, start_line, macros)?;
        self.skip_whitespace();
        if self.peek().is_none() {
            return Err(BibError::Unterminated { line: start_line });
        }
        self.expect(close)?;
        Ok((name, expansion))
    }

    fn entry_body(
        &mut self,
        cite_type: String,
        close: char,
        start_line: usize,
        macros: &HashMap<String, String>,
    ) -> Result<RawEntry, BibError> {
        self.skip_whitespace();
        let cite_name = self
            .take_while(|c| c != ',' && c != close && !c.is_whitespace())
            .to_string();
        if cite_name.is_empty() {
            return Err(BibError::Syntax {
                line: start_line,
                message: format!("missing citation key for @{}", cite_type),
            });
        }
        let mut entry = RawEntry::new(cite_type, cite_name);

        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(c) if c == close => {
                    self.bump();
                    return Ok(entry);
                }
                Some(_) => {
                    return Err(BibError::Syntax {
                        line: self.line(),
                        message: format!("expected ',' in entry {}", entry.cite_name),
                    })
                }
                None => return Err(BibError::Unterminated { line: start_line }),
            }

            self.skip_whitespace();
            match self.peek() {
                Some(c) if c == close => continue,
                None => return Err(BibError::Unterminated { line: start_line }),
                _ => {}
            }

            let name = self.take_while(is_name_char).to_lowercase();
            if name.is_empty() {
                return Err(BibError::Syntax {
                    line: self.line(),
                    message: format!("expected a field name in entry {}", entry.cite_name),
                });
            }
            self.skip_whitespace();
            self.expect('=')?;
            let value = self.value(close, start_line, macros)?;
            entry.fields.push((name, normalize_whitespace(&value)));
        }
    }

    /// Reads one value: pieces joined with `#`, macros expanded.
    fn value(
        &mut self,
        close: char,
        start_line: usize,
        macros: &HashMap<String, String>,
    ) -> Result<String, BibError> {
        let mut value = String::new();
        loop {
            self.skip_whitespace();
            let line = self.line();
            match self.peek() {
                Some('{') => {
                    self.bump();
                    value.push_str(self.delimited(|c, depth| c == '}' && depth == 0, start_line)?);
                }
                Some('"') => {
                    self.bump();
                    value.push_str(self.delimited(|c, depth| c == '"' && depth == 0, start_line)?);
                }
                Some(c) if c.is_ascii_digit() => {
                    value.push_str(self.take_while(|c| c.is_ascii_digit()));
                }
                Some(c) if c.is_alphabetic() || c == '_' => {
                    let name = self.take_while(is_name_char);
                    match macros.get(&name.to_lowercase()) {
                        Some(expansion) => value.push_str(expansion),
                        None => {
                            return Err(BibError::UndefinedMacro {
                                line,
                                name: name.to_string(),
                            })
                        }
                    }
                }
                Some(c) if c == ',' || c == close => {
                    return Err(BibError::Syntax {
                        line,
                        message: "empty field value".to_string(),
                    })
                }
                Some(c) => {
                    return Err(BibError::Syntax {
                        line,
                        message: format!("unexpected {:?} in field value", c),
                    })
                }
                None => return Err(BibError::Unterminated { line: start_line }),
            }

            self.skip_whitespace();
            if self.peek() == Some('#') {
                self.bump();
            } else {
                return Ok(value);
            }
        }
    }

    /// Returns the text up to the closing delimiter, which is consumed.
    fn delimited(
        &mut self,
        is_end: impl Fn(char, usize) -> bool,
        start_line: usize,
    ) -> Result<&'a str, BibError> {
        let start = self.pos;
        let mut depth = 0usize;
        while let Some(c) = self.peek() {
            if is_end(c, depth) {
                let inner = &self.input[start..self.pos];
                self.bump();
                return Ok(inner);
            }
            match c {
                '{' => depth += 1,
                '}' => depth = depth.saturating_sub(1),
                _ => {}
            }
            self.bump();
        }
        Err(BibError::Unterminated { line: start_line })
    }
}

fn normalize_whitespace(value: &str) -> String {
    WHITESPACE_RUN.replace_all(value.trim(), " ").into_owned()
}
