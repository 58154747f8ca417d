//! Shared test constants and helpers for integration tests.

use std::io::Write;

use tempfile::NamedTempFile;

/// Rule configuration used across the integration tests.
///
/// Mirrors the builtin article/book rules, with an explicit `default` entry
/// and the DOI one-of groups of the article type.
pub const TEST_RULES: &str = r#"
[default]
todos = ["author", "title", "year"]

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
"#;

/// Create a temporary file with the given content and extension.
pub fn create_temp_file(content: &str, extension: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(extension)
        .tempfile()
        .unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
