//! TOML annotation case files.
//!
//! ```toml
//! format = "annotation-cases-v1"
//!
//! [[cases]]
//! id = "mixed-literal-and-pattern"
//! terms = "error, /\\d+/"
//! blocks = ["error 42 ok"]
//! expected = ["[error] [42] ok"]
//! case_sensitive = false   # optional
//! word_boundary = false    # optional
//! ```

use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

pub const ANNOTATION_CASES_FORMAT_V1: &str = "annotation-cases-v1";

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct AnnotationCase {
    pub id: String,
    /// Comma-separated term input, `/source/flags` for patterns.
    pub terms: String,
    pub blocks: Vec<String>,
    pub expected: Vec<String>,
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default)]
    pub word_boundary: bool,
}

#[derive(Debug, Deserialize)]
struct CaseFile {
    format: String,
    cases: Vec<AnnotationCase>,
}

pub fn parse_annotation_cases(content: &str, origin: &str) -> Vec<AnnotationCase> {
    let file: CaseFile = toml::from_str(content)
        .unwrap_or_else(|err| panic!("failed to parse annotation cases {origin}: {err}"));
    assert_eq!(
        file.format, ANNOTATION_CASES_FORMAT_V1,
        "unsupported annotation case format in {origin}"
    );
    let mut seen = BTreeSet::new();
    for case in &file.cases {
        assert!(
            seen.insert(case.id.as_str()),
            "duplicate annotation case id in {origin}: {}",
            case.id
        );
        assert_eq!(
            case.blocks.len(),
            case.expected.len(),
            "case '{}' in {origin}: one expected line per block",
            case.id
        );
    }
    file.cases
}

pub fn load_annotation_cases(path: &Path) -> Vec<AnnotationCase> {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|err| panic!("failed to read annotation cases {path:?}: {err}"));
    parse_annotation_cases(&content, &path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::parse_annotation_cases;

    const SAMPLE: &str = r#"
format = "annotation-cases-v1"

[[cases]]
id = "one"
terms = "a"
blocks = ["a b"]
expected = ["[a] b"]
word_boundary = true
"#;

    #[test]
    fn parses_optional_flags() {
        let cases = parse_annotation_cases(SAMPLE, "inline");
        assert_eq!(cases.len(), 1);
        assert!(cases[0].word_boundary);
        assert!(!cases[0].case_sensitive);
    }

    #[test]
    #[should_panic(expected = "one expected line per block")]
    fn rejects_mismatched_expectations() {
        let bad = SAMPLE.replace(r#"expected = ["[a] b"]"#, "expected = []");
        parse_annotation_cases(&bad, "inline");
    }
}
