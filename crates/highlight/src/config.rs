use crate::terms::Term;
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tree::{Attribute, StyleEntry};

/// Reserved attribute carried by every marker node (`data-highlighter="true"`).
pub const MARKER_ATTR: &str = "data-highlighter";

/// Reserved attribute stamped on an instance's root; its value is the `ScopeId`.
pub const SCOPE_ATTR: &str = "data-highlighter-scope";

/// Characters that carry meaning in a match expression.
pub const DEFAULT_ESCAPE_SOURCE: &str = r"[.*+?^${}()|\[\]\\]";

static DEFAULT_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DEFAULT_ESCAPE_SOURCE).expect("default escape pattern is valid"));

pub fn default_escape_pattern() -> Regex {
    DEFAULT_ESCAPE.clone()
}

/// How marker nodes look. Applied opaquely; never validated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Presentation {
    pub tag: Arc<str>,
    pub attributes: Vec<Attribute>,
    pub style: Vec<StyleEntry>,
}

impl Presentation {
    pub fn with_style(entries: &[(&str, &str)]) -> Self {
        Self {
            style: entries
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            ..Self::default()
        }
    }
}

impl Default for Presentation {
    fn default() -> Self {
        Self {
            tag: Arc::from("mark"),
            attributes: Vec::new(),
            style: vec![
                ("background-color".to_string(), "yellow".to_string()),
                ("font-weight".to_string(), "bold".to_string()),
            ],
        }
    }
}

/// Everything that determines the match expression and the marker shape.
///
/// Defaults:
/// - `terms`: empty (clear-only)
/// - `case_sensitive`: false
/// - `word_boundary`: false
/// - `escape_pattern`: [`DEFAULT_ESCAPE_SOURCE`]; `None` inserts literals raw
/// - `presentation`: [`Presentation::default`]
/// - `debug`: false (gates diagnostic tracing only)
#[derive(Clone, Debug)]
pub struct MatchConfig {
    pub terms: Vec<Term>,
    pub case_sensitive: bool,
    pub word_boundary: bool,
    pub escape_pattern: Option<Regex>,
    pub presentation: Presentation,
    pub debug: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            terms: Vec::new(),
            case_sensitive: false,
            word_boundary: false,
            escape_pattern: Some(default_escape_pattern()),
            presentation: Presentation::default(),
            debug: false,
        }
    }
}

impl MatchConfig {
    pub fn with_terms<T: Into<Term>>(mut self, terms: impl IntoIterator<Item = T>) -> Self {
        self.terms = terms.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn with_word_boundary(mut self, word_boundary: bool) -> Self {
        self.word_boundary = word_boundary;
        self
    }

    pub fn with_escape_pattern(mut self, escape_pattern: Option<Regex>) -> Self {
        self.escape_pattern = escape_pattern;
        self
    }

    pub fn with_presentation(mut self, presentation: Presentation) -> Self {
        self.presentation = presentation;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}
