//! Search terms and the match expression compiled from them.
//!
//! A [`Term`] is either literal text or a caller-supplied [`Pattern`]. All
//! effective terms of a [`MatchConfig`] are joined into one alternation; the
//! annotator splits text leaves on it and then asks [`CompiledTerms::is_term`]
//! whether each fragment is a term.

use crate::config::MatchConfig;
use regex::{Regex, RegexBuilder};
use std::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PatternFlags {
    pub case_insensitive: bool,
    pub multi_line: bool,
    pub dot_matches_new_line: bool,
}

impl PatternFlags {
    /// Flag letters as written after a `/source/` term: `i`, `m`, `s`.
    pub fn parse(flags: &str) -> Result<Self, TermError> {
        let mut out = Self::default();
        for ch in flags.chars() {
            match ch {
                'i' => out.case_insensitive = true,
                'm' => out.multi_line = true,
                's' => out.dot_matches_new_line = true,
                other => return Err(TermError::UnknownFlag(other)),
            }
        }
        Ok(out)
    }
}

/// A caller-supplied match expression. The source is kept verbatim; flags are
/// honored when the pattern re-tests a fragment.
#[derive(Clone, Debug)]
pub struct Pattern {
    source: String,
    flags: PatternFlags,
    regex: Regex,
}

impl Pattern {
    pub fn new(source: &str) -> Result<Self, TermError> {
        Self::with_flags(source, PatternFlags::default())
    }

    pub fn with_flags(source: &str, flags: PatternFlags) -> Result<Self, TermError> {
        let regex = build(source, flags, false).map_err(|err| TermError::InvalidPattern {
            source: source.to_string(),
            message: err.to_string(),
        })?;
        Ok(Self {
            source: source.to_string(),
            flags,
            regex,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn flags(&self) -> PatternFlags {
        self.flags
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Source as it appears inside the combined alternation. Own flags are
    /// carried as an inline group so they survive the join.
    fn inline_source(&self) -> String {
        let mut letters = String::new();
        if self.flags.case_insensitive {
            letters.push('i');
        }
        if self.flags.multi_line {
            letters.push('m');
        }
        if self.flags.dot_matches_new_line {
            letters.push('s');
        }
        if letters.is_empty() {
            format!("(?:{})", self.source)
        } else {
            format!("(?{letters}:{})", self.source)
        }
    }

    fn tester(&self, force_case_insensitive: bool) -> Result<Regex, regex::Error> {
        if force_case_insensitive && !self.flags.case_insensitive {
            build(&self.source, self.flags, true)
        } else {
            Ok(self.regex.clone())
        }
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.flags == other.flags
    }
}

impl Eq for Pattern {}

fn build(source: &str, flags: PatternFlags, force_ci: bool) -> Result<Regex, regex::Error> {
    RegexBuilder::new(source)
        .case_insensitive(flags.case_insensitive || force_ci)
        .multi_line(flags.multi_line)
        .dot_matches_new_line(flags.dot_matches_new_line)
        .build()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Term {
    Literal(String),
    Pattern(Pattern),
}

impl Term {
    pub fn literal(text: impl Into<String>) -> Self {
        Term::Literal(text.into())
    }

    pub fn pattern(source: &str) -> Result<Self, TermError> {
        Pattern::new(source).map(Term::Pattern)
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Term::Literal(text) => text.is_empty(),
            Term::Pattern(p) => p.source.is_empty(),
        }
    }
}

impl From<&str> for Term {
    fn from(text: &str) -> Self {
        Term::Literal(text.to_string())
    }
}

impl From<String> for Term {
    fn from(text: String) -> Self {
        Term::Literal(text)
    }
}

impl From<Pattern> for Term {
    fn from(pattern: Pattern) -> Self {
        Term::Pattern(pattern)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TermError {
    InvalidPattern { source: String, message: String },
    UnknownFlag(char),
}

impl fmt::Display for TermError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TermError::InvalidPattern { source, message } => {
                write!(f, "invalid pattern /{source}/: {message}")
            }
            TermError::UnknownFlag(ch) => write!(f, "unknown pattern flag '{ch}'"),
        }
    }
}

impl std::error::Error for TermError {}

/// Parse comma-separated user input into terms.
///
/// Entries are trimmed and empty ones dropped. `/source/` (optionally followed
/// by flag letters) becomes a [`Pattern`]; if it does not compile, the entry
/// is kept as a literal of the whole text.
pub fn parse_terms(input: &str) -> Vec<Term> {
    input
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match parse_pattern(entry) {
            Some(Ok(pattern)) => Term::Pattern(pattern),
            Some(Err(err)) => {
                log::debug!(target: "highlight.terms", "{err}; keeping {entry:?} as literal");
                Term::literal(entry)
            }
            None => Term::literal(entry),
        })
        .collect()
}

fn parse_pattern(entry: &str) -> Option<Result<Pattern, TermError>> {
    let body = entry.strip_prefix('/')?;
    let close = body.rfind('/')?;
    let (source, flags) = (&body[..close], &body[close + 1..]);
    if source.is_empty() {
        return None;
    }
    Some(PatternFlags::parse(flags).and_then(|flags| Pattern::with_flags(source, flags)))
}

/// Terms with empty entries and duplicates removed, first occurrence kept.
pub fn effective_terms(terms: &[Term]) -> Vec<&Term> {
    let mut out: Vec<&Term> = Vec::with_capacity(terms.len());
    for term in terms {
        if term.is_empty() || out.contains(&term) {
            continue;
        }
        out.push(term);
    }
    out
}

/// The combined expression plus per-term predicates.
#[derive(Debug)]
pub struct CompiledTerms {
    expression: Regex,
    /// One per term. Literals are anchored so they fold case the same way
    /// `expression` does.
    matchers: Vec<Regex>,
}

/// Compile the effective terms of `config`. `None` means there is nothing to
/// mark: no effective terms, or the combined expression failed to compile.
pub fn compile(config: &MatchConfig) -> Option<CompiledTerms> {
    let terms = effective_terms(&config.terms);
    if terms.is_empty() {
        return None;
    }

    let mut alternatives = Vec::with_capacity(terms.len());
    let mut matchers = Vec::with_capacity(terms.len());
    for term in terms {
        match term {
            Term::Literal(text) => {
                alternatives.push(literal_expression(text, config));
                let whole = format!("^{}$", regex::escape(text.trim()));
                match RegexBuilder::new(&whole)
                    .case_insensitive(!config.case_sensitive)
                    .build()
                {
                    Ok(regex) => matchers.push(regex),
                    Err(err) => log::warn!(
                        target: "highlight.terms",
                        "literal {text:?} cannot re-test fragments: {err}"
                    ),
                }
            }
            Term::Pattern(pattern) => {
                alternatives.push(pattern.inline_source());
                match pattern.tester(!config.case_sensitive) {
                    Ok(regex) => matchers.push(regex),
                    Err(err) => log::warn!(
                        target: "highlight.terms",
                        "pattern /{}/ cannot re-test fragments: {err}",
                        pattern.source()
                    ),
                }
            }
        }
    }

    let source = format!("({})", alternatives.join("|"));
    match RegexBuilder::new(&source)
        .case_insensitive(!config.case_sensitive)
        .build()
    {
        Ok(expression) => {
            log::trace!(target: "highlight.terms", "compiled {source}");
            Some(CompiledTerms {
                expression,
                matchers,
            })
        }
        Err(err) => {
            log::warn!(target: "highlight.terms", "match expression {source} rejected: {err}");
            None
        }
    }
}

fn literal_expression(text: &str, config: &MatchConfig) -> String {
    let escaped = match &config.escape_pattern {
        Some(escape) => escape.replace_all(text, "\\$0").into_owned(),
        None => text.to_string(),
    };
    let escaped = if Regex::new(&escaped).is_ok() {
        escaped
    } else {
        log::debug!(target: "highlight.terms", "literal {text:?} is not a valid expression; escaping fully");
        regex::escape(text)
    };
    if config.word_boundary {
        format!(r"\b(?:{escaped})\b")
    } else {
        format!("(?:{escaped})")
    }
}

impl CompiledTerms {
    pub fn expression(&self) -> &Regex {
        &self.expression
    }

    /// Split `text` into alternating non-match / match fragments.
    ///
    /// Always returns at least one fragment; a single fragment means nothing
    /// matched. Fragments may be empty at the edges. Empty matches never split.
    pub fn split<'t>(&self, text: &'t str) -> Vec<&'t str> {
        let mut out = Vec::new();
        let mut last = 0;
        for m in self.expression.find_iter(text) {
            if m.start() == m.end() {
                continue;
            }
            out.push(&text[last..m.start()]);
            out.push(m.as_str());
            last = m.end();
        }
        out.push(&text[last..]);
        out
    }

    /// Whether `fragment` is one of the terms: a literal equal to the trimmed
    /// term, or a pattern that matches it.
    pub fn is_term(&self, fragment: &str) -> bool {
        self.matchers.iter().any(|matcher| matcher.is_match(fragment))
    }
}

#[cfg(test)]
mod tests {
    use super::{PatternFlags, Term, TermError, compile, effective_terms, parse_terms};
    use crate::config::MatchConfig;

    fn compiled(config: MatchConfig) -> super::CompiledTerms {
        compile(&config).expect("compiles")
    }

    #[test]
    fn no_effective_terms_compiles_to_none() {
        assert!(compile(&MatchConfig::default()).is_none());
        assert!(compile(&MatchConfig::default().with_terms(["", ""])).is_none());
    }

    #[test]
    fn duplicates_and_empties_are_dropped() {
        let terms = vec![
            Term::literal("a"),
            Term::literal(""),
            Term::literal("a"),
            Term::pattern(r"\d+").unwrap(),
            Term::pattern(r"\d+").unwrap(),
        ];
        assert_eq!(effective_terms(&terms).len(), 2);
    }

    #[test]
    fn literals_are_escaped() {
        let c = compiled(MatchConfig::default().with_terms(["a.b"]));
        assert_eq!(c.split("axb a.b"), vec!["axb ", "a.b", ""]);
    }

    #[test]
    fn unescaped_literal_acts_as_expression() {
        let c = compiled(
            MatchConfig::default()
                .with_terms(["a.b"])
                .with_escape_pattern(None),
        );
        assert_eq!(c.split("axb"), vec!["", "axb", ""]);
        // Fragment equality still decides marking.
        assert!(!c.is_term("axb"));
        assert!(c.is_term("a.b"));
    }

    #[test]
    fn invalid_raw_literal_falls_back_to_escaped() {
        let c = compiled(
            MatchConfig::default()
                .with_terms(["(oops"])
                .with_escape_pattern(None),
        );
        assert_eq!(c.split("x (oops y"), vec!["x ", "(oops", " y"]);
    }

    #[test]
    fn case_insensitive_by_default() {
        let c = compiled(MatchConfig::default().with_terms(["Error"]));
        assert_eq!(c.split("ERROR here"), vec!["", "ERROR", " here"]);
        assert!(c.is_term("error"));
    }

    #[test]
    fn classification_folds_case_like_the_split() {
        // U+017F LATIN SMALL LETTER LONG S folds to `s` but does not lowercase to it.
        let c = compiled(MatchConfig::default().with_terms(["sun"]));
        assert_eq!(c.split("\u{17F}un up"), vec!["", "\u{17F}un", " up"]);
        assert!(c.is_term("\u{17F}un"));
        assert!(!c.is_term("sun up"));
    }

    #[test]
    fn case_sensitive_matching() {
        let c = compiled(
            MatchConfig::default()
                .with_terms(["Error"])
                .with_case_sensitive(true),
        );
        assert_eq!(c.split("ERROR Error"), vec!["ERROR ", "Error", ""]);
        assert!(!c.is_term("error"));
    }

    #[test]
    fn word_boundary_requires_whole_words() {
        let c = compiled(
            MatchConfig::default()
                .with_terms(["cat"])
                .with_word_boundary(true),
        );
        assert_eq!(c.split("concatenate cat"), vec!["concatenate ", "cat", ""]);
    }

    #[test]
    fn patterns_keep_their_own_flags() {
        let term = Term::Pattern(
            super::Pattern::with_flags("warn", PatternFlags::parse("i").unwrap()).unwrap(),
        );
        let c = compiled(
            MatchConfig::default()
                .with_terms([term])
                .with_case_sensitive(true),
        );
        assert_eq!(c.split("WARN"), vec!["", "WARN", ""]);
        assert!(c.is_term("WARN"));
    }

    #[test]
    fn padded_literal_matches_trimmed_fragment_only_when_equal() {
        let c = compiled(MatchConfig::default().with_terms([" ok "]));
        assert_eq!(c.split("a ok b"), vec!["a", " ok ", "b"]);
        assert!(!c.is_term(" ok "));
        assert!(c.is_term("ok"));
    }

    #[test]
    fn parse_terms_reads_literals_and_patterns() {
        let terms = parse_terms(" error , /\\d+/, ,/warn/i,/[/");
        assert_eq!(terms.len(), 4);
        assert_eq!(terms[0], Term::literal("error"));
        assert!(matches!(&terms[1], Term::Pattern(p) if p.source() == r"\d+"));
        assert!(matches!(&terms[2], Term::Pattern(p) if p.flags().case_insensitive));
        assert_eq!(terms[3], Term::literal("/[/"));
    }

    #[test]
    fn unknown_flag_is_rejected() {
        assert_eq!(PatternFlags::parse("ix"), Err(TermError::UnknownFlag('x')));
        assert_eq!(parse_terms("/a/x"), vec![Term::literal("/a/x")]);
    }

    #[test]
    fn invalid_pattern_reports_source() {
        let err = Term::pattern("(").unwrap_err();
        assert!(err.to_string().starts_with("invalid pattern /(/"));
    }
}
