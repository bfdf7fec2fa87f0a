use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref RE: Regex = Regex::new(r"[\p{Alphabetic}\p{N}]+").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    // the list Sphinx applies to English documentation indexes
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is", "it",
            "near", "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there",
            "these", "they", "this", "to", "was", "will", "with",
        ];
        words.iter().copied().collect()
    };
}

fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    /// Terms with fewer characters are dropped.
    pub min_term_len: usize,
    pub stopwords: bool,
    /// Reduce terms with the English Snowball stemmer. Needed for indexes
    /// whose keys are stems, which is what Sphinx writes.
    pub stem: bool,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self { min_term_len: 1, stopwords: false, stem: false }
    }
}

/// One normalized query term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTerm {
    /// Form used for body and title lookups (stemmed when stemming is on).
    pub term: String,
    /// Lowercased, unstemmed form; object names are matched against this.
    pub raw: String,
}

impl QueryTerm {
    pub fn new(term: impl Into<String>) -> Self {
        let term = term.into();
        Self { raw: term.clone(), term }
    }
}

impl From<&str> for QueryTerm {
    fn from(term: &str) -> Self { QueryTerm::new(term) }
}

/// Query split into terms every hit must match and terms no hit may match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedQuery {
    pub required: Vec<QueryTerm>,
    pub excluded: Vec<QueryTerm>,
}

impl ParsedQuery {
    /// A query with nothing required matches nothing.
    pub fn is_empty(&self) -> bool { self.required.is_empty() }
}

#[derive(Debug, Clone, Default)]
pub struct Tokenizer {
    config: TokenizerConfig,
}

impl Tokenizer {
    pub fn new(config: TokenizerConfig) -> Self { Self { config } }

    pub fn config(&self) -> &TokenizerConfig { &self.config }

    /// Lazily yield the normalized terms of `query`: NFKC, lowercase, split on
    /// non-alphanumeric runs, length/stopword filtering, optional stemming,
    /// first occurrence wins.
    pub fn tokenize(&self, query: &str) -> impl Iterator<Item = String> {
        self.terms(query).map(|t| t.term)
    }

    /// Parse search syntax: whitespace-separated words, where a leading `-`
    /// excludes the word's terms instead of requiring them.
    pub fn parse(&self, query: &str) -> ParsedQuery {
        let mut parsed = ParsedQuery::default();
        let mut required = HashSet::new();
        for word in query.split_whitespace() {
            let (negated, body) = match word.strip_prefix('-') {
                Some(rest) if !rest.is_empty() => (true, rest),
                _ => (false, word),
            };
            for t in self.terms(body) {
                if negated {
                    if !parsed.excluded.contains(&t) {
                        parsed.excluded.push(t);
                    }
                } else if required.insert(t.term.clone()) {
                    parsed.required.push(t);
                }
            }
        }
        parsed
    }

    fn terms(&self, text: &str) -> impl Iterator<Item = QueryTerm> {
        let config = self.config;
        let normalized = text.nfkc().collect::<String>().to_lowercase();
        let spans: Vec<_> = RE.find_iter(&normalized).map(|m| m.range()).collect();
        let mut seen = HashSet::new();
        spans.into_iter().filter_map(move |span| {
            let raw = &normalized[span];
            if raw.chars().count() < config.min_term_len { return None; }
            if config.stopwords && is_stopword(raw) { return None; }
            let term = if config.stem { STEMMER.stem(raw).into_owned() } else { raw.to_string() };
            if !seen.insert(term.clone()) { return None; }
            Some(QueryTerm { term, raw: raw.to_string() })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tokenize() {
        let t: Vec<String> = Tokenizer::default().tokenize("Feed-Conversion, RATIO!").collect();
        assert_eq!(t, vec!["feed", "conversion", "ratio"]);
    }

    #[test]
    fn excluded_words() {
        let q = Tokenizer::default().parse("poultry -swine feed");
        let req: Vec<&str> = q.required.iter().map(|t| t.term.as_str()).collect();
        let exc: Vec<&str> = q.excluded.iter().map(|t| t.term.as_str()).collect();
        assert_eq!(req, vec!["poultry", "feed"]);
        assert_eq!(exc, vec!["swine"]);
    }

    #[test]
    fn lone_dash_is_not_an_exclusion() {
        let q = Tokenizer::default().parse("- feed");
        assert_eq!(q.required, vec![QueryTerm::new("feed")]);
        assert!(q.excluded.is_empty());
    }

    #[test]
    fn stemmed_terms_keep_raw_form() {
        let tok = Tokenizer::new(TokenizerConfig { stem: true, ..Default::default() });
        let q = tok.parse("Running");
        assert_eq!(q.required[0].term, "run");
        assert_eq!(q.required[0].raw, "running");
    }
}
