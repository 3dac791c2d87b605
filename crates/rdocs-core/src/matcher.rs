//! Whole-word token matcher, compiled once from the dictionary's key set.
//!
//! Alternatives are ordered longest-first so that when two tokens could both
//! match at the same position the longer one wins. Word-boundary assertions
//! are only placed on sides where the token edge is a word character, which
//! lets macro tokens like `println!` match directly before `(`.
//!
//! Boundaries are ASCII, matching how browsers treat `\b`.

use std::collections::HashSet;
use std::ops::Range;

#[cfg(not(all(target_family = "wasm", target_os = "unknown")))]
use regex::{Regex, escape};
#[cfg(all(target_family = "wasm", target_os = "unknown"))]
use regex_lite::{Regex, escape};

use crate::error::MatcherError;

#[cfg(not(all(target_family = "wasm", target_os = "unknown")))]
const WORD_BOUNDARY: &str = r"(?-u:\b)";
#[cfg(all(target_family = "wasm", target_os = "unknown"))]
const WORD_BOUNDARY: &str = r"\b";

/// A single token occurrence in a piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMatch<'t> {
    /// Byte range within the searched text.
    pub range: Range<usize>,
    pub token: &'t str,
}

/// Precompiled matcher over a fixed token set.
#[derive(Debug, Clone)]
pub struct TokenMatcher {
    regex: Option<Regex>,
    tokens: HashSet<String>,
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl TokenMatcher {
    /// Compile a matcher. An empty token set produces a matcher that never matches.
    pub fn new<'a, I>(tokens: I) -> Result<Self, MatcherError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let tokens: HashSet<String> = tokens
            .into_iter()
            .filter(|t| !t.is_empty())
            .map(str::to_owned)
            .collect();

        if tokens.is_empty() {
            return Ok(Self {
                regex: None,
                tokens,
            });
        }

        let mut ordered: Vec<&str> = tokens.iter().map(String::as_str).collect();
        // Longest first, then lexical for a stable pattern.
        ordered.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        let alternatives: Vec<String> = ordered
            .iter()
            .map(|token| {
                let mut alt = String::with_capacity(token.len() + 16);
                if token.chars().next().is_some_and(is_word_char) {
                    alt.push_str(WORD_BOUNDARY);
                }
                alt.push_str(&escape(token));
                if token.chars().last().is_some_and(is_word_char) {
                    alt.push_str(WORD_BOUNDARY);
                }
                alt
            })
            .collect();

        let pattern = format!("(?:{})", alternatives.join("|"));
        let regex = Regex::new(&pattern).map_err(|e| MatcherError::Compile(e.to_string()))?;

        tracing::debug!(tokens = ordered.len(), "compiled token matcher");

        Ok(Self {
            regex: Some(regex),
            tokens,
        })
    }

    /// Non-overlapping matches in `text`, left to right.
    pub fn find_iter<'t>(&self, text: &'t str) -> impl Iterator<Item = TokenMatch<'t>> {
        self.regex
            .iter()
            .flat_map(move |re| re.find_iter(text))
            .map(|m| TokenMatch {
                range: m.start()..m.end(),
                token: m.as_str(),
            })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.as_ref().is_some_and(|re| re.is_match(text))
    }

    /// Whether `text` is exactly one known token.
    pub fn is_token(&self, text: &str) -> bool {
        self.tokens.contains(text)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
