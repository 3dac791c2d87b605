//! Term dictionary: the read-only set of tokens the annotator recognizes.
//!
//! Entries are loaded from a JSON array. The site's own dictionary is embedded
//! at compile time and available through [`TermDictionary::builtin`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::error::DictionaryError;

const BUILTIN_TERMS: &str = include_str!("../data/terms.json");

/// Grouping for a term. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Basics,
    Io,
    Traits,
    SmartPtr,
    SmartPointers,
    Specialized,
    Collections,
    Sync,
    Cell,
    Time,
    Path,
    #[serde(other)]
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Basics => "basics",
            Category::Io => "io",
            Category::Traits => "traits",
            Category::SmartPtr => "smart-ptr",
            Category::SmartPointers => "smart-pointers",
            Category::Specialized => "specialized",
            Category::Collections => "collections",
            Category::Sync => "sync",
            Category::Cell => "cell",
            Category::Time => "time",
            Category::Path => "path",
            Category::Other => "other",
        }
    }
}

/// One recognized token and the data shown for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermEntry {
    /// Exact text matched in code samples.
    pub token: SmolStr,
    /// Display name, e.g. `println!` for the `println` token.
    pub name: String,
    pub description: String,
    /// Site-relative destination. Absent means informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub category: Category,
}

impl TermEntry {
    /// Destination link, treating an empty string as absent.
    pub fn destination(&self) -> Option<&str> {
        self.link.as_deref().filter(|link| !link.trim().is_empty())
    }
}

/// Immutable token → entry map.
#[derive(Debug, Clone, Default)]
pub struct TermDictionary {
    entries: Vec<TermEntry>,
    index: HashMap<SmolStr, usize>,
}

impl TermDictionary {
    /// Build a dictionary from entries, rejecting empty and duplicate tokens.
    pub fn from_entries(entries: Vec<TermEntry>) -> Result<Self, DictionaryError> {
        let mut index = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if entry.token.is_empty() {
                return Err(DictionaryError::EmptyToken { index: i });
            }
            if index.insert(entry.token.clone(), i).is_some() {
                return Err(DictionaryError::DuplicateToken {
                    token: entry.token.to_string(),
                });
            }
        }
        Ok(Self { entries, index })
    }

    /// Parse a JSON array of entries.
    pub fn from_json(json: &str) -> Result<Self, DictionaryError> {
        let entries: Vec<TermEntry> = serde_json::from_str(json)?;
        Self::from_entries(entries)
    }

    /// The dictionary shipped with the site.
    pub fn builtin() -> Result<Self, DictionaryError> {
        Self::from_json(BUILTIN_TERMS)
    }

    pub fn lookup(&self, token: &str) -> Option<&TermEntry> {
        self.index.get(token).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, token: &str) -> bool {
        self.index.contains_key(token)
    }

    /// Every token, in dictionary order.
    pub fn all_tokens(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.token.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &TermEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
