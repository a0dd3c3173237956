pub mod audio;
pub mod config;
pub mod controller;
mod error;
pub mod index;
pub mod logging;
pub mod nav;
pub mod page;
pub mod search;

#[cfg(feature = "wasm")]
mod dom;
#[cfg(feature = "web")]
pub mod web;

pub use config::SiteConfig;
pub use controller::PageController;
pub use error::{Error, Result};
pub use page::PageContext;

use once_cell::sync::Lazy;
use std::path::Path;

static EMBEDDED_WORDS: &str = include_str!("../data/woorden.txt");

static EMBEDDED_LIST: Lazy<WordList> = Lazy::new(|| WordList::parse(EMBEDDED_WORDS));

/// The glossary words in source order.
///
/// Loaded once per page from a newline-delimited text resource. Order is kept
/// as published and duplicates are not removed; sorting only happens when the
/// alphabetical index is rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordList {
    words: Vec<String>,
}

impl WordList {
    /// Parses one word per line. Lines are trimmed; blank lines and `#` comments are dropped.
    pub fn parse(text: &str) -> Self {
        let words = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect();
        Self { words }
    }

    /// The list compiled into the binary from `data/woorden.txt`.
    pub fn embedded() -> &'static WordList {
        &EMBEDDED_LIST
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(&text))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.words
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Returns the stored spelling of `word`, compared case-insensitively.
    pub fn find(&self, word: &str) -> Option<&str> {
        let needle = word.trim().to_lowercase();
        self.iter().find(|candidate| candidate.to_lowercase() == needle)
    }

    /// Raw text form, one word per line, as served to the browser.
    pub fn to_text(&self) -> String {
        let mut text = self.words.join("\n");
        text.push('\n');
        text
    }
}

impl From<Vec<String>> for WordList {
    fn from(words: Vec<String>) -> Self {
        Self { words }
    }
}

impl<'a> FromIterator<&'a str> for WordList {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self {
            words: iter.into_iter().map(str::to_string).collect(),
        }
    }
}
