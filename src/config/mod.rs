//! Read-only view over a properties-style configuration file.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use thiserror::Error;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Iteration order for prefix-scoped lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOrder {
    /// Keys in the order they first appeared in the backing file.
    FirstSeen,
    /// Keys sorted lexicographically.
    Lexicographic,
}

/// A flat key/value store loaded from a `key=value` properties file.
///
/// Built once and consumed read-only by the command builder. A missing
/// backing file yields an empty configuration, not an error.
#[derive(Debug, Clone, Default)]
pub struct Configuration {
    entries: IndexMap<String, String>,
}

impl Configuration {
    /// Load the configuration at `path`.
    pub fn of(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            entries: parse_properties(&content),
        })
    }

    /// An in-memory configuration, mainly for embedders and tests.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries whose key starts with `prefix + "."`, with the prefix
    /// stripped from the returned keys. On a stripped-key collision the
    /// first occurrence wins.
    pub fn get(&self, prefix: &str, order: KeyOrder) -> IndexMap<String, String> {
        let prefix = format!("{prefix}.");
        let mut matches: Vec<(&str, &str)> = self
            .entries
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(&prefix)
                    .map(|stripped| (stripped, value.as_str()))
            })
            .collect();
        if order == KeyOrder::Lexicographic {
            matches.sort_by_key(|(key, _)| *key);
        }
        let mut scoped = IndexMap::new();
        for (key, value) in matches {
            if !scoped.contains_key(key) {
                scoped.insert(key.to_string(), value.to_string());
            }
        }
        scoped
    }

    /// Exact single-key lookup.
    pub fn get_single_value(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

/// Parse `key=value` lines. Blank lines and `#`/`!` comments are skipped;
/// the value starts after the first `=`. A repeated key keeps its original
/// position but takes the last value, as a properties store does.
fn parse_properties(content: &str) -> IndexMap<String, String> {
    let mut entries = IndexMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        let (key, value) = match line.split_once('=') {
            Some((key, value)) => (key.trim_end(), value.trim_start()),
            None => (line, ""),
        };
        if key.is_empty() {
            continue;
        }
        entries.insert(key.to_string(), value.to_string());
    }
    entries
}
