//! Concurrent in-memory word/definition store with JSON file persistence.
//!
//! A single [`parking_lot::RwLock`] guards the whole map. Reads (`list`,
//! `search`, `count`, `save_to_file`) share the lock; writes (`add`, `update`,
//! `remove`, `remove_all`, `load_from_file`) hold it exclusively. File I/O runs
//! while the lock is held, so persistence is serialized with request traffic.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use parking_lot::RwLock;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, instrument};

use crate::error::DictionaryError;

pub type Result<T> = std::result::Result<T, DictionaryError>;

/// A word and its definition as exchanged over the API.
///
/// Missing and `null` fields deserialize as empty strings; validation is up
/// to the operation receiving the entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(rename = "mot", default, deserialize_with = "null_as_empty")]
    pub word: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub definition: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Entry {
    pub fn new(word: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            definition: definition.into(),
        }
    }
}

/// The dictionary store.
#[derive(Debug, Default)]
pub struct Dictionary {
    entries: RwLock<HashMap<String, String>>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite `word`.
    ///
    /// Both fields must be non-blank. Adding an existing word replaces its
    /// definition.
    pub fn add(&self, word: String, definition: String) -> Result<()> {
        if word.trim().is_empty() || definition.trim().is_empty() {
            return Err(DictionaryError::InvalidInput(
                "word and definition are required".to_string(),
            ));
        }

        self.entries.write().insert(word, definition);
        Ok(())
    }

    /// Replace the definition of an existing word.
    ///
    /// Unlike [`Dictionary::add`] the definition is not checked for blanks, so
    /// an update may clear it.
    pub fn update(&self, word: String, definition: String) -> Result<()> {
        let mut entries = self.entries.write();
        match entries.get_mut(&word) {
            Some(current) => {
                *current = definition;
                Ok(())
            }
            None => Err(DictionaryError::NotFound(word)),
        }
    }

    pub fn remove(&self, word: &str) -> Result<()> {
        if word.is_empty() {
            return Err(DictionaryError::MissingParameter("mot"));
        }

        match self.entries.write().remove(word) {
            Some(_) => Ok(()),
            None => Err(DictionaryError::NotFound(word.to_string())),
        }
    }

    /// Drop every entry.
    pub fn remove_all(&self) {
        *self.entries.write() = HashMap::new();
    }

    /// All entries, sorted by word.
    pub fn list(&self) -> Vec<Entry> {
        let entries = self.entries.read();
        sorted(entries.iter())
    }

    /// Entries whose word contains `query`, ignoring case.
    pub fn search(&self, query: &str) -> Result<Vec<Entry>> {
        if query.is_empty() {
            return Err(DictionaryError::MissingParameter("query"));
        }

        let needle = query.to_lowercase();
        let entries = self.entries.read();
        let matches = sorted(
            entries
                .iter()
                .filter(|(word, _)| word.to_lowercase().contains(&needle)),
        );

        if matches.is_empty() {
            return Err(DictionaryError::NoMatches(query.to_string()));
        }
        Ok(matches)
    }

    pub fn count(&self) -> usize {
        self.entries.read().len()
    }

    /// Replace the whole store with the JSON object stored at `path`.
    ///
    /// A missing file yields [`DictionaryError::Io`]; callers starting for the
    /// first time are expected to treat that as non-fatal. On a parse error the
    /// current contents are kept.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load_from_file(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let mut entries = self.entries.write();

        let raw = fs::read(path).map_err(|source| DictionaryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let loaded: HashMap<String, String> =
            serde_json::from_slice(&raw).map_err(|source| DictionaryError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        *entries = loaded;
        debug!(count = entries.len(), "dictionary loaded");
        Ok(entries.len())
    }

    /// Write the store to `path` as a two-space indented JSON object with keys
    /// in sorted order.
    ///
    /// Missing parent directories are created. The file is overwritten in
    /// place.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let entries = self.entries.read();

        let io_err = |source| DictionaryError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let ordered: BTreeMap<&String, &String> = entries.iter().collect();
        let data = serde_json::to_vec_pretty(&ordered).map_err(DictionaryError::Encode)?;
        fs::write(path, data).map_err(io_err)?;

        debug!(count = entries.len(), "dictionary saved");
        Ok(entries.len())
    }
}

fn sorted<'a>(pairs: impl Iterator<Item = (&'a String, &'a String)>) -> Vec<Entry> {
    let mut out: Vec<Entry> = pairs
        .map(|(word, definition)| Entry::new(word.clone(), definition.clone()))
        .collect();
    out.sort_by(|a, b| a.word.cmp(&b.word));
    out
}
