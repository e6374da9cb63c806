//! Durable repository-location store.
//!
//! Re-indexing by repository id is only possible if the original source
//! (path or URL) is stored somewhere durable; the search backend does not
//! carry it. This is a small JSON map beside the managed clones, written
//! after every successful prepare.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Where a repository came from, as the user supplied it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredLocation {
    /// Original path or clone URL.
    pub source: String,
    /// User-supplied name, when one was given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Mutex-guarded map of repository id to stored location, persisted as one
/// JSON file.
#[derive(Debug)]
pub struct LocationStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, StoredLocation>>,
}

impl LocationStore {
    /// Open the store at `path`, loading existing entries when present.
    ///
    /// # Errors
    ///
    /// Returns an error when an existing file cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content)
                .map_err(|e| Error::internal(format!("corrupt location store: {e}")))?
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Record (or overwrite) a repository's source location and persist.
    ///
    /// # Errors
    ///
    /// Returns an error when the store file cannot be written.
    pub fn record(&self, repository_id: &str, location: StoredLocation) -> Result<()> {
        let mut entries = self.entries.lock();
        entries.insert(repository_id.to_string(), location);
        self.persist(&entries)
    }

    /// Stored location for a repository id, if any.
    #[must_use]
    pub fn lookup(&self, repository_id: &str) -> Option<StoredLocation> {
        self.entries.lock().get(repository_id).cloned()
    }

    /// Remove a repository's entry and persist.
    ///
    /// # Errors
    ///
    /// Returns an error when the store file cannot be written.
    pub fn remove(&self, repository_id: &str) -> Result<()> {
        let mut entries = self.entries.lock();
        if entries.remove(repository_id).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &HashMap<String, StoredLocation>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(entries)
            .map_err(|e| Error::internal(format!("serialize location store: {e}")))?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}
