use std::{
    collections::BTreeMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use prefire_core::BestStats;
use tracing::debug;

use crate::{merge_best, PersistenceError, PersistenceGateway};

type Document = BTreeMap<String, BestStats>;

/// Stores every user's statistics in a single JSON object keyed by user id.
///
/// A missing file reads as an empty document. Writes go to a sibling
/// temporary file that then replaces the original.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a store backed by `path`; the file is created on first save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the backing document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Document, PersistenceError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Document::new()),
            Err(source) => return Err(self.io_error(source)),
        };
        if text.trim().is_empty() {
            return Ok(Document::new());
        }
        serde_json::from_str(&text).map_err(|e| self.malformed(e))
    }

    fn write(&self, document: &Document) -> Result<(), PersistenceError> {
        let text = serde_json::to_string_pretty(document)
            .map_err(|e| self.malformed(e))?;
        let parent = self.path.parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(parent) = parent {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, text).map_err(|e| self.io_error(e))?;
        let target = &self.path;
        fs::rename(&staging, target).map_err(|e| self.io_error(e))
    }

    fn io_error(&self, source: std::io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn malformed(&self, source: serde_json::Error) -> PersistenceError {
        PersistenceError::Malformed {
            path: self.path.clone(),
            source,
        }
    }
}

impl PersistenceGateway for JsonFileStore {
    fn load_best_stats(&self, user: &str) -> Result<BestStats, PersistenceError> {
        Ok(self.read()?.get(user).copied().unwrap_or_default())
    }

    fn save_best_stats_if_better(
        &mut self,
        user: &str,
        offered: BestStats,
    ) -> Result<BestStats, PersistenceError> {
        let mut document = self.read()?;
        let stored = document.get(user).copied().unwrap_or_default();
        let merged = merge_best(stored, offered);
        if merged == stored && document.contains_key(user) {
            debug!(user, "stored stats already at least as good");
            return Ok(stored);
        }
        let _ = document.insert(user.to_owned(), merged);
        self.write(&document)?;
        debug!(
            user,
            accuracy = merged.accuracy,
            best_streak = merged.best_streak,
            "best stats saved"
        );
        Ok(merged)
    }
}
