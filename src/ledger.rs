//! Sync ledger: the engine's durable record of last confirmed sync per path.
//!
//! An entry exists for a document path only when a create or update for
//! that path has been confirmed by the remote side. The ledger is loaded
//! in full at run start and saved atomically at run end, so an interrupted
//! run leaves durable state exactly as it was.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

/// Last confirmed remote state for one document path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerEntry {
    /// Identity of the corresponding remote page.
    pub remote_id: String,
    /// Remote version last observed or produced by this engine.
    pub remote_version: i64,
    /// Local fingerprint at the time of that version.
    pub fingerprint: String,
}

/// On-disk layout. `synced_docs` maps document path to its entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LedgerFile {
    synced_docs: BTreeMap<String, LedgerEntry>,
    last_sync: Option<DateTime<Utc>>,
}

/// The sync ledger.
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
    state: LedgerFile,
}

impl Ledger {
    /// Loads the ledger, or starts empty when no file exists yet.
    ///
    /// A first run with no prior state is not an error; an unreadable or
    /// corrupt file is.
    pub fn load(path: &Path) -> Result<Self, LedgerError> {
        let state = match std::fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents)
                .map_err(|e| LedgerError::ParseError(path.to_path_buf(), e))?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => LedgerFile::default(),
            Err(e) => return Err(LedgerError::IoError(path.to_path_buf(), e)),
        };

        Ok(Self {
            path: path.to_path_buf(),
            state,
        })
    }

    /// Returns the entry for a document path, if one was ever recorded.
    pub fn get(&self, doc_path: &str) -> Option<&LedgerEntry> {
        self.state.synced_docs.get(doc_path)
    }

    /// Records a confirmed create or update.
    pub fn record(&mut self, doc_path: impl Into<String>, entry: LedgerEntry) {
        self.state.synced_docs.insert(doc_path.into(), entry);
    }

    pub fn len(&self) -> usize {
        self.state.synced_docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.synced_docs.is_empty()
    }

    /// When the ledger was last saved, if ever.
    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.state.last_sync
    }

    /// Saves the full ledger atomically.
    ///
    /// Writes to a temporary file in the same directory and renames it over
    /// the target, so a crash mid-save cannot corrupt entries persisted by
    /// earlier runs.
    pub fn save(&mut self) -> Result<(), LedgerError> {
        self.state.last_sync = Some(Utc::now());

        let json =
            serde_json::to_string_pretty(&self.state).map_err(LedgerError::EncodeError)?;

        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)
                    .map_err(|e| LedgerError::IoError(dir.to_path_buf(), e))?;
            }
        }

        let mut tmp_name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "ledger".into());
        tmp_name.push(".tmp");
        let tmp = self.path.with_file_name(tmp_name);

        std::fs::write(&tmp, json).map_err(|e| LedgerError::IoError(tmp.clone(), e))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| LedgerError::IoError(self.path.clone(), e))?;

        Ok(())
    }
}

/// Errors that can occur loading or saving the ledger.
#[derive(Debug)]
pub enum LedgerError {
    /// I/O error reading or writing the ledger file.
    IoError(PathBuf, io::Error),
    /// The ledger file exists but is not valid.
    ParseError(PathBuf, serde_json::Error),
    /// The ledger could not be serialized.
    EncodeError(serde_json::Error),
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerError::IoError(path, e) => {
                write!(f, "I/O error for ledger '{}': {}", path.display(), e)
            }
            LedgerError::ParseError(path, e) => {
                write!(f, "Ledger file '{}' is corrupt: {}", path.display(), e)
            }
            LedgerError::EncodeError(e) => write!(f, "Failed to encode ledger: {}", e),
        }
    }
}

impl std::error::Error for LedgerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LedgerError::IoError(_, e) => Some(e),
            LedgerError::ParseError(_, e) => Some(e),
            LedgerError::EncodeError(e) => Some(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn entry(id: &str, version: i64, fingerprint: &str) -> LedgerEntry {
        LedgerEntry {
            remote_id: id.to_string(),
            remote_version: version,
            fingerprint: fingerprint.to_string(),
        }
    }

    #[test]
    fn test_load_missing_is_empty() {
        let dir = tempdir().unwrap();
        let ledger = Ledger::load(&dir.path().join("state.json")).unwrap();

        assert!(ledger.is_empty());
        assert!(ledger.last_sync().is_none());
    }

    #[test]
    fn test_record_save_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut ledger = Ledger::load(&path).unwrap();
        ledger.record("a.md", entry("100", 3, "h1"));
        ledger.save().unwrap();

        let reloaded = Ledger::load(&path).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.get("a.md"), Some(&entry("100", 3, "h1")));
        assert!(reloaded.last_sync().is_some());
    }

    #[test]
    fn test_save_preserves_untouched_entries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut ledger = Ledger::load(&path).unwrap();
        ledger.record("a.md", entry("100", 1, "h1"));
        ledger.record("b.md", entry("200", 5, "h2"));
        ledger.save().unwrap();

        let mut second = Ledger::load(&path).unwrap();
        second.record("a.md", entry("100", 2, "h1b"));
        second.save().unwrap();

        let reloaded = Ledger::load(&path).unwrap();
        assert_eq!(reloaded.get("a.md"), Some(&entry("100", 2, "h1b")));
        assert_eq!(reloaded.get("b.md"), Some(&entry("200", 5, "h2")));
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut ledger = Ledger::load(&path).unwrap();
        ledger.record("a.md", entry("100", 1, "h1"));
        ledger.save().unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["state.json".to_string()]);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{\"synced_docs\": 42}").unwrap();

        let result = Ledger::load(&path);
        assert!(matches!(result, Err(LedgerError::ParseError(_, _))));
    }

    #[test]
    fn test_save_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let mut ledger = Ledger::load(&path).unwrap();
        ledger.record("a.md", entry("100", 1, "h1"));
        ledger.save().unwrap();

        assert!(path.exists());
    }
}
