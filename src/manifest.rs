//! Manifest loading: the inventory of local documents eligible for sync.
//!
//! The manifest is produced by the documentation extraction step and is
//! read-only here. Field names match the JSON that step emits.

use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// A single local document as described by the manifest.
///
/// The fingerprint is computed by the extraction step over the document's
/// body bytes; it is opaque to the engine and only ever compared for
/// equality. Body content is read through `body_path` when a create or
/// update actually executes, never during classification.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Document {
    /// Stable identity, unique within a manifest.
    pub path: String,
    /// Human-readable title, used for remote lookup when untracked.
    pub title: String,
    /// Remote parent page this document belongs under.
    #[serde(rename = "confluence_parent")]
    pub group: String,
    /// Content hash of the current local body.
    #[serde(rename = "content_hash")]
    pub fingerprint: String,
    /// Where to read the body when executing.
    #[serde(rename = "absolute_path")]
    pub body_path: PathBuf,
}

/// Parsed manifest file.
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    pub documents: Vec<Document>,
}

impl Manifest {
    /// Loads a manifest from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ManifestError::ReadError(path.to_path_buf(), e))?;
        let manifest = serde_json::from_str(&contents)
            .map_err(|e| ManifestError::ParseError(path.to_path_buf(), e))?;
        Ok(manifest)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Content hash over body bytes, as SHA-256 hex.
///
/// For tests and for callers assembling their own manifests. The
/// extraction step records MD5; the engine never recomputes hashes and
/// only compares manifest fingerprints against ledger fingerprints for
/// equality, so the two algorithms never need to agree — but manifests
/// must not mix hashes from both sources for the same path.
pub fn fingerprint(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Errors that can occur loading a manifest.
#[derive(Debug)]
pub enum ManifestError {
    /// I/O error reading the manifest file.
    ReadError(PathBuf, std::io::Error),
    /// The manifest file is not valid JSON for the expected shape.
    ParseError(PathBuf, serde_json::Error),
}

impl std::fmt::Display for ManifestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ManifestError::ReadError(path, e) => {
                write!(f, "Failed to read manifest '{}': {}", path.display(), e)
            }
            ManifestError::ParseError(path, e) => {
                write!(f, "Failed to parse manifest '{}': {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for ManifestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ManifestError::ReadError(_, e) => Some(e),
            ManifestError::ParseError(_, e) => Some(e),
        }
    }
}
