//! Run report: what happened to every document, for humans and machines.

use serde::Serialize;
use std::fmt;

/// A confirmed remote write, or a planned one in a dry run.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WriteEntry {
    pub path: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A document that needed nothing this run.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SkippedEntry {
    pub path: String,
    pub title: String,
    pub reason: String,
}

/// A document awaiting a human decision.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ConflictEntry {
    pub path: String,
    pub title: String,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<String>,
}

/// A document whose classification or execution failed.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorEntry {
    pub path: String,
    pub title: String,
    pub error: String,
}

/// Partitioned outcome of one run.
#[derive(Debug, Serialize)]
pub struct SyncReport {
    pub dry_run: bool,
    pub created: Vec<WriteEntry>,
    pub updated: Vec<WriteEntry>,
    pub skipped: Vec<SkippedEntry>,
    pub conflicts: Vec<ConflictEntry>,
    pub errors: Vec<ErrorEntry>,
}

impl SyncReport {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            created: Vec::new(),
            updated: Vec::new(),
            skipped: Vec::new(),
            conflicts: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// True when at least one create or update reached the remote store.
    pub fn wrote_anything(&self) -> bool {
        !self.dry_run && (!self.created.is_empty() || !self.updated.is_empty())
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Zero only when nothing needs human attention.
    pub fn exit_code(&self) -> i32 {
        if self.has_errors() || self.has_conflicts() {
            1
        } else {
            0
        }
    }

    /// Demotes every write of this run to an error.
    ///
    /// Used when the ledger could not be saved: the remote writes happened,
    /// but the local record of them is stale, so the caller must not treat
    /// those paths as safely re-runnable.
    pub fn mark_writes_stale(&mut self, cause: &str) {
        let created: Vec<WriteEntry> = self.created.drain(..).collect();
        let updated: Vec<WriteEntry> = self.updated.drain(..).collect();

        for entry in created.into_iter().chain(updated) {
            self.errors.push(ErrorEntry {
                path: entry.path,
                title: entry.title,
                error: format!(
                    "remote write succeeded but recording it in the sync ledger failed: {}",
                    cause
                ),
            });
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dry_run {
            writeln!(f, "Dry run - no changes were made.")?;
            writeln!(f)?;
        }

        for entry in &self.created {
            match &entry.remote_id {
                Some(id) => writeln!(f, "  ✓ created {} ({}) as {}", entry.title, entry.path, id)?,
                None => writeln!(f, "  + would create {} ({})", entry.title, entry.path)?,
            }
        }
        for entry in &self.updated {
            match entry.version {
                Some(v) => writeln!(f, "  ✓ updated {} ({}) to v{}", entry.title, entry.path, v)?,
                None => writeln!(f, "  ~ would update {} ({})", entry.title, entry.path)?,
            }
        }
        for entry in &self.conflicts {
            writeln!(
                f,
                "  ! conflict {} ({}): {}",
                entry.title, entry.path, entry.reason
            )?;
        }
        for entry in &self.errors {
            writeln!(
                f,
                "  ✗ error {} ({}): {}",
                entry.title, entry.path, entry.error
            )?;
        }
        if !self.skipped.is_empty() {
            writeln!(f, "  {} unchanged", self.skipped.len())?;
        }

        writeln!(f)?;
        if self.has_errors() {
            write!(f, "Completed with {} error(s).", self.errors.len())
        } else if self.has_conflicts() {
            write!(
                f,
                "Action needed: {} conflict(s) require manual resolution.",
                self.conflicts.len()
            )
        } else if self.created.is_empty() && self.updated.is_empty() {
            write!(f, "Already up to date.")
        } else if self.dry_run {
            write!(
                f,
                "{} change(s) would be applied.",
                self.created.len() + self.updated.len()
            )
        } else {
            write!(f, "Sync complete.")
        }
    }
}
