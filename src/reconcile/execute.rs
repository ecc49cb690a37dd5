//! Execution: apply the plan's creates and updates.
//!
//! Every attempt is independent; one document's failure never blocks the
//! rest. Confirmed successes are recorded in the in-memory ledger, which
//! is saved once at the end of the run.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;

use tracing::{debug, warn};

use super::classify::{Plan, PlannedCreate, PlannedUpdate};
use super::report::{ConflictEntry, ErrorEntry, SkippedEntry, SyncReport, WriteEntry};
use crate::convert::{ConvertError, Converter};
use crate::ledger::{Ledger, LedgerEntry};
use crate::remote::{GatewayError, RemoteGateway};

/// Execution settings for one run.
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Target space key.
    pub space: String,
    /// Report what would happen without touching the remote or the ledger.
    pub dry_run: bool,
}

/// Applies a plan and returns the run report.
///
/// When the end-of-run ledger save fails, every document written this run
/// is demoted to an error: the remote writes happened, but the local
/// record of them did not, so those paths are not safely re-runnable.
pub async fn execute<G: RemoteGateway, C: Converter>(
    plan: Plan,
    gateway: &G,
    converter: &C,
    ledger: &mut Ledger,
    options: &ExecuteOptions,
) -> SyncReport {
    let mut report = SyncReport::new(options.dry_run);

    // Conflicts, failures and unchanged documents pass straight through.
    for conflict in plan.conflicts {
        report.conflicts.push(ConflictEntry {
            path: conflict.document.path,
            title: conflict.document.title,
            reason: conflict.reason.to_string(),
            remote_id: conflict.remote_id,
        });
    }
    for failure in plan.failures {
        report.errors.push(ErrorEntry {
            path: failure.document.path,
            title: failure.document.title,
            error: failure.error.to_string(),
        });
    }
    for document in plan.unchanged {
        report.skipped.push(SkippedEntry {
            path: document.path,
            title: document.title,
            reason: "unchanged".to_string(),
        });
    }

    let parents = if options.dry_run {
        HashMap::new()
    } else {
        resolve_parents(&plan.creates, gateway, &options.space).await
    };

    for create in &plan.creates {
        if options.dry_run {
            report.created.push(WriteEntry {
                path: create.document.path.clone(),
                title: create.document.title.clone(),
                remote_id: None,
                version: None,
                note: create.note.clone(),
            });
            continue;
        }

        let parent_id = parents
            .get(&create.document.group)
            .and_then(|p| p.as_deref());

        match apply_create(create, gateway, converter, parent_id, &options.space).await {
            Ok((remote_id, version)) => {
                debug!("created {} as {}", create.document.path, remote_id);
                ledger.record(
                    create.document.path.clone(),
                    LedgerEntry {
                        remote_id: remote_id.clone(),
                        remote_version: version,
                        fingerprint: create.document.fingerprint.clone(),
                    },
                );
                report.created.push(WriteEntry {
                    path: create.document.path.clone(),
                    title: create.document.title.clone(),
                    remote_id: Some(remote_id),
                    version: Some(version),
                    note: create.note.clone(),
                });
            }
            Err(e) => report.errors.push(ErrorEntry {
                path: create.document.path.clone(),
                title: create.document.title.clone(),
                error: e.to_string(),
            }),
        }
    }

    for update in &plan.updates {
        if options.dry_run {
            report.updated.push(WriteEntry {
                path: update.document.path.clone(),
                title: update.document.title.clone(),
                remote_id: Some(update.remote_id.clone()),
                version: None,
                note: None,
            });
            continue;
        }

        match apply_update(update, gateway, converter).await {
            Ok(new_version) => {
                debug!("updated {} to v{}", update.document.path, new_version);
                ledger.record(
                    update.document.path.clone(),
                    LedgerEntry {
                        remote_id: update.remote_id.clone(),
                        remote_version: new_version,
                        fingerprint: update.document.fingerprint.clone(),
                    },
                );
                report.updated.push(WriteEntry {
                    path: update.document.path.clone(),
                    title: update.document.title.clone(),
                    remote_id: Some(update.remote_id.clone()),
                    version: Some(new_version),
                    note: None,
                });
            }
            Err(e) => report.errors.push(ErrorEntry {
                path: update.document.path.clone(),
                title: update.document.title.clone(),
                error: e.to_string(),
            }),
        }
    }

    if report.wrote_anything() {
        if let Err(e) = ledger.save() {
            warn!("Failed to save sync ledger: {}", e);
            report.mark_writes_stale(&e.to_string());
        }
    }

    report
}

/// Resolves each group named by a planned create to its remote parent
/// page, once per group per run.
///
/// A group whose parent page is missing or unresolvable is created at the
/// space root with a warning, matching how missing parents have always
/// been handled.
async fn resolve_parents<G: RemoteGateway>(
    creates: &[PlannedCreate],
    gateway: &G,
    space: &str,
) -> HashMap<String, Option<String>> {
    let mut parents: HashMap<String, Option<String>> = HashMap::new();

    for create in creates {
        let group = &create.document.group;
        if parents.contains_key(group) {
            continue;
        }

        let parent = match gateway.find_by_title(group, space).await {
            Ok(Some(page)) => Some(page.id),
            Ok(None) => {
                warn!("Parent page '{}' not found in space {}", group, space);
                None
            }
            Err(e) => {
                warn!("Parent lookup for '{}' failed: {}", group, e);
                None
            }
        };
        parents.insert(group.clone(), parent);
    }

    parents
}

async fn apply_create<G: RemoteGateway, C: Converter>(
    create: &PlannedCreate,
    gateway: &G,
    converter: &C,
    parent_id: Option<&str>,
    space: &str,
) -> Result<(String, i64), ExecuteError> {
    let body = std::fs::read_to_string(&create.document.body_path)
        .map_err(|e| ExecuteError::BodyRead(create.document.body_path.clone(), e))?;
    let storage = converter.to_storage(&body).map_err(ExecuteError::Convert)?;

    let created = gateway
        .create(space, &create.document.title, &storage, parent_id)
        .await
        .map_err(ExecuteError::Remote)?;

    Ok((created.id, created.version))
}

async fn apply_update<G: RemoteGateway, C: Converter>(
    update: &PlannedUpdate,
    gateway: &G,
    converter: &C,
) -> Result<i64, ExecuteError> {
    let body = std::fs::read_to_string(&update.document.body_path)
        .map_err(|e| ExecuteError::BodyRead(update.document.body_path.clone(), e))?;
    let storage = converter.to_storage(&body).map_err(ExecuteError::Convert)?;

    gateway
        .update(
            &update.remote_id,
            &update.document.title,
            &storage,
            update.expected_version,
        )
        .await
        .map_err(ExecuteError::Remote)
}

/// Errors applying a single create or update.
#[derive(Debug)]
pub enum ExecuteError {
    /// The local body could not be read.
    BodyRead(PathBuf, io::Error),
    /// The body could not be converted to the remote format.
    Convert(ConvertError),
    /// The remote call failed.
    Remote(GatewayError),
}

impl std::fmt::Display for ExecuteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecuteError::BodyRead(path, e) => {
                write!(f, "Failed to read body '{}': {}", path.display(), e)
            }
            ExecuteError::Convert(e) => write!(f, "{}", e),
            ExecuteError::Remote(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ExecuteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExecuteError::BodyRead(_, e) => Some(e),
            ExecuteError::Convert(e) => Some(e),
            ExecuteError::Remote(e) => Some(e),
        }
    }
}
