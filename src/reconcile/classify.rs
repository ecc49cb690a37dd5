//! Classification: decide create / update / unchanged / conflict per
//! document, without mutating anything.

use std::fmt;

use crate::ledger::Ledger;
use crate::manifest::Document;
use crate::remote::{GatewayError, RemoteGateway};

/// What a single document needs, decided before anything executes.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// No remote counterpart; safe to create.
    Create {
        /// Set when a previously tracked remote page disappeared.
        note: Option<String>,
    },
    /// Local changed, remote untouched since last sync.
    Update {
        remote_id: String,
        expected_version: i64,
    },
    /// Local content identical to the last confirmed sync.
    Unchanged,
    /// Needs a human decision; never executed.
    Conflict {
        reason: ConflictReason,
        remote_id: Option<String>,
    },
}

/// Why a document was classified as a conflict.
#[derive(Debug, Clone, PartialEq)]
pub enum ConflictReason {
    /// A page with this title exists remotely but was never recorded here.
    /// Overwriting it could destroy independently authored content.
    UntrackedRemote,
    /// Both the local body and the remote page changed since last sync.
    BothSidesModified,
    /// The remote version is lower than the one recorded at last sync.
    /// Versions are monotonic on the remote side, so something is wrong
    /// with either the page or the ledger.
    VersionRegression { recorded: i64, observed: i64 },
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictReason::UntrackedRemote => {
                write!(f, "exists remotely but untracked locally")
            }
            ConflictReason::BothSidesModified => {
                write!(f, "both sides modified since last sync")
            }
            ConflictReason::VersionRegression { recorded, observed } => write!(
                f,
                "remote version went backwards (recorded {}, observed {})",
                recorded, observed
            ),
        }
    }
}

/// Classifies one document against the ledger snapshot.
///
/// The ledger lookup happens before any remote call, so a document with no
/// local change costs zero requests.
pub async fn classify<G: RemoteGateway>(
    document: &Document,
    ledger: &Ledger,
    gateway: &G,
    space: &str,
) -> Result<Outcome, ClassifyError> {
    let entry = match ledger.get(&document.path) {
        None => {
            // Never synced; the title is the only identity we have.
            return match gateway.find_by_title(&document.title, space).await {
                Ok(Some(page)) => Ok(Outcome::Conflict {
                    reason: ConflictReason::UntrackedRemote,
                    remote_id: Some(page.id),
                }),
                Ok(None) => Ok(Outcome::Create { note: None }),
                Err(e) => Err(ClassifyError::RemoteLookup(document.path.clone(), e)),
            };
        }
        Some(entry) => entry,
    };

    if entry.fingerprint == document.fingerprint {
        return Ok(Outcome::Unchanged);
    }

    // Local changed since last sync; find out whether the remote moved too.
    match gateway.get_by_id(&entry.remote_id).await {
        Ok(page) => {
            if page.version == entry.remote_version {
                Ok(Outcome::Update {
                    remote_id: entry.remote_id.clone(),
                    expected_version: page.version,
                })
            } else if page.version > entry.remote_version {
                Ok(Outcome::Conflict {
                    reason: ConflictReason::BothSidesModified,
                    remote_id: Some(entry.remote_id.clone()),
                })
            } else {
                Ok(Outcome::Conflict {
                    reason: ConflictReason::VersionRegression {
                        recorded: entry.remote_version,
                        observed: page.version,
                    },
                    remote_id: Some(entry.remote_id.clone()),
                })
            }
        }
        Err(GatewayError::NotFound(_)) => Ok(Outcome::Create {
            note: Some(format!(
                "previous remote page {} no longer exists",
                entry.remote_id
            )),
        }),
        Err(e) => Err(ClassifyError::RemoteLookup(document.path.clone(), e)),
    }
}

/// A manifest partitioned by what each document needs.
#[derive(Debug, Default)]
pub struct Plan {
    pub creates: Vec<PlannedCreate>,
    pub updates: Vec<PlannedUpdate>,
    pub unchanged: Vec<Document>,
    pub conflicts: Vec<PlannedConflict>,
    pub failures: Vec<ClassifyFailure>,
}

#[derive(Debug, Clone)]
pub struct PlannedCreate {
    pub document: Document,
    pub note: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PlannedUpdate {
    pub document: Document,
    pub remote_id: String,
    pub expected_version: i64,
}

#[derive(Debug, Clone)]
pub struct PlannedConflict {
    pub document: Document,
    pub reason: ConflictReason,
    pub remote_id: Option<String>,
}

#[derive(Debug)]
pub struct ClassifyFailure {
    pub document: Document,
    pub error: ClassifyError,
}

impl Plan {
    /// True when the run would have nothing to do and nothing to report.
    pub fn is_all_unchanged(&self) -> bool {
        self.creates.is_empty()
            && self.updates.is_empty()
            && self.conflicts.is_empty()
            && self.failures.is_empty()
    }
}

/// Classifies every manifest document.
///
/// A failure resolving one document's remote state never aborts the rest;
/// it is carried in the plan and surfaces in the report.
pub async fn classify_all<G: RemoteGateway>(
    documents: &[Document],
    ledger: &Ledger,
    gateway: &G,
    space: &str,
) -> Plan {
    let mut plan = Plan::default();

    for document in documents {
        match classify(document, ledger, gateway, space).await {
            Ok(Outcome::Create { note }) => plan.creates.push(PlannedCreate {
                document: document.clone(),
                note,
            }),
            Ok(Outcome::Update {
                remote_id,
                expected_version,
            }) => plan.updates.push(PlannedUpdate {
                document: document.clone(),
                remote_id,
                expected_version,
            }),
            Ok(Outcome::Unchanged) => plan.unchanged.push(document.clone()),
            Ok(Outcome::Conflict { reason, remote_id }) => plan.conflicts.push(PlannedConflict {
                document: document.clone(),
                reason,
                remote_id,
            }),
            Err(error) => plan.failures.push(ClassifyFailure {
                document: document.clone(),
                error,
            }),
        }
    }

    plan
}

/// Error resolving a document's remote state during classification.
#[derive(Debug)]
pub enum ClassifyError {
    /// The remote store could not be consulted for this document.
    RemoteLookup(String, GatewayError),
}

impl fmt::Display for ClassifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifyError::RemoteLookup(path, e) => {
                write!(f, "Remote lookup failed for {}: {}", path, e)
            }
        }
    }
}

impl std::error::Error for ClassifyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClassifyError::RemoteLookup(_, e) => Some(e),
        }
    }
}
