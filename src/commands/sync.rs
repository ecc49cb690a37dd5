//! The sync subcommand: run the reconciliation engine end to end.

use clap::Args;
use std::path::PathBuf;
use tracing::info;

use crate::config::Config;
use crate::convert::CodeMacroConverter;
use crate::ledger::{Ledger, LedgerError};
use crate::manifest::{Manifest, ManifestError};
use crate::reconcile::{classify_all, execute, ExecuteOptions};
use crate::remote::{ConfluenceClient, GatewayError};

/// Reconcile manifest documents with the remote space
#[derive(Debug, Args)]
pub struct SyncCommand {
    /// Path to the manifest produced by the extraction step
    #[arg(long, short)]
    manifest: PathBuf,

    /// Target space key (defaults to the configured space)
    #[arg(long, short)]
    space: Option<String>,

    /// Show what would be done without making changes
    #[arg(long)]
    dry_run: bool,

    /// Actually apply changes to the remote space
    #[arg(long)]
    apply: bool,

    /// Sync ledger file (defaults to the configured state file)
    #[arg(long)]
    state_file: Option<PathBuf>,

    /// Write the JSON report to a file
    #[arg(long, short)]
    output: Option<PathBuf>,
}

impl SyncCommand {
    /// Runs a sync and returns the process exit code for the report.
    pub async fn run(&self, config: &Config) -> Result<i32, SyncCommandError> {
        if self.dry_run == self.apply {
            return Err(SyncCommandError::ModeRequired);
        }

        let space = self
            .space
            .clone()
            .or_else(|| config.space.clone())
            .ok_or(SyncCommandError::SpaceRequired)?;

        let manifest = Manifest::load(&self.manifest)?;
        info!("Loaded manifest with {} document(s)", manifest.len());

        let state_file = self
            .state_file
            .clone()
            .unwrap_or_else(|| config.state_file.clone());
        let mut ledger = Ledger::load(&state_file)?;
        info!(
            "Ledger {} tracks {} document(s)",
            state_file.display(),
            ledger.len()
        );

        let gateway = ConfluenceClient::from_config(config)?;

        let plan = classify_all(&manifest.documents, &ledger, &gateway, &space).await;

        // Every single document failing its remote lookup means the store
        // itself is unreachable; abort rather than report N identical errors.
        if !manifest.is_empty() && plan.failures.len() == manifest.len() {
            return Err(SyncCommandError::RemoteUnavailable(plan.failures.len()));
        }

        if plan.is_all_unchanged() {
            info!("All documents unchanged");
        } else {
            info!(
                "Classified: {} create, {} update, {} unchanged, {} conflict, {} failed",
                plan.creates.len(),
                plan.updates.len(),
                plan.unchanged.len(),
                plan.conflicts.len(),
                plan.failures.len()
            );
        }

        let options = ExecuteOptions {
            space,
            dry_run: self.dry_run,
        };
        let report = execute(plan, &gateway, &CodeMacroConverter, &mut ledger, &options).await;

        if let Some(path) = &self.output {
            let json = report.to_json().map_err(SyncCommandError::Encode)?;
            std::fs::write(path, json)
                .map_err(|e| SyncCommandError::WriteOutput(path.clone(), e))?;
            info!("Report written to {}", path.display());
        }

        println!("{}", report);

        Ok(report.exit_code())
    }
}

/// Errors from the sync command
#[derive(Debug)]
pub enum SyncCommandError {
    /// Neither or both of --dry-run and --apply were given
    ModeRequired,
    /// No space key on the command line or in config
    SpaceRequired,
    /// Manifest unusable
    Manifest(ManifestError),
    /// Ledger unusable
    Ledger(LedgerError),
    /// Remote gateway unusable
    Gateway(GatewayError),
    /// Every remote lookup failed
    RemoteUnavailable(usize),
    /// Report could not be serialized
    Encode(serde_json::Error),
    /// Report file could not be written
    WriteOutput(PathBuf, std::io::Error),
}

impl std::fmt::Display for SyncCommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncCommandError::ModeRequired => {
                write!(f, "Specify exactly one of --dry-run or --apply")
            }
            SyncCommandError::SpaceRequired => {
                write!(f, "No space key given; pass --space or set it in config")
            }
            SyncCommandError::Manifest(e) => write!(f, "{}", e),
            SyncCommandError::Ledger(e) => write!(f, "{}", e),
            SyncCommandError::Gateway(e) => write!(f, "{}", e),
            SyncCommandError::RemoteUnavailable(count) => write!(
                f,
                "Remote store unreachable: all {} document lookup(s) failed",
                count
            ),
            SyncCommandError::Encode(e) => write!(f, "Failed to encode report: {}", e),
            SyncCommandError::WriteOutput(path, e) => {
                write!(f, "Failed to write report '{}': {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for SyncCommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SyncCommandError::Manifest(e) => Some(e),
            SyncCommandError::Ledger(e) => Some(e),
            SyncCommandError::Gateway(e) => Some(e),
            SyncCommandError::Encode(e) => Some(e),
            SyncCommandError::WriteOutput(_, e) => Some(e),
            _ => None,
        }
    }
}

impl From<ManifestError> for SyncCommandError {
    fn from(e: ManifestError) -> Self {
        SyncCommandError::Manifest(e)
    }
}

impl From<LedgerError> for SyncCommandError {
    fn from(e: LedgerError) -> Self {
        SyncCommandError::Ledger(e)
    }
}

impl From<GatewayError> for SyncCommandError {
    fn from(e: GatewayError) -> Self {
        SyncCommandError::Gateway(e)
    }
}
