//! Rollback result model and report I/O.

use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Classification of a backup location's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupKind {
    /// Exactly one recognized archive file.
    Archive,
    /// Plain file tree, used in place.
    Directory,
    /// More than one archive file, no authoritative source.
    Ambiguous,
    /// Nothing under the backup path.
    Empty,
}

/// Observed state of a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteState {
    Running,
    Stopped,
    /// Output of the state query could not be parsed. Treated as a failure
    /// condition for confirmation, never assumed to mean anything else.
    Unknown,
}

/// Terminal outcome of a rollback run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollbackOutcome {
    Success,
    AbortedAmbiguous,
    AbortedPrecondition,
    Failed,
}

impl RollbackOutcome {
    /// Process exit code for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            RollbackOutcome::Success => 0,
            RollbackOutcome::AbortedAmbiguous | RollbackOutcome::AbortedPrecondition => 2,
            RollbackOutcome::Failed => 1,
        }
    }
}

/// Steps of the rollback sequence, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Locating,
    Staging,
    BackingUp,
    Stopping,
    Replacing,
    Starting,
    CleaningUp,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Locating => "locating",
            Step::Staging => "staging",
            Step::BackingUp => "backing_up",
            Step::Stopping => "stopping",
            Step::Replacing => "replacing",
            Step::Starting => "starting",
            Step::CleaningUp => "cleaning_up",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "detail")]
pub enum StepOutcome {
    Ok,
    Skipped(String),
    Failed(String),
}

/// Audit record for one executed step. Never overwritten once pushed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: Step,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcome: StepOutcome,
}

/// Preventive backup taken before any destructive step.
///
/// The engine never deletes these; they are retained for manual recovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreventiveBackupRecord {
    /// Remote path of the snapshot directory.
    pub path: String,
    pub created_at: DateTime<Utc>,
    /// True when the live site had no content to snapshot.
    pub site_was_empty: bool,
}

/// Result of one rollback run. Produced exactly once, immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackResult {
    /// Unique id of this run.
    pub run_id: uuid::Uuid,
    /// Name of the site the run targeted.
    pub site_name: String,
    pub outcome: RollbackOutcome,
    /// Step at which the run failed, if it did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_step: Option<Step>,
    /// Error detail for a failed or aborted run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Backup classification observed during the run, if it got that far.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_kind: Option<BackupKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preventive_backup: Option<PreventiveBackupRecord>,
    /// Whether a temporary staging directory was used.
    pub staging_used: bool,
    /// Per-step audit trail, in execution order.
    pub steps: Vec<StepRecord>,
}

impl RollbackResult {
    pub fn is_success(&self) -> bool {
        self.outcome == RollbackOutcome::Success
    }

    /// Find the audit record for a given step, if it ran.
    pub fn step_record(&self, step: Step) -> Option<&StepRecord> {
        self.steps.iter().find(|r| r.step == step)
    }
}

/// Load a rollback report from a JSON file.
pub fn load_report(path: &Path) -> Result<RollbackResult> {
    let content = fs::read_to_string(path)?;
    let result: RollbackResult = serde_json::from_str(&content)
        .map_err(|e| crate::Error::InvalidReportFile(format!("{}: {}", path.display(), e)))?;
    Ok(result)
}

/// Save a rollback report to a JSON file.
pub fn save_report(result: &RollbackResult, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(result)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = fs::File::create(path)?;
    file.write_all(json.as_bytes())?;

    tracing::info!("Report saved to {:?}", path);
    Ok(())
}
