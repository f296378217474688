//! Rollback orchestration.
//!
//! Drives one rollback run through its states:
//! locating -> staging -> backing up -> stopping -> replacing -> starting ->
//! cleaning up. Aborts before any destructive step when the backup source is
//! ambiguous or empty, and records every step into the run's audit trail.

use crate::core::backup::PreventiveBackupManager;
use crate::core::locator::BackupLocator;
use crate::core::registry::RunRegistry;
use crate::core::site::{PollSettings, SiteController};
use crate::core::stager::{ContentStager, StagingContext};
use crate::models::config::{OnCopyFailure, RollbackConfig};
use crate::models::request::RollbackRequest;
use crate::models::result::{
    BackupKind, PreventiveBackupRecord, RollbackOutcome, RollbackResult, Step, StepOutcome,
    StepRecord,
};
use crate::services::ssh::RemoteShell;
use crate::utils::shell::quote;
use crate::Result;
use chrono::Utc;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Rollback run orchestrator.
pub struct Orchestrator<'a> {
    shell: &'a dyn RemoteShell,
    config: RollbackConfig,
    registry: RunRegistry,
    cancel: Option<Arc<AtomicBool>>,
}

/// Mutable state accumulated over one run.
#[derive(Default)]
struct RunState {
    steps: Vec<StepRecord>,
    backup_kind: Option<BackupKind>,
    staging: Option<StagingContext>,
    preventive_backup: Option<PreventiveBackupRecord>,
}

/// How a run ended, before result assembly.
struct RunEnd {
    outcome: RollbackOutcome,
    failed_step: Option<Step>,
    error: Option<String>,
}

impl RunEnd {
    fn success() -> Self {
        Self {
            outcome: RollbackOutcome::Success,
            failed_step: None,
            error: None,
        }
    }

    fn failed(step: Step, error: &crate::Error) -> Self {
        Self {
            outcome: RollbackOutcome::Failed,
            failed_step: Some(step),
            error: Some(error.to_string()),
        }
    }

    fn aborted(outcome: RollbackOutcome, error: String) -> Self {
        Self {
            outcome,
            failed_step: None,
            error: Some(error),
        }
    }

    fn cancelled(next_step: Step) -> Self {
        Self {
            outcome: RollbackOutcome::Failed,
            failed_step: None,
            error: Some(format!("run cancelled before the {} step", next_step)),
        }
    }
}

/// Run a step, timing it and pushing its audit record.
async fn timed<T, F>(steps: &mut Vec<StepRecord>, step: Step, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let started_at = Utc::now();
    let result = fut.await;

    let outcome = match &result {
        Ok(_) => StepOutcome::Ok,
        Err(e) => StepOutcome::Failed(e.to_string()),
    };

    steps.push(StepRecord {
        step,
        started_at,
        finished_at: Utc::now(),
        outcome,
    });

    result
}

impl<'a> Orchestrator<'a> {
    pub fn new(shell: &'a dyn RemoteShell, config: RollbackConfig, registry: RunRegistry) -> Self {
        Self {
            shell,
            config,
            registry,
            cancel: None,
        }
    }

    /// Honor this flag at step boundaries. A step already dispatched to the
    /// remote host completes before the run stops, so the filesystem is
    /// never left mid-command without a matching record.
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(false)
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.command_timeout_secs)
    }

    /// Execute one rollback run.
    ///
    /// Returns `Err` only when the run is rejected before it starts (a
    /// malformed request, or another run already in flight for the same
    /// target). Everything that happens after acceptance is reported through
    /// the returned [`RollbackResult`], exactly once per run.
    pub async fn run(&self, request: &RollbackRequest) -> Result<RollbackResult> {
        request.validate()?;

        let target_key = request.target_key();
        let _guard = self.registry.acquire(&target_key)?;

        let run_id = uuid::Uuid::new_v4();
        let started_at = Utc::now();
        let run_stamp = started_at.format("%Y%m%d_%H%M%S").to_string();

        tracing::info!(%run_id, site = %request.site_name, "rollback run started");

        let mut state = RunState::default();
        let end = self.drive(request, &run_stamp, &mut state).await;

        // The staging directory is removed on every exit path, not only on
        // success; a removal failure is logged and never changes the outcome.
        self.cleanup(&mut state, end.outcome).await;

        let result = RollbackResult {
            run_id,
            site_name: request.site_name.clone(),
            outcome: end.outcome,
            failed_step: end.failed_step,
            error: end.error,
            started_at,
            finished_at: Utc::now(),
            backup_kind: state.backup_kind,
            preventive_backup: state.preventive_backup,
            staging_used: state
                .staging
                .as_ref()
                .map(|s| s.is_temporary)
                .unwrap_or(false),
            steps: state.steps,
        };

        match result.outcome {
            RollbackOutcome::Success => {
                tracing::info!(%run_id, "rollback run succeeded")
            }
            outcome => tracing::error!(
                %run_id,
                ?outcome,
                failed_step = ?result.failed_step,
                error = result.error.as_deref().unwrap_or(""),
                "rollback run did not succeed"
            ),
        }

        Ok(result)
    }

    async fn drive(
        &self,
        request: &RollbackRequest,
        run_stamp: &str,
        state: &mut RunState,
    ) -> RunEnd {
        let timeout = self.timeout();
        let locator = BackupLocator::new(self.shell, timeout);
        let stager = ContentStager::new(self.shell, timeout);
        let backup = PreventiveBackupManager::new(self.shell, timeout);
        let site = SiteController::new(
            self.shell,
            timeout,
            PollSettings {
                attempts: self.config.poll_attempts,
                interval: Duration::from_secs(self.config.poll_interval_secs),
            },
        );

        if self.is_cancelled() {
            return RunEnd::cancelled(Step::Locating);
        }

        // Locating. Nothing destructive may happen until the backup source
        // is unambiguous.
        let location = match timed(
            &mut state.steps,
            Step::Locating,
            locator.locate(&request.backup_path),
        )
        .await
        {
            Ok(location) => location,
            Err(e @ crate::Error::Precondition(_)) => {
                return RunEnd::aborted(RollbackOutcome::AbortedPrecondition, e.to_string());
            }
            Err(e) => return RunEnd::failed(Step::Locating, &e),
        };

        state.backup_kind = Some(location.kind);

        match location.kind {
            BackupKind::Ambiguous => {
                return RunEnd::aborted(
                    RollbackOutcome::AbortedAmbiguous,
                    format!(
                        "{} archives found under {}; cannot pick one",
                        location.archive_count, request.backup_path
                    ),
                );
            }
            BackupKind::Empty => {
                return RunEnd::aborted(
                    RollbackOutcome::AbortedPrecondition,
                    format!("backup location {} is empty", request.backup_path),
                );
            }
            BackupKind::Archive | BackupKind::Directory => {}
        }

        if self.is_cancelled() {
            return RunEnd::cancelled(Step::Staging);
        }

        // Staging. The transition is uniform; for a directory backup the
        // stager hands the backup path back untouched.
        let staging_started = Utc::now();
        let staging = match stager
            .stage(&request.backup_path, &location, &request.temp_root, run_stamp)
            .await
        {
            Ok(staging) => {
                let outcome = if staging.is_temporary {
                    StepOutcome::Ok
                } else {
                    StepOutcome::Skipped("directory backup used in place".to_string())
                };
                state.steps.push(StepRecord {
                    step: Step::Staging,
                    started_at: staging_started,
                    finished_at: Utc::now(),
                    outcome,
                });
                staging
            }
            Err(e) => {
                state.steps.push(StepRecord {
                    step: Step::Staging,
                    started_at: staging_started,
                    finished_at: Utc::now(),
                    outcome: StepOutcome::Failed(e.to_string()),
                });
                return RunEnd::failed(Step::Staging, &e);
            }
        };
        state.staging = Some(staging.clone());

        if self.is_cancelled() {
            return RunEnd::cancelled(Step::BackingUp);
        }

        // Backing up. Must be verified before anything destructive.
        match timed(
            &mut state.steps,
            Step::BackingUp,
            backup.snapshot(&request.site_path, &request.backup_root, run_stamp),
        )
        .await
        {
            Ok(record) => state.preventive_backup = Some(record),
            Err(e) => return RunEnd::failed(Step::BackingUp, &e),
        }

        if self.is_cancelled() {
            return RunEnd::cancelled(Step::Stopping);
        }

        // Stopping. Content under a still-running site is never deleted.
        if let Err(e) = timed(
            &mut state.steps,
            Step::Stopping,
            site.stop(&request.site_name),
        )
        .await
        {
            return RunEnd::failed(Step::Stopping, &e);
        }

        if self.is_cancelled() {
            return RunEnd::cancelled(Step::Replacing);
        }

        // Replacing. Cancellation is no longer honored past this point: once
        // the content is replaced, starting the site is the only sane way to
        // finish.
        if let Err(e) = timed(
            &mut state.steps,
            Step::Replacing,
            self.replace(&request.site_path, &staging),
        )
        .await
        {
            let start_anyway = match self.config.on_copy_failure {
                OnCopyFailure::StartAnyway => !e.is_destination_unavailable(),
                OnCopyFailure::LeaveStopped => false,
            };

            if start_anyway {
                tracing::warn!(
                    site = %request.site_name,
                    "content replacement failed; attempting to start the site anyway"
                );
                let _ = timed(
                    &mut state.steps,
                    Step::Starting,
                    site.start(&request.site_name),
                )
                .await;
            }

            return RunEnd::failed(Step::Replacing, &e);
        }

        // Starting. A failed start confirmation does not reverse the copy;
        // the restored content is the stronger guarantee.
        if let Err(e) = timed(
            &mut state.steps,
            Step::Starting,
            site.start(&request.site_name),
        )
        .await
        {
            return RunEnd::failed(Step::Starting, &e);
        }

        RunEnd::success()
    }

    /// Delete the current content under the site path (keeping the root
    /// itself) and copy the staged tree in.
    async fn replace(&self, site_path: &str, staging: &StagingContext) -> Result<()> {
        let timeout = self.timeout();

        let probe = format!("test -d {}", quote(site_path));
        let output = self.shell.execute(&probe, timeout).await?;
        if !output.success() {
            return Err(crate::Error::DestinationUnavailable(format!(
                "site path {} is not a directory",
                site_path
            )));
        }

        tracing::info!(site_path, "deleting current site content");

        let delete = format!(
            "find {} -mindepth 1 -maxdepth 1 -exec rm -rf {{}} +",
            quote(site_path)
        );
        let output = self.shell.execute(&delete, timeout).await?;
        if !output.success() {
            return Err(crate::Error::Copy(format!(
                "cannot delete content under {}: {}",
                site_path, output.stderr
            )));
        }

        tracing::info!(from = %staging.source_path, to = %site_path, "copying rollback content");

        let copy = format!(
            "cp -a {}/. {}/",
            quote(&staging.source_path),
            quote(site_path)
        );
        let output = self.shell.execute(&copy, timeout).await?;
        if !output.success() {
            return Err(crate::Error::Copy(format!(
                "copy into {} failed: {}",
                site_path, output.stderr
            )));
        }

        Ok(())
    }

    async fn cleanup(&self, state: &mut RunState, outcome: RollbackOutcome) {
        let Some(staging) = state.staging.clone() else {
            return;
        };

        if staging.is_temporary {
            let stager = ContentStager::new(self.shell, self.timeout());
            if let Err(e) = timed(
                &mut state.steps,
                Step::CleaningUp,
                stager.cleanup(&staging),
            )
            .await
            {
                tracing::warn!(
                    path = %staging.source_path,
                    error = %e,
                    "staging cleanup failed; leaving directory behind"
                );
            }
        } else if outcome == RollbackOutcome::Success {
            let now = Utc::now();
            state.steps.push(StepRecord {
                step: Step::CleaningUp,
                started_at: now,
                finished_at: now,
                outcome: StepOutcome::Skipped("no temporary staging directory".to_string()),
            });
        }
    }
}
