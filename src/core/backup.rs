//! Preventive backups.
//!
//! Snapshots the live site content before any destructive step. This is the
//! rollback's own safety net: a failure here aborts the run before anything
//! has been changed, and a completed snapshot is never deleted by the engine.

use crate::models::result::PreventiveBackupRecord;
use crate::services::ssh::RemoteShell;
use crate::utils::shell::quote;
use crate::Result;
use chrono::Utc;
use std::time::Duration;

/// Creates and verifies preventive backups.
pub struct PreventiveBackupManager<'a> {
    shell: &'a dyn RemoteShell,
    timeout: Duration,
}

impl<'a> PreventiveBackupManager<'a> {
    pub fn new(shell: &'a dyn RemoteShell, timeout: Duration) -> Self {
        Self { shell, timeout }
    }

    /// Copy the live site content into a timestamped directory under
    /// `backup_root` and verify the result before returning.
    ///
    /// Verification accepts either a non-empty snapshot or the explicit
    /// observation that the live site itself held nothing to copy.
    pub async fn snapshot(
        &self,
        site_path: &str,
        backup_root: &str,
        run_stamp: &str,
    ) -> Result<PreventiveBackupRecord> {
        let dest = format!(
            "{}/pre_rollback_{}",
            backup_root.trim_end_matches('/'),
            run_stamp
        );

        let mkdir = format!("mkdir -p {}", quote(&dest));
        let output = self.shell.execute(&mkdir, self.timeout).await?;
        if !output.success() {
            return Err(crate::Error::Backup(format!(
                "cannot create backup directory {}: {}",
                dest, output.stderr
            )));
        }

        tracing::info!(from = %site_path, to = %dest, "creating preventive backup");

        let copy = format!("cp -a {}/. {}/", quote(site_path), quote(&dest));
        let output = self.shell.execute(&copy, self.timeout).await?;
        if !output.success() {
            return Err(crate::Error::Backup(format!(
                "snapshot copy failed: {}",
                output.stderr
            )));
        }

        let site_was_empty = self.verify(site_path, &dest).await?;

        Ok(PreventiveBackupRecord {
            path: dest,
            created_at: Utc::now(),
            site_was_empty,
        })
    }

    /// Returns whether the live site was empty; errors when the snapshot is
    /// empty while the live site is not.
    async fn verify(&self, site_path: &str, dest: &str) -> Result<bool> {
        if self.count_entries(dest).await? > 0 {
            return Ok(false);
        }

        if self.count_entries(site_path).await? > 0 {
            return Err(crate::Error::Backup(format!(
                "snapshot at {} is empty but live site {} is not",
                dest, site_path
            )));
        }

        tracing::warn!(site_path, "live site was already empty; empty snapshot acknowledged");
        Ok(true)
    }

    async fn count_entries(&self, path: &str) -> Result<usize> {
        let command = format!(
            r"find {} -mindepth 1 -maxdepth 1 -printf '%f\n'",
            quote(path)
        );
        let output = self.shell.execute(&command, self.timeout).await?;
        if !output.success() {
            return Err(crate::Error::Backup(format!(
                "cannot list {}: {}",
                path, output.stderr
            )));
        }
        Ok(output.stdout_lines().len())
    }
}
