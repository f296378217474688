//! Content staging.
//!
//! Produces a usable file-tree source from either rollback mode. Directory
//! backups are used in place; archive backups are expanded into a fresh
//! timestamped directory under the temp root.

use crate::core::locator::BackupLocation;
use crate::models::result::BackupKind;
use crate::services::ssh::RemoteShell;
use crate::utils::shell::quote;
use crate::Result;
use std::time::Duration;

/// Staged rollback source, owned by one run.
#[derive(Debug, Clone)]
pub struct StagingContext {
    /// Directory the replacement step copies from.
    pub source_path: String,
    /// True when `source_path` was created by this run and must be removed
    /// on every exit path.
    pub is_temporary: bool,
}

/// Expands archive backups into staging directories.
pub struct ContentStager<'a> {
    shell: &'a dyn RemoteShell,
    timeout: Duration,
}

impl<'a> ContentStager<'a> {
    pub fn new(shell: &'a dyn RemoteShell, timeout: Duration) -> Self {
        Self { shell, timeout }
    }

    /// Stage the backup content for replacement.
    ///
    /// `run_stamp` names the staging directory so concurrent runs on other
    /// targets cannot collide and a failed run leaves an inspectable trail.
    pub async fn stage(
        &self,
        backup_path: &str,
        location: &BackupLocation,
        temp_root: &str,
        run_stamp: &str,
    ) -> Result<StagingContext> {
        match location.kind {
            BackupKind::Directory => Ok(StagingContext {
                source_path: backup_path.to_string(),
                is_temporary: false,
            }),
            BackupKind::Archive => {
                let archive_name = location.archive_name.as_deref().ok_or_else(|| {
                    crate::Error::Stage("archive classification carries no file name".to_string())
                })?;
                self.expand_archive(backup_path, archive_name, temp_root, run_stamp)
                    .await
            }
            BackupKind::Ambiguous | BackupKind::Empty => Err(crate::Error::Stage(format!(
                "backup kind {:?} cannot be staged",
                location.kind
            ))),
        }
    }

    async fn expand_archive(
        &self,
        backup_path: &str,
        archive_name: &str,
        temp_root: &str,
        run_stamp: &str,
    ) -> Result<StagingContext> {
        let temp_dir = format!("{}/rollback_{}", temp_root.trim_end_matches('/'), run_stamp);
        let archive = format!("{}/{}", backup_path.trim_end_matches('/'), archive_name);

        let mkdir = format!("mkdir -p {}", quote(&temp_dir));
        let output = self.shell.execute(&mkdir, self.timeout).await?;
        if !output.success() {
            return Err(crate::Error::Stage(format!(
                "cannot create staging directory {}: {}",
                temp_dir, output.stderr
            )));
        }

        tracing::info!(archive = %archive, dest = %temp_dir, "expanding archive");

        let unzip = format!("unzip -q {} -d {}", quote(&archive), quote(&temp_dir));
        let output = self.shell.execute(&unzip, self.timeout).await?;
        if !output.success() {
            // Remove the partial expansion before surfacing the error.
            self.remove_dir(&temp_dir).await;
            return Err(crate::Error::Stage(format!(
                "archive expansion failed for {}: {}",
                archive, output.stderr
            )));
        }

        Ok(StagingContext {
            source_path: temp_dir,
            is_temporary: true,
        })
    }

    /// Remove the staging directory of a temporary context.
    pub async fn cleanup(&self, staging: &StagingContext) -> Result<()> {
        if !staging.is_temporary {
            return Ok(());
        }

        let command = format!("rm -rf {}", quote(&staging.source_path));
        let output = self.shell.execute(&command, self.timeout).await?;
        if !output.success() {
            return Err(crate::Error::other(format!(
                "cannot remove staging directory {}: {}",
                staging.source_path, output.stderr
            )));
        }

        tracing::debug!(path = %staging.source_path, "staging directory removed");
        Ok(())
    }

    async fn remove_dir(&self, path: &str) {
        let command = format!("rm -rf {}", quote(path));
        match self.shell.execute(&command, self.timeout).await {
            Ok(output) if output.success() => {}
            Ok(output) => {
                tracing::warn!(path, stderr = %output.stderr, "failed to remove partial staging directory")
            }
            Err(e) => tracing::warn!(path, error = %e, "failed to remove partial staging directory"),
        }
    }
}
