//! Backup location classification.
//!
//! Inspects the remote backup path and decides which rollback mode applies:
//! - exactly one archive file -> archive mode
//! - no archives but other entries -> directory mode
//! - two or more archives -> ambiguous, the run must abort
//! - nothing at all -> empty, the run must abort

use crate::models::result::BackupKind;
use crate::services::ssh::RemoteShell;
use crate::utils::shell::quote;
use crate::Result;
use std::time::Duration;

/// Recognized archive extension (lowercase).
const ARCHIVE_EXT: &str = ".zip";

/// Classification of a backup path plus the data staging needs.
#[derive(Debug, Clone)]
pub struct BackupLocation {
    pub kind: BackupKind,
    /// File name of the single archive, present only for `Archive`.
    pub archive_name: Option<String>,
    /// Number of entries directly under the backup path.
    pub entry_count: usize,
    /// Number of archive entries among them.
    pub archive_count: usize,
}

/// Classifies remote backup locations.
pub struct BackupLocator<'a> {
    shell: &'a dyn RemoteShell,
    timeout: Duration,
}

impl<'a> BackupLocator<'a> {
    pub fn new(shell: &'a dyn RemoteShell, timeout: Duration) -> Self {
        Self { shell, timeout }
    }

    /// List the entries directly under `backup_path` and classify them.
    ///
    /// A listing failure (missing path, permission denied) surfaces as a
    /// precondition error rather than being folded into `Empty`.
    pub async fn locate(&self, backup_path: &str) -> Result<BackupLocation> {
        let command = format!(
            r"find {} -mindepth 1 -maxdepth 1 -printf '%f\n'",
            quote(backup_path)
        );

        let output = self.shell.execute(&command, self.timeout).await?;

        if !output.success() {
            return Err(crate::Error::Precondition(format!(
                "cannot list backup path {}: {}",
                backup_path, output.stderr
            )));
        }

        let entries = output.stdout_lines();
        let location = classify_entries(&entries);

        tracing::info!(
            backup_path,
            kind = ?location.kind,
            entries = location.entry_count,
            archives = location.archive_count,
            "backup location classified"
        );

        Ok(location)
    }
}

fn is_archive(name: &str) -> bool {
    name.to_lowercase().ends_with(ARCHIVE_EXT)
}

/// Classify a directory listing. Pure so the decision table is testable
/// without a remote host.
pub fn classify_entries(entries: &[&str]) -> BackupLocation {
    let archives: Vec<&str> = entries.iter().copied().filter(|e| is_archive(e)).collect();

    let kind = match (entries.len(), archives.len()) {
        (0, _) => BackupKind::Empty,
        (_, 0) => BackupKind::Directory,
        (_, 1) => BackupKind::Archive,
        (_, _) => BackupKind::Ambiguous,
    };

    BackupLocation {
        kind,
        archive_name: if archives.len() == 1 {
            Some(archives[0].to_string())
        } else {
            None
        },
        entry_count: entries.len(),
        archive_count: archives.len(),
    }
}
