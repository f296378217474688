//! Inspect command implementation.
//!
//! Classifies a backup location the same way a rollback run would, without
//! touching the live site.

use crate::core::locator::BackupLocator;
use crate::models::config::Config;
use crate::models::result::BackupKind;
use crate::services::ssh::OpenSshShell;
use crate::Result;
use colored::Colorize;
use std::time::Duration;

/// Classify a backup path and print the verdict.
pub async fn inspect(config: &Config, backup_path: &str) -> Result<()> {
    println!("{}", "[INSPECT] Backup location".bold().cyan());
    println!();

    if config.ssh.host.is_empty() {
        return Err(crate::Error::Precondition(
            "no SSH host configured; set ROLLBACK_SSH_HOST or config.toml".to_string(),
        ));
    }

    let shell = OpenSshShell::new(config.ssh.clone());
    let locator = BackupLocator::new(
        &shell,
        Duration::from_secs(config.rollback.command_timeout_secs),
    );

    let location = locator.locate(backup_path).await?;

    println!("  {} {}", "Path:".bold(), backup_path);
    println!("  {} {}", "Entries:".bold(), location.entry_count);
    println!("  {} {}", "Archives:".bold(), location.archive_count);
    println!();

    match location.kind {
        BackupKind::Archive => {
            println!(
                "{} archive mode ({})",
                "[OK]".green(),
                location.archive_name.as_deref().unwrap_or("?")
            );
        }
        BackupKind::Directory => {
            println!("{} directory mode", "[OK]".green());
        }
        BackupKind::Ambiguous => {
            println!(
                "{} ambiguous: {} archives found, a rollback would abort",
                "[WARN]".yellow(),
                location.archive_count
            );
        }
        BackupKind::Empty => {
            println!(
                "{} empty: nothing to roll back from, a rollback would abort",
                "[WARN]".yellow()
            );
        }
    }

    Ok(())
}
