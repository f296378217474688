//! Rollback command implementation.
//!
//! Drives one orchestrated rollback run end to end: preflight, the run
//! itself, the console summary, the optional report file and the best-effort
//! notification.

use crate::core::orchestrator::Orchestrator;
use crate::core::registry::RunRegistry;
use crate::models::config::Config;
use crate::models::request::RollbackRequest;
use crate::models::result::{self, RollbackOutcome, RollbackResult, StepOutcome};
use crate::preflight;
use crate::services::notify::{Notifier, WebhookNotifier};
use crate::services::ssh::OpenSshShell;
use crate::Result;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub struct RollbackArgs {
    pub site: String,
    pub path: String,
    pub backup: String,
    pub temp_root: Option<String>,
    pub backup_root: Option<String>,
    pub report: Option<std::path::PathBuf>,
    pub skip_preflight: bool,
}

/// Execute a rollback run and return its result.
pub async fn rollback(config: &Config, args: RollbackArgs) -> Result<RollbackResult> {
    println!("{}", "[ROLLBACK] Rollback command".bold().cyan());
    println!();

    let request = RollbackRequest {
        site_name: args.site,
        site_path: args.path,
        backup_path: args.backup,
        temp_root: args
            .temp_root
            .unwrap_or_else(|| config.rollback.temp_root.clone()),
        backup_root: args
            .backup_root
            .unwrap_or_else(|| config.rollback.backup_root.clone()),
    };
    request.validate()?;

    if config.ssh.host.is_empty() {
        return Err(crate::Error::Precondition(
            "no SSH host configured; set ROLLBACK_SSH_HOST or config.toml".to_string(),
        ));
    }

    let shell = OpenSshShell::new(config.ssh.clone());

    if !args.skip_preflight {
        println!("{}", "Running preflight checks...".bold());
        println!();

        let timeout = Duration::from_secs(config.ssh.connect_timeout_secs.max(10));
        let results = preflight::run_preflight_checks(&shell, &request, timeout).await?;
        preflight::print_results(&results);
        println!();

        if !preflight::all_passed(&results) {
            return Err(crate::Error::Precondition(
                "preflight checks failed".to_string(),
            ));
        }
    }

    println!("  {} {}", "Site:".bold(), request.site_name);
    println!("  {} {}", "Site path:".bold(), request.site_path);
    println!("  {} {}", "Backup path:".bold(), request.backup_path);
    println!();

    // Ctrl-C stops the run at the next step boundary; a step already sent to
    // the remote host is allowed to finish first.
    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received; stopping at the next step boundary");
                cancel.store(true, Ordering::Relaxed);
            }
        });
    }

    let orchestrator = Orchestrator::new(&shell, config.rollback.clone(), RunRegistry::new())
        .with_cancel_flag(Arc::clone(&cancel));

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    spinner.set_message(format!("Rolling back site '{}'...", request.site_name));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let result = orchestrator.run(&request).await;

    spinner.finish_and_clear();

    let result = result?;

    print_summary(&result);

    if let Some(ref report_path) = args.report {
        write_report(&result, report_path);
    }

    if let Some(ref url) = config.notify.webhook_url {
        let notifier = WebhookNotifier::new(url.clone());
        if let Err(e) = notifier.notify(&result).await {
            // Notification is best-effort and never changes the outcome.
            tracing::warn!(error = %e, "notification failed");
        }
    }

    Ok(result)
}

fn write_report(result: &RollbackResult, path: &Path) {
    match result::save_report(result, path) {
        Ok(()) => println!("  {} {}", "Report:".bold(), path.display()),
        Err(e) => tracing::warn!(error = %e, "could not write report"),
    }
}

/// Print a per-step summary of the run.
fn print_summary(result: &RollbackResult) {
    println!("{}", "[SUMMARY] Rollback run".bold().green());
    println!("  {} {}", "Run id:".bold(), result.run_id);
    if let Some(kind) = result.backup_kind {
        println!("  {} {:?}", "Backup kind:".bold(), kind);
    }
    println!();

    for record in &result.steps {
        let duration = record
            .finished_at
            .signed_duration_since(record.started_at)
            .num_milliseconds();

        match &record.outcome {
            StepOutcome::Ok => println!(
                "  {} {:<12} ({} ms)",
                "[OK]".green(),
                record.step.to_string(),
                duration
            ),
            StepOutcome::Skipped(reason) => println!(
                "  {} {:<12} {}",
                "[SKIP]".yellow(),
                record.step.to_string(),
                reason
            ),
            StepOutcome::Failed(error) => println!(
                "  {} {:<12} {}",
                "[FAIL]".red(),
                record.step.to_string(),
                error
            ),
        }
    }
    println!();

    if let Some(ref backup) = result.preventive_backup {
        println!(
            "  {} {}{}",
            "Preventive backup:".bold(),
            backup.path,
            if backup.site_was_empty {
                " (live site was empty)"
            } else {
                ""
            }
        );
        println!();
    }

    match result.outcome {
        RollbackOutcome::Success => {
            println!("{}", "[OK] Rollback completed successfully!".green());
        }
        RollbackOutcome::AbortedAmbiguous => {
            println!(
                "{}",
                "[ABORT] Multiple archives in the backup location - nothing was changed"
                    .yellow()
                    .bold()
            );
            if let Some(ref error) = result.error {
                println!("  {}", error);
            }
        }
        RollbackOutcome::AbortedPrecondition => {
            println!(
                "{}",
                "[ABORT] Backup location empty or unreadable - nothing was changed"
                    .yellow()
                    .bold()
            );
            if let Some(ref error) = result.error {
                println!("  {}", error);
            }
        }
        RollbackOutcome::Failed => {
            println!("{}", "[FAIL] Rollback failed".red().bold());
            if let Some(step) = result.failed_step {
                println!("  {} {}", "Failed step:".bold(), step);
            }
            if let Some(ref error) = result.error {
                println!("  {} {}", "Error:".bold(), error);
            }
            if result.preventive_backup.is_some() {
                println!("  The preventive backup above is kept for manual recovery.");
            }
        }
    }
}
