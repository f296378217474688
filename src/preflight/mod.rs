//! Preflight checks module.

mod client;
mod remote;

use crate::models::request::RollbackRequest;
use crate::services::ssh::RemoteShell;
use crate::Result;
use colored::Colorize;
use std::time::Duration;

/// Result of a preflight check.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub success: bool,
    pub message: String,
    pub hint: Option<String>,
}

impl CheckResult {
    pub fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            success: true,
            message: message.to_string(),
            hint: None,
        }
    }

    pub fn fail(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            success: false,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }
}

/// Run all preflight checks for a rollback request.
pub async fn run_preflight_checks(
    shell: &dyn RemoteShell,
    request: &RollbackRequest,
    timeout: Duration,
) -> Result<Vec<CheckResult>> {
    let mut results = Vec::new();

    // Check local ssh client
    results.push(client::check());

    // Check remote connectivity; without it the path checks cannot run
    let connectivity = remote::check_connectivity(shell, timeout).await;
    let connected = connectivity.success;
    results.push(connectivity);

    if connected {
        results.push(remote::check_path(shell, "backup path", &request.backup_path, timeout).await);
        results.push(remote::check_path(shell, "site path", &request.site_path, timeout).await);
    }

    Ok(results)
}

/// Print preflight check results.
pub fn print_results(results: &[CheckResult]) {
    for result in results {
        if result.success {
            println!(
                "{} {}: {}",
                "[OK]".green(),
                result.name.bold(),
                result.message
            );
        } else {
            println!(
                "{} {}: {}",
                "[FAIL]".red(),
                result.name.bold(),
                result.message
            );
            if let Some(ref hint) = result.hint {
                println!("  {} {}", "->".yellow(), hint);
            }
        }
    }
}

/// Check if all preflight checks passed.
pub fn all_passed(results: &[CheckResult]) -> bool {
    results.iter().all(|r| r.success)
}
