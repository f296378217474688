//! Remote host preflight checks.

use super::CheckResult;
use crate::services::ssh::{self, RemoteShell};
use crate::utils::shell::quote;
use std::time::Duration;

const PROBE_ATTEMPTS: u32 = 3;

/// Check that the remote host answers a trivial command.
pub async fn check_connectivity(shell: &dyn RemoteShell, timeout: Duration) -> CheckResult {
    match ssh::probe(shell, PROBE_ATTEMPTS, timeout).await {
        Ok(()) => CheckResult::ok("remote host", "reachable"),
        Err(e) => CheckResult::fail(
            "remote host",
            &e.to_string(),
            "Check host, credentials and that the key is loaded (ssh-add -l)",
        ),
    }
}

/// Check that a remote path exists.
pub async fn check_path(
    shell: &dyn RemoteShell,
    name: &str,
    path: &str,
    timeout: Duration,
) -> CheckResult {
    let command = format!("test -e {}", quote(path));
    match shell.execute(&command, timeout).await {
        Ok(output) if output.success() => CheckResult::ok(name, &format!("{} exists", path)),
        Ok(_) => CheckResult::fail(
            name,
            &format!("{} not found on remote host", path),
            "Verify the path and that the SSH user can read it",
        ),
        Err(e) => CheckResult::fail(name, &e.to_string(), "Remote check could not run"),
    }
}
