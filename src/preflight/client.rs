//! Local SSH client preflight check.

use super::CheckResult;
use std::process::Command;

/// Check if the OpenSSH client is installed locally.
pub fn check() -> CheckResult {
    // ssh -V prints its version to stderr and exits 0
    match Command::new("ssh").arg("-V").output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stderr);
            let first_line = version.lines().next().unwrap_or("unknown");
            CheckResult::ok("ssh client", &format!("installed ({})", first_line))
        }
        _ => CheckResult::fail(
            "ssh client",
            "not found",
            "Install OpenSSH: sudo apt install openssh-client",
        ),
    }
}
