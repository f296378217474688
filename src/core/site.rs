//! Site control.
//!
//! Stops and starts the site's systemd unit and confirms the resulting state
//! by polling `systemctl is-active`. Confirmation is bounded: a site that
//! never reaches the expected state fails the step instead of hanging.

use crate::models::result::SiteState;
use crate::services::ssh::RemoteShell;
use crate::utils::shell::quote;
use crate::Result;
use std::time::Duration;

/// Polling bounds for state confirmation.
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub attempts: u32,
    pub interval: Duration,
}

/// Controls one site's service unit.
pub struct SiteController<'a> {
    shell: &'a dyn RemoteShell,
    timeout: Duration,
    poll: PollSettings,
}

impl<'a> SiteController<'a> {
    pub fn new(shell: &'a dyn RemoteShell, timeout: Duration, poll: PollSettings) -> Self {
        Self { shell, timeout, poll }
    }

    /// Observe the current state of the site's unit.
    pub async fn query_state(&self, site_name: &str) -> Result<SiteState> {
        // is-active exits non-zero for any state other than active, so only
        // the transport result matters here; the state is read from stdout.
        let command = format!("systemctl is-active {}", quote(site_name));
        let output = self.shell.execute(&command, self.timeout).await?;
        Ok(parse_state(&output.stdout))
    }

    /// Stop the site and wait until the stop is confirmed.
    pub async fn stop(&self, site_name: &str) -> Result<()> {
        tracing::info!(site_name, "stopping site");

        let command = format!("systemctl stop {}", quote(site_name));
        let output = self.shell.execute(&command, self.timeout).await?;
        if !output.success() {
            return Err(crate::Error::SiteControl(format!(
                "stop command failed for {}: {}",
                site_name, output.stderr
            )));
        }

        self.await_state(site_name, SiteState::Stopped).await
    }

    /// Start the site and wait until the start is confirmed.
    pub async fn start(&self, site_name: &str) -> Result<()> {
        tracing::info!(site_name, "starting site");

        let command = format!("systemctl start {}", quote(site_name));
        let output = self.shell.execute(&command, self.timeout).await?;
        if !output.success() {
            return Err(crate::Error::SiteControl(format!(
                "start command failed for {}: {}",
                site_name, output.stderr
            )));
        }

        self.await_state(site_name, SiteState::Running).await
    }

    async fn await_state(&self, site_name: &str, expected: SiteState) -> Result<()> {
        for attempt in 1..=self.poll.attempts.max(1) {
            let state = self.query_state(site_name).await?;
            if state == expected {
                tracing::debug!(site_name, ?state, attempt, "state confirmed");
                return Ok(());
            }

            tracing::debug!(site_name, ?state, ?expected, attempt, "state not confirmed yet");

            if attempt < self.poll.attempts {
                tokio::time::sleep(self.poll.interval).await;
            }
        }

        Err(crate::Error::SiteControl(format!(
            "site {} did not reach {:?} within {} attempts",
            site_name, expected, self.poll.attempts
        )))
    }
}

/// Parse `systemctl is-active` output.
///
/// Anything that is not a recognized state maps to `Unknown`, which callers
/// treat as not-confirmed rather than guessing.
pub fn parse_state(stdout: &str) -> SiteState {
    match stdout.trim().lines().next().unwrap_or("").trim() {
        "active" => SiteState::Running,
        "inactive" | "failed" => SiteState::Stopped,
        _ => SiteState::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_state_active() {
        assert_eq!(parse_state("active\n"), SiteState::Running);
    }

    #[test]
    fn test_parse_state_stopped_variants() {
        assert_eq!(parse_state("inactive"), SiteState::Stopped);
        assert_eq!(parse_state("failed\n"), SiteState::Stopped);
    }

    #[test]
    fn test_parse_state_unknown() {
        assert_eq!(parse_state(""), SiteState::Unknown);
        assert_eq!(parse_state("activating"), SiteState::Unknown);
        assert_eq!(parse_state("garbage output"), SiteState::Unknown);
    }
}
