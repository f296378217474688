//! Status command implementation.

use crate::core::site::{PollSettings, SiteController};
use crate::models::config::Config;
use crate::models::result::SiteState;
use crate::services::ssh::OpenSshShell;
use crate::utils::shell::validate_site_name;
use crate::Result;
use colored::Colorize;
use std::time::Duration;

/// Query and print the observed state of a site.
pub async fn status(config: &Config, site: &str) -> Result<()> {
    validate_site_name(site)?;

    if config.ssh.host.is_empty() {
        return Err(crate::Error::Precondition(
            "no SSH host configured; set ROLLBACK_SSH_HOST or config.toml".to_string(),
        ));
    }

    let shell = OpenSshShell::new(config.ssh.clone());
    let controller = SiteController::new(
        &shell,
        Duration::from_secs(config.rollback.command_timeout_secs),
        PollSettings {
            attempts: 1,
            interval: Duration::from_secs(0),
        },
    );

    let state = controller.query_state(site).await?;

    match state {
        SiteState::Running => println!("{} {} is running", "[OK]".green(), site.bold()),
        SiteState::Stopped => println!("{} {} is stopped", "[--]".yellow(), site.bold()),
        SiteState::Unknown => println!(
            "{} state of {} could not be determined",
            "[??]".red(),
            site.bold()
        ),
    }

    Ok(())
}
