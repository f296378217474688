//! Configuration model.
//!
//! Values come from `config.toml` in the user config directory when present,
//! with environment variable overrides applied by the `Default` impls:
//! - `ROLLBACK_SSH_HOST`, `ROLLBACK_SSH_PORT`, `ROLLBACK_SSH_USER`,
//!   `ROLLBACK_SSH_KEY`, `ROLLBACK_SSH_CONNECT_TIMEOUT`
//! - `ROLLBACK_TEMP_ROOT`, `ROLLBACK_BACKUP_ROOT`
//! - `ROLLBACK_WEBHOOK_URL`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SSH connection settings.
    pub ssh: SshConfig,
    /// Rollback engine settings.
    pub rollback: RollbackConfig,
    /// Notification settings.
    pub notify: NotifyConfig,
}

/// SSH connection settings for the remote web host.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SshConfig {
    /// Remote host name or address.
    pub host: String,
    /// SSH port.
    pub port: u16,
    /// SSH user.
    pub user: String,
    /// Optional identity file path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_path: Option<PathBuf>,
    /// Connection timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("ROLLBACK_SSH_HOST").unwrap_or_default(),
            port: std::env::var("ROLLBACK_SSH_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(22),
            user: std::env::var("ROLLBACK_SSH_USER")
                .unwrap_or_else(|_| whoami::username()),
            key_path: std::env::var("ROLLBACK_SSH_KEY").ok().map(PathBuf::from),
            connect_timeout_secs: std::env::var("ROLLBACK_SSH_CONNECT_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        }
    }
}

/// What to do when content replacement fails partway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnCopyFailure {
    /// Attempt to start the site anyway (it may serve a broken state).
    StartAnyway,
    /// Leave the site stopped for manual intervention.
    LeaveStopped,
}

/// Rollback engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RollbackConfig {
    /// Root for temporary staging directories on the remote host.
    pub temp_root: String,
    /// Root for preventive backups on the remote host.
    pub backup_root: String,
    /// Per-command timeout in seconds.
    pub command_timeout_secs: u64,
    /// Number of state-confirmation polls after stop/start.
    pub poll_attempts: u32,
    /// Seconds between state-confirmation polls.
    pub poll_interval_secs: u64,
    /// Policy when the content copy fails partway.
    pub on_copy_failure: OnCopyFailure,
}

impl Default for RollbackConfig {
    fn default() -> Self {
        Self {
            temp_root: std::env::var("ROLLBACK_TEMP_ROOT")
                .unwrap_or_else(|_| "/var/tmp/site-rollback".to_string()),
            backup_root: std::env::var("ROLLBACK_BACKUP_ROOT")
                .unwrap_or_else(|_| "/var/backups/site-rollback".to_string()),
            command_timeout_secs: 600,
            poll_attempts: 10,
            poll_interval_secs: 2,
            on_copy_failure: OnCopyFailure::StartAnyway,
        }
    }
}

/// Notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Webhook URL to POST run results to. Disabled when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            webhook_url: std::env::var("ROLLBACK_WEBHOOK_URL").ok(),
        }
    }
}

/// Get the configuration directory path.
fn dirs_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("site_rollback")
}

/// Load configuration from file.
pub fn load_config() -> Config {
    let config_path = dirs_config_path().join("config.toml");

    if config_path.exists() {
        if let Ok(content) = std::fs::read_to_string(&config_path) {
            match toml::from_str(&content) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Ignoring malformed config {:?}: {}", config_path, e);
                }
            }
        }
    }

    Config::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rollback_config() {
        let config = RollbackConfig::default();
        assert!(config.poll_attempts > 0);
        assert!(config.command_timeout_secs > 0);
        assert_eq!(config.on_copy_failure, OnCopyFailure::StartAnyway);
    }

    #[test]
    fn test_config_toml_round_trip() {
        let config = Config::default();
        let text = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.rollback.poll_attempts, config.rollback.poll_attempts);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed: Config = toml::from_str("[rollback]\npoll_attempts = 3\n").unwrap();
        assert_eq!(parsed.rollback.poll_attempts, 3);
        assert_eq!(parsed.ssh.port, SshConfig::default().port);
    }
}
