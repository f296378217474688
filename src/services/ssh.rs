//! Remote command execution over OpenSSH.
//!
//! All remote work goes through the [`RemoteShell`] trait so the engine can
//! be driven against a scripted shell in tests. The production implementation
//! spawns the local `ssh` client in batch mode; interactive prompts are
//! disabled so an unattended run can never hang on a password question.

use crate::models::config::SshConfig;
use crate::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Output of one remote command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Stdout split into non-empty trimmed lines.
    pub fn stdout_lines(&self) -> Vec<&str> {
        self.stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect()
    }
}

/// A shell on the remote web host.
///
/// `execute` returns `Ok` with the command's own exit status for commands
/// that ran, and `Err` only when the transport itself failed (connection,
/// authentication, timeout).
#[async_trait]
pub trait RemoteShell: Send + Sync {
    async fn execute(&self, command: &str, timeout: Duration) -> Result<CommandOutput>;
}

/// ssh reserves exit code 255 for its own failures.
const SSH_TRANSPORT_ERROR: i32 = 255;

/// RemoteShell implementation spawning the local OpenSSH client.
pub struct OpenSshShell {
    config: SshConfig,
}

impl OpenSshShell {
    pub fn new(config: SshConfig) -> Self {
        Self { config }
    }

    fn destination(&self) -> String {
        format!("{}@{}", self.config.user, self.config.host)
    }

    fn base_args(&self) -> Vec<String> {
        let mut args = vec![
            "-p".to_string(),
            self.config.port.to_string(),
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.config.connect_timeout_secs),
        ];
        if let Some(ref key) = self.config.key_path {
            args.push("-i".to_string());
            args.push(key.display().to_string());
        }
        args.push(self.destination());
        args.push("--".to_string());
        args
    }
}

#[async_trait]
impl RemoteShell for OpenSshShell {
    async fn execute(&self, command: &str, timeout: Duration) -> Result<CommandOutput> {
        let mut args = self.base_args();
        args.push(command.to_string());

        tracing::debug!(host = %self.config.host, command, "executing remote command");

        let child = tokio::process::Command::new("ssh")
            .args(&args)
            .stdin(std::process::Stdio::null())
            .output();

        let output = tokio::time::timeout(timeout, child)
            .await
            .map_err(|_| crate::Error::CommandTimeout {
                command: command.to_string(),
                timeout_secs: timeout.as_secs(),
            })?
            .map_err(|e| crate::Error::Connection(format!("failed to spawn ssh: {}", e)))?;

        let result = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).trim_end().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
            exit_code: output.status.code().unwrap_or(-1),
        };

        if result.exit_code == SSH_TRANSPORT_ERROR {
            return Err(classify_transport_error(&result.stderr));
        }

        tracing::debug!(
            exit_code = result.exit_code,
            stdout_len = result.stdout.len(),
            "remote command finished"
        );

        Ok(result)
    }
}

fn classify_transport_error(stderr: &str) -> crate::Error {
    let lower = stderr.to_lowercase();
    if lower.contains("permission denied") || lower.contains("authentication") {
        crate::Error::Auth(stderr.to_string())
    } else {
        crate::Error::Connection(stderr.to_string())
    }
}

/// Probe the remote host with bounded exponential backoff.
///
/// Used by preflight; ordinary commands are never retried, since a rerun of
/// a half-applied destructive command is worse than a failed run.
pub async fn probe(shell: &dyn RemoteShell, attempts: u32, timeout: Duration) -> Result<()> {
    let mut delay = Duration::from_secs(2);
    let mut last_err = None;

    for attempt in 1..=attempts.max(1) {
        match shell.execute("true", timeout).await {
            Ok(output) if output.success() => return Ok(()),
            Ok(output) => {
                return Err(crate::Error::Connection(format!(
                    "probe command exited with {}: {}",
                    output.exit_code, output.stderr
                )))
            }
            Err(e @ crate::Error::Auth(_)) => return Err(e),
            Err(e) => {
                tracing::warn!(attempt, error = %e, "connectivity probe failed");
                last_err = Some(e);
                if attempt < attempts {
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(Duration::from_secs(10));
                }
            }
        }
    }

    Err(last_err.unwrap_or_else(|| crate::Error::Connection("probe failed".to_string())))
}
