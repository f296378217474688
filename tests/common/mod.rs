//! Shared test fixtures: a scripted remote shell and request/config builders.

#![allow(dead_code)]

use async_trait::async_trait;
use site_rollback::models::config::{OnCopyFailure, RollbackConfig};
use site_rollback::models::request::RollbackRequest;
use site_rollback::services::ssh::{CommandOutput, RemoteShell};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// Scripted response for one command pattern.
#[derive(Debug, Clone)]
pub enum Resp {
    Output {
        stdout: String,
        stderr: String,
        exit_code: i32,
    },
    Connection(String),
}

impl Resp {
    fn into_result(self) -> site_rollback::Result<CommandOutput> {
        match self {
            Resp::Output {
                stdout,
                stderr,
                exit_code,
            } => Ok(CommandOutput {
                stdout,
                stderr,
                exit_code,
            }),
            Resp::Connection(msg) => Err(site_rollback::Error::Connection(msg)),
        }
    }
}

/// Successful command with the given stdout.
pub fn ok(stdout: &str) -> Resp {
    Resp::Output {
        stdout: stdout.to_string(),
        stderr: String::new(),
        exit_code: 0,
    }
}

/// Failed command with the given exit code and stderr.
pub fn fail(exit_code: i32, stderr: &str) -> Resp {
    Resp::Output {
        stdout: String::new(),
        stderr: stderr.to_string(),
        exit_code,
    }
}

/// Transport-level connection failure.
pub fn conn_err(msg: &str) -> Resp {
    Resp::Connection(msg.to_string())
}

struct Rule {
    pattern: String,
    queue: VecDeque<Resp>,
}

struct Inner {
    rules: Vec<Rule>,
    log: Vec<String>,
}

/// In-memory RemoteShell answering commands from a script.
///
/// Commands are matched by substring against registered patterns, first
/// match wins. Multiple responses for one pattern are consumed in order;
/// the last one repeats. Unmatched commands fail with exit code 1 so a
/// test can never silently "succeed" through an unscripted command.
pub struct ScriptedShell {
    inner: Mutex<Inner>,
    delay: Duration,
}

impl ScriptedShell {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                rules: Vec::new(),
                log: Vec::new(),
            }),
            delay: Duration::ZERO,
        }
    }

    /// Shell that yields to the runtime before answering each command.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::new()
        }
    }

    /// Register a response for commands containing `pattern`.
    pub fn on(&self, pattern: &str, response: Resp) -> &Self {
        let mut inner = self.inner.lock().unwrap();
        if let Some(rule) = inner.rules.iter_mut().find(|r| r.pattern == pattern) {
            rule.queue.push_back(response);
        } else {
            inner.rules.push(Rule {
                pattern: pattern.to_string(),
                queue: VecDeque::from([response]),
            });
        }
        self
    }

    /// All commands executed so far, in order.
    pub fn commands(&self) -> Vec<String> {
        self.inner.lock().unwrap().log.clone()
    }

    /// Whether any executed command contains `pattern`.
    pub fn issued(&self, pattern: &str) -> bool {
        self.inner
            .lock()
            .unwrap()
            .log
            .iter()
            .any(|c| c.contains(pattern))
    }
}

#[async_trait]
impl RemoteShell for ScriptedShell {
    async fn execute(
        &self,
        command: &str,
        _timeout: Duration,
    ) -> site_rollback::Result<CommandOutput> {
        if self.delay > Duration::ZERO {
            tokio::time::sleep(self.delay).await;
        }

        let mut inner = self.inner.lock().unwrap();
        inner.log.push(command.to_string());

        for rule in inner.rules.iter_mut() {
            if command.contains(&rule.pattern) {
                let resp = if rule.queue.len() > 1 {
                    rule.queue.pop_front().unwrap()
                } else {
                    rule.queue.front().cloned().unwrap()
                };
                return resp.into_result();
            }
        }

        Ok(CommandOutput {
            stdout: String::new(),
            stderr: format!("no scripted response for: {}", command),
            exit_code: 1,
        })
    }
}

/// Rollback request against the fixture paths used across the tests.
pub fn request() -> RollbackRequest {
    RollbackRequest {
        site_name: "shop".to_string(),
        site_path: "/srv/www/shop".to_string(),
        backup_path: "/srv/backups/shop/release-42".to_string(),
        temp_root: "/srv/tmp".to_string(),
        backup_root: "/srv/backups/shop".to_string(),
    }
}

/// Engine config with fast polling for tests.
pub fn config() -> RollbackConfig {
    RollbackConfig {
        temp_root: "/srv/tmp".to_string(),
        backup_root: "/srv/backups/shop".to_string(),
        command_timeout_secs: 5,
        poll_attempts: 3,
        poll_interval_secs: 0,
        on_copy_failure: OnCopyFailure::StartAnyway,
    }
}

/// Script the happy path shared by the end-to-end scenarios: preventive
/// backup, site stop/start confirmation and content replacement all succeed.
pub fn script_happy_tail(shell: &ScriptedShell) {
    shell
        .on("mkdir -p /srv/backups/shop/pre_rollback_", ok(""))
        .on("cp -a /srv/www/shop/.", ok(""))
        .on("find /srv/backups/shop/pre_rollback_", ok("index.html\n"))
        .on("systemctl stop shop", ok(""))
        .on("systemctl is-active shop", ok("inactive"))
        .on("systemctl is-active shop", ok("active"))
        .on("systemctl start shop", ok(""))
        .on("test -d /srv/www/shop", ok(""))
        .on("-exec rm -rf", ok(""));
}
