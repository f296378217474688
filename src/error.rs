//! Error types for the rollback engine.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the rollback engine.
#[derive(Error, Debug)]
pub enum Error {
    // Transport errors
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Command timed out after {timeout_secs}s: {command}")]
    CommandTimeout { command: String, timeout_secs: u64 },

    // Precondition errors
    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Invalid site name: {0}")]
    InvalidSiteName(String),

    #[error("Rollback already running for target: {0}")]
    AlreadyRunning(String),

    // Step errors
    #[error("Preventive backup failed: {0}")]
    Backup(String),

    #[error("Staging failed: {0}")]
    Stage(String),

    #[error("Site control failed: {0}")]
    SiteControl(String),

    #[error("Content copy failed: {0}")]
    Copy(String),

    #[error("Destination unavailable: {0}")]
    DestinationUnavailable(String),

    // Report errors
    #[error("Invalid report file: {0}")]
    InvalidReportFile(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // HTTP errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a generic error from a string.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Whether this error means the replacement destination itself is gone,
    /// in which case starting the site would serve nothing.
    pub fn is_destination_unavailable(&self) -> bool {
        matches!(self, Error::DestinationUnavailable(_))
    }
}
