//! Rollback request model.

use crate::utils::shell::validate_site_name;
use crate::Result;
use serde::{Deserialize, Serialize};

/// Immutable input to a single rollback run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackRequest {
    /// Name of the site (systemd unit name on the remote host).
    pub site_name: String,
    /// Absolute path of the live site content on the remote host.
    pub site_path: String,
    /// Path holding the rollback source (archive or directory).
    pub backup_path: String,
    /// Root under which temporary staging directories are created.
    pub temp_root: String,
    /// Root under which preventive backups are stored.
    pub backup_root: String,
}

impl RollbackRequest {
    /// Validate the request before a run starts.
    ///
    /// Existence of `backup_path` on the remote host is checked later by the
    /// locator; this only rejects requests that are malformed on their face.
    pub fn validate(&self) -> Result<()> {
        validate_site_name(&self.site_name)?;

        for (field, value) in [
            ("site_path", &self.site_path),
            ("backup_path", &self.backup_path),
            ("temp_root", &self.temp_root),
            ("backup_root", &self.backup_root),
        ] {
            if value.trim().is_empty() {
                return Err(crate::Error::Precondition(format!(
                    "{} must not be empty",
                    field
                )));
            }
        }
        Ok(())
    }

    /// Key identifying the target of this run for run exclusion.
    pub fn target_key(&self) -> String {
        format!("{}|{}", self.site_name, self.site_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RollbackRequest {
        RollbackRequest {
            site_name: "shop".to_string(),
            site_path: "/srv/www/shop".to_string(),
            backup_path: "/srv/backups/shop/release-42".to_string(),
            temp_root: "/srv/tmp".to_string(),
            backup_root: "/srv/backups/shop".to_string(),
        }
    }

    #[test]
    fn test_validate_ok() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_paths() {
        let mut req = request();
        req.site_path = "  ".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_site_name() {
        let mut req = request();
        req.site_name = "shop; reboot".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_target_key() {
        assert_eq!(request().target_key(), "shop|/srv/www/shop");
    }
}
