//! Shell command construction utilities.

use crate::Result;

/// Quote a string for safe interpolation into a POSIX shell command line.
///
/// Wraps the value in single quotes and escapes embedded single quotes
/// with the `'\''` idiom.
pub fn quote(value: &str) -> String {
    if !value.is_empty() && value.chars().all(is_shell_safe) {
        return value.to_string();
    }
    format!("'{}'", value.replace('\'', r"'\''"))
}

fn is_shell_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '_' | '-' | '@' | ':' | '+' | ',')
}

/// Validate a site name before it is used as a systemd unit name.
///
/// Unit names are restricted to a conservative character set so a name can
/// never smuggle shell metacharacters into a remote command line.
pub fn validate_site_name(name: &str) -> Result<()> {
    use std::sync::OnceLock;
    static SITE_NAME: OnceLock<regex::Regex> = OnceLock::new();

    let re = SITE_NAME.get_or_init(|| {
        regex::Regex::new(r"^[A-Za-z0-9][A-Za-z0-9@._-]*$").expect("valid regex")
    });

    if name.is_empty() || name.len() > 255 || !re.is_match(name) {
        return Err(crate::Error::InvalidSiteName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_plain() {
        assert_eq!(quote("/srv/www/site"), "/srv/www/site");
        assert_eq!(quote("backup-2024_01.zip"), "backup-2024_01.zip");
    }

    #[test]
    fn test_quote_spaces_and_metachars() {
        assert_eq!(quote("/srv/my site"), "'/srv/my site'");
        assert_eq!(quote("a;rm -rf x"), "'a;rm -rf x'");
        assert_eq!(quote(""), "''");
    }

    #[test]
    fn test_quote_single_quote() {
        assert_eq!(quote("it's"), r"'it'\''s'");
    }

    #[test]
    fn test_validate_site_name() {
        assert!(validate_site_name("my-site").is_ok());
        assert!(validate_site_name("site@prod.example").is_ok());
        assert!(validate_site_name("").is_err());
        assert!(validate_site_name("site name").is_err());
        assert!(validate_site_name("site;rm").is_err());
        assert!(validate_site_name("-leading-dash").is_err());
    }
}
