//! Deployment configuration validation.
//!
//! `lapin check-env` runs every check and reports the whole list at once --
//! deployment tooling wants the complete picture, not the first failure.
//! Only required-value problems fail the check; warnings are advisory.

use std::collections::BTreeMap;
use std::path::PathBuf;

use lapin_shared::constants::DATA_KEY_HEX_LEN;
use lapin_shared::crypto;
use lapin_shared::CryptoError;
use thiserror::Error;

/// Values the deployment cannot start without.
pub const REQUIRED_VARS: [&str; 4] = [
    "STORAGE_URL",
    "STORAGE_ANON_KEY",
    "STORAGE_SERVICE_KEY",
    "ENCRYPTION_KEY",
];

/// Values that unlock optional features (email delivery, bot challenge).
pub const OPTIONAL_VARS: [&str; 6] = [
    "APP_URL",
    "APP_NAME",
    "EMAIL_API_KEY",
    "EMAIL_FROM_ADDRESS",
    "CAPTCHA_SITE_KEY",
    "CAPTCHA_SECRET_KEY",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {} (copy .env.example to get started)", .0.display())]
    ConfigurationMissing(PathBuf),

    #[error("configuration invalid: {0} required value(s) failed validation")]
    ConfigurationInvalid(usize),
}

/// A failing required-value check.
#[derive(Debug, PartialEq, Eq)]
pub enum Problem {
    /// Absent, empty, or still a placeholder from `.env.example`.
    Missing(&'static str),
    /// `STORAGE_URL` is not an `https://` URL with a host.
    InvalidUrl { var: &'static str, value: String },
    /// `ENCRYPTION_KEY` shorter than 64 hex characters.
    KeyTooShort { len: usize },
    /// `ENCRYPTION_KEY` present with 64+ characters but not a valid key.
    KeyInvalid,
}

/// An advisory finding that never fails the check.
#[derive(Debug, PartialEq, Eq)]
pub enum Warning {
    OptionalUnset(&'static str),
    /// `.gitignore` does not appear to keep the config file out of VCS.
    GitignoreUnprotected,
}

#[derive(Debug, Default)]
pub struct Report {
    pub ok: Vec<&'static str>,
    pub problems: Vec<Problem>,
    pub warnings: Vec<Warning>,
}

impl Report {
    pub fn passed(&self) -> bool {
        self.problems.is_empty()
    }

    /// Human-readable rendering, one line per finding.
    pub fn render(&self) -> String {
        let mut out = String::new();

        out.push_str("Required values:\n");
        for var in &self.ok {
            out.push_str(&format!("  ok    {var}\n"));
        }
        for problem in &self.problems {
            let line = match problem {
                Problem::Missing(var) => {
                    format!("  FAIL  {var}: missing, empty, or placeholder")
                }
                Problem::InvalidUrl { var, value } => {
                    format!("  FAIL  {var}: not an https:// URL ({value})")
                }
                Problem::KeyTooShort { len } => format!(
                    "  FAIL  ENCRYPTION_KEY: too short ({len} chars, need {DATA_KEY_HEX_LEN} hex chars)"
                ),
                Problem::KeyInvalid => {
                    "  FAIL  ENCRYPTION_KEY: not a 64-hex-character key".to_string()
                }
            };
            out.push_str(&line);
            out.push('\n');
        }

        out.push_str("Warnings:\n");
        if self.warnings.is_empty() {
            out.push_str("  none\n");
        }
        for warning in &self.warnings {
            let line = match warning {
                Warning::OptionalUnset(var) => format!("  warn  {var}: not set (optional)"),
                Warning::GitignoreUnprotected => {
                    "  warn  config file may not be protected by .gitignore".to_string()
                }
            };
            out.push_str(&line);
            out.push('\n');
        }

        out.push_str(&format!(
            "\n{} with {} warning(s)\n",
            if self.passed() { "PASSED" } else { "FAILED" },
            self.warnings.len(),
        ));
        out
    }
}

/// Run every check against the parsed config file.
///
/// `gitignore` is the content of the repository's `.gitignore`, if one
/// exists; a missing file counts as unprotected.
pub fn check(vars: &BTreeMap<String, String>, gitignore: Option<&str>) -> Report {
    let mut report = Report::default();

    for var in REQUIRED_VARS {
        let value = match present_value(vars, var) {
            Some(value) => value,
            None => {
                report.problems.push(Problem::Missing(var));
                continue;
            }
        };

        match var {
            "STORAGE_URL" if !valid_storage_url(value) => {
                report.problems.push(Problem::InvalidUrl {
                    var,
                    value: value.to_string(),
                });
            }
            "ENCRYPTION_KEY" => match crypto::parse_key_hex(value) {
                Ok(_) => report.ok.push(var),
                Err(CryptoError::InvalidKeyLength { got, .. }) if got < DATA_KEY_HEX_LEN => {
                    report.problems.push(Problem::KeyTooShort { len: got });
                }
                Err(_) => report.problems.push(Problem::KeyInvalid),
            },
            _ => report.ok.push(var),
        }
    }

    for var in OPTIONAL_VARS {
        if present_value(vars, var).is_none() {
            report.warnings.push(Warning::OptionalUnset(var));
        }
    }

    let protected = gitignore
        .map(|content| content.contains(".env"))
        .unwrap_or(false);
    if !protected {
        report.warnings.push(Warning::GitignoreUnprotected);
    }

    report
}

/// A value that is set, non-empty, and not an `.env.example` placeholder.
fn present_value<'a>(vars: &'a BTreeMap<String, String>, var: &str) -> Option<&'a str> {
    let value = vars.get(var)?.as_str();
    if value.is_empty() || value.contains("your-") || value.contains("YOUR_") {
        return None;
    }
    Some(value)
}

fn valid_storage_url(value: &str) -> bool {
    match value.strip_prefix("https://") {
        Some(rest) => {
            let host = rest.split('/').next().unwrap_or("");
            !host.is_empty()
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_vars() -> BTreeMap<String, String> {
        let key = "ab".repeat(32);
        [
            ("STORAGE_URL", "https://db.lapin.example.com"),
            ("STORAGE_ANON_KEY", "anon-key-1234567890"),
            ("STORAGE_SERVICE_KEY", "service-key-1234567890"),
            ("ENCRYPTION_KEY", key.as_str()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn all_required_no_optional_passes_with_six_warnings() {
        let report = check(&valid_vars(), Some(".env\ntarget/\n"));

        assert!(report.passed());
        assert_eq!(report.ok.len(), REQUIRED_VARS.len());
        assert_eq!(report.warnings.len(), OPTIONAL_VARS.len());
        assert!(report
            .warnings
            .iter()
            .all(|w| matches!(w, Warning::OptionalUnset(_))));
    }

    #[test]
    fn short_encryption_key_reported_as_too_short() {
        let mut vars = valid_vars();
        vars.insert("ENCRYPTION_KEY".into(), "a".repeat(20));

        let report = check(&vars, Some(".env\n"));

        assert!(!report.passed());
        assert!(report.problems.contains(&Problem::KeyTooShort { len: 20 }));
        assert!(report.render().contains("too short"));
    }

    #[test]
    fn non_hex_key_reported_as_invalid() {
        let mut vars = valid_vars();
        vars.insert("ENCRYPTION_KEY".into(), "zz".repeat(32));

        let report = check(&vars, Some(".env\n"));
        assert!(report.problems.contains(&Problem::KeyInvalid));
    }

    #[test]
    fn missing_and_placeholder_values_flagged() {
        let mut vars = valid_vars();
        vars.remove("STORAGE_ANON_KEY");
        vars.insert("STORAGE_SERVICE_KEY".into(), "your-service-key".into());

        let report = check(&vars, Some(".env\n"));

        assert!(report.problems.contains(&Problem::Missing("STORAGE_ANON_KEY")));
        assert!(report
            .problems
            .contains(&Problem::Missing("STORAGE_SERVICE_KEY")));
    }

    #[test]
    fn http_url_rejected() {
        let mut vars = valid_vars();
        vars.insert("STORAGE_URL".into(), "http://insecure.example.com".into());

        let report = check(&vars, Some(".env\n"));
        assert!(matches!(
            report.problems.as_slice(),
            [Problem::InvalidUrl { var: "STORAGE_URL", .. }]
        ));
    }

    #[test]
    fn bare_scheme_rejected() {
        assert!(!valid_storage_url("https://"));
        assert!(!valid_storage_url("https:///path"));
        assert!(valid_storage_url("https://host.example.com/base"));
    }

    #[test]
    fn optional_values_set_do_not_warn() {
        let mut vars = valid_vars();
        for var in OPTIONAL_VARS {
            vars.insert(var.to_string(), "configured".into());
        }

        let report = check(&vars, Some(".env\n"));
        assert!(report.passed());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn unprotected_gitignore_warns_but_passes() {
        let report = check(&valid_vars(), None);

        assert!(report.passed());
        assert!(report.warnings.contains(&Warning::GitignoreUnprotected));

        let report = check(&valid_vars(), Some("target/\n"));
        assert!(report.warnings.contains(&Warning::GitignoreUnprotected));
    }
}
