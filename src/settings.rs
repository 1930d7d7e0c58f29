//! # Settings
//!
//! User preferences stored as TOML in `<config_dir>/settings.toml`:
//!
//! ```toml
//! [github]
//! username = "octocat"
//! default_org = "acme"
//! slack_webhook_url = ""
//! github_token = ""
//!
//! [preferences]
//! default_schedule = "0 0 * * *"
//! default_prefix = "mirror-"
//! ```
//!
//! A missing file yields the defaults. The file may hold a token, so it is
//! written with owner-only permissions on Unix.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::defaults::{DEFAULT_PREFIX, DEFAULT_SCHEDULE};
use crate::error::Result;

/// File name of the settings document inside the configuration directory.
pub const SETTINGS_FILE: &str = "settings.toml";

/// Account and credential settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubSettings {
    pub username: String,
    pub default_org: String,
    pub slack_webhook_url: String,
    pub github_token: String,
}

/// Defaults applied when a command is not given explicit values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub default_schedule: String,
    pub default_prefix: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            default_schedule: DEFAULT_SCHEDULE.to_string(),
            default_prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub github: GithubSettings,
    pub preferences: Preferences,
}

impl Settings {
    /// Path of the settings file inside `config_dir`.
    pub fn path(config_dir: &Path) -> PathBuf {
        config_dir.join(SETTINGS_FILE)
    }

    /// Loads settings from `config_dir`, falling back to defaults when the
    /// file does not exist.
    pub fn load(config_dir: &Path) -> Result<Self> {
        let path = Self::path(config_dir);
        if !path.exists() {
            debug!("no settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(&path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Writes settings to `config_dir`, creating the directory if needed.
    ///
    /// The document goes to a temporary file that is owner-only before any
    /// byte is written, then renamed over the old file.
    pub fn save(&self, config_dir: &Path) -> Result<()> {
        fs::create_dir_all(config_dir)?;
        let path = Self::path(config_dir);
        let contents = toml::to_string_pretty(self)?;

        let mut file = NamedTempFile::new_in(config_dir)?;
        restrict_permissions(file.as_file())?;
        file.write_all(contents.as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(&path).map_err(|e| e.error)?;

        debug!("wrote settings to {}", path.display());
        Ok(())
    }

    /// The default organization, if one is configured.
    pub fn default_org(&self) -> Option<&str> {
        non_empty(&self.github.default_org)
    }

    /// The Slack webhook, if one is configured.
    pub fn slack_webhook_url(&self) -> Option<&str> {
        non_empty(&self.github.slack_webhook_url)
    }

    /// The access token registered as a sync job secret, if configured.
    pub fn github_token(&self) -> Option<&str> {
        non_empty(&self.github.github_token)
    }

    /// The configured username, if any.
    pub fn username(&self) -> Option<&str> {
        non_empty(&self.github.username)
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

#[cfg(unix)]
fn restrict_permissions(file: &fs::File) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_file: &fs::File) -> Result<()> {
    Ok(())
}
