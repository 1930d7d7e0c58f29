//! Default values for cli-git configuration.
//!
//! This module provides centralized default values used across commands,
//! ensuring consistency and avoiding duplication.

use std::path::PathBuf;

/// Sync schedule used when neither the user nor the settings file gives one.
pub const DEFAULT_SCHEDULE: &str = "0 0 * * *";

/// Name prefix for mirrors when no explicit name or prefix is given.
pub const DEFAULT_PREFIX: &str = "mirror-";

/// Path whose presence marks a repository as a managed mirror.
pub const MIRROR_MARKER_PATH: &str = ".github/workflows/mirror-sync.yml";

/// Directory holding upstream CI configuration, removed from new mirrors.
pub const CI_CONFIG_DIR: &str = ".github";

/// Maximum age of the scanned mirrors cache, in seconds.
pub const SCANNED_MIRRORS_TTL: u64 = 1800;

/// Maximum age of the repository completion cache, in seconds.
pub const REPO_COMPLETION_TTL: u64 = 600;

/// Number of entries kept in the recent mirrors list.
pub const RECENT_MIRRORS_LIMIT: usize = 10;

/// Maximum number of suggestions returned for one completion request.
pub const SUGGESTION_LIMIT: usize = 20;

/// Repositories listed per owner during a live lookup.
pub const REPO_LIST_LIMIT: usize = 100;

/// Returns the default configuration directory.
///
/// Uses `~/.cli-git`, falling back to `.cli-git` in the current directory if
/// the home directory cannot be determined.
///
/// This can be overridden by the `--config-dir` CLI flag or the
/// `CLI_GIT_HOME` environment variable.
pub fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".cli-git"))
        .unwrap_or_else(|| PathBuf::from(".cli-git"))
}

/// Returns the cache directory inside a configuration directory.
pub fn cache_dir(config_dir: &std::path::Path) -> PathBuf {
    config_dir.join("cache")
}
