//! Shared test utilities for the CLI end-to-end tests.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_settings(settings::WITH_ORG);
//!     fixture.command().args(["cache", "list"]).assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::{now_secs, settings, TestFixture};
}

/// settings.toml documents used across tests.
#[allow(dead_code)]
pub mod settings {
    pub const WITH_ORG: &str = r#"
[github]
username = "me"
default_org = "acme"
slack_webhook_url = ""
github_token = ""

[preferences]
default_schedule = "0 0 * * *"
default_prefix = "mirror-"
"#;

    pub const CUSTOM_PREFIX: &str = r#"
[github]
username = "me"

[preferences]
default_prefix = "fork-"
"#;

    pub const MALFORMED: &str = "[github\nusername = ";
}

/// Current Unix time in seconds, for writing fresh cache documents.
#[allow(dead_code)]
pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock after epoch")
        .as_secs()
}

/// A temporary configuration directory plus an empty `PATH` directory.
///
/// Commands run through [`TestFixture::command`] see neither the user's
/// real settings nor a `gh` executable, so nothing reaches GitHub.
pub struct TestFixture {
    config_dir: assert_fs::TempDir,
    empty_path: assert_fs::TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    pub fn new() -> Self {
        Self {
            config_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
            empty_path: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Writes `settings.toml`.
    pub fn with_settings(self, content: &str) -> Self {
        self.config_dir
            .child("settings.toml")
            .write_str(content)
            .expect("Failed to write settings");
        self
    }

    /// Writes `cache/<key>.json`.
    pub fn with_cache(self, key: &str, content: &str) -> Self {
        self.config_dir
            .child("cache")
            .child(format!("{}.json", key))
            .write_str(content)
            .expect("Failed to write cache file");
        self
    }

    pub fn path(&self) -> &Path {
        self.config_dir.path()
    }

    pub fn cache_file(&self, key: &str) -> std::path::PathBuf {
        self.config_dir.path().join("cache").join(format!("{}.json", key))
    }

    /// The `cli-git` binary pointed at this fixture, with colors off.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("cli-git");
        cmd.env("CLI_GIT_HOME", self.config_dir.path())
            .env("PATH", self.empty_path.path())
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG")
            .env_remove("CLI_GIT_GITHUB_TOKEN");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
