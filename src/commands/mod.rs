//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the `cli-git`
//! command-line tool. Each subcommand is defined in its own file to keep the
//! logic separated and maintainable.
//!
//! ## Structure
//!
//! Each command module typically contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` plus the shared
//!   [`Context`] and performs the command's logic.
//!
//! Collaborators (settings, caches, the `gh` and `git` executables) are built
//! here and handed to the `cli_git` library explicitly.

pub mod cache;
pub mod complete;
pub mod completions;
pub mod init;
pub mod private_mirror;
pub mod update_mirrors;

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use cli_git::cache::CacheStore;
use cli_git::defaults;
use cli_git::mirror_cache::MirrorCache;
use cli_git::output::OutputConfig;
use cli_git::settings::Settings;

/// Options shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub config_dir: PathBuf,
    pub output: OutputConfig,
}

impl Context {
    pub fn load_settings(&self) -> Result<Settings> {
        Settings::load(&self.config_dir).with_context(|| {
            format!(
                "Failed to read {}",
                Settings::path(&self.config_dir).display()
            )
        })
    }

    pub fn mirror_cache(&self) -> MirrorCache {
        MirrorCache::new(CacheStore::on_disk(defaults::cache_dir(&self.config_dir)))
    }
}
