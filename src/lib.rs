//! # cli-git Library
//!
//! Core of the `cli-git` command-line tool, which creates private mirrors of
//! public GitHub repositories and keeps them in sync on a schedule.
//!
//! ## Quick Example
//!
//! ```
//! use cli_git::workflow::{generate_sync_workflow, SyncJobSpec};
//!
//! let spec = SyncJobSpec::new("https://github.com/rust-lang/log", "0 0 * * *", "master").unwrap();
//! let workflow = generate_sync_workflow(&spec);
//! assert!(workflow.contains("cron: '0 0 * * *'"));
//! assert!(workflow.contains("${{ secrets.UPSTREAM_URL }}"));
//! ```
//!
//! ## Core Concepts
//!
//! - **Provisioning (`provision`)**: clone, sanitize, create, push and wire up
//!   a new mirror in one linear run.
//! - **Sync workflow (`workflow`)**: the GitHub Actions job committed to every
//!   mirror. Its presence at [`defaults::MIRROR_MARKER_PATH`] is what marks a
//!   repository as a mirror.
//! - **Registry updates (`registry`)**: regenerate the workflow and secrets of
//!   existing mirrors, writing only when something changed.
//! - **Completion (`completion`, `directory`)**: suggest mirror names for shell
//!   completion from the caches first and the GitHub API last.
//! - **Caches (`cache`, `mirror_cache`)**: small JSON documents with TTL or
//!   FIFO policies under `~/.cli-git/cache`.
//! - **Collaborators (`hosting`, `git`)**: traits over the `gh` and `git`
//!   executables, so everything above can be tested with scripted fakes.

pub mod cache;
pub mod completion;
pub mod defaults;
pub mod directory;
pub mod error;
pub mod git;
pub mod hosting;
pub mod mirror_cache;
pub mod model;
pub mod output;
pub mod provision;
pub mod registry;
pub mod repo_url;
pub mod settings;
pub mod suggestions;
pub mod validators;
pub mod workflow;
