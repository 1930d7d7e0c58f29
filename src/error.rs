//! # Error Handling
//!
//! This module defines the centralized error type for the `cli-git` library.
//! It uses `thiserror` to build a single `Error` enum whose variants follow
//! the failure classes of the mirror lifecycle:
//!
//! - **`Auth`**: the hosting CLI is not authenticated or lacks scope. Fatal;
//!   the user has to re-authenticate outside of this tool.
//! - **`Validation`**: a malformed URL, name, prefix, schedule or webhook.
//!   The message names the offending field and the expected shape.
//! - **`Conflict`**: the destination repository name is already taken.
//! - **`Transfer`**: a clone, fetch or push failed. Retryable by re-running
//!   the command; nothing is retried automatically.
//! - **`NotFound`**: a remote file or repository is absent. Callers use
//!   [`Error::is_not_found`] to treat this as a normal negative answer.
//! - **`Hosting`**: any other failure reported by the hosting service CLI.
//! - **`PartialMirror`**: provisioning failed after the destination
//!   repository had been created. Carries the steps that completed so the
//!   user can finish or clean up by hand.
//!
//! Malformed cache data never appears here: the cache layer absorbs it and
//! reports a miss instead.
//!
//! The `Result` alias is used across the library to keep signatures short.

use thiserror::Error;

/// Main error type for cli-git operations
#[derive(Error, Debug)]
pub enum Error {
    /// The hosting CLI is not authenticated or the token lacks a scope.
    #[error("Authentication error: {message}\n  hint: run 'gh auth login' and try again")]
    Auth { message: String },

    /// An input failed validation before any mutating action ran.
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// The destination repository already exists.
    #[error("Repository '{name}' already exists{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Conflict {
        name: String,
        /// Optional hint naming an alternative
        hint: Option<String>,
    },

    /// A git transfer (clone, fetch, push) failed.
    #[error("Git {command} failed for {url}: {stderr}")]
    Transfer {
        command: String,
        url: String,
        stderr: String,
    },

    /// A local git command failed.
    #[error("Git command failed: {command} - {stderr}")]
    GitCommand { command: String, stderr: String },

    /// A remote resource does not exist.
    #[error("Not found: {what}")]
    NotFound { what: String },

    /// The hosting service CLI reported an error.
    #[error("GitHub CLI command failed: {command} - {stderr}")]
    Hosting { command: String, stderr: String },

    /// A cache operation could not be completed.
    #[error("Cache operation error: {message}")]
    Cache { message: String },

    /// Provisioning failed after the destination repository was created.
    #[error(
        "Mirror {repository} is only partially configured: {failed_step} failed: {source}\n  \
         completed steps: {}\n  \
         note: the repository was left in place; finish the setup by hand or delete it",
        completed.join(", ")
    )]
    PartialMirror {
        repository: String,
        completed: Vec<String>,
        failed_step: String,
        #[source]
        source: Box<Error>,
    },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A TOML parsing error, wrapped from `toml::de::Error`.
    #[error("Settings parsing error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// A TOML serialization error, wrapped from `toml::ser::Error`.
    #[error("Settings serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// Remote file content was not valid base64.
    #[error("Base64 decoding error: {0}")]
    Base64(#[from] base64::DecodeError),
}

impl Error {
    /// Build a validation error for `field`.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether this error only signals that something is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
