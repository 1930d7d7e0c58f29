//! Local git operations used while provisioning a mirror.
//!
//! [`SystemGit`] runs the system `git` command, which automatically handles:
//! - SSH keys from ~/.ssh/
//! - Git credential helpers
//! - Personal access tokens
//! - Any authentication configured in ~/.gitconfig

use std::path::Path;
use std::process::{Command, Output};

use log::debug;

use crate::error::{Error, Result};

/// Identity used for commits when the user has none configured.
const FALLBACK_NAME: &str = "cli-git";
const FALLBACK_EMAIL: &str = "cli-git@users.noreply.github.com";

/// Git operations, behind a trait so provisioning can be tested without a
/// network or a real repository.
pub trait GitOperations: Send + Sync {
    /// Clones `url` with its full history into `target_dir`.
    fn clone_repository(&self, url: &str, target_dir: &Path) -> Result<()>;

    fn rename_remote(&self, repo: &Path, from: &str, to: &str) -> Result<()>;

    /// Drops the symbolic `<remote>/HEAD` ref so it is not pushed as a branch.
    fn remove_remote_head(&self, repo: &Path, remote: &str) -> Result<()>;

    fn add_remote(&self, repo: &Path, name: &str, url: &str) -> Result<()>;

    /// Stages every change and commits it. Returns `false` when there was
    /// nothing to commit.
    fn commit_all(&self, repo: &Path, message: &str) -> Result<bool>;

    fn push_refspecs(&self, repo: &Path, remote: &str, refspecs: &[String]) -> Result<()>;

    fn push_tags(&self, repo: &Path, remote: &str) -> Result<()>;

    /// Name of the checked-out branch.
    fn current_branch(&self, repo: &Path) -> Result<String>;
}

/// [`GitOperations`] backed by the `git` executable.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemGit;

impl SystemGit {
    fn output(repo: Option<&Path>, args: &[&str]) -> std::io::Result<Output> {
        debug!("running git {}", args.join(" "));
        let mut command = Command::new("git");
        if let Some(repo) = repo {
            command.current_dir(repo);
        }
        command.args(args).output()
    }

    /// Runs a local command, mapping failure to [`Error::GitCommand`].
    fn local(repo: &Path, args: &[&str]) -> Result<String> {
        let command = args.join(" ");
        let output = Self::output(Some(repo), args).map_err(|e| Error::GitCommand {
            command: command.clone(),
            stderr: e.to_string(),
        })?;
        if !output.status.success() {
            return Err(Error::GitCommand {
                command,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Runs a network command, mapping failure to [`Error::Transfer`].
    fn transfer(repo: Option<&Path>, verb: &str, url: &str, args: &[&str]) -> Result<()> {
        let output = Self::output(repo, args).map_err(|e| Error::Transfer {
            command: verb.to_string(),
            url: url.to_string(),
            stderr: e.to_string(),
        })?;
        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(Error::Transfer {
            command: verb.to_string(),
            url: url.to_string(),
            stderr: explain_transfer_failure(&stderr),
        })
    }
}

/// Adds guidance to common authentication failures.
fn explain_transfer_failure(stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.contains("Authentication failed")
        || stderr.contains("Permission denied")
        || stderr.contains("Could not read from remote repository")
    {
        format!(
            "Authentication failed. Make sure you have access to the repository.\n\
            Check that:\n\
            - 'gh auth status' shows an active session\n\
            - 'gh auth setup-git' has configured git credentials\n\
            - your SSH key is added to ssh-agent, for SSH URLs\n\
            Error: {}",
            stderr
        )
    } else {
        stderr.to_string()
    }
}

impl GitOperations for SystemGit {
    fn clone_repository(&self, url: &str, target_dir: &Path) -> Result<()> {
        let target = target_dir.to_string_lossy();
        Self::transfer(None, "clone", url, &["clone", url, target.as_ref()])
    }

    fn rename_remote(&self, repo: &Path, from: &str, to: &str) -> Result<()> {
        Self::local(repo, &["remote", "rename", from, to]).map(|_| ())
    }

    fn remove_remote_head(&self, repo: &Path, remote: &str) -> Result<()> {
        Self::local(repo, &["remote", "set-head", remote, "--delete"]).map(|_| ())
    }

    fn add_remote(&self, repo: &Path, name: &str, url: &str) -> Result<()> {
        Self::local(repo, &["remote", "add", name, url]).map(|_| ())
    }

    fn commit_all(&self, repo: &Path, message: &str) -> Result<bool> {
        Self::local(repo, &["add", "-A"])?;
        if Self::local(repo, &["status", "--porcelain"])?.trim().is_empty() {
            return Ok(false);
        }

        let has_identity = Self::local(repo, &["config", "--get", "user.email"]).is_ok();
        let name = format!("user.name={}", FALLBACK_NAME);
        let email = format!("user.email={}", FALLBACK_EMAIL);
        let mut args: Vec<&str> = Vec::new();
        if !has_identity {
            args.extend(["-c", name.as_str(), "-c", email.as_str()]);
        }
        args.extend(["commit", "-m", message]);
        Self::local(repo, &args)?;
        Ok(true)
    }

    fn push_refspecs(&self, repo: &Path, remote: &str, refspecs: &[String]) -> Result<()> {
        let mut args = vec!["push", remote];
        args.extend(refspecs.iter().map(String::as_str));
        Self::transfer(Some(repo), "push", remote, &args)
    }

    fn push_tags(&self, repo: &Path, remote: &str) -> Result<()> {
        Self::transfer(Some(repo), "push", remote, &["push", remote, "--tags"])
    }

    fn current_branch(&self, repo: &Path) -> Result<String> {
        let branch = Self::local(repo, &["rev-parse", "--abbrev-ref", "HEAD"])?;
        Ok(branch.trim().to_string())
    }
}
