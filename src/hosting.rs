//! # Hosting Service
//!
//! The narrow set of verbs this tool needs from the repository hosting
//! service, behind the [`HostingService`] trait so the mirror logic can run
//! against a scripted fake in tests.
//!
//! [`GhCli`] is the production implementation. It shells out to the GitHub
//! CLI (`gh`), which brings its own authentication, so this crate never
//! handles OAuth flows or stores session tokens itself. Secret values and
//! file bodies are fed through stdin and never appear in argv.

use std::io::Write;
use std::process::{Command, Stdio};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::debug;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::model::RepoListing;

/// Repository visibility at creation time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Visibility {
    #[default]
    Private,
    Internal,
    Public,
}

impl Visibility {
    fn flag(self) -> &'static str {
        match self {
            Visibility::Private => "--private",
            Visibility::Internal => "--internal",
            Visibility::Public => "--public",
        }
    }
}

/// Parameters for creating a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRepository {
    pub name: String,
    /// Owning organization; `None` creates under the authenticated user.
    pub org: Option<String>,
    pub visibility: Visibility,
    pub description: String,
}

impl CreateRepository {
    /// `org/name`, or just `name` for the user account.
    pub fn qualified_name(&self) -> String {
        match &self.org {
            Some(org) => format!("{}/{}", org, self.name),
            None => self.name.clone(),
        }
    }
}

/// A file read from a repository's default branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub path: String,
    /// Blob SHA, needed to update the file in place.
    pub sha: String,
    pub content: String,
}

/// Operations performed against the hosting service.
pub trait HostingService: Send + Sync {
    /// Whether the CLI has a usable session.
    fn is_authenticated(&self) -> bool;

    /// Login of the authenticated account.
    fn current_user(&self) -> Result<String>;

    /// Organizations the authenticated account belongs to.
    fn list_organizations(&self) -> Result<Vec<String>>;

    /// Repositories owned by `owner`, at most `limit`.
    fn list_repositories(&self, owner: &str, limit: usize) -> Result<Vec<RepoListing>>;

    /// Creates a repository and returns its URL.
    ///
    /// Fails with [`Error::Conflict`] if the name is taken.
    fn create_repository(&self, request: &CreateRepository) -> Result<String>;

    /// Reads a file from the default branch. A missing file is `Ok(None)`.
    fn get_file(&self, repo: &str, path: &str) -> Result<Option<RemoteFile>>;

    /// Creates or replaces a file on the default branch. `sha` must be the
    /// current blob SHA when replacing.
    fn put_file(
        &self,
        repo: &str,
        path: &str,
        content: &str,
        sha: Option<&str>,
        message: &str,
    ) -> Result<()>;

    /// Stores a write-only repository secret.
    fn set_secret(&self, repo: &str, key: &str, value: &str) -> Result<()>;

    /// Name of the repository's default branch.
    fn default_branch(&self, repo: &str) -> Result<String>;

    /// Whether `token` authenticates against the API.
    fn token_is_valid(&self, token: &str) -> bool;
}

/// [`HostingService`] backed by the `gh` command line tool.
#[derive(Debug, Clone)]
pub struct GhCli {
    program: String,
}

impl Default for GhCli {
    fn default() -> Self {
        Self {
            program: "gh".to_string(),
        }
    }
}

#[derive(Deserialize)]
struct ContentsResponse {
    path: String,
    sha: String,
    #[serde(default)]
    content: String,
}

impl GhCli {
    pub fn new() -> Self {
        Self::default()
    }

    fn run(&self, args: &[&str], stdin: Option<&str>) -> Result<String> {
        let command = args.join(" ");
        debug!("running {} {}", self.program, command);

        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Hosting {
                command: command.clone(),
                stderr: format!("could not run '{}' ({}); is the GitHub CLI installed?", self.program, e),
            })?;

        if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
            pipe.write_all(input.as_bytes())?;
        }

        let output = child.wait_with_output()?;
        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        Err(classify_failure(command, stderr))
    }
}

/// Maps `gh` diagnostics onto the error taxonomy.
fn classify_failure(command: String, stderr: String) -> Error {
    if stderr.contains("HTTP 404") || stderr.contains("Not Found") {
        Error::NotFound { what: command }
    } else if stderr.contains("HTTP 401")
        || stderr.contains("gh auth login")
        || stderr.contains("not logged in")
    {
        Error::Auth { message: stderr }
    } else {
        Error::Hosting { command, stderr }
    }
}

impl HostingService for GhCli {
    fn is_authenticated(&self) -> bool {
        self.run(&["auth", "status"], None).is_ok()
    }

    fn current_user(&self) -> Result<String> {
        Ok(self.run(&["api", "user", "-q", ".login"], None)?.trim().to_string())
    }

    fn list_organizations(&self) -> Result<Vec<String>> {
        let output = self.run(&["api", "user/orgs", "-q", ".[].login"], None)?;
        Ok(output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect())
    }

    fn list_repositories(&self, owner: &str, limit: usize) -> Result<Vec<RepoListing>> {
        let limit = limit.to_string();
        let output = self.run(
            &[
                "repo",
                "list",
                owner,
                "--limit",
                limit.as_str(),
                "--json",
                "nameWithOwner,description,isArchived,isPrivate,updatedAt",
            ],
            None,
        )?;
        Ok(serde_json::from_str(&output)?)
    }

    fn create_repository(&self, request: &CreateRepository) -> Result<String> {
        let name = request.qualified_name();
        let mut args = vec!["repo", "create", name.as_str(), request.visibility.flag()];
        if !request.description.is_empty() {
            args.extend(["--description", request.description.as_str()]);
        }
        match self.run(&args, None) {
            Ok(output) => Ok(output.trim().to_string()),
            Err(Error::Hosting { stderr, .. })
                if stderr.contains("already exists") || stderr.contains("Validation Failed") =>
            {
                Err(Error::Conflict { name, hint: None })
            }
            Err(e) => Err(e),
        }
    }

    fn get_file(&self, repo: &str, path: &str) -> Result<Option<RemoteFile>> {
        let endpoint = format!("repos/{}/contents/{}", repo, path);
        let output = match self.run(&["api", &endpoint], None) {
            Ok(output) => output,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };
        let response: ContentsResponse = serde_json::from_str(&output)?;
        let encoded: String = response
            .content
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let decoded = STANDARD.decode(encoded)?;
        Ok(Some(RemoteFile {
            path: response.path,
            sha: response.sha,
            content: String::from_utf8_lossy(&decoded).into_owned(),
        }))
    }

    fn put_file(
        &self,
        repo: &str,
        path: &str,
        content: &str,
        sha: Option<&str>,
        message: &str,
    ) -> Result<()> {
        let endpoint = format!("repos/{}/contents/{}", repo, path);
        let mut body = serde_json::json!({
            "message": message,
            "content": STANDARD.encode(content),
        });
        if let Some(sha) = sha {
            body["sha"] = serde_json::Value::String(sha.to_string());
        }
        self.run(
            &["api", "-X", "PUT", &endpoint, "--input", "-"],
            Some(&body.to_string()),
        )?;
        Ok(())
    }

    fn set_secret(&self, repo: &str, key: &str, value: &str) -> Result<()> {
        self.run(&["secret", "set", key, "--repo", repo], Some(value))
            .map(|_| ())
    }

    fn default_branch(&self, repo: &str) -> Result<String> {
        let endpoint = format!("repos/{}", repo);
        let branch = self.run(&["api", &endpoint, "-q", ".default_branch"], None)?;
        Ok(branch.trim().to_string())
    }

    fn token_is_valid(&self, token: &str) -> bool {
        if token.is_empty() {
            return false;
        }
        let header = format!("Authorization: token {}", token);
        self.run(&["api", "user", "-H", &header], None).is_ok()
    }
}
