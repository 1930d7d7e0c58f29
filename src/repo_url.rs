//! GitHub repository URL parsing.
//!
//! Accepts the three shapes users paste in practice:
//!
//! - `https://github.com/owner/repo` (optionally with `.git` or a trailing `/`)
//! - `git@github.com:owner/repo.git`
//! - `github.com/owner/repo`

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use url::Url;

/// Host serving the repositories this tool manages.
pub const GITHUB_HOST: &str = "github.com";

/// An `owner/name` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoSlug {
    pub owner: String,
    pub name: String,
}

impl RepoSlug {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Splits `owner/name`; anything else is `None`.
    pub fn from_full_name(full_name: &str) -> Option<Self> {
        let (owner, name) = full_name.split_once('/')?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some(Self::new(owner, name))
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

fn ssh_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^git@github\.com:([\w.-]+)/([\w.-]+?)(?:\.git)?/?$").expect("valid regex")
    })
}

/// Parses a GitHub repository URL into its owner and name.
pub fn parse(url: &str) -> Option<RepoSlug> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }

    if let Some(caps) = ssh_pattern().captures(url) {
        return Some(RepoSlug::new(&caps[1], &caps[2]));
    }

    let with_scheme = if url.starts_with("github.com/") {
        format!("https://{}", url)
    } else {
        url.to_string()
    };

    let parsed = Url::parse(&with_scheme).ok()?;
    if !matches!(parsed.scheme(), "https" | "http") || parsed.host_str() != Some(GITHUB_HOST) {
        return None;
    }

    let mut segments = parsed.path_segments()?.filter(|s| !s.is_empty());
    let owner = segments.next()?;
    let name = segments.next()?;
    if segments.next().is_some() {
        return None;
    }
    let name = name.strip_suffix(".git").unwrap_or(name);
    if name.is_empty() {
        return None;
    }
    Some(RepoSlug::new(owner, name))
}

/// Short `owner/name` form of `url`, or the URL itself if it does not parse.
pub fn short_name(url: &str) -> String {
    parse(url)
        .map(|slug| slug.full_name())
        .unwrap_or_else(|| url.to_string())
}

/// HTTPS URL for an `owner/name`.
pub fn https_url(full_name: &str) -> String {
    format!("https://{}/{}", GITHUB_HOST, full_name)
}
