//! # Mirror Registry Updater
//!
//! Brings the sync workflow and secrets of existing mirrors up to date.
//!
//! Which mirrors to visit is decided in this order:
//!
//! 1. an explicit `owner/name`
//! 2. the scanned mirrors cache
//! 3. the recent mirrors cache
//! 4. a live scan of the user's and default organization's repositories,
//!    which also refreshes the scanned mirrors cache
//!
//! Each mirror is handled on its own: a mirror without the workflow file is
//! skipped, a failing one is recorded and the run moves on. The workflow is
//! only written when the regenerated text differs from the remote copy, so
//! a second run with nothing changed reports every mirror as unchanged.

use std::fmt;
use std::sync::OnceLock;

use log::{debug, info, warn};
use regex::Regex;

use crate::defaults::MIRROR_MARKER_PATH;
use crate::directory::RepositoryDirectory;
use crate::error::{Error, Result};
use crate::hosting::HostingService;
use crate::mirror_cache::MirrorCache;
use crate::model::ScannedMirror;
use crate::repo_url::{self, RepoSlug};
use crate::settings::Settings;
use crate::workflow::{
    generate_sync_workflow, SyncJobSpec, PLACEHOLDER_UPSTREAM, SECRET_GH_TOKEN,
    SECRET_SLACK_WEBHOOK_URL, SECRET_UPSTREAM_DEFAULT_BRANCH, SECRET_UPSTREAM_URL,
};

pub const UPDATE_COMMIT_MESSAGE: &str = "Update mirror sync workflow";

/// Branch assumed when a mirror's upstream is unknown or unreachable.
const FALLBACK_BRANCH: &str = "main";

/// Which mirrors to update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateTarget {
    /// A single repository, `owner/name` or a bare name under the user.
    Repo(String),
    /// Every known mirror.
    All,
}

/// Result for one mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    Unchanged,
    Skipped(String),
    Failed(String),
}

impl fmt::Display for UpdateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateOutcome::Updated => write!(f, "updated"),
            UpdateOutcome::Unchanged => write!(f, "unchanged"),
            UpdateOutcome::Skipped(reason) => write!(f, "skipped ({})", reason),
            UpdateOutcome::Failed(reason) => write!(f, "failed ({})", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorUpdate {
    pub full_name: String,
    pub outcome: UpdateOutcome,
}

/// Per-mirror results of one run, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    pub results: Vec<MirrorUpdate>,
}

impl UpdateSummary {
    fn count(&self, predicate: impl Fn(&UpdateOutcome) -> bool) -> usize {
        self.results.iter().filter(|r| predicate(&r.outcome)).count()
    }

    pub fn updated(&self) -> usize {
        self.count(|o| matches!(o, UpdateOutcome::Updated))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|o| matches!(o, UpdateOutcome::Unchanged))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, UpdateOutcome::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, UpdateOutcome::Failed(_)))
    }
}

/// A mirror selected for updating, with whatever is known about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownMirror {
    pub full_name: String,
    pub upstream: Option<String>,
    pub schedule: Option<String>,
}

pub struct RegistryUpdater<'a> {
    hosting: &'a dyn HostingService,
    cache: &'a MirrorCache,
    settings: &'a Settings,
    directory: RepositoryDirectory<'a>,
}

impl<'a> RegistryUpdater<'a> {
    pub fn new(
        hosting: &'a dyn HostingService,
        cache: &'a MirrorCache,
        settings: &'a Settings,
    ) -> Self {
        Self {
            hosting,
            cache,
            settings,
            directory: RepositoryDirectory::new(hosting),
        }
    }

    /// Updates every mirror selected by `target`.
    ///
    /// Only target resolution can fail; per-mirror failures end up in the
    /// summary.
    pub fn update(&self, target: &UpdateTarget) -> Result<UpdateSummary> {
        let mirrors = self.resolve_targets(target)?;
        info!("updating {} mirror(s)", mirrors.len());

        let mut summary = UpdateSummary::default();
        for mirror in mirrors {
            let outcome = match self.update_one(&mirror) {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("failed to update {}: {}", mirror.full_name, e);
                    UpdateOutcome::Failed(e.to_string())
                }
            };
            debug!("{}: {}", mirror.full_name, outcome);
            summary.results.push(MirrorUpdate {
                full_name: mirror.full_name,
                outcome,
            });
        }
        Ok(summary)
    }

    /// The mirrors `target` refers to.
    pub fn resolve_targets(&self, target: &UpdateTarget) -> Result<Vec<KnownMirror>> {
        if let UpdateTarget::Repo(name) = target {
            let full_name = if name.contains('/') {
                name.clone()
            } else {
                format!("{}/{}", self.hosting.current_user()?, name)
            };
            if RepoSlug::from_full_name(&full_name).is_none() {
                return Err(Error::validation(
                    "repository",
                    format!("'{}' (expected owner/name)", name),
                ));
            }
            return Ok(vec![self.describe(&full_name, None)]);
        }

        if let Some(scanned) = self.cache.scanned_mirrors().filter(|m| !m.is_empty()) {
            debug!("using {} scanned mirrors", scanned.len());
            return Ok(scanned
                .iter()
                .map(|m| self.describe(&m.name, Some(m.upstream.as_str())))
                .collect());
        }

        let recent = self.cache.recent_mirrors();
        if !recent.is_empty() {
            debug!("using {} recent mirrors", recent.len());
            let mut mirrors: Vec<KnownMirror> = Vec::new();
            for entry in &recent {
                if let Some(full_name) = entry.full_name() {
                    if !mirrors.iter().any(|m| m.full_name == full_name) {
                        mirrors.push(self.describe(&full_name, None));
                    }
                }
            }
            return Ok(mirrors);
        }

        Ok(self
            .scan_mirrors()?
            .iter()
            .map(|m| self.describe(&m.name, Some(m.upstream.as_str())))
            .collect())
    }

    /// Lists the mirrors owned by the user and the default organization and
    /// stores them in the scanned mirrors cache.
    pub fn scan_mirrors(&self) -> Result<Vec<ScannedMirror>> {
        let mut owners = vec![self.hosting.current_user()?];
        if let Some(org) = self.settings.default_org() {
            if !owners.iter().any(|o| o == org) {
                owners.push(org.to_string());
            }
        }

        let mut mirrors = Vec::new();
        for owner in &owners {
            for candidate in self.directory.list_repositories(owner)? {
                if candidate.is_mirror {
                    let mut scanned = candidate.to_scanned();
                    scanned.upstream = self.recent_upstream(&candidate.full_name).unwrap_or_default();
                    mirrors.push(scanned);
                }
            }
        }
        info!("scan found {} mirror(s)", mirrors.len());
        self.cache.save_scanned_mirrors(mirrors.clone())?;
        Ok(mirrors)
    }

    fn recent_upstream(&self, full_name: &str) -> Option<String> {
        self.cache
            .recent_mirrors()
            .into_iter()
            .find(|m| m.full_name().as_deref() == Some(full_name))
            .map(|m| m.upstream)
            .filter(|u| !u.is_empty())
    }

    /// Fills in the upstream and schedule from the recent mirrors cache.
    fn describe(&self, full_name: &str, upstream: Option<&str>) -> KnownMirror {
        let recent = self
            .cache
            .recent_mirrors()
            .into_iter()
            .find(|m| m.full_name().as_deref() == Some(full_name));
        let upstream = upstream
            .filter(|u| !u.is_empty())
            .map(str::to_string)
            .or_else(|| recent.as_ref().map(|m| m.upstream.clone()))
            .filter(|u| !u.is_empty());
        KnownMirror {
            full_name: full_name.to_string(),
            upstream,
            schedule: recent.and_then(|m| m.schedule),
        }
    }

    fn update_one(&self, mirror: &KnownMirror) -> Result<UpdateOutcome> {
        let remote = match self.hosting.get_file(&mirror.full_name, MIRROR_MARKER_PATH) {
            Ok(Some(file)) => file,
            Ok(None) => return Ok(UpdateOutcome::Skipped("no sync workflow".to_string())),
            Err(e) if e.is_not_found() => {
                return Ok(UpdateOutcome::Skipped("repository not found".to_string()))
            }
            Err(e) => return Err(e),
        };

        // A branch read from the existing workflow is only reused, never
        // pushed into the secrets.
        let upstream_slug = mirror.upstream.as_deref().and_then(repo_url::parse);
        let (upstream_branch, branch_is_live) = match &upstream_slug {
            Some(slug) => match self.hosting.default_branch(&slug.full_name()) {
                Ok(branch) => (branch, true),
                Err(e) => {
                    warn!("could not read default branch of {}: {}", slug, e);
                    match current_fallback_branch(&remote.content) {
                        Some(branch) => (branch, false),
                        None => return Err(e),
                    }
                }
            },
            None => (
                current_fallback_branch(&remote.content)
                    .unwrap_or_else(|| FALLBACK_BRANCH.to_string()),
                false,
            ),
        };

        match mirror.upstream.as_deref() {
            Some(upstream) => self.update_secrets(
                &mirror.full_name,
                upstream,
                branch_is_live.then_some(upstream_branch.as_str()),
            )?,
            None => debug!("{}: upstream unknown, secrets left as they are", mirror.full_name),
        }

        let schedule = mirror
            .schedule
            .clone()
            .or_else(|| current_schedule(&remote.content))
            .unwrap_or_else(|| self.settings.preferences.default_schedule.clone());
        let spec = SyncJobSpec::new(
            mirror.upstream.as_deref().unwrap_or(PLACEHOLDER_UPSTREAM),
            schedule,
            upstream_branch,
        )?;
        let workflow = generate_sync_workflow(&spec);

        if workflow == remote.content {
            return Ok(UpdateOutcome::Unchanged);
        }
        self.hosting.put_file(
            &mirror.full_name,
            MIRROR_MARKER_PATH,
            &workflow,
            Some(&remote.sha),
            UPDATE_COMMIT_MESSAGE,
        )?;
        Ok(UpdateOutcome::Updated)
    }

    /// `branch` is `None` when the upstream could not be asked, which keeps
    /// the stored branch secret.
    fn update_secrets(&self, full_name: &str, upstream: &str, branch: Option<&str>) -> Result<()> {
        self.hosting
            .set_secret(full_name, SECRET_UPSTREAM_URL, upstream)?;
        if let Some(branch) = branch {
            self.hosting
                .set_secret(full_name, SECRET_UPSTREAM_DEFAULT_BRANCH, branch)?;
        }
        if let Some(token) = self.settings.github_token() {
            self.hosting.set_secret(full_name, SECRET_GH_TOKEN, token)?;
        }
        if let Some(webhook) = self.settings.slack_webhook_url() {
            self.hosting
                .set_secret(full_name, SECRET_SLACK_WEBHOOK_URL, webhook)?;
        }
        Ok(())
    }
}

/// The cron expression of an existing workflow, if it has one.
fn current_schedule(workflow: &str) -> Option<String> {
    static CRON: OnceLock<Regex> = OnceLock::new();
    let pattern = CRON.get_or_init(|| {
        Regex::new(r#"(?m)^\s*-\s*cron:\s*['"]([^'"]+)['"]"#).expect("valid regex")
    });
    pattern
        .captures(workflow)
        .map(|caps| caps[1].trim().to_string())
}

/// The `FALLBACK_BRANCH` embedded in an existing workflow.
fn current_fallback_branch(workflow: &str) -> Option<String> {
    static BRANCH: OnceLock<Regex> = OnceLock::new();
    let pattern = BRANCH.get_or_init(|| {
        Regex::new(r#"(?m)^\s*FALLBACK_BRANCH:\s*['"]?([A-Za-z0-9._/-]+)['"]?\s*$"#)
            .expect("valid regex")
    });
    pattern
        .captures(workflow)
        .map(|caps| caps[1].to_string())
}
