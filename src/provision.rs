//! # Mirror Provisioner
//!
//! Creates a private mirror of a public repository in one linear run:
//!
//! 1. **Validate** the upstream URL, the requested name, prefix and schedule,
//!    the hosting session and the upstream's reachability.
//! 2. **Clone** the upstream with every branch and tag into a temporary
//!    workspace.
//! 3. **Sanitize** the clone by deleting the upstream `.github` directory and
//!    committing the removal.
//! 4. **Resolve the name**: the explicit name, else prefix plus the upstream
//!    repository name.
//! 5. **Create** the destination repository.
//! 6. **Push** every branch and tag.
//! 7. **Provision sync**: commit the generated workflow and register its
//!    secrets. Skipped with `skip_sync`.
//! 8. **Record** the mirror in the recent mirrors cache.
//!
//! Nothing is retried. The workspace is a [`tempfile::TempDir`] and is removed
//! on every exit path. A failure after step 5 leaves a real repository behind,
//! so it is reported as [`Error::PartialMirror`] with the steps that
//! completed; the repository is never deleted automatically.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::{debug, info, warn};

use crate::defaults::{CI_CONFIG_DIR, MIRROR_MARKER_PATH};
use crate::error::{Error, Result};
use crate::git::GitOperations;
use crate::hosting::{CreateRepository, HostingService, Visibility};
use crate::mirror_cache::MirrorCache;
use crate::model::MirrorRecord;
use crate::repo_url::{self, RepoSlug};
use crate::settings::Settings;
use crate::validators::{
    validate_cron_schedule, validate_github_url, validate_organization, validate_prefix,
    validate_repository_name,
};
use crate::workflow::{
    generate_sync_workflow, SyncJobSpec, SECRET_GH_TOKEN, SECRET_SLACK_WEBHOOK_URL,
    SECRET_UPSTREAM_DEFAULT_BRANCH, SECRET_UPSTREAM_URL,
};

pub const SANITIZE_COMMIT_MESSAGE: &str = "Remove original .github directory";
pub const WORKFLOW_COMMIT_MESSAGE: &str = "Add automatic mirror sync workflow";

const UPSTREAM_REMOTE: &str = "upstream";
const MIRROR_REMOTE: &str = "origin";

/// What the caller asks for.
#[derive(Debug, Clone, Default)]
pub struct MirrorRequest {
    pub upstream_url: String,
    pub name: Option<String>,
    pub org: Option<String>,
    pub prefix: Option<String>,
    pub schedule: Option<String>,
    pub visibility: Visibility,
    pub skip_sync: bool,
}

impl MirrorRequest {
    pub fn new(upstream_url: impl Into<String>) -> Self {
        Self {
            upstream_url: upstream_url.into(),
            ..Default::default()
        }
    }
}

/// The steps of a provisioning run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionStep {
    Validate,
    Clone,
    Sanitize,
    ResolveName,
    CreateRepository,
    Push,
    ProvisionSync,
    Record,
}

impl ProvisionStep {
    pub fn description(self) -> &'static str {
        match self {
            ProvisionStep::Validate => "validate",
            ProvisionStep::Clone => "clone upstream",
            ProvisionStep::Sanitize => "remove upstream workflows",
            ProvisionStep::ResolveName => "resolve name",
            ProvisionStep::CreateRepository => "create repository",
            ProvisionStep::Push => "push branches and tags",
            ProvisionStep::ProvisionSync => "set up sync workflow",
            ProvisionStep::Record => "record mirror",
        }
    }
}

impl fmt::Display for ProvisionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Mirror name for `upstream_name`: the explicit name if given, else the
/// prefix (explicit, else `default_prefix`) followed by `upstream_name`.
pub fn resolve_mirror_name(
    name: Option<&str>,
    prefix: Option<&str>,
    default_prefix: &str,
    upstream_name: &str,
) -> String {
    match name {
        Some(name) => name.to_string(),
        None => format!("{}{}", prefix.unwrap_or(default_prefix), upstream_name),
    }
}

/// Everything learnt during validation.
struct Plan {
    upstream: RepoSlug,
    /// `https://github.com/<owner>/<name>`, whatever form the caller used.
    upstream_url: String,
    owner: String,
    upstream_branch: String,
    schedule: String,
}

/// Tracks completed steps and reports progress.
struct Run<'r> {
    completed: Vec<ProvisionStep>,
    progress: Option<&'r dyn Fn(ProvisionStep)>,
}

impl Run<'_> {
    fn start(&self, step: ProvisionStep) {
        debug!("provisioning step: {}", step);
        if let Some(progress) = self.progress {
            progress(step);
        }
    }

    fn done(&mut self, step: ProvisionStep) {
        self.completed.push(step);
    }

    /// Runs a step that happens after the destination exists.
    fn after_create<T>(
        &mut self,
        repository: &str,
        step: ProvisionStep,
        action: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        self.start(step);
        match action() {
            Ok(value) => {
                self.done(step);
                Ok(value)
            }
            Err(source) => Err(Error::PartialMirror {
                repository: repository.to_string(),
                completed: self
                    .completed
                    .iter()
                    .map(|s| s.description().to_string())
                    .collect(),
                failed_step: step.description().to_string(),
                source: Box::new(source),
            }),
        }
    }
}

/// Drives a provisioning run against injected collaborators.
pub struct MirrorProvisioner<'a> {
    hosting: &'a dyn HostingService,
    git: &'a dyn GitOperations,
    cache: &'a MirrorCache,
    settings: &'a Settings,
    workspace_root: Option<PathBuf>,
    progress: Option<Box<dyn Fn(ProvisionStep) + 'a>>,
}

impl<'a> MirrorProvisioner<'a> {
    pub fn new(
        hosting: &'a dyn HostingService,
        git: &'a dyn GitOperations,
        cache: &'a MirrorCache,
        settings: &'a Settings,
    ) -> Self {
        Self {
            hosting,
            git,
            cache,
            settings,
            workspace_root: None,
            progress: None,
        }
    }

    /// Creates temporary workspaces under `root` instead of the system
    /// temporary directory.
    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = Some(root.into());
        self
    }

    /// Calls `progress` as each step starts.
    pub fn with_progress(mut self, progress: impl Fn(ProvisionStep) + 'a) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    /// Runs every step for `request` and returns the created mirror.
    pub fn create_mirror(&self, request: &MirrorRequest) -> Result<MirrorRecord> {
        let mut run = Run {
            completed: Vec::new(),
            progress: self.progress.as_deref(),
        };

        run.start(ProvisionStep::Validate);
        let plan = self.validate(request)?;
        run.done(ProvisionStep::Validate);

        run.start(ProvisionStep::Clone);
        let workspace = self.workspace()?;
        let repo_dir = workspace.path().join(&plan.upstream.name);
        self.git
            .clone_repository(&plan.upstream_url, &repo_dir)?;
        self.git
            .rename_remote(&repo_dir, MIRROR_REMOTE, UPSTREAM_REMOTE)?;
        if let Err(e) = self.git.remove_remote_head(&repo_dir, UPSTREAM_REMOTE) {
            debug!("no {}/HEAD to remove: {}", UPSTREAM_REMOTE, e);
        }
        run.done(ProvisionStep::Clone);

        run.start(ProvisionStep::Sanitize);
        self.sanitize(&repo_dir)?;
        run.done(ProvisionStep::Sanitize);

        run.start(ProvisionStep::ResolveName);
        let name = resolve_mirror_name(
            request.name.as_deref(),
            request.prefix.as_deref(),
            &self.settings.preferences.default_prefix,
            &plan.upstream.name,
        );
        validate_repository_name(&name)?;
        run.done(ProvisionStep::ResolveName);

        run.start(ProvisionStep::CreateRepository);
        let create = CreateRepository {
            name: name.clone(),
            org: request.org.clone(),
            visibility: request.visibility,
            description: format!("Private mirror of {}", plan.upstream_url),
        };
        let mirror_url = self
            .hosting
            .create_repository(&create)
            .map_err(|e| match e {
                Error::Conflict { name, .. } => Error::Conflict {
                    name,
                    hint: Some(
                        "pick another name with --repo or another prefix with --prefix"
                            .to_string(),
                    ),
                },
                other => other,
            })?;
        run.done(ProvisionStep::CreateRepository);
        let full_name = repo_url::parse(&mirror_url)
            .map(|slug| slug.full_name())
            .unwrap_or_else(|| format!("{}/{}", plan.owner, name));
        info!("created {} ({})", full_name, mirror_url);

        let branch = run.after_create(&full_name, ProvisionStep::Push, || {
            self.push(&repo_dir, &mirror_url)
        })?;

        if !request.skip_sync {
            run.after_create(&full_name, ProvisionStep::ProvisionSync, || {
                self.provision_sync(&repo_dir, &branch, &full_name, &plan)
            })?;
        }

        let record = MirrorRecord {
            upstream_url: plan.upstream_url.clone(),
            mirror_url,
            full_name: full_name.clone(),
            created_at: Some(Utc::now()),
            schedule: plan.schedule,
            has_sync: !request.skip_sync,
        };
        run.after_create(&full_name, ProvisionStep::Record, || {
            self.cache.add_recent_mirror(record.to_recent())
        })?;

        Ok(record)
    }

    fn validate(&self, request: &MirrorRequest) -> Result<Plan> {
        let upstream = validate_github_url(&request.upstream_url)?;
        if let Some(name) = request.name.as_deref() {
            validate_repository_name(name)?;
        }
        if let Some(prefix) = request.prefix.as_deref() {
            validate_prefix(prefix)?;
        }
        let schedule = request
            .schedule
            .clone()
            .unwrap_or_else(|| self.settings.preferences.default_schedule.clone());
        if !request.skip_sync {
            validate_cron_schedule(&schedule)?;
        }

        if !self.hosting.is_authenticated() {
            return Err(Error::Auth {
                message: "GitHub CLI is not authenticated".to_string(),
            });
        }
        let owner = match request.org.as_deref() {
            Some(org) => {
                validate_organization(self.hosting, org)?;
                org.to_string()
            }
            None => self.hosting.current_user()?,
        };

        let upstream_branch = self
            .hosting
            .default_branch(&upstream.full_name())
            .map_err(|e| {
                if e.is_not_found() {
                    Error::validation(
                        "repository URL",
                        format!("{} does not exist or is not readable", upstream),
                    )
                } else {
                    e
                }
            })?;
        debug!("upstream {} default branch: {}", upstream, upstream_branch);

        Ok(Plan {
            upstream_url: repo_url::https_url(&upstream.full_name()),
            upstream,
            owner,
            upstream_branch,
            schedule,
        })
    }

    fn workspace(&self) -> Result<tempfile::TempDir> {
        let builder = {
            let mut builder = tempfile::Builder::new();
            builder.prefix("cli-git-mirror-");
            builder
        };
        let dir = match &self.workspace_root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        Ok(dir)
    }

    /// Deletes the upstream CI directory and commits the removal.
    fn sanitize(&self, repo_dir: &Path) -> Result<()> {
        let ci_dir = repo_dir.join(CI_CONFIG_DIR);
        if !ci_dir.exists() {
            debug!("upstream has no {} directory", CI_CONFIG_DIR);
            return Ok(());
        }
        if let Err(e) = fs::remove_dir_all(&ci_dir) {
            warn!("could not remove {}: {}", ci_dir.display(), e);
            return Ok(());
        }
        self.git.commit_all(repo_dir, SANITIZE_COMMIT_MESSAGE)?;
        Ok(())
    }

    /// Pushes the checked-out branch, every other upstream branch and all
    /// tags. Returns the checked-out branch.
    fn push(&self, repo_dir: &Path, mirror_url: &str) -> Result<String> {
        self.git.add_remote(repo_dir, MIRROR_REMOTE, mirror_url)?;
        let branch = self.git.current_branch(repo_dir)?;
        self.git
            .push_refspecs(repo_dir, MIRROR_REMOTE, &[branch.clone()])?;
        // The checked-out branch carries the sanitize commit; its upstream
        // copy must not overwrite it.
        let others = vec![
            format!("refs/remotes/{}/*:refs/heads/*", UPSTREAM_REMOTE),
            format!("^refs/remotes/{}/{}", UPSTREAM_REMOTE, branch),
        ];
        self.git.push_refspecs(repo_dir, MIRROR_REMOTE, &others)?;
        self.git.push_tags(repo_dir, MIRROR_REMOTE)?;
        Ok(branch)
    }

    fn provision_sync(
        &self,
        repo_dir: &Path,
        branch: &str,
        full_name: &str,
        plan: &Plan,
    ) -> Result<()> {
        let spec = SyncJobSpec::new(
            plan.upstream_url.as_str(),
            plan.schedule.as_str(),
            plan.upstream_branch.as_str(),
        )?;
        let workflow_path = repo_dir.join(MIRROR_MARKER_PATH);
        if let Some(parent) = workflow_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&workflow_path, generate_sync_workflow(&spec))?;
        self.git.commit_all(repo_dir, WORKFLOW_COMMIT_MESSAGE)?;
        self.git
            .push_refspecs(repo_dir, MIRROR_REMOTE, &[branch.to_string()])?;

        self.hosting
            .set_secret(full_name, SECRET_UPSTREAM_URL, &plan.upstream_url)?;
        self.hosting.set_secret(
            full_name,
            SECRET_UPSTREAM_DEFAULT_BRANCH,
            &plan.upstream_branch,
        )?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheStore, FixedClock, MemoryBackend};
    use crate::git::fake::FakeGit;
    use crate::hosting::fake::FakeHosting;
    use std::cell::RefCell;
    use std::sync::Arc;
    use tempfile::TempDir;

    const UPSTREAM: &str = "https://github.com/acme/app";

    fn cache() -> MirrorCache {
        MirrorCache::new(CacheStore::with_parts(
            Box::new(MemoryBackend::default()),
            Box::new(Arc::new(FixedClock::new(1_700_000_000))),
        ))
    }

    fn upstream_git() -> FakeGit {
        FakeGit::new()
            .with_file("README.md", "# app")
            .with_file(".github/workflows/ci.yml", "on: push")
            .with_file(".github/CODEOWNERS", "* @acme")
    }

    fn secret_keys(hosting: &FakeHosting) -> Vec<String> {
        hosting
            .secrets
            .lock()
            .unwrap()
            .iter()
            .map(|(_, key, _)| key.clone())
            .collect()
    }

    #[test]
    fn test_resolve_mirror_name() {
        assert_eq!(resolve_mirror_name(Some("x"), Some("p-"), "mirror-", "app"), "x");
        assert_eq!(resolve_mirror_name(None, Some("p-"), "mirror-", "app"), "p-app");
        assert_eq!(resolve_mirror_name(None, None, "mirror-", "app"), "mirror-app");
        assert_eq!(resolve_mirror_name(None, Some(""), "mirror-", "app"), "app");
    }

    #[test]
    fn test_creates_mirror_end_to_end() {
        let hosting = FakeHosting::new("me").with_default_branch("acme/app", "develop");
        let git = upstream_git();
        let cache = cache();
        let settings = Settings::default();
        let provisioner = MirrorProvisioner::new(&hosting, &git, &cache, &settings);

        let record = provisioner
            .create_mirror(&MirrorRequest::new(UPSTREAM))
            .unwrap();

        assert_eq!(record.full_name, "me/mirror-app");
        assert_eq!(record.mirror_url, "https://github.com/me/mirror-app");
        assert!(record.has_sync);
        assert_eq!(record.schedule, "0 0 * * *");

        let created = hosting.created.lock().unwrap();
        assert_eq!(created[0].description, format!("Private mirror of {}", UPSTREAM));
        assert_eq!(created[0].visibility, Visibility::Private);

        let secrets = hosting.secrets.lock().unwrap().clone();
        assert!(secrets.contains(&(
            "me/mirror-app".to_string(),
            SECRET_UPSTREAM_URL.to_string(),
            UPSTREAM.to_string()
        )));
        assert!(secrets.contains(&(
            "me/mirror-app".to_string(),
            SECRET_UPSTREAM_DEFAULT_BRANCH.to_string(),
            "develop".to_string()
        )));

        let recent = cache.recent_mirrors();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].name, "me/mirror-app");
        assert_eq!(recent[0].schedule.as_deref(), Some("0 0 * * *"));
    }

    #[test]
    fn test_first_commit_has_no_ci_directory() {
        let hosting = FakeHosting::new("me");
        let git = upstream_git();
        let cache = cache();
        let settings = Settings::default();
        MirrorProvisioner::new(&hosting, &git, &cache, &settings)
            .create_mirror(&MirrorRequest::new(UPSTREAM))
            .unwrap();

        let commits = git.commits.lock().unwrap().clone();
        let (message, tree) = &commits[0];
        assert_eq!(message, SANITIZE_COMMIT_MESSAGE);
        assert_eq!(tree, &vec!["README.md".to_string()]);

        let (message, tree) = &commits[1];
        assert_eq!(message, WORKFLOW_COMMIT_MESSAGE);
        assert!(tree.contains(&MIRROR_MARKER_PATH.to_string()));
        assert!(!tree.contains(&".github/workflows/ci.yml".to_string()));
    }

    #[test]
    fn test_push_sequence() {
        let hosting = FakeHosting::new("me");
        let git = upstream_git();
        let cache = cache();
        let settings = Settings::default();
        MirrorProvisioner::new(&hosting, &git, &cache, &settings)
            .create_mirror(&MirrorRequest::new(UPSTREAM))
            .unwrap();

        let calls = git.calls();
        assert_eq!(calls[0], format!("clone {}", UPSTREAM));
        assert_eq!(calls[1], "rename_remote origin upstream");
        assert!(calls.contains(&"add_remote origin https://github.com/me/mirror-app".to_string()));
        assert!(calls.contains(
            &"push origin refs/remotes/upstream/*:refs/heads/* ^refs/remotes/upstream/main"
                .to_string()
        ));
        assert!(calls.contains(&"push_tags origin".to_string()));
        assert_eq!(calls.last().unwrap(), "push origin main");
    }

    #[test]
    fn test_short_and_ssh_urls_are_canonicalised() {
        for input in ["github.com/acme/app", "git@github.com:acme/app.git"] {
            let hosting = FakeHosting::new("me");
            let git = upstream_git();
            let cache = cache();
            let settings = Settings::default();
            let record = MirrorProvisioner::new(&hosting, &git, &cache, &settings)
                .create_mirror(&MirrorRequest::new(input))
                .unwrap();

            assert_eq!(record.upstream_url, UPSTREAM);
            assert_eq!(git.calls()[0], format!("clone {}", UPSTREAM));
            assert_eq!(
                hosting.created.lock().unwrap()[0].description,
                format!("Private mirror of {}", UPSTREAM)
            );
            assert!(hosting.secrets.lock().unwrap().contains(&(
                "me/mirror-app".to_string(),
                SECRET_UPSTREAM_URL.to_string(),
                UPSTREAM.to_string()
            )));
            assert_eq!(cache.recent_mirrors()[0].upstream, UPSTREAM);
        }
    }

    #[test]
    fn test_optional_secrets_from_settings() {
        let hosting = FakeHosting::new("me");
        let git = upstream_git();
        let cache = cache();
        let mut settings = Settings::default();
        settings.github.github_token = "ghp_abc".to_string();
        settings.github.slack_webhook_url = "https://hooks.slack.com/services/T/B/x".to_string();
        MirrorProvisioner::new(&hosting, &git, &cache, &settings)
            .create_mirror(&MirrorRequest::new(UPSTREAM))
            .unwrap();

        assert_eq!(
            secret_keys(&hosting),
            vec![
                SECRET_UPSTREAM_URL,
                SECRET_UPSTREAM_DEFAULT_BRANCH,
                SECRET_GH_TOKEN,
                SECRET_SLACK_WEBHOOK_URL
            ]
        );
    }

    #[test]
    fn test_skip_sync() {
        let hosting = FakeHosting::new("me");
        let git = upstream_git();
        let cache = cache();
        let settings = Settings::default();
        let request = MirrorRequest {
            skip_sync: true,
            name: Some("private-app".to_string()),
            ..MirrorRequest::new(UPSTREAM)
        };
        let record = MirrorProvisioner::new(&hosting, &git, &cache, &settings)
            .create_mirror(&request)
            .unwrap();

        assert_eq!(record.full_name, "me/private-app");
        assert!(secret_keys(&hosting).is_empty());
        assert_eq!(git.commits.lock().unwrap().len(), 1);
        assert_eq!(cache.recent_mirrors()[0].schedule, None);
    }

    #[test]
    fn test_org_and_prefix() {
        let hosting = FakeHosting::new("me").with_orgs(&["acme-corp"]);
        let git = upstream_git();
        let cache = cache();
        let settings = Settings::default();
        let request = MirrorRequest {
            org: Some("acme-corp".to_string()),
            prefix: Some("fork-".to_string()),
            visibility: Visibility::Internal,
            ..MirrorRequest::new(UPSTREAM)
        };
        let record = MirrorProvisioner::new(&hosting, &git, &cache, &settings)
            .create_mirror(&request)
            .unwrap();
        assert_eq!(record.full_name, "acme-corp/fork-app");
        assert_eq!(hosting.created.lock().unwrap()[0].visibility, Visibility::Internal);
    }

    #[test]
    fn test_invalid_url_has_no_side_effects() {
        let hosting = FakeHosting::new("me");
        let git = upstream_git();
        let cache = cache();
        let settings = Settings::default();
        let err = MirrorProvisioner::new(&hosting, &git, &cache, &settings)
            .create_mirror(&MirrorRequest::new("https://gitlab.com/acme/app"))
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert!(git.calls().is_empty());
        assert!(hosting.calls().is_empty());
    }

    #[test]
    fn test_invalid_schedule_rejected_before_clone() {
        let hosting = FakeHosting::new("me");
        let git = upstream_git();
        let cache = cache();
        let settings = Settings::default();
        let request = MirrorRequest {
            schedule: Some("daily".to_string()),
            ..MirrorRequest::new(UPSTREAM)
        };
        let err = MirrorProvisioner::new(&hosting, &git, &cache, &settings)
            .create_mirror(&request)
            .unwrap_err();
        assert!(err.to_string().contains("Invalid schedule"));
        assert!(git.calls().is_empty());
    }

    #[test]
    fn test_unauthenticated() {
        let hosting = FakeHosting::new("me").unauthenticated();
        let git = upstream_git();
        let cache = cache();
        let settings = Settings::default();
        let err = MirrorProvisioner::new(&hosting, &git, &cache, &settings)
            .create_mirror(&MirrorRequest::new(UPSTREAM))
            .unwrap_err();
        assert!(matches!(err, Error::Auth { .. }));
        assert!(git.calls().is_empty());
    }

    #[test]
    fn test_name_conflict_pushes_nothing() {
        let hosting = FakeHosting::new("me").with_repo("me/mirror-app", "", false);
        let git = upstream_git();
        let cache = cache();
        let settings = Settings::default();
        let err = MirrorProvisioner::new(&hosting, &git, &cache, &settings)
            .create_mirror(&MirrorRequest::new(UPSTREAM))
            .unwrap_err();

        match &err {
            Error::Conflict { name, hint } => {
                assert_eq!(name, "mirror-app");
                assert!(hint.as_deref().unwrap().contains("--repo"));
            }
            other => panic!("expected conflict, got {:?}", other),
        }
        let shown = crate::suggestions::explain(err).to_string();
        assert_eq!(shown.matches("hint:").count(), 1);
        assert!(shown.contains("--prefix"));
        assert!(!git.calls().iter().any(|c| c.starts_with("push")));
        assert!(cache.recent_mirrors().is_empty());
    }

    #[test]
    fn test_push_failure_is_partial_mirror() {
        let hosting = FakeHosting::new("me");
        let git = upstream_git().failing_on("push");
        let cache = cache();
        let settings = Settings::default();
        let err = MirrorProvisioner::new(&hosting, &git, &cache, &settings)
            .create_mirror(&MirrorRequest::new(UPSTREAM))
            .unwrap_err();

        match err {
            Error::PartialMirror {
                repository,
                completed,
                failed_step,
                source,
            } => {
                assert_eq!(repository, "me/mirror-app");
                assert_eq!(completed.last().unwrap(), "create repository");
                assert_eq!(failed_step, ProvisionStep::Push.description());
                assert!(matches!(*source, Error::Transfer { .. }));
            }
            other => panic!("expected partial mirror, got {:?}", other),
        }
        assert!(cache.recent_mirrors().is_empty());
    }

    #[test]
    fn test_secret_failure_is_partial_mirror() {
        let hosting = FakeHosting::new("me").failing_secrets();
        let git = upstream_git();
        let cache = cache();
        let settings = Settings::default();
        let err = MirrorProvisioner::new(&hosting, &git, &cache, &settings)
            .create_mirror(&MirrorRequest::new(UPSTREAM))
            .unwrap_err();
        match err {
            Error::PartialMirror {
                completed,
                failed_step,
                ..
            } => {
                assert!(completed.contains(&"push branches and tags".to_string()));
                assert_eq!(failed_step, "set up sync workflow");
            }
            other => panic!("expected partial mirror, got {:?}", other),
        }
    }

    #[test]
    fn test_workspace_removed_on_every_exit() {
        let root = TempDir::new().unwrap();
        let hosting = FakeHosting::new("me");
        let cache = cache();
        let settings = Settings::default();

        let ok_git = upstream_git();
        MirrorProvisioner::new(&hosting, &ok_git, &cache, &settings)
            .with_workspace_root(root.path())
            .create_mirror(&MirrorRequest::new(UPSTREAM))
            .unwrap();
        assert!(ok_git.clone_dirs.lock().unwrap()[0].starts_with(root.path()));
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);

        let failing_git = upstream_git().failing_on("clone");
        MirrorProvisioner::new(&hosting, &failing_git, &cache, &settings)
            .with_workspace_root(root.path())
            .create_mirror(&MirrorRequest {
                name: Some("other".to_string()),
                ..MirrorRequest::new(UPSTREAM)
            })
            .unwrap_err();
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_progress_reports_steps_in_order() {
        let hosting = FakeHosting::new("me");
        let git = upstream_git();
        let cache = cache();
        let settings = Settings::default();
        let seen = RefCell::new(Vec::new());
        MirrorProvisioner::new(&hosting, &git, &cache, &settings)
            .with_progress(|step| seen.borrow_mut().push(step))
            .create_mirror(&MirrorRequest::new(UPSTREAM))
            .unwrap();
        assert_eq!(
            seen.into_inner(),
            vec![
                ProvisionStep::Validate,
                ProvisionStep::Clone,
                ProvisionStep::Sanitize,
                ProvisionStep::ResolveName,
                ProvisionStep::CreateRepository,
                ProvisionStep::Push,
                ProvisionStep::ProvisionSync,
                ProvisionStep::Record,
            ]
        );
    }
}
