//! # Completion
//!
//! Suggestions for shell completion of repository, organization, schedule
//! and prefix arguments.
//!
//! Repository suggestions come from a strict waterfall of sources, cheapest
//! first. The first level that produces at least one match answers the
//! request; results from different levels are never merged.
//!
//! 1. Scanned mirrors cache (every entry is a mirror)
//! 2. Repository completion cache (entries flagged `is_mirror`)
//! 3. Recent mirrors
//! 4. Live lookup through the [`RepositoryDirectory`], which refreshes the
//!    repository completion cache on success
//!
//! Within a level the source order is kept and the result is cut to
//! [`SUGGESTION_LIMIT`] entries.

use log::{debug, warn};

use crate::defaults::SUGGESTION_LIMIT;
use crate::directory::RepositoryDirectory;
use crate::hosting::HostingService;
use crate::mirror_cache::MirrorCache;
use crate::model::RepoListing;
use crate::repo_url;

const MIRROR_EMOJI: &str = "🔄";

/// One completion candidate: the value to insert and a human-readable label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub value: String,
    pub label: String,
}

impl Suggestion {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Case-insensitive prefix match of `partial` against `owner/name`.
///
/// With a `/` in `partial` the whole `owner/name` is matched; otherwise only
/// the name part is, across all owners. An empty `partial` matches anything.
pub fn matches(full_name: &str, partial: &str) -> bool {
    let partial = partial.to_lowercase();
    let full_name = full_name.to_lowercase();
    if partial.contains('/') {
        return full_name.starts_with(&partial);
    }
    let name = full_name
        .split_once('/')
        .map(|(_, name)| name)
        .unwrap_or(&full_name);
    name.starts_with(&partial)
}

/// Label for a mirror suggestion.
///
/// A stored description wins. Otherwise the upstream is shown in short
/// `owner/name` form when it parses, or raw when it does not.
pub fn mirror_label(upstream: Option<&str>, description: Option<&str>) -> String {
    if let Some(description) = description.map(str::trim).filter(|d| !d.is_empty()) {
        if description.starts_with(MIRROR_EMOJI) {
            return description.to_string();
        }
        return format!("{} {}", MIRROR_EMOJI, description);
    }
    match upstream.map(str::trim).filter(|u| !u.is_empty()) {
        Some(upstream) => format!("{} Mirror of {}", MIRROR_EMOJI, repo_url::short_name(upstream)),
        None => format!("{} Mirror repository", MIRROR_EMOJI),
    }
}

/// Identity used to scope a live lookup.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    /// Authenticated user; looked up through the hosting service when `None`.
    pub username: Option<String>,
    pub default_org: Option<String>,
}

/// One waterfall step: `None` when its source is unavailable.
type Level<'a> = fn(&CompletionResolver<'a>, &str, &Scope) -> Option<Vec<Suggestion>>;

/// Answers "which mirrors match this partial name".
pub struct CompletionResolver<'a> {
    cache: &'a MirrorCache,
    hosting: &'a dyn HostingService,
    directory: RepositoryDirectory<'a>,
}

impl<'a> CompletionResolver<'a> {
    pub fn new(cache: &'a MirrorCache, hosting: &'a dyn HostingService) -> Self {
        Self {
            cache,
            hosting,
            directory: RepositoryDirectory::new(hosting),
        }
    }

    /// Suggestions for `partial`, at most [`SUGGESTION_LIMIT`].
    pub fn suggest(&self, partial: &str, scope: &Scope) -> Vec<Suggestion> {
        let levels: [(&str, Level<'a>); 4] = [
            ("scanned mirrors", Self::from_scanned_mirrors),
            ("repo completion cache", Self::from_repo_completion),
            ("recent mirrors", Self::from_recent_mirrors),
            ("live lookup", Self::from_live_lookup),
        ];
        for (name, level) in levels {
            match level(self, partial, scope) {
                Some(mut suggestions) if !suggestions.is_empty() => {
                    debug!("{} answered with {} suggestions", name, suggestions.len());
                    suggestions.truncate(SUGGESTION_LIMIT);
                    return suggestions;
                }
                _ => debug!("{} had nothing for '{}'", name, partial),
            }
        }
        Vec::new()
    }

    fn from_scanned_mirrors(&self, partial: &str, _scope: &Scope) -> Option<Vec<Suggestion>> {
        let mirrors = self.cache.scanned_mirrors()?;
        Some(
            mirrors
                .iter()
                .filter(|m| !m.name.is_empty() && matches(&m.name, partial))
                .map(|m| {
                    Suggestion::new(
                        &m.name,
                        mirror_label(Some(&m.upstream), Some(&m.description)),
                    )
                })
                .collect(),
        )
    }

    fn from_repo_completion(&self, partial: &str, _scope: &Scope) -> Option<Vec<Suggestion>> {
        let repos = self.cache.repo_completion()?;
        Some(
            repos
                .iter()
                .filter(|r| r.is_mirror && matches(&r.name_with_owner, partial))
                .map(|r| Suggestion::new(&r.name_with_owner, mirror_label(None, Some(&r.description))))
                .collect(),
        )
    }

    fn from_recent_mirrors(&self, partial: &str, _scope: &Scope) -> Option<Vec<Suggestion>> {
        Some(
            self.cache
                .recent_mirrors()
                .iter()
                .filter_map(|m| {
                    let name = m.full_name()?;
                    matches(&name, partial)
                        .then(|| Suggestion::new(name, mirror_label(Some(&m.upstream), None)))
                })
                .collect(),
        )
    }

    fn from_live_lookup(&self, partial: &str, scope: &Scope) -> Option<Vec<Suggestion>> {
        let owners = match self.owners_for(partial, scope) {
            Some(owners) => owners,
            None => return self.from_recent_mirrors(partial, scope),
        };

        let mut listed: Vec<RepoListing> = Vec::new();
        let mut failed = 0;
        for owner in &owners {
            match self.directory.list_repositories(owner) {
                Ok(repos) => listed.extend(repos.iter().map(|r| r.to_listing())),
                Err(e) => {
                    warn!("could not list repositories of {}: {}", owner, e);
                    failed += 1;
                }
            }
        }

        if failed == owners.len() {
            return self.from_recent_mirrors(partial, scope);
        }
        if failed == 0 {
            if let Err(e) = self.cache.save_repo_completion(listed.clone()) {
                warn!("could not write repo completion cache: {}", e);
            }
        }

        Some(
            listed
                .iter()
                .filter(|r| r.is_mirror && matches(&r.name_with_owner, partial))
                .map(|r| Suggestion::new(&r.name_with_owner, mirror_label(None, Some(&r.description))))
                .collect(),
        )
    }

    /// Owners to query: the one named in `owner/...`, else the user and the
    /// default organization. `None` if the user cannot be determined.
    fn owners_for(&self, partial: &str, scope: &Scope) -> Option<Vec<String>> {
        if let Some((owner, _)) = partial.split_once('/') {
            if !owner.is_empty() {
                return Some(vec![owner.to_string()]);
            }
        }

        let username = match &scope.username {
            Some(name) if !name.is_empty() => name.clone(),
            _ => match self.hosting.current_user() {
                Ok(name) => name,
                Err(e) => {
                    warn!("could not determine the current user: {}", e);
                    return None;
                }
            },
        };

        let mut owners = vec![username];
        if !partial.contains('/') {
            if let Some(org) = scope.default_org.as_deref().filter(|o| !o.is_empty()) {
                if !owners.iter().any(|o| o == org) {
                    owners.push(org.to_string());
                }
            }
        }
        Some(owners)
    }
}

/// Organizations the user belongs to, filtered by prefix. Lookup failures
/// produce no suggestions.
pub fn complete_organization(hosting: &dyn HostingService, partial: &str) -> Vec<Suggestion> {
    let partial = partial.to_lowercase();
    match hosting.list_organizations() {
        Ok(orgs) => orgs
            .into_iter()
            .filter(|org| org.to_lowercase().starts_with(&partial))
            .map(|org| Suggestion::new(org, "GitHub Organization"))
            .collect(),
        Err(e) => {
            debug!("organization completion unavailable: {}", e);
            Vec::new()
        }
    }
}

/// Common sync schedules.
pub const SCHEDULE_SUGGESTIONS: [(&str, &str); 6] = [
    ("0 * * * *", "Every hour"),
    ("0 0 * * *", "Every day at midnight UTC"),
    ("0 0 * * 0", "Every Sunday at midnight UTC"),
    ("0 0,12 * * *", "Twice daily (midnight and noon UTC)"),
    ("0 */6 * * *", "Every 6 hours"),
    ("0 0 1 * *", "First day of every month"),
];

pub fn complete_schedule(partial: &str) -> Vec<Suggestion> {
    SCHEDULE_SUGGESTIONS
        .iter()
        .filter(|(schedule, _)| schedule.starts_with(partial))
        .map(|(schedule, label)| Suggestion::new(*schedule, *label))
        .collect()
}

/// Common prefixes, led by the configured default. Duplicates are dropped.
pub fn complete_prefix(default_prefix: &str, partial: &str) -> Vec<Suggestion> {
    let candidates = [
        (default_prefix, "Default prefix"),
        ("mirror-", "Standard mirror prefix"),
        ("fork-", "Fork prefix"),
        ("private-", "Private prefix"),
        ("backup-", "Backup prefix"),
        ("", "No prefix"),
    ];

    let mut suggestions: Vec<Suggestion> = Vec::new();
    for (prefix, label) in candidates {
        if suggestions.iter().any(|s| s.value == prefix) {
            continue;
        }
        if prefix.starts_with(partial) {
            suggestions.push(Suggestion::new(prefix, label));
        }
    }
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheStore, FixedClock, MemoryBackend};
    use crate::hosting::fake::FakeHosting;
    use crate::model::{RecentMirror, ScannedMirror};
    use std::sync::Arc;

    fn memory_cache(clock: Arc<FixedClock>) -> MirrorCache {
        MirrorCache::new(CacheStore::with_parts(
            Box::new(MemoryBackend::new()),
            Box::new(clock),
        ))
    }

    fn scanned(name: &str, upstream: &str, description: &str) -> ScannedMirror {
        ScannedMirror {
            name: name.to_string(),
            mirror: repo_url::https_url(name),
            upstream: upstream.to_string(),
            description: description.to_string(),
            is_private: true,
            updated_at: String::new(),
        }
    }

    fn recent(name: &str, upstream: &str) -> RecentMirror {
        RecentMirror {
            upstream: upstream.to_string(),
            mirror: repo_url::https_url(name),
            name: name.to_string(),
            created_at: None,
            schedule: None,
        }
    }

    fn me() -> Scope {
        Scope {
            username: Some("me".to_string()),
            default_org: None,
        }
    }

    fn live_calls(hosting: &FakeHosting) -> usize {
        hosting
            .calls()
            .iter()
            .filter(|c| c.starts_with("list_repositories") || c.starts_with("get_file"))
            .count()
    }

    #[test]
    fn test_matching_rule() {
        assert!(matches("ownerA/repo-x", "repo"));
        assert!(matches("ownerB/Repo-y", "REPO"));
        assert!(!matches("repo/other", "repo"));
        assert!(matches("ownerA/repo-x", "ownerA/re"));
        assert!(!matches("ownerB/repo-y", "ownerA/re"));
        assert!(matches("anything/at-all", ""));
    }

    #[test]
    fn test_labels() {
        assert_eq!(
            mirror_label(Some("https://github.com/facebook/react"), None),
            "🔄 Mirror of facebook/react"
        );
        assert_eq!(
            mirror_label(Some("https://example.com/x.git"), None),
            "🔄 Mirror of https://example.com/x.git"
        );
        assert_eq!(mirror_label(None, None), "🔄 Mirror repository");
        assert_eq!(mirror_label(Some(""), Some("")), "🔄 Mirror repository");
        assert_eq!(
            mirror_label(Some("https://github.com/a/b"), Some("Private mirror of x")),
            "🔄 Private mirror of x"
        );
        assert_eq!(mirror_label(None, Some("🔄 already")), "🔄 already");
    }

    #[test]
    fn test_scanned_cache_short_circuits_live_lookup() {
        let cache = memory_cache(Arc::new(FixedClock::new(100)));
        cache
            .save_scanned_mirrors(vec![scanned("acme/app", "", "")])
            .unwrap();
        let hosting = FakeHosting::new("me").with_repo("me/app-two", "", true);
        let resolver = CompletionResolver::new(&cache, &hosting);

        let suggestions = resolver.suggest("ap", &me());
        assert_eq!(
            suggestions,
            vec![Suggestion::new("acme/app", "🔄 Mirror repository")]
        );
        assert_eq!(live_calls(&hosting), 0);
        assert!(hosting.calls().is_empty());
    }

    #[test]
    fn test_levels_are_not_merged() {
        let cache = memory_cache(Arc::new(FixedClock::new(100)));
        cache
            .save_scanned_mirrors(vec![scanned("acme/app", "https://github.com/up/app", "")])
            .unwrap();
        cache
            .add_recent_mirror(recent("me/app-recent", "https://github.com/up/x"))
            .unwrap();
        let hosting = FakeHosting::new("me");
        let resolver = CompletionResolver::new(&cache, &hosting);

        let suggestions = resolver.suggest("app", &me());
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].label, "🔄 Mirror of up/app");
    }

    #[test]
    fn test_repo_completion_cache_filters_non_mirrors() {
        let cache = memory_cache(Arc::new(FixedClock::new(100)));
        cache
            .save_repo_completion(vec![
                RepoListing {
                    name_with_owner: "me/tool".to_string(),
                    description: "Private mirror of https://github.com/o/tool".to_string(),
                    is_mirror: true,
                    updated_at: String::new(),
                    is_archived: false,
                    is_private: true,
                },
                RepoListing {
                    name_with_owner: "me/tool-notes".to_string(),
                    description: String::new(),
                    is_mirror: false,
                    updated_at: String::new(),
                    is_archived: false,
                    is_private: true,
                },
            ])
            .unwrap();
        let hosting = FakeHosting::new("me");
        let resolver = CompletionResolver::new(&cache, &hosting);

        let suggestions = resolver.suggest("to", &me());
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].value, "me/tool");
        assert_eq!(
            suggestions[0].label,
            "🔄 Private mirror of https://github.com/o/tool"
        );
        assert!(hosting.calls().is_empty());
    }

    #[test]
    fn test_expired_caches_fall_through_to_recent() {
        let clock = Arc::new(FixedClock::new(0));
        let cache = memory_cache(clock.clone());
        cache
            .save_scanned_mirrors(vec![scanned("acme/app", "", "")])
            .unwrap();
        cache
            .add_recent_mirror(recent("me/app", "https://github.com/up/app"))
            .unwrap();
        clock.set(1801);

        let hosting = FakeHosting::new("me");
        let resolver = CompletionResolver::new(&cache, &hosting);
        let suggestions = resolver.suggest("app", &me());
        assert_eq!(
            suggestions,
            vec![Suggestion::new("me/app", "🔄 Mirror of up/app")]
        );
        assert!(hosting.calls().is_empty());
    }

    #[test]
    fn test_live_lookup_populates_completion_cache() {
        let cache = memory_cache(Arc::new(FixedClock::new(100)));
        let hosting = FakeHosting::new("me")
            .with_repo("me/mirror-app", "Private mirror", true)
            .with_repo("me/app-plain", "", false)
            .with_repo("acme/mirror-lib", "", true);
        let resolver = CompletionResolver::new(&cache, &hosting);
        let scope = Scope {
            username: Some("me".to_string()),
            default_org: Some("acme".to_string()),
        };

        let suggestions = resolver.suggest("mirror", &scope);
        let values: Vec<_> = suggestions.iter().map(|s| s.value.as_str()).collect();
        assert_eq!(values, vec!["me/mirror-app", "acme/mirror-lib"]);

        let cached = cache.repo_completion().unwrap();
        assert_eq!(cached.len(), 3);
        assert!(cached.iter().any(|r| r.name_with_owner == "me/app-plain" && !r.is_mirror));

        // Second call is answered from the cache.
        let before = hosting.calls().len();
        let again = resolver.suggest("mirror", &scope);
        assert_eq!(again, suggestions);
        assert_eq!(hosting.calls().len(), before);
    }

    #[test]
    fn test_owner_qualified_input_queries_only_that_owner() {
        let cache = memory_cache(Arc::new(FixedClock::new(100)));
        let hosting = FakeHosting::new("me")
            .with_repo("acme/app", "", true)
            .with_repo("me/app", "", true);
        let resolver = CompletionResolver::new(&cache, &hosting);

        let suggestions = resolver.suggest("acme/a", &me());
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].value, "acme/app");
        assert!(!hosting.calls().contains(&"list_repositories me".to_string()));
    }

    #[test]
    fn test_live_failure_returns_empty_without_caching() {
        let cache = memory_cache(Arc::new(FixedClock::new(100)));
        let hosting = FakeHosting::new("me").failing_listing("me");
        let resolver = CompletionResolver::new(&cache, &hosting);

        assert!(resolver.suggest("app", &me()).is_empty());
        assert!(cache.repo_completion().is_none());
    }

    #[test]
    fn test_unknown_user_resolved_through_hosting() {
        let cache = memory_cache(Arc::new(FixedClock::new(100)));
        let hosting = FakeHosting::new("octocat").with_repo("octocat/m", "", true);
        let resolver = CompletionResolver::new(&cache, &hosting);

        let suggestions = resolver.suggest("m", &Scope::default());
        assert_eq!(suggestions[0].value, "octocat/m");
        assert!(hosting.calls().contains(&"current_user".to_string()));
    }

    #[test]
    fn test_results_truncated_in_source_order() {
        let cache = memory_cache(Arc::new(FixedClock::new(100)));
        let mirrors: Vec<_> = (0..30)
            .map(|i| scanned(&format!("acme/repo-{:02}", 29 - i), "", ""))
            .collect();
        cache.save_scanned_mirrors(mirrors).unwrap();
        let hosting = FakeHosting::new("me");
        let resolver = CompletionResolver::new(&cache, &hosting);

        let suggestions = resolver.suggest("repo", &me());
        assert_eq!(suggestions.len(), SUGGESTION_LIMIT);
        assert_eq!(suggestions[0].value, "acme/repo-29");
        assert_eq!(suggestions[19].value, "acme/repo-10");
    }

    #[test]
    fn test_organization_completion() {
        let hosting = FakeHosting::new("me").with_orgs(&["Acme", "widgets"]);
        let suggestions = complete_organization(&hosting, "ac");
        assert_eq!(
            suggestions,
            vec![Suggestion::new("Acme", "GitHub Organization")]
        );

        let failing = FakeHosting::new("me").failing_orgs();
        assert!(complete_organization(&failing, "").is_empty());
    }

    #[test]
    fn test_schedule_completion() {
        assert_eq!(complete_schedule("").len(), 6);
        let daily = complete_schedule("0 0");
        assert!(daily.iter().all(|s| s.value.starts_with("0 0")));
        assert_eq!(daily.len(), 4);
    }

    #[test]
    fn test_prefix_completion_dedupes_default() {
        let all = complete_prefix("mirror-", "");
        assert_eq!(all.len(), 5);
        assert_eq!(all[0], Suggestion::new("mirror-", "Default prefix"));

        let custom = complete_prefix("team-", "");
        assert_eq!(custom.len(), 6);

        let filtered = complete_prefix("mirror-", "f");
        assert_eq!(filtered, vec![Suggestion::new("fork-", "Fork prefix")]);
    }
}
