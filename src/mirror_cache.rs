//! The three mirror caches kept under `~/.cli-git/cache`.
//!
//! | cache               | file                    | policy               |
//! |---------------------|-------------------------|----------------------|
//! | recent mirrors      | `recent_mirrors.json`   | FIFO, 10 entries     |
//! | scanned mirrors     | `scanned_mirrors.json`  | TTL, 1800 s          |
//! | repo completion     | `repo_completion.json`  | TTL, 600 s           |

use log::debug;

use crate::cache::{CachePolicy, CacheStore};
use crate::defaults::{RECENT_MIRRORS_LIMIT, REPO_COMPLETION_TTL, SCANNED_MIRRORS_TTL};
use crate::error::Result;
use crate::model::{RecentMirror, RepoCompletion, RepoListing, ScannedMirror, ScannedMirrors};

pub const RECENT_MIRRORS_KEY: &str = "recent_mirrors";
pub const SCANNED_MIRRORS_KEY: &str = "scanned_mirrors";
pub const REPO_COMPLETION_KEY: &str = "repo_completion";

/// Summary of one cache document, for display.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSummary {
    pub name: &'static str,
    pub location: String,
    pub present: bool,
    pub entries: usize,
    pub age_secs: Option<u64>,
    pub fresh: bool,
}

/// Typed view of the mirror caches over a [`CacheStore`].
pub struct MirrorCache {
    store: CacheStore,
    scanned_ttl: u64,
    completion_ttl: u64,
}

impl MirrorCache {
    pub fn new(store: CacheStore) -> Self {
        Self {
            store,
            scanned_ttl: SCANNED_MIRRORS_TTL,
            completion_ttl: REPO_COMPLETION_TTL,
        }
    }

    /// Overrides the default TTLs.
    pub fn with_ttls(mut self, scanned_ttl: u64, completion_ttl: u64) -> Self {
        self.scanned_ttl = scanned_ttl;
        self.completion_ttl = completion_ttl;
        self
    }

    /// Recently created mirrors, newest first. Never expires.
    pub fn recent_mirrors(&self) -> Vec<RecentMirror> {
        self.store
            .get(
                RECENT_MIRRORS_KEY,
                CachePolicy::FifoBounded {
                    bound: RECENT_MIRRORS_LIMIT,
                },
            )
            .unwrap_or_default()
    }

    pub fn add_recent_mirror(&self, mirror: RecentMirror) -> Result<()> {
        self.store
            .append_bounded(RECENT_MIRRORS_KEY, mirror, RECENT_MIRRORS_LIMIT)
    }

    /// Mirrors from the last scan, if the scan is still fresh.
    pub fn scanned_mirrors(&self) -> Option<Vec<ScannedMirror>> {
        let cached: ScannedMirrors = self.store.get(
            SCANNED_MIRRORS_KEY,
            CachePolicy::Ttl {
                max_age: self.scanned_ttl,
            },
        )?;
        debug!("scanned mirrors cache hit ({} mirrors)", cached.mirrors.len());
        Some(cached.mirrors)
    }

    pub fn save_scanned_mirrors(&self, mirrors: Vec<ScannedMirror>) -> Result<()> {
        let document = ScannedMirrors {
            timestamp: self.store.now() as f64,
            prefix: None,
            mirrors,
        };
        self.store.put(SCANNED_MIRRORS_KEY, &document)
    }

    /// Repository listing from the last live lookup, if still fresh.
    pub fn repo_completion(&self) -> Option<Vec<RepoListing>> {
        let cached: RepoCompletion = self.store.get(
            REPO_COMPLETION_KEY,
            CachePolicy::Ttl {
                max_age: self.completion_ttl,
            },
        )?;
        debug!("repo completion cache hit ({} repos)", cached.repos.len());
        Some(cached.repos)
    }

    pub fn save_repo_completion(&self, repos: Vec<RepoListing>) -> Result<()> {
        let document = RepoCompletion {
            timestamp: self.store.now() as f64,
            repos,
        };
        self.store.put(REPO_COMPLETION_KEY, &document)
    }

    /// Removes all three cache documents.
    pub fn clear(&self) -> Result<()> {
        for key in [RECENT_MIRRORS_KEY, SCANNED_MIRRORS_KEY, REPO_COMPLETION_KEY] {
            self.store.invalidate(key)?;
        }
        Ok(())
    }

    /// Describes each cache document without applying any policy.
    pub fn summaries(&self) -> Vec<CacheSummary> {
        let now = self.store.now();
        let describe = |name: &'static str, list_field: Option<&str>, ttl: Option<u64>| {
            let raw = self.store.raw(name);
            let entries = raw
                .as_ref()
                .and_then(|value| match list_field {
                    Some(field) => value.get(field),
                    None => Some(value),
                })
                .and_then(|list| list.as_array())
                .map(|list| list.len())
                .unwrap_or(0);
            let age_secs = raw
                .as_ref()
                .and_then(|value| value.get("timestamp"))
                .and_then(|ts| ts.as_f64())
                .map(|ts| (now as f64 - ts).max(0.0) as u64);
            let fresh = match (ttl, age_secs) {
                (Some(ttl), Some(age)) => age <= ttl,
                (None, _) => raw.is_some(),
                _ => false,
            };
            CacheSummary {
                name,
                location: self.store.location(name),
                present: raw.is_some(),
                entries,
                age_secs,
                fresh,
            }
        };

        vec![
            describe(RECENT_MIRRORS_KEY, None, None),
            describe(SCANNED_MIRRORS_KEY, Some("mirrors"), Some(self.scanned_ttl)),
            describe(REPO_COMPLETION_KEY, Some("repos"), Some(self.completion_ttl)),
        ]
    }
}
