//! # Repository Directory
//!
//! Lists an owner's repositories through the hosting service and decides
//! which of them are mirrors.
//!
//! A repository is a mirror when the sync job definition
//! ([`MIRROR_MARKER_PATH`]) exists on its default branch. Listings are
//! fetched lazily and kept in memory for the lifetime of the directory, so
//! one completion request never lists the same owner twice.

use std::cell::RefCell;
use std::collections::HashMap;

use log::{debug, warn};

use crate::defaults::{MIRROR_MARKER_PATH, REPO_LIST_LIMIT};
use crate::error::Result;
use crate::hosting::HostingService;
use crate::model::RepoCandidate;

/// Upper bound on repositories listed for one owner.
pub const MAX_REPO_LIST_LIMIT: usize = 1000;

pub struct RepositoryDirectory<'a> {
    hosting: &'a dyn HostingService,
    limit: usize,
    listings: RefCell<HashMap<String, Vec<RepoCandidate>>>,
}

impl<'a> RepositoryDirectory<'a> {
    pub fn new(hosting: &'a dyn HostingService) -> Self {
        Self {
            hosting,
            limit: REPO_LIST_LIMIT,
            listings: RefCell::new(HashMap::new()),
        }
    }

    /// Sets the per-owner listing limit, capped at [`MAX_REPO_LIST_LIMIT`].
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.clamp(1, MAX_REPO_LIST_LIMIT);
        self
    }

    /// Non-archived repositories of `owner`, each probed for the marker file.
    ///
    /// A failed listing is an error; a failed probe only marks that one
    /// repository as not being a mirror.
    pub fn list_repositories(&self, owner: &str) -> Result<Vec<RepoCandidate>> {
        if let Some(cached) = self.listings.borrow().get(owner) {
            debug!("reusing listing for {}", owner);
            return Ok(cached.clone());
        }

        let candidates: Vec<RepoCandidate> = self
            .hosting
            .list_repositories(owner, self.limit)?
            .into_iter()
            .filter(|listing| !listing.is_archived)
            .map(|listing| RepoCandidate {
                is_mirror: self.is_mirror(&listing.name_with_owner),
                full_name: listing.name_with_owner,
                description: listing.description,
                updated_at: listing.updated_at,
                is_private: listing.is_private,
            })
            .collect();

        debug!(
            "{}: {} repositories, {} mirrors",
            owner,
            candidates.len(),
            candidates.iter().filter(|c| c.is_mirror).count()
        );
        self.listings
            .borrow_mut()
            .insert(owner.to_string(), candidates.clone());
        Ok(candidates)
    }

    /// Whether `full_name` carries the mirror marker file.
    ///
    /// Not-found, access-denied and network failures all answer `false`.
    pub fn is_mirror(&self, full_name: &str) -> bool {
        match self.hosting.get_file(full_name, MIRROR_MARKER_PATH) {
            Ok(file) => file.is_some(),
            Err(e) => {
                warn!("could not check whether {} is a mirror: {}", full_name, e);
                false
            }
        }
    }
}
