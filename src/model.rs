//! Records shared by the provisioner, the caches and the completion resolver.
//!
//! The serialized field names of the cache records match the JSON documents
//! written by earlier releases, so existing cache files keep working.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::CachePayload;
use crate::repo_url;

/// A mirror created or discovered by the tool.
///
/// `full_name` (`owner/name`) is unique among the repositories visible to the
/// authenticated account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorRecord {
    pub upstream_url: String,
    pub mirror_url: String,
    pub full_name: String,
    pub created_at: Option<DateTime<Utc>>,
    pub schedule: String,
    pub has_sync: bool,
}

impl MirrorRecord {
    /// Entry for the recent mirrors list.
    pub fn to_recent(&self) -> RecentMirror {
        RecentMirror {
            upstream: self.upstream_url.clone(),
            mirror: self.mirror_url.clone(),
            name: self.full_name.clone(),
            created_at: self
                .created_at
                .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true)),
            schedule: self.has_sync.then(|| self.schedule.clone()),
        }
    }
}

/// One element of the recent mirrors list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentMirror {
    #[serde(default)]
    pub upstream: String,
    #[serde(default)]
    pub mirror: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
}

impl RecentMirror {
    /// The mirror's `owner/name`, derived from its URL when no name was stored.
    pub fn full_name(&self) -> Option<String> {
        if !self.name.is_empty() {
            return Some(self.name.clone());
        }
        repo_url::parse(&self.mirror).map(|slug| slug.full_name())
    }
}

/// A mirror found by scanning the account's repositories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannedMirror {
    pub name: String,
    #[serde(default)]
    pub mirror: String,
    #[serde(default)]
    pub upstream: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub updated_at: String,
}

/// On-disk shape of the scanned mirrors cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannedMirrors {
    pub timestamp: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    pub mirrors: Vec<ScannedMirror>,
}

impl CachePayload for ScannedMirrors {
    fn timestamp(&self) -> Option<f64> {
        Some(self.timestamp)
    }
}

/// A repository as returned by the hosting service listing, annotated with
/// whether it is a mirror.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoListing {
    #[serde(rename = "nameWithOwner")]
    pub name_with_owner: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default)]
    pub is_mirror: bool,
    #[serde(rename = "updatedAt", default)]
    pub updated_at: String,
    #[serde(rename = "isArchived", default)]
    pub is_archived: bool,
    #[serde(rename = "isPrivate", default, skip_serializing)]
    pub is_private: bool,
}

/// On-disk shape of the repository completion cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoCompletion {
    pub timestamp: f64,
    pub repos: Vec<RepoListing>,
}

impl CachePayload for RepoCompletion {
    fn timestamp(&self) -> Option<f64> {
        Some(self.timestamp)
    }
}

/// A repository resolved by the directory provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoCandidate {
    pub full_name: String,
    pub description: String,
    pub is_mirror: bool,
    pub updated_at: String,
    pub is_private: bool,
}

impl RepoCandidate {
    /// The `name` half of `owner/name`.
    pub fn short_name(&self) -> &str {
        self.full_name
            .split_once('/')
            .map(|(_, name)| name)
            .unwrap_or(&self.full_name)
    }

    pub fn to_listing(&self) -> RepoListing {
        RepoListing {
            name_with_owner: self.full_name.clone(),
            description: self.description.clone(),
            is_mirror: self.is_mirror,
            updated_at: self.updated_at.clone(),
            is_archived: false,
            is_private: self.is_private,
        }
    }

    pub fn to_scanned(&self) -> ScannedMirror {
        ScannedMirror {
            name: self.full_name.clone(),
            mirror: repo_url::https_url(&self.full_name),
            upstream: String::new(),
            description: self.description.clone(),
            is_private: self.is_private,
            updated_at: self.updated_at.clone(),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
