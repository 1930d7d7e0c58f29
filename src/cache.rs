//! # Cache Store
//!
//! Typed key-value persistence for the completion and mirror caches.
//!
//! Each key maps to one JSON document. Reads take a [`CachePolicy`]:
//!
//! - **`Ttl`**: the payload carries its own write timestamp and is a miss once
//!   `now - timestamp > max_age`. Expired documents stay on disk until the
//!   next write overwrites them.
//! - **`FifoBounded`**: a list written through [`CacheStore::append_bounded`],
//!   newest first, truncated to the bound.
//! - **`Unbounded`**: no expiry and no size limit.
//!
//! Anything that fails to parse is reported as a miss and logged at `debug`;
//! cache corruption never reaches the caller as an error.
//!
//! Storage and time are injected through the [`CacheBackend`] and [`Clock`]
//! traits. [`FileBackend`] replaces files atomically (write to a temporary
//! file, then rename); [`MemoryBackend`] and [`FixedClock`] exist for tests.
//! There is no inter-process locking: the last writer wins.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::error::{Error, Result};

/// Expiry and size policy applied to a cached payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Valid while `now - timestamp <= max_age` (seconds).
    Ttl { max_age: u64 },
    /// A list capped at `bound` entries, oldest evicted first.
    FifoBounded { bound: usize },
    /// Never expires.
    Unbounded,
}

/// A value that can be stored in the cache.
///
/// Payloads read with a TTL policy must report the Unix time they were
/// written at; payloads without a timestamp are always expired under TTL.
pub trait CachePayload: Serialize + DeserializeOwned {
    /// Unix time (seconds) at which the payload was written.
    fn timestamp(&self) -> Option<f64> {
        None
    }
}

impl<T: Serialize + DeserializeOwned> CachePayload for Vec<T> {}

/// Raw storage for cache documents, keyed by name.
pub trait CacheBackend: Send + Sync {
    /// Read a document. Missing or unreadable documents are `None`.
    fn read(&self, key: &str) -> Option<String>;

    /// Replace a document in full.
    fn write(&self, key: &str, contents: &str) -> Result<()>;

    /// Remove a document. Removing a missing document is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// Where the document for `key` lives, for display purposes.
    fn location(&self, key: &str) -> String;
}

/// Source of the current Unix time.
pub trait Clock: Send + Sync {
    /// Seconds since the Unix epoch.
    fn now(&self) -> u64;
}

/// The system wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct FixedClock {
    now: AtomicU64,
}

impl FixedClock {
    pub fn new(now: u64) -> Self {
        Self {
            now: AtomicU64::new(now),
        }
    }

    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: u64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> u64 {
        (**self).now()
    }
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl CacheBackend for FileBackend {
    fn read(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn write(&self, key: &str, contents: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(contents.as_bytes())?;
        tmp.flush()?;
        tmp.persist(self.path_for(key))
            .map_err(|e| Error::Cache {
                message: format!("failed to replace cache file for '{}': {}", key, e.error),
            })?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn location(&self, key: &str) -> String {
        self.path_for(key).display().to_string()
    }
}

/// In-memory backend used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    documents: Mutex<BTreeMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheBackend for MemoryBackend {
    fn read(&self, key: &str) -> Option<String> {
        self.documents.lock().ok()?.get(key).cloned()
    }

    fn write(&self, key: &str, contents: &str) -> Result<()> {
        let mut documents = self.documents.lock().map_err(|_| Error::Cache {
            message: "Cache lock poisoned".to_string(),
        })?;
        documents.insert(key.to_string(), contents.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut documents = self.documents.lock().map_err(|_| Error::Cache {
            message: "Cache lock poisoned".to_string(),
        })?;
        documents.remove(key);
        Ok(())
    }

    fn location(&self, key: &str) -> String {
        format!("memory:{}", key)
    }
}

/// Typed access to cache documents.
///
/// Callers always receive owned copies of stored payloads.
pub struct CacheStore {
    backend: Box<dyn CacheBackend>,
    clock: Box<dyn Clock>,
}

impl CacheStore {
    /// Creates a store backed by files in `dir`, using the system clock.
    pub fn on_disk(dir: impl Into<PathBuf>) -> Self {
        Self::with_parts(Box::new(FileBackend::new(dir)), Box::new(SystemClock))
    }

    /// Creates a store with custom backend and clock implementations.
    pub fn with_parts(backend: Box<dyn CacheBackend>, clock: Box<dyn Clock>) -> Self {
        Self { backend, clock }
    }

    /// Current Unix time according to the store's clock.
    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    /// Reads a payload, applying `policy`.
    ///
    /// Returns `None` when the document is missing, malformed, or expired.
    pub fn get<T: CachePayload>(&self, key: &str, policy: CachePolicy) -> Option<T> {
        let raw = self.backend.read(key)?;
        let payload: T = match serde_json::from_str(&raw) {
            Ok(payload) => payload,
            Err(e) => {
                debug!("ignoring malformed cache '{}': {}", key, e);
                return None;
            }
        };

        match policy {
            CachePolicy::Ttl { max_age } => {
                let written = payload.timestamp()?;
                let age = self.now() as f64 - written;
                if age > max_age as f64 {
                    debug!("cache '{}' expired ({:.0}s old, max {}s)", key, age, max_age);
                    None
                } else {
                    Some(payload)
                }
            }
            CachePolicy::FifoBounded { .. } | CachePolicy::Unbounded => Some(payload),
        }
    }

    /// Replaces the document for `key`.
    pub fn put<T: Serialize>(&self, key: &str, payload: &T) -> Result<()> {
        let contents = serde_json::to_string_pretty(payload)?;
        self.backend.write(key, &contents)
    }

    /// Inserts `item` at the front of the list stored under `key` and keeps
    /// at most `bound` entries.
    ///
    /// A missing or malformed list is treated as empty.
    pub fn append_bounded<T>(&self, key: &str, item: T, bound: usize) -> Result<()>
    where
        T: Serialize + DeserializeOwned,
    {
        let mut items: Vec<T> = self
            .get(key, CachePolicy::FifoBounded { bound })
            .unwrap_or_default();
        items.insert(0, item);
        items.truncate(bound);
        self.put(key, &items)
    }

    /// Removes the document for `key`.
    pub fn invalidate(&self, key: &str) -> Result<()> {
        self.backend.remove(key)
    }

    /// Reads the raw JSON document for `key`, without any policy.
    pub fn raw(&self, key: &str) -> Option<serde_json::Value> {
        let raw = self.backend.read(key)?;
        serde_json::from_str(&raw).ok()
    }

    /// Where the document for `key` is stored.
    pub fn location(&self, key: &str) -> String {
        self.backend.location(key)
    }
}
