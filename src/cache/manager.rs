//! Cache manager for persisting schedule snapshots to disk
//!
//! Provides a `CacheManager` that stores serializable data to JSON files
//! stamped with the time they were written. Entries older than the TTL, and
//! entries that no longer parse, are treated as absent and removed.

use chrono::{DateTime, Duration, Local, Utc};
use directories::ProjectDirs;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use super::CacheKey;

/// Application name used for the platform cache directory
pub const APP_NAME: &str = "lhu-calendar";

/// Default time-to-live for cache entries, in hours
pub const DEFAULT_TTL_HOURS: u32 = 24;

/// Extension of every cache file
const CACHE_EXTENSION: &str = "json";

/// Wrapper struct for cached data stored on disk
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry<T> {
    /// When the data was cached (local clock)
    timestamp: DateTime<Local>,
    /// The cached data
    data: T,
}

/// What a cache file turned out to hold
enum Lookup<T> {
    Missing,
    Fresh(T),
    Expired,
    Corrupt,
}

/// Manages reading and writing cached data to disk
///
/// The cache manager stores data as JSON files in an XDG-compliant cache
/// directory (`~/.cache/lhu-calendar/` on Linux), one file per [`CacheKey`].
/// Cache problems never surface as errors: unreadable or stale entries read as
/// absent, and failed writes are logged and dropped.
#[derive(Debug, Clone)]
pub struct CacheManager {
    /// Directory where cache files are stored
    cache_dir: PathBuf,
    /// Maximum age of a usable entry
    ttl: Duration,
}

impl CacheManager {
    /// Creates a new CacheManager using the XDG-compliant cache directory
    ///
    /// Returns `None` if the cache directory cannot be determined (e.g., no
    /// home directory).
    pub fn new(ttl_hours: u32) -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", APP_NAME)?;
        let cache_dir = project_dirs.cache_dir().to_path_buf();
        Some(Self::with_dir(cache_dir, ttl_hours))
    }

    /// Creates a new CacheManager with a custom cache directory
    pub fn with_dir(cache_dir: PathBuf, ttl_hours: u32) -> Self {
        Self {
            cache_dir,
            ttl: Duration::hours(i64::from(ttl_hours)),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the path of the cache file for the given key
    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.cache_dir.join(format!("{}.{}", key.as_str(), CACHE_EXTENSION))
    }

    /// Ensures the cache directory exists
    fn ensure_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.cache_dir)
    }

    fn is_expired(&self, timestamp: DateTime<Local>) -> bool {
        Local::now().signed_duration_since(timestamp) > self.ttl
    }

    fn inspect<T: DeserializeOwned>(&self, path: &Path) -> Lookup<T> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Lookup::Missing,
            Err(_) => return Lookup::Corrupt,
        };

        match serde_json::from_str::<CacheEntry<T>>(&content) {
            Ok(entry) if self.is_expired(entry.timestamp) => Lookup::Expired,
            Ok(entry) => Lookup::Fresh(entry.data),
            Err(_) => Lookup::Corrupt,
        }
    }

    /// Deletes a cache file, returning whether it was actually removed
    fn discard(&self, path: &Path) -> bool {
        match fs::remove_file(path) {
            Ok(()) => true,
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to remove cache file");
                false
            }
        }
    }

    /// Reads the snapshot stored for a query
    ///
    /// # Returns
    /// * `Some(T)` if a fresh entry exists and parses as `T`
    /// * `None` if there is no entry, it is older than the TTL, or it cannot
    ///   be parsed; in the last two cases the file is deleted
    pub fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        subject: &str,
        query_time: DateTime<Utc>,
        day_range: u32,
    ) -> Option<T> {
        let key = CacheKey::derive(endpoint, subject, query_time, day_range);
        let path = self.entry_path(&key);

        match self.inspect(&path) {
            Lookup::Fresh(data) => {
                debug!(%key, "cache hit");
                Some(data)
            }
            Lookup::Missing => {
                debug!(%key, "cache miss");
                None
            }
            Lookup::Expired => {
                debug!(%key, "cache entry expired");
                self.discard(&path);
                None
            }
            Lookup::Corrupt => {
                debug!(%key, "cache entry unreadable");
                self.discard(&path);
                None
            }
        }
    }

    /// Stores a snapshot for a query, replacing any previous one
    ///
    /// The entry is stamped with the current time. Failures are logged and
    /// otherwise ignored.
    pub fn set<T: Serialize>(
        &self,
        endpoint: &str,
        subject: &str,
        query_time: DateTime<Utc>,
        day_range: u32,
        payload: &T,
    ) {
        let key = CacheKey::derive(endpoint, subject, query_time, day_range);
        match self.write_entry(&key, payload, Local::now()) {
            Ok(()) => debug!(%key, "cache entry written"),
            Err(e) => warn!(%key, error = %e, "failed to write cache entry"),
        }
    }

    /// Writes an entry through a temporary file renamed into place, so a
    /// reader sees either the previous snapshot or the new one
    fn write_entry<T: Serialize>(
        &self,
        key: &CacheKey,
        payload: &T,
        timestamp: DateTime<Local>,
    ) -> io::Result<()> {
        self.ensure_dir()?;

        let entry = CacheEntry {
            timestamp,
            data: payload,
        };
        let json = serde_json::to_string_pretty(&entry)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut file = NamedTempFile::new_in(&self.cache_dir)?;
        file.write_all(json.as_bytes())?;
        file.persist(self.entry_path(key)).map_err(|e| e.error)?;
        Ok(())
    }

    /// Removes every expired cache file and every file whose payload does
    /// not parse as `T`
    ///
    /// # Returns
    /// The number of files removed. A missing or unreadable cache directory
    /// counts as nothing to remove.
    pub fn clear_expired<T: DeserializeOwned>(&self) -> usize {
        let dir = match fs::read_dir(&self.cache_dir) {
            Ok(dir) => dir,
            Err(_) => return 0,
        };

        let mut removed = 0;
        for path in dir.filter_map(|entry| entry.ok()).map(|entry| entry.path()) {
            let is_cache_file = path.is_file()
                && path.extension().and_then(|ext| ext.to_str()) == Some(CACHE_EXTENSION);
            if !is_cache_file {
                continue;
            }

            match self.inspect::<T>(&path) {
                Lookup::Expired | Lookup::Corrupt => {
                    if self.discard(&path) {
                        removed += 1;
                    }
                }
                Lookup::Fresh(_) | Lookup::Missing => {}
            }
        }

        info!(removed, "cleared expired cache entries");
        removed
    }
}
