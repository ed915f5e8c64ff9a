//! Disk-backed cache store with lazy TTL expiration

use crate::cache::config::{parse_ttl, CacheConfig};
use crate::cache::key::CacheKey;
use crate::error::{Result, SparqlError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Counters for cache effectiveness monitoring
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    /// Lookups answered from a fresh record
    pub hits: u64,

    /// Lookups with no usable record
    pub misses: u64,

    /// Records discarded because they outlived the TTL
    pub expired: u64,

    /// Records written
    pub stores: u64,
}

impl CacheStats {
    /// Cache hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CacheStats {{ hits: {}, misses: {}, hit_rate: {:.2}%, expired: {}, stores: {} }}",
            self.hits,
            self.misses,
            self.hit_rate(),
            self.expired,
            self.stores
        )
    }
}

/// Persistent cache: one durable record per key under a root directory
///
/// Freshness is judged from each record file's own modification time. A
/// lookup that finds a record older than the TTL deletes it and reports a
/// miss; there is no background sweep. Concurrent misses on the same key may
/// each compute and write a record - the last writer wins.
pub struct DiskCache {
    root: PathBuf,
    ttl: RwLock<Duration>,
    stats: RwLock<CacheStats>,
}

impl DiskCache {
    /// Create a cache rooted at the configured directory, creating it if needed
    pub fn new(config: CacheConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.root_dir).map_err(|e| {
            SparqlError::StorageError(format!(
                "cannot create cache directory {}: {}",
                config.root_dir.display(),
                e
            ))
        })?;

        info!(
            "Cache initialized at {} (ttl: {:?})",
            config.root_dir.display(),
            config.ttl
        );

        Ok(Self {
            root: config.root_dir,
            ttl: RwLock::new(config.ttl),
            stats: RwLock::new(CacheStats::default()),
        })
    }

    /// The root directory records are stored under
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The current TTL
    pub async fn expiration(&self) -> Duration {
        *self.ttl.read().await
    }

    /// Change the TTL from a duration string
    ///
    /// Affects only future lookups; already stored records are never
    /// retroactively rewritten.
    pub async fn set_expiration(&self, ttl: &str) -> Result<()> {
        let parsed = parse_ttl(ttl)?;
        *self.ttl.write().await = parsed;
        info!("Cache TTL set to {:?}", parsed);
        Ok(())
    }

    /// Look up a record
    ///
    /// # Returns
    /// * `Ok(Some(value))` - a fresh record exists
    /// * `Ok(None)` - no record, or the record outlived the TTL (in which
    ///   case it has been deleted)
    pub async fn get(&self, key: &CacheKey) -> Result<Option<String>> {
        let path = self.record_path(key);
        let ttl = *self.ttl.read().await;

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Cache miss: {}", key);
                self.stats.write().await.misses += 1;
                return Ok(None);
            }
            Err(e) => return Err(storage_error(&path, e)),
        };

        if is_expired(&metadata, ttl) {
            debug!("Cache record expired: {}", key);
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                // a concurrent lookup already removed it
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(storage_error(&path, e)),
            }
            let mut stats = self.stats.write().await;
            stats.expired += 1;
            stats.misses += 1;
            return Ok(None);
        }

        match tokio::fs::read_to_string(&path).await {
            Ok(value) => {
                debug!("Cache hit: {}", key);
                self.stats.write().await.hits += 1;
                Ok(Some(value))
            }
            // removed between the freshness check and the read
            Err(e) if e.kind() == ErrorKind::NotFound => {
                self.stats.write().await.misses += 1;
                Ok(None)
            }
            Err(e) => Err(storage_error(&path, e)),
        }
    }

    /// Store a record
    ///
    /// The write goes to a temporary file first and is moved into place with
    /// a rename, so a concurrent lookup never observes a half-written record.
    pub async fn put(&self, key: &CacheKey, value: &str) -> Result<()> {
        let path = self.record_path(key);
        let tmp = path.with_extension(format!("tmp-{:08x}", rand::random::<u32>()));

        tokio::fs::write(&tmp, value)
            .await
            .map_err(|e| storage_error(&tmp, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| storage_error(&path, e))?;

        debug!("Cache store: {}", key);
        self.stats.write().await.stores += 1;
        Ok(())
    }

    /// Look up a typed record
    pub async fn get_json<T: DeserializeOwned>(&self, key: &CacheKey) -> Result<Option<T>> {
        match self.get(key).await? {
            None => Ok(None),
            Some(value) => {
                let typed = serde_json::from_str(&value).map_err(|e| {
                    SparqlError::SerializationError(format!(
                        "cached record for {} is unreadable: {}",
                        key, e
                    ))
                })?;
                Ok(Some(typed))
            }
        }
    }

    /// Store a typed record
    pub async fn put_json<T: Serialize>(&self, key: &CacheKey, value: &T) -> Result<()> {
        let serialized = serde_json::to_string(value)
            .map_err(|e| SparqlError::SerializationError(e.to_string()))?;
        self.put(key, &serialized).await
    }

    /// Memoize an async computation under a key
    ///
    /// On a hit the stored value is returned and the computation never runs.
    /// On a miss the computation runs exactly once and its result is stored
    /// before being returned. A failing computation stores nothing.
    ///
    /// # Example
    /// ```no_run
    /// use cicerone_sparql::cache::{CacheConfig, CacheKeyBuilder, DiskCache};
    ///
    /// # async fn example() -> anyhow::Result<()> {
    /// let cache = DiskCache::new(CacheConfig::new(".cache", "1h")?)?;
    /// let key = CacheKeyBuilder::new("label").arg("subject", "urn:x").build();
    ///
    /// let label: String = cache
    ///     .get_or_compute(&key, || async { Ok("Mona Lisa".to_string()) })
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn get_or_compute<T, F, Fut>(&self, key: &CacheKey, compute: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(cached) = self.get_json(key).await? {
            return Ok(cached);
        }

        let value = compute().await?;
        self.put_json(key, &value).await?;
        Ok(value)
    }

    /// Remove one record
    ///
    /// # Returns
    /// `Ok(true)` if a record was deleted, `Ok(false)` if none existed
    pub async fn remove(&self, key: &CacheKey) -> Result<bool> {
        let path = self.record_path(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(storage_error(&path, e)),
        }
    }

    /// Delete all records older than the current TTL
    ///
    /// Lazy expiration never reclaims storage for keys that are not looked up
    /// again; this walks the whole root directory instead.
    ///
    /// # Returns
    /// The number of records deleted
    pub async fn purge_expired(&self) -> Result<usize> {
        let ttl = *self.ttl.read().await;
        let mut removed = 0;

        let mut dir = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| storage_error(&self.root, e))?;

        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| storage_error(&self.root, e))?
        {
            let path = entry.path();
            if !is_record_file(&path) {
                continue;
            }
            let Ok(metadata) = entry.metadata().await else {
                continue;
            };
            if is_expired(&metadata, ttl) && tokio::fs::remove_file(&path).await.is_ok() {
                removed += 1;
            }
        }

        info!("Purged {} expired cache records", removed);
        Ok(removed)
    }

    /// Delete every record, including leftover temporary files
    ///
    /// # Returns
    /// The number of files deleted
    pub async fn clear(&self) -> Result<usize> {
        let mut removed = 0;

        let mut dir = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| storage_error(&self.root, e))?;

        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| storage_error(&self.root, e))?
        {
            let path = entry.path();
            if !is_record_file(&path) && !is_temp_file(&path) {
                continue;
            }
            if tokio::fs::remove_file(&path).await.is_ok() {
                removed += 1;
            }
        }

        info!("Cleared {} files from cache", removed);
        Ok(removed)
    }

    /// Snapshot of the cache counters
    pub async fn stats(&self) -> CacheStats {
        self.stats.read().await.clone()
    }

    fn record_path(&self, key: &CacheKey) -> PathBuf {
        self.root.join(format!("{}.json", key.digest()))
    }
}

fn is_record_file(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some("json")
}

fn is_temp_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.starts_with("tmp-"))
        .unwrap_or(false)
}

fn is_expired(metadata: &std::fs::Metadata, ttl: Duration) -> bool {
    match metadata
        .modified()
        .ok()
        .and_then(|modified| modified.elapsed().ok())
    {
        Some(age) => age > ttl,
        // mtime unavailable or in the future: treat as fresh
        None => false,
    }
}

fn storage_error(path: &Path, e: std::io::Error) -> SparqlError {
    SparqlError::StorageError(format!("{}: {}", path.display(), e))
}
