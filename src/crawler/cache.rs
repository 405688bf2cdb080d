//! On-disk response cache
//!
//! Successful responses are stored under the cache directory as a pair of
//! files named by the SHA-256 of the request URL:
//! - `<key>.toml` - metadata (URL, final URL, status, content type, timestamp)
//! - `<key>.body` - raw body bytes
//!
//! The metadata file is written last, so its presence marks a complete entry.
//! Usage is counted once when the cache opens and then tracked in memory.
//! When a write pushes it over the byte budget, entries are evicted oldest
//! `stored_at` first until it fits again.

use crate::crawler::fetcher::FetchResult;
use crate::CrawlError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::sync::Mutex;
use url::Url;

const META_EXT: &str = "toml";
const BODY_EXT: &str = "body";

/// Metadata stored next to each cached body
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    url: String,
    final_url: String,
    status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content_type: Option<String>,
    body_len: u64,
    stored_at: DateTime<Utc>,
}

/// Size-bounded response cache rooted at a directory
#[derive(Debug)]
pub struct ResponseCache {
    dir: PathBuf,
    max_bytes: u64,
    usage: AtomicU64,
    evict_lock: Mutex<()>,
}

impl ResponseCache {
    /// Opens (creating if needed) a cache directory
    pub async fn open(dir: impl AsRef<Path>, max_bytes: u64) -> Result<Self, CrawlError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).await?;

        let cache = Self {
            dir,
            max_bytes,
            usage: AtomicU64::new(0),
            evict_lock: Mutex::new(()),
        };
        let existing: u64 = cache.scan().await?.iter().map(|e| e.size).sum();
        cache.usage.store(existing, Ordering::SeqCst);
        tracing::debug!(
            "Response cache at {} ({} of {} bytes used)",
            cache.dir.display(),
            existing,
            max_bytes
        );

        if existing > max_bytes {
            cache.evict().await?;
        }
        Ok(cache)
    }

    /// The directory this cache lives in
    pub fn directory(&self) -> &Path {
        &self.dir
    }

    /// Looks up a cached response for a request URL
    ///
    /// Returns `Ok(None)` on a miss, including half-written or mismatched entries.
    pub async fn get(&self, url: &Url) -> Result<Option<FetchResult>, CrawlError> {
        let key = cache_key(url);

        let meta = match read_optional_string(&self.meta_path(&key)).await? {
            Some(meta) => meta,
            None => return Ok(None),
        };
        let entry: CacheEntry = toml::from_str(&meta)
            .map_err(|e| CrawlError::Cache(format!("corrupt entry {}: {}", key, e)))?;

        if entry.url != url.as_str() {
            return Ok(None);
        }

        let body = match read_optional_bytes(&self.body_path(&key)).await? {
            Some(body) if body.len() as u64 == entry.body_len => body,
            _ => return Ok(None),
        };

        let final_url = Url::parse(&entry.final_url)?;
        tracing::trace!("Cache hit for {}", url);

        Ok(Some(FetchResult {
            final_url,
            status_code: entry.status_code,
            content_type: entry.content_type,
            body: Some(body),
            from_cache: true,
        }))
    }

    /// Stores a response; only 200 HTML responses with a body are cached
    ///
    /// Returns whether the response was stored.
    pub async fn put(&self, url: &Url, result: &FetchResult) -> Result<bool, CrawlError> {
        let body = match &result.body {
            Some(body) if result.status_code == 200 && result.is_html() => body,
            _ => return Ok(false),
        };

        let key = cache_key(url);
        let replaced = self.entry_size(&key).await?;
        let entry = CacheEntry {
            url: url.to_string(),
            final_url: result.final_url.to_string(),
            status_code: result.status_code,
            content_type: result.content_type.clone(),
            body_len: body.len() as u64,
            stored_at: Utc::now(),
        };
        let meta = toml::to_string(&entry)
            .map_err(|e| CrawlError::Cache(format!("cannot encode entry {}: {}", key, e)))?;

        let size = meta.len() as u64 + entry.body_len;

        fs::write(self.body_path(&key), body).await?;
        fs::write(self.meta_path(&key), meta).await?;

        self.usage.fetch_add(size, Ordering::SeqCst);
        if let Some(old) = replaced {
            self.release(old);
        }
        if self.usage() > self.max_bytes {
            self.evict().await?;
        }
        Ok(true)
    }

    /// Bytes held by complete entries, as tracked since the cache was opened
    pub fn usage(&self) -> u64 {
        self.usage.load(Ordering::SeqCst)
    }

    /// Number of complete entries in the cache
    pub async fn len(&self) -> Result<usize, CrawlError> {
        Ok(self.scan().await?.len())
    }

    /// Returns true if the cache holds no complete entries
    pub async fn is_empty(&self) -> Result<bool, CrawlError> {
        Ok(self.len().await? == 0)
    }

    /// Removes the oldest entries until usage fits `max_bytes`
    async fn evict(&self) -> Result<(), CrawlError> {
        let _guard = self.evict_lock.lock().await;

        // Another writer may have evicted while this one waited
        if self.usage() <= self.max_bytes {
            return Ok(());
        }

        let mut entries = self.scan().await?;
        entries.sort_by_key(|e| e.stored_at);
        for entry in entries {
            if self.usage() <= self.max_bytes {
                break;
            }
            remove_if_present(&self.meta_path(&entry.key)).await?;
            remove_if_present(&self.body_path(&entry.key)).await?;
            self.release(entry.size);
            tracing::debug!("Evicted cached response {}", entry.url);
        }

        Ok(())
    }

    /// Size of the complete entry stored under `key`, if any
    async fn entry_size(&self, key: &str) -> Result<Option<u64>, CrawlError> {
        let meta = match read_optional_string(&self.meta_path(key)).await? {
            Some(meta) => meta,
            None => return Ok(None),
        };
        Ok(toml::from_str::<CacheEntry>(&meta)
            .ok()
            .map(|entry| meta.len() as u64 + entry.body_len))
    }

    fn release(&self, size: u64) {
        let _ = self
            .usage
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| {
                Some(used.saturating_sub(size))
            });
    }

    /// Lists complete entries with their on-disk size
    async fn scan(&self) -> Result<Vec<ScannedEntry>, CrawlError> {
        let mut entries = Vec::new();
        let mut dir = fs::read_dir(&self.dir).await?;

        while let Some(item) = dir.next_entry().await? {
            let path = item.path();
            if path.extension().and_then(|e| e.to_str()) != Some(META_EXT) {
                continue;
            }
            let key = match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) => stem.to_string(),
                None => continue,
            };

            // Entries may vanish under a concurrent eviction
            let meta = match read_optional_string(&path).await? {
                Some(meta) => meta,
                None => continue,
            };
            let entry: CacheEntry = match toml::from_str(&meta) {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping corrupt cache entry {}: {}", key, e);
                    continue;
                }
            };

            entries.push(ScannedEntry {
                size: meta.len() as u64 + entry.body_len,
                url: entry.url,
                stored_at: entry.stored_at,
                key,
            });
        }

        Ok(entries)
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", key, META_EXT))
    }

    fn body_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", key, BODY_EXT))
    }
}

struct ScannedEntry {
    key: String,
    url: String,
    size: u64,
    stored_at: DateTime<Utc>,
}

/// Hex-encoded SHA-256 of the request URL
fn cache_key(url: &Url) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_str().as_bytes());
    hex::encode(hasher.finalize())
}

async fn read_optional_string(path: &Path) -> Result<Option<String>, CrawlError> {
    match fs::read_to_string(path).await {
        Ok(s) => Ok(Some(s)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn read_optional_bytes(path: &Path) -> Result<Option<Vec<u8>>, CrawlError> {
    match fs::read(path).await {
        Ok(b) => Ok(Some(b)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn remove_if_present(path: &Path) -> Result<(), CrawlError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
