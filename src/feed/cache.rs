//! Session-scoped feed cache
//!
//! Widget-style callers recompute every derived table on each input change,
//! so the expensive step is re-parsing the source. This cache memoizes the
//! loader's output in a plain map owned by the session. Keys are SHA256
//! hashes over the source identity plus the schema fingerprint; loading the
//! same file under a different column mapping is a distinct entry.
//!
//! Keys built with [`SourceKey::for_file`] hash the file's contents, so
//! editing the source naturally invalidates its entry. Identifier keys are
//! for sources without local bytes (an API page already in memory).

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{FeedError, Result};
use crate::feed::loader::LoadReport;
use crate::feed::schema::FeedSchema;
use crate::models::ActivityFeed;

/// Cache key derived from a source and the schema used to read it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceKey {
    hash: String,
}

impl SourceKey {
    /// Key a file source by content hash, so a changed file misses
    pub fn for_file(path: &Path, schema: &FeedSchema) -> Result<Self> {
        let mut file = File::open(path).map_err(|e| FeedError::UnreadableSource {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut hasher = Sha256::new();
        let mut buffer = [0u8; 8192];
        loop {
            let bytes_read = file.read(&mut buffer).map_err(|e| FeedError::UnreadableSource {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }
        hasher.update(schema.fingerprint().as_bytes());

        Ok(SourceKey {
            hash: format!("{:x}", hasher.finalize()),
        })
    }

    /// Key an in-memory source by its identifier string
    pub fn for_identifier(identifier: &str, schema: &FeedSchema) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(identifier.as_bytes());
        hasher.update(schema.fingerprint().as_bytes());
        SourceKey {
            hash: format!("{:x}", hasher.finalize()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.hash
    }
}

/// A cached load: the cleaned feed plus its drop accounting
#[derive(Debug, Clone)]
pub struct CachedFeed {
    pub feed: ActivityFeed,
    pub report: LoadReport,
    pub cached_at: DateTime<Utc>,
}

/// Cache hit/miss accounting
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheMetrics {
    pub lookups: u64,
    pub hits: u64,
    pub misses: u64,
    pub invalidations: u64,
}

impl CacheMetrics {
    /// Hit rate as a percentage
    pub fn hit_rate(&self) -> f64 {
        if self.lookups == 0 {
            return 0.0;
        }
        (self.hits as f64 / self.lookups as f64) * 100.0
    }
}

/// Explicit feed cache: a plain mapping from source key to loaded feed
///
/// Single-threaded by design, like the rest of the pipeline; lookups take
/// `&mut self` only to keep the metrics honest.
#[derive(Debug, Default)]
pub struct FeedCache {
    entries: HashMap<String, CachedFeed>,
    metrics: CacheMetrics,
}

impl FeedCache {
    pub fn new() -> Self {
        FeedCache::default()
    }

    pub fn get(&mut self, key: &SourceKey) -> Option<&CachedFeed> {
        self.metrics.lookups += 1;
        match self.entries.get(key.as_str()) {
            Some(entry) => {
                self.metrics.hits += 1;
                debug!(key = key.as_str(), "feed cache hit");
                Some(entry)
            }
            None => {
                self.metrics.misses += 1;
                debug!(key = key.as_str(), "feed cache miss");
                None
            }
        }
    }

    pub fn put(&mut self, key: SourceKey, feed: ActivityFeed, report: LoadReport) {
        self.entries.insert(
            key.hash,
            CachedFeed {
                feed,
                report,
                cached_at: Utc::now(),
            },
        );
    }

    /// Drop the entry for one source, if present
    pub fn invalidate(&mut self, key: &SourceKey) {
        if self.entries.remove(key.as_str()).is_some() {
            self.metrics.invalidations += 1;
            debug!(key = key.as_str(), "feed cache entry invalidated");
        }
    }

    pub fn clear(&mut self) {
        self.metrics.invalidations += self.entries.len() as u64;
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }
}
