/*
Copyright 2024, Zep Software, Inc.

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/


//! Persistent disk cache implementation using sled

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sled::Db;
use tracing::debug;

use crate::cache::{now_millis, Cache, CacheConfig, CacheStats};
use crate::errors::{PipelineError, PipelineResult};

const DEFAULT_CACHE_DIR: &str = "./llm_cache";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    data: Vec<u8>,
    expires_at: Option<u64>,
    created_at: u64,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.expires_at.map(|at| now_millis() > at).unwrap_or(false)
    }

    fn to_bytes(&self) -> PipelineResult<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| PipelineError::Cache(format!("Failed to serialize cache entry: {}", e)))
    }

    fn from_bytes(bytes: &[u8]) -> PipelineResult<Self> {
        bincode::deserialize(bytes)
            .map_err(|e| PipelineError::Cache(format!("Failed to deserialize cache entry: {}", e)))
    }
}

/// Persistent disk cache implementation
pub struct DiskCache {
    db: Db,
    config: CacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl DiskCache {
    /// Open (or create) the cache directory
    pub fn new(config: CacheConfig) -> PipelineResult<Self> {
        let cache_dir = config
            .cache_dir
            .clone()
            .unwrap_or_else(|| DEFAULT_CACHE_DIR.to_string());
        let db = sled::open(&cache_dir)?;
        debug!("Opened completion cache at {}", cache_dir);

        Ok(Self {
            db,
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }
}

#[async_trait]
impl Cache for DiskCache {
    async fn get(&self, key: &str) -> PipelineResult<Option<Vec<u8>>> {
        let Some(bytes) = self.db.get(key)? else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return Ok(None);
        };

        let entry = CacheEntry::from_bytes(&bytes)?;
        if entry.is_expired() {
            self.db.remove(key)?;
            self.misses.fetch_add(1, Ordering::Relaxed);
            return Ok(None);
        }

        self.hits.fetch_add(1, Ordering::Relaxed);
        Ok(Some(entry.data))
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> PipelineResult<()> {
        let created_at = now_millis();
        let entry = CacheEntry {
            data: value,
            expires_at: self
                .config
                .default_ttl
                .map(|ttl| created_at + ttl.as_millis() as u64),
            created_at,
        };
        self.db.insert(key, entry.to_bytes()?)?;
        self.db.flush_async().await?;
        Ok(())
    }

    async fn clear(&self) -> PipelineResult<()> {
        self.db.clear()?;
        self.db.flush_async().await?;
        Ok(())
    }

    async fn stats(&self) -> PipelineResult<CacheStats> {
        Ok(CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.db.len() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_disk_cache_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache").to_string_lossy().to_string();

        {
            let cache = DiskCache::new(CacheConfig::disk(path.clone())).unwrap();
            cache.set("key", b"persisted".to_vec()).await.unwrap();
        }

        let reopened = DiskCache::new(CacheConfig::disk(path)).unwrap();
        assert_eq!(
            reopened.get("key").await.unwrap(),
            Some(b"persisted".to_vec())
        );
    }

    #[tokio::test]
    async fn test_disk_cache_clear() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache").to_string_lossy().to_string();
        let cache = DiskCache::new(CacheConfig::disk(path)).unwrap();

        cache.set("a", vec![1]).await.unwrap();
        cache.set("b", vec![2]).await.unwrap();
        assert_eq!(cache.stats().await.unwrap().entries, 2);

        cache.clear().await.unwrap();
        assert_eq!(cache.get("a").await.unwrap(), None);
        assert_eq!(cache.stats().await.unwrap().entries, 0);
    }
}
