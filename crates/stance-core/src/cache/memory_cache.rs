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


//! In-memory cache implementation using moka

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use moka::future::Cache as MokaCache;

use crate::cache::{now_millis, Cache, CacheConfig, CacheStats};
use crate::errors::PipelineResult;

#[derive(Debug, Clone)]
struct CacheEntry {
    data: Vec<u8>,
    expires_at: Option<u64>,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.expires_at.map(|at| now_millis() > at).unwrap_or(false)
    }
}

/// In-memory cache implementation
pub struct MemoryCache {
    cache: MokaCache<String, CacheEntry>,
    config: CacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryCache {
    /// Create a new memory cache
    pub fn new(config: CacheConfig) -> Self {
        let cache = match config.max_size {
            Some(max_size) => MokaCache::builder()
                .weigher(|_key: &String, entry: &CacheEntry| {
                    u32::try_from(entry.data.len()).unwrap_or(u32::MAX)
                })
                .max_capacity(max_size)
                .build(),
            None => MokaCache::new(u64::MAX),
        };

        Self {
            cache,
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> PipelineResult<Option<Vec<u8>>> {
        match self.cache.get(key).await {
            Some(entry) if !entry.is_expired() => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Ok(Some(entry.data))
            }
            Some(_) => {
                self.cache.invalidate(key).await;
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> PipelineResult<()> {
        let entry = CacheEntry {
            data: value,
            expires_at: self
                .config
                .default_ttl
                .map(|ttl| now_millis() + ttl.as_millis() as u64),
        };
        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn clear(&self) -> PipelineResult<()> {
        self.cache.invalidate_all();
        Ok(())
    }

    async fn stats(&self) -> PipelineResult<CacheStats> {
        self.cache.run_pending_tasks().await;
        Ok(CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.cache.entry_count(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_memory_cache_basic_operations() {
        let cache = MemoryCache::new(CacheConfig::memory());

        cache.set("key", b"value".to_vec()).await.unwrap();
        assert_eq!(cache.get("key").await.unwrap(), Some(b"value".to_vec()));

        cache.clear().await.unwrap();
        assert_eq!(cache.get("key").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_cache_ttl() {
        let config = CacheConfig {
            default_ttl: Some(Duration::from_millis(50)),
            ..CacheConfig::memory()
        };
        let cache = MemoryCache::new(config);

        cache.set("ttl_key", b"v".to_vec()).await.unwrap();
        assert!(cache.get("ttl_key").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(cache.get("ttl_key").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_cache_stats() {
        let cache = MemoryCache::new(CacheConfig::memory());

        assert!(cache.get("missing").await.unwrap().is_none());
        cache.set("key", b"value".to_vec()).await.unwrap();
        assert!(cache.get("key").await.unwrap().is_some());

        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
    }
}
