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


//! Caching layer for completion responses
//!
//! Re-running a stage over the same rows repeats the same requests; a cache in
//! front of the completion service makes those re-runs cheap. Both an
//! in-memory and a persistent backend are available.

pub mod disk_cache;
pub mod memory_cache;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::PipelineResult;

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Default TTL for cache entries; `None` keeps entries forever
    pub default_ttl: Option<Duration>,
    /// Maximum cache size in bytes (memory cache)
    pub max_size: Option<u64>,
    /// Cache directory (disk cache)
    pub cache_dir: Option<String>,
    /// Whether to use the persistent backend
    pub persistent: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: None,
            max_size: Some(1024 * 1024 * 100), // 100MB
            cache_dir: Some("./llm_cache".to_string()),
            persistent: true,
        }
    }
}

impl CacheConfig {
    /// Non-persistent configuration
    pub fn memory() -> Self {
        Self {
            cache_dir: None,
            persistent: false,
            ..Self::default()
        }
    }

    /// Persistent configuration rooted at `dir`
    pub fn disk(dir: impl Into<String>) -> Self {
        Self {
            cache_dir: Some(dir.into()),
            persistent: true,
            ..Self::default()
        }
    }

    /// Build the backend this configuration describes
    pub fn build(self) -> PipelineResult<Arc<dyn Cache>> {
        if self.persistent && self.cache_dir.is_some() {
            Ok(Arc::new(disk_cache::DiskCache::new(self)?))
        } else {
            Ok(Arc::new(memory_cache::MemoryCache::new(self)))
        }
    }
}

/// Trait for cache implementations
#[async_trait]
pub trait Cache: Send + Sync {
    /// Get a value from the cache
    async fn get(&self, key: &str) -> PipelineResult<Option<Vec<u8>>>;

    /// Set a value in the cache with the default TTL
    async fn set(&self, key: &str, value: Vec<u8>) -> PipelineResult<()>;

    /// Clear all cache entries
    async fn clear(&self) -> PipelineResult<()>;

    /// Get cache statistics
    async fn stats(&self) -> PipelineResult<CacheStats>;
}

/// Cache statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Generate a cache key from components
pub fn generate_cache_key(components: &[&str]) -> String {
    use sha2::{Digest, Sha256};

    let combined = components.join("|");
    let mut hasher = Sha256::new();
    hasher.update(combined.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub(crate) fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_cache_key() {
        let key1 = generate_cache_key(&["test", "key", "1"]);
        let key2 = generate_cache_key(&["test", "key", "2"]);
        let key3 = generate_cache_key(&["test", "key", "1"]);

        assert_ne!(key1, key2);
        assert_eq!(key1, key3);
        assert_eq!(key1.len(), 64);
    }

    #[test]
    fn test_cache_stats_hit_rate() {
        let stats = CacheStats {
            hits: 80,
            misses: 20,
            entries: 50,
        };
        assert_eq!(stats.hit_rate(), 0.8);
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }

    #[test]
    fn test_memory_constructor_is_not_persistent() {
        let config = CacheConfig::memory();
        assert!(!config.persistent);
        assert!(config.cache_dir.is_none());
    }
}
