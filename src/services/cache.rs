use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur with cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Cache miss: {0}")]
    CacheMiss(String),
}

/// Multi-tier cache manager
///
/// L1 is an in-process moka cache. L2 is Redis, shared across instances, and
/// optional: without a Redis URL the manager runs on L1 alone.
pub struct CacheManager {
    redis: Option<Arc<tokio::sync::Mutex<ConnectionManager>>>,
    l1_cache: moka::future::Cache<String, Vec<u8>>,
    ttl_secs: u64,
    /// Bumped on every score invalidation
    score_epoch: AtomicU64,
}

impl CacheManager {
    /// Create a cache manager backed by Redis
    pub async fn new(redis_url: &str, l1_size: u64, ttl_secs: u64) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let redis = redis::aio::ConnectionManager::new(client).await?;

        Ok(Self {
            redis: Some(Arc::new(tokio::sync::Mutex::new(redis))),
            l1_cache: Self::build_l1(l1_size, ttl_secs),
            ttl_secs,
            score_epoch: AtomicU64::new(0),
        })
    }

    /// Create an in-process cache without Redis
    pub fn local(l1_size: u64, ttl_secs: u64) -> Self {
        Self {
            redis: None,
            l1_cache: Self::build_l1(l1_size, ttl_secs),
            ttl_secs,
            score_epoch: AtomicU64::new(0),
        }
    }

    fn build_l1(l1_size: u64, ttl_secs: u64) -> moka::future::Cache<String, Vec<u8>> {
        moka::future::CacheBuilder::new(l1_size)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build()
    }

    pub fn has_redis(&self) -> bool {
        self.redis.is_some()
    }

    /// Get a value from cache (L1 first, then L2)
    pub async fn get<T>(&self, key: &str) -> Result<T, CacheError>
    where
        T: for<'de> Deserialize<'de>,
    {
        if let Some(bytes) = self.l1_cache.get(key).await {
            tracing::trace!("L1 cache hit: {}", key);
            return Ok(serde_json::from_slice(&bytes)?);
        }

        if let Some(redis) = &self.redis {
            let mut conn = redis.lock().await;
            let value: Option<String> = redis::cmd("GET")
                .arg(key)
                .query_async(&mut *conn)
                .await?;
            drop(conn);

            if let Some(json) = value {
                tracing::trace!("L2 cache hit: {}", key);

                // Populate L1 cache
                let bytes = json.as_bytes().to_vec();
                self.l1_cache.insert(key.to_string(), bytes).await;

                return Ok(serde_json::from_str(&json)?);
            }
        }

        tracing::trace!("Cache miss: {}", key);
        Err(CacheError::CacheMiss(key.to_string()))
    }

    /// Set a value in cache (both tiers)
    pub async fn set<T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        let json = serde_json::to_string(value)?;

        self.l1_cache
            .insert(key.to_string(), json.as_bytes().to_vec())
            .await;

        if let Some(redis) = &self.redis {
            let mut conn = redis.lock().await;
            let _: () = redis::cmd("SETEX")
                .arg(key)
                .arg(self.ttl_secs)
                .arg(json)
                .query_async(&mut *conn)
                .await?;
        }

        tracing::trace!("Cache set: {}", key);
        Ok(())
    }

    /// Delete a value from both cache tiers
    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.l1_cache.invalidate(key).await;
        if let Some(redis) = &self.redis {
            let mut conn = redis.lock().await;
            let _: () = redis::cmd("DEL")
                .arg(key)
                .query_async(&mut *conn)
                .await?;
        }
        Ok(())
    }

    /// Invalidate all cache entries matching a pattern
    pub async fn invalidate_pattern(&self, pattern: &str) -> Result<(), CacheError> {
        // L1 has no pattern lookup; clear it entirely
        self.l1_cache.invalidate_all();

        if let Some(redis) = &self.redis {
            let mut conn = redis.lock().await;
            let keys: Vec<String> = redis::cmd("KEYS")
                .arg(pattern)
                .query_async(&mut *conn)
                .await?;

            if !keys.is_empty() {
                let _: () = redis::cmd("DEL")
                    .arg(keys)
                    .query_async(&mut *conn)
                    .await?;
            }
        }

        tracing::debug!("Invalidated cache pattern: {}", pattern);
        Ok(())
    }

    /// Drop every cached score after responses or participants change
    pub async fn invalidate_scores(&self) {
        self.score_epoch.fetch_add(1, Ordering::AcqRel);
        if let Err(e) = self.invalidate_pattern(CacheKey::SCORE_PATTERN).await {
            tracing::warn!("Failed to invalidate cached scores: {}", e);
        }
    }

    /// Current score epoch; read it before computing a score to cache
    pub fn score_epoch(&self) -> u64 {
        self.score_epoch.load(Ordering::Acquire)
    }

    /// Cache a score computed during `epoch`
    ///
    /// Returns false and leaves nothing cached when scores were invalidated
    /// since `epoch` was read.
    pub async fn set_score<T>(&self, key: &str, value: &T, epoch: u64) -> Result<bool, CacheError>
    where
        T: Serialize,
    {
        if self.score_epoch() != epoch {
            tracing::debug!("Skipping stale score write: {}", key);
            return Ok(false);
        }

        self.set(key, value).await?;

        // An invalidation may have run while the write was in flight
        if self.score_epoch() != epoch {
            self.delete(key).await?;
            tracing::debug!("Dropped score written across an invalidation: {}", key);
            return Ok(false);
        }

        Ok(true)
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            l1_size: self.l1_cache.entry_count(),
            redis_enabled: self.has_redis(),
            ttl_secs: self.ttl_secs,
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub l1_size: u64,
    pub redis_enabled: bool,
    pub ttl_secs: u64,
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Matches every score key
    pub const SCORE_PATTERN: &'static str = "score*";

    /// Key for the full mentee x mentor score matrix under a scoring version
    pub fn score_matrix(version: &str) -> String {
        format!("scores:{}:matrix", version)
    }

    /// Key for a single pair score under a scoring version
    pub fn pair_score(version: &str, mentee_response_id: i64, mentor_response_id: i64) -> String {
        format!("score:{}:{}:{}", version, mentee_response_id, mentor_response_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "Requires Redis"]
    async fn test_cache_set_get() {
        let cache = CacheManager::new("redis://127.0.0.1:6379", 1000, 60)
            .await
            .expect("Failed to create cache");

        let key = "test_key";
        let value = "test_value";

        cache.set(key, &value).await.unwrap();
        let result: String = cache.get(key).await.unwrap();
        assert_eq!(result, value);

        cache.delete(key).await.unwrap();
        assert!(cache.get::<String>(key).await.is_err());
    }

    #[tokio::test]
    async fn test_local_cache_set_get_delete() {
        let cache = CacheManager::local(100, 60);
        assert!(!cache.has_redis());

        let key = CacheKey::pair_score("v1", 1, 2);
        cache.set(&key, &4.5_f64).await.unwrap();
        let score: f64 = cache.get(&key).await.unwrap();
        assert_eq!(score, 4.5);

        cache.delete(&key).await.unwrap();
        assert!(matches!(cache.get::<f64>(&key).await, Err(CacheError::CacheMiss(_))));
    }

    #[tokio::test]
    async fn test_local_invalidate_scores() {
        let cache = CacheManager::local(100, 60);
        let key = CacheKey::score_matrix("v1");
        cache.set(&key, &vec![1, 2, 3]).await.unwrap();

        cache.invalidate_scores().await;

        assert!(cache.get::<Vec<i32>>(&key).await.is_err());
    }

    #[tokio::test]
    async fn test_score_written_after_invalidation_is_dropped() {
        let cache = CacheManager::local(100, 60);
        let key = CacheKey::score_matrix("v1");

        let epoch = cache.score_epoch();
        // A participant is removed while the matrix is being computed
        cache.invalidate_scores().await;

        assert!(!cache.set_score(&key, &vec![1, 2, 3], epoch).await.unwrap());
        assert!(cache.get::<Vec<i32>>(&key).await.is_err());

        let epoch = cache.score_epoch();
        assert!(cache.set_score(&key, &vec![4, 5], epoch).await.unwrap());
        assert_eq!(cache.get::<Vec<i32>>(&key).await.unwrap(), vec![4, 5]);
    }

    #[test]
    fn test_cache_key_builder() {
        assert_eq!(CacheKey::score_matrix("ab12"), "scores:ab12:matrix");
        assert_eq!(CacheKey::pair_score("ab12", 3, 7), "score:ab12:3:7");
        assert!(CacheKey::score_matrix("x").starts_with("score"));
    }
}
