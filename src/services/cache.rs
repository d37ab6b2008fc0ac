use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur with cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// In-process response cache
///
/// Values are stored as serialized JSON so one cache can hold any payload
/// type; entries expire after the configured TTL.
pub struct CacheManager {
    entries: moka::future::Cache<String, Vec<u8>>,
}

impl CacheManager {
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        let entries = moka::future::CacheBuilder::new(capacity)
            .time_to_live(ttl)
            .build();

        Self { entries }
    }

    /// Get a value; `Ok(None)` on a miss
    pub async fn get<T>(&self, key: &str) -> Result<Option<T>, CacheError>
    where
        T: DeserializeOwned,
    {
        match self.entries.get(key).await {
            Some(bytes) => {
                tracing::trace!("Cache hit: {}", key);
                Ok(Some(serde_json::from_slice(&bytes)?))
            }
            None => {
                tracing::trace!("Cache miss: {}", key);
                Ok(None)
            }
        }
    }

    pub async fn set<T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        let bytes = serde_json::to_vec(value)?;
        self.entries.insert(key.to_string(), bytes).await;
        tracing::trace!("Cache set: {}", key);
        Ok(())
    }

    pub async fn delete(&self, key: &str) {
        self.entries.invalidate(key).await;
        tracing::debug!("Cache invalidated: {}", key);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.entry_count(),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: u64,
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    pub fn featured_products() -> String {
        "products:featured".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cache_set_get_delete() {
        let cache = CacheManager::new(100, Duration::from_secs(60));
        let key = CacheKey::featured_products();

        assert_eq!(cache.get::<Vec<String>>(&key).await.unwrap(), None);

        cache.set(&key, &vec!["Tent".to_string()]).await.unwrap();
        let hit: Option<Vec<String>> = cache.get(&key).await.unwrap();
        assert_eq!(hit, Some(vec!["Tent".to_string()]));

        cache.delete(&key).await;
        assert_eq!(cache.get::<Vec<String>>(&key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_type_mismatch_is_serialization_error() {
        let cache = CacheManager::new(10, Duration::from_secs(60));
        cache.set("k", &"text").await.unwrap();
        assert!(cache.get::<Vec<u32>>("k").await.is_err());
    }

    #[test]
    fn test_cache_key_builder() {
        assert_eq!(CacheKey::featured_products(), "products:featured");
    }
}
