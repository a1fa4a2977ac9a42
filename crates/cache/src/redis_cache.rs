use crate::error::Result;
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use serde::{de::DeserializeOwned, Serialize};

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub url: String,
    /// Prepended to every key, so several apps can share one Redis
    pub key_prefix: String,
    /// Session expiry in seconds
    pub session_ttl: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            key_prefix: "subdomain".to_string(),
            session_ttl: 60 * 60 * 24,
        }
    }
}

impl CacheConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: std::env::var("REDIS_URL").unwrap_or(defaults.url),
            key_prefix: std::env::var("REDIS_KEY_PREFIX").unwrap_or(defaults.key_prefix),
            session_ttl: std::env::var("SESSION_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.session_ttl),
        }
    }
}

#[derive(Clone)]
pub struct Cache {
    manager: ConnectionManager,
    key_prefix: String,
}

impl Cache {
    pub async fn new(config: CacheConfig) -> Result<Self> {
        let client = Client::open(config.url)?;
        let manager = ConnectionManager::new(client).await?;

        Ok(Self {
            manager,
            key_prefix: config.key_prefix,
        })
    }

    fn key(&self, key: &str) -> String {
        if self.key_prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}:{}", self.key_prefix, key)
        }
    }

    /// Set a value in the cache with optional TTL (seconds)
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl_seconds: Option<u64>) -> Result<()> {
        let serialized = serde_json::to_string(value)?;
        let mut conn = self.manager.clone();

        match ttl_seconds {
            Some(ttl) => conn.set_ex::<_, _, ()>(self.key(key), serialized, ttl).await?,
            None => conn.set::<_, _, ()>(self.key(key), serialized).await?,
        }

        Ok(())
    }

    /// Get a value from the cache
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let mut conn = self.manager.clone();
        let value: Option<String> = conn.get(self.key(key)).await?;

        match value {
            Some(s) => Ok(Some(serde_json::from_str(&s)?)),
            None => Ok(None),
        }
    }

    /// Delete a key from the cache
    pub async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.manager.clone();
        conn.del::<_, ()>(self.key(key)).await?;
        Ok(())
    }

    /// Ping Redis to check connection
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.manager.clone();
        redis::cmd("PING").query_async::<()>(&mut conn).await?;
        Ok(())
    }
}

pub fn session_cache_key(session_id: &str) -> String {
    format!("session:{}", session_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cache_key() {
        assert_eq!(session_cache_key("abc"), "session:abc");
    }

    #[tokio::test]
    #[ignore] // Only run with Redis available
    async fn test_set_get_with_prefix() {
        let cache = Cache::new(CacheConfig::from_env()).await.unwrap();
        cache.ping().await.expect("Failed to ping Redis");

        cache.set("test_key", &"test_value", Some(60)).await.unwrap();
        let value: Option<String> = cache.get("test_key").await.unwrap();

        assert_eq!(value, Some("test_value".to_string()));
        cache.delete("test_key").await.unwrap();
    }
}
