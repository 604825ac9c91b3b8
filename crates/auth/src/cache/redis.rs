//! Redis-backed session cache
//!
//! Keys are `session:<token>` holding the UID, written with `SETEX` so Redis
//! evicts them on its own.

use std::time::Duration;

use async_trait::async_trait;
use redis::{aio::MultiplexedConnection, Client};
use tokio::time::timeout;
use tracing::{info, warn};

use super::SessionCache;
use crate::error::{AuthError, Result};

pub struct RedisSessionCache {
    conn: MultiplexedConnection,
}

impl RedisSessionCache {
    /// Connect to Redis and verify the connection with `PING`
    ///
    /// # Arguments
    /// * `url` - Redis connection URL (e.g., "redis://localhost:6379")
    /// * `connect_timeout` - Upper bound on establishing the connection
    pub async fn connect(url: &str, connect_timeout: Duration) -> Result<Self> {
        info!("initializing redis session cache");

        let client = Client::open(url)
            .map_err(|e| AuthError::CacheUnavailable(format!("invalid redis url: {}", e)))?;

        let mut conn = timeout(connect_timeout, client.get_multiplexed_async_connection())
            .await
            .map_err(|_| {
                AuthError::CacheUnavailable(format!(
                    "redis connection timed out after {:?}",
                    connect_timeout
                ))
            })?
            .map_err(|e| AuthError::CacheUnavailable(format!("redis connect failed: {}", e)))?;

        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| AuthError::CacheUnavailable(format!("redis ping failed: {}", e)))?;

        if pong != "PONG" {
            return Err(AuthError::CacheUnavailable(
                "redis ping did not return pong".to_string(),
            ));
        }

        Ok(Self { conn })
    }

    fn key(token: &str) -> String {
        format!("session:{}", token)
    }
}

#[async_trait]
impl SessionCache for RedisSessionCache {
    async fn set(&self, token: &str, uid: u64, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();

        // SETEX rejects a zero expiry
        redis::cmd("SETEX")
            .arg(Self::key(token))
            .arg(ttl.as_secs().max(1))
            .arg(uid)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| {
                warn!("redis SETEX failed: {}", e);
                AuthError::CacheUnavailable(format!("redis set failed: {}", e))
            })
    }

    async fn get(&self, token: &str) -> Result<Option<u64>> {
        let mut conn = self.conn.clone();

        let uid: Option<u64> = redis::cmd("GET")
            .arg(Self::key(token))
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                warn!("redis GET failed: {}", e);
                AuthError::CacheUnavailable(format!("redis get failed: {}", e))
            })?;

        Ok(uid)
    }

    async fn delete(&self, token: &str) -> Result<()> {
        let mut conn = self.conn.clone();

        redis::cmd("DEL")
            .arg(Self::key(token))
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| {
                warn!("redis DEL failed: {}", e);
                AuthError::CacheUnavailable(format!("redis delete failed: {}", e))
            })
    }

    async fn close(&self) -> Result<()> {
        // The multiplexed connection closes when the last clone is dropped.
        info!("closing redis session cache");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_namespaced() {
        assert_eq!(RedisSessionCache::key("abc.def.ghi"), "session:abc.def.ghi");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_cache_unavailable() {
        let result =
            RedisSessionCache::connect("redis://127.0.0.1:1", Duration::from_millis(500)).await;
        assert!(matches!(result, Err(AuthError::CacheUnavailable(_))));
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected() {
        let result = RedisSessionCache::connect("not a url", Duration::from_millis(500)).await;
        assert!(matches!(result, Err(AuthError::CacheUnavailable(_))));
    }

    /// Needs a live server: `REDIS_URL=redis://... cargo test --features redis -- --ignored`
    #[tokio::test]
    #[ignore]
    async fn test_live_session_roundtrip() {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into());
        let cache = RedisSessionCache::connect(&url, Duration::from_secs(2)).await.unwrap();
        let token = format!("test-{}", uuid::Uuid::new_v4());

        cache.set(&token, 123_456_789, Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get(&token).await.unwrap(), Some(123_456_789));

        let mut conn = cache.conn.clone();
        let ttl: i64 = redis::cmd("TTL")
            .arg(format!("session:{}", token))
            .query_async(&mut conn)
            .await
            .unwrap();
        assert!(ttl > 0 && ttl <= 60);

        cache.delete(&token).await.unwrap();
        assert_eq!(cache.get(&token).await.unwrap(), None);
    }
}
