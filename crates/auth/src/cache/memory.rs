use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use tracing::info;

use super::SessionCache;
use crate::error::Result;

#[derive(Debug, Clone, Copy)]
struct Entry {
    uid: u64,
    ttl: Duration,
}

/// Expires each entry after the TTL it was stored with.
struct EntryTtl;

impl Expiry<String, Entry> for EntryTtl {
    fn expire_after_create(&self, _key: &String, entry: &Entry, _created_at: Instant) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// In-process session cache backed by moka
pub struct MemorySessionCache {
    sessions: Cache<String, Entry>,
}

impl MemorySessionCache {
    /// Create a cache holding at most `max_entries` sessions
    pub fn new(max_entries: u64) -> Self {
        info!(max_entries, "initializing in-memory session cache");

        let sessions = Cache::builder()
            .max_capacity(max_entries)
            .expire_after(EntryTtl)
            .build();

        Self { sessions }
    }
}

#[async_trait]
impl SessionCache for MemorySessionCache {
    async fn set(&self, token: &str, uid: u64, ttl: Duration) -> Result<()> {
        self.sessions.insert(token.to_string(), Entry { uid, ttl }).await;
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<Option<u64>> {
        Ok(self.sessions.get(token).await.map(|entry| entry.uid))
    }

    async fn delete(&self, token: &str) -> Result<()> {
        self.sessions.invalidate(token).await;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.sessions.invalidate_all();
        self.sessions.run_pending_tasks().await;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_then_get() {
        let cache = MemorySessionCache::new(100);
        cache.set("token-a", 7, Duration::from_secs(3600)).await.unwrap();

        assert_eq!(cache.get("token-a").await.unwrap(), Some(7));
        assert_eq!(cache.get("token-b").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let cache = MemorySessionCache::new(100);
        cache.set("token", 1, Duration::from_secs(3600)).await.unwrap();
        cache.set("token", 2, Duration::from_secs(3600)).await.unwrap();

        assert_eq!(cache.get("token").await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_entry_expires_after_its_ttl() {
        let cache = MemorySessionCache::new(100);
        cache.set("short", 1, Duration::from_millis(200)).await.unwrap();
        cache.set("long", 2, Duration::from_secs(3600)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(400)).await;

        assert_eq!(cache.get("short").await.unwrap(), None);
        assert_eq!(cache.get("long").await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = MemorySessionCache::new(100);
        cache.set("token", 1, Duration::from_secs(3600)).await.unwrap();

        cache.delete("token").await.unwrap();
        assert_eq!(cache.get("token").await.unwrap(), None);

        // absent token
        cache.delete("token").await.unwrap();
    }

    #[tokio::test]
    async fn test_close_drops_all_sessions() {
        let cache = MemorySessionCache::new(100);
        cache.set("a", 1, Duration::from_secs(3600)).await.unwrap();
        cache.set("b", 2, Duration::from_secs(3600)).await.unwrap();

        cache.close().await.unwrap();

        assert_eq!(cache.get("a").await.unwrap(), None);
        assert_eq!(cache.get("b").await.unwrap(), None);
    }
}
