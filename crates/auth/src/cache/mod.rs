//! Session cache: token → UID with per-entry expiry
//!
//! Expiry is enforced by the backing store itself; nothing here polls for
//! stale entries. Backends:
//! - [`MemorySessionCache`]: moka, in-process, single node
//! - `RedisSessionCache` (feature `redis`): shared across nodes

mod memory;
#[cfg(feature = "redis")]
mod redis;

pub use memory::MemorySessionCache;
#[cfg(feature = "redis")]
pub use self::redis::RedisSessionCache;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

#[async_trait]
pub trait SessionCache: Send + Sync {
    /// Store `token → uid`, replacing any existing entry, expiring after `ttl`.
    async fn set(&self, token: &str, uid: u64, ttl: Duration) -> Result<()>;

    /// UID for a present, unexpired token.
    async fn get(&self, token: &str) -> Result<Option<u64>>;

    /// Invalidate a token. Deleting an absent token is not an error.
    async fn delete(&self, token: &str) -> Result<()>;

    /// Release the backend at shutdown.
    async fn close(&self) -> Result<()>;

    /// Backend name for logs.
    fn name(&self) -> &'static str;
}
