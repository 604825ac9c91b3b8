//! Builds the application state from configuration.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use api::AppState;
use auth::{AuthService, MemorySessionCache, SessionCache, TokenIssuer};
use directory::{SqliteDirectory, UserDirectory};
use petserver_core::{AppConfig, CacheBackend, CacheConfig};
use tracing::info;

pub fn open_directory(path: &str) -> Result<Arc<dyn UserDirectory>> {
    let directory = if path == ":memory:" {
        SqliteDirectory::open_in_memory()
    } else {
        SqliteDirectory::open(path)
    }
    .with_context(|| format!("failed to open user directory at {}", path))?;

    info!(path, "user directory ready");
    Ok(Arc::new(directory))
}

pub async fn open_session_cache(config: &CacheConfig) -> Result<Arc<dyn SessionCache>> {
    match config.backend {
        CacheBackend::Memory => Ok(Arc::new(MemorySessionCache::new(config.max_entries))),
        CacheBackend::Redis => connect_redis(config).await,
    }
}

#[cfg(feature = "redis")]
async fn connect_redis(config: &CacheConfig) -> Result<Arc<dyn SessionCache>> {
    let cache = auth::RedisSessionCache::connect(
        &config.url,
        Duration::from_millis(config.timeout_ms),
    )
    .await
    .context("failed to connect session cache")?;
    Ok(Arc::new(cache))
}

#[cfg(not(feature = "redis"))]
async fn connect_redis(_config: &CacheConfig) -> Result<Arc<dyn SessionCache>> {
    anyhow::bail!("cache.backend = \"redis\" requires building with the `redis` feature")
}

/// Wire directory, session cache and token issuer into the shared state
pub async fn build_state(config: &AppConfig) -> Result<Arc<AppState>> {
    let directory = open_directory(&config.database.path)?;
    let sessions = open_session_cache(&config.cache).await?;
    let issuer = TokenIssuer::new(&config.auth.jwt_secret, config.auth.token_expiry_seconds)
        .context("failed to create token issuer")?;

    let auth_service = AuthService::new(directory, sessions, issuer)
        .with_io_timeout(Duration::from_millis(config.cache.timeout_ms));

    Ok(Arc::new(AppState::new(
        auth_service,
        config.api.status_policy,
        config.auth.cookie_secure,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn config(backend: &str) -> AppConfig {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            "[database]\npath = \":memory:\"\n\
             [auth]\njwt_secret = \"s\"\n\
             [cache]\nbackend = \"{backend}\"\nurl = \"redis://127.0.0.1:1\"\ntimeout_ms = 200\n"
        )
        .unwrap();
        AppConfig::from_file(file.path()).unwrap()
    }

    #[tokio::test]
    async fn test_build_state_with_memory_backends() {
        let state = build_state(&config("memory")).await.unwrap();

        let registration = state
            .auth_service
            .register("alice", "pw123", None)
            .await
            .unwrap();
        let session = state.auth_service.login("alice", "pw123").await.unwrap();
        assert_eq!(session.uid, registration.uid);

        state.auth_service.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_redis_fails_startup() {
        assert!(build_state(&config("redis")).await.is_err());
    }
}
