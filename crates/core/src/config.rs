use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// SQLite file, or `:memory:` for a throwaway directory
    #[serde(default = "default_database_path")]
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    #[serde(default = "default_token_expiry")]
    pub token_expiry_seconds: i64,
    /// Mark the session cookie `Secure` (HTTPS only)
    #[serde(default)]
    pub cookie_secure: bool,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Memory,
    Redis,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackend,
    #[serde(default = "default_cache_url")]
    pub url: String,
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
    /// Upper bound on every cache and directory call
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// How failures map onto HTTP status codes
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StatusPolicy {
    /// The established client contract: duplicate usernames answer 200 and
    /// a wrong password answers 400 "password error".
    #[default]
    Legacy,
    /// One status per failure kind: 409 for conflicts, 401 "unauthorized"
    /// for every rejected login.
    Normalized,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ApiConfig {
    #[serde(default)]
    pub status_policy: StatusPolicy,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_token_expiry() -> i64 {
    3600 // 1 hour
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_database_path() -> String {
    "petserver.db".to_string()
}

fn default_cache_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_max_entries() -> u64 {
    100_000
}

fn default_timeout_ms() -> u64 {
    2000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            url: default_cache_url(),
            max_entries: default_max_entries(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Environment variable for every configuration key, paired with the key
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("PETSERVER_SERVER__HOST", "server.host"),
    ("PETSERVER_SERVER__PORT", "server.port"),
    ("PETSERVER_DATABASE__PATH", "database.path"),
    ("PETSERVER_AUTH__JWT_SECRET", "auth.jwt_secret"),
    ("PETSERVER_AUTH__TOKEN_EXPIRY_SECONDS", "auth.token_expiry_seconds"),
    ("PETSERVER_AUTH__COOKIE_SECURE", "auth.cookie_secure"),
    ("PETSERVER_CACHE__BACKEND", "cache.backend"),
    ("PETSERVER_CACHE__URL", "cache.url"),
    ("PETSERVER_CACHE__MAX_ENTRIES", "cache.max_entries"),
    ("PETSERVER_CACHE__TIMEOUT_MS", "cache.timeout_ms"),
    ("PETSERVER_API__STATUS_POLICY", "api.status_policy"),
    ("PETSERVER_LOG__LEVEL", "log.level"),
];

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()?;

        let app_config: Self = config.try_deserialize()?;
        app_config.validate()?;
        Ok(app_config)
    }

    /// Load configuration with environment variable overrides
    /// Environment variables are prefixed with PETSERVER_ and use `__`
    /// between nested keys.
    /// Example: PETSERVER_DATABASE__PATH, PETSERVER_AUTH__JWT_SECRET
    ///
    /// Returns the config and a list of environment variable overrides
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<(Self, Vec<String>), ConfigError> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(
                Environment::with_prefix("PETSERVER")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        // Detect which values were overridden by environment
        let overrides = ENV_OVERRIDES
            .iter()
            .filter(|(env_var, _)| std::env::var(env_var).is_ok())
            .map(|(_, config_key)| config_key.to_string())
            .collect();

        let app_config: Self = config.try_deserialize()?;
        app_config.validate()?;
        Ok((app_config, overrides))
    }

    /// Reject settings the server cannot start with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.is_empty() {
            return Err(ConfigError::Message("auth.jwt_secret must not be empty".to_string()));
        }
        if self.auth.token_expiry_seconds <= 0 {
            return Err(ConfigError::Message(
                "auth.token_expiry_seconds must be positive".to_string(),
            ));
        }
        if self.cache.timeout_ms == 0 {
            return Err(ConfigError::Message("cache.timeout_ms must be positive".to_string()));
        }
        if self.cache.max_entries == 0 {
            return Err(ConfigError::Message("cache.max_entries must be positive".to_string()));
        }
        Ok(())
    }
}
