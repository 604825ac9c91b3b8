pub mod config;

pub use config::{
    ApiConfig, AppConfig, AuthConfig, CacheBackend, CacheConfig, DatabaseConfig, LogConfig,
    ServerConfig, StatusPolicy,
};
