// Core modules
mod error;
mod jwt;
mod password;

pub mod cache;
pub mod model;
pub mod service;

// Re-export error types
pub use error::{AuthError, Rejection, Result};

// Re-export crypto primitives
pub use jwt::{Claims, TokenIssuer};
pub use password::{hash_password, verify_password};

pub use cache::{MemorySessionCache, SessionCache};
#[cfg(feature = "redis")]
pub use cache::RedisSessionCache;
pub use model::{Registration, Session};
pub use service::AuthService;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        AuthError, AuthService, Claims, MemorySessionCache, Registration, Rejection, Result,
        Session, SessionCache, TokenIssuer,
    };
}
