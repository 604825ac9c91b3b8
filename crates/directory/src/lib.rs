//! User directory for account records
//!
//! Provides:
//! - Lookup of a user record by username
//! - Creation of new records with storage id and UID assignment
//! - Atomic enforcement of username uniqueness
//!
//! Two backends are available: [`SqliteDirectory`] for durable storage and
//! [`MemoryDirectory`] for tests and throwaway deployments.

pub mod memory;
pub mod model;
pub mod sqlite;

pub use memory::MemoryDirectory;
pub use model::{NewUser, UserRecord};
pub use sqlite::SqliteDirectory;

use async_trait::async_trait;
use rand_core::{OsRng, RngCore};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Username already exists: {0}")]
    DuplicateUsername(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Could not allocate a unique uid after {0} attempts")]
    UidExhausted(usize),

    #[error("Directory task failed: {0}")]
    TaskError(String),
}

pub type Result<T> = std::result::Result<T, DirectoryError>;

/// Durable store of user records, keyed by username.
///
/// `insert` must be atomic with respect to username uniqueness: when two
/// callers race to register the same name, exactly one succeeds and the
/// other receives [`DirectoryError::DuplicateUsername`].
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Find a user by exact (case-sensitive) username.
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>>;

    /// Persist a new user, assigning its storage id and UID.
    ///
    /// Dropping the returned future does not roll the insert back. The
    /// SQLite backend runs it on a blocking thread that finishes regardless.
    async fn insert(&self, user: NewUser) -> Result<UserRecord>;
}

/// Smallest UID handed out by the directory.
pub const UID_MIN: u64 = 100_000_000;
/// Largest UID handed out by the directory.
pub const UID_MAX: u64 = 999_999_999;

const UID_ATTEMPTS: usize = 3;

fn generate_uid() -> u64 {
    UID_MIN + OsRng.next_u64() % (UID_MAX - UID_MIN + 1)
}
