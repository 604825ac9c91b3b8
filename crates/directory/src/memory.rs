//! In-memory user directory.
//!
//! Lookups and inserts share one lock, so the duplicate check and the
//! insert happen as a single step.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::{
    generate_uid, DirectoryError, NewUser, Result, UserDirectory, UserRecord, UID_ATTEMPTS,
};

#[derive(Default)]
struct Users {
    next_id: i64,
    by_username: HashMap<String, UserRecord>,
    uids: HashSet<u64>,
}

/// Volatile user directory; contents are lost when it is dropped.
#[derive(Default)]
pub struct MemoryDirectory {
    users: RwLock<Users>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    pub fn len(&self) -> usize {
        self.users.read().by_username.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        Ok(self.users.read().by_username.get(username).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<UserRecord> {
        let mut users = self.users.write();

        if users.by_username.contains_key(&user.username) {
            return Err(DirectoryError::DuplicateUsername(user.username));
        }

        let uid = (0..UID_ATTEMPTS)
            .map(|_| generate_uid())
            .find(|uid| !users.uids.contains(uid))
            .ok_or(DirectoryError::UidExhausted(UID_ATTEMPTS))?;

        users.next_id += 1;
        let record = UserRecord {
            id: users.next_id,
            uid,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };

        users.uids.insert(uid);
        users
            .by_username
            .insert(record.username.clone(), record.clone());

        Ok(record)
    }
}
