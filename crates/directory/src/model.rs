use chrono::{DateTime, Utc};
use serde::Serialize;

/// A stored user account
///
/// `password_hash` always holds the output of the credential hasher. It is
/// skipped during serialization so a record can never leak it.
#[derive(Debug, Clone, Serialize)]
pub struct UserRecord {
    pub id: i64,
    pub uid: u64,
    pub username: String,
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied by the caller when creating a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
}

impl NewUser {
    pub fn new(username: String, email: Option<String>, password_hash: String) -> Self {
        Self {
            username,
            email,
            password_hash,
        }
    }
}
