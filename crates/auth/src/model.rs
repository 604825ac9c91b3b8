use directory::UserRecord;
use serde::Serialize;

/// Result of a successful registration
///
/// Carries only public account fields; the password and its hash never
/// leave the directory through this type.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Registration {
    pub username: String,
    pub user_id: i64,
    pub uid: u64,
    pub email: Option<String>,
}

impl From<UserRecord> for Registration {
    fn from(user: UserRecord) -> Self {
        Self {
            username: user.username,
            user_id: user.id,
            uid: user.uid,
            email: user.email,
        }
    }
}

/// A session opened by a successful login
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub uid: u64,
    pub username: String,
    /// Lifetime of both the token and its cache entry
    pub expires_in_seconds: i64,
}
