use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use directory::{NewUser, UserDirectory, UserRecord};
use tracing::{debug, info, warn};

use crate::{
    cache::SessionCache,
    error::{AuthError, Rejection, Result},
    jwt::{Claims, TokenIssuer},
    model::{Registration, Session},
    password::{hash_password, verify_password},
};

/// Default upper bound on a single directory or cache call
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(2);

/// Authentication service: the only component that talks to the user
/// directory, the credential hasher, the token issuer and the session cache
pub struct AuthService {
    directory: Arc<dyn UserDirectory>,
    sessions: Arc<dyn SessionCache>,
    issuer: TokenIssuer,
    io_timeout: Duration,
}

impl AuthService {
    /// Create a new AuthService
    ///
    /// # Arguments
    /// * `directory` - Store of user records
    /// * `sessions` - Session cache written at login and read by session checks
    /// * `issuer` - Token issuer holding the signing secret and token lifetime
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        sessions: Arc<dyn SessionCache>,
        issuer: TokenIssuer,
    ) -> Self {
        Self {
            directory,
            sessions,
            issuer,
            io_timeout: DEFAULT_IO_TIMEOUT,
        }
    }

    /// Bound every directory and cache call by `io_timeout`
    pub fn with_io_timeout(mut self, io_timeout: Duration) -> Self {
        self.io_timeout = io_timeout;
        self
    }

    /// Register a new user
    ///
    /// # Arguments
    /// * `username` - Unique, case-sensitive, non-empty username
    /// * `password` - Plain text password (will be hashed)
    /// * `email` - Optional email, stored as given
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        email: Option<String>,
    ) -> Result<Registration> {
        if username.is_empty() {
            return Err(AuthError::Validation("username is required".to_string()));
        }

        if self.find_user(username).await?.is_some() {
            return Err(AuthError::Conflict("username already exists".to_string()));
        }

        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AuthError::HashingError(e.to_string()))??;

        // A concurrent registration may win between the lookup and this
        // insert; the directory reports it as a duplicate.
        let user = self
            .directory_call(
                self.directory
                    .insert(NewUser::new(username.to_string(), email, password_hash)),
            )
            .await?;

        info!(uid = user.uid, username = %user.username, "registered user");
        Ok(Registration::from(user))
    }

    /// Check credentials, issue a token and record the session
    pub async fn login(&self, username: &str, password: &str) -> Result<Session> {
        if username.is_empty() {
            return Err(AuthError::Unauthorized(Rejection::UnknownUser));
        }

        let user = match self.find_user(username).await? {
            Some(user) => user,
            None => {
                debug!(username, "login for unknown user");
                return Err(AuthError::Unauthorized(Rejection::UnknownUser));
            }
        };

        let password = password.to_string();
        let password_hash = user.password_hash.clone();
        let verified =
            tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
                .await
                .map_err(|_| AuthError::VerificationError)??;

        if !verified {
            debug!(uid = user.uid, "login with wrong password");
            return Err(AuthError::Unauthorized(Rejection::WrongPassword));
        }

        let token = self.issuer.issue(user.uid, &user.username)?;
        let expires_in_seconds = self.issuer.expires_in_seconds();
        let ttl = Duration::from_secs(expires_in_seconds.max(0) as u64);

        self.cache_call(self.sessions.set(&token, user.uid, ttl)).await?;

        info!(uid = user.uid, "opened session");
        Ok(Session {
            token,
            uid: user.uid,
            username: user.username,
            expires_in_seconds,
        })
    }

    /// Resolve a token to its claims
    ///
    /// The token must carry a valid signature, must not be expired, and must
    /// still have a live session cache entry for the same UID.
    pub async fn authenticate(&self, token: &str) -> Result<Claims> {
        let claims = self.issuer.verify(token)?;

        match self.cache_call(self.sessions.get(token)).await? {
            Some(uid) if uid == claims.uid => Ok(claims),
            Some(uid) => {
                warn!(token_uid = claims.uid, cached_uid = uid, "session uid mismatch");
                Err(AuthError::InvalidToken)
            }
            None => Err(AuthError::Unauthorized(Rejection::NoSession)),
        }
    }

    /// Invalidate the session behind `token`
    ///
    /// Logging out twice, or with an unknown token, succeeds.
    pub async fn logout(&self, token: &str) -> Result<()> {
        self.cache_call(self.sessions.delete(token)).await?;
        info!("closed session");
        Ok(())
    }

    /// Release the session cache
    pub async fn shutdown(&self) -> Result<()> {
        info!(backend = self.sessions.name(), "closing session cache");
        self.sessions.close().await
    }

    async fn find_user(&self, username: &str) -> Result<Option<UserRecord>> {
        self.directory_call(self.directory.find_by_username(username))
            .await
    }

    /// A timed-out call is abandoned, not cancelled: a backend that runs the
    /// write on a blocking thread may still commit it. A registration that
    /// reported `DirectoryUnavailable` can therefore leave the account behind.
    async fn directory_call<T, F>(&self, call: F) -> Result<T>
    where
        F: Future<Output = directory::Result<T>>,
    {
        match tokio::time::timeout(self.io_timeout, call).await {
            Ok(result) => result.map_err(AuthError::from),
            Err(_) => Err(AuthError::DirectoryUnavailable(format!(
                "timed out after {:?}",
                self.io_timeout
            ))),
        }
    }

    async fn cache_call<T, F>(&self, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.io_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(AuthError::CacheUnavailable(format!(
                "timed out after {:?}",
                self.io_timeout
            ))),
        }
    }
}
