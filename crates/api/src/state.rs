use auth::{AuthError, AuthService};
use petserver_core::StatusPolicy;

use crate::response::ApiError;

/// Application state shared across all handlers
pub struct AppState {
    pub auth_service: AuthService,
    pub status_policy: StatusPolicy,
    /// Add `Secure` to the session cookie
    pub cookie_secure: bool,
}

impl AppState {
    pub fn new(auth_service: AuthService, status_policy: StatusPolicy, cookie_secure: bool) -> Self {
        Self {
            auth_service,
            status_policy,
            cookie_secure,
        }
    }

    /// Render an auth failure under this state's status policy
    pub fn reject(&self, err: AuthError) -> ApiError {
        ApiError::from_auth(&err, self.status_policy)
    }
}
