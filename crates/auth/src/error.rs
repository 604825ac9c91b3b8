use std::fmt;

use directory::DirectoryError;
use thiserror::Error;

/// Why a login or session check was refused
///
/// Every variant is the same failure kind, [`AuthError::Unauthorized`]; the
/// reason only selects the message shown to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    UnknownUser,
    WrongPassword,
    NoSession,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::WrongPassword => f.write_str("password error"),
            Rejection::UnknownUser | Rejection::NoSession => f.write_str("unauthorized"),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(Rejection),

    #[error("Password hashing failed: {0}")]
    HashingError(String),

    #[error("Password verification failed")]
    VerificationError,

    #[error("Token generation failed: {0}")]
    TokenGenerationError(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Session cache unavailable: {0}")]
    CacheUnavailable(String),

    #[error("User directory unavailable: {0}")]
    DirectoryUnavailable(String),
}

impl AuthError {
    /// Whether the failure lies with the server rather than the request.
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            AuthError::HashingError(_)
                | AuthError::VerificationError
                | AuthError::TokenGenerationError(_)
                | AuthError::CacheUnavailable(_)
                | AuthError::DirectoryUnavailable(_)
        )
    }
}

impl From<DirectoryError> for AuthError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::DuplicateUsername(_) => {
                AuthError::Conflict("username already exists".to_string())
            }
            other => AuthError::DirectoryUnavailable(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_messages() {
        assert_eq!(AuthError::Unauthorized(Rejection::UnknownUser).to_string(), "unauthorized");
        assert_eq!(AuthError::Unauthorized(Rejection::WrongPassword).to_string(), "password error");
        assert_eq!(AuthError::Unauthorized(Rejection::NoSession).to_string(), "unauthorized");
    }

    #[test]
    fn test_duplicate_username_becomes_conflict() {
        let err = AuthError::from(DirectoryError::DuplicateUsername("alice".to_string()));
        assert!(matches!(err, AuthError::Conflict(ref msg) if msg == "username already exists"));
        assert!(!err.is_server_error());
    }

    #[test]
    fn test_other_directory_failures_are_server_errors() {
        let err = AuthError::from(DirectoryError::UidExhausted(3));
        assert!(matches!(err, AuthError::DirectoryUnavailable(_)));
        assert!(err.is_server_error());
    }
}
