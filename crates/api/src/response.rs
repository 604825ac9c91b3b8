//! The `{code, msg, ...}` envelope shared by every endpoint.

use auth::{AuthError, Rejection};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use petserver_core::StatusPolicy;
use serde::Serialize;
use tracing::error;

pub const CODE_SUCCESS: u8 = 0;
pub const CODE_FAILURE: u8 = 1;

/// Response body: `code` 0 means success whatever the HTTP status
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub code: u8,
    pub msg: String,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: CODE_SUCCESS,
            msg: "success".to_string(),
            data,
        }
    }
}

/// Envelope payload with no extra fields
#[derive(Debug, Serialize)]
pub struct Empty {}

/// A failed request, rendered as `{code: 1, msg}`
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub msg: String,
}

impl ApiError {
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            msg: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, Rejection::NoSession.to_string())
    }

    /// Translate an auth failure under the configured status policy
    pub fn from_auth(err: &AuthError, policy: StatusPolicy) -> Self {
        match err {
            AuthError::Validation(msg) => Self::bad_request(msg.clone()),
            AuthError::Conflict(msg) => match policy {
                StatusPolicy::Legacy => Self::new(StatusCode::OK, msg.clone()),
                StatusPolicy::Normalized => Self::new(StatusCode::CONFLICT, msg.clone()),
            },
            AuthError::Unauthorized(Rejection::WrongPassword)
                if policy == StatusPolicy::Legacy =>
            {
                Self::bad_request(Rejection::WrongPassword.to_string())
            }
            AuthError::Unauthorized(_) | AuthError::TokenExpired | AuthError::InvalidToken => {
                Self::unauthorized()
            }
            server_side => {
                error!("request failed: {}", server_side);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, server_side.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Envelope {
            code: CODE_FAILURE,
            msg: self.msg,
            data: Empty {},
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_mapping() {
        let policy = StatusPolicy::Legacy;

        let conflict = ApiError::from_auth(&AuthError::Conflict("username already exists".into()), policy);
        assert_eq!(conflict.status, StatusCode::OK);

        let wrong = ApiError::from_auth(&AuthError::Unauthorized(Rejection::WrongPassword), policy);
        assert_eq!(wrong.status, StatusCode::BAD_REQUEST);
        assert_eq!(wrong.msg, "password error");

        let unknown = ApiError::from_auth(&AuthError::Unauthorized(Rejection::UnknownUser), policy);
        assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown.msg, "unauthorized");
    }

    #[test]
    fn test_normalized_mapping() {
        let policy = StatusPolicy::Normalized;

        let conflict = ApiError::from_auth(&AuthError::Conflict("username already exists".into()), policy);
        assert_eq!(conflict.status, StatusCode::CONFLICT);

        let wrong = ApiError::from_auth(&AuthError::Unauthorized(Rejection::WrongPassword), policy);
        let unknown = ApiError::from_auth(&AuthError::Unauthorized(Rejection::UnknownUser), policy);
        assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong.msg, unknown.msg);
    }

    #[test]
    fn test_server_side_failures_are_500() {
        for err in [
            AuthError::TokenGenerationError("no key".into()),
            AuthError::CacheUnavailable("down".into()),
            AuthError::HashingError("rng".into()),
            AuthError::DirectoryUnavailable("locked".into()),
            AuthError::VerificationError,
        ] {
            let api_error = ApiError::from_auth(&err, StatusPolicy::Legacy);
            assert_eq!(api_error.status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(api_error.msg, err.to_string());
        }
    }

    #[test]
    fn test_envelope_flattens_payload() {
        #[derive(Serialize)]
        struct Payload {
            username: &'static str,
        }

        let json = serde_json::to_value(Envelope::success(Payload { username: "alice" })).unwrap();
        assert_eq!(json, serde_json::json!({"code": 0, "msg": "success", "username": "alice"}));

        let json = serde_json::to_value(Envelope::success(Empty {})).unwrap();
        assert_eq!(json, serde_json::json!({"code": 0, "msg": "success"}));
    }
}
