use axum::{
    extract::{FromRequestParts, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use std::sync::Arc;
use tracing::debug;

use crate::{response::ApiError, AppState};
use auth::Claims;

/// Name of the HTTP-only cookie carrying the session token
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Session token from the `access_token` cookie, falling back to an
/// `Authorization: Bearer` header
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(ACCESS_TOKEN_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Middleware to require a live session
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = session_token(request.headers()).ok_or_else(ApiError::unauthorized)?;

    let claims = state.auth_service.authenticate(&token).await.map_err(|e| {
        debug!("session check failed: {}", e);
        state.reject(e)
    })?;

    // Store claims in request extensions for handlers to access
    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

/// Extractor for the authenticated session
/// Use this in handlers that are protected by [`require_session`]
#[derive(Debug, Clone)]
pub struct SessionUser(pub Claims);

impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(SessionUser)
            .ok_or_else(ApiError::unauthorized)
    }
}
