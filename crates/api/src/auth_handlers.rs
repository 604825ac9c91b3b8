use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    middleware::{session_token, SessionUser, ACCESS_TOKEN_COOKIE},
    response::{ApiError, Empty, Envelope},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct CreateUserResponse {
    pub username: String,
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub uid: u64,
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub username: String,
    pub uid: u64,
}

/// `Set-Cookie` value carrying a session token
fn session_cookie(token: &str, max_age: i64, secure: bool) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}{}",
        ACCESS_TOKEN_COOKIE,
        token,
        max_age,
        if secure { "; Secure" } else { "" }
    )
}

/// POST /users - Register a new user
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<Json<Envelope<CreateUserResponse>>, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let registration = state
        .auth_service
        .register(&payload.username, &payload.password, payload.email)
        .await
        .map_err(|e| state.reject(e))?;

    Ok(Json(Envelope::success(CreateUserResponse {
        username: registration.username,
        user_id: registration.user_id,
        uid: registration.uid,
        email: registration.email,
    })))
}

/// POST /login - Open a session and hand its token out as a cookie
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let session = state
        .auth_service
        .login(&payload.username, &payload.password)
        .await
        .map_err(|e| state.reject(e))?;

    let cookie = session_cookie(&session.token, session.expires_in_seconds, state.cookie_secure);
    let body = Envelope::success(SessionResponse {
        username: session.username,
        uid: session.uid,
    });

    Ok(([(header::SET_COOKIE, cookie)], Json(body)).into_response())
}

/// POST /logout - Drop the caller's session and clear the cookie
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    if let Some(token) = session_token(&headers) {
        state
            .auth_service
            .logout(&token)
            .await
            .map_err(|e| state.reject(e))?;
    }

    let cookie = session_cookie("", 0, state.cookie_secure);
    Ok(([(header::SET_COOKIE, cookie)], Json(Envelope::success(Empty {}))).into_response())
}

/// GET /session - Identity behind the caller's session
pub async fn current_session(SessionUser(claims): SessionUser) -> Json<Envelope<SessionResponse>> {
    Json(Envelope::success(SessionResponse {
        username: claims.username,
        uid: claims.uid,
    }))
}
