//! Account endpoints without business logic yet. Each answers
//! `{code: 0, msg: "success", message: "<name>"}`.

use axum::Json;
use serde::Serialize;

use crate::response::Envelope;

#[derive(Debug, Serialize)]
pub struct Placeholder {
    pub message: &'static str,
}

type PlaceholderResponse = Json<Envelope<Placeholder>>;

fn placeholder(message: &'static str) -> PlaceholderResponse {
    Json(Envelope::success(Placeholder { message }))
}

/// GET /users
pub async fn get_users() -> PlaceholderResponse {
    placeholder("get_users")
}

/// GET /users/{id}
pub async fn get_user() -> PlaceholderResponse {
    placeholder("get_user")
}

/// PUT /users/{id}
pub async fn update_user() -> PlaceholderResponse {
    placeholder("update_user")
}

/// DELETE /users/{id}
pub async fn delete_user() -> PlaceholderResponse {
    placeholder("delete_user")
}

/// POST /users/{id}/subscribe
pub async fn subscribe_user() -> PlaceholderResponse {
    placeholder("subscribe_user")
}

/// POST /users/{id}/unsubscribe
pub async fn unsubscribe_user() -> PlaceholderResponse {
    placeholder("unsubscribe_user")
}

/// POST /users/{id}/notify
pub async fn notify_user() -> PlaceholderResponse {
    placeholder("notify_user")
}
