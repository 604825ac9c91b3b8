use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::{auth_handlers, middleware as session_middleware, user_handlers, AppState};

pub fn router(state: Arc<AppState>) -> Router {
    // Public routes (no session required)
    let public_routes = Router::new()
        .route("/", get(|| async { "petserver running" }))
        .route(
            "/users",
            get(user_handlers::get_users).post(auth_handlers::create_user),
        )
        .route(
            "/users/{id}",
            get(user_handlers::get_user)
                .put(user_handlers::update_user)
                .delete(user_handlers::delete_user),
        )
        .route("/users/{id}/subscribe", post(user_handlers::subscribe_user))
        .route("/users/{id}/unsubscribe", post(user_handlers::unsubscribe_user))
        .route("/users/{id}/notify", post(user_handlers::notify_user))
        .route("/login", post(auth_handlers::login))
        .route("/logout", post(auth_handlers::logout));

    // Session routes (require a live session)
    let session_routes = Router::new()
        .route("/session", get(auth_handlers::current_session))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware::require_session,
        ));

    Router::new()
        .merge(public_routes)
        .merge(session_routes)
        .with_state(state)
}
