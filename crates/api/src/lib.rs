pub mod auth_handlers;
pub mod middleware;
pub mod response;
pub mod router;
pub mod state;
pub mod user_handlers;

pub use router::router;
pub use state::AppState;
