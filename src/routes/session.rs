use crate::{AppState, handlers};
use axum::{Router, routing::post};

/// Session Router Module
///
/// The only endpoints that write the `accessToken`/`refreshToken` cookies.
pub fn session_routes() -> Router<AppState> {
    Router::new()
        // POST /api/auth/login
        // Verifies credentials and sets both cookies. 400 / 401 / 500 on failure.
        .route("/api/auth/login", post(handlers::login))
        // POST /api/auth/logout
        // Clears both cookies unconditionally.
        .route("/api/auth/logout", post(handlers::logout))
}
