use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Unauthenticated, read-only endpoints. Every content response is shaped by
/// the request's `LocaleContext` (`?lang=`, then the `lang` cookie, then `en`).
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness check for the load balancer.
        .route("/health", get(|| async { "ok" }))
        // GET /api/i18n
        // Interface dictionary for the active locale.
        .route("/api/i18n", get(handlers::get_i18n))
        // POST /api/locale/toggle
        // Flips between English and Arabic and persists the choice in a cookie.
        .route("/api/locale/toggle", post(handlers::toggle_locale))
        // GET /api/{news|activities|gallery}
        .route("/api/{kind}", get(handlers::list_content))
        // GET /api/{news|activities|gallery}/{id}
        .route("/api/{kind}/{id}", get(handlers::get_content))
}
