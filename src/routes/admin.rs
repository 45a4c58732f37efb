use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Admin Router Module
///
/// The CMS. `create_router` wraps this whole router in the `admin_gate` route
/// layer: anonymous requests are redirected to `/auth/admin-login` and signed-in
/// users without an `admin_users` row are redirected to `/`.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin
        // Dashboard: the signed-in admin and per-table counts.
        .route("/admin", get(handlers::admin_dashboard))
        // POST /api/admin/media/presigned
        // Short-lived upload URL for a news, activity or gallery image.
        .route("/api/admin/media/presigned", post(handlers::presign_media))
        // GET/POST /api/admin/{kind}
        .route(
            "/api/admin/{kind}",
            get(handlers::admin_list_content).post(handlers::admin_create_content),
        )
        // GET/PUT/DELETE /api/admin/{kind}/{id}
        .route(
            "/api/admin/{kind}/{id}",
            get(handlers::admin_get_content)
                .put(handlers::admin_update_content)
                .delete(handlers::admin_delete_content),
        )
}
