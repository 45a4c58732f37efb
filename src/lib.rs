use axum::{
    Router,
    extract::FromRef,
    http::{HeaderName, HeaderValue, Method, header},
    middleware,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod gate;
pub mod handlers;
pub mod locale;
pub mod models;
pub mod repository;
pub mod session;
pub mod storage;

// Routing segregated by access level (public, session, admin).
pub mod routes;
use routes::{admin, public, session as session_routes};

// --- Public Re-exports ---

pub use auth::{AuthProvider, AuthProviderState, LocalAuthProvider, MockAuthProvider, SupabaseAuthProvider};
pub use config::AppConfig;
pub use repository::{PostgresRepository, RepositoryState};
pub use session::SessionStore;
pub use storage::{MockStorageService, S3StorageClient, StorageState};

/// ApiDoc
///
/// OpenAPI document served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::login, handlers::logout, handlers::get_i18n, handlers::toggle_locale,
        handlers::list_content, handlers::get_content, handlers::admin_dashboard,
        handlers::admin_list_content, handlers::admin_get_content,
        handlers::admin_create_content, handlers::admin_update_content,
        handlers::admin_delete_content, handlers::presign_media
    ),
    components(
        schemas(
            models::User, models::ContentKind, models::ContentItem, models::LocalizedItem,
            models::LoginRequest, models::LoginResponse, models::SuccessResponse,
            models::CreateContentRequest, models::UpdateContentRequest,
            models::PresignedUrlRequest, models::PresignedUrlResponse,
            models::ContentListResponse, models::ContentDetailResponse,
            models::I18nResponse, models::LocaleState, models::ContentCounts,
            models::AdminDashboard, locale::Locale, locale::TextDirection,
        )
    ),
    tags(
        (name = "community-portal", description = "Bilingual community portal API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single immutable container of services shared by every request.
#[derive(Clone)]
pub struct AppState {
    /// Content tables, users and the admin allow-list.
    pub repo: RepositoryState,
    /// Credential verification and token revalidation.
    pub auth: AuthProviderState,
    /// Session cookie policy.
    pub session: SessionStore,
    /// Media bucket for content images.
    pub storage: StorageState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AuthProviderState {
    fn from_ref(app_state: &AppState) -> AuthProviderState {
        app_state.auth.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the routing structure, applies the admin gate to the admin group
/// and the observability stack to everything.
pub fn create_router(state: AppState) -> Router {
    // Credentialed CORS: only the configured frontend origins are answered.
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_origin(AllowOrigin::list(state.config.cors_allowed_origins.clone()))
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(session_routes::session_routes())
        .merge(
            admin::admin_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), gate::admin_gate)),
        )
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span per request carrying method, path and the `x-request-id`. The query
/// string is left out of the span.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value: &HeaderValue| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        path = %request.uri().path(),
        req_id = %request_id,
    )
}
