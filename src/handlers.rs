use crate::{
    AppState,
    config::AppConfig,
    error::{AppError, MISSING_CREDENTIALS},
    gate::AdminSession,
    locale::{LocaleContext, TextKey, locale_cookie},
    models::{
        ADMIN_ROLE, AdminDashboard, ContentCounts, ContentDetailResponse, ContentItem, ContentKind,
        ContentListResponse, CreateContentRequest, I18nResponse, LocaleState, LoginRequest,
        LoginResponse, PresignedUrlRequest, PresignedUrlResponse, SuccessResponse,
        UpdateContentRequest, User,
    },
    session::SessionStore,
    storage::{self, ALLOWED_IMAGE_TYPES},
};
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

fn not_found(locale: &LocaleContext) -> AppError {
    AppError::NotFound(locale.translate(TextKey::NotFound).to_string())
}

fn parse_kind(segment: &str, locale: &LocaleContext) -> Result<ContentKind, AppError> {
    segment.parse().map_err(|_| not_found(locale))
}

type KindPath = Result<Path<String>, PathRejection>;
type ItemPath = Result<Path<(String, Uuid)>, PathRejection>;

fn kind_path(path: KindPath, locale: &LocaleContext) -> Result<ContentKind, AppError> {
    let Path(kind) = path.map_err(|_| not_found(locale))?;
    parse_kind(&kind, locale)
}

/// A malformed id names no row, so it is a 404 like an unknown one.
fn item_path(path: ItemPath, locale: &LocaleContext) -> Result<(ContentKind, Uuid), AppError> {
    let Path((kind, id)) = path.map_err(|_| not_found(locale))?;
    Ok((parse_kind(&kind, locale)?, id))
}

/// Turns axum's JSON rejection (bad syntax, missing field, wrong content
/// type) into a 400 with the usual error body.
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

// --- Auth ---

/// login
///
/// [Public Route] Verifies credentials with the auth provider and, on success,
/// sets the `accessToken`/`refreshToken` cookies.
///
/// *Anti-enumeration*: an unknown email and a wrong password both produce the
/// same 401 body. A provider outage is a 500, never a 401.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in, cookies set", body = LoginResponse),
        (status = 400, description = "Email and password are required"),
        (status = 401, description = "Invalid email or password"),
        (status = 500, description = "Auth provider or database failure")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    let missing = || AppError::Validation(MISSING_CREDENTIALS.to_string());

    let Json(payload) = payload.map_err(|_| missing())?;
    let email = payload.email.as_deref().map(str::trim).filter(|e| !e.is_empty());
    let password = payload.password.as_deref().filter(|p| !p.is_empty());
    let (Some(email), Some(password)) = (email, password) else {
        return Err(missing());
    };

    let Some(signed_in) = state.auth.sign_in(email, password).await? else {
        tracing::info!("login rejected");
        return Err(AppError::Authentication);
    };

    let user = signed_in.user;
    let role = if state.repo.is_admin(user.id).await? {
        ADMIN_ROLE.to_string()
    } else {
        user.role.clone()
    };

    let jar = state.session.set_auth_cookies(jar, &signed_in.tokens)?;
    tracing::info!(user_id = %user.id, role = %role, "login succeeded");

    Ok((
        jar,
        Json(LoginResponse {
            success: true,
            user: User { role, ..user },
        }),
    ))
}

/// logout
///
/// [Public Route] Revokes the session at the provider (best effort) and
/// clears both cookies. Succeeds whether or not a session existed.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 200, description = "Signed out, cookies cleared", body = SuccessResponse))
)]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<SuccessResponse>) {
    if let Some(token) = SessionStore::access_token(&jar) {
        if let Err(e) = state.auth.sign_out(&token).await {
            tracing::warn!("provider sign-out failed, clearing cookies anyway: {}", e);
        }
    }
    let jar = state.session.clear_auth_cookies(jar);
    (jar, Json(SuccessResponse { success: true }))
}

// --- Locale ---

/// get_i18n
///
/// [Public Route] The interface dictionary for the request's locale.
#[utoipa::path(
    get,
    path = "/api/i18n",
    params(("lang" = Option<String>, Query, description = "en or ar")),
    responses((status = 200, description = "Dictionary", body = I18nResponse))
)]
pub async fn get_i18n(locale: LocaleContext) -> Json<I18nResponse> {
    let messages = locale
        .messages()
        .into_iter()
        .map(|(key, text)| (key.to_string(), text.to_string()))
        .collect();
    Json(I18nResponse {
        locale: locale.get(),
        dir: locale.dir(),
        messages,
    })
}

/// toggle_locale
///
/// [Public Route] Flips the client's language and persists it in the `lang`
/// cookie. The response carries the new locale and direction so the client
/// can re-render everything at once.
#[utoipa::path(
    post,
    path = "/api/locale/toggle",
    responses((status = 200, description = "New locale", body = LocaleState))
)]
pub async fn toggle_locale(
    State(config): State<AppConfig>,
    jar: CookieJar,
    mut locale: LocaleContext,
) -> (CookieJar, Json<LocaleState>) {
    locale.toggle();
    let jar = jar.add(locale_cookie(locale.get(), config.cookie_secure()));
    (jar, Json(LocaleState::from(&locale)))
}

// --- Public Content ---

/// list_content
///
/// [Public Route] Lists news, activities or gallery entries shaped for the
/// request's locale.
#[utoipa::path(
    get,
    path = "/api/{kind}",
    params(
        ("kind" = String, Path, description = "news, activities or gallery"),
        ("lang" = Option<String>, Query, description = "en or ar")
    ),
    responses(
        (status = 200, description = "Localized items", body = ContentListResponse),
        (status = 404, description = "Unknown content kind")
    )
)]
pub async fn list_content(
    State(state): State<AppState>,
    path: KindPath,
    locale: LocaleContext,
) -> Result<Json<ContentListResponse>, AppError> {
    let kind = kind_path(path, &locale)?;
    let items = state.repo.list_content(kind).await?;
    Ok(Json(ContentListResponse {
        locale: locale.get(),
        dir: locale.dir(),
        items: items.iter().map(|item| item.localize(&locale)).collect(),
    }))
}

/// get_content
///
/// [Public Route] A single item shaped for the request's locale.
#[utoipa::path(
    get,
    path = "/api/{kind}/{id}",
    params(
        ("kind" = String, Path, description = "news, activities or gallery"),
        ("id" = Uuid, Path, description = "Item ID"),
        ("lang" = Option<String>, Query, description = "en or ar")
    ),
    responses(
        (status = 200, description = "Found", body = ContentDetailResponse),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_content(
    State(state): State<AppState>,
    path: ItemPath,
    locale: LocaleContext,
) -> Result<Json<ContentDetailResponse>, AppError> {
    let (kind, id) = item_path(path, &locale)?;
    let item = state
        .repo
        .get_content(kind, id)
        .await?
        .ok_or_else(|| not_found(&locale))?;
    Ok(Json(ContentDetailResponse {
        locale: locale.get(),
        dir: locale.dir(),
        item: item.localize(&locale),
    }))
}

// --- Admin ---

/// admin_dashboard
///
/// [Admin Route] The signed-in admin and per-table counts.
#[utoipa::path(
    get,
    path = "/admin",
    responses(
        (status = 200, description = "Dashboard", body = AdminDashboard),
        (status = 303, description = "Not an admin: redirect to login or home")
    )
)]
pub async fn admin_dashboard(
    AdminSession(admin): AdminSession,
    State(state): State<AppState>,
) -> Result<Json<AdminDashboard>, AppError> {
    let counts = ContentCounts {
        news: state.repo.count_content(ContentKind::News).await?,
        activities: state.repo.count_content(ContentKind::Activity).await?,
        gallery: state.repo.count_content(ContentKind::Gallery).await?,
    };
    Ok(Json(AdminDashboard { admin, counts }))
}

/// admin_list_content
///
/// [Admin Route] Raw bilingual rows for editing.
#[utoipa::path(
    get,
    path = "/api/admin/{kind}",
    params(("kind" = String, Path, description = "news, activities or gallery")),
    responses((status = 200, description = "All rows", body = [ContentItem]))
)]
pub async fn admin_list_content(
    AdminSession(_admin): AdminSession,
    State(state): State<AppState>,
    path: KindPath,
    locale: LocaleContext,
) -> Result<Json<Vec<ContentItem>>, AppError> {
    let kind = kind_path(path, &locale)?;
    Ok(Json(state.repo.list_content(kind).await?))
}

/// admin_get_content
///
/// [Admin Route] One raw bilingual row.
#[utoipa::path(
    get,
    path = "/api/admin/{kind}/{id}",
    params(
        ("kind" = String, Path, description = "news, activities or gallery"),
        ("id" = Uuid, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Found", body = ContentItem),
        (status = 404, description = "Not Found")
    )
)]
pub async fn admin_get_content(
    AdminSession(_admin): AdminSession,
    State(state): State<AppState>,
    path: ItemPath,
    locale: LocaleContext,
) -> Result<Json<ContentItem>, AppError> {
    let (kind, id) = item_path(path, &locale)?;
    state
        .repo
        .get_content(kind, id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(&locale))
}

fn validate_create(kind: ContentKind, req: &CreateContentRequest) -> Result<(), AppError> {
    if is_blank(&req.title_en) || is_blank(&req.title_ar) {
        return Err(AppError::Validation(
            "Both English and Arabic titles are required".to_string(),
        ));
    }
    if kind == ContentKind::Gallery && req.image_url.as_deref().is_none_or(is_blank) {
        return Err(AppError::Validation("Gallery entries require an image".to_string()));
    }
    if kind != ContentKind::Activity && req.event_date.is_some() {
        return Err(AppError::Validation(
            "event_date is only valid for activities".to_string(),
        ));
    }
    Ok(())
}

fn validate_update(kind: ContentKind, req: &UpdateContentRequest) -> Result<(), AppError> {
    let blanked_title = [&req.title_en, &req.title_ar]
        .into_iter()
        .any(|t| t.as_deref().is_some_and(is_blank));
    if blanked_title {
        return Err(AppError::Validation("Titles cannot be blank".to_string()));
    }
    let removes_image = req
        .image_url
        .as_ref()
        .is_some_and(|url| url.as_deref().is_none_or(is_blank));
    if kind == ContentKind::Gallery && removes_image {
        return Err(AppError::Validation("Gallery entries require an image".to_string()));
    }
    // Clearing a date that cannot be set is harmless.
    if kind != ContentKind::Activity && matches!(req.event_date, Some(Some(_))) {
        return Err(AppError::Validation(
            "event_date is only valid for activities".to_string(),
        ));
    }
    Ok(())
}

/// admin_create_content
///
/// [Admin Route] Creates a bilingual item. Both titles are mandatory.
#[utoipa::path(
    post,
    path = "/api/admin/{kind}",
    params(("kind" = String, Path, description = "news, activities or gallery")),
    request_body = CreateContentRequest,
    responses(
        (status = 201, description = "Created", body = ContentItem),
        (status = 400, description = "Validation failed")
    )
)]
pub async fn admin_create_content(
    AdminSession(admin): AdminSession,
    State(state): State<AppState>,
    path: KindPath,
    locale: LocaleContext,
    payload: Result<Json<CreateContentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ContentItem>), AppError> {
    let kind = kind_path(path, &locale)?;
    let payload = json_body(payload)?;
    validate_create(kind, &payload)?;
    let item = state.repo.create_content(kind, payload).await?;
    tracing::info!(admin_id = %admin.id, kind = %kind, item_id = %item.id, "content created");
    Ok((StatusCode::CREATED, Json(item)))
}

/// admin_update_content
///
/// [Admin Route] Partial update of an item. Absent fields are kept; an
/// explicit `null` clears `image_url` or `event_date`.
#[utoipa::path(
    put,
    path = "/api/admin/{kind}/{id}",
    params(
        ("kind" = String, Path, description = "news, activities or gallery"),
        ("id" = Uuid, Path, description = "Item ID")
    ),
    request_body = UpdateContentRequest,
    responses(
        (status = 200, description = "Updated", body = ContentItem),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn admin_update_content(
    AdminSession(admin): AdminSession,
    State(state): State<AppState>,
    path: ItemPath,
    locale: LocaleContext,
    payload: Result<Json<UpdateContentRequest>, JsonRejection>,
) -> Result<Json<ContentItem>, AppError> {
    let (kind, id) = item_path(path, &locale)?;
    let payload = json_body(payload)?;
    validate_update(kind, &payload)?;
    let item = state
        .repo
        .update_content(kind, id, payload)
        .await?
        .ok_or_else(|| not_found(&locale))?;
    tracing::info!(admin_id = %admin.id, kind = %kind, item_id = %id, "content updated");
    Ok(Json(item))
}

/// admin_delete_content
///
/// [Admin Route] Deletes an item. 204 on success, 404 if it did not exist.
#[utoipa::path(
    delete,
    path = "/api/admin/{kind}/{id}",
    params(
        ("kind" = String, Path, description = "news, activities or gallery"),
        ("id" = Uuid, Path, description = "Item ID")
    ),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn admin_delete_content(
    AdminSession(admin): AdminSession,
    State(state): State<AppState>,
    path: ItemPath,
    locale: LocaleContext,
) -> Result<StatusCode, AppError> {
    let (kind, id) = item_path(path, &locale)?;
    if state.repo.delete_content(kind, id).await? {
        tracing::info!(admin_id = %admin.id, kind = %kind, item_id = %id, "content deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(&locale))
    }
}

/// presign_media
///
/// [Admin Route] Issues a 10-minute presigned PUT URL for an image upload.
/// The returned `resource_key` is what goes into `image_url`.
#[utoipa::path(
    post,
    path = "/api/admin/media/presigned",
    request_body = PresignedUrlRequest,
    responses(
        (status = 200, description = "URL", body = PresignedUrlResponse),
        (status = 400, description = "Not an accepted image type")
    )
)]
pub async fn presign_media(
    AdminSession(_admin): AdminSession,
    State(state): State<AppState>,
    payload: Result<Json<PresignedUrlRequest>, JsonRejection>,
) -> Result<Json<PresignedUrlResponse>, AppError> {
    let payload = json_body(payload)?;
    if !storage::is_allowed_image_type(&payload.file_type) {
        return Err(AppError::Validation(format!(
            "file_type must be one of: {}",
            ALLOWED_IMAGE_TYPES.join(", ")
        )));
    }

    let object_key = storage::media_key(payload.kind, &payload.filename);
    let upload_url = state
        .storage
        .get_presigned_upload_url(&object_key, &payload.file_type)
        .await?;

    Ok(Json(PresignedUrlResponse {
        upload_url,
        resource_key: object_key,
    }))
}
