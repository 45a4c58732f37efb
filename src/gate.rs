use axum::{
    extract::{FromRef, FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    auth::{AuthProvider, AuthProviderState},
    models::{ADMIN_ROLE, User},
    repository::{Repository, RepositoryState},
    session::SessionStore,
};

/// Where an unauthenticated visitor of an admin route is sent.
pub const LOGIN_PATH: &str = "/auth/admin-login";
/// Where a signed-in non-admin is sent.
pub const HOME_PATH: &str = "/";

/// AccessState
///
/// `Anonymous -> Authenticated -> Authorized`, each step requiring the one
/// before it. There is no error state: a failed lookup leaves the request at
/// the last state it reached.
#[derive(Debug, Clone, PartialEq)]
pub enum AccessState {
    Anonymous,
    Authenticated(User),
    Authorized(User),
}

/// What the routing layer should do with a request in a given state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Proceed,
    RedirectToLogin,
    RedirectHome,
}

impl AccessState {
    pub fn decision(&self) -> GateDecision {
        match self {
            AccessState::Anonymous => GateDecision::RedirectToLogin,
            AccessState::Authenticated(_) => GateDecision::RedirectHome,
            AccessState::Authorized(_) => GateDecision::Proceed,
        }
    }
}

impl GateDecision {
    pub fn redirect_target(self) -> Option<&'static str> {
        match self {
            GateDecision::Proceed => None,
            GateDecision::RedirectToLogin => Some(LOGIN_PATH),
            GateDecision::RedirectHome => Some(HOME_PATH),
        }
    }
}

/// resolve
///
/// Walks the state machine for one request. The access token is revalidated
/// with the issuing provider on every call; nothing in the cookie is trusted
/// on its own.
pub async fn resolve(
    jar: &CookieJar,
    auth: &dyn AuthProvider,
    repo: &dyn Repository,
) -> AccessState {
    let Some(token) = SessionStore::access_token(jar) else {
        return AccessState::Anonymous;
    };

    let user = match auth.get_user(&token).await {
        Ok(Some(user)) => user,
        Ok(None) => return AccessState::Anonymous,
        Err(e) => {
            tracing::warn!("session lookup failed, treating request as anonymous: {}", e);
            return AccessState::Anonymous;
        }
    };

    match repo.is_admin(user.id).await {
        Ok(true) => AccessState::Authorized(User {
            role: ADMIN_ROLE.to_string(),
            ..user
        }),
        Ok(false) => AccessState::Authenticated(user),
        Err(e) => {
            tracing::warn!(user_id = %user.id, "admin lookup failed, denying: {}", e);
            AccessState::Authenticated(user)
        }
    }
}

/// AdminSession
///
/// Extractor yielding the admin behind an authorized request. Any other state
/// is rejected with a redirect (`/auth/admin-login` or `/`), never an error page.
/// When `admin_gate` already ran, the resolved admin is reused from the
/// request extensions.
#[derive(Debug, Clone)]
pub struct AdminSession(pub User);

impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
    AuthProviderState: FromRef<S>,
    RepositoryState: FromRef<S>,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(admin) = parts.extensions.get::<AdminSession>() {
            return Ok(admin.clone());
        }

        let auth = AuthProviderState::from_ref(state);
        let repo = RepositoryState::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);

        let access = resolve(&jar, auth.as_ref(), repo.as_ref()).await;
        match access {
            AccessState::Authorized(user) => Ok(AdminSession(user)),
            denied => {
                let target = denied.decision().redirect_target().unwrap_or(LOGIN_PATH);
                tracing::info!(uri = %parts.uri, redirect = target, "admin gate denied request");
                Err(Redirect::to(target))
            }
        }
    }
}

/// admin_gate
///
/// Route layer for every admin route. The extractor does the work; on success
/// the admin is stored in the request extensions for the handlers.
pub async fn admin_gate(admin: AdminSession, mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(admin);
    next.run(request).await.into_response()
}
