use std::collections::HashSet;
use std::sync::{Arc, LazyLock, Mutex};
use std::time::Duration;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    models::User,
    repository::{RepoError, RepositoryState},
    session::SessionTokens,
};

/// AuthError
///
/// Failures of the credential verifier itself. "Wrong credentials" is not an
/// error: it is `Ok(None)` from `sign_in`, so that callers cannot confuse a
/// provider outage (500) with a rejected login (401).
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("auth provider request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("auth provider returned unexpected status {0}")]
    UnexpectedStatus(u16),
    #[error("user store error: {0}")]
    Store(#[from] RepoError),
    #[error("token signing failed: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("password verification task failed: {0}")]
    Internal(String),
}

/// SignIn
///
/// Result of a successful credential check.
#[derive(Debug, Clone)]
pub struct SignIn {
    pub user: User,
    pub tokens: SessionTokens,
}

/// AuthProvider Trait
///
/// The Auth Service contract. Implementations must return `Ok(None)` for an
/// unknown email and for a wrong password alike.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Option<SignIn>, AuthError>;

    /// Revalidates an access token with the issuer. `Ok(None)` means the token
    /// is no longer (or never was) valid.
    async fn get_user(&self, access_token: &str) -> Result<Option<User>, AuthError>;

    /// Revokes the session at the issuer, where the issuer keeps any.
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;
}

pub type AuthProviderState = Arc<dyn AuthProvider>;

// --- Supabase (GoTrue) ---

/// SupabaseAuthProvider
///
/// Talks to the hosted GoTrue REST API with the project's anon key.
#[derive(Clone)]
pub struct SupabaseAuthProvider {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
}

#[derive(Deserialize)]
struct GoTrueUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    app_metadata: Option<serde_json::Value>,
}

impl From<GoTrueUser> for User {
    fn from(u: GoTrueUser) -> Self {
        // Roles assigned by the operator live in app_metadata. GoTrue's
        // top-level `role` is the Postgres role and is ignored.
        let role = u
            .app_metadata
            .as_ref()
            .and_then(|meta| meta.get("role"))
            .and_then(|r| r.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| "user".to_string());
        User {
            id: u.id,
            email: u.email.unwrap_or_default(),
            role,
        }
    }
}

#[derive(Deserialize)]
struct GoTrueSession {
    access_token: String,
    refresh_token: String,
    user: GoTrueUser,
}

impl SupabaseAuthProvider {
    pub fn new(base_url: &str, anon_key: &str, timeout: Duration) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        })
    }
}

#[async_trait]
impl AuthProvider for SupabaseAuthProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Option<SignIn>, AuthError> {
        let response = self
            .client
            .post(format!("{}/auth/v1/token?grant_type=password", self.base_url))
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                let session = response.json::<GoTrueSession>().await?;
                Ok(Some(SignIn {
                    user: session.user.into(),
                    tokens: SessionTokens {
                        access_token: session.access_token,
                        refresh_token: session.refresh_token,
                    },
                }))
            }
            // GoTrue answers a bad email and a bad password identically with
            // invalid_grant; all of these mean "rejected credentials".
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::UNPROCESSABLE_ENTITY => {
                Ok(None)
            }
            other => Err(AuthError::UnexpectedStatus(other.as_u16())),
        }
    }

    async fn get_user(&self, access_token: &str) -> Result<Option<User>, AuthError> {
        let response = self
            .client
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(Some(response.json::<GoTrueUser>().await?.into())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => Ok(None),
            other => Err(AuthError::UnexpectedStatus(other.as_u16())),
        }
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let response = self
            .client
            .post(format!("{}/auth/v1/logout", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        match response.status() {
            // An already-invalid token has nothing left to revoke.
            status if status.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => Ok(()),
            other => Err(AuthError::UnexpectedStatus(other.as_u16())),
        }
    }
}

// --- Local (users table + self-issued JWTs) ---

/// Claims
///
/// Payload of the JWTs issued by `LocalAuthProvider`. `typ` separates access
/// from refresh tokens so one can never be replayed as the other.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's id in the `users` table.
    pub sub: Uuid,
    pub exp: usize,
    pub iat: usize,
    pub typ: String,
}

const ACCESS_TYP: &str = "access";
const REFRESH_TYP: &str = "refresh";

// Verified against when the email is unknown, so both rejection paths cost
// one argon2 verification.
static DUMMY_HASH: LazyLock<Option<String>> = LazyLock::new(|| {
    let salt = SaltString::from_b64("Y29tbXVuaXR5cG9ydGFs").ok()?;
    Argon2::default()
        .hash_password(b"not-a-real-password", &salt)
        .ok()
        .map(|h| h.to_string())
});

/// LocalAuthProvider
///
/// Verifies argon2 hashes from the `users` table and issues HS256 JWTs. Token
/// revalidation decodes the JWT and then re-reads the user row, so deleting a
/// user revokes their sessions.
pub struct LocalAuthProvider {
    repo: RepositoryState,
    secret: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl LocalAuthProvider {
    pub fn new(repo: RepositoryState, secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            repo,
            secret: secret.to_string(),
            access_ttl,
            refresh_ttl,
        }
    }

    fn issue(&self, user_id: Uuid, typ: &str, ttl: Duration) -> Result<String, AuthError> {
        let now = Utc::now().timestamp().max(0) as usize;
        let claims = Claims {
            sub: user_id,
            iat: now,
            exp: now + ttl.as_secs() as usize,
            typ: typ.to_string(),
        };
        let key = EncodingKey::from_secret(self.secret.as_bytes());
        Ok(encode(&Header::default(), &claims, &key)?)
    }

    fn decode_access(&self, token: &str) -> Option<Uuid> {
        let key = DecodingKey::from_secret(self.secret.as_bytes());
        let mut validation = Validation::default();
        validation.validate_exp = true;
        // Bad signature, expiry and malformed tokens all mean "no session".
        let data = decode::<Claims>(token, &key, &validation).ok()?;
        (data.claims.typ == ACCESS_TYP).then_some(data.claims.sub)
    }
}

/// Runs an argon2 verification off the async runtime.
async fn verify_password(hash: String, password: String) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || match PasswordHash::new(&hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::error!("stored password hash is not a valid PHC string: {}", e);
            false
        }
    })
    .await
    .map_err(|e| AuthError::Internal(e.to_string()))
}

#[async_trait]
impl AuthProvider for LocalAuthProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Option<SignIn>, AuthError> {
        let Some(creds) = self.repo.find_credentials(email).await? else {
            if let Some(dummy) = DUMMY_HASH.as_ref() {
                verify_password(dummy.clone(), password.to_string()).await?;
            }
            return Ok(None);
        };

        if !verify_password(creds.password_hash.clone(), password.to_string()).await? {
            return Ok(None);
        }

        let tokens = SessionTokens {
            access_token: self.issue(creds.id, ACCESS_TYP, self.access_ttl)?,
            refresh_token: self.issue(creds.id, REFRESH_TYP, self.refresh_ttl)?,
        };
        Ok(Some(SignIn {
            user: creds.into(),
            tokens,
        }))
    }

    async fn get_user(&self, access_token: &str) -> Result<Option<User>, AuthError> {
        match self.decode_access(access_token) {
            Some(user_id) => Ok(self.repo.get_user(user_id).await?),
            None => Ok(None),
        }
    }

    async fn sign_out(&self, _access_token: &str) -> Result<(), AuthError> {
        // Stateless tokens: clearing the cookies ends the session.
        Ok(())
    }
}

/// Produces a PHC-format argon2 hash for provisioning a `users` row.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

// --- Mock (for tests) ---

/// MockAuthProvider
///
/// In-memory `AuthProvider` used by the handler and router tests. Issues
/// `mock-access-<id>` tokens and remembers revoked ones.
pub struct MockAuthProvider {
    accounts: Vec<(User, String)>,
    revoked: Mutex<HashSet<String>>,
    /// When true, every call fails as if the provider were unreachable.
    pub should_fail: bool,
}

impl MockAuthProvider {
    pub fn new(accounts: Vec<(User, String)>) -> Self {
        Self {
            accounts,
            revoked: Mutex::new(HashSet::new()),
            should_fail: false,
        }
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::new(vec![])
        }
    }

    pub fn access_token_for(user_id: Uuid) -> String {
        format!("mock-access-{}", user_id)
    }

    fn outage(&self) -> Result<(), AuthError> {
        if self.should_fail {
            Err(AuthError::UnexpectedStatus(503))
        } else {
            Ok(())
        }
    }

    fn is_revoked(&self, token: &str) -> bool {
        self.revoked
            .lock()
            .map(|set| set.contains(token))
            .unwrap_or(true)
    }
}

#[async_trait]
impl AuthProvider for MockAuthProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Option<SignIn>, AuthError> {
        self.outage()?;
        Ok(self
            .accounts
            .iter()
            .find(|(user, pw)| user.email.eq_ignore_ascii_case(email) && pw == password)
            .map(|(user, _)| SignIn {
                user: user.clone(),
                tokens: SessionTokens {
                    access_token: Self::access_token_for(user.id),
                    refresh_token: format!("mock-refresh-{}", user.id),
                },
            }))
    }

    async fn get_user(&self, access_token: &str) -> Result<Option<User>, AuthError> {
        self.outage()?;
        if self.is_revoked(access_token) {
            return Ok(None);
        }
        Ok(self
            .accounts
            .iter()
            .find(|(user, _)| Self::access_token_for(user.id) == access_token)
            .map(|(user, _)| user.clone()))
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        self.outage()?;
        if let Ok(mut set) = self.revoked.lock() {
            set.insert(access_token.to_string());
        }
        Ok(())
    }
}
