use std::time::Duration;

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use thiserror::Error;

use crate::config::AppConfig;

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

/// SessionTokens
///
/// The opaque token pair issued by the auth provider at sign-in.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
}

// Tokens must never end up in logs.
impl std::fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokens").finish_non_exhaustive()
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("{0} token is empty")]
    EmptyToken(&'static str),
    #[error("{0} token contains characters not allowed in a cookie value")]
    InvalidToken(&'static str),
}

/// SessionStore
///
/// Writes and clears the `accessToken`/`refreshToken` cookie pair. Both cookies
/// are HttpOnly, scoped to `/`, SameSite=Lax and Secure in production; the
/// access cookie expires well before the refresh cookie.
#[derive(Clone, Debug)]
pub struct SessionStore {
    secure: bool,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl SessionStore {
    pub fn new(secure: bool, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            secure,
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.cookie_secure(),
            config.access_token_ttl,
            config.refresh_token_ttl,
        )
    }

    /// set_auth_cookies
    ///
    /// Adds both session cookies to the jar. Both tokens are checked before
    /// anything is written, so the result is either a jar with both cookies or
    /// an error with the jar untouched.
    pub fn set_auth_cookies(
        &self,
        jar: CookieJar,
        tokens: &SessionTokens,
    ) -> Result<CookieJar, SessionError> {
        check_token("access", &tokens.access_token)?;
        check_token("refresh", &tokens.refresh_token)?;

        Ok(jar
            .add(self.cookie(ACCESS_COOKIE, tokens.access_token.clone(), self.access_ttl))
            .add(self.cookie(REFRESH_COOKIE, tokens.refresh_token.clone(), self.refresh_ttl)))
    }

    /// clear_auth_cookies
    ///
    /// Emits expired cookies for both names. Unconditional: added rather than
    /// removed from the jar, so the headers go out even when the request
    /// carried no session.
    pub fn clear_auth_cookies(&self, jar: CookieJar) -> CookieJar {
        jar.add(self.removal(ACCESS_COOKIE))
            .add(self.removal(REFRESH_COOKIE))
    }

    /// The access token carried by the request, if any and non-empty.
    pub fn access_token(jar: &CookieJar) -> Option<String> {
        jar.get(ACCESS_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
    }

    fn cookie(&self, name: &'static str, value: String, ttl: Duration) -> Cookie<'static> {
        Cookie::build((name, value))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::seconds(ttl.as_secs() as i64))
            .build()
    }

    // Removal must match the path of the original cookie to take effect.
    fn removal(&self, name: &'static str) -> Cookie<'static> {
        let mut cookie = Cookie::build((name, ""))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .build();
        cookie.make_removal();
        cookie
    }
}

fn check_token(which: &'static str, token: &str) -> Result<(), SessionError> {
    if token.is_empty() {
        return Err(SessionError::EmptyToken(which));
    }
    // RFC 6265 cookie-octet: visible ASCII except DQUOTE, comma, semicolon and backslash.
    let valid = token
        .bytes()
        .all(|b| (0x21..=0x7e).contains(&b) && !matches!(b, b'"' | b',' | b';' | b'\\'));
    if valid {
        Ok(())
    } else {
        Err(SessionError::InvalidToken(which))
    }
}
