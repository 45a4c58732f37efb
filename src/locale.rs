//! Locale state for the bilingual site.
//!
//! The active language is a value, not a global: handlers receive a
//! `LocaleContext` from the request (query override, then the `lang` cookie,
//! then the default) and pass it down into every view they build.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

/// Cookie carrying the per-client language preference.
pub const LOCALE_COOKIE: &str = "lang";

/// Locale
///
/// The closed set of supported display languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ar,
}

/// Text direction derived from a locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    Ltr,
    Rtl,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::En, Locale::Ar];

    /// Flips to the other supported language.
    pub fn toggle(self) -> Locale {
        match self {
            Locale::En => Locale::Ar,
            Locale::Ar => Locale::En,
        }
    }

    pub fn direction(self) -> TextDirection {
        match self {
            Locale::En => TextDirection::Ltr,
            Locale::Ar => TextDirection::Rtl,
        }
    }

    pub fn is_rtl(self) -> bool {
        self.direction() == TextDirection::Rtl
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Ar => "ar",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = ();

    /// Accepts bare tags and region-qualified ones (`ar-JO`, `en_GB`).
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let primary = raw
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match primary.as_str() {
            "en" => Ok(Locale::En),
            "ar" => Ok(Locale::Ar),
            _ => Err(()),
        }
    }
}

/// TextKey
///
/// The declared set of interface strings. `translate` is an exhaustive match
/// over this enum, so adding a key without both translations does not compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TextKey {
    SiteTitle,
    NavHome,
    NavAbout,
    NavNews,
    NavActivities,
    NavGallery,
    NavContact,
    ReadMore,
    NoItems,
    NotFound,
    Untitled,
    AdminLogin,
    AdminDashboard,
    Email,
    Password,
    SignIn,
    SignOut,
    InvalidCredentials,
    SwitchLanguage,
}

impl TextKey {
    pub const ALL: [TextKey; 19] = [
        TextKey::SiteTitle,
        TextKey::NavHome,
        TextKey::NavAbout,
        TextKey::NavNews,
        TextKey::NavActivities,
        TextKey::NavGallery,
        TextKey::NavContact,
        TextKey::ReadMore,
        TextKey::NoItems,
        TextKey::NotFound,
        TextKey::Untitled,
        TextKey::AdminLogin,
        TextKey::AdminDashboard,
        TextKey::Email,
        TextKey::Password,
        TextKey::SignIn,
        TextKey::SignOut,
        TextKey::InvalidCredentials,
        TextKey::SwitchLanguage,
    ];

    /// Stable identifier used as the key in the `/api/i18n` dictionary.
    pub fn as_str(self) -> &'static str {
        match self {
            TextKey::SiteTitle => "site.title",
            TextKey::NavHome => "nav.home",
            TextKey::NavAbout => "nav.about",
            TextKey::NavNews => "nav.news",
            TextKey::NavActivities => "nav.activities",
            TextKey::NavGallery => "nav.gallery",
            TextKey::NavContact => "nav.contact",
            TextKey::ReadMore => "content.read_more",
            TextKey::NoItems => "content.empty",
            TextKey::NotFound => "content.not_found",
            TextKey::Untitled => "content.untitled",
            TextKey::AdminLogin => "auth.admin_login",
            TextKey::AdminDashboard => "admin.dashboard",
            TextKey::Email => "auth.email",
            TextKey::Password => "auth.password",
            TextKey::SignIn => "auth.sign_in",
            TextKey::SignOut => "auth.sign_out",
            TextKey::InvalidCredentials => "auth.invalid_credentials",
            TextKey::SwitchLanguage => "locale.switch",
        }
    }
}

/// Looks up an interface string. Pure: the result depends only on the arguments.
pub fn translate(key: TextKey, locale: Locale) -> &'static str {
    use Locale::{Ar, En};
    match (key, locale) {
        (TextKey::SiteTitle, En) => "Community Association",
        (TextKey::SiteTitle, Ar) => "الجمعية المجتمعية",
        (TextKey::NavHome, En) => "Home",
        (TextKey::NavHome, Ar) => "الرئيسية",
        (TextKey::NavAbout, En) => "About Us",
        (TextKey::NavAbout, Ar) => "من نحن",
        (TextKey::NavNews, En) => "News",
        (TextKey::NavNews, Ar) => "الأخبار",
        (TextKey::NavActivities, En) => "Activities",
        (TextKey::NavActivities, Ar) => "الأنشطة",
        (TextKey::NavGallery, En) => "Gallery",
        (TextKey::NavGallery, Ar) => "معرض الصور",
        (TextKey::NavContact, En) => "Contact",
        (TextKey::NavContact, Ar) => "اتصل بنا",
        (TextKey::ReadMore, En) => "Read more",
        (TextKey::ReadMore, Ar) => "اقرأ المزيد",
        (TextKey::NoItems, En) => "Nothing has been published yet",
        (TextKey::NoItems, Ar) => "لم يتم نشر أي محتوى بعد",
        (TextKey::NotFound, En) => "The requested item was not found",
        (TextKey::NotFound, Ar) => "العنصر المطلوب غير موجود",
        (TextKey::Untitled, En) => "Untitled",
        (TextKey::Untitled, Ar) => "بدون عنوان",
        (TextKey::AdminLogin, En) => "Admin Login",
        (TextKey::AdminLogin, Ar) => "تسجيل دخول المشرف",
        (TextKey::AdminDashboard, En) => "Dashboard",
        (TextKey::AdminDashboard, Ar) => "لوحة التحكم",
        (TextKey::Email, En) => "Email",
        (TextKey::Email, Ar) => "البريد الإلكتروني",
        (TextKey::Password, En) => "Password",
        (TextKey::Password, Ar) => "كلمة المرور",
        (TextKey::SignIn, En) => "Sign in",
        (TextKey::SignIn, Ar) => "تسجيل الدخول",
        (TextKey::SignOut, En) => "Sign out",
        (TextKey::SignOut, Ar) => "تسجيل الخروج",
        (TextKey::InvalidCredentials, En) => "Invalid email or password",
        (TextKey::InvalidCredentials, Ar) => "البريد الإلكتروني أو كلمة المرور غير صحيحة",
        // The switch is labelled with the language it switches to.
        (TextKey::SwitchLanguage, En) => "العربية",
        (TextKey::SwitchLanguage, Ar) => "English",
    }
}

/// LocaleContext
///
/// The per-client language state handed to view builders. Everything derived
/// from it (`dir`, `is_rtl`, `translate`) is recomputed from the stored locale
/// on each call, so a toggle is visible to every later read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LocaleContext {
    locale: Locale,
}

impl LocaleContext {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    pub fn get(&self) -> Locale {
        self.locale
    }

    /// Switches to the other language and returns the new one.
    pub fn toggle(&mut self) -> Locale {
        self.locale = self.locale.toggle();
        self.locale
    }

    pub fn is_rtl(&self) -> bool {
        self.locale.is_rtl()
    }

    pub fn dir(&self) -> TextDirection {
        self.locale.direction()
    }

    pub fn translate(&self, key: TextKey) -> &'static str {
        translate(key, self.locale)
    }

    /// The full interface dictionary for the active locale.
    pub fn messages(&self) -> BTreeMap<&'static str, &'static str> {
        TextKey::ALL
            .iter()
            .map(|key| (key.as_str(), self.translate(*key)))
            .collect()
    }

    /// Resolves the request locale: `?lang=` wins over the cookie, and an
    /// unknown or absent value falls back to the default (`en`).
    pub fn resolve(query_lang: Option<&str>, jar: &CookieJar) -> Self {
        let locale = query_lang
            .and_then(|raw| raw.parse().ok())
            .or_else(|| jar.get(LOCALE_COOKIE).and_then(|c| c.value().parse().ok()))
            .unwrap_or_default();
        Self::new(locale)
    }
}

/// Builds the cookie persisting a client's language choice for a year.
pub fn locale_cookie(locale: Locale, secure: bool) -> Cookie<'static> {
    Cookie::build((LOCALE_COOKIE, locale.as_str()))
        .path("/")
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::days(365))
        .build()
}

#[derive(Deserialize)]
struct LangQuery {
    lang: Option<String>,
}

impl<S> FromRequestParts<S> for LocaleContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let query_lang = Query::<LangQuery>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(q)| q.lang);
        let jar = CookieJar::from_headers(&parts.headers);
        Ok(LocaleContext::resolve(query_lang.as_deref(), &jar))
    }
}
