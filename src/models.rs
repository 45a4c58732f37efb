use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::locale::{Locale, LocaleContext, TextDirection, TextKey};

// --- Identity (read-only from the web tier) ---

/// User
///
/// The identity resolved from a session. `role` is the stored role, upgraded
/// to `admin` at login when an `admin_users` row exists for the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub role: String,
}

/// UserCredentials
///
/// Row read by the local auth backend only. Never serialized.
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub password_hash: String,
}

impl From<UserCredentials> for User {
    fn from(c: UserCredentials) -> Self {
        User {
            id: c.id,
            email: c.email,
            role: c.role,
        }
    }
}

pub const ADMIN_ROLE: &str = "admin";

// --- Content ---

/// ContentKind
///
/// The three content tables managed by the CMS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    #[default]
    News,
    Activity,
    Gallery,
}

impl ContentKind {
    pub const ALL: [ContentKind; 3] = [ContentKind::News, ContentKind::Activity, ContentKind::Gallery];

    /// Backing table name. Only ever one of these three literals.
    pub fn table(self) -> &'static str {
        match self {
            ContentKind::News => "news",
            ContentKind::Activity => "activities",
            ContentKind::Gallery => "gallery",
        }
    }

    /// URL segment used by the public and admin routes (same as the table name).
    pub fn segment(self) -> &'static str {
        self.table()
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.segment())
    }
}

impl FromStr for ContentKind {
    type Err = ();

    fn from_str(segment: &str) -> Result<Self, Self::Err> {
        ContentKind::ALL
            .into_iter()
            .find(|kind| kind.segment() == segment)
            .ok_or(())
    }
}

/// ContentItem
///
/// A bilingual row from `news`, `activities` or `gallery`. The three tables
/// share this column layout; `event_date` is only populated for activities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct ContentItem {
    pub id: Uuid,
    // Not a column: set by the repository from the table that was queried.
    #[sqlx(skip)]
    pub kind: ContentKind,
    pub title_en: String,
    pub title_ar: String,
    pub body_en: String,
    pub body_ar: String,
    // Object key or absolute URL of the attached image.
    pub image_url: Option<String>,
    #[ts(type = "string | null")]
    pub event_date: Option<NaiveDate>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// LocalizedItem
///
/// A content item shaped for one locale. `lang` is the language the title was
/// served in; `fallback` is true whenever any field had to be taken from the
/// other language because the requested one was blank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LocalizedItem {
    pub id: Uuid,
    pub kind: ContentKind,
    pub lang: Locale,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub body: Option<String>,
    pub image_url: Option<String>,
    #[ts(type = "string | null")]
    pub event_date: Option<NaiveDate>,
    pub fallback: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Picks the text for `want`, falling back to the other language when blank.
/// Returns the text and the language it is in, or `None` if both are blank.
fn pick<'a>(en: &'a str, ar: &'a str, want: Locale) -> Option<(&'a str, Locale)> {
    let text_for = |locale: Locale| match locale {
        Locale::En => en,
        Locale::Ar => ar,
    };
    [want, want.toggle()]
        .into_iter()
        .map(|locale| (text_for(locale).trim(), locale))
        .find(|(text, _)| !text.is_empty())
}

impl ContentItem {
    /// Shapes the item for the given locale under the explicit fallback policy:
    /// requested language first, then the other language (flagged), then for
    /// the title only a localized placeholder.
    pub fn localize(&self, ctx: &LocaleContext) -> LocalizedItem {
        let want = ctx.get();
        let (title, lang) = match pick(&self.title_en, &self.title_ar, want) {
            Some((text, lang)) => (text.to_string(), lang),
            None => (ctx.translate(TextKey::Untitled).to_string(), want),
        };
        let body = pick(&self.body_en, &self.body_ar, want);
        let fallback = lang != want || body.is_some_and(|(_, served)| served != want);

        LocalizedItem {
            id: self.id,
            kind: self.kind,
            lang,
            title,
            body: body.map(|(text, _)| text.to_string()),
            image_url: self.image_url.clone(),
            event_date: self.event_date,
            fallback,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

// --- Request Payloads ---

/// LoginRequest
///
/// Both fields are optional at the type level so that a missing field is
/// reported as a validation error (400) by the handler instead of a JSON
/// rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// CreateContentRequest
///
/// Input for creating a news item, activity or gallery entry. Both titles are
/// required so that the public site can always render either language.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateContentRequest {
    pub title_en: String,
    pub title_ar: String,
    #[serde(default)]
    pub body_en: String,
    #[serde(default)]
    pub body_ar: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    #[ts(type = "string | null")]
    pub event_date: Option<NaiveDate>,
}

/// UpdateContentRequest
///
/// Partial update: only provided fields change. `image_url` and `event_date`
/// are nullable columns, so for them an explicit `null` clears the value
/// while an absent field leaves it alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UpdateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_en: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_ar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_en: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_ar: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[ts(optional, type = "string | null")]
    #[schema(value_type = Option<String>)]
    pub image_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[ts(optional, type = "string | null")]
    #[schema(value_type = Option<NaiveDate>)]
    pub event_date: Option<Option<NaiveDate>>,
}

/// Present-but-null becomes `Some(None)`; `#[serde(default)]` covers absent.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// PresignedUrlRequest
///
/// Input for requesting a short-lived upload URL for a content image.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUrlRequest {
    /// The content table the image belongs to. Defaults to news.
    #[serde(default)]
    pub kind: ContentKind,
    /// The original filename, used to derive the file extension.
    #[schema(example = "open_day.jpg")]
    pub filename: String,
    /// The MIME type the upload is constrained to. Must be an image type.
    #[schema(example = "image/jpeg")]
    pub file_type: String,
}

// --- Responses ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginResponse {
    pub success: bool,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SuccessResponse {
    pub success: bool,
}

/// The active locale and its derived direction.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LocaleState {
    pub locale: Locale,
    pub dir: TextDirection,
}

impl From<&LocaleContext> for LocaleState {
    fn from(ctx: &LocaleContext) -> Self {
        LocaleState {
            locale: ctx.get(),
            dir: ctx.dir(),
        }
    }
}

/// Interface dictionary for one locale (`GET /api/i18n`).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct I18nResponse {
    pub locale: Locale,
    pub dir: TextDirection,
    pub messages: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ContentListResponse {
    pub locale: Locale,
    pub dir: TextDirection,
    pub items: Vec<LocalizedItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ContentDetailResponse {
    pub locale: Locale,
    pub dir: TextDirection,
    pub item: LocalizedItem,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PresignedUrlResponse {
    /// The time-limited URL for the PUT request.
    pub upload_url: String,
    /// The object key to store in `image_url` once the upload completes.
    pub resource_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct ContentCounts {
    pub news: i64,
    pub activities: i64,
    pub gallery: i64,
}

/// AdminDashboard
///
/// Output of `GET /admin`: the signed-in admin and the size of each table.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AdminDashboard {
    pub admin: User,
    pub counts: ContentCounts,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title_en: &str, title_ar: &str, body_en: &str, body_ar: &str) -> ContentItem {
        ContentItem {
            title_en: title_en.to_string(),
            title_ar: title_ar.to_string(),
            body_en: body_en.to_string(),
            body_ar: body_ar.to_string(),
            ..ContentItem::default()
        }
    }

    #[test]
    fn localize_serves_requested_language() {
        let it = item("Open day", "يوم مفتوح", "Join us", "انضموا إلينا");

        let en = it.localize(&LocaleContext::new(Locale::En));
        assert_eq!(en.title, "Open day");
        assert_eq!(en.body.as_deref(), Some("Join us"));
        assert!(!en.fallback);

        let ar = it.localize(&LocaleContext::new(Locale::Ar));
        assert_eq!(ar.title, "يوم مفتوح");
        assert_eq!(ar.lang, Locale::Ar);
        assert!(!ar.fallback);
    }

    #[test]
    fn localize_flags_fallback_to_other_language() {
        let it = item("Open day", "يوم مفتوح", "Join us", "   ");
        let ar = it.localize(&LocaleContext::new(Locale::Ar));
        assert_eq!(ar.title, "يوم مفتوح");
        assert_eq!(ar.body.as_deref(), Some("Join us"));
        assert!(ar.fallback);

        let only_en = item("Open day", "", "", "");
        let ar = only_en.localize(&LocaleContext::new(Locale::Ar));
        assert_eq!(ar.title, "Open day");
        assert_eq!(ar.lang, Locale::En);
        assert!(ar.fallback);
    }

    #[test]
    fn localize_never_renders_an_empty_title() {
        let blank = item("", " ", "", "");
        for locale in Locale::ALL {
            let shaped = blank.localize(&LocaleContext::new(locale));
            assert!(!shaped.title.is_empty());
            assert_eq!(shaped.body, None);
        }
    }

    #[test]
    fn content_kind_segments_round_trip() {
        for kind in ContentKind::ALL {
            assert_eq!(kind.segment().parse::<ContentKind>(), Ok(kind));
        }
        assert!("users".parse::<ContentKind>().is_err());
    }
}
