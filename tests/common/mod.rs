#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, Response, header},
};
use chrono::Utc;
use community_portal::{
    AppConfig, AppState, MockAuthProvider, MockStorageService, SessionStore,
    auth::AuthProviderState,
    models::{ContentItem, ContentKind, CreateContentRequest, UpdateContentRequest, User, UserCredentials},
    repository::{RepoError, RepoResult, Repository},
};
use uuid::Uuid;

pub const ADMIN_ID: Uuid = Uuid::from_u128(1);
pub const MEMBER_ID: Uuid = Uuid::from_u128(2);
pub const ADMIN_EMAIL: &str = "admin@community.org";
pub const MEMBER_EMAIL: &str = "member@community.org";
pub const PASSWORD: &str = "correct horse battery staple";

// --- In-memory Repository ---

/// Repository held in memory. `fail` makes every call return a store error.
#[derive(Default)]
pub struct InMemoryRepository {
    pub users: Mutex<Vec<UserCredentials>>,
    pub admins: Mutex<HashSet<Uuid>>,
    pub content: Mutex<Vec<ContentItem>>,
    pub fail: bool,
}

impl InMemoryRepository {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with_admin(self, id: Uuid) -> Self {
        self.admins.lock().unwrap().insert(id);
        self
    }

    pub fn with_user(self, creds: UserCredentials) -> Self {
        self.users.lock().unwrap().push(creds);
        self
    }

    pub fn with_item(self, item: ContentItem) -> Self {
        self.content.lock().unwrap().push(item);
        self
    }

    fn check(&self) -> RepoResult<()> {
        if self.fail {
            Err(RepoError::Unavailable("simulated outage".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        self.check()?;
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .map(User::from))
    }

    async fn find_credentials(&self, email: &str) -> RepoResult<Option<UserCredentials>> {
        self.check()?;
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn is_admin(&self, user_id: Uuid) -> RepoResult<bool> {
        self.check()?;
        Ok(self.admins.lock().unwrap().contains(&user_id))
    }

    async fn list_content(&self, kind: ContentKind) -> RepoResult<Vec<ContentItem>> {
        self.check()?;
        Ok(self
            .content
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.kind == kind)
            .cloned()
            .collect())
    }

    async fn get_content(&self, kind: ContentKind, id: Uuid) -> RepoResult<Option<ContentItem>> {
        self.check()?;
        Ok(self
            .content
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.kind == kind && i.id == id)
            .cloned())
    }

    async fn create_content(&self, kind: ContentKind, req: CreateContentRequest) -> RepoResult<ContentItem> {
        self.check()?;
        let now = Utc::now();
        let item = ContentItem {
            id: Uuid::new_v4(),
            kind,
            title_en: req.title_en,
            title_ar: req.title_ar,
            body_en: req.body_en,
            body_ar: req.body_ar,
            image_url: req.image_url,
            event_date: req.event_date,
            created_at: now,
            updated_at: now,
        };
        self.content.lock().unwrap().push(item.clone());
        Ok(item)
    }

    async fn update_content(
        &self,
        kind: ContentKind,
        id: Uuid,
        req: UpdateContentRequest,
    ) -> RepoResult<Option<ContentItem>> {
        self.check()?;
        let mut content = self.content.lock().unwrap();
        let Some(item) = content.iter_mut().find(|i| i.kind == kind && i.id == id) else {
            return Ok(None);
        };
        if let Some(v) = req.title_en {
            item.title_en = v;
        }
        if let Some(v) = req.title_ar {
            item.title_ar = v;
        }
        if let Some(v) = req.body_en {
            item.body_en = v;
        }
        if let Some(v) = req.body_ar {
            item.body_ar = v;
        }
        if let Some(v) = req.image_url {
            item.image_url = v;
        }
        if let Some(v) = req.event_date {
            item.event_date = v;
        }
        item.updated_at = Utc::now();
        Ok(Some(item.clone()))
    }

    async fn delete_content(&self, kind: ContentKind, id: Uuid) -> RepoResult<bool> {
        self.check()?;
        let mut content = self.content.lock().unwrap();
        let before = content.len();
        content.retain(|i| !(i.kind == kind && i.id == id));
        Ok(content.len() < before)
    }

    async fn count_content(&self, kind: ContentKind) -> RepoResult<i64> {
        self.check()?;
        Ok(self
            .content
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.kind == kind)
            .count() as i64)
    }
}

// --- Fixtures ---

pub fn admin_user() -> User {
    User {
        id: ADMIN_ID,
        email: ADMIN_EMAIL.to_string(),
        role: "user".to_string(),
    }
}

pub fn member_user() -> User {
    User {
        id: MEMBER_ID,
        email: MEMBER_EMAIL.to_string(),
        role: "user".to_string(),
    }
}

pub fn mock_auth() -> MockAuthProvider {
    MockAuthProvider::new(vec![
        (admin_user(), PASSWORD.to_string()),
        (member_user(), PASSWORD.to_string()),
    ])
}

pub fn bilingual_item(kind: ContentKind, title_en: &str, title_ar: &str) -> ContentItem {
    let now = Utc::now();
    ContentItem {
        id: Uuid::new_v4(),
        kind,
        title_en: title_en.to_string(),
        title_ar: title_ar.to_string(),
        body_en: format!("{title_en} body"),
        body_ar: format!("{title_ar} نص"),
        image_url: None,
        event_date: None,
        created_at: now,
        updated_at: now,
    }
}

/// AppState with the given repository and auth provider; mock storage and default config.
pub fn test_state(repo: InMemoryRepository, auth: AuthProviderState) -> AppState {
    let config = AppConfig::default();
    AppState {
        repo: Arc::new(repo),
        auth,
        session: SessionStore::from_config(&config),
        storage: Arc::new(MockStorageService::new()),
        config,
    }
}

/// Default state: admin allow-list contains `ADMIN_ID` only.
pub fn default_state() -> AppState {
    test_state(
        InMemoryRepository::default().with_admin(ADMIN_ID),
        Arc::new(mock_auth()),
    )
}

// --- HTTP helpers ---

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get_with_cookie(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

/// Turns `Set-Cookie` headers into a `Cookie` request header value,
/// skipping cookies that were cleared.
pub fn cookie_header(set_cookies: &[String]) -> String {
    set_cookies
        .iter()
        .filter_map(|c| c.split(';').next())
        .filter(|pair| !pair.ends_with('='))
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn location(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .map(|v| v.to_str().unwrap().to_string())
}
