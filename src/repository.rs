use crate::models::{ContentItem, ContentKind, CreateContentRequest, UpdateContentRequest, User, UserCredentials};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// RepoError
///
/// Any failure of the underlying store. Callers map it to a 500; absence of a
/// row is never an error and is expressed as `None`/`false` instead.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository Trait
///
/// The abstract contract for every persistence operation: the read-only user
/// and admin allow-list lookups used by auth, and the identifier-scoped content
/// operations used by the public site and the CMS.
///
/// **Send + Sync + async_trait** make `Arc<dyn Repository>` shareable across
/// Axum's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users & Allow-list ---
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>>;
    // Case-insensitive lookup used by the local auth backend.
    async fn find_credentials(&self, email: &str) -> RepoResult<Option<UserCredentials>>;
    // True iff an `admin_users` row exists for the id.
    async fn is_admin(&self, user_id: Uuid) -> RepoResult<bool>;

    // --- Content ---
    async fn list_content(&self, kind: ContentKind) -> RepoResult<Vec<ContentItem>>;
    async fn get_content(&self, kind: ContentKind, id: Uuid) -> RepoResult<Option<ContentItem>>;
    async fn create_content(&self, kind: ContentKind, req: CreateContentRequest) -> RepoResult<ContentItem>;
    // Partial update; `None` when the row does not exist.
    async fn update_content(
        &self,
        kind: ContentKind,
        id: Uuid,
        req: UpdateContentRequest,
    ) -> RepoResult<Option<ContentItem>>;
    // Returns true if a row was deleted.
    async fn delete_content(&self, kind: ContentKind, id: Uuid) -> RepoResult<bool>;
    async fn count_content(&self, kind: ContentKind) -> RepoResult<i64>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// `Repository` backed by PostgreSQL. Table names are interpolated only from
/// `ContentKind::table`, every value goes through a bind parameter.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const CONTENT_COLUMNS: &str =
    "id, title_en, title_ar, body_en, body_ar, image_url, event_date, created_at, updated_at";

fn order_clause(kind: ContentKind) -> &'static str {
    match kind {
        // Upcoming and recent events first; undated ones last.
        ContentKind::Activity => "ORDER BY event_date DESC NULLS LAST, created_at DESC",
        ContentKind::News | ContentKind::Gallery => "ORDER BY created_at DESC",
    }
}

fn tag(kind: ContentKind) -> impl Fn(ContentItem) -> ContentItem {
    move |item| ContentItem { kind, ..item }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_user(&self, id: Uuid) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT id, email, role FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_credentials(&self, email: &str) -> RepoResult<Option<UserCredentials>> {
        let creds = sqlx::query_as::<_, UserCredentials>(
            "SELECT id, email, role, password_hash FROM users WHERE lower(email) = lower($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(creds)
    }

    async fn is_admin(&self, user_id: Uuid) -> RepoResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM admin_users WHERE id = $1)",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn list_content(&self, kind: ContentKind) -> RepoResult<Vec<ContentItem>> {
        let sql = format!(
            "SELECT {CONTENT_COLUMNS} FROM {} {}",
            kind.table(),
            order_clause(kind)
        );
        let items = sqlx::query_as::<_, ContentItem>(&sql)
            .fetch_all(&self.pool)
            .await
            .inspect_err(|e| tracing::error!(table = kind.table(), "list_content error: {:?}", e))?;
        Ok(items.into_iter().map(tag(kind)).collect())
    }

    async fn get_content(&self, kind: ContentKind, id: Uuid) -> RepoResult<Option<ContentItem>> {
        let sql = format!("SELECT {CONTENT_COLUMNS} FROM {} WHERE id = $1", kind.table());
        let item = sqlx::query_as::<_, ContentItem>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item.map(tag(kind)))
    }

    async fn create_content(&self, kind: ContentKind, req: CreateContentRequest) -> RepoResult<ContentItem> {
        let sql = format!(
            "INSERT INTO {} (id, title_en, title_ar, body_en, body_ar, image_url, event_date, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, NOW(), NOW()) \
             RETURNING {CONTENT_COLUMNS}",
            kind.table()
        );
        let item = sqlx::query_as::<_, ContentItem>(&sql)
            .bind(Uuid::new_v4())
            .bind(req.title_en)
            .bind(req.title_ar)
            .bind(req.body_en)
            .bind(req.body_ar)
            .bind(req.image_url)
            .bind(req.event_date)
            .fetch_one(&self.pool)
            .await
            .inspect_err(|e| tracing::error!(table = kind.table(), "create_content error: {:?}", e))?;
        Ok(tag(kind)(item))
    }

    async fn update_content(
        &self,
        kind: ContentKind,
        id: Uuid,
        req: UpdateContentRequest,
    ) -> RepoResult<Option<ContentItem>> {
        let sql = format!(
            r#"
            UPDATE {}
            SET title_en = COALESCE($2, title_en),
                title_ar = COALESCE($3, title_ar),
                body_en = COALESCE($4, body_en),
                body_ar = COALESCE($5, body_ar),
                image_url = CASE WHEN $8 THEN $6 ELSE image_url END,
                event_date = CASE WHEN $9 THEN $7 ELSE event_date END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {CONTENT_COLUMNS}
            "#,
            kind.table()
        );
        let item = sqlx::query_as::<_, ContentItem>(&sql)
            .bind(id)
            .bind(req.title_en)
            .bind(req.title_ar)
            .bind(req.body_en)
            .bind(req.body_ar)
            .bind(req.image_url.clone().flatten())
            .bind(req.event_date.flatten())
            .bind(req.image_url.is_some())
            .bind(req.event_date.is_some())
            .fetch_optional(&self.pool)
            .await?;
        Ok(item.map(tag(kind)))
    }

    async fn delete_content(&self, kind: ContentKind, id: Uuid) -> RepoResult<bool> {
        let sql = format!("DELETE FROM {} WHERE id = $1", kind.table());
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_content(&self, kind: ContentKind) -> RepoResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", kind.table());
        let count = sqlx::query_scalar::<_, i64>(&sql).fetch_one(&self.pool).await?;
        Ok(count)
    }
}
