//! Runs against a real Postgres. Ignored by default:
//! `DATABASE_URL=... cargo test --test repository_integration_tests -- --ignored`

use community_portal::{
    models::{ContentKind, CreateContentRequest, UpdateContentRequest},
    repository::{PostgresRepository, Repository},
};
use sqlx::PgPool;
use uuid::Uuid;

// --- Test Context and Setup ---

struct DbTestContext {
    pool: PgPool,
}

impl DbTestContext {
    async fn setup() -> Self {
        dotenv::dotenv().ok();

        let db_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set to run integration tests");

        let pool = PgPool::connect(&db_url)
            .await
            .expect("Failed to connect to database for integration tests.");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run database migrations.");

        DbTestContext { pool }
    }

    fn repository(&self) -> PostgresRepository {
        PostgresRepository::new(self.pool.clone())
    }
}

// --- Test Data Helpers ---

async fn create_test_user(pool: &PgPool, admin: bool) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (id, email, role, password_hash) VALUES ($1, $2, 'user', '')")
        .bind(id)
        .bind(format!("{}@Test.Community.org", id))
        .execute(pool)
        .await
        .expect("Failed to create test user");

    if admin {
        sqlx::query("INSERT INTO admin_users (id) VALUES ($1)")
            .bind(id)
            .execute(pool)
            .await
            .expect("Failed to grant admin");
    }
    id
}

fn request(title_en: &str, title_ar: &str) -> CreateContentRequest {
    CreateContentRequest {
        title_en: title_en.to_string(),
        title_ar: title_ar.to_string(),
        body_en: "body".to_string(),
        body_ar: "نص".to_string(),
        image_url: None,
        event_date: None,
    }
}

// --- Tests ---

#[tokio::test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_admin_allow_list() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();

    let admin = create_test_user(&ctx.pool, true).await;
    let member = create_test_user(&ctx.pool, false).await;

    assert!(repo.is_admin(admin).await.unwrap());
    assert!(!repo.is_admin(member).await.unwrap());
    assert!(!repo.is_admin(Uuid::new_v4()).await.unwrap());
}

#[tokio::test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_find_credentials_is_case_insensitive() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let id = create_test_user(&ctx.pool, false).await;

    let creds = repo
        .find_credentials(&format!("{}@test.community.org", id))
        .await
        .unwrap()
        .expect("user should be found");
    assert_eq!(creds.id, id);

    let user = repo.get_user(id).await.unwrap().expect("user by id");
    assert_eq!(user.role, "user");
}

#[tokio::test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_content_crud_is_scoped_to_its_table() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();

    let created = repo
        .create_content(ContentKind::News, request("Headline", "عنوان"))
        .await
        .unwrap();
    assert_eq!(created.kind, ContentKind::News);

    // Same id, different table: not visible.
    assert!(repo
        .get_content(ContentKind::Gallery, created.id)
        .await
        .unwrap()
        .is_none());

    let updated = repo
        .update_content(
            ContentKind::News,
            created.id,
            UpdateContentRequest {
                title_en: Some("Updated".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .expect("row exists");
    assert_eq!(updated.title_en, "Updated");
    assert_eq!(updated.title_ar, "عنوان");
    assert!(updated.updated_at >= created.updated_at);

    assert!(repo.delete_content(ContentKind::News, created.id).await.unwrap());
    assert!(!repo.delete_content(ContentKind::News, created.id).await.unwrap());
    assert!(repo
        .update_content(ContentKind::News, created.id, UpdateContentRequest::default())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_activities_are_ordered_by_event_date() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();

    let mut early = request("Early", "مبكر");
    early.event_date = chrono::NaiveDate::from_ymd_opt(2030, 1, 1);
    let mut late = request("Late", "متأخر");
    late.event_date = chrono::NaiveDate::from_ymd_opt(2030, 12, 31);

    let early = repo.create_content(ContentKind::Activity, early).await.unwrap();
    let late = repo.create_content(ContentKind::Activity, late).await.unwrap();

    let ids: Vec<Uuid> = repo
        .list_content(ContentKind::Activity)
        .await
        .unwrap()
        .into_iter()
        .map(|i| i.id)
        .collect();
    let pos = |id| ids.iter().position(|x| *x == id).unwrap();
    assert!(pos(late.id) < pos(early.id));

    let count = repo.count_content(ContentKind::Activity).await.unwrap();
    assert!(count >= 2);
}

#[tokio::test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn test_update_clears_nullable_columns_only_when_null_is_sent() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();

    let mut dated = request("Dated", "مؤرخ");
    dated.image_url = Some("media/activities/fair.jpg".to_string());
    dated.event_date = chrono::NaiveDate::from_ymd_opt(2031, 3, 1);
    let created = repo.create_content(ContentKind::Activity, dated).await.unwrap();

    let kept = repo
        .update_content(
            ContentKind::Activity,
            created.id,
            UpdateContentRequest {
                title_en: Some("Still dated".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .expect("row exists");
    assert_eq!(kept.image_url, created.image_url);
    assert_eq!(kept.event_date, created.event_date);

    let cleared = repo
        .update_content(
            ContentKind::Activity,
            created.id,
            UpdateContentRequest {
                image_url: Some(None),
                event_date: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .expect("row exists");
    assert_eq!(cleared.title_en, "Still dated");
    assert!(cleared.image_url.is_none());
    assert!(cleared.event_date.is_none());
}
