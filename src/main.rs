use community_portal::{
    AppState, LocalAuthProvider, SessionStore, SupabaseAuthProvider,
    auth::AuthProviderState,
    config::{AppConfig, AuthBackend, Env},
    create_router,
    repository::{PostgresRepository, RepositoryState},
    storage::{S3StorageClient, StorageService, StorageState},
};
use sqlx::postgres::PgPoolOptions;
use std::{process::ExitCode, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, initializes logging, connects the database, auth
/// provider and media store, then serves the router.
#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    // Logging is not up yet, so configuration errors go straight to stderr.
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("FATAL: invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "community_portal=debug,tower_http=info,axum=info".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("FATAL: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Application starting in {:?} mode", config.env);

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.db_url)
        .await
        .map_err(|e| format!("failed to connect to Postgres, check DATABASE_URL: {e}"))?;
    let repo = Arc::new(PostgresRepository::new(pool)) as RepositoryState;

    let auth: AuthProviderState = match &config.auth_backend {
        AuthBackend::Supabase { url, anon_key } => {
            tracing::info!(provider = %url, "using Supabase auth backend");
            Arc::new(SupabaseAuthProvider::new(url, anon_key, config.upstream_timeout)?)
        }
        AuthBackend::Local => {
            tracing::info!("using local auth backend (users table + self-issued JWTs)");
            Arc::new(LocalAuthProvider::new(
                repo.clone(),
                &config.jwt_secret,
                config.access_token_ttl,
                config.refresh_token_ttl,
            ))
        }
    };

    let s3_client = S3StorageClient::new(
        &config.s3_endpoint,
        &config.s3_region,
        &config.s3_key,
        &config.s3_secret,
        &config.s3_bucket,
    )
    .await;

    // LOCAL-ONLY: provision the MinIO bucket on first start.
    if config.env == Env::Local {
        s3_client.ensure_bucket_exists().await;
    }
    let storage = Arc::new(s3_client) as StorageState;

    let bind_addr = config.bind_addr.clone();
    let app_state = AppState {
        repo,
        auth,
        session: SessionStore::from_config(&config),
        storage,
        config,
    };

    let app = create_router(app_state);
    let listener = TcpListener::bind(&bind_addr).await?;

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    axum::serve(listener, app).await?;
    Ok(())
}
