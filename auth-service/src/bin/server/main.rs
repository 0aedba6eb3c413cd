use std::sync::Arc;

use auth::Authenticator;
use auth::PasswordHasher;
use auth_service::config::Config;
use auth_service::config::StoreBackend;
use auth_service::domain::user::ports::AuthServicePort;
use auth_service::domain::user::service::AuthService;
use auth_service::inbound::http::router::create_router;
use auth_service::outbound::repositories::InMemoryUserRepository;
use auth_service::outbound::repositories::PostgresUserRepository;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "auth_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "auth-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_address = %config.http_address(),
        token_ttl_secs = config.jwt.expiration_secs,
        store_timeout_ms = config.database.store_timeout_ms,
        "Configuration loaded"
    );
    if config.uses_default_secret() {
        tracing::warn!("Using the development JWT secret; set AUTH_JWT__SECRET in production");
    }

    let password_hasher = PasswordHasher::with_cost(
        config.hashing.memory_kib,
        config.hashing.iterations,
        config.hashing.parallelism,
    )?;
    let authenticator = Arc::new(
        Authenticator::new(config.jwt.secret.as_bytes(), config.token_ttl())
            .with_password_hasher(password_hasher)
            .with_leeway(config.jwt.leeway_secs),
    );

    let (auth_service, pg_pool): (Arc<dyn AuthServicePort>, Option<PgPool>) =
        match config.database.backend {
            StoreBackend::Postgres => {
                let pg_pool = connect_postgres(&config).await?;
                let user_repository = Arc::new(PostgresUserRepository::new(pg_pool.clone()));
                let auth_service: Arc<dyn AuthServicePort> = Arc::new(
                    AuthService::new(user_repository, Arc::clone(&authenticator))
                        .with_store_timeout(config.store_timeout()),
                );
                (auth_service, Some(pg_pool))
            }
            StoreBackend::Memory => {
                tracing::warn!("Using the in-memory user store; accounts are lost on restart");
                let user_repository = Arc::new(InMemoryUserRepository::new());
                let auth_service: Arc<dyn AuthServicePort> = Arc::new(
                    AuthService::new(user_repository, Arc::clone(&authenticator))
                        .with_store_timeout(config.store_timeout()),
                );
                (auth_service, None)
            }
        };

    let http_address = config.http_address();
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(auth_service, authenticator, config.request_timeout());

    axum::serve(http_listener, http_application)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pg_pool) = pg_pool {
        tracing::info!("Draining database connections");
        if tokio::time::timeout(config.shutdown_timeout(), pg_pool.close())
            .await
            .is_err()
        {
            tracing::warn!("Database pool did not close before the shutdown timeout");
        }
    }

    tracing::info!("Server exited successfully");

    Ok(())
}

async fn connect_postgres(config: &Config) -> Result<PgPool, anyhow::Error> {
    let pg_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(
            config.database.acquire_timeout_secs,
        ))
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = config.database.max_connections,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    Ok(pg_pool)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, stopping server");
}
