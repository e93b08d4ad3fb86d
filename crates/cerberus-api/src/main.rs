//! cerberus-api server binary.

use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cerberus_api::{parse_allowed_origins, router, AppState};
use cerberus_db::{Database, PoolConfig};
use cerberus_resolution::{IdentityResolutionEngine, ResolutionConfig};

/// Initialize tracing from the environment.
///
/// Environment variables:
///   LOG_FORMAT  - "json" or "text" (default: "text")
///   LOG_FILE    - path to log file (optional, enables daily-rotated file logging)
///   LOG_ANSI    - "true"/"false" override ANSI colors
///   RUST_LOG    - standard env filter
///
/// The returned guard must live as long as the process when file logging is on.
fn init_tracing() -> Option<WorkerGuard> {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");
    let json = log_format == "json";

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "cerberus_api=debug,cerberus_resolution=debug,cerberus_db=info,tower_http=debug".into()
    });
    let registry = tracing_subscriber::registry().with(env_filter);

    let guard = match log_file.as_deref() {
        Some(path) => {
            let path = std::path::Path::new(path);
            let dir = path.parent().unwrap_or(std::path::Path::new("."));
            let file_name = path
                .file_name()
                .and_then(|f| f.to_str())
                .unwrap_or("cerberus-api.log");
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, file_name));
            if json {
                registry
                    .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
                    .init();
            } else {
                registry
                    .with(
                        tracing_subscriber::fmt::layer()
                            .with_writer(writer)
                            .with_ansi(log_ansi.unwrap_or(false)),
                    )
                    .init();
            }
            Some(guard)
        }
        None => {
            if json {
                registry
                    .with(tracing_subscriber::fmt::layer().json())
                    .init();
            } else {
                let mut layer = tracing_subscriber::fmt::layer();
                if let Some(ansi) = log_ansi {
                    layer = layer.with_ansi(ansi);
                }
                registry.with(layer).init();
            }
            None
        }
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );
    guard
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let _log_guard = init_tracing();

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgres://localhost/cerberus".to_string());
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .unwrap_or(3000);

    let pool_config = PoolConfig::from_env()?;
    let resolution_config = ResolutionConfig::from_env()?;
    info!(
        max_mentions = resolution_config.max_mentions,
        strong_threshold = resolution_config.strong_threshold,
        weak_threshold = resolution_config.weak_threshold,
        stakeholder_match_threshold = resolution_config.stakeholder_match_threshold,
        "Resolution configuration loaded"
    );

    let db = Database::connect_with_config(&database_url, pool_config).await?;
    info!("Connected to database");
    db.migrate().await?;
    info!("Migrations applied");

    let engine = IdentityResolutionEngine::new(db, resolution_config);
    let allowed_origins =
        parse_allowed_origins(&std::env::var("ALLOWED_ORIGINS").unwrap_or_default());
    info!(origins = allowed_origins.len(), "CORS origins configured");

    let app = router(AppState::new(engine), allowed_origins);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
