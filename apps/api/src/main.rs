use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use interview_api::config::Config;
use interview_api::db::create_pool;
use interview_api::store::{InMemoryRegistrationStore, PgRegistrationStore, RegistrationStore};
use interview_api::{build_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http={}",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log,
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Interview API v{}", env!("CARGO_PKG_VERSION"));

    let (store, backend): (Arc<dyn RegistrationStore>, &'static str) = match &config.database_url
    {
        Some(url) => {
            let pool = create_pool(url, config.database_max_connections).await?;
            let store = PgRegistrationStore::new(pool);
            if config.run_migrations {
                store
                    .run_migrations()
                    .await
                    .context("Failed to apply database migrations")?;
                info!("Database migrations applied");
            }
            (Arc::new(store), "postgres")
        }
        None => {
            warn!("No database configured; registrations are kept in memory and lost on exit");
            (Arc::new(InMemoryRegistrationStore::new()), "memory")
        }
    };

    if config.not_found_lists_known_ids {
        warn!("NOT_FOUND_LISTS_KNOWN_IDS is on; 404 bodies will list every registration id");
    }

    let state = AppState::new(store, backend, &config);

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
