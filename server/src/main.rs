//! Dididaren Dispatch Server
//!
//! HTTP backend for emergency-assistance coordination: users report
//! incidents, security staff accept and resolve them, risk zones are tracked
//! and staff receive ratings.

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use dididaren_server::{
    app_state::AppState,
    auth::JwtKeys,
    config::AppConfig,
    middleware::{cors_layer, request_tracing},
    routes::app_router,
    store::{MemoryStore, PgStore, SharedStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("dididaren_server=info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env().context("invalid configuration")?;

    let store: SharedStore = match &config.database_url {
        Some(url) => {
            let store = PgStore::connect(url, config.database_max_connections, config.store_timeout)
                .await
                .context("failed to connect to Postgres")?;
            store.migrate().await.context("failed to run migrations")?;
            info!("using Postgres record store");
            Arc::new(store)
        }
        None => {
            warn!("DATABASE_URL not set; records are kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    let jwt_keys = JwtKeys::new(&config.jwt_secret, config.jwt_ttl_hours);
    let state = AppState::new(store, jwt_keys, config.dispatch_radius_meters);

    let app = app_router(state)
        .layer(cors_layer(&config.cors_allowed_origins))
        .layer(request_tracing());

    let addr = config.listen_addr();
    info!("Server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
