//! # Tillpoint API Server
//!
//! The REST backend for the Tillpoint multi-tenant point-of-sale system:
//! login, product catalog, checkout, returns, cash handovers, dashboard
//! KPIs, and staff management, all scoped per shop.
//!
//! ## Usage
//!
//! ```bash
//! # against PostgreSQL
//! DATABASE_URL=postgres://localhost/tillpoint JWT_SECRET=$(openssl rand -hex 32) \
//!     cargo run -p tillpoint-api
//!
//! # or fully self-contained with the in-memory demo store
//! STORAGE_BACKEND=memory JWT_SECRET=$(openssl rand -hex 32) \
//!     cargo run -p tillpoint-api
//! ```

use std::sync::Arc;

use sqlx::PgPool;
use tillpoint_api::app::{build_router, AppState};
use tillpoint_api::config::{Config, StorageBackend};
use tillpoint_shared::db::migrations::{ensure_database_exists, run_migrations};
use tillpoint_shared::db::pool::{close_pool, create_pool, DatabaseConfig};
use tillpoint_shared::storage::memory::MemStorage;
use tillpoint_shared::storage::postgres::PgStorage;
use tillpoint_shared::storage::Storage;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tillpoint_api=debug,tillpoint_shared=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Tillpoint API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;
    let bind_address = config.bind_address();

    // Pick the storage backend once at startup; everything downstream only
    // sees the Storage trait
    let mut pg_pool: Option<PgPool> = None;
    let storage: Arc<dyn Storage> = match config.storage.backend {
        StorageBackend::Postgres => {
            let url = config
                .storage
                .database_url
                .clone()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required for postgres storage"))?;

            ensure_database_exists(&url).await?;

            let pool = create_pool(DatabaseConfig {
                url,
                max_connections: config.storage.max_connections,
                ..Default::default()
            })
            .await?;

            run_migrations(&pool).await?;

            pg_pool = Some(pool.clone());
            Arc::new(PgStorage::new(pool))
        }
        StorageBackend::Memory => Arc::new(MemStorage::with_demo_data().await?),
    };

    tracing::info!(backend = storage.backend_name(), "Storage ready");

    let app = build_router(AppState::new(storage, config));

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pool) = pg_pool {
        close_pool(pool).await;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Resolves when the process receives ctrl-c
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}
