//! Rollcall Server - school attendance
//!
//! REST API over the attendance reconciler.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rollcall_server::{
    api,
    config::{AppConfig, LoggingConfig, StoreBackend},
    repository::{DocumentStore, MemoryStore, PgStore, Repository},
    services::SystemClock,
    AppState,
};

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("rollcall_server={},tower_http=debug", logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;

    init_tracing(&config.logging);

    tracing::info!("Starting Rollcall Server v{}", env!("CARGO_PKG_VERSION"));

    let store: Arc<dyn DocumentStore> = match config.store.backend {
        StoreBackend::Postgres => {
            let store = PgStore::connect(&config.store).await?;
            tracing::info!("Connected to Postgres document store");
            Arc::new(store)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory document store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    let state = AppState::new(config, Repository::new(store), Arc::new(SystemClock));
    let app = api::create_router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
