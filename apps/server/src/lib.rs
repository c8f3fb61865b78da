//! # tally-server: Dashboard JSON API
//!
//! Serves the ERP's dashboard pages as JSON over HTTP.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         tally-server                                    │
//! │                                                                         │
//! │  HTTP request                                                          │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  api::router ──► handlers::<page> ──► tally-core (ledger, orders, ids) │
//! │                        │                                                │
//! │                        ▼                                                │
//! │                  state.stores (Store<T>)                                │
//! │                   ├── InMemoryStore  (backend = "memory")               │
//! │                   └── SQLite repos   (backend = "sqlite")               │
//! │                                                                         │
//! │  Failures ──► ApiError { code, message } + HTTP status                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! ```text
//! tally_server/
//! ├── api.rs       ◄─── Router assembly and fallback
//! ├── config.rs    ◄─── AppConfig layering (defaults, TOML, TALLY_* env)
//! ├── error.rs     ◄─── ApiError, ServerError
//! ├── handlers/    ◄─── One module per page
//! └── state.rs     ◄─── AppState (stores + ledger settings)
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub use config::AppConfig;
pub use error::{ApiError, ApiResult, ServerError};
pub use state::{AppState, SharedState};

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tally=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// Builds the state and serves until ctrl-c.
pub async fn run(config: AppConfig) -> Result<(), ServerError> {
    let state = AppState::build(&config).await?.shared();
    let db = state.db.clone();
    let app = api::router(state);

    let bind_addr = config.server.bind_address();
    let listener = TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, backend = %config.store.backend, "Tally server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(db) = db {
        db.close().await;
    }
    info!("Tally server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
