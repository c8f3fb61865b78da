//! # Application State
//!
//! Everything a handler needs, built once at startup and shared through
//! axum's `State` extractor.
//!
//! ```text
//! AppConfig ──► AppState::build()
//!                 │
//!                 ├── [store] backend = "memory"
//!                 │       seed_mock_data ? Stores::from_dataset(demo) : Stores::in_memory()
//!                 │
//!                 └── [store] backend = "sqlite"
//!                         Database::new(path) ──► Stores::sqlite(&db)
//!                         seed_mock_data && empty ? load(demo)
//! ```

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::info;

use crate::config::{AppConfig, LedgerSettings, StoreBackend};
use crate::error::ServerError;
use tally_db::{Database, DbConfig, MockDataset, Stores};

/// Handle passed to every handler.
pub type SharedState = Arc<AppState>;

#[derive(Debug)]
pub struct AppState {
    pub stores: Stores,
    pub ledger: LedgerSettings,
    pub backend: StoreBackend,

    /// Present only for the SQLite backend; used by the health check.
    pub db: Option<Database>,
}

impl AppState {
    /// Builds the stores selected by `config.store`.
    pub async fn build(config: &AppConfig) -> Result<Self, ServerError> {
        let settings = &config.store;

        let (stores, db) = match settings.backend {
            StoreBackend::Memory => {
                let stores = if settings.seed_mock_data {
                    Stores::from_dataset(MockDataset::demo()?)
                } else {
                    Stores::in_memory()
                };
                (stores, None)
            }
            StoreBackend::Sqlite => {
                let path = settings.resolved_database_path();
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }

                let db = Database::new(
                    DbConfig::new(path).max_connections(settings.max_connections),
                )
                .await?;
                let stores = Stores::sqlite(&db);

                if settings.seed_mock_data && stores.is_empty().await? {
                    info!("Empty database, loading demo dataset");
                    stores.load(MockDataset::demo()?).await?;
                }
                (stores, Some(db))
            }
        };

        info!(backend = %settings.backend, "Stores ready");

        Ok(AppState {
            stores,
            ledger: config.ledger,
            backend: settings.backend,
            db,
        })
    }

    /// State over the given stores, for tests and embedding.
    pub fn with_stores(stores: Stores, ledger: LedgerSettings) -> Self {
        AppState {
            stores,
            ledger,
            backend: StoreBackend::Memory,
            db: None,
        }
    }

    pub fn shared(self) -> SharedState {
        Arc::new(self)
    }

    /// Date stamped on records created without an explicit date.
    pub fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    /// True if the backing store answers.
    pub async fn healthy(&self) -> bool {
        match &self.db {
            Some(db) => db.health_check().await,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_backend_seeds_demo() {
        let config = AppConfig::default();
        let state = AppState::build(&config).await.unwrap();

        assert_eq!(state.backend, StoreBackend::Memory);
        assert!(!state.stores.is_empty().await.unwrap());
        assert!(state.healthy().await);
    }

    #[tokio::test]
    async fn test_memory_backend_without_seed_is_empty() {
        let mut config = AppConfig::default();
        config.store.seed_mock_data = false;
        let state = AppState::build(&config).await.unwrap();

        assert!(state.stores.is_empty().await.unwrap());
    }
}
