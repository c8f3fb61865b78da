//! # tally-db: Storage Layer for Tally ERP
//!
//! Every record the ERP keeps is read and written through this crate.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally ERP Data Flow                              │
//! │                                                                         │
//! │  HTTP handler (apps/server)                                            │
//! │       │  state.stores.orders.list()                                    │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     tally-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   Stores ─► Arc<dyn Store<T>>                                   │   │
//! │  │                 │                                               │   │
//! │  │       ┌─────────┴──────────┐                                    │   │
//! │  │       ▼                    ▼                                    │   │
//! │  │   InMemoryStore<T>     *Repository (SQLite)                     │   │
//! │  │   (mock dataset)       Database pool + migrations               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`store`] - The `Store<T>` trait and the in-memory implementation
//! - [`stores`] - One store per entity, built for a backend
//! - [`pool`] - SQLite connection pool and repository access
//! - [`repository`] - SQLite `Store<T>` implementations
//! - [`migrations`] - Embedded schema migrations
//! - [`mock`] - The demo dataset
//! - [`error`] - Storage error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tally_db::{Database, DbConfig, Stores};
//!
//! let db = Database::new(DbConfig::new("tally.db")).await?;
//! let stores = Stores::sqlite(&db);
//! let open = stores.orders.list().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod mock;
pub mod pool;
pub mod repository;
pub mod store;
pub mod stores;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use mock::MockDataset;
pub use pool::{Database, DbConfig};
pub use store::{InMemoryStore, Store};
pub use stores::Stores;
