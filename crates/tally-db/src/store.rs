//! # Store Abstraction
//!
//! Every page handler reads and writes records through [`Store<T>`], so the
//! same handler runs against the in-memory mock dataset, against SQLite, and
//! inside unit tests.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Store<T: Entity>                                │
//! │                                                                         │
//! │   get(id) ─► Option<T>      list() ─► Vec<T>                           │
//! │   upsert(T) ─► T            delete(id) ─► bool                          │
//! │                                                                         │
//! │   ┌──────────────────────┐        ┌──────────────────────────────┐     │
//! │   │   InMemoryStore<T>   │        │  SQLite repositories         │     │
//! │   │   RwLock<Vec<T>>     │        │  (repository/*.rs)           │     │
//! │   │   mock dataset, tests│        │  persistent backend          │     │
//! │   └──────────────────────┘        └──────────────────────────────┘     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Consistency
//! Each call is atomic on its own. A handler that reads, computes and then
//! writes several records holds no lock across those steps, so two
//! concurrent handlers can still lose each other's updates.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{DbError, DbResult};
use tally_core::Entity;

// =============================================================================
// Store Trait
// =============================================================================

/// Keyed record storage for one entity type.
#[async_trait]
pub trait Store<T: Entity>: Send + Sync {
    /// Fetches one record.
    async fn get(&self, id: &T::Id) -> DbResult<Option<T>>;

    /// Fetches every record.
    ///
    /// SQLite orders by id; the in-memory store keeps insertion order.
    async fn list(&self) -> DbResult<Vec<T>>;

    /// Inserts the record or replaces the one with the same id.
    async fn upsert(&self, record: T) -> DbResult<T>;

    /// Removes a record. Returns false if it did not exist.
    async fn delete(&self, id: &T::Id) -> DbResult<bool>;

    /// Fetches one record or fails with [`DbError::NotFound`].
    async fn require(&self, id: &T::Id) -> DbResult<T> {
        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found(T::NAME, id))
    }

    /// Upserts several records one after another.
    ///
    /// Not atomic: a failure part-way leaves the earlier records written.
    async fn upsert_many(&self, records: Vec<T>) -> DbResult<()> {
        for record in records {
            self.upsert(record).await?;
        }
        Ok(())
    }
}

// =============================================================================
// In-Memory Store
// =============================================================================

/// A [`Store`] over a locked `Vec`, preserving insertion order.
#[derive(Debug)]
pub struct InMemoryStore<T> {
    records: RwLock<Vec<T>>,
}

impl<T: Entity> Default for InMemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> InMemoryStore<T> {
    pub fn new() -> Self {
        InMemoryStore {
            records: RwLock::new(Vec::new()),
        }
    }

    /// Creates a store pre-filled with `records`.
    pub fn with_records(records: Vec<T>) -> Self {
        InMemoryStore {
            records: RwLock::new(records),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl<T: Entity> Store<T> for InMemoryStore<T> {
    async fn get(&self, id: &T::Id) -> DbResult<Option<T>> {
        let records = self.records.read().await;
        Ok(records.iter().find(|r| r.id() == *id).cloned())
    }

    async fn list(&self) -> DbResult<Vec<T>> {
        Ok(self.records.read().await.clone())
    }

    async fn upsert(&self, record: T) -> DbResult<T> {
        let mut records = self.records.write().await;
        let id = record.id();
        match records.iter_mut().find(|r| r.id() == id) {
            Some(existing) => *existing = record.clone(),
            None => records.push(record.clone()),
        }
        Ok(record)
    }

    async fn delete(&self, id: &T::Id) -> DbResult<bool> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.id() != *id);
        Ok(records.len() != before)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
