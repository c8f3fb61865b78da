//! # Store Bundle
//!
//! [`Stores`] holds one `Arc<dyn Store<_>>` per entity. The server builds it
//! once at startup from the `[store]` configuration and every handler works
//! against it without knowing which backend is behind it.
//!
//! ```text
//!   backend = "memory"  ──► Stores::in_memory() / Stores::load(MockDataset)
//!   backend = "sqlite"  ──► Stores::sqlite(&Database)
//! ```

use std::sync::Arc;
use tracing::info;

use crate::error::DbResult;
use crate::mock::MockDataset;
use crate::pool::Database;
use crate::store::{InMemoryStore, Store};
use tally_core::{
    Customer, Order, Product, ProductPrice, Purchase, SalesTransaction, Supplier,
    SupplierTransaction,
};

/// Every entity store the application uses.
#[derive(Clone)]
pub struct Stores {
    pub customers: Arc<dyn Store<Customer>>,
    pub products: Arc<dyn Store<Product>>,
    pub product_prices: Arc<dyn Store<ProductPrice>>,
    pub purchases: Arc<dyn Store<Purchase>>,
    pub orders: Arc<dyn Store<Order>>,
    pub sales: Arc<dyn Store<SalesTransaction>>,
    pub suppliers: Arc<dyn Store<Supplier>>,
    pub supplier_transactions: Arc<dyn Store<SupplierTransaction>>,
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores").finish_non_exhaustive()
    }
}

impl Stores {
    /// Empty in-memory stores.
    pub fn in_memory() -> Self {
        Stores {
            customers: Arc::new(InMemoryStore::new()),
            products: Arc::new(InMemoryStore::new()),
            product_prices: Arc::new(InMemoryStore::new()),
            purchases: Arc::new(InMemoryStore::new()),
            orders: Arc::new(InMemoryStore::new()),
            sales: Arc::new(InMemoryStore::new()),
            suppliers: Arc::new(InMemoryStore::new()),
            supplier_transactions: Arc::new(InMemoryStore::new()),
        }
    }

    /// In-memory stores pre-filled with a dataset.
    pub fn from_dataset(data: MockDataset) -> Self {
        Stores {
            customers: Arc::new(InMemoryStore::with_records(data.customers)),
            products: Arc::new(InMemoryStore::with_records(data.products)),
            product_prices: Arc::new(InMemoryStore::with_records(data.product_prices)),
            purchases: Arc::new(InMemoryStore::with_records(data.purchases)),
            orders: Arc::new(InMemoryStore::with_records(data.orders)),
            sales: Arc::new(InMemoryStore::with_records(data.sales)),
            suppliers: Arc::new(InMemoryStore::with_records(data.suppliers)),
            supplier_transactions: Arc::new(InMemoryStore::with_records(
                data.supplier_transactions,
            )),
        }
    }

    /// SQLite repositories sharing one pool.
    pub fn sqlite(db: &Database) -> Self {
        Stores {
            customers: Arc::new(db.customers()),
            products: Arc::new(db.products()),
            product_prices: Arc::new(db.product_prices()),
            purchases: Arc::new(db.purchases()),
            orders: Arc::new(db.orders()),
            sales: Arc::new(db.sales()),
            suppliers: Arc::new(db.suppliers()),
            supplier_transactions: Arc::new(db.supplier_transactions()),
        }
    }

    /// Writes a dataset into these stores.
    ///
    /// Parents go first (customers before price lists, suppliers before
    /// their ledger lines and purchases) so SQLite foreign keys hold.
    pub async fn load(&self, data: MockDataset) -> DbResult<()> {
        info!(
            customers = data.customers.len(),
            products = data.products.len(),
            suppliers = data.suppliers.len(),
            orders = data.orders.len(),
            "Loading dataset"
        );

        self.customers.upsert_many(data.customers).await?;
        self.products.upsert_many(data.products).await?;
        self.suppliers.upsert_many(data.suppliers).await?;
        self.product_prices.upsert_many(data.product_prices).await?;
        self.supplier_transactions
            .upsert_many(data.supplier_transactions)
            .await?;
        self.purchases.upsert_many(data.purchases).await?;
        self.orders.upsert_many(data.orders).await?;
        self.sales.upsert_many(data.sales).await?;
        Ok(())
    }

    /// True if no customer, product or supplier exists yet.
    pub async fn is_empty(&self) -> DbResult<bool> {
        Ok(self.customers.list().await?.is_empty()
            && self.products.list().await?.is_empty()
            && self.suppliers.list().await?.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::DbConfig;

    #[tokio::test]
    async fn test_dataset_loads_identically_into_both_backends() {
        let memory = Stores::from_dataset(MockDataset::demo().unwrap());

        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let sqlite = Stores::sqlite(&db);
        assert!(sqlite.is_empty().await.unwrap());
        sqlite.load(MockDataset::demo().unwrap()).await.unwrap();

        assert_eq!(
            memory.customers.list().await.unwrap(),
            sqlite.customers.list().await.unwrap()
        );
        assert_eq!(
            memory.products.list().await.unwrap(),
            sqlite.products.list().await.unwrap()
        );
        assert_eq!(
            memory.orders.list().await.unwrap(),
            sqlite.orders.list().await.unwrap()
        );
        assert_eq!(
            memory.purchases.list().await.unwrap(),
            sqlite.purchases.list().await.unwrap()
        );
        assert_eq!(
            memory.product_prices.list().await.unwrap(),
            sqlite.product_prices.list().await.unwrap()
        );
    }
}
