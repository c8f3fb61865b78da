//! # Supplier Repository
//!
//! SQLite storage for suppliers. The table keeps the `supplier_id` /
//! `supplier_name` column names; queries alias them onto [`Supplier`].

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use crate::store::Store;
use tally_core::Supplier;

const SELECT_SUPPLIER: &str = r#"
    SELECT supplier_id AS id, supplier_name AS name,
           balance_amount, crate_balance, created_at
    FROM suppliers
"#;

/// Repository for supplier database operations.
#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    /// Creates a new SupplierRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    /// Suppliers whose money or crate balance is not zero.
    pub async fn list_outstanding(&self) -> DbResult<Vec<Supplier>> {
        let suppliers = sqlx::query_as::<_, Supplier>(&format!(
            "{SELECT_SUPPLIER} WHERE balance_amount != 0 OR crate_balance != 0 ORDER BY supplier_id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(suppliers)
    }
}

#[async_trait]
impl Store<Supplier> for SupplierRepository {
    async fn get(&self, id: &i64) -> DbResult<Option<Supplier>> {
        let supplier = sqlx::query_as::<_, Supplier>(&format!("{SELECT_SUPPLIER} WHERE supplier_id = ?1"))
            .bind(*id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(supplier)
    }

    async fn list(&self) -> DbResult<Vec<Supplier>> {
        let suppliers = sqlx::query_as::<_, Supplier>(&format!("{SELECT_SUPPLIER} ORDER BY supplier_id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(suppliers)
    }

    async fn upsert(&self, supplier: Supplier) -> DbResult<Supplier> {
        debug!(
            id = supplier.id,
            balance = %supplier.balance_amount,
            crates = supplier.crate_balance,
            "Upserting supplier"
        );

        sqlx::query(
            r#"
            INSERT INTO suppliers (
                supplier_id, supplier_name, balance_amount, crate_balance, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (supplier_id) DO UPDATE SET
                supplier_name = excluded.supplier_name,
                balance_amount = excluded.balance_amount,
                crate_balance = excluded.crate_balance
            "#,
        )
        .bind(supplier.id)
        .bind(&supplier.name)
        .bind(supplier.balance_amount)
        .bind(supplier.crate_balance)
        .bind(supplier.created_at)
        .execute(&self.pool)
        .await?;

        Ok(supplier)
    }

    /// Deleting a supplier cascades to its ledger lines.
    async fn delete(&self, id: &i64) -> DbResult<bool> {
        debug!(id = %id, "Deleting supplier");
        let result = sqlx::query("DELETE FROM suppliers WHERE supplier_id = ?1")
            .bind(*id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
