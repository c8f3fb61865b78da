//! # Product Repository
//!
//! SQLite storage for products and their stock counters.
//!
//! ## Stock Columns
//! ```text
//! available_quantity   physical stock          (+ purchase, - completion)
//! ordered_quantity     committed to orders     (+ order, - cancel/complete)
//! actual_quantity      available - ordered     (written, never computed in SQL)
//! ```
//!
//! The counters are written as absolute values computed by
//! `tally_core::ledger`; this repository never adjusts them in SQL.

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use crate::store::Store;
use tally_core::Product;

const SELECT_PRODUCT: &str = r#"
    SELECT id, company_name, name, default_sales_price,
           available_quantity, ordered_quantity, actual_quantity
    FROM products
"#;

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists the products of one company, by name.
    pub async fn list_by_company(&self, company_name: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "{SELECT_PRODUCT} WHERE company_name = ?1 COLLATE NOCASE ORDER BY name"
        ))
        .bind(company_name)
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    /// Counts products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl Store<Product> for ProductRepository {
    async fn get(&self, id: &i64) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!("{SELECT_PRODUCT} WHERE id = ?1"))
            .bind(*id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!("{SELECT_PRODUCT} ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    async fn upsert(&self, product: Product) -> DbResult<Product> {
        debug!(
            id = product.id,
            available = product.available_quantity,
            ordered = product.ordered_quantity,
            "Upserting product"
        );

        sqlx::query(
            r#"
            INSERT INTO products (
                id, company_name, name, default_sales_price,
                available_quantity, ordered_quantity, actual_quantity
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT (id) DO UPDATE SET
                company_name = excluded.company_name,
                name = excluded.name,
                default_sales_price = excluded.default_sales_price,
                available_quantity = excluded.available_quantity,
                ordered_quantity = excluded.ordered_quantity,
                actual_quantity = excluded.actual_quantity
            "#,
        )
        .bind(product.id)
        .bind(&product.company_name)
        .bind(&product.name)
        .bind(product.default_sales_price)
        .bind(product.available_quantity)
        .bind(product.ordered_quantity)
        .bind(product.actual_quantity)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    async fn delete(&self, id: &i64) -> DbResult<bool> {
        debug!(id = %id, "Deleting product");
        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(*id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
