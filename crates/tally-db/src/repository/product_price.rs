//! # Product Price Repository
//!
//! Per-customer price lists: a `price_lists` header keyed by customer id and
//! one `product_prices` row per override.

use async_trait::async_trait;
use sqlx::{FromRow, SqlitePool};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::DbResult;
use crate::store::Store;
use tally_core::{Money, PriceEntry, ProductPrice};

#[derive(Debug, FromRow)]
struct PriceListRow {
    customer_id: i64,
    customer_name: String,
}

#[derive(Debug, FromRow)]
struct PriceEntryRow {
    customer_id: i64,
    product_id: i64,
    product_name: String,
    sales_price: Money,
}

impl From<PriceEntryRow> for PriceEntry {
    fn from(row: PriceEntryRow) -> Self {
        PriceEntry {
            product_id: row.product_id,
            product_name: row.product_name,
            sales_price: row.sales_price,
        }
    }
}

/// Repository for customer price lists.
#[derive(Debug, Clone)]
pub struct ProductPriceRepository {
    pool: SqlitePool,
}

impl ProductPriceRepository {
    /// Creates a new ProductPriceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductPriceRepository { pool }
    }

    async fn entries_for(&self, customer_id: i64) -> DbResult<Vec<PriceEntry>> {
        let rows = sqlx::query_as::<_, PriceEntryRow>(
            r#"
            SELECT customer_id, product_id, product_name, sales_price
            FROM product_prices
            WHERE customer_id = ?1
            ORDER BY product_id
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(PriceEntry::from).collect())
    }
}

#[async_trait]
impl Store<ProductPrice> for ProductPriceRepository {
    async fn get(&self, customer_id: &i64) -> DbResult<Option<ProductPrice>> {
        let header = sqlx::query_as::<_, PriceListRow>(
            "SELECT customer_id, customer_name FROM price_lists WHERE customer_id = ?1",
        )
        .bind(*customer_id)
        .fetch_optional(&self.pool)
        .await?;

        match header {
            Some(header) => Ok(Some(ProductPrice {
                customer_id: header.customer_id,
                customer_name: header.customer_name,
                entries: self.entries_for(header.customer_id).await?,
            })),
            None => Ok(None),
        }
    }

    async fn list(&self) -> DbResult<Vec<ProductPrice>> {
        let headers = sqlx::query_as::<_, PriceListRow>(
            "SELECT customer_id, customer_name FROM price_lists ORDER BY customer_id",
        )
        .fetch_all(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, PriceEntryRow>(
            r#"
            SELECT customer_id, product_id, product_name, sales_price
            FROM product_prices
            ORDER BY customer_id, product_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut entries: BTreeMap<i64, Vec<PriceEntry>> = BTreeMap::new();
        for row in rows {
            entries.entry(row.customer_id).or_default().push(row.into());
        }

        Ok(headers
            .into_iter()
            .map(|h| ProductPrice {
                entries: entries.remove(&h.customer_id).unwrap_or_default(),
                customer_id: h.customer_id,
                customer_name: h.customer_name,
            })
            .collect())
    }

    /// Replaces the whole list in one transaction.
    async fn upsert(&self, list: ProductPrice) -> DbResult<ProductPrice> {
        debug!(
            customer_id = list.customer_id,
            entries = list.entries.len(),
            "Upserting price list"
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO price_lists (customer_id, customer_name) VALUES (?1, ?2)
            ON CONFLICT (customer_id) DO UPDATE SET customer_name = excluded.customer_name
            "#,
        )
        .bind(list.customer_id)
        .bind(&list.customer_name)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM product_prices WHERE customer_id = ?1")
            .bind(list.customer_id)
            .execute(&mut *tx)
            .await?;

        for entry in &list.entries {
            sqlx::query(
                r#"
                INSERT INTO product_prices (customer_id, product_id, product_name, sales_price)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )
            .bind(list.customer_id)
            .bind(entry.product_id)
            .bind(&entry.product_name)
            .bind(entry.sales_price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(list)
    }

    async fn delete(&self, customer_id: &i64) -> DbResult<bool> {
        debug!(customer_id = %customer_id, "Deleting price list");
        let result = sqlx::query("DELETE FROM price_lists WHERE customer_id = ?1")
            .bind(*customer_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
