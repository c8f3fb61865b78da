//! # Purchase Repository
//!
//! Storage adapter between the unified [`Purchase`] and the `purchases` /
//! `purchase_items` tables.
//!
//! ## Counterparty Columns
//! ```text
//! ┌──────────────────────────────────┬───────────────┬─────────────┬───────────────┐
//! │ Counterparty                     │ company_name  │ supplier_id │ supplier_name │
//! ├──────────────────────────────────┼───────────────┼─────────────┼───────────────┤
//! │ Company { "Amul" }               │ 'Amul'        │ NULL        │ NULL          │
//! │ Supplier { Some(3), "Fresh" }    │ NULL          │ 3           │ 'Fresh'       │
//! │ Supplier { None, "Walk-in" }     │ NULL          │ NULL        │ 'Walk-in'     │
//! └──────────────────────────────────┴───────────────┴─────────────┴───────────────┘
//! ```
//!
//! `total_amount` is written on every upsert from the line items so reports
//! reading the table directly see a consistent figure.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::{FromRow, SqlitePool};
use std::collections::HashMap;
use tracing::debug;

use crate::error::DbResult;
use crate::store::Store;
use tally_core::{Counterparty, Money, Purchase, PurchaseItem};

// =============================================================================
// Rows
// =============================================================================

#[derive(Debug, FromRow)]
struct PurchaseRow {
    purchase_id: String,
    supplier_id: Option<i64>,
    supplier_name: Option<String>,
    company_name: Option<String>,
    purchase_date: NaiveDate,
}

#[derive(Debug, FromRow)]
struct PurchaseItemRow {
    purchase_id: String,
    product_id: i64,
    product_name: String,
    quantity: i64,
    purchase_price: Money,
}

impl From<PurchaseItemRow> for PurchaseItem {
    fn from(row: PurchaseItemRow) -> Self {
        PurchaseItem {
            product_id: row.product_id,
            product_name: row.product_name,
            purchase_price: row.purchase_price,
            quantity: row.quantity,
        }
    }
}

impl PurchaseRow {
    fn counterparty(&self) -> Counterparty {
        match &self.company_name {
            Some(company_name) => Counterparty::Company {
                company_name: company_name.clone(),
            },
            None => Counterparty::Supplier {
                supplier_id: self.supplier_id,
                supplier_name: self.supplier_name.clone().unwrap_or_default(),
            },
        }
    }

    fn into_purchase(self, items: Vec<PurchaseItem>) -> Purchase {
        Purchase {
            counterparty: self.counterparty(),
            id: self.purchase_id,
            date: self.purchase_date,
            items,
        }
    }
}

/// `(company_name, supplier_id, supplier_name)` for a counterparty.
fn counterparty_columns(counterparty: &Counterparty) -> (Option<&str>, Option<i64>, Option<&str>) {
    match counterparty {
        Counterparty::Company { company_name } => (Some(company_name.as_str()), None, None),
        Counterparty::Supplier {
            supplier_id,
            supplier_name,
        } => (None, *supplier_id, Some(supplier_name.as_str())),
    }
}

const SELECT_PURCHASE: &str = r#"
    SELECT purchase_id, supplier_id, supplier_name, company_name, purchase_date
    FROM purchases
"#;

const SELECT_ITEMS: &str = r#"
    SELECT purchase_id, product_id, product_name, quantity, purchase_price
    FROM purchase_items
"#;

// =============================================================================
// Repository
// =============================================================================

/// Repository for purchases and their line items.
#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    /// Creates a new PurchaseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    /// Lists purchases made from one supplier, newest first.
    pub async fn list_for_supplier(&self, supplier_id: i64) -> DbResult<Vec<Purchase>> {
        let headers = sqlx::query_as::<_, PurchaseRow>(&format!(
            "{SELECT_PURCHASE} WHERE supplier_id = ?1 ORDER BY purchase_date DESC, purchase_id DESC"
        ))
        .bind(supplier_id)
        .fetch_all(&self.pool)
        .await?;
        self.attach_items(headers).await
    }

    async fn attach_items(&self, headers: Vec<PurchaseRow>) -> DbResult<Vec<Purchase>> {
        if headers.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, PurchaseItemRow>(&format!("{SELECT_ITEMS} ORDER BY item_id"))
            .fetch_all(&self.pool)
            .await?;

        let mut items: HashMap<String, Vec<PurchaseItem>> = HashMap::new();
        for row in rows {
            items.entry(row.purchase_id.clone()).or_default().push(row.into());
        }

        Ok(headers
            .into_iter()
            .map(|h| {
                let lines = items.remove(&h.purchase_id).unwrap_or_default();
                h.into_purchase(lines)
            })
            .collect())
    }
}

#[async_trait]
impl Store<Purchase> for PurchaseRepository {
    async fn get(&self, id: &String) -> DbResult<Option<Purchase>> {
        let header = sqlx::query_as::<_, PurchaseRow>(&format!("{SELECT_PURCHASE} WHERE purchase_id = ?1"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        let Some(header) = header else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, PurchaseItemRow>(&format!(
            "{SELECT_ITEMS} WHERE purchase_id = ?1 ORDER BY item_id"
        ))
        .bind(id.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(header.into_purchase(items.into_iter().map(PurchaseItem::from).collect())))
    }

    async fn list(&self) -> DbResult<Vec<Purchase>> {
        let headers = sqlx::query_as::<_, PurchaseRow>(&format!("{SELECT_PURCHASE} ORDER BY purchase_id"))
            .fetch_all(&self.pool)
            .await?;
        self.attach_items(headers).await
    }

    /// Writes the header and replaces all line items in one transaction.
    async fn upsert(&self, purchase: Purchase) -> DbResult<Purchase> {
        debug!(
            id = %purchase.id,
            counterparty = %purchase.counterparty.name(),
            items = purchase.items.len(),
            "Upserting purchase"
        );

        let now = Utc::now();
        let (company_name, supplier_id, supplier_name) = counterparty_columns(&purchase.counterparty);
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO purchases (
                purchase_id, supplier_id, supplier_name, company_name,
                purchase_date, total_amount, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT (purchase_id) DO UPDATE SET
                supplier_id = excluded.supplier_id,
                supplier_name = excluded.supplier_name,
                company_name = excluded.company_name,
                purchase_date = excluded.purchase_date,
                total_amount = excluded.total_amount
            "#,
        )
        .bind(purchase.id.as_str())
        .bind(supplier_id)
        .bind(supplier_name)
        .bind(company_name)
        .bind(purchase.date)
        .bind(purchase.total_amount())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM purchase_items WHERE purchase_id = ?1")
            .bind(purchase.id.as_str())
            .execute(&mut *tx)
            .await?;

        for item in &purchase.items {
            sqlx::query(
                r#"
                INSERT INTO purchase_items (
                    purchase_id, product_id, product_name, quantity, purchase_price, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(purchase.id.as_str())
            .bind(item.product_id)
            .bind(item.product_name.as_str())
            .bind(item.quantity)
            .bind(item.purchase_price)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(purchase)
    }

    async fn delete(&self, id: &String) -> DbResult<bool> {
        debug!(id = %id, "Deleting purchase");
        let result = sqlx::query("DELETE FROM purchases WHERE purchase_id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
