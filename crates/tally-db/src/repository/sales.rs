//! # Sales Repository
//!
//! SQLite storage for recorded sales (bills). Same layout as orders: header
//! columns plus a JSON `items` array.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::types::Json;
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use crate::store::Store;
use tally_core::{Money, SalesItem, SalesTransaction};

#[derive(Debug, FromRow)]
struct SaleRow {
    id: String,
    sale_date: NaiveDate,
    customer_id: i64,
    customer_name: String,
    items: Json<Vec<SalesItem>>,
    amount_paid: Money,
    order_id: Option<String>,
}

impl From<SaleRow> for SalesTransaction {
    fn from(row: SaleRow) -> Self {
        SalesTransaction {
            id: row.id,
            date: row.sale_date,
            customer_id: row.customer_id,
            customer_name: row.customer_name,
            items: row.items.0,
            amount_paid: row.amount_paid,
            order_id: row.order_id,
        }
    }
}

const SELECT_SALE: &str = r#"
    SELECT id, sale_date, customer_id, customer_name, items, amount_paid, order_id
    FROM sales
"#;

/// Repository for sales transactions.
#[derive(Debug, Clone)]
pub struct SalesRepository {
    pool: SqlitePool,
}

impl SalesRepository {
    /// Creates a new SalesRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SalesRepository { pool }
    }

    /// Lists sales dated within `[from, to]`, oldest first.
    pub async fn list_between(&self, from: NaiveDate, to: NaiveDate) -> DbResult<Vec<SalesTransaction>> {
        let rows = sqlx::query_as::<_, SaleRow>(&format!(
            "{SELECT_SALE} WHERE sale_date BETWEEN ?1 AND ?2 ORDER BY sale_date, id"
        ))
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(SalesTransaction::from).collect())
    }
}

#[async_trait]
impl Store<SalesTransaction> for SalesRepository {
    async fn get(&self, id: &String) -> DbResult<Option<SalesTransaction>> {
        let row = sqlx::query_as::<_, SaleRow>(&format!("{SELECT_SALE} WHERE id = ?1"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(SalesTransaction::from))
    }

    async fn list(&self) -> DbResult<Vec<SalesTransaction>> {
        let rows = sqlx::query_as::<_, SaleRow>(&format!("{SELECT_SALE} ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(SalesTransaction::from).collect())
    }

    async fn upsert(&self, sale: SalesTransaction) -> DbResult<SalesTransaction> {
        debug!(
            id = %sale.id,
            customer_id = sale.customer_id,
            total = %sale.total_amount(),
            "Upserting sale"
        );

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, sale_date, customer_id, customer_name, items, amount_paid, order_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT (id) DO UPDATE SET
                sale_date = excluded.sale_date,
                customer_id = excluded.customer_id,
                customer_name = excluded.customer_name,
                items = excluded.items,
                amount_paid = excluded.amount_paid,
                order_id = excluded.order_id
            "#,
        )
        .bind(sale.id.as_str())
        .bind(sale.date)
        .bind(sale.customer_id)
        .bind(sale.customer_name.as_str())
        .bind(Json(&sale.items))
        .bind(sale.amount_paid)
        .bind(sale.order_id.as_deref())
        .execute(&self.pool)
        .await?;

        Ok(sale)
    }

    async fn delete(&self, id: &String) -> DbResult<bool> {
        debug!(id = %id, "Deleting sale");
        let result = sqlx::query("DELETE FROM sales WHERE id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn sale(id: &str, day: u32) -> SalesTransaction {
        SalesTransaction {
            id: id.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 4, day).unwrap(),
            customer_id: 1,
            customer_name: "Ravi Traders".to_string(),
            items: vec![SalesItem {
                product_id: 1,
                product_name: "Butter".to_string(),
                sales_price: Money::from_major(250),
                quantity: 2,
            }],
            amount_paid: Money::from_major(100),
            order_id: None,
        }
    }

    #[tokio::test]
    async fn test_sales_date_range() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.sales();

        repo.upsert(sale("S202404001", 2)).await.unwrap();
        repo.upsert(sale("S202404002", 12)).await.unwrap();
        repo.upsert(sale("S202404003", 25)).await.unwrap();

        let from = NaiveDate::from_ymd_opt(2024, 4, 10).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 4, 30).unwrap();
        let found = repo.list_between(from, to).await.unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].id, "S202404002");
        assert_eq!(found[0].total_amount(), Money::from_major(500));
    }
}
