//! # Order Repository
//!
//! SQLite storage for customer orders. Line items are kept as a JSON array
//! in the `items` column; they are always read and written with the order.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::types::Json;
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use crate::store::Store;
use tally_core::{Money, Order, OrderStatus, SalesItem};

#[derive(Debug, FromRow)]
struct OrderRow {
    id: String,
    order_date: NaiveDate,
    customer_id: i64,
    customer_name: String,
    status: OrderStatus,
    items: Json<Vec<SalesItem>>,
    advance_amount: Option<Money>,
    sales_id: Option<String>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Order {
            id: row.id,
            date: row.order_date,
            customer_id: row.customer_id,
            customer_name: row.customer_name,
            status: row.status,
            items: row.items.0,
            advance_amount: row.advance_amount,
            sales_id: row.sales_id,
        }
    }
}

const SELECT_ORDER: &str = r#"
    SELECT id, order_date, customer_id, customer_name, status,
           items, advance_amount, sales_id
    FROM orders
"#;

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Lists orders with the given status, oldest first.
    pub async fn list_by_status(&self, status: OrderStatus) -> DbResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "{SELECT_ORDER} WHERE status = ?1 ORDER BY order_date, id"
        ))
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Order::from).collect())
    }
}

#[async_trait]
impl Store<Order> for OrderRepository {
    async fn get(&self, id: &String) -> DbResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!("{SELECT_ORDER} WHERE id = ?1"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Order::from))
    }

    async fn list(&self) -> DbResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!("{SELECT_ORDER} ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Order::from).collect())
    }

    async fn upsert(&self, order: Order) -> DbResult<Order> {
        debug!(id = %order.id, status = %order.status, "Upserting order");

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, order_date, customer_id, customer_name, status,
                items, advance_amount, sales_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT (id) DO UPDATE SET
                order_date = excluded.order_date,
                customer_id = excluded.customer_id,
                customer_name = excluded.customer_name,
                status = excluded.status,
                items = excluded.items,
                advance_amount = excluded.advance_amount,
                sales_id = excluded.sales_id
            "#,
        )
        .bind(order.id.as_str())
        .bind(order.date)
        .bind(order.customer_id)
        .bind(order.customer_name.as_str())
        .bind(order.status)
        .bind(Json(&order.items))
        .bind(order.advance_amount)
        .bind(order.sales_id.as_deref())
        .execute(&self.pool)
        .await?;

        Ok(order)
    }

    async fn delete(&self, id: &String) -> DbResult<bool> {
        debug!(id = %id, "Deleting order");
        let result = sqlx::query("DELETE FROM orders WHERE id = ?1")
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

    fn order(id: &str, status: OrderStatus) -> Order {
        Order {
            id: id.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 4, 11).unwrap(),
            customer_id: 1,
            customer_name: "Ravi Traders".to_string(),
            status,
            items: vec![SalesItem {
                product_id: 1,
                product_name: "Butter".to_string(),
                sales_price: Money::from_major(250),
                quantity: 5,
            }],
            advance_amount: Some(Money::from_major(200)),
            sales_id: None,
        }
    }

    #[tokio::test]
    async fn test_order_round_trip_with_json_items() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.orders();

        let mut o = order("O202404001", OrderStatus::Pending);
        repo.upsert(o.clone()).await.unwrap();
        assert_eq!(repo.get(&o.id).await.unwrap(), Some(o.clone()));

        o.status = OrderStatus::Completed;
        o.sales_id = Some("S202404001".to_string());
        repo.upsert(o.clone()).await.unwrap();
        repo.upsert(order("O202404002", OrderStatus::Pending)).await.unwrap();

        let completed = repo.list_by_status(OrderStatus::Completed).await.unwrap();
        assert_eq!(completed, vec![o]);
        assert_eq!(repo.list().await.unwrap().len(), 2);
    }
}
