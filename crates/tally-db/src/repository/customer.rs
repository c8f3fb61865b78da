//! # Customer Repository
//!
//! SQLite storage for customers and their receivable balances.

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use crate::store::Store;
use tally_core::Customer;

const SELECT_CUSTOMER: &str = r#"
    SELECT id, name, address, mobile,
           total_sales, amount_received, amount_balance, profit
    FROM customers
"#;

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Counts customers (for the seed binary and diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl Store<Customer> for CustomerRepository {
    async fn get(&self, id: &i64) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(&format!("{SELECT_CUSTOMER} WHERE id = ?1"))
            .bind(*id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(customer)
    }

    async fn list(&self) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(&format!("{SELECT_CUSTOMER} ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(customers)
    }

    async fn upsert(&self, customer: Customer) -> DbResult<Customer> {
        debug!(id = customer.id, name = %customer.name, "Upserting customer");

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, name, address, mobile,
                total_sales, amount_received, amount_balance, profit
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                address = excluded.address,
                mobile = excluded.mobile,
                total_sales = excluded.total_sales,
                amount_received = excluded.amount_received,
                amount_balance = excluded.amount_balance,
                profit = excluded.profit
            "#,
        )
        .bind(customer.id)
        .bind(&customer.name)
        .bind(&customer.address)
        .bind(&customer.mobile)
        .bind(customer.total_sales)
        .bind(customer.amount_received)
        .bind(customer.amount_balance)
        .bind(customer.profit)
        .execute(&self.pool)
        .await?;

        Ok(customer)
    }

    async fn delete(&self, id: &i64) -> DbResult<bool> {
        debug!(id = %id, "Deleting customer");
        let result = sqlx::query("DELETE FROM customers WHERE id = ?1")
            .bind(*id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
