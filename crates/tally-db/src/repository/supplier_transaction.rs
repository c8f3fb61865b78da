//! # Supplier Transaction Repository
//!
//! Ledger lines against suppliers. Rows are stored exactly as computed by
//! `tally_core::ledger::apply_supplier_transaction`; balances are never
//! derived in SQL.

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use crate::store::Store;
use tally_core::SupplierTransaction;

const SELECT_TRANSACTION: &str = r#"
    SELECT transaction_id AS id, supplier_id, date,
           opening_amount, bill_amount, paid, damage, balance,
           crate_opening, crate_supply, crate_return, crate_balance,
           created_at
    FROM supplier_transactions
"#;

/// Repository for supplier ledger lines.
#[derive(Debug, Clone)]
pub struct SupplierTransactionRepository {
    pool: SqlitePool,
}

impl SupplierTransactionRepository {
    /// Creates a new SupplierTransactionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SupplierTransactionRepository { pool }
    }

    /// One supplier's history in ledger order (date, then entry order).
    pub async fn list_for_supplier(&self, supplier_id: i64) -> DbResult<Vec<SupplierTransaction>> {
        let rows = sqlx::query_as::<_, SupplierTransaction>(&format!(
            "{SELECT_TRANSACTION} WHERE supplier_id = ?1 ORDER BY date, created_at, transaction_id"
        ))
        .bind(supplier_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl Store<SupplierTransaction> for SupplierTransactionRepository {
    async fn get(&self, id: &i64) -> DbResult<Option<SupplierTransaction>> {
        let row = sqlx::query_as::<_, SupplierTransaction>(&format!(
            "{SELECT_TRANSACTION} WHERE transaction_id = ?1"
        ))
        .bind(*id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list(&self) -> DbResult<Vec<SupplierTransaction>> {
        let rows = sqlx::query_as::<_, SupplierTransaction>(&format!(
            "{SELECT_TRANSACTION} ORDER BY transaction_id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn upsert(&self, tx: SupplierTransaction) -> DbResult<SupplierTransaction> {
        debug!(
            id = tx.id,
            supplier_id = tx.supplier_id,
            balance = %tx.balance,
            crate_balance = tx.crate_balance,
            "Upserting supplier transaction"
        );

        sqlx::query(
            r#"
            INSERT INTO supplier_transactions (
                transaction_id, supplier_id, date,
                opening_amount, bill_amount, paid, damage, balance,
                crate_opening, crate_supply, crate_return, crate_balance,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            ON CONFLICT (transaction_id) DO UPDATE SET
                supplier_id = excluded.supplier_id,
                date = excluded.date,
                opening_amount = excluded.opening_amount,
                bill_amount = excluded.bill_amount,
                paid = excluded.paid,
                damage = excluded.damage,
                balance = excluded.balance,
                crate_opening = excluded.crate_opening,
                crate_supply = excluded.crate_supply,
                crate_return = excluded.crate_return,
                crate_balance = excluded.crate_balance
            "#,
        )
        .bind(tx.id)
        .bind(tx.supplier_id)
        .bind(tx.date)
        .bind(tx.opening_amount)
        .bind(tx.bill_amount)
        .bind(tx.paid)
        .bind(tx.damage)
        .bind(tx.balance)
        .bind(tx.crate_opening)
        .bind(tx.crate_supply)
        .bind(tx.crate_return)
        .bind(tx.crate_balance)
        .bind(tx.created_at)
        .execute(&self.pool)
        .await?;

        Ok(tx)
    }

    async fn delete(&self, id: &i64) -> DbResult<bool> {
        debug!(id = %id, "Deleting supplier transaction");
        let result = sqlx::query("DELETE FROM supplier_transactions WHERE transaction_id = ?1")
            .bind(*id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::{NaiveDate, Utc};
    use tally_core::ledger::apply_supplier_transaction;
    use tally_core::{Money, Supplier};

    fn entry(id: i64, day: u32, bill: i64, paid: i64, supply: i64) -> SupplierTransaction {
        SupplierTransaction {
            id,
            supplier_id: 1,
            date: NaiveDate::from_ymd_opt(2024, 4, day).unwrap(),
            opening_amount: Money::zero(),
            bill_amount: Money::from_major(bill),
            paid: Money::from_major(paid),
            damage: Money::zero(),
            balance: Money::zero(),
            crate_opening: 0,
            crate_supply: supply,
            crate_return: 0,
            crate_balance: 0,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_history_is_ordered_and_cascades() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut supplier = Supplier::new(1, "Fresh Farms", Utc::now());
        let repo = db.supplier_transactions();

        // Written out of date order on purpose.
        let mut later = entry(2, 9, 300, 0, 2);
        let mut first = entry(1, 3, 1_000, 400, 5);
        apply_supplier_transaction(&mut supplier, &mut first);
        later.opening_amount = first.balance;
        later.crate_opening = first.crate_balance;
        apply_supplier_transaction(&mut supplier, &mut later);

        db.suppliers().upsert(supplier.clone()).await.unwrap();
        repo.upsert(later.clone()).await.unwrap();
        repo.upsert(first.clone()).await.unwrap();

        let history = repo.list_for_supplier(1).await.unwrap();
        assert_eq!(history.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(history[1].balance, Money::from_major(900));
        assert_eq!(history[1].crate_balance, 7);

        assert!(db.suppliers().delete(&1).await.unwrap());
        assert!(repo.list().await.unwrap().is_empty());
    }
}
