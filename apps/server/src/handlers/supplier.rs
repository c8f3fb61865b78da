//! # Supplier Handlers
//!
//! Suppliers and their ledger. A supplier's `balance_amount` and
//! `crate_balance` only change by submitting a transaction:
//!
//! ```text
//! POST /supplier/{id}/transactions
//!      │
//!      ├── opening fields missing ──► seeded from the supplier's balances
//!      ├── opening fields differ  ──► 409 STALE_BALANCE (reload and retry)
//!      │
//!      ▼
//!   balance       = opening + bill - paid - damage
//!   crate_balance = crate_opening + supply - return
//!      │
//!      ▼
//!   supplier.balance_amount / crate_balance  ◄── overwritten with these
//! ```

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::state::SharedState;
use tally_core::filter::ListQuery;
use tally_core::ident::next_numeric_id;
use tally_core::ledger::{apply_supplier_transaction, seed_supplier_opening};
use tally_core::report::{reconcile_supplier, Reconciliation};
use tally_core::validation::{validate_name, validate_supplier_transaction};
use tally_core::{Counterparty, Money, Supplier, SupplierTransaction};

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/supplier", get(list_suppliers).post(create_supplier))
        .route(
            "/supplier/{id}",
            get(get_supplier).put(rename_supplier).delete(delete_supplier),
        )
        .route(
            "/supplier/{id}/transactions",
            get(list_transactions).post(create_transaction),
        )
        .route("/supplier/{id}/reconcile", get(reconcile))
}

#[derive(Debug, Clone, Deserialize)]
pub struct SupplierRequest {
    pub name: String,
}

/// A new ledger line as entered on the supplier page.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionRequest {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// The balances the form was prepared against.
    #[serde(default)]
    pub opening_amount: Option<Money>,
    #[serde(default)]
    pub crate_opening: Option<i64>,
    #[serde(default)]
    pub bill_amount: Money,
    #[serde(default)]
    pub paid: Money,
    #[serde(default)]
    pub damage: Money,
    #[serde(default)]
    pub crate_supply: i64,
    #[serde(default)]
    pub crate_return: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub supplier: Supplier,
    pub transaction: SupplierTransaction,
}

pub async fn list_suppliers(
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Supplier>>> {
    let suppliers = state.stores.suppliers.list().await?;
    Ok(Json(query.apply(suppliers)?))
}

pub async fn get_supplier(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Supplier>> {
    Ok(Json(state.stores.suppliers.require(&id).await?))
}

pub async fn create_supplier(
    State(state): State<SharedState>,
    Json(req): Json<SupplierRequest>,
) -> ApiResult<(StatusCode, Json<Supplier>)> {
    validate_name("supplier name", &req.name)?;

    let existing = state.stores.suppliers.list().await?;
    let supplier = Supplier::new(
        next_numeric_id(existing.iter().map(|s| s.id)),
        req.name.trim(),
        Utc::now(),
    );

    let supplier = state.stores.suppliers.upsert(supplier).await?;
    info!(id = supplier.id, name = %supplier.name, "Supplier created");
    Ok((StatusCode::CREATED, Json(supplier)))
}

/// Changes the name only; balances are left to the ledger.
pub async fn rename_supplier(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<SupplierRequest>,
) -> ApiResult<Json<Supplier>> {
    validate_name("supplier name", &req.name)?;

    let mut supplier = state.stores.suppliers.require(&id).await?;
    supplier.name = req.name.trim().to_string();

    let supplier = state.stores.suppliers.upsert(supplier).await?;
    info!(id, "Supplier renamed");
    Ok(Json(supplier))
}

/// Deletes a supplier with its ledger. Purchases from it keep the recorded
/// name but lose the link.
pub async fn delete_supplier(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.stores.suppliers.require(&id).await?;

    let transactions = state.stores.supplier_transactions.list().await?;
    for tx in transactions.iter().filter(|t| t.supplier_id == id) {
        state.stores.supplier_transactions.delete(&tx.id).await?;
    }

    for mut purchase in state.stores.purchases.list().await? {
        if let Counterparty::Supplier { supplier_id, .. } = &mut purchase.counterparty {
            if *supplier_id == Some(id) {
                *supplier_id = None;
                debug!(purchase = %purchase.id, "Unlinking purchase from deleted supplier");
                state.stores.purchases.upsert(purchase).await?;
            }
        }
    }

    if !state.stores.suppliers.delete(&id).await? {
        return Err(ApiError::not_found("Supplier", id));
    }

    info!(id, "Supplier deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_transactions(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<SupplierTransaction>>> {
    state.stores.suppliers.require(&id).await?;

    let mut history: Vec<SupplierTransaction> = state
        .stores
        .supplier_transactions
        .list()
        .await?
        .into_iter()
        .filter(|t| t.supplier_id == id)
        .collect();
    history.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));

    Ok(Json(query.apply(history)?))
}

pub async fn create_transaction(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<TransactionRequest>,
) -> ApiResult<(StatusCode, Json<TransactionResponse>)> {
    let mut supplier = state.stores.suppliers.require(&id).await?;
    let (opening_amount, crate_opening) =
        seed_supplier_opening(&supplier, req.opening_amount, req.crate_opening)?;

    let existing = state.stores.supplier_transactions.list().await?;
    let mut tx = SupplierTransaction {
        id: next_numeric_id(existing.iter().map(|t| t.id)),
        supplier_id: id,
        date: req.date.unwrap_or_else(|| state.today()),
        opening_amount,
        bill_amount: req.bill_amount,
        paid: req.paid,
        damage: req.damage,
        balance: Money::zero(),
        crate_opening,
        crate_supply: req.crate_supply,
        crate_return: req.crate_return,
        crate_balance: 0,
        created_at: Utc::now(),
    };
    validate_supplier_transaction(&tx)?;

    apply_supplier_transaction(&mut supplier, &mut tx);

    let transaction = state.stores.supplier_transactions.upsert(tx).await?;
    let supplier = state.stores.suppliers.upsert(supplier).await?;

    info!(
        supplier_id = id,
        transaction_id = transaction.id,
        balance = %supplier.balance_amount,
        crates = supplier.crate_balance,
        "Supplier transaction recorded"
    );
    Ok((
        StatusCode::CREATED,
        Json(TransactionResponse {
            supplier,
            transaction,
        }),
    ))
}

/// Compares the stored balances with the replayed transaction history.
pub async fn reconcile(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Reconciliation>> {
    let supplier = state.stores.suppliers.require(&id).await?;
    let transactions = state.stores.supplier_transactions.list().await?;
    Ok(Json(reconcile_supplier(&supplier, &transactions)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::handlers::testing::demo_state;

    fn entry(bill: i64, paid: i64, damage: i64, supply: i64, returned: i64) -> TransactionRequest {
        TransactionRequest {
            date: NaiveDate::from_ymd_opt(2024, 4, 20),
            opening_amount: None,
            crate_opening: None,
            bill_amount: Money::from_major(bill),
            paid: Money::from_major(paid),
            damage: Money::from_major(damage),
            crate_supply: supply,
            crate_return: returned,
        }
    }

    #[tokio::test]
    async fn test_transaction_overwrites_supplier_balances() {
        let state = demo_state();
        // Valley Cold Chain starts settled: 0 / 0 crates.
        let (status, Json(resp)) = create_transaction(State(state.clone()), Path(2), Json(entry(1_000, 200, 50, 30, 12)))
            .await
            .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(resp.transaction.id, 4);
        assert_eq!(resp.transaction.balance, Money::from_major(750));
        assert_eq!(resp.transaction.crate_balance, 18);
        assert_eq!(resp.supplier.balance_amount, Money::from_major(750));
        assert_eq!(resp.supplier.crate_balance, 18);

        let stored = state.stores.suppliers.require(&2).await.unwrap();
        assert_eq!(stored, resp.supplier);
    }

    #[tokio::test]
    async fn test_oversized_bill_amount_rejected() {
        let state = demo_state();
        let mut req = entry(0, 0, 0, 0, 0);
        req.bill_amount = Money::from_minor(i64::MAX);

        let err = create_transaction(State(state.clone()), Path(1), Json(req))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let supplier = state.stores.suppliers.require(&1).await.unwrap();
        assert_eq!(supplier.balance_amount, Money::from_major(4_800));
        assert_eq!(state.stores.supplier_transactions.list().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_opening_seeded_from_current_balances() {
        let state = demo_state();
        // Fresh Farms carries 4800 and 15 crates.
        let Json(resp) = create_transaction(State(state), Path(1), Json(entry(0, 800, 0, 0, 5)))
            .await
            .map(|(_, json)| json)
            .unwrap();

        assert_eq!(resp.transaction.opening_amount, Money::from_major(4_800));
        assert_eq!(resp.transaction.crate_opening, 15);
        assert_eq!(resp.supplier.balance_amount, Money::from_major(4_000));
        assert_eq!(resp.supplier.crate_balance, 10);
    }

    #[tokio::test]
    async fn test_stale_opening_rejected() {
        let state = demo_state();
        let mut req = entry(100, 0, 0, 0, 0);
        req.opening_amount = Some(Money::from_major(6_800));
        req.crate_opening = Some(20);

        let err = create_transaction(State(state.clone()), Path(1), Json(req))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::StaleBalance);

        let Json(history) = list_transactions(State(state), Path(1), Query(ListQuery::default()))
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn test_negative_payment_rejected() {
        let state = demo_state();
        let err = create_transaction(State(state), Path(1), Json(entry(0, -5, 0, 0, 0)))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_reconcile_after_transactions() {
        let state = demo_state();
        create_transaction(State(state.clone()), Path(1), Json(entry(500, 0, 0, 2, 0)))
            .await
            .unwrap();

        let Json(rec) = reconcile(State(state), Path(1)).await.unwrap();
        assert!(!rec.drifted);
        assert_eq!(rec.replay.transaction_count, 3);
        assert_eq!(rec.stored_amount, Money::from_major(5_300));
    }

    #[tokio::test]
    async fn test_delete_removes_ledger_and_unlinks_purchases() {
        let state = demo_state();
        delete_supplier(State(state.clone()), Path(1)).await.unwrap();

        let remaining = state.stores.supplier_transactions.list().await.unwrap();
        assert!(remaining.iter().all(|t| t.supplier_id != 1));

        let purchase = state
            .stores
            .purchases
            .require(&"P202404002".to_string())
            .await
            .unwrap();
        assert_eq!(
            purchase.counterparty,
            Counterparty::Supplier {
                supplier_id: None,
                supplier_name: "Fresh Farms Logistics".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_create_and_rename() {
        let state = demo_state();
        let (_, Json(created)) = create_supplier(
            State(state.clone()),
            Json(SupplierRequest {
                name: "Hill Dairy".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(created.id, 3);
        assert_eq!(created.balance_amount, Money::zero());

        let Json(renamed) = rename_supplier(
            State(state),
            Path(3),
            Json(SupplierRequest {
                name: "Hill Dairy Co".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(renamed.name, "Hill Dairy Co");
    }
}
