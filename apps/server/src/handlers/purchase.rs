//! # Purchase Handlers
//!
//! Goods received from a company or a supplier. Every write keeps product
//! stock in step with the purchase list:
//!
//! ```text
//! POST   /purchase        apply(new)                 available += qty
//! PUT    /purchase/{id}   revert(old), apply(new)
//! DELETE /purchase/{id}   revert(old)                available -= qty (floor 0)
//! ```

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;

use super::{merge_outcomes, save_touched_products, StockMutation};
use crate::error::{ApiError, ApiResult};
use crate::state::{AppState, SharedState};
use tally_core::filter::ListQuery;
use tally_core::ident::{next_id, IdPrefix};
use tally_core::ledger::{apply_purchase_to_inventory, revert_purchase_from_inventory};
use tally_core::validation::{validate_name, validate_purchase_items};
use tally_core::{Counterparty, Purchase, PurchaseItem};

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/purchase", get(list_purchases).post(create_purchase))
        .route(
            "/purchase/{id}",
            get(get_purchase).put(update_purchase).delete(delete_purchase),
        )
}

/// Body of a create or edit.
#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseRequest {
    /// Defaults to today on create and to the stored date on edit.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    pub counterparty: Counterparty,
    pub items: Vec<PurchaseItem>,
}

impl PurchaseRequest {
    async fn validate(&self, state: &AppState) -> ApiResult<()> {
        validate_purchase_items(&self.items)?;
        match &self.counterparty {
            Counterparty::Company { company_name } => validate_name("company name", company_name)?,
            Counterparty::Supplier {
                supplier_id,
                supplier_name,
            } => {
                validate_name("supplier name", supplier_name)?;
                if let Some(id) = supplier_id {
                    state.stores.suppliers.require(id).await?;
                }
            }
        }
        Ok(())
    }
}

pub async fn list_purchases(
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Purchase>>> {
    let purchases = state.stores.purchases.list().await?;
    Ok(Json(query.apply(purchases)?))
}

pub async fn get_purchase(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Purchase>> {
    Ok(Json(state.stores.purchases.require(&id).await?))
}

pub async fn create_purchase(
    State(state): State<SharedState>,
    Json(req): Json<PurchaseRequest>,
) -> ApiResult<(StatusCode, Json<StockMutation<Purchase>>)> {
    req.validate(&state).await?;

    let date = req.date.unwrap_or_else(|| state.today());
    let existing = state.stores.purchases.list().await?;
    let purchase = Purchase {
        id: next_id(IdPrefix::Purchase, date, existing.iter().map(|p| &p.id)),
        date,
        counterparty: req.counterparty,
        items: req.items,
    };

    let mut products = state.stores.products.list().await?;
    let outcome = apply_purchase_to_inventory(&mut products, &purchase);

    let purchase = state.stores.purchases.upsert(purchase).await?;
    save_touched_products(&state, &products, &outcome, "purchase").await?;

    info!(
        id = %purchase.id,
        from = purchase.counterparty.name(),
        total = %purchase.total_amount(),
        "Purchase recorded"
    );
    Ok((StatusCode::CREATED, Json(StockMutation::new(purchase, &outcome))))
}

pub async fn update_purchase(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<PurchaseRequest>,
) -> ApiResult<Json<StockMutation<Purchase>>> {
    let old = state.stores.purchases.require(&id).await?;
    req.validate(&state).await?;

    let updated = Purchase {
        id: old.id.clone(),
        date: req.date.unwrap_or(old.date),
        counterparty: req.counterparty,
        items: req.items,
    };

    let mut products = state.stores.products.list().await?;
    let reverted = revert_purchase_from_inventory(&mut products, &old);
    let applied = apply_purchase_to_inventory(&mut products, &updated);
    let outcome = merge_outcomes(reverted, applied);

    let updated = state.stores.purchases.upsert(updated).await?;
    save_touched_products(&state, &products, &outcome, "purchase edit").await?;

    info!(id = %updated.id, "Purchase updated");
    Ok(Json(StockMutation::new(updated, &outcome)))
}

pub async fn delete_purchase(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let purchase = state.stores.purchases.require(&id).await?;

    let mut products = state.stores.products.list().await?;
    let outcome = revert_purchase_from_inventory(&mut products, &purchase);

    if !state.stores.purchases.delete(&id).await? {
        return Err(ApiError::not_found("Purchase", &id));
    }
    save_touched_products(&state, &products, &outcome, "purchase delete").await?;

    info!(id = %id, "Purchase deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::handlers::testing::demo_state;
    use tally_core::Money;

    fn item(product_id: i64, quantity: i64) -> PurchaseItem {
        PurchaseItem {
            product_id,
            product_name: "Butter 500g".to_string(),
            purchase_price: Money::from_major(210),
            quantity,
        }
    }

    fn request(items: Vec<PurchaseItem>) -> PurchaseRequest {
        PurchaseRequest {
            date: NaiveDate::from_ymd_opt(2024, 4, 20),
            counterparty: Counterparty::Company {
                company_name: "Amul".to_string(),
            },
            items,
        }
    }

    async fn butter(state: &SharedState) -> tally_core::Product {
        state.stores.products.require(&1).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_receives_stock() {
        let state = demo_state();
        let before = butter(&state).await;

        let (status, Json(created)) = create_purchase(State(state.clone()), Json(request(vec![item(1, 24)])))
            .await
            .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.record.id, "P202404003");
        assert!(created.skipped_products.is_empty());

        let after = butter(&state).await;
        assert_eq!(after.available_quantity, before.available_quantity + 24);
        assert_eq!(after.actual_quantity, after.available_quantity - after.ordered_quantity);
    }

    #[tokio::test]
    async fn test_unknown_product_is_skipped_and_reported() {
        let state = demo_state();
        let (_, Json(created)) = create_purchase(State(state), Json(request(vec![item(1, 5), item(99, 5)])))
            .await
            .unwrap();
        assert_eq!(created.skipped_products, vec![99]);
    }

    #[tokio::test]
    async fn test_invalid_quantity_writes_nothing() {
        let state = demo_state();
        let err = create_purchase(State(state.clone()), Json(request(vec![item(1, 0)])))
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(state.stores.purchases.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_supplier_rejected() {
        let state = demo_state();
        let mut req = request(vec![item(1, 5)]);
        req.counterparty = Counterparty::Supplier {
            supplier_id: Some(42),
            supplier_name: "Nobody".to_string(),
        };

        let err = create_purchase(State(state), Json(req)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_edit_moves_only_the_difference() {
        let state = demo_state();
        let (_, Json(created)) = create_purchase(State(state.clone()), Json(request(vec![item(1, 10)])))
            .await
            .unwrap();
        let after_create = butter(&state).await;

        update_purchase(
            State(state.clone()),
            Path(created.record.id.clone()),
            Json(request(vec![item(1, 4)])),
        )
        .await
        .unwrap();

        let after_edit = butter(&state).await;
        assert_eq!(after_edit.available_quantity, after_create.available_quantity - 6);
    }

    #[tokio::test]
    async fn test_delete_reverts_stock() {
        let state = demo_state();
        let before = butter(&state).await;
        let (_, Json(created)) = create_purchase(State(state.clone()), Json(request(vec![item(1, 7)])))
            .await
            .unwrap();

        let status = delete_purchase(State(state.clone()), Path(created.record.id.clone()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(butter(&state).await, before);

        let err = get_purchase(State(state), Path(created.record.id)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_list_filters_by_counterparty_text() {
        let state = demo_state();
        let Json(found) = list_purchases(State(state), Query(ListQuery::search("fresh farms")))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "P202404002");
    }
}
