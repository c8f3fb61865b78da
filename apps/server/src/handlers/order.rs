//! # Order Handlers
//!
//! Customer orders and their lifecycle. Stock follows the status:
//!
//! ```text
//!                 ┌────────────┐
//!   POST /order ─►│  pending   │◄──────────── reopen ───────────┐
//!   (ordered +=)  └─────┬──────┘                                │
//!                       │ ▲                                     │
//!                       ▼ │                                     │
//!                 ┌────────────┐                                │
//!                 │ processing │                                │
//!                 └─────┬──────┘                                │
//!            ┌──────────┴───────────┐                           │
//!            ▼                      ▼                           │
//!     ┌────────────┐         ┌────────────┐                     │
//!     │ completed  │         │ cancelled  │─────────────────────┤
//!     │ ordered -= │         │ ordered -= │                     │
//!     │ avail   -= │         └────────────┘                     │
//!     │ + sale     │────────────────────────────────────────────┘
//!     └────────────┘
//! ```
//!
//! Pending orders may also complete or cancel directly. Reopening moves no
//! stock, so completing a reopened order takes its stock a second time.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{record_sale, save_touched_products, StockMutation};
use crate::error::{ApiError, ApiResult};
use crate::state::{AppState, SharedState};
use tally_core::filter::ListQuery;
use tally_core::ident::{next_id, IdPrefix};
use tally_core::order::{change_status, modify_order, place_order, release_for_delete};
use tally_core::pricing::{price_bill_lines, BillLine};
use tally_core::validation::validate_amount;
use tally_core::{Money, Order, OrderStatus, SalesItem, SalesTransaction};

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/order", get(list_orders).post(create_order))
        .route(
            "/order/{id}",
            get(get_order).put(modify).delete(delete_order),
        )
        .route("/order/{id}/status", post(update_status))
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderRequest {
    pub customer_id: i64,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    pub lines: Vec<BillLine>,
    #[serde(default)]
    pub advance_amount: Option<Money>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModifyRequest {
    pub lines: Vec<BillLine>,
    /// Replaces the advance when present.
    #[serde(default)]
    pub advance_amount: Option<Money>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusRequest {
    pub status: OrderStatus,
    /// Date of the sale recorded on completion; defaults to today.
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub order: Order,
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub sale: Option<SalesTransaction>,
    pub skipped_products: Vec<i64>,
}

fn validate_advance(advance: Option<Money>) -> ApiResult<()> {
    if let Some(amount) = advance {
        validate_amount("advance amount", amount)?;
    }
    Ok(())
}

/// Prices order lines from the customer's price list.
async fn price_lines(state: &AppState, customer_id: i64, lines: &[BillLine]) -> ApiResult<Vec<SalesItem>> {
    let products = state.stores.products.list().await?;
    let price_list = state.stores.product_prices.get(&customer_id).await?;
    Ok(price_bill_lines(lines, &products, price_list.as_ref())?)
}

pub async fn list_orders(
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Order>>> {
    let orders = state.stores.orders.list().await?;
    Ok(Json(query.apply(orders)?))
}

pub async fn get_order(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Order>> {
    Ok(Json(state.stores.orders.require(&id).await?))
}

pub async fn create_order(
    State(state): State<SharedState>,
    Json(req): Json<OrderRequest>,
) -> ApiResult<(StatusCode, Json<StockMutation<Order>>)> {
    validate_advance(req.advance_amount)?;
    let customer = state.stores.customers.require(&req.customer_id).await?;
    let items = price_lines(&state, customer.id, &req.lines).await?;

    let date = req.date.unwrap_or_else(|| state.today());
    let existing = state.stores.orders.list().await?;
    let mut order = Order {
        id: next_id(IdPrefix::Order, date, existing.iter().map(|o| &o.id)),
        date,
        customer_id: customer.id,
        customer_name: customer.name,
        status: OrderStatus::Pending,
        items,
        advance_amount: req.advance_amount,
        sales_id: None,
    };

    let mut products = state.stores.products.list().await?;
    let outcome = place_order(&mut order, &mut products)?;

    let order = state.stores.orders.upsert(order).await?;
    save_touched_products(&state, &products, &outcome, "order").await?;

    info!(
        id = %order.id,
        customer_id = order.customer_id,
        total = %order.total_amount(),
        "Order placed"
    );
    Ok((StatusCode::CREATED, Json(StockMutation::new(order, &outcome))))
}

/// Replaces an open order's items, moving only the difference in stock.
pub async fn modify(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<ModifyRequest>,
) -> ApiResult<Json<StockMutation<Order>>> {
    validate_advance(req.advance_amount)?;
    let mut order = state.stores.orders.require(&id).await?;
    let items = price_lines(&state, order.customer_id, &req.lines).await?;

    let mut products = state.stores.products.list().await?;
    let outcome = modify_order(&mut order, items, &mut products)?;
    if req.advance_amount.is_some() {
        order.advance_amount = req.advance_amount;
    }

    let order = state.stores.orders.upsert(order).await?;
    save_touched_products(&state, &products, &outcome, "order modify").await?;

    info!(id = %order.id, total = %order.total_amount(), "Order modified");
    Ok(Json(StockMutation::new(order, &outcome)))
}

pub async fn update_status(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<StatusRequest>,
) -> ApiResult<Json<StatusResponse>> {
    let mut order = state.stores.orders.require(&id).await?;
    let mut products = state.stores.products.list().await?;
    let sales = state.stores.sales.list().await?;

    let sale_date = req.date.unwrap_or_else(|| state.today());
    let change = change_status(&mut order, req.status, &mut products, sale_date, || {
        next_id(IdPrefix::Sales, sale_date, sales.iter().map(|s| &s.id))
    })?;

    let order = state.stores.orders.upsert(order).await?;
    save_touched_products(&state, &products, &change.inventory, "order status").await?;

    let sale = match change.sale {
        Some(sale) => Some(record_sale(&state, sale).await?),
        None => None,
    };

    info!(
        id = %order.id,
        from = %change.from,
        to = %change.to,
        sales_id = ?order.sales_id,
        "Order status changed"
    );
    Ok(Json(StatusResponse {
        order,
        from: change.from,
        to: change.to,
        sale,
        skipped_products: change.inventory.missing,
    }))
}

/// Deletes an order. Stock held by an open order is released first.
pub async fn delete_order(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let order = state.stores.orders.require(&id).await?;

    let mut products = state.stores.products.list().await?;
    let outcome = release_for_delete(&order, &mut products);

    if !state.stores.orders.delete(&id).await? {
        return Err(ApiError::not_found("Order", &id));
    }
    save_touched_products(&state, &products, &outcome, "order delete").await?;

    info!(id = %id, status = %order.status, "Order deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::handlers::testing::demo_state;
    use tally_core::Product;

    fn line(product_id: i64, quantity: i64) -> BillLine {
        BillLine {
            product_id,
            quantity,
            price_override: None,
        }
    }

    fn request(lines: Vec<BillLine>) -> OrderRequest {
        OrderRequest {
            customer_id: 2,
            date: NaiveDate::from_ymd_opt(2024, 4, 20),
            lines,
            advance_amount: Some(Money::from_major(100)),
        }
    }

    fn status(to: OrderStatus) -> StatusRequest {
        StatusRequest {
            status: to,
            date: NaiveDate::from_ymd_opt(2024, 4, 22),
        }
    }

    async fn product(state: &SharedState, id: i64) -> Product {
        state.stores.products.require(&id).await.unwrap()
    }

    async fn place(state: &SharedState, lines: Vec<BillLine>) -> Order {
        let (_, Json(created)) = create_order(State(state.clone()), Json(request(lines)))
            .await
            .unwrap();
        created.record
    }

    #[tokio::test]
    async fn test_create_commits_stock_at_customer_price() {
        let state = demo_state();
        let before = product(&state, 2).await;

        let order = place(&state, vec![line(2, 4)]).await;

        assert_eq!(order.id, "O202404004");
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.items[0].sales_price, Money::from_major(400));

        let after = product(&state, 2).await;
        assert_eq!(after.ordered_quantity, before.ordered_quantity + 4);
        assert_eq!(after.available_quantity, before.available_quantity);
    }

    #[tokio::test]
    async fn test_cancel_returns_ordered_quantity() {
        let state = demo_state();
        let before = product(&state, 2).await;
        let order = place(&state, vec![line(2, 4)]).await;

        let Json(resp) = update_status(State(state.clone()), Path(order.id), Json(status(OrderStatus::Cancelled)))
            .await
            .unwrap();

        assert!(resp.sale.is_none());
        assert_eq!(product(&state, 2).await, before);
    }

    #[tokio::test]
    async fn test_complete_ships_stock_and_records_sale() {
        let state = demo_state();
        let before = product(&state, 2).await;
        let order = place(&state, vec![line(2, 4)]).await;

        let Json(resp) = update_status(
            State(state.clone()),
            Path(order.id.clone()),
            Json(status(OrderStatus::Completed)),
        )
        .await
        .unwrap();

        let sale = resp.sale.unwrap();
        assert_eq!(sale.id, "S202404003");
        assert_eq!(sale.amount_paid, Money::from_major(100));
        assert_eq!(sale.order_id.as_deref(), Some(order.id.as_str()));
        assert_eq!(resp.order.sales_id.as_deref(), Some("S202404003"));

        let after = product(&state, 2).await;
        assert_eq!(after.available_quantity, before.available_quantity - 4);
        assert_eq!(after.ordered_quantity, before.ordered_quantity);

        assert!(state.stores.sales.get(&sale.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_invalid_transition_changes_nothing() {
        let state = demo_state();
        // O202404003 was cancelled in the demo data.
        let err = update_status(
            State(state.clone()),
            Path("O202404003".to_string()),
            Json(status(OrderStatus::Completed)),
        )
        .await
        .unwrap_err();

        assert_eq!(err.code, ErrorCode::BusinessLogic);
        let order = state.stores.orders.require(&"O202404003".to_string()).await.unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_modify_moves_the_difference() {
        let state = demo_state();
        let before = product(&state, 1).await;
        let order = place(&state, vec![line(1, 5)]).await;

        let Json(modified) = modify(
            State(state.clone()),
            Path(order.id),
            Json(ModifyRequest {
                lines: vec![line(1, 3)],
                advance_amount: None,
            }),
        )
        .await
        .unwrap();

        assert_eq!(modified.record.items[0].quantity, 3);
        assert_eq!(modified.record.advance_amount, Some(Money::from_major(100)));
        assert_eq!(product(&state, 1).await.ordered_quantity, before.ordered_quantity + 3);
    }

    #[tokio::test]
    async fn test_modify_closed_order_rejected() {
        let state = demo_state();
        let err = modify(
            State(state),
            Path("O202404002".to_string()),
            Json(ModifyRequest {
                lines: vec![line(1, 1)],
                advance_amount: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);
    }

    #[tokio::test]
    async fn test_delete_open_order_releases_stock() {
        let state = demo_state();
        let before = product(&state, 3).await;

        // O202404001 holds 50 units of milk.
        delete_order(State(state.clone()), Path("O202404001".to_string()))
            .await
            .unwrap();

        let after = product(&state, 3).await;
        assert_eq!(after.ordered_quantity, before.ordered_quantity - 50);
        assert_eq!(after.available_quantity, before.available_quantity);
    }

    #[tokio::test]
    async fn test_list_by_status() {
        let state = demo_state();
        let query = ListQuery {
            status: Some(OrderStatus::Pending),
            ..Default::default()
        };
        let Json(found) = list_orders(State(state), Query(query)).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].customer_name, "Ravi Traders");
    }
}
