//! # Billing Handlers
//!
//! The counter: price a bill for a customer, record it as a sale, and take
//! payments against the customer's receivable.
//!
//! ```text
//! POST /billing/quote    lines ──► priced items + total   (nothing stored)
//! POST /billing          lines ──► SalesTransaction       (S<yyyymm><seq>)
//! POST /billing/payment  amount ─► Customer               (amount_received += amount)
//! ```
//!
//! Each line is priced from the customer's price list, falling back to the
//! product's default price, unless the cashier typed a price. Bills do not
//! move stock.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::record_sale;
use crate::error::ApiResult;
use crate::state::{AppState, SharedState};
use tally_core::ident::{next_id, IdPrefix};
use tally_core::ledger::apply_customer_payment;
use tally_core::pricing::{price_bill_lines, BillLine};
use tally_core::validation::{validate_amount, validate_payment_amount, validate_sales_items};
use tally_core::{Customer, Money, SalesItem, SalesTransaction};

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/billing", post(create_bill))
        .route("/billing/quote", post(quote_bill))
        .route("/billing/payment", post(receive_payment))
}

#[derive(Debug, Clone, Deserialize)]
pub struct BillRequest {
    pub customer_id: i64,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    pub lines: Vec<BillLine>,
    #[serde(default)]
    pub amount_paid: Money,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub customer_id: i64,
    pub items: Vec<SalesItem>,
    pub total_amount: Money,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentRequest {
    pub customer_id: i64,
    pub amount: Money,
}

/// Prices the request's lines for its customer.
async fn price_for_customer(state: &AppState, req: &BillRequest) -> ApiResult<(Customer, Vec<SalesItem>)> {
    let customer = state.stores.customers.require(&req.customer_id).await?;
    let products = state.stores.products.list().await?;
    let price_list = state.stores.product_prices.get(&req.customer_id).await?;

    let items = price_bill_lines(&req.lines, &products, price_list.as_ref())?;
    validate_sales_items(&items)?;
    Ok((customer, items))
}

pub async fn quote_bill(
    State(state): State<SharedState>,
    Json(req): Json<BillRequest>,
) -> ApiResult<Json<Quote>> {
    let (customer, items) = price_for_customer(&state, &req).await?;
    let total_amount = items.iter().map(SalesItem::line_total).sum();

    Ok(Json(Quote {
        customer_id: customer.id,
        items,
        total_amount,
    }))
}

pub async fn create_bill(
    State(state): State<SharedState>,
    Json(req): Json<BillRequest>,
) -> ApiResult<(StatusCode, Json<SalesTransaction>)> {
    validate_amount("amount paid", req.amount_paid)?;
    let (customer, items) = price_for_customer(&state, &req).await?;

    let date = req.date.unwrap_or_else(|| state.today());
    let existing = state.stores.sales.list().await?;
    let sale = SalesTransaction {
        id: next_id(IdPrefix::Sales, date, existing.iter().map(|s| &s.id)),
        date,
        customer_id: customer.id,
        customer_name: customer.name,
        items,
        amount_paid: req.amount_paid,
        order_id: None,
    };

    let sale = record_sale(&state, sale).await?;
    info!(
        id = %sale.id,
        customer_id = sale.customer_id,
        total = %sale.total_amount(),
        paid = %sale.amount_paid,
        "Bill recorded"
    );
    Ok((StatusCode::CREATED, Json(sale)))
}

pub async fn receive_payment(
    State(state): State<SharedState>,
    Json(req): Json<PaymentRequest>,
) -> ApiResult<Json<Customer>> {
    validate_payment_amount(req.amount)?;

    let mut customer = state.stores.customers.require(&req.customer_id).await?;
    apply_customer_payment(&mut customer, req.amount);
    let customer = state.stores.customers.upsert(customer).await?;

    info!(
        customer_id = customer.id,
        amount = %req.amount,
        balance = %customer.amount_balance,
        "Payment received"
    );
    Ok(Json(customer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LedgerSettings;
    use crate::error::ErrorCode;
    use crate::handlers::testing::{demo_state, demo_state_with, empty_state};

    fn line(product_id: i64, quantity: i64) -> BillLine {
        BillLine {
            product_id,
            quantity,
            price_override: None,
        }
    }

    fn bill(customer_id: i64, lines: Vec<BillLine>, paid: i64) -> BillRequest {
        BillRequest {
            customer_id,
            date: NaiveDate::from_ymd_opt(2024, 4, 20),
            lines,
            amount_paid: Money::from_major(paid),
        }
    }

    #[tokio::test]
    async fn test_quote_uses_customer_prices() {
        let state = demo_state();
        let Json(quote) = quote_bill(State(state), Json(bill(2, vec![line(1, 2), line(3, 10)], 0)))
            .await
            .unwrap();

        // Butter from Hotel Sagar's list (240), milk at default (68).
        assert_eq!(quote.items[0].sales_price, Money::from_major(240));
        assert_eq!(quote.items[1].sales_price, Money::from_major(68));
        assert_eq!(quote.total_amount, Money::from_major(2 * 240 + 10 * 68));
    }

    #[tokio::test]
    async fn test_quote_rejects_price_above_ceiling() {
        let state = demo_state();
        let lines = vec![BillLine {
            product_id: 1,
            quantity: 100_000,
            price_override: Some(Money::from_minor(i64::MAX / 1000)),
        }];

        let err = quote_bill(State(state), Json(bill(2, lines, 0))).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_bill_rejects_too_many_lines() {
        let state = demo_state();
        let lines = vec![line(1, 1); tally_core::MAX_LINE_ITEMS + 1];

        let err = create_bill(State(state.clone()), Json(bill(2, lines, 0)))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(state.stores.sales.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_bill_creates_sale_without_touching_stock() {
        let state = demo_state();
        let before = state.stores.products.list().await.unwrap();

        let (status, Json(sale)) = create_bill(State(state.clone()), Json(bill(1, vec![line(5, 2)], 500)))
            .await
            .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(sale.id, "S202404003");
        assert_eq!(sale.total_amount(), Money::from_major(1_280));
        assert_eq!(sale.amount_due(), Money::from_major(780));
        assert_eq!(state.stores.products.list().await.unwrap(), before);

        // Without accrual the receivable is untouched.
        let ravi = state.stores.customers.require(&1).await.unwrap();
        assert_eq!(ravi.total_sales, Money::from_major(5_000));
    }

    #[tokio::test]
    async fn test_bill_accrues_when_enabled() {
        let state = demo_state_with(LedgerSettings {
            accrue_customer_sales: true,
        });

        create_bill(State(state.clone()), Json(bill(1, vec![line(5, 2)], 500)))
            .await
            .unwrap();

        let ravi = state.stores.customers.require(&1).await.unwrap();
        assert_eq!(ravi.total_sales, Money::from_major(6_280));
        assert_eq!(ravi.amount_received, Money::from_major(3_500));
        assert_eq!(ravi.amount_balance, Money::from_major(2_780));
    }

    #[tokio::test]
    async fn test_empty_bill_rejected() {
        let state = demo_state();
        let err = create_bill(State(state), Json(bill(1, vec![], 0))).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "items is required");
    }

    #[tokio::test]
    async fn test_unknown_customer() {
        let err = create_bill(State(empty_state()), Json(bill(1, vec![line(1, 1)], 0)))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_payment_moves_received_only() {
        let state = demo_state();
        let mut customer = state.stores.customers.require(&3).await.unwrap();
        customer.total_sales = Money::from_minor(40_100);
        customer.amount_received = Money::from_minor(30_000);
        customer.recompute_balance();
        state.stores.customers.upsert(customer).await.unwrap();

        let Json(paid) = receive_payment(
            State(state),
            Json(PaymentRequest {
                customer_id: 3,
                amount: Money::from_minor(5_000),
            }),
        )
        .await
        .unwrap();

        assert_eq!(paid.total_sales, Money::from_minor(40_100));
        assert_eq!(paid.amount_received, Money::from_minor(35_000));
        assert_eq!(paid.amount_balance, Money::from_minor(5_100));
    }

    #[tokio::test]
    async fn test_zero_payment_rejected() {
        let state = demo_state();
        let err = receive_payment(
            State(state),
            Json(PaymentRequest {
                customer_id: 1,
                amount: Money::zero(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
