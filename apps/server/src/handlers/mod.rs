//! # Page Handlers
//!
//! One module per dashboard page. Every handler follows the same shape:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. read the records it needs from the stores                          │
//! │  2. validate the request            ──► 400 before anything is written │
//! │  3. run the tally-core ledger / state machine on local copies          │
//! │  4. write every changed record back (upsert / delete)                  │
//! │  5. answer with the updated record(s)                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! ```text
//! handlers/
//! ├── mod.rs            ◄─── You are here (shared helpers)
//! ├── dashboard.rs      ◄─── /  and /health
//! ├── purchase.rs       ◄─── /purchase
//! ├── inventory.rs      ◄─── /inventory (products)
//! ├── customer.rs       ◄─── /customer
//! ├── product_price.rs  ◄─── /product-price (per-customer price lists)
//! ├── sales.rs          ◄─── /sales
//! ├── billing.rs        ◄─── /billing (new bills, payments)
//! ├── order.rs          ◄─── /order
//! ├── supplier.rs       ◄─── /supplier (+ transactions, reconciliation)
//! └── report.rs         ◄─── /report
//! ```

pub mod billing;
pub mod customer;
pub mod dashboard;
pub mod inventory;
pub mod order;
pub mod product_price;
pub mod purchase;
pub mod report;
pub mod sales;
pub mod supplier;

use serde::Serialize;
use tracing::warn;

use crate::error::ApiResult;
use crate::state::AppState;
use tally_core::ledger::{apply_customer_payment, apply_customer_sale, InventoryOutcome};
use tally_core::{Product, SalesTransaction};

/// A written record plus the product ids its stock movement had to skip.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockMutation<T> {
    pub record: T,
    pub skipped_products: Vec<i64>,
}

impl<T> StockMutation<T> {
    pub fn new(record: T, outcome: &InventoryOutcome) -> Self {
        StockMutation {
            record,
            skipped_products: outcome.missing.clone(),
        }
    }
}

/// Combines two folds over the same product list.
pub(crate) fn merge_outcomes(mut first: InventoryOutcome, second: InventoryOutcome) -> InventoryOutcome {
    for id in second.touched {
        if !first.touched.contains(&id) {
            first.touched.push(id);
        }
    }
    for id in second.missing {
        if !first.missing.contains(&id) {
            first.missing.push(id);
        }
    }
    first
}

/// Writes back the products an inventory fold changed.
///
/// Line items naming products that no longer exist were skipped by the fold;
/// they are logged and otherwise ignored.
pub(crate) async fn save_touched_products(
    state: &AppState,
    products: &[Product],
    outcome: &InventoryOutcome,
    context: &str,
) -> ApiResult<()> {
    if !outcome.missing.is_empty() {
        warn!(
            context,
            missing = ?outcome.missing,
            "Line items reference unknown products; stock not adjusted for them"
        );
    }

    for id in &outcome.touched {
        if let Some(product) = products.iter().find(|p| p.id == *id) {
            state.stores.products.upsert(product.clone()).await?;
        }
    }
    Ok(())
}

/// Stores a new sale and, when `ledger.accrue_customer_sales` is on, posts
/// it to the customer's receivable.
pub(crate) async fn record_sale(state: &AppState, sale: SalesTransaction) -> ApiResult<SalesTransaction> {
    let sale = state.stores.sales.upsert(sale).await?;

    if state.ledger.accrue_customer_sales {
        match state.stores.customers.get(&sale.customer_id).await? {
            Some(mut customer) => {
                apply_customer_sale(&mut customer, sale.total_amount());
                apply_customer_payment(&mut customer, sale.amount_paid);
                state.stores.customers.upsert(customer).await?;
            }
            None => warn!(
                sale_id = %sale.id,
                customer_id = sale.customer_id,
                "Sale for unknown customer; receivable not updated"
            ),
        }
    }

    Ok(sale)
}

// =============================================================================
// Test Support
// =============================================================================
