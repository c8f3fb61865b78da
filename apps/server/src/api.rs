//! # Router
//!
//! Assembles every page's routes into one axum router.
//!
//! ```text
//! /                      dashboard summary
//! /health                store health
//! /purchase[/{id}]       purchases (stock in)
//! /inventory[/{id}]      products, /inventory/lookup?q=
//! /customer[/{id}]       customers, /customer/lookup?q=
//! /product-price/{cid}   price lists, /{cid}/resolve/{pid}
//! /sales[/{id}]          recorded bills
//! /billing               new bill, /quote, /payment
//! /order[/{id}]          orders, /{id}/status
//! /supplier[/{id}]       suppliers, /{id}/transactions, /{id}/reconcile
//! /report                combined, /sales /receivables /inventory /suppliers
//! *                      404 NOT_FOUND
//! ```

use axum::http::Uri;
use axum::Router;
use tracing::debug;

use crate::error::ApiError;
use crate::handlers::{
    billing, customer, dashboard, inventory, order, product_price, purchase, report, sales, supplier,
};
use crate::state::SharedState;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .merge(dashboard::routes())
        .merge(purchase::routes())
        .merge(inventory::routes())
        .merge(customer::routes())
        .merge(product_price::routes())
        .merge(sales::routes())
        .merge(billing::routes())
        .merge(order::routes())
        .merge(supplier::routes())
        .merge(report::routes())
        .fallback(not_found)
        .with_state(state)
}

async fn not_found(uri: Uri) -> ApiError {
    debug!(path = %uri.path(), "No route");
    ApiError::not_found("Page", uri.path())
}
