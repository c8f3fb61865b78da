//! # Dashboard Handlers
//!
//! `GET /` returns the headline cards; `GET /health` reports whether the
//! backing store answers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::error::ApiResult;
use crate::state::SharedState;
use tally_core::report::{dashboard_summary, DashboardInput, DashboardSummary};
use tally_core::LOW_STOCK_THRESHOLD;

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/", get(summary))
        .route("/health", get(health))
}

pub async fn summary(State(state): State<SharedState>) -> ApiResult<Json<DashboardSummary>> {
    let stores = &state.stores;

    let customers = stores.customers.list().await?;
    let products = stores.products.list().await?;
    let suppliers = stores.suppliers.list().await?;
    let orders = stores.orders.list().await?;
    let sales = stores.sales.list().await?;
    let purchases = stores.purchases.list().await?;

    Ok(Json(dashboard_summary(&DashboardInput {
        customers: &customers,
        products: &products,
        suppliers: &suppliers,
        orders: &orders,
        sales: &sales,
        purchases: &purchases,
        low_stock_threshold: LOW_STOCK_THRESHOLD,
    })))
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub healthy: bool,
    pub backend: String,
    pub version: &'static str,
}

pub async fn health(State(state): State<SharedState>) -> (StatusCode, Json<HealthResponse>) {
    let healthy = state.healthy().await;
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            healthy,
            backend: state.backend.to_string(),
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}
