//! # Report Handlers
//!
//! Read-only summaries computed on request from the current records.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::state::SharedState;
use tally_core::report::{
    inventory_report, receivables, sales_summary, supplier_summary, InventoryReport, Receivables,
    SalesSummary, SupplierSummary,
};
use tally_core::LOW_STOCK_THRESHOLD;

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/report", get(full_report))
        .route("/report/sales", get(sales_report))
        .route("/report/receivables", get(receivables_report))
        .route("/report/inventory", get(inventory))
        .route("/report/suppliers", get(suppliers_report))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportQuery {
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
    /// Low-stock cut-off; defaults to [`LOW_STOCK_THRESHOLD`].
    #[serde(default)]
    pub threshold: Option<i64>,
}

impl ReportQuery {
    fn range(&self) -> ApiResult<(Option<NaiveDate>, Option<NaiveDate>)> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(ApiError::validation(format!(
                    "Report range starts after it ends ({} > {})",
                    from, to
                )));
            }
        }
        Ok((self.from, self.to))
    }

    fn threshold(&self) -> i64 {
        self.threshold.unwrap_or(LOW_STOCK_THRESHOLD)
    }
}

/// Every report at once, for the report page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FullReport {
    pub sales: SalesSummary,
    pub receivables: Receivables,
    pub inventory: InventoryReport,
    pub suppliers: Vec<SupplierSummary>,
}

pub async fn sales_report(
    State(state): State<SharedState>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Json<SalesSummary>> {
    let (from, to) = query.range()?;
    let sales = state.stores.sales.list().await?;
    Ok(Json(sales_summary(&sales, from, to)))
}

pub async fn receivables_report(State(state): State<SharedState>) -> ApiResult<Json<Receivables>> {
    let customers = state.stores.customers.list().await?;
    Ok(Json(receivables(&customers)))
}

pub async fn inventory(
    State(state): State<SharedState>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Json<InventoryReport>> {
    let products = state.stores.products.list().await?;
    Ok(Json(inventory_report(&products, query.threshold())))
}

pub async fn suppliers_report(State(state): State<SharedState>) -> ApiResult<Json<Vec<SupplierSummary>>> {
    let suppliers = state.stores.suppliers.list().await?;
    let transactions = state.stores.supplier_transactions.list().await?;
    Ok(Json(supplier_summary(&suppliers, &transactions)))
}

pub async fn full_report(
    State(state): State<SharedState>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Json<FullReport>> {
    let (from, to) = query.range()?;
    let stores = &state.stores;

    let sales = stores.sales.list().await?;
    let customers = stores.customers.list().await?;
    let products = stores.products.list().await?;
    let suppliers = stores.suppliers.list().await?;
    let transactions = stores.supplier_transactions.list().await?;

    Ok(Json(FullReport {
        sales: sales_summary(&sales, from, to),
        receivables: receivables(&customers),
        inventory: inventory_report(&products, query.threshold()),
        suppliers: supplier_summary(&suppliers, &transactions),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::handlers::testing::demo_state;
    use tally_core::Money;

    #[tokio::test]
    async fn test_sales_report_range() {
        let state = demo_state();
        let Json(all) = sales_report(State(state.clone()), Query(ReportQuery::default()))
            .await
            .unwrap();
        assert_eq!(all.sale_count, 2);
        // Hotel Sagar 2960 + Green Leaf 1810.
        assert_eq!(all.total_amount, Money::from_major(4_770));
        assert_eq!(all.amount_paid, Money::from_major(2_310));

        let query = ReportQuery {
            to: NaiveDate::from_ymd_opt(2024, 4, 12),
            ..Default::default()
        };
        let Json(early) = sales_report(State(state), Query(query)).await.unwrap();
        assert_eq!(early.sale_count, 1);
    }

    #[tokio::test]
    async fn test_reversed_range_rejected() {
        let state = demo_state();
        let query = ReportQuery {
            from: NaiveDate::from_ymd_opt(2024, 4, 30),
            to: NaiveDate::from_ymd_opt(2024, 4, 1),
            threshold: None,
        };
        let err = sales_report(State(state), Query(query)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_inventory_threshold() {
        let state = demo_state();
        let Json(default) = inventory(State(state.clone()), Query(ReportQuery::default()))
            .await
            .unwrap();
        // Cheese (8 on hand) is the only product at or below 10.
        assert_eq!(default.low_stock_count, 1);

        let query = ReportQuery {
            threshold: Some(15),
            ..Default::default()
        };
        let Json(wider) = inventory(State(state), Query(query)).await.unwrap();
        assert_eq!(wider.low_stock_count, 2);
    }

    #[tokio::test]
    async fn test_full_report_combines_sections() {
        let state = demo_state();
        let Json(report) = full_report(State(state), Query(ReportQuery::default()))
            .await
            .unwrap();

        assert_eq!(report.receivables.outstanding, Money::from_major(4_460));
        assert_eq!(report.suppliers.len(), 2);
        assert!(report.suppliers.iter().all(|s| !s.drifted));
    }
}
