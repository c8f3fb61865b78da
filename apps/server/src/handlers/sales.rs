//! # Sales Handlers
//!
//! Read access to recorded bills. New sales come from `/billing` and from
//! completing an order.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::state::SharedState;
use tally_core::filter::ListQuery;
use tally_core::SalesTransaction;

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/sales", get(list_sales))
        .route("/sales/{id}", get(get_sale).delete(delete_sale))
}

pub async fn list_sales(
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<SalesTransaction>>> {
    let sales = state.stores.sales.list().await?;
    Ok(Json(query.apply(sales)?))
}

pub async fn get_sale(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SalesTransaction>> {
    Ok(Json(state.stores.sales.require(&id).await?))
}

/// Removes a sale record. Customer balances and stock are not adjusted.
pub async fn delete_sale(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    if !state.stores.sales.delete(&id).await? {
        return Err(ApiError::not_found("Sale", &id));
    }
    info!(id = %id, "Sale deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::handlers::testing::demo_state;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_list_by_date_range() {
        let state = demo_state();
        let query = ListQuery {
            from: NaiveDate::from_ymd_opt(2024, 4, 13),
            ..Default::default()
        };

        let Json(found) = list_sales(State(state), Query(query)).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].customer_name, "Green Leaf Cafe");
    }

    #[tokio::test]
    async fn test_list_by_customer() {
        let state = demo_state();
        let query = ListQuery {
            customer_id: Some(2),
            ..Default::default()
        };

        let Json(found) = list_sales(State(state), Query(query)).await.unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].order_id.is_some());
    }

    #[tokio::test]
    async fn test_get_and_delete() {
        let state = demo_state();
        let Json(sale) = get_sale(State(state.clone()), Path("S202404001".to_string()))
            .await
            .unwrap();
        assert_eq!(sale.customer_id, 2);

        delete_sale(State(state.clone()), Path("S202404001".to_string()))
            .await
            .unwrap();
        let err = get_sale(State(state), Path("S202404001".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
