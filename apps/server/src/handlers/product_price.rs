//! # Product Price Handlers
//!
//! Per-customer price lists. A list is keyed by customer id and holds at
//! most one price per product; products without an entry sell at their
//! default price.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::state::SharedState;
use tally_core::filter::ListQuery;
use tally_core::pricing::{resolve_sales_price, PriceSource};
use tally_core::validation::validate_price_entries;
use tally_core::{CoreError, Money, PriceEntry, ProductPrice};

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/product-price", get(list_price_lists))
        .route(
            "/product-price/{customer_id}",
            get(get_price_list).put(save_price_list).delete(delete_price_list),
        )
        .route(
            "/product-price/{customer_id}/resolve/{product_id}",
            get(resolve_price),
        )
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceLine {
    pub product_id: i64,
    pub sales_price: Money,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceListRequest {
    pub entries: Vec<PriceLine>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPriceResponse {
    pub customer_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub price: Money,
    pub source: PriceSource,
}

pub async fn list_price_lists(
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<ProductPrice>>> {
    let lists = state.stores.product_prices.list().await?;
    Ok(Json(query.apply(lists)?))
}

pub async fn get_price_list(
    State(state): State<SharedState>,
    Path(customer_id): Path<i64>,
) -> ApiResult<Json<ProductPrice>> {
    Ok(Json(state.stores.product_prices.require(&customer_id).await?))
}

/// Replaces a customer's whole price list.
pub async fn save_price_list(
    State(state): State<SharedState>,
    Path(customer_id): Path<i64>,
    Json(req): Json<PriceListRequest>,
) -> ApiResult<Json<ProductPrice>> {
    let customer = state.stores.customers.require(&customer_id).await?;
    let products = state.stores.products.list().await?;

    let entries = req
        .entries
        .iter()
        .map(|line| {
            products
                .iter()
                .find(|p| p.id == line.product_id)
                .map(|p| PriceEntry {
                    product_id: p.id,
                    product_name: p.name.clone(),
                    sales_price: line.sales_price,
                })
                .ok_or_else(|| CoreError::not_found("Product", line.product_id))
        })
        .collect::<Result<Vec<_>, _>>()?;
    validate_price_entries(&entries)?;

    let list = state
        .stores
        .product_prices
        .upsert(ProductPrice {
            customer_id,
            customer_name: customer.name,
            entries,
        })
        .await?;

    info!(customer_id, entries = list.entries.len(), "Price list saved");
    Ok(Json(list))
}

pub async fn delete_price_list(
    State(state): State<SharedState>,
    Path(customer_id): Path<i64>,
) -> ApiResult<StatusCode> {
    if !state.stores.product_prices.delete(&customer_id).await? {
        return Err(ApiError::not_found("Price list", customer_id));
    }
    info!(customer_id, "Price list deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// The price a bill for this customer would use.
pub async fn resolve_price(
    State(state): State<SharedState>,
    Path((customer_id, product_id)): Path<(i64, i64)>,
) -> ApiResult<Json<ResolvedPriceResponse>> {
    state.stores.customers.require(&customer_id).await?;
    let product = state.stores.products.require(&product_id).await?;
    let list = state.stores.product_prices.get(&customer_id).await?;

    let resolved = resolve_sales_price(&product, list.as_ref());
    Ok(Json(ResolvedPriceResponse {
        customer_id,
        product_id,
        product_name: product.name,
        price: resolved.price,
        source: resolved.source,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::handlers::testing::demo_state;

    fn line(product_id: i64, price: i64) -> PriceLine {
        PriceLine {
            product_id,
            sales_price: Money::from_major(price),
        }
    }

    #[tokio::test]
    async fn test_resolve_uses_override_then_default() {
        let state = demo_state();

        let Json(paneer) = resolve_price(State(state.clone()), Path((2, 2))).await.unwrap();
        assert_eq!(paneer.price, Money::from_major(400));
        assert_eq!(paneer.source, PriceSource::CustomerList);

        let Json(milk) = resolve_price(State(state), Path((2, 3))).await.unwrap();
        assert_eq!(milk.price, Money::from_major(68));
        assert_eq!(milk.source, PriceSource::Default);
    }

    #[tokio::test]
    async fn test_save_fills_names_from_records() {
        let state = demo_state();
        let Json(list) = save_price_list(
            State(state),
            Path(1),
            Json(PriceListRequest {
                entries: vec![line(3, 60), line(5, 600)],
            }),
        )
        .await
        .unwrap();

        assert_eq!(list.customer_name, "Ravi Traders");
        assert_eq!(list.entries[0].product_name, "Taaza Milk 1L");
        assert_eq!(list.price_for(5), Some(Money::from_major(600)));
    }

    #[tokio::test]
    async fn test_duplicate_product_rejected() {
        let state = demo_state();
        let err = save_price_list(
            State(state),
            Path(1),
            Json(PriceListRequest {
                entries: vec![line(3, 60), line(3, 62)],
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_unknown_customer_or_product() {
        let state = demo_state();
        let err = save_price_list(
            State(state.clone()),
            Path(9),
            Json(PriceListRequest { entries: vec![] }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = save_price_list(
            State(state),
            Path(1),
            Json(PriceListRequest {
                entries: vec![line(99, 10)],
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.message, "Product not found: 99");
    }
}
