//! # Inventory Handlers
//!
//! Product master data. Stock columns are only moved by purchases and
//! orders; an edit here changes names and the default price and keeps the
//! stored quantities.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::state::SharedState;
use tally_core::filter::{find_match, ListQuery};
use tally_core::ident::next_numeric_id;
use tally_core::validation::{validate_name, validate_price};
use tally_core::{Money, Product, ValidationError};

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/inventory", get(list_products).post(create_product))
        .route("/inventory/lookup", get(lookup_product))
        .route(
            "/inventory/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductRequest {
    pub company_name: String,
    pub name: String,
    pub default_sales_price: Money,
    /// Opening stock; only read on create.
    #[serde(default)]
    pub available_quantity: i64,
}

impl ProductRequest {
    fn validate(&self) -> ApiResult<()> {
        validate_name("company name", &self.company_name)?;
        validate_name("product name", &self.name)?;
        validate_price("default sales price", self.default_sales_price)?;
        if self.available_quantity < 0 {
            return Err(ValidationError::Negative {
                field: "available quantity".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LookupQuery {
    pub q: String,
}

pub async fn list_products(
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Product>>> {
    let products = state.stores.products.list().await?;
    Ok(Json(query.apply(products)?))
}

/// Finds the product a search box refers to (exact name first).
pub async fn lookup_product(
    State(state): State<SharedState>,
    Query(query): Query<LookupQuery>,
) -> ApiResult<Json<Product>> {
    let products = state.stores.products.list().await?;
    let product = find_match(&products, "product", &query.q)?;
    Ok(Json(product.clone()))
}

pub async fn get_product(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Product>> {
    Ok(Json(state.stores.products.require(&id).await?))
}

pub async fn create_product(
    State(state): State<SharedState>,
    Json(req): Json<ProductRequest>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    req.validate()?;

    let existing = state.stores.products.list().await?;
    let mut product = Product::new(
        next_numeric_id(existing.iter().map(|p| p.id)),
        req.company_name.trim(),
        req.name.trim(),
        req.default_sales_price,
    );
    product.available_quantity = req.available_quantity;
    product.recompute_actual();

    let product = state.stores.products.upsert(product).await?;
    info!(id = product.id, name = %product.name, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<ProductRequest>,
) -> ApiResult<Json<Product>> {
    req.validate()?;

    let mut product = state.stores.products.require(&id).await?;
    product.company_name = req.company_name.trim().to_string();
    product.name = req.name.trim().to_string();
    product.default_sales_price = req.default_sales_price;

    let product = state.stores.products.upsert(product).await?;
    info!(id, "Product updated");
    Ok(Json(product))
}

/// Removes a product. Line items that still name it are left alone and
/// skipped by later stock movements.
pub async fn delete_product(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if !state.stores.products.delete(&id).await? {
        return Err(ApiError::not_found("Product", id));
    }
    info!(id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::handlers::testing::demo_state;

    fn request(name: &str, price: i64) -> ProductRequest {
        ProductRequest {
            company_name: "Amul".to_string(),
            name: name.to_string(),
            default_sales_price: Money::from_major(price),
            available_quantity: 12,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_next_id() {
        let state = demo_state();
        let (status, Json(product)) = create_product(State(state), Json(request(" Lassi 200ml ", 25)))
            .await
            .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(product.id, 7);
        assert_eq!(product.name, "Lassi 200ml");
        assert_eq!(product.actual_quantity, 12);
    }

    #[tokio::test]
    async fn test_update_keeps_stock() {
        let state = demo_state();
        let before = state.stores.products.require(&1).await.unwrap();

        let Json(updated) = update_product(State(state), Path(1), Json(request("Butter 500g", 260)))
            .await
            .unwrap();

        assert_eq!(updated.default_sales_price, Money::from_major(260));
        assert_eq!(updated.available_quantity, before.available_quantity);
        assert_eq!(updated.ordered_quantity, before.ordered_quantity);
    }

    #[tokio::test]
    async fn test_zero_price_rejected() {
        let state = demo_state();
        let err = create_product(State(state), Json(request("Free Sample", 0)))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_lookup_prefers_exact_name() {
        let state = demo_state();
        let Json(found) = lookup_product(
            State(state.clone()),
            Query(LookupQuery {
                q: "ghee 1l".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(found.id, 5);

        let err = lookup_product(
            State(state),
            Query(LookupQuery {
                q: "yogurt".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "No product matches 'yogurt'");
    }

    #[tokio::test]
    async fn test_list_by_company() {
        let state = demo_state();
        let Json(found) = list_products(State(state), Query(ListQuery::search("mother dairy")))
            .await
            .unwrap();
        assert_eq!(found.iter().map(|p| p.id).collect::<Vec<_>>(), vec![4, 5]);
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let state = demo_state();
        assert_eq!(
            delete_product(State(state.clone()), Path(6)).await.unwrap(),
            StatusCode::NO_CONTENT
        );
        let err = delete_product(State(state), Path(6)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
