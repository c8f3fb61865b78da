//! # Customer Handlers
//!
//! Customer master data. The balance columns are read-only here: they move
//! through billing payments and, when accrual is enabled, recorded sales.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{debug, info};

use super::inventory::LookupQuery;
use crate::error::{ApiError, ApiResult};
use crate::state::SharedState;
use tally_core::filter::{find_match, ListQuery};
use tally_core::ident::next_numeric_id;
use tally_core::validation::{validate_mobile, validate_name};
use tally_core::Customer;

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/customer", get(list_customers).post(create_customer))
        .route("/customer/lookup", get(lookup_customer))
        .route(
            "/customer/{id}",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomerRequest {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub mobile: String,
}

impl CustomerRequest {
    fn validate(&self) -> ApiResult<()> {
        validate_name("customer name", &self.name)?;
        validate_mobile(&self.mobile)?;
        Ok(())
    }

    fn apply_to(self, customer: &mut Customer) {
        customer.name = self.name.trim().to_string();
        customer.address = self.address.trim().to_string();
        customer.mobile = self.mobile.trim().to_string();
    }
}

pub async fn list_customers(
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Customer>>> {
    let customers = state.stores.customers.list().await?;
    Ok(Json(query.apply(customers)?))
}

pub async fn lookup_customer(
    State(state): State<SharedState>,
    Query(query): Query<LookupQuery>,
) -> ApiResult<Json<Customer>> {
    let customers = state.stores.customers.list().await?;
    Ok(Json(find_match(&customers, "customer", &query.q)?.clone()))
}

pub async fn get_customer(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Customer>> {
    Ok(Json(state.stores.customers.require(&id).await?))
}

pub async fn create_customer(
    State(state): State<SharedState>,
    Json(req): Json<CustomerRequest>,
) -> ApiResult<(StatusCode, Json<Customer>)> {
    req.validate()?;

    let existing = state.stores.customers.list().await?;
    let mut customer = Customer::new(next_numeric_id(existing.iter().map(|c| c.id)), "");
    req.apply_to(&mut customer);

    let customer = state.stores.customers.upsert(customer).await?;
    info!(id = customer.id, name = %customer.name, "Customer created");
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn update_customer(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<CustomerRequest>,
) -> ApiResult<Json<Customer>> {
    req.validate()?;

    let mut customer = state.stores.customers.require(&id).await?;
    let renamed = customer.name != req.name.trim();
    req.apply_to(&mut customer);
    let customer = state.stores.customers.upsert(customer).await?;

    // Price lists carry the customer's name for display.
    if renamed {
        if let Some(mut list) = state.stores.product_prices.get(&id).await? {
            list.customer_name = customer.name.clone();
            state.stores.product_prices.upsert(list).await?;
            debug!(id, "Price list renamed with customer");
        }
    }

    info!(id, "Customer updated");
    Ok(Json(customer))
}

/// Deletes a customer and its price list. Orders and sales keep the
/// customer's name as recorded.
pub async fn delete_customer(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.stores.customers.require(&id).await?;

    if state.stores.product_prices.delete(&id).await? {
        debug!(id, "Price list removed with customer");
    }
    if !state.stores.customers.delete(&id).await? {
        return Err(ApiError::not_found("Customer", id));
    }

    info!(id, "Customer deleted");
    Ok(StatusCode::NO_CONTENT)
}
