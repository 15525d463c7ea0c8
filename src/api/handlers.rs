//! API Handlers
//!
//! HTTP request handlers translating between JSON and the listing service.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};

use super::extract::{ApiJson, ApiPath, ApiQuery};

use crate::config::Config;
use crate::error::Result;
use crate::models::{
    Checkout, CreateCheckoutRequest, DeleteResponse, HealthResponse, ListCheckoutsParams,
    StatsResponse, UpdateStatusRequest,
};
use crate::service::{CheckoutPage, ListingService};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ListingService>,
}

impl AppState {
    /// Creates a new AppState around an existing service.
    pub fn new(service: ListingService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    /// Creates a new AppState with in-memory store and cache from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(ListingService::from_config(config))
    }
}

/// Handler for POST /tenants/:tenant/checkouts
pub async fn create_checkout_handler(
    State(state): State<AppState>,
    ApiPath(tenant): ApiPath<String>,
    ApiJson(req): ApiJson<CreateCheckoutRequest>,
) -> Result<(StatusCode, Json<Checkout>)> {
    let checkout = state
        .service
        .create_checkout(req.into_new_checkout(tenant))
        .await?;
    Ok((StatusCode::CREATED, Json(checkout)))
}

/// Handler for GET /tenants/:tenant/checkouts
pub async fn list_checkouts_handler(
    State(state): State<AppState>,
    ApiPath(tenant): ApiPath<String>,
    ApiQuery(params): ApiQuery<ListCheckoutsParams>,
) -> Result<Json<CheckoutPage>> {
    let query = params.into_query(tenant)?;
    let page = state.service.list_checkouts(query).await?;
    Ok(Json(page))
}

/// Handler for GET /tenants/:tenant/checkouts/:id
pub async fn get_checkout_handler(
    State(state): State<AppState>,
    ApiPath((tenant, id)): ApiPath<(String, String)>,
) -> Result<Json<Checkout>> {
    let checkout = state.service.get_checkout(&tenant, &id).await?;
    Ok(Json(checkout))
}

/// Handler for PATCH /tenants/:tenant/checkouts/:id
pub async fn update_status_handler(
    State(state): State<AppState>,
    ApiPath((tenant, id)): ApiPath<(String, String)>,
    ApiJson(req): ApiJson<UpdateStatusRequest>,
) -> Result<Json<Checkout>> {
    let checkout = state.service.update_status(&tenant, &id, req.status).await?;
    Ok(Json(checkout))
}

/// Handler for DELETE /tenants/:tenant/checkouts/:id
pub async fn delete_checkout_handler(
    State(state): State<AppState>,
    ApiPath((tenant, id)): ApiPath<(String, String)>,
) -> Result<Json<DeleteResponse>> {
    state.service.delete_checkout(&tenant, &id).await?;
    Ok(Json(DeleteResponse::new(id)))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.service.cache_stats().await.into())
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
