//! Order endpoints.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use saga::{
    CreateOrderRequest, CreateOrderResponse, OrderListResponse, OrderTransitionResponse,
    OrderView,
};
use serde::Deserialize;
use store::PageRequest;

use super::parse_order_id;
use crate::AppState;
use crate::error::ApiError;
use crate::extract::Tenant;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConfirmRequest {
    #[serde(default)]
    pub reference: Option<String>,
}

/// POST /api/v1/orders
///
/// The saga runs on its own task so a dropped connection cannot stop it
/// halfway through.
#[tracing::instrument(skip_all)]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<CreateOrderResponse>), ApiError> {
    let use_case = state.create_order.clone();
    let response =
        tokio::spawn(async move { use_case.execute(&ctx, request).await }).await??;
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/v1/orders/{id}
#[tracing::instrument(skip_all, fields(order_id = %id))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    Path(id): Path<String>,
) -> Result<Json<OrderView>, ApiError> {
    let order_id = parse_order_id(&id)?;
    Ok(Json(state.queries.get(&ctx, order_id).await?))
}

/// GET /api/v1/orders?page=&page_size=
#[tracing::instrument(skip_all)]
pub async fn list(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    Query(params): Query<ListParams>,
) -> Result<Json<OrderListResponse>, ApiError> {
    let request = PageRequest::new(params.page.unwrap_or(1), params.page_size.unwrap_or(10));
    Ok(Json(state.queries.list(&ctx, request).await?))
}

/// POST /api/v1/orders/{id}/confirm
///
/// The body is optional: `{"reference": "..."}`.
#[tracing::instrument(skip_all, fields(order_id = %id))]
pub async fn confirm(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<OrderTransitionResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let reference = if body.is_empty() {
        None
    } else {
        serde_json::from_slice::<ConfirmRequest>(&body)
            .map_err(|e| ApiError::BadRequest(format!("invalid confirm body: {e}")))?
            .reference
    };
    let lifecycle = state.lifecycle.clone();
    let response =
        tokio::spawn(async move { lifecycle.confirm(&ctx, order_id, reference).await })
            .await??;
    Ok(Json(response))
}

/// POST /api/v1/orders/{id}/cancel
#[tracing::instrument(skip_all, fields(order_id = %id))]
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    Path(id): Path<String>,
) -> Result<Json<OrderTransitionResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let lifecycle = state.lifecycle.clone();
    let response =
        tokio::spawn(async move { lifecycle.cancel(&ctx, order_id).await }).await??;
    Ok(Json(response))
}
