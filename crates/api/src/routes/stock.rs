//! Reservation-based stock endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use saga::{
    ReleaseStockRequest, ReleaseStockResponse, ReserveStockResponse, StockLinesRequest,
    ValidateStockResponse,
};

use crate::AppState;
use crate::error::ApiError;
use crate::extract::Tenant;

/// POST /api/v1/orders/validate-stock
#[tracing::instrument(skip_all)]
pub async fn validate(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    Json(request): Json<StockLinesRequest>,
) -> Result<Json<ValidateStockResponse>, ApiError> {
    Ok(Json(state.stock_ops.validate(&ctx, request).await?))
}

/// POST /api/v1/orders/reserve-stock
#[tracing::instrument(skip_all)]
pub async fn reserve(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    Json(request): Json<StockLinesRequest>,
) -> Result<Json<ReserveStockResponse>, ApiError> {
    let ops = state.stock_ops.clone();
    let response = tokio::spawn(async move { ops.reserve(&ctx, request).await }).await??;
    Ok(Json(response))
}

/// POST /api/v1/orders/release-stock
#[tracing::instrument(skip_all)]
pub async fn release(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    Json(request): Json<ReleaseStockRequest>,
) -> Result<Json<ReleaseStockResponse>, ApiError> {
    Ok(Json(state.stock_ops.release(&ctx, request).await?))
}
