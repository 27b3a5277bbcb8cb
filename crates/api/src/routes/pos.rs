//! Point-of-sale endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use saga::{PosSaleRequest, PosSaleResponse, PosSaleSummary};
use serde::Serialize;

use crate::AppState;
use crate::error::ApiError;
use crate::extract::Tenant;

#[derive(Debug, Serialize)]
pub struct PosSaleListResponse {
    pub items: Vec<PosSaleSummary>,
    pub total_count: usize,
}

/// POST /api/v1/pos/sale
#[tracing::instrument(skip_all)]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
    Json(request): Json<PosSaleRequest>,
) -> Result<(StatusCode, Json<PosSaleResponse>), ApiError> {
    let use_case = state.pos_sale.clone();
    let response =
        tokio::spawn(async move { use_case.execute(&ctx, request).await }).await??;
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/v1/pos/sales
#[tracing::instrument(skip_all)]
pub async fn list(
    State(state): State<Arc<AppState>>,
    Tenant(ctx): Tenant,
) -> Result<Json<PosSaleListResponse>, ApiError> {
    let items = state.pos_sale.list(&ctx).await?;
    Ok(Json(PosSaleListResponse {
        total_count: items.len(),
        items,
    }))
}
