//! Reserve-based stock operations exposed to clients directly.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::context::TenantContext;
use crate::create_order::parse_line;
use crate::error::{Result, SagaError};
use crate::inventory::StockClient;
use crate::reference::TransactionRef;
use crate::stock_lines::StockLine;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockLineRequest {
    pub sku: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockLinesRequest {
    pub items: Vec<StockLineRequest>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedLine {
    pub sku: String,
    pub requested_qty: u32,
    pub available: bool,
    pub available_qty: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateStockResponse {
    pub valid: bool,
    pub items: Vec<ValidatedLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservedLine {
    pub sku: String,
    pub quantity: i64,
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveStockResponse {
    pub reserved: bool,
    pub items: Vec<ReservedLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseStockRequest {
    pub sku: String,
    pub quantity: i64,
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseStockResponse {
    pub released: bool,
    pub sku: String,
    pub quantity: i64,
    pub reference: String,
}

fn parse_lines(request: &StockLinesRequest) -> Result<Vec<StockLine>> {
    if request.items.is_empty() {
        return Err(SagaError::Validation(
            "at least one item is required".to_string(),
        ));
    }
    request
        .items
        .iter()
        .map(|item| parse_line(&item.sku, item.quantity))
        .collect()
}

/// Availability checks and reservations against the inventory service.
pub struct StockOperations {
    stock: Arc<dyn StockClient>,
}

impl StockOperations {
    pub fn new(stock: Arc<dyn StockClient>) -> Self {
        Self { stock }
    }

    /// Checks every line. A line is available when enough stock is on hand
    /// and the variant is not flagged out of stock.
    #[tracing::instrument(skip(self, ctx, request), fields(tenant_id = %ctx.tenant_id))]
    pub async fn validate(
        &self,
        ctx: &TenantContext,
        request: StockLinesRequest,
    ) -> Result<ValidateStockResponse> {
        let lines = parse_lines(&request)?;
        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            let availability = self
                .stock
                .availability(ctx, &line.sku)
                .await
                .map_err(|e| SagaError::from_stock(line.sku.as_str(), e))?;
            items.push(ValidatedLine {
                sku: line.sku.to_string(),
                requested_qty: line.quantity,
                available: availability.can_fulfill(line.quantity),
                available_qty: availability.available_quantity as i64,
            });
        }

        Ok(ValidateStockResponse {
            valid: items.iter().all(|item| item.available),
            items,
        })
    }

    /// Reserves every line or none.
    ///
    /// When a line fails, the lines reserved before it are released again.
    /// Release failures are logged and do not change the returned error.
    #[tracing::instrument(skip(self, ctx, request), fields(tenant_id = %ctx.tenant_id))]
    pub async fn reserve(
        &self,
        ctx: &TenantContext,
        request: StockLinesRequest,
    ) -> Result<ReserveStockResponse> {
        let lines = parse_lines(&request)?;
        let batch = TransactionRef::for_reservation();
        let mut reserved: Vec<(StockLine, String)> = Vec::with_capacity(lines.len());

        for (index, line) in lines.into_iter().enumerate() {
            let reference = batch.line(index + 1);
            let outcome = self
                .stock
                .reserve(ctx, &line.sku, line.quantity, &reference)
                .await;
            match outcome {
                Ok(_) => reserved.push((line, reference)),
                Err(e) => {
                    tracing::warn!(sku = %line.sku, error = %e, "reservation failed, releasing reserved lines");
                    self.release_all(ctx, &reserved).await;
                    return Err(SagaError::from_stock(line.sku.as_str(), e));
                }
            }
        }

        Ok(ReserveStockResponse {
            reserved: true,
            items: reserved
                .into_iter()
                .map(|(line, reference)| ReservedLine {
                    sku: line.sku.to_string(),
                    quantity: i64::from(line.quantity),
                    reference,
                })
                .collect(),
        })
    }

    async fn release_all(&self, ctx: &TenantContext, reserved: &[(StockLine, String)]) {
        for (line, reference) in reserved {
            if let Err(e) = self
                .stock
                .release(ctx, &line.sku, line.quantity, reference)
                .await
            {
                tracing::error!(
                    sku = %line.sku,
                    %reference,
                    error = %e,
                    "failed to release reservation"
                );
            }
        }
    }

    /// Releases one previous reservation.
    #[tracing::instrument(skip(self, ctx, request), fields(tenant_id = %ctx.tenant_id))]
    pub async fn release(
        &self,
        ctx: &TenantContext,
        request: ReleaseStockRequest,
    ) -> Result<ReleaseStockResponse> {
        let line = parse_line(&request.sku, request.quantity)?;
        let reference = request.reference.trim();
        if reference.is_empty() {
            return Err(SagaError::Validation("reference is required".to_string()));
        }

        let result = self
            .stock
            .release(ctx, &line.sku, line.quantity, reference)
            .await
            .map_err(|e| SagaError::from_stock(line.sku.as_str(), e))?;

        Ok(ReleaseStockResponse {
            released: true,
            sku: result.sku,
            quantity: result.released_qty,
            reference: result.reference,
        })
    }
}
