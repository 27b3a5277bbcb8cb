//! Best-effort reversal of stock entries created by a failed saga.

use std::sync::Arc;

use common::StockEntryId;

use crate::context::TenantContext;
use crate::error::RejectionKind;
use crate::inventory::StockClient;

/// Reason sent to the inventory service with every compensation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompensationReason {
    InsufficientStock,
    StockRejected,
    SkuNotFound,
    OrderCreationFailed,
    PosSaleCreationFailed,
    OrderPersistenceFailed,
    PosSalePersistenceFailed,
    AggregateCreationFailed,
}

impl CompensationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompensationReason::InsufficientStock => "insufficient_stock",
            CompensationReason::StockRejected => "stock_rejected",
            CompensationReason::SkuNotFound => "sku_not_found",
            CompensationReason::OrderCreationFailed => "order_creation_failed",
            CompensationReason::PosSaleCreationFailed => "pos_sale_creation_failed",
            CompensationReason::OrderPersistenceFailed => "order_persistence_failed",
            CompensationReason::PosSalePersistenceFailed => "pos_sale_persistence_failed",
            CompensationReason::AggregateCreationFailed => "aggregate_creation_failed",
        }
    }

    /// Reason for a line the inventory service declined.
    pub fn for_rejection(kind: RejectionKind) -> Self {
        match kind {
            RejectionKind::InsufficientStock => CompensationReason::InsufficientStock,
            _ => CompensationReason::StockRejected,
        }
    }
}

impl std::fmt::Display for CompensationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one compensation loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompensationReport {
    pub attempted: usize,
    pub compensated: Vec<StockEntryId>,
    /// Entries left for manual intervention, with the error seen.
    pub failed: Vec<(StockEntryId, String)>,
}

impl CompensationReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Walks recorded stock entries and asks the inventory service to reverse each.
#[derive(Clone)]
pub struct Compensator {
    stock: Arc<dyn StockClient>,
}

impl Compensator {
    pub fn new(stock: Arc<dyn StockClient>) -> Self {
        Self { stock }
    }

    /// Compensates `entries` in the order they were created.
    ///
    /// A failed call is logged and counted, then the loop moves on. Nothing is
    /// retried and no error is returned.
    #[tracing::instrument(skip(self, ctx, entries), fields(tenant_id = %ctx.tenant_id, entries = entries.len(), %reason))]
    pub async fn compensate(
        &self,
        ctx: &TenantContext,
        entries: &[StockEntryId],
        reason: CompensationReason,
    ) -> CompensationReport {
        let mut report = CompensationReport::default();
        if entries.is_empty() {
            return report;
        }

        tracing::warn!(count = entries.len(), %reason, "compensating stock entries");

        for entry in entries {
            report.attempted += 1;
            metrics::counter!("stock_compensations_total").increment(1);

            match self.stock.compensate(ctx, *entry, reason).await {
                Ok(()) => {
                    tracing::info!(stock_entry_id = %entry, %reason, "stock entry compensated");
                    report.compensated.push(*entry);
                }
                Err(e) => {
                    metrics::counter!(
                        "stock_compensation_failures_total",
                        "reason" => reason.as_str()
                    )
                    .increment(1);
                    tracing::error!(
                        stock_entry_id = %entry,
                        tenant_id = %ctx.tenant_id,
                        %reason,
                        error = %e,
                        "compensation failed; manual intervention required"
                    );
                    report.failed.push((*entry, e.to_string()));
                }
            }
        }

        report
    }
}
