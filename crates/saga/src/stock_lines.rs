//! Forward stock processing shared by the create sagas.

use common::{Sku, StockEntryId};

use crate::compensation::{CompensationReason, Compensator};
use crate::context::TenantContext;
use crate::error::{RejectionKind, SagaError, StockError};
use crate::inventory::StockClient;
use crate::reference::TransactionRef;
use crate::state::{SagaRun, SagaState};

/// One line to sell, in request order.
#[derive(Debug, Clone)]
pub(crate) struct StockLine {
    pub sku: Sku,
    pub quantity: u32,
}

/// Issues one atomic sale per line, strictly in order.
///
/// Each created entry is recorded on `run` before the next line starts. The
/// first failing line stops the loop: every entry recorded so far is
/// compensated and the line's error is returned. `transport_reason` is the
/// compensation reason used when the inventory service cannot be reached.
pub(crate) async fn sell_lines(
    stock: &dyn StockClient,
    compensator: &Compensator,
    ctx: &TenantContext,
    run: &mut SagaRun,
    reference: TransactionRef,
    lines: &[StockLine],
    transport_reason: CompensationReason,
) -> Result<Vec<StockEntryId>, SagaError> {
    run.advance(SagaState::ProcessingStock);

    for (index, line) in lines.iter().enumerate() {
        let line_ref = reference.line(index + 1);
        let outcome = stock
            .atomic_sale(ctx, &line.sku, line.quantity, &line_ref)
            .await;

        let failure = match outcome {
            Ok(result) if result.success => match result.stock_entry_id {
                Some(entry) => {
                    metrics::counter!("stock_sales_total").increment(1);
                    tracing::info!(
                        sku = %line.sku,
                        quantity = line.quantity,
                        reference = %line_ref,
                        stock_entry_id = %entry,
                        remaining_stock = result.remaining_stock,
                        "stock line processed"
                    );
                    run.record(entry);
                    continue;
                }
                None => (
                    transport_reason,
                    SagaError::Transport(format!(
                        "inventory accepted sale of {} without a stock entry id",
                        line.sku
                    )),
                ),
            },
            Ok(result) => {
                let kind = result.rejection.unwrap_or(RejectionKind::Other);
                (
                    CompensationReason::for_rejection(kind),
                    SagaError::Rejected {
                        kind,
                        sku: line.sku.to_string(),
                        message: result.message,
                    },
                )
            }
            Err(error) => {
                let reason = match &error {
                    StockError::Transport(_) => transport_reason,
                    StockError::Rejected { kind, .. } => CompensationReason::for_rejection(*kind),
                    StockError::NotFound(_) => CompensationReason::SkuNotFound,
                };
                (reason, SagaError::from_stock(line.sku.as_str(), error))
            }
        };

        let (reason, error) = failure;
        tracing::warn!(
            sku = %line.sku,
            line = index + 1,
            reference = %line_ref,
            error = %error,
            "stock line failed"
        );
        return Err(abort(compensator, ctx, run, reason, error).await);
    }

    Ok(run.entries().to_vec())
}

/// Compensates everything `run` has recorded and hands `error` back.
pub(crate) async fn abort(
    compensator: &Compensator,
    ctx: &TenantContext,
    run: &mut SagaRun,
    reason: CompensationReason,
    error: SagaError,
) -> SagaError {
    if !run.entries().is_empty() {
        run.advance(SagaState::Compensating);
        let report = compensator.compensate(ctx, run.entries(), reason).await;
        if !report.is_complete() {
            tracing::error!(
                saga = run.saga(),
                failed = report.failed.len(),
                attempted = report.attempted,
                "saga left uncompensated stock entries"
            );
        }
    }
    error
}
