//! Create-order saga: snapshot capture, atomic stock sales, persistence.

use std::sync::Arc;

use common::{OrderId, OrderItemId, Sku};
use domain::{NewOrderItem, Order, OrderStatus};
use serde::{Deserialize, Serialize};
use store::OrderRepository;

use crate::catalog::{CatalogClient, SnapshotFetcher};
use crate::compensation::{CompensationReason, Compensator};
use crate::context::TenantContext;
use crate::error::{Result, SagaError};
use crate::inventory::StockClient;
use crate::reference::TransactionRef;
use crate::state::{SagaRun, SagaState};
use crate::stock_lines::{StockLine, abort, sell_lines};

pub const SAGA_NAME: &str = "create_order";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderLineRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLineRequest {
    pub sku: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedOrderItem {
    pub item_id: OrderItemId,
    pub sku: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrderResponse {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub items: Vec<CreatedOrderItem>,
    /// Number of order lines.
    pub total_items: usize,
}

impl From<&Order> for CreateOrderResponse {
    fn from(order: &Order) -> Self {
        let items: Vec<CreatedOrderItem> = order
            .items()
            .iter()
            .map(|item| CreatedOrderItem {
                item_id: item.id(),
                sku: item.sku().to_string(),
                quantity: item.quantity(),
            })
            .collect();
        Self {
            order_id: order.id(),
            status: order.status(),
            total_items: items.len(),
            items,
        }
    }
}

/// Largest quantity a single line may carry. Line quantities are stored as
/// 32-bit signed integers.
pub const MAX_LINE_QUANTITY: u32 = i32::MAX as u32;

/// Validated line: parsed SKU and a quantity in `1..=MAX_LINE_QUANTITY`.
pub(crate) fn parse_line(sku: &str, quantity: i64) -> Result<StockLine> {
    let sku = Sku::parse(sku)?;
    if quantity <= 0 {
        return Err(SagaError::Validation(format!(
            "quantity for SKU {sku} must be greater than zero"
        )));
    }
    let quantity = u32::try_from(quantity)
        .ok()
        .filter(|q| *q <= MAX_LINE_QUANTITY)
        .ok_or_else(|| {
            SagaError::Validation(format!(
                "quantity for SKU {sku} must not exceed {MAX_LINE_QUANTITY}"
            ))
        })?;
    Ok(StockLine { sku, quantity })
}

/// Creates an order whose stock is taken immediately with atomic sales.
///
/// Snapshots are fetched before any stock call, so catalog failures need no
/// compensation. Once stock processing has started, any failure compensates
/// every stock entry created by this run.
pub struct CreateOrderUseCase {
    stock: Arc<dyn StockClient>,
    snapshots: SnapshotFetcher,
    orders: Arc<dyn OrderRepository>,
    compensator: Compensator,
}

impl CreateOrderUseCase {
    pub fn new(
        stock: Arc<dyn StockClient>,
        catalog: Arc<dyn CatalogClient>,
        orders: Arc<dyn OrderRepository>,
    ) -> Self {
        Self {
            compensator: Compensator::new(stock.clone()),
            snapshots: SnapshotFetcher::new(catalog),
            stock,
            orders,
        }
    }

    #[tracing::instrument(skip(self, ctx, request), fields(tenant_id = %ctx.tenant_id, lines = request.items.len()))]
    pub async fn execute(
        &self,
        ctx: &TenantContext,
        request: CreateOrderRequest,
    ) -> Result<CreateOrderResponse> {
        if request.items.is_empty() {
            return Err(SagaError::Validation(
                "order must contain at least one item".to_string(),
            ));
        }
        let lines = request
            .items
            .iter()
            .map(|item| parse_line(&item.sku, item.quantity))
            .collect::<Result<Vec<_>>>()?;

        let mut run = SagaRun::start(SAGA_NAME, SagaState::FetchingSnapshots);
        match self.run(ctx, &mut run, lines).await {
            Ok(response) => {
                run.complete();
                Ok(response)
            }
            Err(e) => {
                run.fail(&e.to_string());
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        ctx: &TenantContext,
        run: &mut SagaRun,
        lines: Vec<StockLine>,
    ) -> Result<CreateOrderResponse> {
        let mut new_items = Vec::with_capacity(lines.len());
        for line in &lines {
            let (product, variant) = self.snapshots.fetch(ctx, &line.sku).await?;
            new_items.push(NewOrderItem::new(
                line.sku.clone(),
                line.quantity,
                product,
                variant,
            ));
        }

        run.advance(SagaState::BuildingAggregate);
        let order = Order::new(ctx.tenant_id, new_items)?;
        let reference = TransactionRef::for_order(order.id());
        tracing::info!(order_id = %order.id(), %reference, "order built, processing stock");

        sell_lines(
            self.stock.as_ref(),
            &self.compensator,
            ctx,
            run,
            reference,
            &lines,
            CompensationReason::OrderCreationFailed,
        )
        .await?;

        run.advance(SagaState::Persisting);
        if let Err(e) = self.orders.save(&order).await {
            tracing::error!(order_id = %order.id(), error = %e, "order persistence failed after stock was taken");
            return Err(abort(
                &self.compensator,
                ctx,
                run,
                CompensationReason::OrderPersistenceFailed,
                e.into(),
            )
            .await);
        }

        tracing::info!(order_id = %order.id(), lines = order.item_count(), "order created");
        Ok(CreateOrderResponse::from(&order))
    }
}
