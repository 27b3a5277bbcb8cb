//! Confirm and cancel transitions of persisted orders.
//!
//! Both transitions move stock with the legacy primitives, one line at a
//! time. The first failing line aborts the transition. Lines already
//! consumed (or reverted) earlier in the same loop are left as they are;
//! no compensation is attempted.

use std::sync::Arc;

use common::OrderId;
use domain::{Order, OrderStatus};
use serde::{Deserialize, Serialize};
use store::OrderRepository;

use crate::context::TenantContext;
use crate::error::{Result, SagaError};
use crate::events::{EventEnvelope, EventPublisher};
use crate::inventory::StockClient;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTransitionResponse {
    pub order_id: OrderId,
    pub status: OrderStatus,
}

pub struct OrderLifecycle {
    stock: Arc<dyn StockClient>,
    orders: Arc<dyn OrderRepository>,
    publisher: Arc<dyn EventPublisher>,
}

impl OrderLifecycle {
    pub fn new(
        stock: Arc<dyn StockClient>,
        orders: Arc<dyn OrderRepository>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            stock,
            orders,
            publisher,
        }
    }

    async fn load(&self, ctx: &TenantContext, order_id: OrderId) -> Result<Order> {
        self.orders
            .find_by_id(ctx.tenant_id, order_id)
            .await?
            .ok_or_else(|| SagaError::NotFound(format!("order {order_id}")))
    }

    /// CREATED → CONFIRMED. Consumes the reserved stock of every line.
    ///
    /// `reference` defaults to the order id.
    #[tracing::instrument(skip(self, ctx), fields(tenant_id = %ctx.tenant_id))]
    pub async fn confirm(
        &self,
        ctx: &TenantContext,
        order_id: OrderId,
        reference: Option<String>,
    ) -> Result<OrderTransitionResponse> {
        let mut order = self.load(ctx, order_id).await?;
        if !order.status().can_confirm() {
            return Err(SagaError::Precondition(format!(
                "order {order_id} is {}, expected CREATED",
                order.status()
            )));
        }

        let reference = reference
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| order_id.to_string());

        for item in order.items() {
            self.stock
                .consume(ctx, item.sku(), item.quantity(), &reference)
                .await
                .map_err(|e| {
                    tracing::warn!(%order_id, sku = %item.sku(), error = %e, "consume failed, confirm aborted");
                    SagaError::from_stock(item.sku().as_str(), e)
                })?;
        }

        self.orders.confirm(ctx.tenant_id, order_id).await?;
        order.confirm()?;
        tracing::info!(%order_id, %reference, "order confirmed");

        self.publish_confirmed(&order).await;

        Ok(OrderTransitionResponse {
            order_id,
            status: order.status(),
        })
    }

    /// CONFIRMED → CANCELED. Reverts the consumed stock of every line.
    #[tracing::instrument(skip(self, ctx), fields(tenant_id = %ctx.tenant_id))]
    pub async fn cancel(
        &self,
        ctx: &TenantContext,
        order_id: OrderId,
    ) -> Result<OrderTransitionResponse> {
        let mut order = self.load(ctx, order_id).await?;
        if !order.status().can_cancel() {
            return Err(SagaError::Precondition(format!(
                "order {order_id} is {}, expected CONFIRMED",
                order.status()
            )));
        }

        let reference = order_id.to_string();
        for item in order.items() {
            self.stock
                .revert_consume(ctx, item.sku(), item.quantity(), &reference)
                .await
                .map_err(|e| {
                    tracing::warn!(%order_id, sku = %item.sku(), error = %e, "revert failed, cancel aborted");
                    SagaError::from_stock(item.sku().as_str(), e)
                })?;
        }

        self.orders.cancel(ctx.tenant_id, order_id).await?;
        order.cancel()?;
        tracing::info!(%order_id, "order canceled");

        Ok(OrderTransitionResponse {
            order_id,
            status: order.status(),
        })
    }

    async fn publish_confirmed(&self, order: &Order) {
        let event = EventEnvelope::order_confirmed(order);
        match self.publisher.publish(&event).await {
            Ok(()) => {
                metrics::counter!("order_events_published_total").increment(1);
            }
            Err(e) => {
                metrics::counter!("order_event_publish_failures_total").increment(1);
                tracing::warn!(order_id = %order.id(), error = %e, "failed to publish order confirmed event");
            }
        }
    }
}
