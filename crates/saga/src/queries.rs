//! Read side for orders.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::{OrderId, OrderItemId, TenantId};
use domain::{Order, OrderStatus};
use serde::{Deserialize, Serialize};
use store::{OrderRepository, PageRequest};

use crate::context::TenantContext;
use crate::error::{Result, SagaError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItemView {
    pub item_id: OrderItemId,
    pub sku: String,
    pub quantity: u32,
    /// Catalog documents as captured at creation time.
    #[serde(skip_serializing_if = "serde_json::Value::is_null", default)]
    pub product_snapshot: serde_json::Value,
    #[serde(skip_serializing_if = "serde_json::Value::is_null", default)]
    pub variant_snapshot: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderView {
    pub order_id: OrderId,
    pub tenant_id: TenantId,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItemView>,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.id(),
            tenant_id: order.tenant_id(),
            status: order.status(),
            created_at: order.created_at(),
            items: order
                .items()
                .iter()
                .map(|item| OrderItemView {
                    item_id: item.id(),
                    sku: item.sku().to_string(),
                    quantity: item.quantity(),
                    product_snapshot: item.product_snapshot().as_json(),
                    variant_snapshot: item.variant_snapshot().as_json(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderListResponse {
    pub items: Vec<OrderView>,
    pub total_count: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u64,
}

pub struct OrderQueries {
    orders: Arc<dyn OrderRepository>,
}

impl OrderQueries {
    pub fn new(orders: Arc<dyn OrderRepository>) -> Self {
        Self { orders }
    }

    #[tracing::instrument(skip(self, ctx), fields(tenant_id = %ctx.tenant_id))]
    pub async fn get(&self, ctx: &TenantContext, order_id: OrderId) -> Result<OrderView> {
        self.orders
            .find_by_id(ctx.tenant_id, order_id)
            .await?
            .map(|order| OrderView::from(&order))
            .ok_or_else(|| SagaError::NotFound(format!("order {order_id}")))
    }

    /// Newest first.
    #[tracing::instrument(skip(self, ctx), fields(tenant_id = %ctx.tenant_id))]
    pub async fn list(&self, ctx: &TenantContext, request: PageRequest) -> Result<OrderListResponse> {
        let page = self.orders.list(ctx.tenant_id, request).await?;
        let total_pages = page.total_pages();
        let page = page.map(|order| OrderView::from(&order));
        Ok(OrderListResponse {
            items: page.items,
            total_count: page.total_count,
            page: page.page,
            page_size: page.page_size,
            total_pages,
        })
    }
}
