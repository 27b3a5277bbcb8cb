//! Domain events published after an order is confirmed.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::Order;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

pub const ORDER_CONFIRMED: &str = "sales.order.confirmed";
pub const ORDER_AGGREGATE_TYPE: &str = "sales_order";
pub const EVENT_VERSION: u32 = 1;

/// Envelope every published event travels in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_id: Uuid,
    pub event_type: String,
    pub event_version: u32,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub tenant_id: String,
    pub occurred_at: DateTime<Utc>,
    pub payload: serde_json::Value,
}

impl EventEnvelope {
    /// `sales.order.confirmed` for a confirmed order.
    pub fn order_confirmed(order: &Order) -> Self {
        let lines: Vec<serde_json::Value> = order
            .items()
            .iter()
            .map(|item| {
                serde_json::json!({
                    "item_id": item.id(),
                    "sku": item.sku(),
                    "quantity": item.quantity(),
                })
            })
            .collect();

        Self {
            event_id: Uuid::new_v4(),
            event_type: ORDER_CONFIRMED.to_string(),
            event_version: EVENT_VERSION,
            aggregate_type: ORDER_AGGREGATE_TYPE.to_string(),
            aggregate_id: order.id().to_string(),
            tenant_id: order.tenant_id().to_string(),
            occurred_at: Utc::now(),
            payload: serde_json::json!({
                "order_id": order.id(),
                "status": order.status(),
                "total_quantity": order.total_quantity(),
                "lines": lines,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("event publish failed: {0}")]
pub struct PublishError(pub String);

/// Outbound channel for domain events. Delivery is best effort.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &EventEnvelope) -> Result<(), PublishError>;
}

/// Publisher that only logs the event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventPublisher;

#[async_trait]
impl EventPublisher for TracingEventPublisher {
    async fn publish(&self, event: &EventEnvelope) -> Result<(), PublishError> {
        let payload =
            serde_json::to_string(event).map_err(|e| PublishError(e.to_string()))?;
        tracing::info!(
            event_type = %event.event_type,
            aggregate_id = %event.aggregate_id,
            %payload,
            "domain event published"
        );
        Ok(())
    }
}

#[derive(Debug, Default)]
struct PublisherState {
    events: Vec<EventEnvelope>,
    fail: bool,
}

/// In-memory publisher for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventPublisher {
    state: Arc<RwLock<PublisherState>>,
}

impl InMemoryEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail(&self, fail: bool) {
        self.state.write().await.fail = fail;
    }

    pub async fn events(&self) -> Vec<EventEnvelope> {
        self.state.read().await.events.clone()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventPublisher {
    async fn publish(&self, event: &EventEnvelope) -> Result<(), PublishError> {
        let mut state = self.state.write().await;
        if state.fail {
            return Err(PublishError("simulated broker outage".to_string()));
        }
        state.events.push(event.clone());
        Ok(())
    }
}
