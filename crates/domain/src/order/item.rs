//! Order lines.

use chrono::{DateTime, Utc};
use common::{OrderId, OrderItemId, Sku};
use serde::{Deserialize, Serialize};

use super::OrderError;
use crate::Snapshot;

/// A line of an order that has not been attached to an order yet.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub sku: Sku,
    pub quantity: u32,
    pub product_snapshot: Snapshot,
    pub variant_snapshot: Snapshot,
}

impl NewOrderItem {
    pub fn new(
        sku: Sku,
        quantity: u32,
        product_snapshot: Snapshot,
        variant_snapshot: Snapshot,
    ) -> Self {
        Self {
            sku,
            quantity,
            product_snapshot,
            variant_snapshot,
        }
    }
}

/// A line of an order with its catalog data frozen at purchase time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    id: OrderItemId,
    order_id: OrderId,
    sku: Sku,
    quantity: u32,
    product_snapshot: Snapshot,
    variant_snapshot: Snapshot,
    created_at: DateTime<Utc>,
}

impl OrderItem {
    /// Creates a line. Quantity must be greater than zero.
    pub fn new(
        order_id: OrderId,
        sku: Sku,
        quantity: u32,
        product_snapshot: Snapshot,
        variant_snapshot: Snapshot,
    ) -> Result<Self, OrderError> {
        if quantity == 0 {
            return Err(OrderError::InvalidQuantity {
                sku: sku.to_string(),
            });
        }
        Ok(Self {
            id: OrderItemId::new(),
            order_id,
            sku,
            quantity,
            product_snapshot,
            variant_snapshot,
            created_at: Utc::now(),
        })
    }

    /// Rebuilds a line from storage without validation.
    pub fn restore(
        id: OrderItemId,
        order_id: OrderId,
        sku: Sku,
        quantity: u32,
        product_snapshot: Snapshot,
        variant_snapshot: Snapshot,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            order_id,
            sku,
            quantity,
            product_snapshot,
            variant_snapshot,
            created_at,
        }
    }

    pub fn id(&self) -> OrderItemId {
        self.id
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn sku(&self) -> &Sku {
        &self.sku
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn product_snapshot(&self) -> &Snapshot {
        &self.product_snapshot
    }

    pub fn variant_snapshot(&self) -> &Snapshot {
        &self.variant_snapshot
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_quantity() {
        let result = OrderItem::new(
            OrderId::new(),
            Sku::parse("SKU-1").unwrap(),
            0,
            Snapshot::default(),
            Snapshot::default(),
        );
        assert!(matches!(result, Err(OrderError::InvalidQuantity { .. })));
    }

    #[test]
    fn keeps_snapshots() {
        let item = OrderItem::new(
            OrderId::new(),
            Sku::parse("SKU-1").unwrap(),
            3,
            Snapshot::from_bytes(b"{\"p\":1}".to_vec()),
            Snapshot::from_bytes(b"{\"v\":1}".to_vec()),
        )
        .unwrap();
        assert_eq!(item.quantity(), 3);
        assert_eq!(item.product_snapshot().as_bytes(), b"{\"p\":1}");
        assert_eq!(item.variant_snapshot().as_bytes(), b"{\"v\":1}");
    }
}
