//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{OrderId, TenantId};
use serde::{Deserialize, Serialize};

use super::{NewOrderItem, OrderError, OrderItem, OrderStatus};

/// Order aggregate root.
///
/// An order exists only after stock has been sold for every line, so it is
/// born in [`OrderStatus::Created`]. Its lines are fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    tenant_id: TenantId,
    status: OrderStatus,
    items: Vec<OrderItem>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Order {
    /// Creates a new order with the given lines.
    ///
    /// Every line receives the new order's id.
    pub fn new(tenant_id: TenantId, items: Vec<NewOrderItem>) -> Result<Self, OrderError> {
        if items.is_empty() {
            return Err(OrderError::NoItems);
        }

        let id = OrderId::new();
        let items = items
            .into_iter()
            .map(|item| {
                OrderItem::new(
                    id,
                    item.sku,
                    item.quantity,
                    item.product_snapshot,
                    item.variant_snapshot,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        let now = Utc::now();
        Ok(Self {
            id,
            tenant_id,
            status: OrderStatus::Created,
            items,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuilds an order from storage without validation.
    pub fn restore(
        id: OrderId,
        tenant_id: TenantId,
        status: OrderStatus,
        items: Vec<OrderItem>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            tenant_id,
            status,
            items,
            created_at,
            updated_at,
        }
    }
}

// Query methods
impl Order {
    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    /// Returns the number of lines.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Returns the total quantity across all lines.
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(OrderItem::quantity).sum()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

// Transitions
impl Order {
    /// Moves the order from CREATED to CONFIRMED.
    pub fn confirm(&mut self) -> Result<(), OrderError> {
        if !self.status.can_confirm() {
            return Err(OrderError::InvalidStateTransition {
                current_status: self.status,
                action: "confirm",
            });
        }
        self.status = OrderStatus::Confirmed;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Moves the order from CONFIRMED to CANCELED.
    pub fn cancel(&mut self) -> Result<(), OrderError> {
        if !self.status.can_cancel() {
            return Err(OrderError::InvalidStateTransition {
                current_status: self.status,
                action: "cancel",
            });
        }
        self.status = OrderStatus::Canceled;
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use common::Sku;

    use super::*;
    use crate::Snapshot;

    fn line(sku: &str, quantity: u32) -> NewOrderItem {
        NewOrderItem::new(
            Sku::parse(sku).unwrap(),
            quantity,
            Snapshot::from_bytes(b"{}".to_vec()),
            Snapshot::from_bytes(b"{}".to_vec()),
        )
    }

    #[test]
    fn test_new_order_is_created() {
        let order = Order::new(TenantId::new(), vec![line("A", 2), line("B", 1)]).unwrap();
        assert_eq!(order.status(), OrderStatus::Created);
        assert_eq!(order.item_count(), 2);
        assert_eq!(order.total_quantity(), 3);
    }

    #[test]
    fn test_items_carry_order_id() {
        let order = Order::new(TenantId::new(), vec![line("A", 1), line("B", 1)]).unwrap();
        assert!(order.items().iter().all(|i| i.order_id() == order.id()));
    }

    #[test]
    fn test_rejects_empty_items() {
        let result = Order::new(TenantId::new(), Vec::new());
        assert!(matches!(result, Err(OrderError::NoItems)));
    }

    #[test]
    fn test_rejects_zero_quantity_line() {
        let result = Order::new(TenantId::new(), vec![line("A", 1), line("B", 0)]);
        assert!(matches!(result, Err(OrderError::InvalidQuantity { .. })));
    }

    #[test]
    fn test_confirm_then_cancel() {
        let mut order = Order::new(TenantId::new(), vec![line("A", 1)]).unwrap();
        order.confirm().unwrap();
        assert_eq!(order.status(), OrderStatus::Confirmed);
        order.cancel().unwrap();
        assert_eq!(order.status(), OrderStatus::Canceled);
    }

    #[test]
    fn test_cannot_cancel_created_order() {
        let mut order = Order::new(TenantId::new(), vec![line("A", 1)]).unwrap();
        let err = order.cancel().unwrap_err();
        assert!(matches!(
            err,
            OrderError::InvalidStateTransition {
                current_status: OrderStatus::Created,
                action: "cancel"
            }
        ));
    }

    #[test]
    fn test_cannot_confirm_twice() {
        let mut order = Order::new(TenantId::new(), vec![line("A", 1)]).unwrap();
        order.confirm().unwrap();
        assert!(order.confirm().is_err());
    }
}
