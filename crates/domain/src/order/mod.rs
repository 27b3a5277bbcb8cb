//! Order aggregate and related types.

mod aggregate;
mod item;
mod state;

pub use aggregate::Order;
pub use item::{NewOrderItem, OrderItem};
pub use state::{OrderStatus, UnknownStatus};

use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Order is not in the expected status.
    #[error("Invalid state transition: cannot {action} from {current_status} status")]
    InvalidStateTransition {
        current_status: OrderStatus,
        action: &'static str,
    },

    /// Invalid quantity.
    #[error("Invalid quantity for {sku} (must be greater than 0)")]
    InvalidQuantity { sku: String },

    /// Order has no items.
    #[error("Order has no items")]
    NoItems,
}
