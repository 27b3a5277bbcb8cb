use common::OrderId;
use domain::OrderStatus;
use thiserror::Error;

/// Errors that can occur when interacting with the sales store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested record does not exist for this tenant.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A conditional status update found the order in another status.
    #[error("Cannot {action} order {order_id}: current status is {current}")]
    StatusConflict {
        order_id: OrderId,
        current: OrderStatus,
        action: &'static str,
    },

    /// A stored row could not be turned back into a domain value.
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// A value does not fit its column.
    #[error("Value out of range: {0}")]
    OutOfRange(String),

    /// The backing store refused the operation.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
