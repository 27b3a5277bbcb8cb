//! Domain error types.

use thiserror::Error;

use crate::order::OrderError;
use crate::pos_sale::PosSaleError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the order aggregate.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// An error occurred in the POS sale aggregate.
    #[error("POS sale error: {0}")]
    PosSale(#[from] PosSaleError),
}
