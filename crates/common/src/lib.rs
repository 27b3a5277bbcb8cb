//! Shared identifiers and small value types used across the sales workspace.

mod sku;
mod types;

pub use sku::Sku;
pub use types::{
    CustomerId, IdError, OrderId, OrderItemId, PaymentMethodId, PosSaleId, PosSaleItemId,
    StockEntryId, TenantId,
};
