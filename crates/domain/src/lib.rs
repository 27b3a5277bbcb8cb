//! Domain layer for the sales service.
//!
//! This crate provides the aggregates whose creation drives the sales sagas:
//! - `Order` with its CREATED → CONFIRMED → CANCELED status machine
//! - `PosSale` with its totals, discount and change rules
//! - Write-once catalog `Snapshot`s and `Money` in minor units
//! - The read-only `PaymentMethodCatalog`

pub mod error;
pub mod money;
pub mod order;
pub mod payment_method;
pub mod pos_sale;
pub mod snapshot;

pub use error::DomainError;
pub use money::Money;
pub use order::{NewOrderItem, Order, OrderError, OrderItem, OrderStatus, UnknownStatus};
pub use payment_method::{PaymentMethod, PaymentMethodCatalog, UNKNOWN_PAYMENT_METHOD};
pub use pos_sale::{
    DEFAULT_CURRENCY, NewPosSale, NewPosSaleItem, PosSale, PosSaleError, PosSaleItem,
};
pub use snapshot::Snapshot;
