//! Point-of-sale sale aggregate and related types.

mod aggregate;
mod item;

pub use aggregate::{NewPosSale, PosSale};
pub use item::{NewPosSaleItem, PosSaleItem};

use thiserror::Error;

use crate::Money;

/// Currency used when a sale does not name one.
pub const DEFAULT_CURRENCY: &str = "ARS";

/// Errors that can occur while building or settling a POS sale.
#[derive(Debug, Error)]
pub enum PosSaleError {
    #[error("Payment method is required")]
    PaymentMethodRequired,

    #[error("Amount paid must be greater than 0")]
    InvalidAmountPaid,

    #[error("POS sale must have at least one item")]
    NoItems,

    #[error("Discount cannot be negative")]
    InvalidDiscount,

    #[error("Invalid quantity for {sku} (must be greater than 0)")]
    InvalidQuantity { sku: String },

    #[error("Invalid unit price for {sku} (cannot be negative)")]
    InvalidUnitPrice { sku: String },

    /// A subtotal or the sale total does not fit in the amount range.
    #[error("Sale amounts are out of range")]
    AmountOverflow,

    /// The customer did not hand over enough money.
    #[error("Insufficient payment: paid {amount_paid}, due {final_amount}")]
    InsufficientPayment {
        amount_paid: Money,
        final_amount: Money,
    },

    #[error("Line {line} does not exist")]
    LineOutOfRange { line: usize },

    #[error("Line {line} already has a stock entry")]
    LineAlreadySettled { line: usize },

    /// A line reached persistence without its inventory entry.
    #[error("Line {line} has no stock entry")]
    UnsettledLine { line: usize },
}
