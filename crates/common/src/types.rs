use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors produced when parsing identifiers from external input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    /// The value was empty or whitespace.
    #[error("{kind} is required")]
    Missing { kind: &'static str },

    /// The value is not a valid UUID.
    #[error("invalid {kind}: {value}")]
    Malformed { kind: &'static str, value: String },

    /// The nil UUID is never a valid identifier.
    #[error("{kind} must not be the nil UUID")]
    Nil { kind: &'static str },
}

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }

            /// Parses an identifier from untrusted text, rejecting blanks and the nil UUID.
            pub fn parse(value: &str) -> Result<Self, IdError> {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(IdError::Missing { kind: $kind });
                }
                let uuid = Uuid::parse_str(trimmed).map_err(|_| IdError::Malformed {
                    kind: $kind,
                    value: trimmed.to_string(),
                })?;
                if uuid.is_nil() {
                    return Err(IdError::Nil { kind: $kind });
                }
                Ok(Self(uuid))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

uuid_id!(
    /// Tenant owning every aggregate and scoping every remote call.
    TenantId,
    "tenant_id"
);

uuid_id!(
    /// Identity of an order aggregate.
    OrderId,
    "order_id"
);

uuid_id!(
    /// Identity of a line inside an order.
    OrderItemId,
    "item_id"
);

uuid_id!(
    /// Identity of a point-of-sale sale aggregate.
    PosSaleId,
    "pos_sale_id"
);

uuid_id!(
    /// Identity of a line inside a POS sale.
    PosSaleItemId,
    "pos_sale_item_id"
);

uuid_id!(
    /// Ledger row created by the inventory service for one atomic sale.
    ///
    /// Opaque to this service: it is only ever echoed back to request a
    /// compensating reversal.
    StockEntryId,
    "stock_entry_id"
);

uuid_id!(
    /// Reference to a payment method.
    PaymentMethodId,
    "payment_method_id"
);

uuid_id!(
    /// Optional customer reference on a POS sale.
    CustomerId,
    "customer_id"
);
