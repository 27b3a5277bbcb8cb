//! Correlation references sent to the inventory service.

use common::{OrderId, PosSaleId};
use uuid::Uuid;

/// Transaction reference generated once per saga instance.
///
/// Every stock line gets its own reference derived from it, so the
/// inventory service can deduplicate and trace at line granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionRef {
    prefix: &'static str,
    id: Uuid,
}

impl TransactionRef {
    pub const ORDER_PREFIX: &'static str = "ORD";
    pub const POS_PREFIX: &'static str = "POS";
    pub const RESERVATION_PREFIX: &'static str = "RSV";

    pub fn new(prefix: &'static str, id: Uuid) -> Self {
        Self { prefix, id }
    }

    pub fn for_order(order_id: OrderId) -> Self {
        Self::new(Self::ORDER_PREFIX, order_id.as_uuid())
    }

    pub fn for_pos_sale(sale_id: PosSaleId) -> Self {
        Self::new(Self::POS_PREFIX, sale_id.as_uuid())
    }

    /// A reference for a batch of legacy reservations.
    pub fn for_reservation() -> Self {
        Self::new(Self::RESERVATION_PREFIX, Uuid::new_v4())
    }

    /// Reference of the whole transaction, `PREFIX-<uuid>`.
    pub fn base(&self) -> String {
        format!("{}-{}", self.prefix, self.id)
    }

    /// Reference of the 1-based line `line`, `PREFIX-<uuid>-L<line>`.
    pub fn line(&self, line: usize) -> String {
        format!("{}-{}-L{}", self.prefix, self.id, line)
    }
}

impl std::fmt::Display for TransactionRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.prefix, self.id)
    }
}
