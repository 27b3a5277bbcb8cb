//! POS sale lines.

use chrono::{DateTime, Utc};
use common::{PosSaleId, PosSaleItemId, Sku, StockEntryId};
use serde::{Deserialize, Serialize};

use super::PosSaleError;
use crate::Money;

/// A POS line as requested at the counter.
#[derive(Debug, Clone)]
pub struct NewPosSaleItem {
    pub sku: Sku,
    /// Display name printed on the ticket. Defaults to the SKU.
    pub product_name: Option<String>,
    pub quantity: u32,
    pub unit_price: Money,
}

/// A line of a POS sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosSaleItem {
    id: PosSaleItemId,
    pos_sale_id: PosSaleId,
    sku: Sku,
    product_name: String,
    quantity: u32,
    unit_price: Money,
    subtotal: Money,
    stock_entry_id: Option<StockEntryId>,
    created_at: DateTime<Utc>,
}

impl PosSaleItem {
    pub(super) fn new(pos_sale_id: PosSaleId, item: NewPosSaleItem) -> Result<Self, PosSaleError> {
        if item.quantity == 0 {
            return Err(PosSaleError::InvalidQuantity {
                sku: item.sku.to_string(),
            });
        }
        if item.unit_price.is_negative() {
            return Err(PosSaleError::InvalidUnitPrice {
                sku: item.sku.to_string(),
            });
        }

        let subtotal = item
            .unit_price
            .checked_multiply(item.quantity)
            .ok_or(PosSaleError::AmountOverflow)?;

        let product_name = match item.product_name {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => item.sku.to_string(),
        };

        Ok(Self {
            id: PosSaleItemId::new(),
            pos_sale_id,
            subtotal,
            sku: item.sku,
            product_name,
            quantity: item.quantity,
            unit_price: item.unit_price,
            stock_entry_id: None,
            created_at: Utc::now(),
        })
    }

    /// Rebuilds a line from storage without validation.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: PosSaleItemId,
        pos_sale_id: PosSaleId,
        sku: Sku,
        product_name: String,
        quantity: u32,
        unit_price: Money,
        subtotal: Money,
        stock_entry_id: Option<StockEntryId>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            pos_sale_id,
            sku,
            product_name,
            quantity,
            unit_price,
            subtotal,
            stock_entry_id,
            created_at,
        }
    }

    pub fn id(&self) -> PosSaleItemId {
        self.id
    }

    pub fn pos_sale_id(&self) -> PosSaleId {
        self.pos_sale_id
    }

    pub fn sku(&self) -> &Sku {
        &self.sku
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    /// Inventory ledger entry created for this line, if its stock was sold.
    pub fn stock_entry_id(&self) -> Option<StockEntryId> {
        self.stock_entry_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub(super) fn set_stock_entry(&mut self, entry: StockEntryId) {
        self.stock_entry_id = Some(entry);
    }
}
