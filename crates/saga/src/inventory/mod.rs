//! Inventory service contract and its implementations.

mod http;
mod memory;

pub use http::HttpStockClient;
pub use memory::{CompensationCall, InMemoryStockClient, MovementCall, MovementKind, SaleCall};

use async_trait::async_trait;
use common::{Sku, StockEntryId};
use serde::{Deserialize, Serialize};

use crate::compensation::CompensationReason;
use crate::context::TenantContext;
use crate::error::{RejectionKind, StockError};

/// Stock levels of one variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Availability {
    pub variant_sku: String,
    #[serde(default)]
    pub product_sku: String,
    pub available_quantity: f64,
    #[serde(default)]
    pub reserved_quantity: f64,
    #[serde(default)]
    pub total_quantity: f64,
    #[serde(default)]
    pub is_out_of_stock: bool,
    #[serde(default)]
    pub is_low_stock: bool,
}

impl Availability {
    /// True when `quantity` units can be sold right now.
    pub fn can_fulfill(&self, quantity: u32) -> bool {
        self.available_quantity >= f64::from(quantity) && !self.is_out_of_stock
    }
}

/// Outcome of an atomic sale.
///
/// `success == false` is a business rejection, not an error.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomicSaleResult {
    pub success: bool,
    pub message: String,
    /// Compensation key; always present when `success` is true.
    pub stock_entry_id: Option<StockEntryId>,
    pub quantity_sold: f64,
    pub remaining_stock: f64,
    pub rejection: Option<RejectionKind>,
}

impl AtomicSaleResult {
    pub fn sold(entry: StockEntryId, quantity: u32, remaining_stock: f64) -> Self {
        Self {
            success: true,
            message: "sale processed".to_string(),
            stock_entry_id: Some(entry),
            quantity_sold: f64::from(quantity),
            remaining_stock,
            rejection: None,
        }
    }

    pub fn rejected(kind: RejectionKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            stock_entry_id: None,
            quantity_sold: 0.0,
            remaining_stock: 0.0,
            rejection: Some(kind),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveResult {
    pub sku: String,
    pub reserved_qty: i64,
    pub remaining_qty: i64,
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseResult {
    pub sku: String,
    pub released_qty: i64,
    pub available_qty: i64,
    pub reserved_qty: i64,
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumeResult {
    pub sku: String,
    pub consumed_qty: i64,
    pub reserved_qty: i64,
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevertConsumeResult {
    pub sku: String,
    pub reverted_qty: i64,
    pub available_qty: i64,
    pub reference: String,
}

/// Operations offered by the inventory service.
///
/// Every call is tenant-scoped and performs exactly one remote request.
/// Nothing is retried.
#[async_trait]
pub trait StockClient: Send + Sync {
    async fn availability(&self, ctx: &TenantContext, sku: &Sku)
    -> Result<Availability, StockError>;

    /// Validates and decrements stock in one indivisible remote operation.
    async fn atomic_sale(
        &self,
        ctx: &TenantContext,
        sku: &Sku,
        quantity: u32,
        reference: &str,
    ) -> Result<AtomicSaleResult, StockError>;

    /// Asks the inventory service to reverse a stock entry.
    async fn compensate(
        &self,
        ctx: &TenantContext,
        entry: StockEntryId,
        reason: CompensationReason,
    ) -> Result<(), StockError>;

    async fn reserve(
        &self,
        ctx: &TenantContext,
        sku: &Sku,
        quantity: u32,
        reference: &str,
    ) -> Result<ReserveResult, StockError>;

    async fn release(
        &self,
        ctx: &TenantContext,
        sku: &Sku,
        quantity: u32,
        reference: &str,
    ) -> Result<ReleaseResult, StockError>;

    async fn consume(
        &self,
        ctx: &TenantContext,
        sku: &Sku,
        quantity: u32,
        reference: &str,
    ) -> Result<ConsumeResult, StockError>;

    async fn revert_consume(
        &self,
        ctx: &TenantContext,
        sku: &Sku,
        quantity: u32,
        reference: &str,
    ) -> Result<RevertConsumeResult, StockError>;
}
