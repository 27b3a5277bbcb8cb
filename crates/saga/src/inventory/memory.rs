//! In-memory inventory service for testing.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use common::{Sku, StockEntryId};
use tokio::sync::RwLock;

use super::{
    Availability, AtomicSaleResult, ConsumeResult, ReleaseResult, ReserveResult,
    RevertConsumeResult, StockClient,
};
use crate::compensation::CompensationReason;
use crate::context::TenantContext;
use crate::error::{RejectionKind, StockError};

/// An atomic sale request seen by the fake.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleCall {
    pub sku: String,
    pub quantity: u32,
    pub reference: String,
    pub stock_entry_id: Option<StockEntryId>,
}

/// A compensation request seen by the fake, successful or not.
#[derive(Debug, Clone, PartialEq)]
pub struct CompensationCall {
    pub stock_entry_id: StockEntryId,
    pub reason: CompensationReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MovementKind {
    Reserve,
    Release,
    Consume,
    RevertConsume,
}

/// A legacy stock movement seen by the fake.
#[derive(Debug, Clone, PartialEq)]
pub struct MovementCall {
    pub kind: MovementKind,
    pub sku: String,
    pub quantity: u32,
    pub reference: String,
}

#[derive(Debug, Default, Clone, Copy)]
struct StockLevel {
    available: u32,
    reserved: u32,
    consumed: u32,
}

#[derive(Debug)]
struct SaleEntry {
    sku: String,
    quantity: u32,
    compensated: bool,
}

#[derive(Debug, Default)]
struct InMemoryStockState {
    levels: HashMap<String, StockLevel>,
    entries: HashMap<StockEntryId, SaleEntry>,
    sale_calls: Vec<SaleCall>,
    compensation_calls: Vec<CompensationCall>,
    movements: Vec<MovementCall>,
    unreachable_skus: HashSet<String>,
    failing_compensations: HashSet<StockEntryId>,
    fail_all_compensations: bool,
    failing_movements: HashSet<(String, MovementKind)>,
}

impl InMemoryStockState {
    fn level(&self, sku: &Sku) -> Result<StockLevel, StockError> {
        self.levels
            .get(sku.as_str())
            .copied()
            .ok_or_else(|| StockError::NotFound(format!("sku {sku}")))
    }

    fn movement(
        &mut self,
        kind: MovementKind,
        sku: &Sku,
        quantity: u32,
        reference: &str,
    ) -> Result<StockLevel, StockError> {
        self.movements.push(MovementCall {
            kind,
            sku: sku.to_string(),
            quantity,
            reference: reference.to_string(),
        });
        if self.failing_movements.contains(&(sku.to_string(), kind)) {
            return Err(StockError::Transport(format!(
                "injected failure for {kind:?} of {sku}"
            )));
        }
        self.level(sku)
    }
}

/// In-memory inventory service.
///
/// Tracks per-SKU stock levels and every call it receives, and can be told
/// to fail specific calls.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStockClient {
    state: Arc<RwLock<InMemoryStockState>>,
}

impl InMemoryStockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the available quantity of a SKU, creating it if needed.
    pub async fn set_stock(&self, sku: &str, available: u32) {
        let mut state = self.state.write().await;
        state.levels.entry(sku.to_string()).or_default().available = available;
    }

    /// Sets the reserved quantity of a SKU, creating it if needed.
    pub async fn set_reserved(&self, sku: &str, reserved: u32) {
        let mut state = self.state.write().await;
        state.levels.entry(sku.to_string()).or_default().reserved = reserved;
    }

    /// Makes atomic sales of `sku` fail with a transport error.
    pub async fn make_unreachable(&self, sku: &str) {
        self.state
            .write()
            .await
            .unreachable_skus
            .insert(sku.to_string());
    }

    /// Makes compensation of `entry` fail with a transport error.
    pub async fn fail_compensation_for(&self, entry: StockEntryId) {
        self.state.write().await.failing_compensations.insert(entry);
    }

    /// Makes every compensation fail.
    pub async fn set_fail_all_compensations(&self, fail: bool) {
        self.state.write().await.fail_all_compensations = fail;
    }

    /// Makes the given legacy movement of `sku` fail with a transport error.
    pub async fn fail_movement(&self, sku: &str, kind: MovementKind) {
        self.state
            .write()
            .await
            .failing_movements
            .insert((sku.to_string(), kind));
    }

    pub async fn available(&self, sku: &str) -> Option<u32> {
        self.state.read().await.levels.get(sku).map(|l| l.available)
    }

    pub async fn reserved(&self, sku: &str) -> Option<u32> {
        self.state.read().await.levels.get(sku).map(|l| l.reserved)
    }

    pub async fn sale_calls(&self) -> Vec<SaleCall> {
        self.state.read().await.sale_calls.clone()
    }

    pub async fn compensation_calls(&self) -> Vec<CompensationCall> {
        self.state.read().await.compensation_calls.clone()
    }

    pub async fn movements(&self) -> Vec<MovementCall> {
        self.state.read().await.movements.clone()
    }

    /// Returns true if the entry exists and was compensated.
    pub async fn is_compensated(&self, entry: StockEntryId) -> bool {
        self.state
            .read()
            .await
            .entries
            .get(&entry)
            .is_some_and(|e| e.compensated)
    }
}

#[async_trait]
impl StockClient for InMemoryStockClient {
    async fn availability(
        &self,
        _ctx: &TenantContext,
        sku: &Sku,
    ) -> Result<Availability, StockError> {
        let level = self.state.read().await.level(sku)?;
        let total = level.available + level.reserved;
        Ok(Availability {
            variant_sku: sku.to_string(),
            product_sku: sku.to_string(),
            available_quantity: f64::from(level.available),
            reserved_quantity: f64::from(level.reserved),
            total_quantity: f64::from(total),
            is_out_of_stock: level.available == 0,
            is_low_stock: level.available < 5,
        })
    }

    async fn atomic_sale(
        &self,
        _ctx: &TenantContext,
        sku: &Sku,
        quantity: u32,
        reference: &str,
    ) -> Result<AtomicSaleResult, StockError> {
        let mut state = self.state.write().await;
        let mut call = SaleCall {
            sku: sku.to_string(),
            quantity,
            reference: reference.to_string(),
            stock_entry_id: None,
        };

        if state.unreachable_skus.contains(sku.as_str()) {
            state.sale_calls.push(call);
            return Err(StockError::Transport(format!(
                "inventory unreachable for {sku}"
            )));
        }

        let level = match state.level(sku) {
            Ok(level) => level,
            Err(e) => {
                state.sale_calls.push(call);
                return Err(e);
            }
        };

        if level.available < quantity {
            state.sale_calls.push(call);
            return Ok(AtomicSaleResult::rejected(
                RejectionKind::InsufficientStock,
                format!(
                    "insufficient stock for {sku}: available {}, requested {quantity}",
                    level.available
                ),
            ));
        }

        let entry = StockEntryId::new();
        let remaining = level.available - quantity;
        if let Some(level) = state.levels.get_mut(sku.as_str()) {
            level.available = remaining;
        }
        state.entries.insert(
            entry,
            SaleEntry {
                sku: sku.to_string(),
                quantity,
                compensated: false,
            },
        );
        call.stock_entry_id = Some(entry);
        state.sale_calls.push(call);

        Ok(AtomicSaleResult::sold(entry, quantity, f64::from(remaining)))
    }

    async fn compensate(
        &self,
        _ctx: &TenantContext,
        entry: StockEntryId,
        reason: CompensationReason,
    ) -> Result<(), StockError> {
        let mut state = self.state.write().await;
        state.compensation_calls.push(CompensationCall {
            stock_entry_id: entry,
            reason,
        });

        if state.fail_all_compensations || state.failing_compensations.contains(&entry) {
            return Err(StockError::Transport(format!(
                "injected compensation failure for {entry}"
            )));
        }

        let (sku, quantity) = match state.entries.get_mut(&entry) {
            Some(sale) if !sale.compensated => {
                sale.compensated = true;
                (sale.sku.clone(), sale.quantity)
            }
            Some(_) => return Ok(()),
            None => return Err(StockError::NotFound(format!("stock entry {entry}"))),
        };
        if let Some(level) = state.levels.get_mut(&sku) {
            level.available += quantity;
        }
        Ok(())
    }

    async fn reserve(
        &self,
        _ctx: &TenantContext,
        sku: &Sku,
        quantity: u32,
        reference: &str,
    ) -> Result<ReserveResult, StockError> {
        let mut state = self.state.write().await;
        let level = state.movement(MovementKind::Reserve, sku, quantity, reference)?;
        if level.available < quantity {
            return Err(StockError::Rejected {
                kind: RejectionKind::InsufficientStock,
                message: format!("insufficient stock for {sku}"),
            });
        }
        let level = StockLevel {
            available: level.available - quantity,
            reserved: level.reserved + quantity,
            ..level
        };
        state.levels.insert(sku.to_string(), level);
        Ok(ReserveResult {
            sku: sku.to_string(),
            reserved_qty: i64::from(quantity),
            remaining_qty: i64::from(level.available),
            reference: reference.to_string(),
        })
    }

    async fn release(
        &self,
        _ctx: &TenantContext,
        sku: &Sku,
        quantity: u32,
        reference: &str,
    ) -> Result<ReleaseResult, StockError> {
        let mut state = self.state.write().await;
        let level = state.movement(MovementKind::Release, sku, quantity, reference)?;
        if level.reserved < quantity {
            return Err(StockError::Rejected {
                kind: RejectionKind::InsufficientReservedStock,
                message: format!("insufficient reserved stock for {sku}"),
            });
        }
        let level = StockLevel {
            available: level.available + quantity,
            reserved: level.reserved - quantity,
            ..level
        };
        state.levels.insert(sku.to_string(), level);
        Ok(ReleaseResult {
            sku: sku.to_string(),
            released_qty: i64::from(quantity),
            available_qty: i64::from(level.available),
            reserved_qty: i64::from(level.reserved),
            reference: reference.to_string(),
        })
    }

    async fn consume(
        &self,
        _ctx: &TenantContext,
        sku: &Sku,
        quantity: u32,
        reference: &str,
    ) -> Result<ConsumeResult, StockError> {
        let mut state = self.state.write().await;
        let level = state.movement(MovementKind::Consume, sku, quantity, reference)?;
        if level.reserved < quantity {
            return Err(StockError::Rejected {
                kind: RejectionKind::InsufficientReservedStock,
                message: format!("insufficient reserved stock for {sku}"),
            });
        }
        let level = StockLevel {
            reserved: level.reserved - quantity,
            consumed: level.consumed + quantity,
            ..level
        };
        state.levels.insert(sku.to_string(), level);
        Ok(ConsumeResult {
            sku: sku.to_string(),
            consumed_qty: i64::from(quantity),
            reserved_qty: i64::from(level.reserved),
            reference: reference.to_string(),
        })
    }

    async fn revert_consume(
        &self,
        _ctx: &TenantContext,
        sku: &Sku,
        quantity: u32,
        reference: &str,
    ) -> Result<RevertConsumeResult, StockError> {
        let mut state = self.state.write().await;
        let level = state.movement(MovementKind::RevertConsume, sku, quantity, reference)?;
        let level = StockLevel {
            available: level.available + quantity,
            consumed: level.consumed.saturating_sub(quantity),
            ..level
        };
        state.levels.insert(sku.to_string(), level);
        Ok(RevertConsumeResult {
            sku: sku.to_string(),
            reverted_qty: i64::from(quantity),
            available_qty: i64::from(level.available),
            reference: reference.to_string(),
        })
    }
}
