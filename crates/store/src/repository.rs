use async_trait::async_trait;
use common::{OrderId, PosSaleId, TenantId};
use domain::{Order, PaymentMethod, PosSale};

use crate::{Page, PageRequest, Result};

/// Persistence for order aggregates.
///
/// Every read and write is scoped by tenant. All implementations must be
/// thread-safe (Send + Sync).
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Stores a new order together with all of its lines, atomically.
    async fn save(&self, order: &Order) -> Result<()>;

    /// Loads an order with its lines.
    async fn find_by_id(&self, tenant_id: TenantId, order_id: OrderId) -> Result<Option<Order>>;

    /// Lists orders newest first.
    async fn list(&self, tenant_id: TenantId, request: PageRequest) -> Result<Page<Order>>;

    /// Moves an order from CREATED to CONFIRMED.
    ///
    /// Fails with `StatusConflict` if the order is in any other status and
    /// with `NotFound` if it does not exist.
    async fn confirm(&self, tenant_id: TenantId, order_id: OrderId) -> Result<()>;

    /// Moves an order from CONFIRMED to CANCELED.
    async fn cancel(&self, tenant_id: TenantId, order_id: OrderId) -> Result<()>;
}

/// Persistence for POS sale aggregates.
#[async_trait]
pub trait PosSaleRepository: Send + Sync {
    /// Stores a sale together with all of its lines, atomically.
    async fn save(&self, sale: &PosSale) -> Result<()>;

    async fn find_by_id(&self, tenant_id: TenantId, sale_id: PosSaleId)
    -> Result<Option<PosSale>>;

    /// Lists a tenant's sales newest first.
    async fn list_by_tenant(&self, tenant_id: TenantId) -> Result<Vec<PosSale>>;
}

/// Source of the payment methods loaded into the catalog at startup.
#[async_trait]
pub trait PaymentMethodSource: Send + Sync {
    /// Returns every active payment method. Payment methods are global.
    async fn load_active(&self) -> Result<Vec<PaymentMethod>>;
}
