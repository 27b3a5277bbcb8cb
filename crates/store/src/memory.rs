//! In-memory repositories for tests and for running without a database.
//!
//! They provide the same semantics as the PostgreSQL implementations, plus
//! switches that make the next writes fail.

use std::sync::Arc;

use async_trait::async_trait;
use common::{OrderId, PosSaleId, TenantId};
use domain::{Order, OrderError, PaymentMethod, PosSale};
use tokio::sync::RwLock;

use crate::{
    OrderRepository, Page, PageRequest, PaymentMethodSource, PosSaleRepository, Result,
    StoreError,
};

#[derive(Debug, Default)]
struct OrderState {
    // Insertion order; listings walk it backwards.
    orders: Vec<Order>,
    fail_on_save: bool,
    fail_on_status_update: bool,
}

/// In-memory order repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderRepository {
    state: Arc<RwLock<OrderState>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `save` fail until reset.
    pub async fn set_fail_on_save(&self, fail: bool) {
        self.state.write().await.fail_on_save = fail;
    }

    /// Makes every subsequent `confirm`/`cancel` fail until reset.
    pub async fn set_fail_on_status_update(&self, fail: bool) {
        self.state.write().await.fail_on_status_update = fail;
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    async fn transition(
        &self,
        tenant_id: TenantId,
        order_id: OrderId,
        action: &'static str,
        apply: fn(&mut Order) -> std::result::Result<(), OrderError>,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        if state.fail_on_status_update {
            return Err(StoreError::Unavailable(format!(
                "status update rejected for order {order_id}"
            )));
        }

        let order = state
            .orders
            .iter_mut()
            .find(|o| o.id() == order_id && o.tenant_id() == tenant_id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "order",
                id: order_id.to_string(),
            })?;

        let current = order.status();
        apply(order).map_err(|_| StoreError::StatusConflict {
            order_id,
            current,
            action,
        })
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn save(&self, order: &Order) -> Result<()> {
        let mut state = self.state.write().await;
        if state.fail_on_save {
            return Err(StoreError::Unavailable(format!(
                "save rejected for order {}",
                order.id()
            )));
        }
        state.orders.retain(|o| o.id() != order.id());
        state.orders.push(order.clone());
        Ok(())
    }

    async fn find_by_id(&self, tenant_id: TenantId, order_id: OrderId) -> Result<Option<Order>> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .iter()
            .find(|o| o.id() == order_id && o.tenant_id() == tenant_id)
            .cloned())
    }

    async fn list(&self, tenant_id: TenantId, request: PageRequest) -> Result<Page<Order>> {
        let state = self.state.read().await;
        let tenant_orders: Vec<&Order> = state
            .orders
            .iter()
            .rev()
            .filter(|o| o.tenant_id() == tenant_id)
            .collect();

        let total = tenant_orders.len() as u64;
        let items = tenant_orders
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.limit() as usize)
            .cloned()
            .collect();

        Ok(Page::new(items, total, request))
    }

    async fn confirm(&self, tenant_id: TenantId, order_id: OrderId) -> Result<()> {
        self.transition(tenant_id, order_id, "confirm", Order::confirm)
            .await
    }

    async fn cancel(&self, tenant_id: TenantId, order_id: OrderId) -> Result<()> {
        self.transition(tenant_id, order_id, "cancel", Order::cancel)
            .await
    }
}

#[derive(Debug, Default)]
struct PosSaleState {
    sales: Vec<PosSale>,
    fail_on_save: bool,
}

/// In-memory POS sale repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPosSaleRepository {
    state: Arc<RwLock<PosSaleState>>,
}

impl InMemoryPosSaleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `save` fail until reset.
    pub async fn set_fail_on_save(&self, fail: bool) {
        self.state.write().await.fail_on_save = fail;
    }

    /// Returns the number of stored sales.
    pub async fn sale_count(&self) -> usize {
        self.state.read().await.sales.len()
    }
}

#[async_trait]
impl PosSaleRepository for InMemoryPosSaleRepository {
    async fn save(&self, sale: &PosSale) -> Result<()> {
        let mut state = self.state.write().await;
        if state.fail_on_save {
            return Err(StoreError::Unavailable(format!(
                "save rejected for POS sale {}",
                sale.id()
            )));
        }
        state.sales.retain(|s| s.id() != sale.id());
        state.sales.push(sale.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        tenant_id: TenantId,
        sale_id: PosSaleId,
    ) -> Result<Option<PosSale>> {
        let state = self.state.read().await;
        Ok(state
            .sales
            .iter()
            .find(|s| s.id() == sale_id && s.tenant_id() == tenant_id)
            .cloned())
    }

    async fn list_by_tenant(&self, tenant_id: TenantId) -> Result<Vec<PosSale>> {
        let state = self.state.read().await;
        Ok(state
            .sales
            .iter()
            .rev()
            .filter(|s| s.tenant_id() == tenant_id)
            .cloned()
            .collect())
    }
}

/// Fixed list of payment methods.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentMethodSource {
    methods: Vec<PaymentMethod>,
}

impl InMemoryPaymentMethodSource {
    pub fn new(methods: Vec<PaymentMethod>) -> Self {
        Self { methods }
    }
}

#[async_trait]
impl PaymentMethodSource for InMemoryPaymentMethodSource {
    async fn load_active(&self) -> Result<Vec<PaymentMethod>> {
        Ok(self.methods.clone())
    }
}
