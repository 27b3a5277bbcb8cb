use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{
    CustomerId, OrderId, OrderItemId, PaymentMethodId, PosSaleId, PosSaleItemId, Sku,
    StockEntryId, TenantId,
};
use domain::{
    Money, Order, OrderItem, OrderStatus, PaymentMethod, PosSale, PosSaleItem, Snapshot,
};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    OrderRepository, Page, PageRequest, PaymentMethodSource, PosSaleRepository, Result,
    StoreError,
};

/// Runs the database migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    Ok(())
}

fn quantity_from_row(row: &PgRow) -> Result<u32> {
    let quantity: i32 = row.try_get("quantity")?;
    u32::try_from(quantity).map_err(|_| StoreError::Corrupt(format!("quantity {quantity}")))
}

fn quantity_to_column(quantity: u32) -> Result<i32> {
    i32::try_from(quantity).map_err(|_| StoreError::OutOfRange(format!("quantity {quantity}")))
}

fn sku_from_row(row: &PgRow) -> Result<Sku> {
    let sku: String = row.try_get("sku")?;
    Sku::parse(&sku).map_err(|e| StoreError::Corrupt(e.to_string()))
}

fn status_from_str(status: &str) -> Result<OrderStatus> {
    status
        .parse()
        .map_err(|e: domain::UnknownStatus| StoreError::Corrupt(e.to_string()))
}

/// PostgreSQL-backed order repository.
#[derive(Clone)]
pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn row_to_item(row: &PgRow) -> Result<OrderItem> {
        Ok(OrderItem::restore(
            OrderItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
            OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
            sku_from_row(row)?,
            quantity_from_row(row)?,
            Snapshot::from_bytes(row.try_get::<Vec<u8>, _>("product_snapshot")?),
            Snapshot::from_bytes(row.try_get::<Vec<u8>, _>("variant_snapshot")?),
            row.try_get("created_at")?,
        ))
    }

    fn row_to_order(row: &PgRow, items: Vec<OrderItem>) -> Result<Order> {
        let status: String = row.try_get("status")?;
        Ok(Order::restore(
            OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            TenantId::from_uuid(row.try_get::<Uuid, _>("tenant_id")?),
            status_from_str(&status)?,
            items,
            row.try_get("created_at")?,
            row.try_get("updated_at")?,
        ))
    }

    async fn load_items(&self, order_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<OrderItem>>> {
        let rows = sqlx::query(
            r#"
            SELECT id, order_id, sku, quantity, product_snapshot, variant_snapshot, created_at
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY order_id, line_number ASC
            "#,
        )
        .bind(order_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for row in &rows {
            let item = Self::row_to_item(row)?;
            grouped
                .entry(item.order_id().as_uuid())
                .or_default()
                .push(item);
        }
        Ok(grouped)
    }

    async fn transition(
        &self,
        tenant_id: TenantId,
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
        action: &'static str,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $1, updated_at = NOW()
            WHERE tenant_id = $2 AND id = $3 AND status = $4
            "#,
        )
        .bind(to.as_str())
        .bind(tenant_id.as_uuid())
        .bind(order_id.as_uuid())
        .bind(from.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        let current: Option<String> =
            sqlx::query_scalar("SELECT status FROM orders WHERE tenant_id = $1 AND id = $2")
                .bind(tenant_id.as_uuid())
                .bind(order_id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        match current {
            None => Err(StoreError::NotFound {
                entity: "order",
                id: order_id.to_string(),
            }),
            Some(status) => Err(StoreError::StatusConflict {
                order_id,
                current: status_from_str(&status)?,
                action,
            }),
        }
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    #[tracing::instrument(skip(self, order), fields(order_id = %order.id()))]
    async fn save(&self, order: &Order) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, tenant_id, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(order.tenant_id().as_uuid())
        .bind(order.status().as_str())
        .bind(order.created_at())
        .bind(order.updated_at())
        .execute(&mut *tx)
        .await?;

        for (line, item) in order.items().iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, line_number, sku, quantity, product_snapshot, variant_snapshot, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(item.id().as_uuid())
            .bind(order.id().as_uuid())
            .bind(line as i32 + 1)
            .bind(item.sku().as_str())
            .bind(quantity_to_column(item.quantity())?)
            .bind(item.product_snapshot().as_bytes())
            .bind(item.variant_snapshot().as_bytes())
            .bind(item.created_at())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_by_id(&self, tenant_id: TenantId, order_id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(
            r#"
            SELECT id, tenant_id, status, created_at, updated_at
            FROM orders
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(order_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut items = self.load_items(&[order_id.as_uuid()]).await?;
        let items = items.remove(&order_id.as_uuid()).unwrap_or_default();
        Self::row_to_order(&row, items).map(Some)
    }

    async fn list(&self, tenant_id: TenantId, request: PageRequest) -> Result<Page<Order>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE tenant_id = $1")
            .bind(tenant_id.as_uuid())
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query(
            r#"
            SELECT id, tenant_id, status, created_at, updated_at
            FROM orders
            WHERE tenant_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(request.limit() as i64)
        .bind(request.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = rows
            .iter()
            .map(|row| row.try_get::<Uuid, _>("id"))
            .collect::<std::result::Result<_, _>>()?;
        let mut items = self.load_items(&ids).await?;

        let orders = rows
            .iter()
            .zip(&ids)
            .map(|(row, id)| Self::row_to_order(row, items.remove(id).unwrap_or_default()))
            .collect::<Result<Vec<_>>>()?;

        Ok(Page::new(orders, total.max(0) as u64, request))
    }

    #[tracing::instrument(skip(self))]
    async fn confirm(&self, tenant_id: TenantId, order_id: OrderId) -> Result<()> {
        self.transition(
            tenant_id,
            order_id,
            OrderStatus::Created,
            OrderStatus::Confirmed,
            "confirm",
        )
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn cancel(&self, tenant_id: TenantId, order_id: OrderId) -> Result<()> {
        self.transition(
            tenant_id,
            order_id,
            OrderStatus::Confirmed,
            OrderStatus::Canceled,
            "cancel",
        )
        .await
    }
}

/// PostgreSQL-backed POS sale repository.
#[derive(Clone)]
pub struct PostgresPosSaleRepository {
    pool: PgPool,
}

impl PostgresPosSaleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_item(row: &PgRow) -> Result<PosSaleItem> {
        Ok(PosSaleItem::restore(
            PosSaleItemId::from_uuid(row.try_get::<Uuid, _>("id")?),
            PosSaleId::from_uuid(row.try_get::<Uuid, _>("pos_sale_id")?),
            sku_from_row(row)?,
            row.try_get("product_name")?,
            quantity_from_row(row)?,
            Money::from_cents(row.try_get("unit_price_cents")?),
            Money::from_cents(row.try_get("subtotal_cents")?),
            row.try_get::<Option<Uuid>, _>("stock_entry_id")?
                .map(StockEntryId::from_uuid),
            row.try_get("created_at")?,
        ))
    }

    fn row_to_sale(row: &PgRow, items: Vec<PosSaleItem>) -> Result<PosSale> {
        let created_at: DateTime<Utc> = row.try_get("created_at")?;
        Ok(PosSale::restore(
            PosSaleId::from_uuid(row.try_get::<Uuid, _>("id")?),
            TenantId::from_uuid(row.try_get::<Uuid, _>("tenant_id")?),
            row.try_get::<Option<Uuid>, _>("customer_id")?
                .map(CustomerId::from_uuid),
            PaymentMethodId::from_uuid(row.try_get::<Uuid, _>("payment_method_id")?),
            Money::from_cents(row.try_get("total_amount_cents")?),
            Money::from_cents(row.try_get("discount_amount_cents")?),
            Money::from_cents(row.try_get("final_amount_cents")?),
            Money::from_cents(row.try_get("amount_paid_cents")?),
            Money::from_cents(row.try_get("change_cents")?),
            row.try_get("currency")?,
            items,
            created_at,
        ))
    }

    async fn load_items(&self, sale_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<PosSaleItem>>> {
        let rows = sqlx::query(
            r#"
            SELECT id, pos_sale_id, sku, product_name, quantity, unit_price_cents, subtotal_cents, stock_entry_id, created_at
            FROM pos_sale_items
            WHERE pos_sale_id = ANY($1)
            ORDER BY pos_sale_id, line_number ASC
            "#,
        )
        .bind(sale_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<Uuid, Vec<PosSaleItem>> = HashMap::new();
        for row in &rows {
            let item = Self::row_to_item(row)?;
            grouped
                .entry(item.pos_sale_id().as_uuid())
                .or_default()
                .push(item);
        }
        Ok(grouped)
    }
}

const POS_SALE_COLUMNS: &str = "id, tenant_id, customer_id, payment_method_id, total_amount_cents, discount_amount_cents, final_amount_cents, amount_paid_cents, change_cents, currency, created_at";

#[async_trait]
impl PosSaleRepository for PostgresPosSaleRepository {
    #[tracing::instrument(skip(self, sale), fields(pos_sale_id = %sale.id()))]
    async fn save(&self, sale: &PosSale) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO pos_sales (id, tenant_id, customer_id, payment_method_id, total_amount_cents, discount_amount_cents, final_amount_cents, amount_paid_cents, change_cents, currency, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(sale.id().as_uuid())
        .bind(sale.tenant_id().as_uuid())
        .bind(sale.customer_id().map(|c| c.as_uuid()))
        .bind(sale.payment_method_id().as_uuid())
        .bind(sale.total_amount().cents())
        .bind(sale.discount_amount().cents())
        .bind(sale.final_amount().cents())
        .bind(sale.amount_paid().cents())
        .bind(sale.change().cents())
        .bind(sale.currency())
        .bind(sale.created_at())
        .execute(&mut *tx)
        .await?;

        for (line, item) in sale.items().iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO pos_sale_items (id, pos_sale_id, line_number, sku, product_name, quantity, unit_price_cents, subtotal_cents, stock_entry_id, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                "#,
            )
            .bind(item.id().as_uuid())
            .bind(sale.id().as_uuid())
            .bind(line as i32 + 1)
            .bind(item.sku().as_str())
            .bind(item.product_name())
            .bind(quantity_to_column(item.quantity())?)
            .bind(item.unit_price().cents())
            .bind(item.subtotal().cents())
            .bind(item.stock_entry_id().map(|e| e.as_uuid()))
            .bind(item.created_at())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_by_id(
        &self,
        tenant_id: TenantId,
        sale_id: PosSaleId,
    ) -> Result<Option<PosSale>> {
        let sql = format!("SELECT {POS_SALE_COLUMNS} FROM pos_sales WHERE tenant_id = $1 AND id = $2");
        let row = sqlx::query(&sql)
            .bind(tenant_id.as_uuid())
            .bind(sale_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut items = self.load_items(&[sale_id.as_uuid()]).await?;
        let items = items.remove(&sale_id.as_uuid()).unwrap_or_default();
        Self::row_to_sale(&row, items).map(Some)
    }

    async fn list_by_tenant(&self, tenant_id: TenantId) -> Result<Vec<PosSale>> {
        let sql = format!(
            "SELECT {POS_SALE_COLUMNS} FROM pos_sales WHERE tenant_id = $1 ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(tenant_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;

        let ids: Vec<Uuid> = rows
            .iter()
            .map(|row| row.try_get::<Uuid, _>("id"))
            .collect::<std::result::Result<_, _>>()?;
        let mut items = self.load_items(&ids).await?;

        rows.iter()
            .zip(&ids)
            .map(|(row, id)| Self::row_to_sale(row, items.remove(id).unwrap_or_default()))
            .collect()
    }
}

/// Reads global, active payment methods from PostgreSQL.
#[derive(Clone)]
pub struct PostgresPaymentMethodSource {
    pool: PgPool,
}

impl PostgresPaymentMethodSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentMethodSource for PostgresPaymentMethodSource {
    async fn load_active(&self) -> Result<Vec<PaymentMethod>> {
        let rows = sqlx::query(
            r#"
            SELECT id, code, name
            FROM payment_methods
            WHERE tenant_id IS NULL AND is_active = TRUE
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(PaymentMethod {
                    id: PaymentMethodId::from_uuid(row.try_get::<Uuid, _>("id")?),
                    code: row.try_get("code")?,
                    name: row.try_get("name")?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_to_column_rejects_values_above_i32() {
        assert_eq!(quantity_to_column(7).unwrap(), 7);
        assert_eq!(quantity_to_column(i32::MAX as u32).unwrap(), i32::MAX);
        assert!(matches!(
            quantity_to_column(i32::MAX as u32 + 1),
            Err(StoreError::OutOfRange(_))
        ));
    }
}
